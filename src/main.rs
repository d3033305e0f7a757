mod cleanup;
mod commands;
mod config;
mod download;
mod errors;
mod handlers;
mod media;
mod pipeline;
mod process;
mod schema;
mod transport;
mod utils;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use teloxide::prelude::*;

use crate::{
    config::Config, download::listing::TokioLister, pipeline::Pipeline,
    process::TokioCommandRunner, schema::schema, utils::clear_dir,
};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    pretty_env_logger::init();
    log::info!("Starting media relay bot...");

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = tokio::fs::create_dir_all(&config.gallery_dir).await {
        log::error!("Failed to create {}: {}", config.gallery_dir.display(), e);
        std::process::exit(1);
    }
    log::info!(
        "{} allowed user(s), {} super user(s), tool timeout {:?}",
        config.allowed_users.len(),
        config.super_users.len(),
        config.tool_timeout
    );

    let pipeline = Arc::new(Pipeline::new(
        config.clone(),
        Arc::new(TokioCommandRunner::new(config.tool_timeout)),
        Arc::new(TokioLister),
    ));

    let bot = Bot::from_env();

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![config.clone(), pipeline])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    if let Err(e) = clear_dir(&config.gallery_dir).await {
        log::error!("Failed to clear {}: {}", config.gallery_dir.display(), e);
    }
}
