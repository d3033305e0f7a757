use std::sync::Arc;

use teloxide::{prelude::*, types::ReplyParameters};

use crate::{
    config::Config,
    errors::HandlerResult,
    pipeline::{Pipeline, Request},
    transport::TelegramTransport,
    utils::extract_url,
};

pub async fn link_received(
    bot: Bot,
    msg: Message,
    text: String,
    config: Arc<Config>,
    pipeline: Arc<Pipeline>,
) -> HandlerResult {
    let user_id = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);

    if !config.is_allowed(user_id) {
        log::info!("Rejected message from user {}", user_id);
        bot.send_message(msg.chat.id, denied_text(&config))
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    }

    let Some(url) = extract_url(&text) else {
        bot.send_message(msg.chat.id, "no valid link found in the message")
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    };

    let transport = TelegramTransport::new(bot, msg.chat.id, msg.id);
    pipeline
        .handle_incoming_url(&Request::new(url, user_id), &transport)
        .await;
    Ok(())
}

fn denied_text(config: &Config) -> String {
    format!(
        "you are not allowed to use this bot. contact {}",
        config.owner_contact()
    )
}
