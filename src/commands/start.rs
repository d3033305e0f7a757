use std::sync::Arc;

use teloxide::prelude::*;

use crate::{config::Config, errors::HandlerResult};

pub async fn start(bot: Bot, msg: Message, config: Arc<Config>) -> HandlerResult {
    let user_id = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    bot.send_message(msg.chat.id, start_text(&config, user_id))
        .await?;
    Ok(())
}

fn start_text(config: &Config, user_id: u64) -> String {
    if config.is_allowed(user_id) {
        return "Send me a link and I will download the video or pictures from it.".to_string();
    }
    format!(
        "your user id needs to be whitelisted. please contact {}",
        config.owner_contact()
    )
}
