use std::sync::Arc;

use teloxide::prelude::*;

use crate::{config::Config, download::cookies::replace_cookie_file, errors::HandlerResult};

/// Replaces the alternate cookie file. Only super users; others are ignored.
pub async fn cookies(bot: Bot, msg: Message, text: String, config: Arc<Config>) -> HandlerResult {
    let user_id = msg.from.as_ref().map(|u| u.id.0).unwrap_or(0);
    if !config.is_super_user(user_id) {
        log::warn!("Ignoring /cookies from user {}", user_id);
        return Ok(());
    }

    if text.trim().is_empty() {
        bot.send_message(msg.chat.id, "Usage: /cookies <cookie file contents>")
            .await?;
        return Ok(());
    }

    let path = &config.alt_cookies.file;
    match replace_cookie_file(path, &text).await {
        Ok(()) => {
            log::info!("User {} replaced {}", user_id, path.display());
            bot.send_message(msg.chat.id, "cookies updated").await?;
        }
        Err(e) => {
            log::error!("Failed to write {}: {}", path.display(), e);
            bot.send_message(msg.chat.id, format!("failed to update cookies: {}", e))
                .await?;
        }
    }
    Ok(())
}
