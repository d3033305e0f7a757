use teloxide::prelude::*;

use crate::errors::HandlerResult;

pub async fn alive(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "alive").await?;
    Ok(())
}
