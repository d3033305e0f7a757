use teloxide::{dispatching::UpdateHandler, prelude::*, utils::command::BotCommands};

use crate::{commands::*, errors::BotError, handlers::link_received};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    /// Show usage
    Start,
    /// Liveness check
    #[command(rename = "h")]
    Alive,
    /// Replace the alternate cookie file
    Cookies(String),
}

pub fn schema() -> UpdateHandler<BotError> {
    use dptree::case;

    Update::filter_message()
        .branch(
            teloxide::filter_command::<Command, _>()
                .branch(case![Command::Start].endpoint(start))
                .branch(case![Command::Alive].endpoint(alive))
                .branch(case![Command::Cookies(text)].endpoint(cookies)),
        )
        .branch(Message::filter_text().endpoint(link_received))
}
