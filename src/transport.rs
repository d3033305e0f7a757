use std::path::{Path, PathBuf};

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{InputFile, MessageId, ReplyParameters},
};

use crate::errors::{BotError, BotResult};

/// Attributes sent along with a video upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoOptions {
    pub thumbnail: PathBuf,
    pub duration: u32,
    pub width: u32,
    pub height: u32,
    pub supports_streaming: bool,
}

/// What the pipeline needs from the chat, bound to the chat the request came from.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn reply(&self, text: &str) -> BotResult<()>;
    async fn send_video(&self, path: &Path, options: VideoOptions) -> BotResult<()>;
    async fn send_photo(&self, path: &Path) -> BotResult<()>;
}

pub struct TelegramTransport {
    bot: Bot,
    chat_id: ChatId,
    reply_to: MessageId,
}

impl TelegramTransport {
    pub fn new(bot: Bot, chat_id: ChatId, reply_to: MessageId) -> Self {
        Self {
            bot,
            chat_id,
            reply_to,
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn reply(&self, text: &str) -> BotResult<()> {
        self.bot
            .send_message(self.chat_id, text)
            .reply_parameters(ReplyParameters::new(self.reply_to))
            .await?;
        Ok(())
    }

    async fn send_video(&self, path: &Path, options: VideoOptions) -> BotResult<()> {
        log::debug!("Uploading video {}", path.display());
        self.bot
            .send_video(self.chat_id, InputFile::file(path))
            .thumbnail(InputFile::file(&options.thumbnail))
            .duration(options.duration)
            .width(options.width)
            .height(options.height)
            .supports_streaming(options.supports_streaming)
            .await
            .map_err(|e| BotError::UploadFailed(e.to_string()))?;
        Ok(())
    }

    async fn send_photo(&self, path: &Path) -> BotResult<()> {
        log::debug!("Uploading photo {}", path.display());
        self.bot
            .send_photo(self.chat_id, InputFile::file(path))
            .await
            .map_err(|e| BotError::UploadFailed(e.to_string()))?;
        Ok(())
    }
}
