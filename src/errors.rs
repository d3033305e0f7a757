use std::{fmt, path::PathBuf};

use crate::media::probe::ProbeStep;

/// Central error type for the bot.
///
/// `Display` produces the plain-text reply sent back to the user, so every
/// variant names the stage that failed.
#[derive(Debug)]
pub enum BotError {
    /// Retrieval tool exited with a non-zero status
    DownloadFailed { tool: String, output: String },
    /// Probe or media tool exited with a non-zero status (or could not be spawned)
    ExternalCommandError { command: String, stderr: String },
    /// Retrieval tool exited with zero but left nothing behind
    ArtifactNotFound(String),
    /// Artifact was discovered but disappeared before processing
    ArtifactVanished(PathBuf),
    /// Thumbnail, duration or dimensions extraction failed for a video
    MetadataExtraction {
        step: ProbeStep,
        source: Box<BotError>,
    },
    /// File is neither video nor image
    UnrecognizedMediaType(PathBuf),
    /// Remuxing the downloaded file into mp4 failed
    ConversionFailed(Box<BotError>),
    /// Upload to the chat failed
    UploadFailed(String),
    FileSystemError(std::io::Error),
    TelegramError(teloxide::RequestError),
    ParseError(String),
    ConfigError(String),
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotError::DownloadFailed { tool, output } => {
                write!(f, "{} failed to download the media. error: {}", tool, output)
            }
            BotError::ExternalCommandError { command, stderr } => {
                write!(f, "{} failed. error: {}", command, stderr)
            }
            BotError::ArtifactNotFound(what) => {
                write!(f, "failed to find the downloaded file ({})", what)
            }
            BotError::ArtifactVanished(path) => {
                write!(f, "downloaded file {} vanished before upload", path.display())
            }
            BotError::MetadataExtraction { step, source } => {
                write!(f, "an error occurred while {}: {}", step, source)
            }
            BotError::UnrecognizedMediaType(path) => {
                write!(f, "unexpected file format: {}", path.display())
            }
            BotError::ConversionFailed(source) => {
                write!(f, "failed to convert to mp4. {}", source)
            }
            BotError::UploadFailed(msg) => write!(f, "failed to upload the media: {}", msg),
            BotError::FileSystemError(e) => write!(f, "filesystem error: {}", e),
            BotError::TelegramError(e) => write!(f, "telegram error: {}", e),
            BotError::ParseError(msg) => write!(f, "parse error: {}", msg),
            BotError::ConfigError(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for BotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BotError::MetadataExtraction { source, .. } => Some(source.as_ref()),
            BotError::ConversionFailed(source) => Some(source.as_ref()),
            BotError::FileSystemError(e) => Some(e),
            BotError::TelegramError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        BotError::FileSystemError(err)
    }
}

impl From<teloxide::RequestError> for BotError {
    fn from(err: teloxide::RequestError) -> Self {
        BotError::TelegramError(err)
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::ParseError(format!("JSON parsing error: {}", err))
    }
}

impl From<strum::ParseError> for BotError {
    fn from(err: strum::ParseError) -> Self {
        BotError::ParseError(format!("Enum parsing error: {}", err))
    }
}

impl BotError {
    pub fn download_failed(tool: impl Into<String>, output: impl Into<String>) -> Self {
        Self::DownloadFailed {
            tool: tool.into(),
            output: output.into(),
        }
    }

    pub fn external_command_error(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::ExternalCommandError {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    pub fn artifact_not_found(what: impl Into<String>) -> Self {
        Self::ArtifactNotFound(what.into())
    }

    pub fn metadata(step: ProbeStep, source: BotError) -> Self {
        Self::MetadataExtraction {
            step,
            source: Box::new(source),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// Result of bot operations
pub type BotResult<T> = Result<T, BotError>;

/// Result for handlers
pub type HandlerResult = BotResult<()>;
