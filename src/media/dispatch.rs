use std::path::{Path, PathBuf};

use tokio::fs;

use crate::{
    cleanup::CleanupSet,
    errors::{BotError, BotResult},
    media::{
        kind::MediaKind,
        probe::{ProbeStep, Prober},
    },
    transport::{ChatTransport, VideoOptions},
    utils::allocate_filename,
};

/// Where an artifact came from. Decides how unrecognized files are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    /// The one file produced by the video retriever.
    Single,
    /// One of many files in a gallery download.
    Gallery,
}

/// Result of handling one artifact.
#[derive(Debug)]
pub enum Delivery {
    Sent,
    /// Not media, left out on purpose.
    Skipped,
    Failed(BotError),
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent)
    }
}

/// Classifies artifacts and uploads them through the chat transport.
pub struct Dispatcher<'a> {
    prober: Prober<'a>,
    transport: &'a dyn ChatTransport,
    work_dir: &'a Path,
}

impl<'a> Dispatcher<'a> {
    pub fn new(prober: Prober<'a>, transport: &'a dyn ChatTransport, work_dir: &'a Path) -> Self {
        Self {
            prober,
            transport,
            work_dir,
        }
    }

    pub async fn process(
        &self,
        artifact: &Path,
        source: ArtifactSource,
        cleanup: &mut CleanupSet,
    ) -> Delivery {
        if !fs::try_exists(artifact).await.unwrap_or(false) {
            return Delivery::Failed(BotError::ArtifactVanished(artifact.to_path_buf()));
        }

        let kind = MediaKind::sniff(artifact);
        log::info!("Processing {} as {}", artifact.display(), kind);

        let result = match kind {
            MediaKind::Video => self.send_video(artifact, cleanup).await,
            MediaKind::Image => self.transport.send_photo(artifact).await,
            MediaKind::Unrecognized => match source {
                ArtifactSource::Gallery => {
                    log::info!("Skipping non-media file {}", artifact.display());
                    return Delivery::Skipped;
                }
                ArtifactSource::Single => {
                    Err(BotError::UnrecognizedMediaType(artifact.to_path_buf()))
                }
            },
        };

        match result {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                log::error!("Failed to deliver {}: {}", artifact.display(), e);
                Delivery::Failed(e)
            }
        }
    }

    async fn send_video(&self, video: &Path, cleanup: &mut CleanupSet) -> BotResult<()> {
        let thumbnail = self.thumbnail_path();
        cleanup.track_file(&thumbnail);

        self.prober
            .thumbnail(video, &thumbnail)
            .await
            .map_err(|e| BotError::metadata(ProbeStep::Thumbnail, e))?;
        let duration = self
            .prober
            .duration(video)
            .await
            .map_err(|e| BotError::metadata(ProbeStep::Duration, e))?;
        let (width, height) = self
            .prober
            .dimensions(video)
            .await
            .map_err(|e| BotError::metadata(ProbeStep::Dimensions, e))?;

        let options = VideoOptions {
            thumbnail: thumbnail.clone(),
            duration,
            width,
            height,
            supports_streaming: true,
        };
        let sent = self.transport.send_video(video, options).await;
        cleanup.release(&thumbnail).await;
        sent
    }

    fn thumbnail_path(&self) -> PathBuf {
        self.work_dir.join(allocate_filename(".jpg"))
    }
}
