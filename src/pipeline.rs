use std::{panic::AssertUnwindSafe, path::PathBuf, sync::Arc};

use futures::FutureExt;
use uuid::Uuid;

use crate::{
    cleanup::CleanupSet,
    config::Config,
    download::{
        listing::DirLister,
        plan::{RetrievalPlan, select_plan},
        runner::Retriever,
    },
    errors::{BotError, BotResult},
    media::{
        convert::remux_to_mp4,
        dispatch::{ArtifactSource, Delivery, Dispatcher},
        probe::Prober,
    },
    process::CommandRunner,
    transport::ChatTransport,
    utils::allocate_filename,
};

const UNEXPECTED_ERROR_REPLY: &str = "an unexpected error occurred while processing the link";

/// One URL sent by one user.
#[derive(Debug, Clone)]
pub struct Request {
    pub id: Uuid,
    pub url: String,
    pub user_id: u64,
}

impl Request {
    pub fn new(url: impl Into<String>, user_id: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            user_id,
        }
    }
}

/// Retrieve, classify, probe, upload and clean up, for one request at a time.
/// Shared between handlers; holds no per-request state.
pub struct Pipeline {
    config: Arc<Config>,
    runner: Arc<dyn CommandRunner>,
    lister: Arc<dyn DirLister>,
}

impl Pipeline {
    pub fn new(
        config: Arc<Config>,
        runner: Arc<dyn CommandRunner>,
        lister: Arc<dyn DirLister>,
    ) -> Self {
        Self {
            config,
            runner,
            lister,
        }
    }

    /// Never fails: every error, panics included, ends up as a reply, and the
    /// request's temporary files are removed afterwards in every case.
    pub async fn handle_incoming_url(&self, request: &Request, transport: &dyn ChatTransport) {
        log::info!(
            "[{}] user {} requested {}",
            request.id,
            request.user_id,
            request.url
        );
        let mut cleanup = CleanupSet::new();

        let outcome = AssertUnwindSafe(self.process(request, transport, &mut cleanup))
            .catch_unwind()
            .await;

        let reply = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                log::error!("[{}] request failed: {}", request.id, e);
                Some(e.to_string())
            }
            Err(_) => {
                log::error!("[{}] request panicked", request.id);
                Some(UNEXPECTED_ERROR_REPLY.to_string())
            }
        };
        if let Some(text) = reply {
            if let Err(e) = transport.reply(&text).await {
                log::error!("[{}] failed to send reply: {}", request.id, e);
            }
        }

        let report = cleanup.run(self.lister.as_ref()).await;
        log::debug!(
            "[{}] cleanup removed {} path(s), {} failed",
            request.id,
            report.removed.len(),
            report.failed.len()
        );
    }

    async fn process(
        &self,
        request: &Request,
        transport: &dyn ChatTransport,
        cleanup: &mut CleanupSet,
    ) -> BotResult<()> {
        let plan = select_plan(&request.url, &self.config);
        log::info!("[{}] using {}", request.id, plan.tool());

        match &plan {
            RetrievalPlan::Video { base, .. } => {
                cleanup.track_prefix(&self.config.work_dir, base.as_str())
            }
            RetrievalPlan::Gallery { output_dir, .. } => cleanup.track_dir(output_dir),
        }

        let retriever = Retriever::new(&self.config, self.runner.as_ref(), self.lister.as_ref());
        let outcome = retriever.run(&plan).await?;
        log::debug!(
            "[{}] {} exited with {:?}",
            request.id,
            plan.tool(),
            outcome.exit_code
        );
        if !outcome.stderr.trim().is_empty() {
            log::warn!("[{}] {} stderr: {}", request.id, plan.tool(), outcome.stderr.trim());
        }

        let dispatcher = Dispatcher::new(
            Prober::new(
                self.runner.as_ref(),
                &self.config.tools,
                self.config.probe_layout,
            ),
            transport,
            &self.config.work_dir,
        );

        match plan {
            RetrievalPlan::Video { base, remux, .. } => {
                let mut artifact = outcome.artifacts.into_iter().next().ok_or_else(|| {
                    BotError::artifact_not_found(format!("no file named {base}.*"))
                })?;
                cleanup.resolve_prefix(&base, &artifact);

                if remux {
                    artifact = self.remux(artifact, cleanup).await?;
                }

                match dispatcher
                    .process(&artifact, ArtifactSource::Single, cleanup)
                    .await
                {
                    Delivery::Failed(e) => Err(e),
                    _ => Ok(()),
                }
            }
            RetrievalPlan::Gallery { .. } => {
                let total = outcome.artifacts.len();
                let mut sent = 0;
                for artifact in &outcome.artifacts {
                    let delivery = dispatcher
                        .process(artifact, ArtifactSource::Gallery, cleanup)
                        .await;
                    if delivery.is_sent() {
                        sent += 1;
                    } else if let Delivery::Failed(e) = delivery {
                        if let Err(e) = transport.reply(&e.to_string()).await {
                            log::error!("[{}] failed to send reply: {}", request.id, e);
                        }
                    }
                }

                log::info!("[{}] sent {} of {} file(s)", request.id, sent, total);
                if sent == 0 {
                    transport
                        .reply(&format!(
                            "failed to send any media from {} downloaded file(s)",
                            total
                        ))
                        .await?;
                } else if sent < total {
                    transport
                        .reply(&format!(
                            "sent {} item(s) from {} downloaded file(s)",
                            sent, total
                        ))
                        .await?;
                }
                Ok(())
            }
        }
    }

    /// Copies the download into a fresh mp4 and drops the original right away.
    async fn remux(&self, input: PathBuf, cleanup: &mut CleanupSet) -> BotResult<PathBuf> {
        let output = self.config.work_dir.join(allocate_filename(".mp4"));
        cleanup.track_file(&output);

        remux_to_mp4(
            self.runner.as_ref(),
            &self.config.tools.media_tool,
            &input,
            &output,
        )
        .await?;
        cleanup.release(&input).await;
        Ok(output)
    }
}
