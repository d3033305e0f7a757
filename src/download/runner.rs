use std::path::{Path, PathBuf};

use crate::{
    config::Config,
    download::{
        cookies::normalize_cookie_file,
        listing::DirLister,
        plan::{CookieJar, RetrievalPlan},
    },
    errors::{BotError, BotResult},
    media::kind::sort_for_delivery,
    process::{CommandRunner, Invocation},
};

/// Successful retrieval: the tool exited with zero and left at least one file.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub exit_code: Option<i32>,
    pub stderr: String,
    /// Exactly one path for the video retriever, delivery-ordered paths for the
    /// gallery retriever.
    pub artifacts: Vec<PathBuf>,
}

/// Runs the external retrieval tools and finds what they produced.
pub struct Retriever<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    lister: &'a dyn DirLister,
}

impl<'a> Retriever<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner, lister: &'a dyn DirLister) -> Self {
        Self {
            config,
            runner,
            lister,
        }
    }

    /// Argument vector for `plan`. Nothing here is shell-interpreted.
    pub fn invocation(&self, plan: &RetrievalPlan) -> Invocation {
        match plan {
            RetrievalPlan::Video {
                url,
                format,
                output_template,
                cookies,
                ..
            } => Invocation::new(&self.config.tools.video_retriever)
                .arg("-o")
                .arg(output_template)
                .arg("--cookies")
                .arg(&cookies.path)
                .arg("--user-agent")
                .arg(&self.config.user_agent)
                .arg("-f")
                .arg(format)
                .arg(url),
            RetrievalPlan::Gallery {
                url,
                output_dir,
                cookies,
            } => Invocation::new(&self.config.tools.gallery_retriever)
                .arg("--cookies")
                .arg(&cookies.path)
                .arg("--user-agent")
                .arg(&self.config.user_agent)
                .arg("-D")
                .arg(output_dir)
                .arg(url),
        }
    }

    pub async fn run(&self, plan: &RetrievalPlan) -> BotResult<RetrievalOutcome> {
        prepare_cookies(plan.cookies()).await;

        let invocation = self.invocation(plan);
        log::info!("Starting {} for {}", plan.tool(), plan.url());

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| BotError::download_failed(&invocation.program, e.to_string()))?;

        if !output.success() {
            log::error!("{} failed: {}", invocation.program, output.error_text());
            return Err(BotError::download_failed(
                &invocation.program,
                output.error_text(),
            ));
        }

        let artifacts = match plan {
            RetrievalPlan::Video { base, .. } => {
                vec![self.find_by_prefix(&self.config.work_dir, base).await?]
            }
            RetrievalPlan::Gallery { output_dir, .. } => self.collect_gallery(output_dir).await?,
        };

        log::info!("Retrieved {} file(s) for {}", artifacts.len(), plan.url());
        Ok(RetrievalOutcome {
            exit_code: output.exit_code,
            stderr: output.stderr,
            artifacts,
        })
    }

    /// The video retriever picks the extension itself, so its output is found
    /// by the allocated name prefix.
    async fn find_by_prefix(&self, dir: &Path, base: &str) -> BotResult<PathBuf> {
        let files = self.lister.list_files(dir).await?;
        files
            .into_iter()
            .find(|path| {
                path.file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with(base))
            })
            .ok_or_else(|| BotError::artifact_not_found(format!("no file named {base}.*")))
    }

    async fn collect_gallery(&self, dir: &Path) -> BotResult<Vec<PathBuf>> {
        let files = match self.lister.walk_files(dir).await {
            Ok(files) => files,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        if files.is_empty() {
            return Err(BotError::artifact_not_found(format!(
                "{} is empty",
                dir.display()
            )));
        }
        Ok(sort_for_delivery(files))
    }
}

async fn prepare_cookies(jar: &CookieJar) {
    if !jar.normalize {
        return;
    }
    if let Err(e) = normalize_cookie_file(&jar.path).await {
        log::warn!("Could not normalize {}: {}", jar.path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        download::{listing::TokioLister, plan::select_plan},
        process::ToolOutput,
        testing::{FakeRunner, test_config, write_file},
    };

    #[tokio::test]
    async fn video_invocation_contract() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let plan = select_plan("https://www.tiktok.com/@a/video/1", &config);
        let runner = FakeRunner::new(|_| ToolOutput::default());
        let retriever = Retriever::new(&config, &runner, &TokioLister);

        let inv = retriever.invocation(&plan);
        let RetrievalPlan::Video {
            output_template,
            format,
            ..
        } = &plan
        else {
            panic!("expected video plan");
        };
        assert_eq!(inv.program, "yt-dlp");
        let args: Vec<String> = inv
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-o".to_string(),
                output_template.to_string_lossy().into_owned(),
                "--cookies".to_string(),
                config.cookies_file.to_string_lossy().into_owned(),
                "--user-agent".to_string(),
                config.user_agent.clone(),
                "-f".to_string(),
                format.clone(),
                "https://www.tiktok.com/@a/video/1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn zero_exit_without_output_is_not_success() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let plan = select_plan("https://youtu.be/abc", &config);
        let runner = FakeRunner::new(|_| ToolOutput {
            exit_code: Some(0),
            ..Default::default()
        });

        let result = Retriever::new(&config, &runner, &TokioLister).run(&plan).await;
        assert!(matches!(result, Err(BotError::ArtifactNotFound(_))));
    }

    #[tokio::test]
    async fn empty_gallery_is_not_success() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let plan = select_plan("https://imgur.com/a/xyz", &config);
        let runner = FakeRunner::new(|inv| {
            std::fs::create_dir_all(inv.value_of("-D").unwrap()).unwrap();
            ToolOutput {
                exit_code: Some(0),
                ..Default::default()
            }
        });

        let result = Retriever::new(&config, &runner, &TokioLister).run(&plan).await;
        assert!(matches!(result, Err(BotError::ArtifactNotFound(_))));
    }

    #[tokio::test]
    async fn nonzero_exit_surfaces_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let plan = select_plan("https://youtu.be/abc", &config);
        let runner = FakeRunner::new(|_| ToolOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "ERROR: quota exceeded\n".to_string(),
        });

        let err = Retriever::new(&config, &runner, &TokioLister)
            .run(&plan)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn finds_video_output_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        write_file(&dir.path().join("unrelated.mp4"));
        let plan = select_plan("https://youtu.be/abc", &config);
        let runner = FakeRunner::scripted();

        let outcome = Retriever::new(&config, &runner, &TokioLister)
            .run(&plan)
            .await
            .unwrap();
        let RetrievalPlan::Video { base, .. } = &plan else {
            panic!("expected video plan");
        };
        assert_eq!(outcome.artifacts, vec![dir.path().join(format!("{base}.mp4"))]);
        assert_eq!(outcome.exit_code, Some(0));
    }

    #[tokio::test]
    async fn gallery_files_come_back_video_first() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let plan = select_plan("https://imgur.com/a/xyz", &config);
        let runner = FakeRunner::new(|inv| {
            let out = std::path::PathBuf::from(inv.value_of("-D").unwrap());
            for name in ["a.txt", "b.jpg", "c.mp4"] {
                write_file(&out.join(name));
            }
            ToolOutput {
                exit_code: Some(0),
                ..Default::default()
            }
        });

        let outcome = Retriever::new(&config, &runner, &TokioLister)
            .run(&plan)
            .await
            .unwrap();
        let RetrievalPlan::Gallery { output_dir, .. } = &plan else {
            panic!("expected gallery plan");
        };
        assert_eq!(
            outcome.artifacts,
            vec![
                output_dir.join("c.mp4"),
                output_dir.join("b.jpg"),
                output_dir.join("a.txt"),
            ]
        );
    }

    #[tokio::test]
    async fn alternate_jar_is_normalized_before_use() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::write(&config.alt_cookies.file, "a b c d e f g\n").unwrap();
        let plan = select_plan("https://www.instagram.com/p/xyz/", &config);
        let runner = FakeRunner::new(|_| ToolOutput {
            exit_code: Some(2),
            ..Default::default()
        });

        let _ = Retriever::new(&config, &runner, &TokioLister).run(&plan).await;

        let jar = std::fs::read_to_string(&config.alt_cookies.file).unwrap();
        assert_eq!(jar, "a\tb\tc\td\te\tf\tg\n");
        let calls = runner.calls();
        assert_eq!(
            calls[0].value_of("--cookies"),
            Some(config.alt_cookies.file.as_os_str())
        );
    }
}
