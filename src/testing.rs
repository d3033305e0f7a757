//! Fakes shared by unit tests: a scriptable tool runner and a recording chat.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use tokio::io;

use crate::{
    config::Config,
    errors::{BotError, BotResult},
    process::{CommandRunner, Invocation, ToolOutput},
    transport::{ChatTransport, VideoOptions},
};

type Script = dyn Fn(&Invocation) -> ToolOutput + Send + Sync;

/// Config rooted in `dir`, with default tools and domain table.
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::from_lookup(|_| None).unwrap();
    config.work_dir = dir.to_path_buf();
    config.gallery_dir = dir.join("gallery");
    config.cookies_file = dir.join("cookies.txt");
    config.gallery_cookies_file = dir.join("gallery_cookies.txt");
    config.alt_cookies.file = dir.join("alt_cookies.txt");
    config.tool_timeout = None;
    config
}

pub fn write_file(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"x").unwrap();
}

fn ok(stdout: &str) -> ToolOutput {
    ToolOutput {
        exit_code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

/// Behaves like the real tools just enough for the pipeline:
/// yt-dlp writes `<template>` as mp4, gallery-dl creates its output directory,
/// ffmpeg writes its last argument, ffprobe reports 12.7s and 1280x720.
pub fn default_script(inv: &Invocation) -> ToolOutput {
    let last = inv.args.last().map(PathBuf::from).unwrap_or_default();
    match inv.program.as_str() {
        "yt-dlp" => {
            let template = inv.value_of("-o").unwrap().to_string_lossy();
            write_file(Path::new(&template.replace("%(ext)s", "mp4")));
            ok("")
        }
        "gallery-dl" => {
            std::fs::create_dir_all(inv.value_of("-D").unwrap()).unwrap();
            ok("")
        }
        "ffmpeg" => {
            write_file(&last);
            ok("")
        }
        "ffprobe" if inv.value_of("-show_entries") == Some(OsStr::new("format=duration")) => {
            ok("12.700000\n")
        }
        "ffprobe" => match inv.value_of("-of").map(|f| f.to_string_lossy().into_owned()) {
            Some(f) if f.starts_with("csv") => ok("1280x720\n"),
            _ => ok("1280\n720\n"),
        },
        other => panic!("unexpected tool {other}"),
    }
}

/// Records every invocation and answers through a script.
pub struct FakeRunner {
    script: Box<Script>,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new(script: impl Fn(&Invocation) -> ToolOutput + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn scripted() -> Self {
        Self::new(default_script)
    }

    /// Default script, except where `overrides` returns an output.
    pub fn scripted_with(
        overrides: impl Fn(&Invocation) -> Option<ToolOutput> + Send + Sync + 'static,
    ) -> Self {
        Self::new(move |inv| overrides(inv).unwrap_or_else(|| default_script(inv)))
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        Ok((self.script)(invocation))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Reply(String),
    Video { path: PathBuf, options: VideoOptions },
    Photo(PathBuf),
}

/// Chat that remembers what it was sent.
#[derive(Default)]
pub struct FakeTransport {
    sent: Mutex<Vec<Sent>>,
    fail_uploads: bool,
}

impl FakeTransport {
    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Reply(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn upload(&self, item: Sent) -> BotResult<()> {
        if self.fail_uploads {
            return Err(BotError::UploadFailed("Request Entity Too Large".to_string()));
        }
        self.sent.lock().unwrap().push(item);
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn reply(&self, text: &str) -> BotResult<()> {
        self.sent.lock().unwrap().push(Sent::Reply(text.to_string()));
        Ok(())
    }

    async fn send_video(&self, path: &Path, options: VideoOptions) -> BotResult<()> {
        assert!(options.thumbnail.exists(), "thumbnail must exist during upload");
        self.upload(Sent::Video {
            path: path.to_path_buf(),
            options,
        })
    }

    async fn send_photo(&self, path: &Path) -> BotResult<()> {
        self.upload(Sent::Photo(path.to_path_buf()))
    }
}
