use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
    config::Config,
    utils::{allocate_filename, filename_base},
};

/// Default selector: prefer mp4/h264, avoid AV1 and VP9.
pub const DEFAULT_FORMAT: &str =
    "bestvideo[vcodec!*=av01][vcodec!*=vp9][ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Selector for hosts that only serve H.264.
pub const H264_ONLY_FORMAT: &str =
    "bestvideo[ext=mp4][vcodec=h264]+bestaudio[ext=m4a]/best[ext=mp4][vcodec=h264]/best";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRule {
    pub pattern: String,
    pub selector: String,
}

/// Ordered, first-match-wins routing data. Loaded from JSON when configured,
/// so new domains never require touching control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainTable {
    /// URL substrings routed to the video retriever. Everything else goes to
    /// the gallery retriever.
    pub video_domains: Vec<String>,
    /// Per-domain format selectors for the video retriever.
    pub formats: Vec<FormatRule>,
    pub default_format: String,
    /// Domains whose downloads get remuxed into an mp4 container.
    pub remux_domains: Vec<String>,
}

impl Default for DomainTable {
    fn default() -> Self {
        let strings = |items: &[&str]| -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        };
        Self {
            video_domains: strings(&[
                "youtube.com/watch",
                "youtube.com/shorts",
                "youtu.be/",
                "tiktok.com",
                "instagram.com/reel",
                "instagram.com/stories",
                "twitter.com/i/broadcasts",
                "x.com/i/broadcasts",
                "reddit.com",
                "v.redd.it",
            ]),
            formats: vec![FormatRule {
                pattern: "tiktok.com".to_string(),
                selector: H264_ONLY_FORMAT.to_string(),
            }],
            default_format: DEFAULT_FORMAT.to_string(),
            remux_domains: strings(&["youtube.com", "youtu.be"]),
        }
    }
}

impl DomainTable {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn is_video_url(&self, url: &str) -> bool {
        self.video_domains.iter().any(|d| url.contains(d.as_str()))
    }

    pub fn format_for(&self, url: &str) -> &str {
        self.formats
            .iter()
            .find(|rule| url.contains(rule.pattern.as_str()))
            .map(|rule| rule.selector.as_str())
            .unwrap_or(&self.default_format)
    }

    pub fn needs_remux(&self, url: &str) -> bool {
        self.remux_domains.iter().any(|d| url.contains(d.as_str()))
    }
}

/// Which cookie jar a retrieval uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieJar {
    pub path: PathBuf,
    /// Alternate jars are free-form text and get normalized before every use.
    pub normalize: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Tool {
    #[strum(to_string = "video retriever")]
    VideoRetriever,
    #[strum(to_string = "gallery retriever")]
    GalleryRetriever,
}

/// Decision of which tool retrieves a URL and where its output lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalPlan {
    Video {
        url: String,
        format: String,
        /// `<work_dir>/<token>frrr.%(ext)s`
        output_template: PathBuf,
        /// Name prefix of the eventual output file.
        base: String,
        cookies: CookieJar,
        remux: bool,
    },
    Gallery {
        url: String,
        output_dir: PathBuf,
        cookies: CookieJar,
    },
}

impl RetrievalPlan {
    pub fn tool(&self) -> Tool {
        match self {
            RetrievalPlan::Video { .. } => Tool::VideoRetriever,
            RetrievalPlan::Gallery { .. } => Tool::GalleryRetriever,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            RetrievalPlan::Video { url, .. } | RetrievalPlan::Gallery { url, .. } => url,
        }
    }

    pub fn cookies(&self) -> &CookieJar {
        match self {
            RetrievalPlan::Video { cookies, .. } | RetrievalPlan::Gallery { cookies, .. } => {
                cookies
            }
        }
    }
}

/// Picks the tool, format selector and fresh output location for `url`.
pub fn select_plan(url: &str, config: &Config) -> RetrievalPlan {
    let table = &config.domain_table;

    if table.is_video_url(url) {
        let name = allocate_filename(".%(ext)s");
        RetrievalPlan::Video {
            url: url.to_string(),
            format: table.format_for(url).to_string(),
            base: filename_base(&name).to_string(),
            output_template: config.work_dir.join(&name),
            cookies: select_cookies(url, config, &config.cookies_file),
            remux: table.needs_remux(url),
        }
    } else {
        RetrievalPlan::Gallery {
            url: url.to_string(),
            output_dir: config.gallery_dir.join(allocate_filename("")),
            cookies: select_cookies(url, config, &config.gallery_cookies_file),
        }
    }
}

fn select_cookies(url: &str, config: &Config, default: &Path) -> CookieJar {
    let alt = &config.alt_cookies;
    if alt.domains.iter().any(|d| url.contains(d.as_str())) && alt.file.exists() {
        return CookieJar {
            path: alt.file.clone(),
            normalize: true,
        };
    }
    CookieJar {
        path: default.to_path_buf(),
        normalize: false,
    }
}
