use std::{path::PathBuf, str::FromStr, time::Duration};

use crate::{
    download::plan::DomainTable,
    errors::{BotError, BotResult},
    media::probe::DimensionsLayout,
};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:131.0) Gecko/20100101 Firefox/131.0";

const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 3600;

/// Programs invoked by the pipeline.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub video_retriever: String,
    pub gallery_retriever: String,
    pub media_tool: String,
    pub probe_tool: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            video_retriever: "yt-dlp".to_string(),
            gallery_retriever: "gallery-dl".to_string(),
            media_tool: "ffmpeg".to_string(),
            probe_tool: "ffprobe".to_string(),
        }
    }
}

/// Cookie jar used instead of the default one for a family of domains.
#[derive(Debug, Clone)]
pub struct AltCookies {
    pub file: PathBuf,
    pub domains: Vec<String>,
}

/// Immutable configuration, built once at startup and shared through `Arc`.
#[derive(Debug, Clone)]
pub struct Config {
    pub allowed_users: Vec<u64>,
    pub super_users: Vec<u64>,
    pub bot_owner: Option<String>,
    pub work_dir: PathBuf,
    pub gallery_dir: PathBuf,
    pub cookies_file: PathBuf,
    pub gallery_cookies_file: PathBuf,
    pub alt_cookies: AltCookies,
    pub user_agent: String,
    pub domain_table: DomainTable,
    pub probe_layout: DimensionsLayout,
    pub tools: ToolPaths,
    pub tool_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> BotResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> BotResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let path_or =
            |key: &str, default: &str| PathBuf::from(get(key).unwrap_or_else(|| default.to_string()));

        let domain_table = match get("DOMAIN_TABLE") {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .map_err(|e| BotError::config(format!("DOMAIN_TABLE {}: {}", path, e)))?;
                DomainTable::from_json(&text)?
            }
            None => DomainTable::default(),
        };

        let probe_layout = match get("PROBE_LAYOUT") {
            Some(value) => DimensionsLayout::from_str(value.trim())?,
            None => DimensionsLayout::default(),
        };

        let timeout_secs = match get("TOOL_TIMEOUT_SECS") {
            Some(value) => value.trim().parse::<u64>().map_err(|e| {
                BotError::config(format!("TOOL_TIMEOUT_SECS '{}': {}", value, e))
            })?,
            None => DEFAULT_TOOL_TIMEOUT_SECS,
        };

        let defaults = ToolPaths::default();
        let tools = ToolPaths {
            video_retriever: get("YTDLP_BIN").unwrap_or(defaults.video_retriever),
            gallery_retriever: get("GALLERY_DL_BIN").unwrap_or(defaults.gallery_retriever),
            media_tool: get("FFMPEG_BIN").unwrap_or(defaults.media_tool),
            probe_tool: get("FFPROBE_BIN").unwrap_or(defaults.probe_tool),
        };

        Ok(Self {
            allowed_users: parse_ids("ALLOWED_USERS", get("ALLOWED_USERS"))?,
            super_users: parse_ids("SUPERUSERS", get("SUPERUSERS"))?,
            bot_owner: get("BOT_OWNER").map(|o| o.trim_start_matches('@').to_string()),
            work_dir: path_or("WORK_DIR", "."),
            gallery_dir: path_or("GALLERY_DIR", "gallery"),
            cookies_file: path_or("COOKIES_FILE", "cookies.txt"),
            gallery_cookies_file: path_or("GALLERY_COOKIES_FILE", "cookies.txt"),
            alt_cookies: AltCookies {
                file: path_or("ALT_COOKIES_FILE", "alt_cookies.txt"),
                domains: get("ALT_COOKIES_DOMAINS")
                    .unwrap_or_else(|| "instagram.com".to_string())
                    .split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string)
                    .collect(),
            },
            user_agent: get("USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            domain_table,
            probe_layout,
            tools,
            tool_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        })
    }

    pub fn is_super_user(&self, user_id: u64) -> bool {
        self.super_users.contains(&user_id)
    }

    /// Who to ask for access, as named in denial replies.
    pub fn owner_contact(&self) -> String {
        match &self.bot_owner {
            Some(owner) => format!("@{}", owner),
            None => "an admin".to_string(),
        }
    }

    /// Super users are always allowed.
    pub fn is_allowed(&self, user_id: u64) -> bool {
        self.allowed_users.contains(&user_id) || self.is_super_user(user_id)
    }
}

fn parse_ids(key: &str, value: Option<String>) -> BotResult<Vec<u64>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<u64>()
                .map_err(|e| BotError::config(format!("{} entry '{}': {}", key, id, e)))
        })
        .collect()
}
