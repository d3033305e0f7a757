use std::{path::Path, sync::LazyLock};

use rand::{Rng, distributions::Alphanumeric};
use regex::Regex;
use tokio::{fs, io};

/// Length of the random part of every allocated name.
pub const FILENAME_TOKEN_LEN: usize = 10;

/// Constant marker placed between the random token and the suffix.
pub const FILENAME_MARKER: &str = "frrr";

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<>]+").expect("Regex will always be valid"));

/// Returns a fresh name: random alphanumeric token + marker + `suffix`.
///
/// `suffix` may be empty, an extension like `.mp4`, or a retrieval-tool template
/// placeholder such as `.%(ext)s`.
pub fn allocate_filename(suffix: &str) -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(FILENAME_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("{token}{FILENAME_MARKER}{suffix}")
}

/// Part of an allocated name before its suffix.
pub fn filename_base(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// First http(s) link in a message.
pub fn extract_url(text: &str) -> Option<&str> {
    URL_PATTERN.find(text).map(|m| m.as_str())
}

/// Removes everything inside `dir`, keeping the directory itself.
pub async fn clear_dir(dir: impl AsRef<Path>) -> io::Result<()> {
    let dir = dir.as_ref();
    if !fs::try_exists(dir).await? {
        return Ok(());
    }

    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let result = if entry.file_type().await?.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        if let Err(e) = result {
            log::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
    Ok(())
}
