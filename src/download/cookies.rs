//! Netscape cookie-jar maintenance.
//!
//! The alternate jar is pasted in by an operator as free-form text, so its
//! fields are often separated by spaces. Retrieval tools only accept tabs.

use std::path::Path;

use tokio::{fs, io};

/// Fields before the cookie value; the value itself may contain spaces.
const FIELDS_BEFORE_VALUE: usize = 6;

/// Rewrites whitespace-delimited cookie lines as tab-delimited ones.
/// Comments and blank lines are left alone. Applying it twice is a no-op.
pub fn normalize_cookie_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        out.push_str(&normalize_line(line));
        out.push('\n');
    }
    if !text.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }
    out
}

fn normalize_line(line: &str) -> String {
    let trimmed = line.trim();
    let is_comment = trimmed.starts_with('#') && !trimmed.starts_with("#HttpOnly_");
    if trimmed.is_empty() || is_comment {
        return line.trim_end().to_string();
    }

    let mut fields = Vec::with_capacity(FIELDS_BEFORE_VALUE + 1);
    let mut rest = trimmed;
    while fields.len() < FIELDS_BEFORE_VALUE {
        let Some(end) = rest.find(char::is_whitespace) else {
            break;
        };
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    if !rest.is_empty() {
        fields.push(rest);
    }
    fields.join("\t")
}

/// Normalizes the jar at `path` in place. Only writes when something changed.
pub async fn normalize_cookie_file(path: &Path) -> io::Result<()> {
    let text = fs::read_to_string(path).await?;
    let normalized = normalize_cookie_text(&text);
    if normalized != text {
        log::info!("Normalized cookie file {}", path.display());
        fs::write(path, normalized).await?;
    }
    Ok(())
}

/// Replaces the jar at `path` with `text`.
pub async fn replace_cookie_file(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let mut content = normalize_cookie_text(text.trim());
    content.push('\n');
    fs::write(path, content).await
}
