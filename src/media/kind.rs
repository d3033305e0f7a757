use std::path::{Path, PathBuf};

use mime_guess::mime;
use strum::Display;

/// Media kind guessed from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Unrecognized,
}

impl MediaKind {
    /// Sniffs the content type from the name/extension only, the file is never opened.
    pub fn sniff(path: &Path) -> Self {
        match mime_guess::from_path(path).first() {
            Some(m) if m.type_() == mime::VIDEO => MediaKind::Video,
            Some(m) if m.type_() == mime::IMAGE => MediaKind::Image,
            _ => MediaKind::Unrecognized,
        }
    }
}

/// Delivery order: videos, then images, then everything else; ties by path.
pub fn sort_for_delivery(mut files: Vec<PathBuf>) -> Vec<PathBuf> {
    files.sort_by_cached_key(|path| {
        (MediaKind::sniff(path), path.to_string_lossy().into_owned())
    });
    files
}
