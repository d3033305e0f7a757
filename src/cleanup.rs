use std::path::{Path, PathBuf};

use tokio::fs;

use crate::download::listing::DirLister;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    File(PathBuf),
    Dir(PathBuf),
    /// Output of a tool that picks its own file name; swept by name prefix
    /// unless the real file was resolved.
    Prefix {
        dir: PathBuf,
        prefix: String,
        resolved: bool,
    },
}

/// What a cleanup pass managed to do.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Every temporary path a request created. [`CleanupSet::run`] removes them all
/// once; if the set is dropped before that (panic, early return) `Drop` does a
/// blocking best-effort pass instead.
#[derive(Debug, Default)]
pub struct CleanupSet {
    entries: Vec<Entry>,
    done: bool,
}

impl CleanupSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_file(&mut self, path: impl Into<PathBuf>) {
        self.entries.push(Entry::File(path.into()));
    }

    pub fn track_dir(&mut self, path: impl Into<PathBuf>) {
        self.entries.push(Entry::Dir(path.into()));
    }

    pub fn track_prefix(&mut self, dir: impl Into<PathBuf>, prefix: impl Into<String>) {
        self.entries.push(Entry::Prefix {
            dir: dir.into(),
            prefix: prefix.into(),
            resolved: false,
        });
    }

    /// The prefixed output was located; track the concrete file instead of sweeping.
    pub fn resolve_prefix(&mut self, prefix: &str, file: impl Into<PathBuf>) {
        for entry in &mut self.entries {
            if let Entry::Prefix {
                prefix: p,
                resolved,
                ..
            } = entry
            {
                if p == prefix {
                    *resolved = true;
                }
            }
        }
        self.track_file(file);
    }

    /// Removes a tracked file right away. It leaves the set only when removal
    /// succeeded, otherwise the final pass gets another go at it.
    pub async fn release(&mut self, path: &Path) {
        match remove_file_if_present(path).await {
            Ok(_) => self
                .entries
                .retain(|e| !matches!(e, Entry::File(p) if p == path)),
            Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attempts every removal exactly once; a failure is logged and the rest
    /// still run.
    pub async fn run(&mut self, lister: &dyn DirLister) -> CleanupReport {
        let mut report = CleanupReport::default();
        if self.done {
            return report;
        }
        self.done = true;

        for entry in std::mem::take(&mut self.entries) {
            match entry {
                Entry::File(path) => {
                    record(&mut report, path.clone(), remove_file_if_present(&path).await)
                }
                Entry::Dir(path) => {
                    record(&mut report, path.clone(), remove_dir_if_present(&path).await)
                }
                Entry::Prefix { resolved: true, .. } => {}
                Entry::Prefix { dir, prefix, .. } => {
                    let files = match lister.list_files(&dir).await {
                        Ok(files) => files,
                        Err(e) => {
                            log::error!("Failed to scan {} for leftovers: {}", dir.display(), e);
                            continue;
                        }
                    };
                    for path in files.into_iter().filter(|p| has_prefix(p, &prefix)) {
                        log::info!("Removing leftover {}", path.display());
                        let result = remove_file_if_present(&path).await;
                        record(&mut report, path, result);
                    }
                }
            }
        }
        report
    }
}

impl Drop for CleanupSet {
    fn drop(&mut self) {
        if self.done || self.is_empty() {
            return;
        }
        log::warn!("Cleanup set dropped before running, removing synchronously");

        for entry in std::mem::take(&mut self.entries) {
            let result = match &entry {
                Entry::File(path) if path.exists() => std::fs::remove_file(path),
                Entry::Dir(path) if path.exists() => std::fs::remove_dir_all(path),
                Entry::Prefix {
                    dir,
                    prefix,
                    resolved: false,
                } => std::fs::read_dir(dir).map(|entries| {
                    for path in entries.flatten().map(|e| e.path()) {
                        if path.is_file() && has_prefix(&path, prefix) {
                            if let Err(e) = std::fs::remove_file(&path) {
                                log::error!("Failed to remove {}: {}", path.display(), e);
                            }
                        }
                    }
                }),
                _ => Ok(()),
            };
            if let Err(e) = result {
                log::error!("Failed to clean up {:?}: {}", entry, e);
            }
        }
    }
}

fn has_prefix(path: &Path, prefix: &str) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with(prefix))
}

fn record(report: &mut CleanupReport, path: PathBuf, result: std::io::Result<bool>) {
    match result {
        Ok(true) => report.removed.push(path),
        Ok(false) => {}
        Err(e) => {
            log::error!("Failed to remove {}: {}", path.display(), e);
            report.failed.push(path);
        }
    }
}

/// `Ok(false)` when there was nothing to remove.
async fn remove_file_if_present(path: &Path) -> std::io::Result<bool> {
    if !fs::try_exists(path).await? {
        return Ok(false);
    }
    fs::remove_file(path).await?;
    Ok(true)
}

async fn remove_dir_if_present(path: &Path) -> std::io::Result<bool> {
    if !fs::try_exists(path).await? {
        return Ok(false);
    }
    fs::remove_dir_all(path).await?;
    Ok(true)
}
