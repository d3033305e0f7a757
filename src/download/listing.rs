use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs, io};

/// Filesystem listing used to find tool output. Tests substitute their own.
#[async_trait]
pub trait DirLister: Send + Sync {
    /// Regular files directly inside `dir`, in directory order.
    async fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Every regular file below `dir`, recursively.
    async fn walk_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
}

pub struct TokioLister;

#[async_trait]
impl DirLister for TokioLister {
    async fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    async fn walk_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            let mut entries = fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if file_type.is_file() {
                    files.push(entry.path());
                }
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn walks_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("site/user")).unwrap();
        std::fs::write(dir.path().join("top.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("site/user/1.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("site/user/1.json"), b"{}").unwrap();

        let mut files = TokioLister.walk_files(dir.path()).await.unwrap();
        files.sort();
        assert_eq!(
            files,
            vec![
                dir.path().join("site/user/1.json"),
                dir.path().join("site/user/1.mp4"),
                dir.path().join("top.jpg"),
            ]
        );

        let top = TokioLister.list_files(dir.path()).await.unwrap();
        assert_eq!(top, vec![dir.path().join("top.jpg")]);
    }
}
