//! Local directory used as a bucket. Object keys map to relative file paths.

use super::ObjectStore;
use crate::error::{Result, TrialTreeError};
use crate::paths;
use crate::types::{FileEntry, Listing};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a key. Rejects keys that would escape the root.
    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let logical = paths::normalize(key);
        let relative = Path::new(logical);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(TrialTreeError::invalid_key(key, "must be a plain relative path"));
        }
        Ok(self.root.join(relative))
    }
}

/// Object key for a file below `root`, with `/` separators.
fn key_for(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn list_blocking(root: &Path, dir: &Path, prefix: &str, recursive: bool) -> Result<Listing> {
    if !dir.is_dir() {
        return Ok(Listing::from_keys(prefix, std::iter::empty(), recursive));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = BTreeSet::new();
    let mut folders = BTreeSet::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(max_depth) {
        let entry = entry?;
        let Some(key) = key_for(root, entry.path()) else {
            continue;
        };
        if entry.file_type().is_dir() {
            if entry.depth() == 1 {
                folders.insert(format!("{}/", key));
            }
        } else {
            files.insert(FileEntry::new(key));
        }
    }

    Ok(Listing {
        loading: false,
        path: paths::dir_key(prefix),
        files,
        folders,
        recursive,
    })
}

fn count_files(dir: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(dir) {
        if !entry?.file_type().is_dir() {
            count += 1;
        }
    }
    Ok(count)
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list(&self, prefix: &str, recursive: bool) -> Result<Listing> {
        let dir = self.object_path(prefix)?;
        let root = self.root.clone();
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || list_blocking(&root, &dir, &prefix, recursive)).await?
    }

    async fn upload_text(&self, key: &str, content: &str) -> Result<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        Ok(())
    }

    async fn upload_file(&self, key: &str, source: &Path) -> Result<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(source, &path).await?;
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<usize> {
        let dir = self.object_path(prefix)?;
        if dir == self.root {
            return Err(TrialTreeError::invalid_key(prefix, "refusing to delete the store root"));
        }
        if !dir.is_dir() {
            return Ok(0);
        }
        let target = dir.clone();
        let removed = tokio::task::spawn_blocking(move || count_files(&target)).await??;
        tokio::fs::remove_dir_all(&dir).await?;
        Ok(removed)
    }

    async fn download_text(&self, key: &str) -> Result<String> {
        let path = self.object_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(TrialTreeError::NotFound(paths::normalize(key).to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn list_reports_files_and_folders() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());
        store.upload_text("data/_dataset.json", "{}").await.unwrap();
        store.upload_text("data/subj1/_subject.json", "{}").await.unwrap();

        let listing = store.list("/data/", false).await.unwrap();
        assert_eq!(listing.path, "data/");
        assert!(listing.has_immediate_file("_dataset.json"));
        assert!(listing.folders.contains("data/subj1/"));

        let recursive = store.list("data", true).await.unwrap();
        assert!(recursive.has_file_key("data/subj1/_subject.json"));
    }

    #[tokio::test]
    async fn missing_prefix_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());
        let listing = store.list("nowhere", false).await.unwrap();
        assert!(!listing.loading);
        assert!(listing.files.is_empty());
    }

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());
        let err = store.upload_text("../outside", "x").await.unwrap_err();
        assert!(matches!(err, TrialTreeError::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn delete_counts_removed_files() {
        let temp = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp.path());
        store.upload_text("d/s/a", "1").await.unwrap();
        store.upload_text("d/s/b/c", "2").await.unwrap();
        assert_eq!(store.delete_by_prefix("d/s").await.unwrap(), 2);
        assert_eq!(store.delete_by_prefix("d/s").await.unwrap(), 0);
        assert!(store.delete_by_prefix("").await.is_err());
    }
}
