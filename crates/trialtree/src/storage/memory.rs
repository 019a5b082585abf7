//! In-memory object store, ordered by key.

use super::ObjectStore;
use crate::error::{Result, TrialTreeError};
use crate::paths;
use crate::types::Listing;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given keys (empty contents).
    pub fn with_keys<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let objects = keys
            .into_iter()
            .map(|k| (paths::strip_leading(k).to_string(), Vec::new()))
            .collect();
        Self {
            objects: RwLock::new(objects),
        }
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects
            .read()
            .await
            .contains_key(paths::strip_leading(key))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self, prefix: &str, recursive: bool) -> Result<Listing> {
        let dir = paths::dir_key(prefix);
        let objects = self.objects.read().await;
        let keys = objects
            .range(dir.clone()..)
            .map(|(key, _)| key.as_str())
            .take_while(|key| key.starts_with(dir.as_str()));
        Ok(Listing::from_keys(&dir, keys, recursive))
    }

    async fn upload_text(&self, key: &str, content: &str) -> Result<()> {
        self.objects
            .write()
            .await
            .insert(paths::strip_leading(key).to_string(), content.as_bytes().to_vec());
        Ok(())
    }

    async fn upload_file(&self, key: &str, source: &Path) -> Result<()> {
        let bytes = tokio::fs::read(source).await?;
        self.objects
            .write()
            .await
            .insert(paths::strip_leading(key).to_string(), bytes);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<usize> {
        let dir = paths::dir_key(prefix);
        let mut objects = self.objects.write().await;
        let before = objects.len();
        objects.retain(|key, _| !key.starts_with(dir.as_str()));
        Ok(before - objects.len())
    }

    async fn download_text(&self, key: &str) -> Result<String> {
        let key = paths::strip_leading(key);
        let objects = self.objects.read().await;
        let bytes = objects
            .get(key)
            .ok_or_else(|| TrialTreeError::NotFound(key.to_string()))?;
        String::from_utf8(bytes.clone())
            .map_err(|e| TrialTreeError::Storage(format!("{}: {}", key, e)))
    }
}
