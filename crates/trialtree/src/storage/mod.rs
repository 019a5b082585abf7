//! Storage collaborator - the object store behind the listing cache.
//!
//! The core never calls these methods itself; the session does, to resolve
//! scheduled listings and to carry out mutations. Keys are object keys in the
//! bucket's own namespace (no leading slash).

mod local;
mod memory;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

use crate::error::Result;
use crate::types::Listing;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List `prefix`. Non-recursive listings hold immediate files and folders;
    /// recursive listings hold every object key below the prefix.
    /// A prefix with no objects yields an empty, resolved listing.
    async fn list(&self, prefix: &str, recursive: bool) -> Result<Listing>;

    async fn upload_text(&self, key: &str, content: &str) -> Result<()>;

    /// Upload a local file's bytes under `key`.
    async fn upload_file(&self, key: &str, source: &Path) -> Result<()>;

    /// Delete every object under `prefix`; returns how many were removed.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<usize>;

    async fn download_text(&self, key: &str) -> Result<String>;
}
