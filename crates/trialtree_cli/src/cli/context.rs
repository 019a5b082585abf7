//! Shared state for a single CLI invocation

use std::path::PathBuf;
use tracing::info;
use trialtree::{DirectorySession, LocalObjectStore, TrialTreeConfig};

pub struct Context {
    pub session: DirectorySession<LocalObjectStore>,
    /// Emit JSON instead of tables
    pub json: bool,
}

impl Context {
    /// Open a session over `root_override`, or the configured store root.
    pub fn open(config: &TrialTreeConfig, root_override: Option<PathBuf>, json: bool) -> Self {
        let root = root_override.unwrap_or_else(|| PathBuf::from(&config.store_root));
        info!(root = %root.display(), concurrency = config.fetch_concurrency, "opening store");
        let store = LocalObjectStore::new(root);
        Self {
            session: DirectorySession::with_config(store, config),
            json,
        }
    }
}
