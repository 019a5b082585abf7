//! Directory session - owns the listing cache and resolves it against a store.
//!
//! Everything the classifier, aggregator and projector read lives in the
//! session's [`ListingCache`]. Those readers only *schedule* fetches; the
//! session drains the schedule with [`DirectorySession::fetch_pending`], at
//! most `fetch_concurrency` listings at a time. A listing that fails to fetch
//! is logged and left `loading`; nothing is retried automatically.

use crate::cache::{ListingCache, PathCache};
use crate::classify;
use crate::config::TrialTreeConfig;
use crate::contents::{self, DatasetContents, SubjectContents, TrialContents, TrialSegmentContents};
use crate::error::Result;
use crate::paths;
use crate::status;
use crate::storage::ObjectStore;
use crate::types::{Listing, PathStatus, PathType};
use crate::view_state::{SubjectViewState, ViewStateCache};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Default number of listings fetched at once.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// Upper bound on fetch rounds in [`DirectorySession::recompute`].
const MAX_RECOMPUTE_ROUNDS: usize = 16;

pub struct DirectorySession<S> {
    pub(crate) store: Arc<S>,
    pub(crate) cache: Arc<ListingCache>,
    pub(crate) view_states: ViewStateCache,
    fetch_concurrency: usize,
}

impl<S: ObjectStore + 'static> DirectorySession<S> {
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    /// Session over a store that is shared with other owners.
    pub fn from_arc(store: Arc<S>) -> Self {
        Self {
            store,
            cache: Arc::new(ListingCache::new()),
            view_states: ViewStateCache::new(),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    pub fn with_config(store: S, config: &TrialTreeConfig) -> Self {
        Self::new(store).with_fetch_concurrency(config.fetch_concurrency)
    }

    pub fn with_fetch_concurrency(mut self, limit: usize) -> Self {
        self.fetch_concurrency = limit.max(1);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cache(&self) -> &ListingCache {
        &self.cache
    }

    pub fn classify(&self, path: &str) -> PathType {
        classify::classify(self.cache.as_ref(), path)
    }

    pub fn status(&self, path: &str) -> PathStatus {
        status::status(self.cache.as_ref(), path)
    }

    pub fn dataset_contents(&self, path: &str) -> DatasetContents {
        contents::dataset_contents(self.cache.as_ref(), path)
    }

    pub fn subject_contents(&self, path: &str) -> SubjectContents {
        contents::subject_contents(self.cache.as_ref(), path)
    }

    pub fn trial_contents(&self, path: &str) -> TrialContents {
        contents::trial_contents(self.cache.as_ref(), path)
    }

    pub fn trial_segment_contents(&self, path: &str) -> TrialSegmentContents {
        contents::trial_segment_contents(path)
    }

    /// View state handle for a subject; the same `Arc` for the session's lifetime.
    pub fn view_state(&self, path: &str) -> Arc<SubjectViewState> {
        self.view_states.get_or_create(path)
    }

    /// Fetch every scheduled listing. Returns how many resolved.
    pub async fn fetch_pending(&self) -> usize {
        let requests = self.cache.take_pending();
        if requests.is_empty() {
            return 0;
        }
        debug!(count = requests.len(), "fetching scheduled listings");

        let semaphore = Arc::new(Semaphore::new(self.fetch_concurrency));
        let mut tasks = JoinSet::new();
        for (path, recursive) in requests {
            let store = Arc::clone(&self.store);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = store.list(&path, recursive).await;
                (path, recursive, result)
            });
        }

        let mut resolved = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((path, recursive, Ok(listing))) => {
                    self.apply(&path, recursive, listing);
                    resolved += 1;
                }
                Ok((path, _, Err(e))) => {
                    warn!(path = %path, error = %e, "listing fetch failed, entry stays loading");
                }
                Err(e) => {
                    warn!(error = %e, "listing fetch task failed");
                }
            }
        }
        resolved
    }

    /// Recompute `view` after every fetch round until it schedules nothing new,
    /// the way a reactive consumer would. Gives up after a fixed number of
    /// rounds and returns the last result, which may still be loading.
    pub async fn recompute<T, F>(&self, mut view: F) -> T
    where
        F: FnMut(&Self) -> T,
    {
        let mut result = view(self);
        for _ in 0..MAX_RECOMPUTE_ROUNDS {
            if !self.cache.has_pending() {
                break;
            }
            self.fetch_pending().await;
            result = view(self);
        }
        result
    }

    /// List `path` recursively in one call and cache every directory below it.
    pub async fn load_recursive(&self, path: &str) -> Result<usize> {
        let listing = self.store.list(path, true).await?;
        Ok(self.apply(path, true, listing))
    }

    /// Load `path`'s subtree plus the listing of every ancestor, so that both
    /// classification and dataset aggregation at `path` are fully resolved.
    pub async fn settle(&self, path: &str) -> Result<()> {
        let written = self.load_recursive(path).await?;
        for ancestor in paths::ancestors(path) {
            if self.cache.cached_listing(ancestor).is_none() {
                self.cache.listing(ancestor, false);
            }
        }
        self.fetch_pending().await;
        info!(path = %paths::normalize(path), listings = written, "settled");
        Ok(())
    }

    /// Write a fetched listing into the cache. Returns listings written.
    fn apply(&self, path: &str, recursive: bool, listing: Listing) -> usize {
        if !recursive {
            self.cache.insert(listing);
            return 1;
        }
        let keys = listing
            .files
            .iter()
            .map(|f| f.key.as_str())
            .chain(listing.folders.iter().map(String::as_str));
        self.cache.ingest_keys(path, keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;

    fn sample_store() -> MemoryObjectStore {
        MemoryObjectStore::with_keys([
            "data/_dataset.json",
            "data/subj1/_subject.json",
            "data/subj1/PROCESSING",
            "data/subj1/trials/.keep",
            "data/subj1/trials/walk/markers.c3d",
            "data/subj1/trials/walk/segment_1/_results.json",
            "data/subj2/_subject.json",
        ])
    }

    #[tokio::test]
    async fn reads_are_loading_until_fetched() {
        let session = DirectorySession::new(sample_store());
        let view = session.dataset_contents("data");
        assert!(view.loading);
        assert_eq!(session.classify("data"), PathType::Loading);

        assert_eq!(session.fetch_pending().await, 1);
        let view = session.dataset_contents("data");
        assert!(!view.loading);
        assert_eq!(view.entries.len(), 2);
        // Child listings were scheduled by the second read
        assert!(view.entries.iter().all(|e| e.path_type == PathType::Loading));

        let view = session.recompute(|s| s.dataset_contents("data")).await;
        assert!(view.entries.iter().all(|e| e.path_type == PathType::Subject));
        assert_eq!(session.status("data"), PathStatus::Processing);
    }

    #[tokio::test]
    async fn nested_datasets_resolve_through_recompute() {
        let session = DirectorySession::new(MemoryObjectStore::with_keys([
            "root/_dataset.json",
            "root/inner/_dataset.json",
            "root/inner/s/_subject.json",
            "root/inner/s/ERROR",
        ]));
        let view = session.recompute(|s| s.dataset_contents("root")).await;
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.entries[0].path_type, PathType::Dataset);
        assert_eq!(view.entries[0].status, PathStatus::Error);
        assert_eq!(session.status("root"), PathStatus::Error);
        assert!(!session.cache().has_pending());
    }

    #[tokio::test]
    async fn settle_resolves_subtree_and_ancestors() {
        let session = DirectorySession::new(sample_store());
        session.settle("data/subj1/trials").await.unwrap();
        assert_eq!(session.classify("data/subj1/trials"), PathType::TrialsFolder);
        assert_eq!(session.classify("data/subj1/trials/walk"), PathType::Trial);
        assert_eq!(
            session.classify("data/subj1/trials/walk/segment_1"),
            PathType::TrialSegment
        );
        assert!(!session.cache().has_pending());
    }

    #[tokio::test]
    async fn concurrency_limit_of_one_still_resolves_everything() {
        let session = DirectorySession::new(sample_store()).with_fetch_concurrency(1);
        let subject = session.recompute(|s| s.subject_contents("data/subj1")).await;
        assert!(!subject.loading);
        assert_eq!(subject.trials.len(), 1);
        assert!(subject.trials[0].has_markers_c3d);
        assert_eq!(subject.trials[0].segments.len(), 1);
        assert!(!session.cache().has_pending());
    }

    #[tokio::test]
    async fn failed_fetch_stays_loading() {
        let temp = tempfile::TempDir::new().unwrap();
        let session = DirectorySession::new(crate::storage::LocalObjectStore::new(temp.path()));
        // `..` is rejected by the local store, so this listing can never resolve
        let view = session.recompute(|s| s.trial_contents("data/../escape")).await;
        assert!(view.loading);
        assert_eq!(session.classify("data/../escape"), PathType::Loading);
        assert!(!session.cache().has_pending());
    }

    #[tokio::test]
    async fn view_state_identity_is_stable() {
        let session = DirectorySession::new(MemoryObjectStore::new());
        let a = session.view_state("data/subj1");
        let b = session.view_state("/data/subj1/");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
