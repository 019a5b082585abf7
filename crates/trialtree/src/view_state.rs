//! Per-subject view state registry.
//!
//! One handle per subject path for the life of a [`crate::session::DirectorySession`].
//! Handles are created on first request and never evicted: the number of
//! distinct subjects opened in one session is small, and callers hold on to
//! handles across recomputations, so identity must be stable. Dropping the
//! session drops the registry.

use crate::paths;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// UI-facing state for one subject.
#[derive(Debug)]
pub struct SubjectViewState {
    path: String,
    uploads_in_flight: AtomicUsize,
}

impl SubjectViewState {
    fn new(path: String) -> Self {
        Self {
            path,
            uploads_in_flight: AtomicUsize::new(0),
        }
    }

    /// Normalized subject path this handle belongs to
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Detached uploads started for this subject that have not finished.
    pub fn uploads_in_flight(&self) -> usize {
        self.uploads_in_flight.load(Ordering::Acquire)
    }

    pub(crate) fn upload_started(&self) {
        self.uploads_in_flight.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn upload_finished(&self) {
        self.uploads_in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Identity-preserving map from subject path to its view state.
#[derive(Debug, Default)]
pub struct ViewStateCache {
    states: Mutex<HashMap<String, Arc<SubjectViewState>>>,
}

impl ViewStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for `path`, created on first use. `sub/1`, `/sub/1` and
    /// `sub/1/` all resolve to the same instance.
    pub fn get_or_create(&self, path: &str) -> Arc<SubjectViewState> {
        let key = paths::normalize(path);
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = states.get(key) {
            return Arc::clone(existing);
        }
        debug!(path = %key, "creating subject view state");
        let state = Arc::new(SubjectViewState::new(key.to_string()));
        states.insert(key.to_string(), Arc::clone(&state));
        state
    }

    pub fn len(&self) -> usize {
        self.states.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_variants_share_one_handle() {
        let cache = ViewStateCache::new();
        let a = cache.get_or_create("sub/1");
        let b = cache.get_or_create("sub/1/");
        let c = cache.get_or_create("/sub/1");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(a.path(), "sub/1");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_paths_get_distinct_handles() {
        let cache = ViewStateCache::new();
        let a = cache.get_or_create("sub/1");
        let b = cache.get_or_create("sub/2");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn state_survives_repeated_lookups() {
        let cache = ViewStateCache::new();
        let state = cache.get_or_create("sub/1");
        state.upload_started();

        let again = cache.get_or_create("/sub/1/");
        assert_eq!(again.uploads_in_flight(), 1);
        again.upload_finished();
        assert_eq!(state.uploads_in_flight(), 0);
    }

    #[test]
    fn upload_counter_tracks_in_flight_work() {
        let cache = ViewStateCache::new();
        let state = cache.get_or_create("sub/1");
        state.upload_started();
        state.upload_started();
        state.upload_finished();
        assert_eq!(state.uploads_in_flight(), 1);
    }
}
