//! Listing cache - what is currently known about the remote tree.
//!
//! The classifier, aggregator and projector only ever read through
//! [`PathCache`]. Reads are synchronous and never perform I/O: a miss on
//! [`PathCache::listing`] records a fetch request and hands back a `loading`
//! placeholder. The session drains those requests against the object store
//! (see [`crate::session`]).

use crate::paths;
use crate::types::{FileEntry, Listing};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::debug;

/// Read access to cached listings.
pub trait PathCache {
    /// Current listing for `path`, without scheduling anything.
    fn cached_listing(&self, path: &str) -> Option<Arc<Listing>>;

    /// Current listing for `path`; schedules a fetch if it is not cached yet.
    /// Returns immediately, with `loading == true` when unresolved.
    fn listing(&self, path: &str, recursive: bool) -> Arc<Listing>;
}

/// Thread-safe listing cache with a queue of outstanding fetch requests.
///
/// Entries are never evicted; their lifetime is the owning session's. A
/// recursive request is satisfied by ingesting the whole subtree as shallow
/// listings (see [`ListingCache::ingest_keys`]), so any cached entry answers
/// both kinds of request.
#[derive(Debug, Default)]
pub struct ListingCache {
    entries: RwLock<HashMap<String, Arc<Listing>>>,
    /// Directory key -> recursive flag
    pending: Mutex<BTreeMap<String, bool>>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a resolved (or pending) listing under its own directory key.
    pub fn insert(&self, listing: Listing) -> Arc<Listing> {
        let listing = Arc::new(listing);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(listing.path.clone(), Arc::clone(&listing));
        listing
    }

    /// Schedule a refetch of `path` while keeping whatever is cached visible.
    pub fn schedule_refresh(&self, path: &str) {
        let key = paths::dir_key(path);
        debug!(path = %key, "scheduling listing refresh");
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(false);
    }

    /// Drop every cached listing at or below `path`.
    pub fn remove_prefix(&self, path: &str) -> usize {
        let prefix = paths::dir_key(path);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix.as_str()));
        before - entries.len()
    }

    /// Take every outstanding fetch request, as `(dir_key, recursive)` pairs.
    pub fn take_pending(&self) -> Vec<(String, bool)> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *pending).into_iter().collect()
    }

    pub fn has_pending(&self) -> bool {
        !self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Populate listings for `prefix` and every directory below it from a flat
    /// list of object keys (e.g. the result of one recursive listing).
    ///
    /// Single pass over the keys; returns the number of listings written.
    pub fn ingest_keys<'a, I>(&self, prefix: &str, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let root = paths::dir_key(prefix);
        let mut dirs: HashMap<String, (BTreeSet<FileEntry>, BTreeSet<String>)> = HashMap::new();
        dirs.entry(root.clone()).or_default();

        let mut dir_buf = String::with_capacity(256);
        for key in keys {
            let key = paths::strip_leading(key);
            let Some(rest) = key.strip_prefix(root.as_str()) else {
                continue;
            };

            dir_buf.clear();
            dir_buf.push_str(&root);
            let mut segments = rest.split('/').peekable();
            while let Some(segment) = segments.next() {
                let is_last = segments.peek().is_none();
                if is_last {
                    if !segment.is_empty() {
                        let (files, _) = dirs.entry(dir_buf.clone()).or_default();
                        files.insert(FileEntry::new(key));
                    }
                    break;
                }
                if segment.is_empty() {
                    break;
                }
                let child = format!("{}{}/", dir_buf, segment);
                let (_, folders) = dirs.entry(dir_buf.clone()).or_default();
                folders.insert(child.clone());
                dirs.entry(child.clone()).or_default();
                dir_buf = child;
            }
        }

        let count = dirs.len();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for (path, (files, folders)) in dirs {
            let listing = Listing {
                loading: false,
                path: path.clone(),
                files,
                folders,
                recursive: false,
            };
            entries.insert(path, Arc::new(listing));
        }
        debug!(prefix = %root, listings = count, "ingested subtree");
        count
    }
}

impl PathCache for ListingCache {
    fn cached_listing(&self, path: &str) -> Option<Arc<Listing>> {
        let key = paths::dir_key(path);
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn listing(&self, path: &str, recursive: bool) -> Arc<Listing> {
        let key = paths::dir_key(path);
        if let Some(existing) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(existing);
        }

        debug!(path = %key, recursive, "listing cache miss, scheduling fetch");
        let placeholder = Arc::new(Listing::pending(&key, recursive));
        // Another caller may have filled the slot between the two locks.
        let listing = Arc::clone(
            self.entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key.clone())
                .or_insert(placeholder),
        );
        if listing.loading {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            let flag = pending.entry(key).or_insert(false);
            *flag |= recursive;
        }
        listing
    }
}
