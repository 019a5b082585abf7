//! Core types shared by the cache, classifier, aggregator and projector.

use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Semantic Types
// ============================================================================

/// Semantic type inferred for a folder from the shape of its cached subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathType {
    Dataset,
    Subject,
    Trial,
    TrialSegment,
    TrialsFolder,
    NotFound,
    Loading,
}

impl PathType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::Subject => "subject",
            Self::Trial => "trial",
            Self::TrialSegment => "trial_segment",
            Self::TrialsFolder => "trials_folder",
            Self::NotFound => "not_found",
            Self::Loading => "loading",
        }
    }

    /// `loading` and `not_found` may change as the cache fills in.
    pub fn is_provisional(&self) -> bool {
        matches!(self, Self::Loading | Self::NotFound)
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow status of a node.
///
/// Variants are declared in pipeline severity order and `Ord` follows that
/// order. Aggregation does not use `Ord` directly; it scans the explicit
/// ladders in [`crate::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStatus {
    Loading,
    NeedsData,
    ReadyToProcess,
    WaitingForServer,
    Slurm,
    Processing,
    Error,
    Done,
}

impl PathStatus {
    pub const ALL: [PathStatus; 8] = [
        Self::Loading,
        Self::NeedsData,
        Self::ReadyToProcess,
        Self::WaitingForServer,
        Self::Slurm,
        Self::Processing,
        Self::Error,
        Self::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::NeedsData => "needs_data",
            Self::ReadyToProcess => "ready_to_process",
            Self::WaitingForServer => "waiting_for_server",
            Self::Slurm => "slurm",
            Self::Processing => "processing",
            Self::Error => "error",
            Self::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

impl fmt::Display for PathStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Listings
// ============================================================================

/// An object key inside a listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileEntry {
    pub key: String,
}

impl FileEntry {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn basename(&self) -> &str {
        paths::basename(&self.key)
    }
}

/// What the cache knows about one directory key at a point in time.
///
/// `files` and `folders` are only meaningful once `loading` is false. Unless
/// `recursive` is set, both hold immediate children only. Folder entries are
/// directory keys (trailing slash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub loading: bool,
    /// Directory key this listing describes
    pub path: String,
    pub files: BTreeSet<FileEntry>,
    pub folders: BTreeSet<String>,
    pub recursive: bool,
}

impl Listing {
    /// Placeholder for a listing that has been requested but not resolved.
    pub fn pending(path: &str, recursive: bool) -> Self {
        Self {
            loading: true,
            path: paths::dir_key(path),
            files: BTreeSet::new(),
            folders: BTreeSet::new(),
            recursive,
        }
    }

    /// Build a resolved listing for `prefix` out of a flat set of object keys.
    ///
    /// Keys outside the prefix are ignored. Keys ending in `/` are folder
    /// placeholders and never become files.
    pub fn from_keys<'a, I>(prefix: &str, keys: I, recursive: bool) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let dir = paths::dir_key(prefix);
        let mut files = BTreeSet::new();
        let mut folders = BTreeSet::new();

        for key in keys {
            let key = paths::strip_leading(key);
            let Some(rest) = key.strip_prefix(dir.as_str()) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            match rest.split_once('/') {
                Some((child, _)) => {
                    folders.insert(format!("{}{}/", dir, child));
                    if recursive && !key.ends_with('/') {
                        files.insert(FileEntry::new(key));
                    }
                }
                None => {
                    files.insert(FileEntry::new(key));
                }
            }
        }

        Self {
            loading: false,
            path: dir,
            files,
            folders,
            recursive,
        }
    }

    /// True if an object named `name` sits directly in this directory.
    pub fn has_immediate_file(&self, name: &str) -> bool {
        self.files
            .contains(&FileEntry::new(format!("{}{}", self.path, name)))
    }

    pub fn has_file_key(&self, key: &str) -> bool {
        self.files.contains(&FileEntry::new(paths::strip_leading(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_order_follows_declaration() {
        assert!(PathStatus::Loading < PathStatus::NeedsData);
        assert!(PathStatus::Processing < PathStatus::Error);
        assert!(PathStatus::Error < PathStatus::Done);
        let mut sorted = PathStatus::ALL;
        sorted.sort();
        assert_eq!(sorted, PathStatus::ALL);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in PathStatus::ALL {
            assert_eq!(PathStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PathStatus::parse("unknown"), None);
    }

    #[test]
    fn type_serializes_snake_case() {
        let json = serde_json::to_string(&PathType::TrialsFolder).unwrap();
        assert_eq!(json, "\"trials_folder\"");
        assert!(PathType::NotFound.is_provisional());
        assert!(!PathType::Dataset.is_provisional());
    }

    #[test]
    fn from_keys_splits_files_and_folders() {
        let keys = [
            "data/subj1/_subject.json",
            "data/subj1/trials/walk/_trial.json",
            "data/subj1/trials/",
            "data/other/_subject.json",
        ];
        let listing = Listing::from_keys("/data/subj1", keys, false);
        assert!(!listing.loading);
        assert_eq!(listing.path, "data/subj1/");
        assert_eq!(listing.files.len(), 1);
        assert!(listing.has_immediate_file("_subject.json"));
        assert_eq!(
            listing.folders.iter().collect::<Vec<_>>(),
            vec!["data/subj1/trials/"]
        );
    }

    #[test]
    fn recursive_listing_keeps_nested_files() {
        let keys = ["d/s/_subject.json", "d/s/trials/walk/markers.c3d"];
        let listing = Listing::from_keys("d/s/", keys, true);
        assert_eq!(listing.files.len(), 2);
        assert!(listing.has_file_key("/d/s/trials/walk/markers.c3d"));
        // nested files are not immediate
        assert!(!listing.has_immediate_file("markers.c3d"));
        assert!(listing.has_immediate_file("_subject.json"));
    }

    #[test]
    fn pending_listing_is_loading() {
        let listing = Listing::pending("/a/b", false);
        assert!(listing.loading);
        assert_eq!(listing.path, "a/b/");
        assert!(listing.files.is_empty());
    }
}
