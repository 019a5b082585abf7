//! Trialtree - path classification and status aggregation for motion-capture
//! datasets kept in an object store.
//!
//! The bucket is organized as `dataset -> subject -> trials/<trial> -> segment_<n>`,
//! with the role of each folder encoded by reserved marker files
//! (`_dataset.json`, `_subject.json`, `_trial.json`) and processing state
//! encoded by flag files (`PROCESSING`, `ERROR`, ...). This crate answers two
//! questions about any path, purely from cached listings:
//!
//! - what kind of node is it ([`classify::classify`])
//! - what processing state is it in ([`status::status`])
//!
//! and builds typed views over the tree ([`contents`]). Listings are fetched
//! lazily through a [`session::DirectorySession`] backed by an
//! [`storage::ObjectStore`].

pub mod cache;
pub mod classify;
pub mod config;
pub mod contents;
pub mod error;
pub mod paths;
pub mod reserved;
pub mod results;
pub mod session;
pub mod status;
pub mod storage;
pub mod types;
pub mod view_state;

mod mutations;

pub use cache::{ListingCache, PathCache};
pub use config::TrialTreeConfig;
pub use error::{Result, TrialTreeError};
pub use session::DirectorySession;
pub use storage::{LocalObjectStore, MemoryObjectStore, ObjectStore};
pub use types::{FileEntry, Listing, PathStatus, PathType};
