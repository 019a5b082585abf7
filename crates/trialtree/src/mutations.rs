//! Tree mutations: create datasets, subjects and trials, delete folders.
//!
//! Creation writes the same reserved marker objects the classifier looks
//! for. After each write the affected listings are scheduled for refresh;
//! stale entries stay visible until the refresh lands.

use crate::error::{Result, TrialTreeError};
use crate::paths;
use crate::reserved::{self, DATASET_MARKER, SUBJECT_MARKER, TRIALS_FOLDER, TRIAL_MARKER};
use crate::session::DirectorySession;
use crate::storage::ObjectStore;
use crate::view_state::SubjectViewState;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Body of every marker object.
const EMPTY_MARKER: &str = "{}";

impl<S: ObjectStore + 'static> DirectorySession<S> {
    /// Mark `path` as a dataset by writing `_dataset.json`.
    pub async fn create_dataset(&self, path: &str) -> Result<()> {
        self.write_marker(path, DATASET_MARKER).await?;
        info!(path = %paths::normalize(path), "created dataset");
        Ok(())
    }

    /// Mark `path` as a subject by writing `_subject.json`.
    pub async fn create_subject(&self, path: &str) -> Result<()> {
        self.write_marker(path, SUBJECT_MARKER).await?;
        info!(path = %paths::normalize(path), "created subject");
        Ok(())
    }

    /// Create `<subject>/trials/<name>` and return its path.
    ///
    /// Only the `_trial.json` write is awaited. Marker and force files are
    /// uploaded in the background under their reserved names, chosen by
    /// extension; the subject's view state counts them while they run. A file
    /// with an unsupported extension, or two files that would land on the same
    /// reserved name, fail the call before anything is written.
    pub async fn create_trial(
        &self,
        subject: &str,
        name: &str,
        markers: Option<&Path>,
        grf: Option<&Path>,
    ) -> Result<String> {
        if !paths::is_valid_segment(name) {
            return Err(TrialTreeError::invalid_key(name, "trial name must be a single path segment"));
        }

        let mut uploads = Vec::new();
        for source in markers.into_iter().chain(grf) {
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let target = reserved::marker_target_name(&file_name)
                .ok_or_else(|| TrialTreeError::UnsupportedMarkerFile(source.display().to_string()))?;
            if uploads.iter().any(|(_, taken)| *taken == target) {
                return Err(TrialTreeError::invalid_key(
                    target,
                    "markers and grf files map to the same object",
                ));
            }
            uploads.push((source.to_path_buf(), target));
        }

        let trial_path = paths::normalize(&paths::join(&paths::join(subject, TRIALS_FOLDER), name))
            .to_string();
        self.write_marker(&trial_path, TRIAL_MARKER).await?;
        info!(path = %trial_path, uploads = uploads.len(), "created trial");

        let view_state = self.view_state(subject);
        for (source, target) in uploads {
            let key = paths::join(&trial_path, target);
            self.spawn_upload(key, source, &trial_path, Arc::clone(&view_state));
        }
        Ok(trial_path)
    }

    /// Delete every object under `path`. Returns the number removed.
    pub async fn delete_folder(&self, path: &str) -> Result<usize> {
        let logical = paths::normalize(path);
        if logical.is_empty() {
            return Err(TrialTreeError::invalid_key(path, "refusing to delete the store root"));
        }
        let removed = self.store.delete_by_prefix(logical).await?;
        let dropped = self.cache.remove_prefix(logical);
        if let Some(parent) = paths::parent(logical) {
            self.cache.schedule_refresh(parent);
        }
        info!(path = %logical, removed, listings_dropped = dropped, "deleted folder");
        Ok(removed)
    }

    async fn write_marker(&self, dir: &str, marker: &str) -> Result<()> {
        let logical = paths::normalize(dir);
        if logical.is_empty() {
            return Err(TrialTreeError::invalid_key(dir, "marker needs a folder"));
        }
        self.store
            .upload_text(&paths::join(logical, marker), EMPTY_MARKER)
            .await?;
        self.cache.schedule_refresh(logical);
        if let Some(parent) = paths::parent(logical) {
            self.cache.schedule_refresh(parent);
        }
        Ok(())
    }

    fn spawn_upload(
        &self,
        key: String,
        source: PathBuf,
        trial_path: &str,
        view_state: Arc<SubjectViewState>,
    ) {
        let store = Arc::clone(&self.store);
        let cache = Arc::clone(&self.cache);
        let trial_path = trial_path.to_string();
        view_state.upload_started();
        tokio::spawn(async move {
            match store.upload_file(&key, &source).await {
                Ok(()) => {
                    info!(key = %key, source = %source.display(), "upload finished");
                    cache.schedule_refresh(&trial_path);
                }
                Err(e) => {
                    warn!(key = %key, source = %source.display(), error = %e, "upload failed");
                }
            }
            view_state.upload_finished();
        });
    }
}
