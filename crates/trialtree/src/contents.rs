//! Content projection - typed views over one level of the tree.
//!
//! Each view is recomputed from the cache on every call and owns nothing
//! beyond the values it was built from. Views request the listings they need
//! through [`PathCache::listing`], so opening a view schedules fetches for
//! whatever is missing and reports `loading` until the session resolves them.

use crate::cache::PathCache;
use crate::classify::classify;
use crate::paths;
use crate::reserved::{
    DATA_CSV, ERROR_FLAG, GRF_MOT, MARKERS_C3D, MARKERS_TRC, PREVIEW_FILE, PROCESSING_FLAG,
    READY_TO_PROCESS_FLAG, RESULTS_FILE, SLURM_FLAG, SUBJECT_MARKER, TRIALS_FOLDER, TRIAL_MARKER,
};
use crate::status::status;
use crate::types::{PathStatus, PathType};
use serde::Serialize;

/// One child folder of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub path_type: PathType,
    pub status: PathStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetContents {
    pub path: String,
    pub loading: bool,
    pub entries: Vec<DatasetEntry>,
}

/// Keys of a subject's marker and flag objects. Built from the path alone;
/// presence is not implied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectFiles {
    pub subject_json: String,
    pub results_json: String,
    pub ready_flag: String,
    pub processing_flag: String,
    pub error_flag: String,
    pub slurm_flag: String,
}

impl SubjectFiles {
    fn for_subject(path: &str) -> Self {
        Self {
            subject_json: paths::join(path, SUBJECT_MARKER),
            results_json: paths::join(path, RESULTS_FILE),
            ready_flag: paths::join(path, READY_TO_PROCESS_FLAG),
            processing_flag: paths::join(path, PROCESSING_FLAG),
            error_flag: paths::join(path, ERROR_FLAG),
            slurm_flag: paths::join(path, SLURM_FLAG),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectContents {
    pub name: String,
    pub path: String,
    /// Either the subject listing or its `trials/` listing is unresolved
    pub loading: bool,
    pub files: SubjectFiles,
    pub has_results: bool,
    pub trials: Vec<TrialContents>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialContents {
    pub name: String,
    pub path: String,
    pub loading: bool,
    pub trial_json: String,
    pub has_markers_c3d: bool,
    pub has_markers_trc: bool,
    pub has_grf_mot: bool,
    pub segments: Vec<TrialSegmentContents>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialSegmentContents {
    pub name: String,
    pub path: String,
    pub results_json: String,
    pub preview: String,
    pub data_csv: String,
}

/// Immediate child folders of a dataset with their type and status.
pub fn dataset_contents<C: PathCache + ?Sized>(cache: &C, path: &str) -> DatasetContents {
    let listing = cache.listing(path, false);
    let entries = listing
        .folders
        .iter()
        .map(|folder| {
            // Classification reads the child's own listing; make sure it is on its way.
            cache.listing(folder, false);
            request_nested_dataset(cache, folder);
            DatasetEntry {
                name: paths::basename(folder).to_string(),
                path: paths::normalize(folder).to_string(),
                path_type: classify(cache, folder),
                status: status(cache, folder),
            }
        })
        .collect();

    DatasetContents {
        path: paths::normalize(path).to_string(),
        loading: listing.loading,
        entries,
    }
}

/// Request the child listings a nested dataset's status aggregates over.
///
/// Only descends through folders already known to be datasets, so a deep
/// chain of datasets fills in one level per fetch round.
fn request_nested_dataset<C: PathCache + ?Sized>(cache: &C, path: &str) {
    if classify(cache, path) != PathType::Dataset {
        return;
    }
    let Some(listing) = cache.cached_listing(path) else {
        return;
    };
    let own = paths::normalize(path);
    for folder in listing.folders.iter().filter(|f| paths::normalize(f) != own) {
        cache.listing(folder, false);
        request_nested_dataset(cache, folder);
    }
}

/// Subject detail: flag handles, results presence and every trial.
pub fn subject_contents<C: PathCache + ?Sized>(cache: &C, path: &str) -> SubjectContents {
    let trials_path = paths::join(path, TRIALS_FOLDER);
    // Request both before reading either so the fetches go out together.
    let listing = cache.listing(path, false);
    let trials_listing = cache.listing(&trials_path, false);

    let trials = trials_listing
        .folders
        .iter()
        .map(|folder| trial_contents(cache, folder))
        .collect();

    SubjectContents {
        name: paths::basename(path).to_string(),
        path: paths::normalize(path).to_string(),
        loading: listing.loading || trials_listing.loading,
        files: SubjectFiles::for_subject(path),
        has_results: listing.has_immediate_file(RESULTS_FILE),
        trials,
    }
}

/// Trial detail: which marker and force files exist, plus its segments.
pub fn trial_contents<C: PathCache + ?Sized>(cache: &C, path: &str) -> TrialContents {
    let listing = cache.listing(path, false);
    let segments = listing
        .folders
        .iter()
        .map(|folder| trial_segment_contents(folder))
        .collect();

    TrialContents {
        name: paths::basename(path).to_string(),
        path: paths::normalize(path).to_string(),
        loading: listing.loading,
        trial_json: paths::join(path, TRIAL_MARKER),
        has_markers_c3d: listing.has_file_key(&paths::join(path, MARKERS_C3D)),
        has_markers_trc: listing.has_file_key(&paths::join(path, MARKERS_TRC)),
        has_grf_mot: listing.has_file_key(&paths::join(path, GRF_MOT)),
        segments,
    }
}

/// Segment detail. Pure path derivation; never touches the cache.
pub fn trial_segment_contents(path: &str) -> TrialSegmentContents {
    TrialSegmentContents {
        name: paths::basename(path).to_string(),
        path: paths::normalize(path).to_string(),
        results_json: paths::join(path, RESULTS_FILE),
        preview: paths::join(path, PREVIEW_FILE),
        data_csv: paths::join(path, DATA_CSV),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ListingCache;
    use crate::types::Listing;

    fn loaded_tree() -> ListingCache {
        let cache = ListingCache::new();
        cache.ingest_keys(
            "data",
            [
                "data/_dataset.json",
                "data/subj1/_subject.json",
                "data/subj1/_results.json",
                "data/subj1/trials/walk/_trial.json",
                "data/subj1/trials/walk/markers.trc",
                "data/subj1/trials/walk/grf.mot",
                "data/subj1/trials/walk/segment_1/_results.json",
                "data/subj1/trials/walk/segment_2/data.csv",
                "data/subj1/trials/run/markers.c3d",
                "data/subj2/_subject.json",
                "data/subj2/ERROR",
            ],
        );
        cache
    }

    #[test]
    fn dataset_contents_lists_children_with_type_and_status() {
        let cache = loaded_tree();
        let contents = dataset_contents(&cache, "/data/");
        assert!(!contents.loading);
        assert_eq!(contents.path, "data");
        assert_eq!(
            contents.entries,
            vec![
                DatasetEntry {
                    name: "subj1".into(),
                    path: "data/subj1".into(),
                    path_type: PathType::Subject,
                    status: PathStatus::Done,
                },
                DatasetEntry {
                    name: "subj2".into(),
                    path: "data/subj2".into(),
                    path_type: PathType::Subject,
                    status: PathStatus::Error,
                },
            ]
        );
        assert!(!cache.has_pending());
    }

    #[test]
    fn dataset_contents_on_cold_cache_is_loading() {
        let cache = ListingCache::new();
        let contents = dataset_contents(&cache, "data");
        assert!(contents.loading);
        assert!(contents.entries.is_empty());
        assert_eq!(cache.take_pending(), vec![("data/".to_string(), false)]);
    }

    #[test]
    fn dataset_contents_requests_child_listings() {
        let cache = ListingCache::new();
        cache.insert(Listing::from_keys("data", ["data/_dataset.json", "data/s1/", "data/s2/"], false));
        let contents = dataset_contents(&cache, "data");
        assert!(!contents.loading);
        assert!(contents
            .entries
            .iter()
            .all(|e| e.path_type == PathType::Loading && e.status == PathStatus::Loading));
        assert_eq!(
            cache.take_pending(),
            vec![("data/s1/".to_string(), false), ("data/s2/".to_string(), false)]
        );
    }

    #[test]
    fn nested_dataset_requests_grandchild_listings() {
        let cache = ListingCache::new();
        cache.insert(Listing::from_keys("root", ["root/_dataset.json", "root/inner/"], false));
        cache.insert(Listing::from_keys(
            "root/inner",
            ["root/inner/_dataset.json", "root/inner/s/"],
            false,
        ));
        let contents = dataset_contents(&cache, "root");
        assert_eq!(contents.entries[0].path_type, PathType::Dataset);
        assert_eq!(contents.entries[0].status, PathStatus::Loading);
        assert_eq!(cache.take_pending(), vec![("root/inner/s/".to_string(), false)]);

        cache.insert(Listing::from_keys(
            "root/inner/s",
            ["root/inner/s/_subject.json", "root/inner/s/ERROR"],
            false,
        ));
        let contents = dataset_contents(&cache, "root");
        assert_eq!(contents.entries[0].status, PathStatus::Error);
        assert_eq!(status(&cache, "root"), PathStatus::Error);
        assert!(!cache.has_pending());
    }

    #[test]
    fn subject_contents_composes_trials() {
        let cache = loaded_tree();
        let subject = subject_contents(&cache, "data/subj1");
        assert_eq!(subject.name, "subj1");
        assert!(!subject.loading);
        assert!(subject.has_results);
        assert_eq!(subject.files.subject_json, "data/subj1/_subject.json");
        assert_eq!(subject.files.ready_flag, "data/subj1/READY_TO_PROCESS");

        let names: Vec<&str> = subject.trials.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["run", "walk"]);

        let walk = &subject.trials[1];
        assert!(walk.has_markers_trc);
        assert!(walk.has_grf_mot);
        assert!(!walk.has_markers_c3d);
        assert_eq!(walk.segments.len(), 2);
        assert_eq!(walk.segments[0].name, "segment_1");

        let run = &subject.trials[0];
        assert!(run.has_markers_c3d);
        assert!(run.segments.is_empty());
    }

    #[test]
    fn subject_contents_requests_both_listings() {
        let cache = ListingCache::new();
        let subject = subject_contents(&cache, "/data/subj1/");
        assert!(subject.loading);
        assert!(!subject.has_results);
        assert_eq!(
            cache.take_pending(),
            vec![
                ("data/subj1/".to_string(), false),
                ("data/subj1/trials/".to_string(), false),
            ]
        );
    }

    #[test]
    fn subject_without_trials_folder() {
        let cache = loaded_tree();
        let subject = subject_contents(&cache, "data/subj2");
        // `data/subj2/trials/` was never ingested, so it is still pending.
        assert!(subject.loading);
        assert!(subject.trials.is_empty());
        assert!(!subject.has_results);
    }

    #[test]
    fn segment_contents_are_pure() {
        let a = trial_segment_contents("/data/s/trials/walk/segment_1/");
        let b = trial_segment_contents("/data/s/trials/walk/segment_1/");
        assert_eq!(a, b);
        assert_eq!(a.name, "segment_1");
        assert_eq!(a.path, "data/s/trials/walk/segment_1");
        assert_eq!(a.results_json, "data/s/trials/walk/segment_1/_results.json");
        assert_eq!(a.preview, "data/s/trials/walk/segment_1/preview.bin");
        assert_eq!(a.data_csv, "data/s/trials/walk/segment_1/data.csv");
    }
}
