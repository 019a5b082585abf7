//! Status aggregation - workflow status per node.
//!
//! Status only carries information at dataset and subject granularity:
//! - a subject reads its own flag files against [`SUBJECT_FLAGS`]
//! - a dataset aggregates its child folders against [`DATASET_LADDER`]
//! - every other type reports `done`
//!
//! The ladders are data, not a chain of conditionals, so their order can be
//! inspected and tested on its own.

use crate::cache::PathCache;
use crate::classify::classify;
use crate::paths;
use crate::reserved::{
    ERROR_FLAG, PROCESSING_FLAG, READY_TO_PROCESS_FLAG, RESULTS_FILE, SLURM_FLAG, TRIALS_FOLDER,
};
use crate::types::{Listing, PathStatus, PathType};

/// Rungs scanned, in order, over the statuses of a dataset's child folders.
/// The first rung present wins; `done` when none is.
///
/// `needs_data` is not a rung: it is reported only for a dataset with no
/// child folders at all.
pub const DATASET_LADDER: [PathStatus; 6] = [
    PathStatus::Loading,
    PathStatus::Processing,
    PathStatus::WaitingForServer,
    PathStatus::Slurm,
    PathStatus::Error,
    PathStatus::ReadyToProcess,
];

/// Flag files checked, in order, directly inside a subject folder.
pub const SUBJECT_FLAGS: [(&str, PathStatus); 5] = [
    (RESULTS_FILE, PathStatus::Done),
    (ERROR_FLAG, PathStatus::Error),
    (PROCESSING_FLAG, PathStatus::Processing),
    (SLURM_FLAG, PathStatus::Slurm),
    (READY_TO_PROCESS_FLAG, PathStatus::WaitingForServer),
];

/// First rung of `ladder` that appears in `statuses`.
pub fn first_present<I>(ladder: &[PathStatus], statuses: I) -> Option<PathStatus>
where
    I: IntoIterator<Item = PathStatus>,
{
    let mut seen = [false; PathStatus::ALL.len()];
    for status in statuses {
        seen[status as usize] = true;
    }
    ladder.iter().copied().find(|rung| seen[*rung as usize])
}

/// Aggregate status of a dataset from one status per child folder.
pub fn aggregate_dataset(children: &[PathStatus]) -> PathStatus {
    if children.is_empty() {
        return PathStatus::NeedsData;
    }
    first_present(&DATASET_LADDER, children.iter().copied()).unwrap_or(PathStatus::Done)
}

/// Status of a subject from its own listing.
pub fn subject_status(listing: &Listing) -> PathStatus {
    if let Some((_, status)) = SUBJECT_FLAGS
        .iter()
        .find(|(flag, _)| listing.has_immediate_file(flag))
    {
        return *status;
    }
    let has_trials = listing.files.iter().any(|f| {
        let mut dirs = f.key.split('/');
        dirs.next_back();
        dirs.any(|segment| segment == TRIALS_FOLDER)
    });
    if has_trials {
        PathStatus::NeedsData
    } else {
        PathStatus::ReadyToProcess
    }
}

/// Workflow status of `path` according to what is currently cached.
///
/// Reads the cache without scheduling fetches. Datasets recurse into every
/// child folder, so large trees cost many (cheap, in-memory) reads.
pub fn status<C: PathCache + ?Sized>(cache: &C, path: &str) -> PathStatus {
    let listing = match cache.cached_listing(path) {
        Some(listing) if !listing.loading => listing,
        _ => return PathStatus::Loading,
    };

    match classify(cache, path) {
        PathType::Loading => PathStatus::Loading,
        PathType::Dataset => {
            let own = paths::normalize(path);
            let children: Vec<PathStatus> = listing
                .folders
                .iter()
                .map(|folder| {
                    if paths::normalize(folder) == own {
                        PathStatus::Done
                    } else {
                        status(cache, folder)
                    }
                })
                .collect();
            aggregate_dataset(&children)
        }
        PathType::Subject => subject_status(&listing),
        PathType::Trial
        | PathType::TrialSegment
        | PathType::TrialsFolder
        | PathType::NotFound => PathStatus::Done,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ListingCache;
    use crate::types::Listing;

    fn cache_with(entries: &[(&str, &[&str])]) -> ListingCache {
        let cache = ListingCache::new();
        for (path, keys) in entries {
            cache.insert(Listing::from_keys(path, keys.iter().copied(), false));
        }
        cache
    }

    #[test]
    fn ladder_selection_follows_ladder_not_enum_order() {
        use PathStatus::*;
        assert_eq!(aggregate_dataset(&[Error, Done]), Error);
        assert_eq!(aggregate_dataset(&[Error, Processing]), Processing);
        assert_eq!(aggregate_dataset(&[Error, Slurm]), Slurm);
        assert_eq!(aggregate_dataset(&[Slurm, WaitingForServer]), WaitingForServer);
        assert_eq!(aggregate_dataset(&[ReadyToProcess, Error]), Error);
        assert_eq!(aggregate_dataset(&[ReadyToProcess, Done]), ReadyToProcess);
        assert_eq!(aggregate_dataset(&[Done, Done]), Done);
        assert_eq!(aggregate_dataset(&[Processing, Loading]), Loading);
    }

    #[test]
    fn child_needs_data_does_not_propagate() {
        use PathStatus::*;
        assert_eq!(aggregate_dataset(&[NeedsData]), Done);
        assert_eq!(aggregate_dataset(&[NeedsData, ReadyToProcess]), ReadyToProcess);
    }

    #[test]
    fn empty_dataset_needs_data() {
        assert_eq!(aggregate_dataset(&[]), PathStatus::NeedsData);
        let cache = cache_with(&[("data", &["data/_dataset.json"])]);
        assert_eq!(status(&cache, "data"), PathStatus::NeedsData);
    }

    #[test]
    fn first_present_matches_every_subset() {
        // Exhaustive over all 2^8 subsets of statuses.
        for mask in 0u32..(1 << PathStatus::ALL.len()) {
            let subset: Vec<PathStatus> = PathStatus::ALL
                .iter()
                .copied()
                .filter(|s| mask & (1 << *s as u32) != 0)
                .collect();
            let expected = DATASET_LADDER.iter().copied().find(|r| subset.contains(r));
            assert_eq!(first_present(&DATASET_LADDER, subset.iter().copied()), expected);
        }
    }

    #[test]
    fn subject_flag_precedence() {
        let cases: &[(&[&str], PathStatus)] = &[
            (&["s/_subject.json"], PathStatus::ReadyToProcess),
            (&["s/_subject.json", "s/READY_TO_PROCESS"], PathStatus::WaitingForServer),
            (&["s/_subject.json", "s/READY_TO_PROCESS", "s/SLURM"], PathStatus::Slurm),
            (&["s/_subject.json", "s/SLURM", "s/PROCESSING"], PathStatus::Processing),
            (&["s/_subject.json", "s/PROCESSING", "s/ERROR"], PathStatus::Error),
            (&["s/_subject.json", "s/ERROR", "s/_results.json"], PathStatus::Done),
        ];
        for (keys, expected) in cases {
            let listing = Listing::from_keys("s", keys.iter().copied(), false);
            assert_eq!(subject_status(&listing), *expected, "{keys:?}");
        }
    }

    #[test]
    fn subject_with_trial_keys_needs_data() {
        let listing = Listing::from_keys(
            "d/s",
            ["d/s/_subject.json", "d/s/trials/walk/markers.c3d"],
            true,
        );
        assert_eq!(subject_status(&listing), PathStatus::NeedsData);
    }

    #[test]
    fn nested_flags_do_not_count_for_subject() {
        let listing = Listing::from_keys(
            "d/s",
            ["d/s/_subject.json", "d/s/other/PROCESSING"],
            true,
        );
        assert_eq!(subject_status(&listing), PathStatus::ReadyToProcess);
    }

    #[test]
    fn subject_scenario_processing() {
        let cache = cache_with(&[("data/subj1", &["data/subj1/_subject.json", "data/subj1/PROCESSING"])]);
        assert_eq!(classify(&cache, "/data/subj1"), PathType::Subject);
        assert_eq!(status(&cache, "/data/subj1"), PathStatus::Processing);
    }

    #[test]
    fn precedence_is_per_subject() {
        let cache = cache_with(&[
            ("d", &["d/_dataset.json", "d/a/_subject.json", "d/b/_subject.json"]),
            ("d/a", &["d/a/_subject.json", "d/a/PROCESSING"]),
            ("d/b", &["d/b/_subject.json", "d/b/ERROR"]),
        ]);
        assert_eq!(status(&cache, "d/a"), PathStatus::Processing);
        assert_eq!(status(&cache, "d/b"), PathStatus::Error);
        assert_eq!(status(&cache, "d"), PathStatus::Processing);
    }

    #[test]
    fn dataset_scenario_error_and_done() {
        let cache = cache_with(&[
            ("d", &["d/_dataset.json", "d/a/x", "d/b/x"]),
            ("d/a", &["d/a/_subject.json", "d/a/ERROR"]),
            ("d/b", &["d/b/_subject.json", "d/b/_results.json"]),
        ]);
        assert_eq!(status(&cache, "d"), PathStatus::Error);
    }

    #[test]
    fn dataset_with_unloaded_child_is_loading() {
        let cache = cache_with(&[
            ("d", &["d/_dataset.json", "d/a/x", "d/b/x"]),
            ("d/a", &["d/a/_subject.json", "d/a/ERROR"]),
        ]);
        assert_eq!(status(&cache, "d"), PathStatus::Loading);
    }

    #[test]
    fn nested_datasets_aggregate_recursively() {
        let cache = cache_with(&[
            ("root", &["root/_dataset.json", "root/inner/x"]),
            ("root/inner", &["root/inner/_dataset.json", "root/inner/s/x"]),
            ("root/inner/s", &["root/inner/s/_subject.json", "root/inner/s/SLURM"]),
        ]);
        assert_eq!(status(&cache, "root"), PathStatus::Slurm);
    }

    #[test]
    fn self_referencing_folder_counts_as_done() {
        let cache = ListingCache::new();
        let mut listing = Listing::from_keys("d", ["d/_dataset.json"], false);
        listing.folders.insert("d/".to_string());
        cache.insert(listing);
        assert_eq!(status(&cache, "d"), PathStatus::Done);
    }

    #[test]
    fn lower_levels_are_always_done() {
        let cache = cache_with(&[
            ("d/s", &["d/s/_subject.json"]),
            ("d/s/trials", &["d/s/trials/x"]),
            ("d/s/trials/t", &["d/s/trials/t/_trial.json", "d/s/trials/t/ERROR"]),
            ("d/s/trials/t/segment_1", &["d/s/trials/t/segment_1/data.csv"]),
            ("d/empty", &[]),
        ]);
        assert_eq!(status(&cache, "d/s/trials"), PathStatus::Done);
        assert_eq!(status(&cache, "d/s/trials/t"), PathStatus::Done);
        assert_eq!(status(&cache, "d/s/trials/t/segment_1"), PathStatus::Done);
        assert_eq!(status(&cache, "d/empty"), PathStatus::Done);
    }

    #[test]
    fn missing_listing_is_loading() {
        let cache = ListingCache::new();
        assert_eq!(status(&cache, "anything"), PathStatus::Loading);
    }
}
