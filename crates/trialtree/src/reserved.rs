//! Reserved object names and folder conventions.
//!
//! Creation (mutations) and inference (classifier, aggregator) share these
//! names; they are matched exactly and case-sensitively.

use regex::Regex;
use std::sync::LazyLock;

/// Marks a folder as a dataset.
pub const DATASET_MARKER: &str = "_dataset.json";
/// Marks a folder as a subject.
pub const SUBJECT_MARKER: &str = "_subject.json";
/// Marks a folder as a trial.
pub const TRIAL_MARKER: &str = "_trial.json";
/// Written by the processing server when results are available.
pub const RESULTS_FILE: &str = "_results.json";

pub const PROCESSING_FLAG: &str = "PROCESSING";
pub const READY_TO_PROCESS_FLAG: &str = "READY_TO_PROCESS";
pub const ERROR_FLAG: &str = "ERROR";
pub const SLURM_FLAG: &str = "SLURM";

pub const MARKERS_C3D: &str = "markers.c3d";
pub const MARKERS_TRC: &str = "markers.trc";
pub const GRF_MOT: &str = "grf.mot";

pub const PREVIEW_FILE: &str = "preview.bin";
pub const DATA_CSV: &str = "data.csv";

/// Folder holding a subject's trials.
pub const TRIALS_FOLDER: &str = "trials";

/// Any of these directly inside a folder makes it a trial.
pub const TRIAL_INDICATORS: &[&str] = &[MARKERS_C3D, MARKERS_TRC, GRF_MOT, TRIAL_MARKER];

static SEGMENT_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|/)trials/[^/]+/segment_\d+/?$").unwrap());

/// True for `.../trials/<trial>/segment_<digits>` (optionally with a trailing slash).
pub fn is_segment_path(path: &str) -> bool {
    SEGMENT_PATH.is_match(path)
}

/// Reserved name a user-supplied marker or force file is stored under,
/// chosen by extension.
pub fn marker_target_name(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext {
        "c3d" => Some(MARKERS_C3D),
        "trc" => Some(MARKERS_TRC),
        "mot" => Some(GRF_MOT),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_paths_match() {
        assert!(is_segment_path("data/subj1/trials/walk/segment_1"));
        assert!(is_segment_path("data/subj1/trials/walk/segment_12/"));
        assert!(is_segment_path("trials/run/segment_0"));
    }

    #[test]
    fn non_segment_paths_do_not_match() {
        assert!(!is_segment_path("data/subj1/trials/walk"));
        assert!(!is_segment_path("data/subj1/trials/walk/segment_a"));
        assert!(!is_segment_path("data/subj1/trials/walk/segment_1/extra"));
        assert!(!is_segment_path("data/mytrials/walk/segment_1"));
    }

    #[test]
    fn marker_dispatch_by_extension() {
        assert_eq!(marker_target_name("session.c3d"), Some(MARKERS_C3D));
        assert_eq!(marker_target_name("a.b.trc"), Some(MARKERS_TRC));
        assert_eq!(marker_target_name("forces.mot"), Some(GRF_MOT));
        assert_eq!(marker_target_name("notes.txt"), None);
        assert_eq!(marker_target_name("noext"), None);
    }
}
