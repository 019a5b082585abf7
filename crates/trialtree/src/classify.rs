//! Path classification - infer a folder's semantic type from cached listings.
//!
//! Rules, first match wins:
//! 1. listing absent or loading -> `loading`
//! 2. no files -> `not_found`
//! 3. path looks like `.../trials/<trial>/segment_<n>` -> `trial_segment`
//! 4. a trial indicator file directly inside -> `trial`
//! 5. `_subject.json` directly inside -> `subject`
//! 6. named `trials` and the parent is a subject (or still loading) -> `trials_folder`
//! 7. otherwise -> `dataset`
//!
//! Only rule 6 looks outside the path itself. It is resolved by walking up
//! the chain of `trials` ancestors iteratively, so the cost is bounded by the
//! path depth.

use crate::cache::PathCache;
use crate::paths;
use crate::reserved::{self, SUBJECT_MARKER, TRIALS_FOLDER, TRIAL_INDICATORS};
use crate::types::{Listing, PathType};

/// Outcome of the rules that only look at the path's own listing.
enum Local {
    Resolved(PathType),
    /// Rules 1-5 did not match and the folder is named `trials`
    TrialsCandidate,
}

fn classify_local(path: &str, listing: Option<&Listing>) -> Local {
    let listing = match listing {
        Some(listing) if !listing.loading => listing,
        _ => return Local::Resolved(PathType::Loading),
    };
    if listing.files.is_empty() {
        return Local::Resolved(PathType::NotFound);
    }
    if reserved::is_segment_path(path) {
        return Local::Resolved(PathType::TrialSegment);
    }
    if TRIAL_INDICATORS
        .iter()
        .any(|name| listing.has_immediate_file(name))
    {
        return Local::Resolved(PathType::Trial);
    }
    if listing.has_immediate_file(SUBJECT_MARKER) {
        return Local::Resolved(PathType::Subject);
    }
    if paths::basename(path) == TRIALS_FOLDER {
        return Local::TrialsCandidate;
    }
    Local::Resolved(PathType::Dataset)
}

/// Semantic type of `path` according to what is currently cached.
///
/// Uses only non-fetching lookups. `loading` and `not_found` are provisional.
pub fn classify<C: PathCache + ?Sized>(cache: &C, path: &str) -> PathType {
    let mut candidates = 0usize;
    let mut current = paths::normalize(path);

    let mut resolved = loop {
        let listing = cache.cached_listing(current);
        match classify_local(current, listing.as_deref()) {
            Local::Resolved(path_type) => break path_type,
            Local::TrialsCandidate => {
                candidates += 1;
                match paths::parent(current) {
                    Some(parent) => current = parent,
                    // A folder named `trials` always has a parent; unreachable
                    // in practice, but a root-level answer is still defined.
                    None => break PathType::Dataset,
                }
            }
        }
    };

    // Unwind from the outermost `trials` candidate back down to `path`.
    for _ in 0..candidates {
        resolved = match resolved {
            PathType::Subject | PathType::Loading => PathType::TrialsFolder,
            _ => PathType::Dataset,
        };
    }
    resolved
}
