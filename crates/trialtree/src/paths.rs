//! Path normalization for cache keys.
//!
//! Every cache lookup goes through these helpers. Paths arrive from callers in
//! several shapes (`/data/subj1`, `data/subj1/`, `data/subj1`); the cache only
//! ever sees directory keys of the form `data/subj1/` (root is `""`). A key that
//! is trimmed differently silently misses the cache and reads as `loading`, so
//! no other module builds keys by hand.

/// Strip a single leading slash.
pub fn strip_leading(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Logical form of a path: no leading slash, no trailing slash.
///
/// `"/data/subj1/"` -> `"data/subj1"`, `"/"` -> `""`.
pub fn normalize(path: &str) -> &str {
    strip_leading(path).trim_end_matches('/')
}

/// Directory-style cache key: no leading slash, exactly one trailing slash.
/// The root directory is the empty string.
pub fn dir_key(path: &str) -> String {
    let logical = normalize(path);
    if logical.is_empty() {
        String::new()
    } else {
        format!("{}/", logical)
    }
}

/// Key of an object directly inside `dir`.
pub fn join(dir: &str, name: &str) -> String {
    let mut key = dir_key(dir);
    key.push_str(name.trim_start_matches('/'));
    key
}

/// Last segment of a path, ignoring a trailing slash.
pub fn basename(path: &str) -> &str {
    let logical = normalize(path);
    logical.rsplit('/').next().unwrap_or(logical)
}

/// Parent of a path in logical form. The root has no parent.
pub fn parent(path: &str) -> Option<&str> {
    let logical = normalize(path);
    if logical.is_empty() {
        return None;
    }
    Some(logical.rsplit_once('/').map(|(head, _)| head).unwrap_or(""))
}

/// All strict ancestors of a path, nearest first, ending with the root.
pub fn ancestors(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut current = parent(path);
    while let Some(p) = current {
        out.push(p);
        current = parent(p);
    }
    out
}

/// True when `name` can be used as a single path segment.
pub fn is_valid_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}
