//! # Minimal Fetch-Path Reduction
//!
//! Given the set of remote-only folder paths, compute the minimal covering
//! set of directories to request from the server so that everything is
//! fetched exactly once, with no overlapping requests.
//!
//! The reduction sorts the paths lexicographically and scans forward: a
//! path that strictly contains a later path becomes a *wildcard root* and
//! the contained paths are subsumed (skipped); a path that contains nothing
//! and is not itself contained stays in the set as a plain leaf.
//! Containment is the component-wise sub-path check from
//! [`RelativePath::is_ancestor_of`], never a raw string-prefix test.

use crate::path::RelativePath;
use std::collections::{BTreeMap, BTreeSet};

/// The reduced covering set: directory path -> is-wildcard-root.
///
/// Derived and ephemeral; recomputed per fetch request.
pub type MinimalPathSet = BTreeMap<RelativePath, bool>;

/// Reduce a set of folder paths to the minimal covering set.
///
/// Input paths must already be normalized ([`RelativePath`] guarantees
/// that). Empty input yields an empty set; a single path comes back as a
/// non-wildcard leaf.
pub fn minimal_paths<I>(paths: I) -> MinimalPathSet
where
    I: IntoIterator<Item = RelativePath>,
{
    let sorted: BTreeSet<RelativePath> = paths.into_iter().collect();
    let sorted: Vec<RelativePath> = sorted.into_iter().collect();

    let mut minimal = MinimalPathSet::new();
    let mut skip: BTreeSet<usize> = BTreeSet::new();

    for outer in 0..sorted.len() {
        if skip.contains(&outer) {
            continue;
        }
        let this_path = &sorted[outer];
        let mut is_wildcard = false;
        for inner in (outer + 1)..sorted.len() {
            if skip.contains(&inner) {
                continue;
            }
            if this_path.is_ancestor_of(&sorted[inner]) {
                is_wildcard = true;
                skip.insert(inner);
            }
        }
        minimal.insert(this_path.clone(), is_wildcard);
    }
    minimal
}

/// Render a reduced set plus individual files as fetch-request paths.
///
/// Every folder in the reduced set is requested as `<dir>/*` (the server
/// expands one directory level or the whole subtree for wildcard roots);
/// individual files are appended as-is.
pub fn fetch_requests(minimal: &MinimalPathSet, files: &[RelativePath]) -> Vec<String> {
    let mut requests = Vec::with_capacity(minimal.len() + files.len());
    for folder in minimal.keys() {
        if folder.is_root() {
            requests.push("*".to_string());
        } else {
            requests.push(format!("{}/*", folder));
        }
    }
    for file in files {
        requests.push(file.to_string());
    }
    requests
}
