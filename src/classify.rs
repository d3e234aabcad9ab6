//! # Diff Classification
//!
//! Turns the server's raw [`FourWayPartition`] into a
//! [`ReconciliationPlan`]: validated, with the recipe-name segment stripped
//! from every folder key, and with per-bucket path lists ready for
//! reporting. The plan keeps the original bucket trees so the merge engine,
//! materializer, and push planner can consume them directly.
//!
//! Pure transform: no network or disk I/O, tolerates empty buckets.

use crate::error::{Error, Result};
use crate::path::RelativePath;
use crate::tree::{FourWayPartition, RecipeTree};

/// The structured reconciliation plan for one recipe.
///
/// Path lists are relative to the recipe root (recipe segment stripped) and
/// sorted; folder-level entries (an empty entry list in the partition) are
/// reported separately from files, matching the status output.
#[derive(Clone, Debug)]
pub struct ReconciliationPlan {
    pub same_count: usize,
    pub modified_files: Vec<RelativePath>,
    pub local_only_files: Vec<RelativePath>,
    pub local_only_dirs: Vec<RelativePath>,
    pub remote_only_files: Vec<RelativePath>,
    pub remote_only_dirs: Vec<RelativePath>,
    /// The validated partition the plan was built from.
    pub partition: FourWayPartition,
}

impl ReconciliationPlan {
    /// True when nothing differs in either direction.
    pub fn is_unchanged(&self) -> bool {
        self.partition.is_unchanged()
    }

    /// Anything to fetch from the remote side.
    pub fn has_remote_only(&self) -> bool {
        !self.remote_only_files.is_empty() || !self.remote_only_dirs.is_empty()
    }
}

/// Strip the recipe segment from a partition folder key.
fn strip_recipe(folder: &RelativePath) -> RelativePath {
    folder
        .strip_first_segment()
        .unwrap_or_else(RelativePath::root)
}

/// Collect stripped file paths and folder-marker paths from one bucket.
fn split_bucket(tree: &RecipeTree) -> Result<(Vec<RelativePath>, Vec<RelativePath>)> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for (folder, entries) in tree.folders() {
        let stripped = strip_recipe(folder);
        if entries.is_empty() {
            dirs.push(stripped);
        } else {
            for entry in entries {
                files.push(stripped.join(&entry.filename)?);
            }
        }
    }
    files.sort();
    dirs.sort();
    Ok((files, dirs))
}

/// Classify a partition into a reconciliation plan.
///
/// Fails with `InvariantViolation` if the buckets overlap or the
/// `different` bucket carries a folder-level marker.
pub fn classify(partition: FourWayPartition) -> Result<ReconciliationPlan> {
    partition.ensure_disjoint()?;

    let same_count = partition.same.file_count();
    let (modified_files, modified_dirs) = split_bucket(&partition.different)?;
    // a whole folder cannot be "modified on both sides"; only files are
    if let Some(dir) = modified_dirs.first() {
        return Err(Error::InvariantViolation {
            message: format!("folder-level entry '{}' in the different bucket", dir),
        });
    }
    let (local_only_files, local_only_dirs) = split_bucket(&partition.only_local)?;
    let (remote_only_files, remote_only_dirs) = split_bucket(&partition.only_remote)?;

    Ok(ReconciliationPlan {
        same_count,
        modified_files,
        local_only_files,
        local_only_dirs,
        remote_only_files,
        remote_only_dirs,
        partition,
    })
}
