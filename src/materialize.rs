//! # Sync Materializer
//!
//! Commits one reconciliation's results to disk: remote-only content is
//! written first (new files, folder markers become directories), then
//! merged content (authoritative overwrite of the local copy), then each
//! conflicted file's [`ConflictRecord`] is registered with the conflict
//! metadata store.
//!
//! The two trees are disjoint by construction (the same file cannot be
//! both remote-only and different), so an overlap is reported as an
//! invariant breach rather than silently resolved. There is no rollback:
//! if a write fails, the error reports how many files landed before it,
//! and re-running the sync picks up the remainder (status recomputation is
//! idempotent).

use crate::conflict::{ConflictRecord, ConflictStore};
use crate::error::{Error, Result};
use crate::path::RelativePath;
use crate::tree::{FileEntry, RecipeTree};
use log::{debug, info};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// What one materialization accomplished.
#[derive(Debug, Default)]
pub struct MaterializeOutcome {
    /// Paths written, in write order (kitchen-root relative).
    pub written: Vec<RelativePath>,
    /// Conflict records handed to the store.
    pub conflicts_recorded: usize,
}

fn write_entry(
    root: &Path,
    folder: &RelativePath,
    entry: &FileEntry,
    written: usize,
) -> Result<()> {
    let dir = root.join(folder.to_native());
    fs::create_dir_all(&dir).map_err(|e| Error::PartialFailure {
        completed: written,
        message: format!("failed to create directory '{}': {}", dir.display(), e),
    })?;
    let full_path = dir.join(&entry.filename);
    let content = entry.content.as_deref().ok_or_else(|| Error::PartialFailure {
        completed: written,
        message: format!(
            "no content fetched for '{}'; cannot write it",
            full_path.display()
        ),
    })?;
    fs::write(&full_path, content).map_err(|e| Error::PartialFailure {
        completed: written,
        message: format!("failed to write file '{}': {}", full_path.display(), e),
    })?;
    debug!("wrote {}", full_path.display());
    Ok(())
}

/// Write remote-only and merged trees under `root`, then register
/// conflicts.
///
/// `root` is the kitchen root; both trees are keyed with the recipe
/// segment still present, exactly as the partition delivered them.
pub fn materialize(
    root: &Path,
    remote_only: &RecipeTree,
    merged: &RecipeTree,
    conflicts: &[ConflictRecord],
    store: &dyn ConflictStore,
    recipe: &str,
) -> Result<MaterializeOutcome> {
    // buckets are disjoint by construction; a shared path means the
    // partition invariant was already broken upstream
    let remote_paths: BTreeSet<RelativePath> = remote_only.file_paths()?.into_iter().collect();
    for path in merged.file_paths()? {
        if remote_paths.contains(&path) {
            return Err(Error::InvariantViolation {
                message: format!("file '{}' is both remote-only and merged", path),
            });
        }
    }

    let mut outcome = MaterializeOutcome::default();

    for (folder, entries) in remote_only.folders() {
        if entries.is_empty() {
            let dir = root.join(folder.to_native());
            fs::create_dir_all(&dir).map_err(|e| Error::PartialFailure {
                completed: outcome.written.len(),
                message: format!("failed to create directory '{}': {}", dir.display(), e),
            })?;
            continue;
        }
        for entry in entries {
            write_entry(root, folder, entry, outcome.written.len())?;
            outcome.written.push(folder.join(&entry.filename)?);
        }
    }

    // merged content is authoritative: always overwrite
    for (folder, entry) in merged.files() {
        write_entry(root, folder, entry, outcome.written.len())?;
        outcome.written.push(folder.join(&entry.filename)?);
    }

    for record in conflicts {
        store
            .record_conflict(record, &record.folder_in_recipe, recipe, root)
            .map_err(|e| Error::PartialFailure {
                completed: outcome.written.len(),
                message: format!(
                    "failed to record conflict for '{}/{}': {}",
                    record.folder_in_recipe, record.filename, e
                ),
            })?;
        outcome.conflicts_recorded += 1;
    }

    if !outcome.written.is_empty() || outcome.conflicts_recorded > 0 {
        info!(
            "materialized {} files, {} conflicts recorded",
            outcome.written.len(),
            outcome.conflicts_recorded
        );
    }
    Ok(outcome)
}
