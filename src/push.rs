//! # Push Planner
//!
//! The local→remote direction: given the same four-way partition, work out
//! which local changes must be pushed to bring the remote up to date, then
//! execute (or, in dry-run mode, just report) the three action lists in
//! order: updates, additions, deletions.
//!
//! - *updates*: files in `different`, pushed as full-content overwrites;
//! - *additions*: files in `only_local`; a folder-level marker means the
//!   whole folder is local-only and is expanded by walking the local
//!   directory;
//! - *deletions*: files in `only_remote`; folder-level markers are
//!   expanded against the authoritative remote tree listing, which can
//!   name files the partition itself never enumerated.
//!
//! Ignored paths are silently excluded from all three lists and never
//! count toward reported totals. In dry-run mode no mutation calls happen;
//! live execution halts a category on its first failure, surfacing the
//! error with the number of completed actions, and does not attempt the
//! following categories.

use crate::api::RecipeService;
use crate::error::{Error, Result};
use crate::ignore::IgnoreRules;
use crate::path::RelativePath;
use crate::report::SyncReport;
use crate::tree::{FourWayPartition, RecipeTree};
use log::{debug, warn};
use std::path::Path;
use walkdir::WalkDir;

/// Terminal state of one push operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushState {
    /// Dry run: classified and reported, nothing sent.
    Reported,
    /// Live run: every action landed.
    Done,
}

/// The three ordered action lists, recipe-root relative.
#[derive(Debug, Default)]
pub struct PushActions {
    pub updates: Vec<RelativePath>,
    pub additions: Vec<RelativePath>,
    pub deletions: Vec<RelativePath>,
    /// Folder expansions that could not be completed (listing missing).
    pub warnings: Vec<String>,
}

impl PushActions {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.additions.is_empty() && self.deletions.is_empty()
    }

    pub fn total(&self) -> usize {
        self.updates.len() + self.additions.len() + self.deletions.len()
    }
}

fn strip_recipe(folder: &RelativePath) -> RelativePath {
    folder
        .strip_first_segment()
        .unwrap_or_else(RelativePath::root)
}

/// Expand a local-only folder marker by walking the directory on disk.
fn walk_local_folder(recipe_root: &Path, folder: &RelativePath) -> Result<Vec<RelativePath>> {
    let dir = recipe_root.join(folder.to_native());
    let mut found = Vec::new();
    for entry in WalkDir::new(&dir).follow_links(false) {
        let entry = entry.map_err(|e| Error::Path {
            message: format!("failed to walk '{}': {}", dir.display(), e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(recipe_root).map_err(|_| Error::Path {
            message: format!(
                "walked outside recipe root: '{}'",
                entry.path().display()
            ),
        })?;
        found.push(RelativePath::parse(&rel.to_string_lossy())?);
    }
    Ok(found)
}

/// Compute the push plan from a partition.
///
/// `remote_tree` is the authoritative full listing used to expand
/// remote-only folder markers into concrete deletions; pass `None` when it
/// could not be fetched and the affected folders will be reported as
/// warnings instead.
pub fn plan(
    partition: &FourWayPartition,
    ignore: &dyn IgnoreRules,
    recipe_root: &Path,
    remote_tree: Option<&RecipeTree>,
) -> Result<PushActions> {
    let mut actions = PushActions::default();

    // updates: the different bucket is always file-level
    for (folder, entries) in partition.different.folders() {
        let stripped = strip_recipe(folder);
        if ignore.is_ignored(&stripped) {
            continue;
        }
        if entries.is_empty() {
            return Err(Error::InvariantViolation {
                message: format!("folder-level entry '{}' in the different bucket", folder),
            });
        }
        for entry in entries {
            let path = stripped.join(&entry.filename)?;
            if !ignore.is_ignored(&path) {
                actions.updates.push(path);
            }
        }
    }

    // additions: expand folder markers against the local disk
    for (folder, entries) in partition.only_local.folders() {
        let stripped = strip_recipe(folder);
        if ignore.is_ignored(&stripped) {
            continue;
        }
        if entries.is_empty() {
            for path in walk_local_folder(recipe_root, &stripped)? {
                if !ignore.is_ignored(&path) {
                    actions.additions.push(path);
                }
            }
        } else {
            for entry in entries {
                let path = stripped.join(&entry.filename)?;
                if !ignore.is_ignored(&path) {
                    actions.additions.push(path);
                }
            }
        }
    }

    // deletions: expand folder markers against the remote listing
    for (folder, entries) in partition.only_remote.folders() {
        let stripped = strip_recipe(folder);
        if ignore.is_ignored(&stripped) {
            continue;
        }
        if entries.is_empty() {
            let listed = remote_tree.and_then(|tree| tree.entries(folder));
            match listed {
                Some(listed) => {
                    for entry in listed {
                        let path = stripped.join(&entry.filename)?;
                        if !ignore.is_ignored(&path) {
                            actions.deletions.push(path);
                        }
                    }
                }
                None => {
                    warn!("unable to expand remote-only folder '{}'", folder);
                    actions
                        .warnings
                        .push(format!("Unable to delete files in folder {}", stripped));
                }
            }
        } else {
            for entry in entries {
                let path = stripped.join(&entry.filename)?;
                if !ignore.is_ignored(&path) {
                    actions.deletions.push(path);
                }
            }
        }
    }

    actions.updates.sort();
    actions.additions.sort();
    actions.deletions.sort();
    Ok(actions)
}

/// Collaborators and parameters for executing a push.
pub struct PushContext<'a> {
    pub service: &'a dyn RecipeService,
    pub kitchen: &'a str,
    pub recipe: &'a str,
    pub recipe_root: &'a Path,
    /// Commit message attached to every mutation.
    pub message: &'a str,
}

/// Outcome of one push: the final state plus the rendered report.
#[derive(Debug)]
pub struct PushOutcome {
    pub state: PushState,
    pub report: SyncReport,
}

fn read_local(recipe_root: &Path, path: &RelativePath, completed: usize) -> Result<Vec<u8>> {
    let full = recipe_root.join(path.to_native());
    std::fs::read(&full).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::PartialFailure {
                completed,
                message: format!("local file missing: {}", full.display()),
            }
        } else {
            Error::PartialFailure {
                completed,
                message: format!("failed to read '{}': {}", full.display(), e),
            }
        }
    })
}

/// Execute (or preview) a push plan.
///
/// Category order is updates, additions, deletions. A failure halts the
/// remaining actions in its category and the categories after it; the
/// error carries the count of actions completed across the whole push.
pub fn execute(actions: &PushActions, ctx: &PushContext<'_>, dry_run: bool) -> Result<PushOutcome> {
    let mut report = SyncReport::new();
    for warning in &actions.warnings {
        report.add_section(warning.clone());
    }

    if dry_run {
        if !actions.updates.is_empty() {
            report.add_path_section(
                format!("{} files will be updated:", actions.updates.len()),
                &actions.updates,
            );
        }
        if !actions.additions.is_empty() {
            report.add_path_section(
                format!("{} files will be added:", actions.additions.len()),
                &actions.additions,
            );
        }
        if !actions.deletions.is_empty() {
            report.add_path_section(
                format!("{} files will be deleted:", actions.deletions.len()),
                &actions.deletions,
            );
        }
        return Ok(PushOutcome {
            state: PushState::Reported,
            report,
        });
    }

    let mut completed = 0usize;

    for path in &actions.updates {
        let content = read_local(ctx.recipe_root, path, completed)?;
        ctx.service
            .update_file(ctx.kitchen, ctx.recipe, ctx.message, path, &content)
            .map_err(|e| Error::PartialFailure {
                completed,
                message: format!("update of '{}' failed: {}", path, e),
            })?;
        debug!("updated {}", path);
        completed += 1;
    }
    if !actions.updates.is_empty() {
        report.add_path_section(
            format!("{} files updated:", actions.updates.len()),
            &actions.updates,
        );
    }

    for path in &actions.additions {
        let content = read_local(ctx.recipe_root, path, completed)?;
        ctx.service
            .add_file(ctx.kitchen, ctx.recipe, ctx.message, path, &content)
            .map_err(|e| Error::PartialFailure {
                completed,
                message: format!("add of '{}' failed: {}", path, e),
            })?;
        debug!("added {}", path);
        completed += 1;
    }
    if !actions.additions.is_empty() {
        report.add_path_section(
            format!("{} files added:", actions.additions.len()),
            &actions.additions,
        );
    }

    for path in &actions.deletions {
        ctx.service
            .delete_file(ctx.kitchen, ctx.recipe, ctx.message, path)
            .map_err(|e| Error::PartialFailure {
                completed,
                message: format!("delete of '{}' failed: {}", path, e),
            })?;
        debug!("deleted {}", path);
        completed += 1;
    }
    if !actions.deletions.is_empty() {
        report.add_path_section(
            format!("{} files deleted:", actions.deletions.len()),
            &actions.deletions,
        );
    }

    Ok(PushOutcome {
        state: PushState::Done,
        report,
    })
}
