//! # Sync Orchestration
//!
//! The two top-level operations, wired from the component pipeline:
//!
//! - [`pull`]: status → classify → merge the `different` bucket → reduce
//!   the remote-only paths to a minimal fetch set → fetch → materialize to
//!   disk, reporting per-file merge outcomes and the new files that
//!   arrived;
//! - [`push`]: status → classify → plan the local→remote actions →
//!   execute (or dry-run) them in update/add/delete order.
//!
//! Both validate their inputs before any I/O and are idempotent: running
//! them again after success recomputes an unchanged status and reports
//! `"Nothing to do"`.

use crate::api::RecipeService;
use crate::classify::{classify, ReconciliationPlan};
use crate::conflict::{ensure_no_unresolved, ConflictStore};
use crate::error::{Error, Result};
use crate::ignore::IgnoreRules;
use crate::materialize::materialize;
use crate::merge::{merge_all, MergeBatch, MergeContext};
use crate::path::RelativePath;
use crate::push as push_planner;
use crate::push::{PushContext, PushOutcome};
use crate::reduce::{fetch_requests, minimal_paths, MinimalPathSet};
use crate::report::SyncReport;
use crate::tree::RecipeTree;
use log::{info, warn};
use std::path::Path;

/// Collaborators and identifiers for one sync operation.
pub struct SyncContext<'a> {
    pub service: &'a dyn RecipeService,
    pub conflict_store: &'a dyn ConflictStore,
    pub ignore: &'a dyn IgnoreRules,
    pub kitchen: &'a str,
    pub recipe: &'a str,
    /// Local kitchen directory; the recipe lives in a same-named
    /// subdirectory beneath it.
    pub kitchen_root: &'a Path,
    /// Last-known common ancestor revision for three-way merges.
    pub base_revision: Option<&'a str>,
    /// Commit message attached to push mutations.
    pub message: &'a str,
}

impl SyncContext<'_> {
    fn validate(&self) -> Result<()> {
        if self.kitchen.is_empty() {
            return Err(Error::InvalidInput {
                message: "kitchen name is required".to_string(),
            });
        }
        if self.recipe.is_empty() {
            return Err(Error::InvalidInput {
                message: "recipe name is required".to_string(),
            });
        }
        if !self.kitchen_root.is_dir() {
            return Err(Error::PathNotFound {
                path: self.kitchen_root.display().to_string(),
            });
        }
        Ok(())
    }

    fn recipe_root(&self) -> std::path::PathBuf {
        self.kitchen_root.join(self.recipe)
    }
}

/// Current status of the recipe, as a classified plan.
pub fn status(ctx: &SyncContext<'_>) -> Result<ReconciliationPlan> {
    ctx.validate()?;
    let partition = ctx
        .service
        .status(ctx.kitchen, ctx.recipe, ctx.kitchen_root)?;
    classify(partition)
}

/// Render one merge-outcome line per modified file, in sorted order.
fn merge_lines(plan: &ReconciliationPlan, batch: &MergeBatch) -> String {
    let mut lines = Vec::with_capacity(plan.modified_files.len());
    for path in &plan.modified_files {
        let folder = path.parent().unwrap_or_else(RelativePath::root);
        let filename = path.file_name().unwrap_or_default();
        if batch.is_conflicted(&folder, filename) {
            lines.push(format!("CONFLICT (content): Merge conflict in {}", path));
        } else {
            lines.push(format!("Auto-merging '{}'", path));
        }
    }
    lines.join("\n")
}

/// Build the fetch request list for the remote-only bucket.
///
/// Folder markers are reduced to the minimal covering set; files are
/// appended individually unless a reduced folder already covers them.
fn remote_fetch_requests(plan: &ReconciliationPlan) -> Vec<String> {
    let minimal: MinimalPathSet = minimal_paths(plan.remote_only_dirs.iter().cloned());
    let files: Vec<RelativePath> = plan
        .remote_only_files
        .iter()
        .filter(|file| !minimal.keys().any(|dir| dir.is_ancestor_of(file)))
        .cloned()
        .collect();
    fetch_requests(&minimal, &files)
}

/// Pull the remote state into the local working copy.
///
/// Modified files are three-way merged (conflicted results land on disk
/// with markers embedded and are recorded in the conflict store);
/// remote-only content is fetched with a minimal request set and written
/// out. Refuses to start while unresolved conflicts from an earlier run
/// exist.
pub fn pull(ctx: &SyncContext<'_>) -> Result<SyncReport> {
    ctx.validate()?;
    ensure_no_unresolved(ctx.conflict_store, Some(ctx.recipe), ctx.kitchen_root)?;

    let plan = status(ctx)?;
    if plan.is_unchanged() {
        info!("recipe '{}' is up to date", ctx.recipe);
        return Ok(SyncReport::new());
    }

    let mut report = SyncReport::new();

    let batch = if plan.modified_files.is_empty() {
        MergeBatch {
            success: true,
            ..MergeBatch::default()
        }
    } else {
        let merge_ctx = MergeContext {
            service: ctx.service,
            kitchen: ctx.kitchen,
            recipe: ctx.recipe,
            kitchen_root: ctx.kitchen_root,
            base_revision: ctx.base_revision,
        };
        let batch = merge_all(&plan.partition.different, &merge_ctx)?;
        report.add_section(merge_lines(&plan, &batch));
        batch
    };

    let fetched = if plan.has_remote_only() {
        let requests = remote_fetch_requests(&plan);
        ctx.service.fetch(ctx.kitchen, ctx.recipe, &requests)?
    } else {
        RecipeTree::new()
    };

    if !fetched.is_empty() {
        let new_files: Vec<RelativePath> = fetched
            .file_paths()?
            .into_iter()
            .filter_map(|p| p.strip_first_segment())
            .collect();
        if !new_files.is_empty() {
            report.add_path_section(
                format!("{} new or missing files from remote:", new_files.len()),
                &new_files,
            );
        }
    }

    let outcome = materialize(
        ctx.kitchen_root,
        &fetched,
        &batch.merged,
        &batch.conflicts,
        ctx.conflict_store,
        ctx.recipe,
    )?;

    if !batch.success {
        warn!(
            "pull of '{}' finished with {} unresolved conflicts",
            ctx.recipe,
            batch.conflicts.len()
        );
    } else {
        info!(
            "pulled '{}': {} files written",
            ctx.recipe,
            outcome.written.len()
        );
    }
    Ok(report)
}

/// Push local changes to the remote store.
///
/// With `dry_run` set, nothing is sent and the report uses the
/// `"will be"` phrasing; otherwise updates, additions, and deletions run
/// in that order, halting on the first failure with a count of what
/// landed.
pub fn push(ctx: &SyncContext<'_>, dry_run: bool) -> Result<PushOutcome> {
    ctx.validate()?;
    // pushes commit to the remote store, so the message is required too
    if ctx.message.is_empty() {
        return Err(Error::InvalidInput {
            message: "commit message is required".to_string(),
        });
    }

    let plan = status(ctx)?;
    let remote_tree = if plan.remote_only_dirs.is_empty() {
        None
    } else {
        match ctx.service.recipe_tree(ctx.kitchen, ctx.recipe) {
            Ok(tree) => Some(tree),
            Err(e) => {
                warn!("remote tree listing unavailable: {}", e);
                None
            }
        }
    };

    let recipe_root = ctx.recipe_root();
    let actions = push_planner::plan(
        &plan.partition,
        ctx.ignore,
        &recipe_root,
        remote_tree.as_ref(),
    )?;
    let push_ctx = PushContext {
        service: ctx.service,
        kitchen: ctx.kitchen,
        recipe: ctx.recipe,
        recipe_root: &recipe_root,
        message: ctx.message,
    };
    push_planner::execute(&actions, &push_ctx, dry_run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{FileEntry, FourWayPartition};

    fn rp(s: &str) -> RelativePath {
        RelativePath::parse(s).unwrap()
    }

    #[test]
    fn test_merge_lines_mix() {
        let mut partition = FourWayPartition::default();
        partition
            .different
            .add_file(rp("dinner/node1"), FileEntry::new("a.json").unwrap());
        partition
            .different
            .add_file(rp("dinner/node1"), FileEntry::new("b.json").unwrap());
        let plan = classify(partition).unwrap();

        let mut batch = MergeBatch::default();
        batch.conflicts.push(
            crate::conflict::ConflictRecord::new(
                "a.json",
                rp("node1"),
                "dev",
                "dev",
                "none",
                vec![],
            )
            .unwrap(),
        );

        let lines = merge_lines(&plan, &batch);
        assert_eq!(
            lines,
            "CONFLICT (content): Merge conflict in node1/a.json\n\
             Auto-merging 'node1/b.json'"
        );
    }

    #[test]
    fn test_fetch_requests_skip_files_under_reduced_dirs() {
        let mut partition = FourWayPartition::default();
        partition.only_remote.insert_folder(rp("dinner/dir1"));
        partition.only_remote.insert_folder(rp("dinner/dir1/sub"));
        partition
            .only_remote
            .add_file(rp("dinner/dir1/sub"), FileEntry::new("covered.sql").unwrap());
        partition
            .only_remote
            .add_file(rp("dinner/other"), FileEntry::new("kept.sql").unwrap());
        let plan = classify(partition).unwrap();

        let requests = remote_fetch_requests(&plan);
        assert_eq!(
            requests,
            vec!["dir1/*".to_string(), "other/kept.sql".to_string()]
        );
    }
}
