//! # Merge Engine
//!
//! Resolves the `different` bucket: for every file that changed both
//! locally and remotely, the local content is sent to the merge
//! collaborator together with the last-known common ancestor revision, and
//! the result is folded back into a tree of merged content.
//!
//! Failure semantics, in order of severity:
//!
//! - no common ancestor revision: the batch cannot start ([`crate::error::Error::NoCommonAncestor`]);
//! - a local file vanished since classification: the whole batch aborts
//!   ([`crate::error::Error::LocalFileMissing`]);
//! - the merge service call fails: the batch aborts with the service error;
//! - the merged content carries conflict markers: *not* fatal. A
//!   [`ConflictRecord`] is captured, the marker-bearing content stays in
//!   the merged tree (it will be written to disk for in-place resolution),
//!   `success` drops to `false`, and the batch continues with the
//!   remaining files.

use crate::api::{encode_content, RecipeService, NO_PRIOR_SHA};
use crate::conflict::{has_conflict_markers, ConflictRecord};
use crate::error::{Error, Result};
use crate::path::RelativePath;
use crate::tree::{FileEntry, RecipeTree};
use log::{debug, warn};
use std::io::ErrorKind;
use std::path::Path;

/// Everything the merge engine needs besides the bucket itself.
pub struct MergeContext<'a> {
    pub service: &'a dyn RecipeService,
    pub kitchen: &'a str,
    pub recipe: &'a str,
    /// Local directory the partition's folder keys are relative to (the
    /// kitchen root; folder keys still carry the recipe segment).
    pub kitchen_root: &'a Path,
    /// Last-known common ancestor revision, from the recipe metadata.
    pub base_revision: Option<&'a str>,
}

/// Result of merging one `different` bucket.
#[derive(Debug, Default)]
pub struct MergeBatch {
    /// False as soon as any file conflicted.
    pub success: bool,
    /// Merged content per folder, clean and conflicted alike, keyed like
    /// the input bucket (recipe segment included).
    pub merged: RecipeTree,
    /// One record per conflicted file.
    pub conflicts: Vec<ConflictRecord>,
}

impl MergeBatch {
    /// Is this `(stripped folder, filename)` pair one of the conflicts?
    pub fn is_conflicted(&self, folder: &RelativePath, filename: &str) -> bool {
        self.conflicts
            .iter()
            .any(|c| c.folder_in_recipe == *folder && c.filename == filename)
    }
}

/// Merge every file in the `different` bucket.
pub fn merge_all(different: &RecipeTree, ctx: &MergeContext<'_>) -> Result<MergeBatch> {
    let base_revision = ctx.base_revision.ok_or_else(|| Error::NoCommonAncestor {
        recipe: ctx.recipe.to_string(),
    })?;

    let mut batch = MergeBatch {
        success: true,
        ..MergeBatch::default()
    };

    for (folder, entry) in different.files() {
        let local_path = ctx
            .kitchen_root
            .join(folder.to_native())
            .join(&entry.filename);
        let local_content = match std::fs::read(&local_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::LocalFileMissing {
                    path: local_path.display().to_string(),
                })
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let stripped = folder
            .strip_first_segment()
            .unwrap_or_else(RelativePath::root);
        let rel_path = stripped.join(&entry.filename)?;
        debug!("merging '{}' against kitchen '{}'", rel_path, ctx.kitchen);

        let response = ctx.service.merge_file(
            ctx.kitchen,
            ctx.recipe,
            &rel_path,
            &encode_content(&local_content),
            base_revision,
            NO_PRIOR_SHA,
        )?;
        let merged_content = response.decode()?;

        if has_conflict_markers(&merged_content) {
            warn!("merge conflict in '{}'", rel_path);
            batch.success = false;
            batch.conflicts.push(ConflictRecord::new(
                &entry.filename,
                stripped.clone(),
                ctx.kitchen,
                ctx.kitchen,
                entry.sha.as_deref().unwrap_or(NO_PRIOR_SHA),
                merged_content.clone(),
            )?);
        }

        batch.merged.add_file(
            folder.clone(),
            FileEntry {
                filename: entry.filename.clone(),
                content: Some(merged_content),
                sha: entry.sha.clone(),
            },
        );
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{KitchenInfo, MergeResponse, MergeStatus, ServingSummary};
    use crate::tree::FourWayPartition;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    fn rp(s: &str) -> RelativePath {
        RelativePath::parse(s).unwrap()
    }

    /// Scripted merge collaborator: maps rel path -> canned response.
    struct ScriptedMerge {
        responses: RefCell<Vec<(String, MergeResponse)>>,
    }

    impl ScriptedMerge {
        fn new(responses: Vec<(&str, MergeStatus, &[u8])>) -> Self {
            let responses = responses
                .into_iter()
                .map(|(path, status, content)| {
                    (
                        path.to_string(),
                        MergeResponse {
                            status,
                            merged_content: encode_content(content),
                        },
                    )
                })
                .collect();
            ScriptedMerge {
                responses: RefCell::new(responses),
            }
        }
    }

    impl RecipeService for ScriptedMerge {
        fn status(&self, _: &str, _: &str, _: &Path) -> Result<FourWayPartition> {
            unimplemented!("not used in merge tests")
        }
        fn fetch(&self, _: &str, _: &str, _: &[String]) -> Result<RecipeTree> {
            unimplemented!("not used in merge tests")
        }
        fn merge_file(
            &self,
            _: &str,
            _: &str,
            path: &RelativePath,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<MergeResponse> {
            let responses = self.responses.borrow();
            responses
                .iter()
                .find(|(p, _)| p == path.as_str())
                .map(|(_, r)| r.clone())
                .ok_or_else(|| Error::Service {
                    message: format!("unexpected merge for '{}'", path),
                })
        }
        fn add_file(&self, _: &str, _: &str, _: &str, _: &RelativePath, _: &[u8]) -> Result<()> {
            unimplemented!()
        }
        fn update_file(&self, _: &str, _: &str, _: &str, _: &RelativePath, _: &[u8]) -> Result<()> {
            unimplemented!()
        }
        fn delete_file(&self, _: &str, _: &str, _: &str, _: &RelativePath) -> Result<()> {
            unimplemented!()
        }
        fn recipe_tree(&self, _: &str, _: &str) -> Result<RecipeTree> {
            unimplemented!()
        }
        fn list_kitchens(&self) -> Result<Vec<KitchenInfo>> {
            unimplemented!()
        }
        fn list_recipes(&self, _: &str) -> Result<Vec<String>> {
            unimplemented!()
        }
        fn active_servings(&self, _: &str) -> Result<Vec<ServingSummary>> {
            unimplemented!()
        }
    }

    fn write_local(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn different_with(files: &[(&str, &str)]) -> RecipeTree {
        let mut tree = RecipeTree::new();
        for (folder, name) in files {
            tree.add_file(rp(folder), FileEntry::new(name).unwrap());
        }
        tree
    }

    #[test]
    fn test_clean_merge_batch() {
        let tmp = TempDir::new().unwrap();
        write_local(tmp.path(), "dinner/node1/a.json", "local a");
        let service = ScriptedMerge::new(vec![(
            "node1/a.json",
            MergeStatus::Success,
            b"merged a",
        )]);
        let ctx = MergeContext {
            service: &service,
            kitchen: "dev",
            recipe: "dinner",
            kitchen_root: tmp.path(),
            base_revision: Some("abc123"),
        };

        let batch = merge_all(&different_with(&[("dinner/node1", "a.json")]), &ctx).unwrap();
        assert!(batch.success);
        assert!(batch.conflicts.is_empty());
        let (_, entry) = batch.merged.files().next().unwrap();
        assert_eq!(entry.content.as_deref(), Some(b"merged a".as_slice()));
    }

    #[test]
    fn test_conflict_recorded_and_batch_continues() {
        let tmp = TempDir::new().unwrap();
        write_local(tmp.path(), "dinner/node1/a.json", "local a");
        write_local(tmp.path(), "dinner/node1/b.json", "local b");
        let conflicted = b"<<<<<<< local\nA\n=======\nB\n>>>>>>> remote\n";
        let service = ScriptedMerge::new(vec![
            ("node1/a.json", MergeStatus::Conflict, conflicted),
            ("node1/b.json", MergeStatus::Success, b"merged b"),
        ]);
        let ctx = MergeContext {
            service: &service,
            kitchen: "dev",
            recipe: "dinner",
            kitchen_root: tmp.path(),
            base_revision: Some("abc123"),
        };

        let batch = merge_all(
            &different_with(&[("dinner/node1", "a.json"), ("dinner/node1", "b.json")]),
            &ctx,
        )
        .unwrap();
        // conflicted file does not stop the batch, but success drops
        assert!(!batch.success);
        assert_eq!(batch.merged.file_count(), 2);
        assert_eq!(batch.conflicts.len(), 1);
        let record = &batch.conflicts[0];
        assert_eq!(record.filename, "a.json");
        assert_eq!(record.folder_in_recipe, rp("node1"));
        assert_eq!(record.from_kitchen, "dev");
        assert!(batch.is_conflicted(&rp("node1"), "a.json"));
        assert!(!batch.is_conflicted(&rp("node1"), "b.json"));
    }

    #[test]
    fn test_partial_markers_is_clean_merge() {
        let tmp = TempDir::new().unwrap();
        write_local(tmp.path(), "dinner/node1/a.json", "local a");
        // missing the closing marker: treated as a clean merge
        let service = ScriptedMerge::new(vec![(
            "node1/a.json",
            MergeStatus::Success,
            b"<<<<<<< local\nA\n=======\n",
        )]);
        let ctx = MergeContext {
            service: &service,
            kitchen: "dev",
            recipe: "dinner",
            kitchen_root: tmp.path(),
            base_revision: Some("abc123"),
        };

        let batch = merge_all(&different_with(&[("dinner/node1", "a.json")]), &ctx).unwrap();
        assert!(batch.success);
        assert!(batch.conflicts.is_empty());
    }

    #[test]
    fn test_missing_local_file_aborts_batch() {
        let tmp = TempDir::new().unwrap();
        let service = ScriptedMerge::new(vec![]);
        let ctx = MergeContext {
            service: &service,
            kitchen: "dev",
            recipe: "dinner",
            kitchen_root: tmp.path(),
            base_revision: Some("abc123"),
        };

        let err = merge_all(&different_with(&[("dinner/node1", "gone.json")]), &ctx).unwrap_err();
        assert!(matches!(err, Error::LocalFileMissing { .. }));
    }

    #[test]
    fn test_no_base_revision_aborts_immediately() {
        let tmp = TempDir::new().unwrap();
        let service = ScriptedMerge::new(vec![]);
        let ctx = MergeContext {
            service: &service,
            kitchen: "dev",
            recipe: "dinner",
            kitchen_root: tmp.path(),
            base_revision: None,
        };
        let err = merge_all(&different_with(&[("dinner/node1", "a.json")]), &ctx).unwrap_err();
        assert!(matches!(err, Error::NoCommonAncestor { .. }));
    }

    #[test]
    fn test_identical_content_round_trips() {
        let tmp = TempDir::new().unwrap();
        write_local(tmp.path(), "dinner/node1/a.json", "same everywhere");
        let service = ScriptedMerge::new(vec![(
            "node1/a.json",
            MergeStatus::Success,
            b"same everywhere",
        )]);
        let ctx = MergeContext {
            service: &service,
            kitchen: "dev",
            recipe: "dinner",
            kitchen_root: tmp.path(),
            base_revision: Some("abc123"),
        };
        let batch = merge_all(&different_with(&[("dinner/node1", "a.json")]), &ctx).unwrap();
        assert!(batch.success);
        let (_, entry) = batch.merged.files().next().unwrap();
        assert_eq!(entry.content.as_deref(), Some(b"same everywhere".as_slice()));
    }
}
