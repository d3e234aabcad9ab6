//! # Merge Conflicts
//!
//! Conflict detection and the record type persisted while a conflict is
//! outstanding. A merge result is *conflicted* iff its content contains all
//! three literal marker sequences (`<<<<<<<`, `=======`, `>>>>>>>`); a
//! subset of markers is treated as a clean merge. That rule is preserved
//! verbatim from the long-standing behavior and locked in by tests.
//!
//! Records are persisted through the external [`ConflictStore`]
//! collaborator and cleared by an explicit resolution action. Operations
//! such as a kitchen merge refuse to proceed while unresolved records
//! exist; [`ensure_no_unresolved`] is that gate.

use crate::error::{Error, Result};
use crate::path::RelativePath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Opening conflict marker.
pub const MARKER_BEGIN: &[u8] = b"<<<<<<<";
/// Separator conflict marker.
pub const MARKER_MIDDLE: &[u8] = b"=======";
/// Closing conflict marker.
pub const MARKER_END: &[u8] = b">>>>>>>";

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// True iff the content carries all three conflict markers.
pub fn has_conflict_markers(content: &[u8]) -> bool {
    contains(content, MARKER_BEGIN)
        && contains(content, MARKER_MIDDLE)
        && contains(content, MARKER_END)
}

/// One outstanding merge conflict.
///
/// Created during merge resolution, handed to the [`ConflictStore`], and
/// consumed by an explicit conflict-resolution action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub filename: String,
    pub folder_in_recipe: RelativePath,
    pub from_kitchen: String,
    pub to_kitchen: String,
    pub sha: String,
    /// The merged content with markers embedded.
    pub conflict_tags: Vec<u8>,
}

impl ConflictRecord {
    /// Build a record, validating required fields up front.
    pub fn new(
        filename: &str,
        folder_in_recipe: RelativePath,
        from_kitchen: &str,
        to_kitchen: &str,
        sha: &str,
        conflict_tags: Vec<u8>,
    ) -> Result<Self> {
        if filename.is_empty() {
            return Err(Error::InvalidInput {
                message: "conflict record requires a filename".to_string(),
            });
        }
        if from_kitchen.is_empty() || to_kitchen.is_empty() {
            return Err(Error::InvalidInput {
                message: format!(
                    "conflict record for '{}' requires source and target kitchens",
                    filename
                ),
            });
        }
        Ok(ConflictRecord {
            filename: filename.to_string(),
            folder_in_recipe,
            from_kitchen: from_kitchen.to_string(),
            to_kitchen: to_kitchen.to_string(),
            sha: sha.to_string(),
            conflict_tags,
        })
    }

    /// Stable key identifying the conflict in the metadata store.
    pub fn key(&self, recipe: &str) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.from_kitchen, self.to_kitchen, recipe, self.folder_in_recipe, self.filename
        )
    }
}

/// Unresolved conflicts, keyed recipe -> folder -> conflict key.
pub type UnresolvedConflicts =
    BTreeMap<String, BTreeMap<RelativePath, BTreeMap<String, ConflictRecord>>>;

/// The on-disk conflict-metadata collaborator.
pub trait ConflictStore {
    /// Persist a record. Ownership of the conflict transfers to the store.
    fn record_conflict(
        &self,
        record: &ConflictRecord,
        folder: &RelativePath,
        recipe: &str,
        root_dir: &Path,
    ) -> Result<()>;

    /// All unresolved records, optionally limited to one recipe.
    fn unresolved(&self, recipe: Option<&str>, root_dir: &Path) -> Result<UnresolvedConflicts>;
}

/// Render the unresolved-conflict report.
pub fn format_unresolved(conflicts: &UnresolvedConflicts) -> String {
    let mut msg = String::from("There are unresolved conflicts\n");
    for (recipe, folders) in conflicts {
        if folders.is_empty() {
            continue;
        }
        msg.push_str(&format!("\tUnresolved conflicts for recipe '{}'\n", recipe));
        for records in folders.values() {
            for record in records.values() {
                msg.push_str(&format!(
                    "\t\t{}/{}\n",
                    record.folder_in_recipe, record.filename
                ));
            }
        }
    }
    msg
}

/// Fail when unresolved conflicts exist. Used to gate kitchen merges.
pub fn ensure_no_unresolved(
    store: &dyn ConflictStore,
    recipe: Option<&str>,
    root_dir: &Path,
) -> Result<()> {
    let unresolved = store.unresolved(recipe, root_dir)?;
    let any = unresolved.values().any(|folders| {
        folders.values().any(|records| !records.is_empty())
    });
    if any {
        return Err(Error::ConflictMeta {
            message: format_unresolved(&unresolved),
        });
    }
    Ok(())
}
