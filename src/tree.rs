//! # Recipe Trees
//!
//! In-memory snapshot types for a recipe's contents. A [`RecipeTree`] maps
//! folder paths (relative to the kitchen or recipe root) to the ordered
//! file entries inside them; a [`FourWayPartition`] is the server's
//! same/different/local-only/remote-only classification of one recipe,
//! produced once per reconciliation attempt.
//!
//! A folder key with an empty entry list is meaningful: it marks a folder
//! that exists on only one side ("whole folder local-only / remote-only")
//! without enumerating its files.

use crate::error::{Error, Result};
use crate::path::RelativePath;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single file in a recipe listing.
///
/// Identity is `(folder, filename)`; content and sha are lazily populated
/// depending on which API call produced the listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

impl FileEntry {
    /// Create an entry with no content or sha. The filename must be a bare
    /// name, not a path.
    pub fn new(filename: &str) -> Result<Self> {
        if filename.is_empty() {
            return Err(Error::InvalidInput {
                message: "file entry requires a filename".to_string(),
            });
        }
        if filename.contains('/') || filename.contains('\\') {
            return Err(Error::InvalidInput {
                message: format!("filename must not contain separators: '{}'", filename),
            });
        }
        Ok(FileEntry {
            filename: filename.to_string(),
            content: None,
            sha: None,
        })
    }

    /// Create an entry carrying content.
    pub fn with_content(filename: &str, content: Vec<u8>) -> Result<Self> {
        let mut entry = FileEntry::new(filename)?;
        entry.content = Some(content);
        Ok(entry)
    }

    /// Create an entry carrying a content hash.
    pub fn with_sha(filename: &str, sha: &str) -> Result<Self> {
        let mut entry = FileEntry::new(filename)?;
        entry.sha = Some(sha.to_string());
        Ok(entry)
    }
}

/// A snapshot of a recipe's contents, local or remote.
///
/// Backed by a `BTreeMap` so iteration (and therefore reports and write
/// order) is deterministic, and no two folders can share a normalized path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeTree {
    folders: BTreeMap<RelativePath, Vec<FileEntry>>,
}

impl RecipeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a folder key exists, possibly with no entries (a folder-level
    /// marker).
    pub fn insert_folder(&mut self, folder: RelativePath) {
        self.folders.entry(folder).or_default();
    }

    /// Add a file entry under a folder, creating the folder key if needed.
    pub fn add_file(&mut self, folder: RelativePath, entry: FileEntry) {
        self.folders.entry(folder).or_default().push(entry);
    }

    /// Entries directly under a folder, if the folder key exists.
    pub fn entries(&self, folder: &RelativePath) -> Option<&[FileEntry]> {
        self.folders.get(folder).map(|v| v.as_slice())
    }

    /// Iterate over folder keys and their entries.
    pub fn folders(&self) -> impl Iterator<Item = (&RelativePath, &[FileEntry])> {
        self.folders.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Iterate over every `(folder, entry)` pair.
    pub fn files(&self) -> impl Iterator<Item = (&RelativePath, &FileEntry)> {
        self.folders
            .iter()
            .flat_map(|(folder, entries)| entries.iter().map(move |e| (folder, e)))
    }

    /// Full identity set: `folder/filename` for every file.
    pub fn file_paths(&self) -> Result<Vec<RelativePath>> {
        let mut paths = Vec::new();
        for (folder, entry) in self.files() {
            paths.push(folder.join(&entry.filename)?);
        }
        Ok(paths)
    }

    pub fn file_count(&self) -> usize {
        self.folders.values().map(|v| v.len()).sum()
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Merge another tree into this one. Entries for a folder present in
    /// both are appended in order.
    pub fn merge(&mut self, other: RecipeTree) {
        for (folder, entries) in other.folders {
            self.folders.entry(folder).or_default().extend(entries);
        }
    }
}

/// The server-provided four-way classification of one recipe.
///
/// Every file in the union of the local and remote trees appears in exactly
/// one bucket; [`FourWayPartition::ensure_disjoint`] checks that invariant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FourWayPartition {
    #[serde(default)]
    pub same: RecipeTree,
    #[serde(default)]
    pub different: RecipeTree,
    #[serde(default)]
    pub only_local: RecipeTree,
    #[serde(default)]
    pub only_remote: RecipeTree,
}

impl FourWayPartition {
    /// True when there is nothing to reconcile in either direction.
    pub fn is_unchanged(&self) -> bool {
        self.different.is_empty() && self.only_local.is_empty() && self.only_remote.is_empty()
    }

    /// Verify the buckets are pairwise disjoint on file identity.
    ///
    /// A violation means the status collaborator broke its contract; callers
    /// treat it as fatal.
    pub fn ensure_disjoint(&self) -> Result<()> {
        let buckets: [(&str, &RecipeTree); 4] = [
            ("same", &self.same),
            ("different", &self.different),
            ("only_local", &self.only_local),
            ("only_remote", &self.only_remote),
        ];
        let mut seen: BTreeMap<RelativePath, &str> = BTreeMap::new();
        for (name, tree) in buckets {
            let mut bucket_paths = BTreeSet::new();
            for path in tree.file_paths()? {
                // duplicates within one bucket are fine to pass through once
                if !bucket_paths.insert(path.clone()) {
                    continue;
                }
                if let Some(prior) = seen.insert(path.clone(), name) {
                    return Err(Error::InvariantViolation {
                        message: format!(
                            "file '{}' appears in both '{}' and '{}' buckets",
                            path, prior, name
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}
