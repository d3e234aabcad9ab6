//! # Relative Paths
//!
//! A small value type for recipe-relative paths. Every path that crosses a
//! component boundary in this crate is a [`RelativePath`]: a normalized,
//! `/`-separated path relative to some root (the kitchen directory for
//! folder keys coming off the wire, the recipe directory once the recipe
//! segment has been stripped).
//!
//! Keeping this a real type instead of raw strings gives us explicit
//! `join`/`strip`/ancestor-check operations and removes any reliance on
//! splitting by platform separator characters. Containment is checked
//! component-wise, so `"a/bc"` is never treated as being under `"a/b"`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A normalized, `/`-separated relative path.
///
/// The empty path is valid and denotes the root itself (a recipe-root folder
/// key strips down to it).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelativePath(String);

impl RelativePath {
    /// The root path (empty).
    pub fn root() -> Self {
        RelativePath(String::new())
    }

    /// Parse and normalize a path string.
    ///
    /// Backslashes are treated as separators, repeated and trailing
    /// separators are collapsed, and `.` segments are dropped. Absolute
    /// paths and `..` segments are rejected; callers are expected to hand
    /// us paths already relative to a known root.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.starts_with('/') || raw.starts_with('\\') {
            return Err(Error::Path {
                message: format!("absolute path not allowed: '{}'", raw),
            });
        }
        let mut segments = Vec::new();
        for segment in raw.split(['/', '\\']) {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(Error::Path {
                        message: format!("parent traversal not allowed: '{}'", raw),
                    })
                }
                s => segments.push(s),
            }
        }
        Ok(RelativePath(segments.join("/")))
    }

    /// The normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty (root) path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over path segments. The root path has no segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Join a child path onto this one.
    pub fn join(&self, child: &str) -> Result<Self> {
        let child = RelativePath::parse(child)?;
        if self.is_root() {
            return Ok(child);
        }
        if child.is_root() {
            return Ok(self.clone());
        }
        Ok(RelativePath(format!("{}/{}", self.0, child.0)))
    }

    /// The final segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Everything but the final segment. Returns `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(RelativePath(self.0[..idx].to_string())),
            None => Some(RelativePath::root()),
        }
    }

    /// Drop the leading segment.
    ///
    /// Folder keys in server payloads are prefixed with the recipe name;
    /// stripping that segment yields the path relative to the recipe root.
    /// Returns `None` on the root path.
    pub fn strip_first_segment(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.find('/') {
            Some(idx) => Some(RelativePath(self.0[idx + 1..].to_string())),
            None => Some(RelativePath::root()),
        }
    }

    /// Strict, component-wise ancestor check.
    ///
    /// `a/b` is an ancestor of `a/b/c` but not of `a/bc`, and no path is
    /// its own ancestor. The root is an ancestor of every non-root path.
    pub fn is_ancestor_of(&self, other: &RelativePath) -> bool {
        if self == other {
            return false;
        }
        if self.is_root() {
            return !other.is_root();
        }
        other.0.starts_with(&self.0) && other.0.as_bytes().get(self.0.len()) == Some(&b'/')
    }

    /// Convert to a native path for disk I/O, rooted nowhere.
    pub fn to_native(&self) -> PathBuf {
        self.segments().collect()
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rp(s: &str) -> RelativePath {
        RelativePath::parse(s).unwrap()
    }

    #[test]
    fn test_parse_normalizes_separators() {
        assert_eq!(rp("a\\b\\c").as_str(), "a/b/c");
        assert_eq!(rp("a//b/").as_str(), "a/b");
        assert_eq!(rp("./a/./b").as_str(), "a/b");
        assert_eq!(rp("").as_str(), "");
    }

    #[test]
    fn test_parse_rejects_absolute_and_traversal() {
        assert!(RelativePath::parse("/etc/passwd").is_err());
        assert!(RelativePath::parse("a/../b").is_err());
    }

    #[test]
    fn test_join() {
        assert_eq!(rp("a/b").join("c.txt").unwrap().as_str(), "a/b/c.txt");
        assert_eq!(RelativePath::root().join("c.txt").unwrap().as_str(), "c.txt");
        assert_eq!(rp("a").join("").unwrap().as_str(), "a");
    }

    #[test]
    fn test_file_name_and_parent() {
        assert_eq!(rp("a/b/c.txt").file_name(), Some("c.txt"));
        assert_eq!(rp("a/b/c.txt").parent().unwrap().as_str(), "a/b");
        assert_eq!(rp("a").parent().unwrap(), RelativePath::root());
        assert_eq!(RelativePath::root().parent(), None);
        assert_eq!(RelativePath::root().file_name(), None);
    }

    #[test]
    fn test_strip_first_segment() {
        assert_eq!(rp("recipe/node1/file.json").strip_first_segment().unwrap().as_str(), "node1/file.json");
        assert_eq!(rp("recipe").strip_first_segment().unwrap(), RelativePath::root());
        assert_eq!(RelativePath::root().strip_first_segment(), None);
    }

    #[test]
    fn test_is_ancestor_of_is_strict_and_component_wise() {
        assert!(rp("a/b").is_ancestor_of(&rp("a/b/c")));
        assert!(rp("a").is_ancestor_of(&rp("a/b/c")));
        // prefix of a segment is not containment
        assert!(!rp("a/b").is_ancestor_of(&rp("a/bc")));
        // strict: not an ancestor of itself
        assert!(!rp("a/b").is_ancestor_of(&rp("a/b")));
        // no path is an ancestor of the root
        assert!(!rp("a").is_ancestor_of(&RelativePath::root()));
        assert!(RelativePath::root().is_ancestor_of(&rp("a")));
        assert!(!RelativePath::root().is_ancestor_of(&RelativePath::root()));
    }

    #[test]
    fn test_to_native() {
        let native = rp("a/b/c.txt").to_native();
        assert_eq!(native, PathBuf::from("a").join("b").join("c.txt"));
    }
}
