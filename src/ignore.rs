//! Ignore rules for sync and push candidates.
//!
//! The core consults an [`IgnoreRules`] implementation before acting on any
//! path; ignored paths are silently excluded from plans and reports. The
//! built-in [`DefaultIgnore`] covers the usual working-copy metadata and
//! editor droppings.

use crate::path::RelativePath;
use glob::Pattern;

/// Decides whether a path should be excluded from sync operations.
pub trait IgnoreRules {
    fn is_ignored(&self, path: &RelativePath) -> bool;
}

/// Glob-pattern based ignore rules.
///
/// A pattern matches if it matches the full path or any single segment of
/// it, so `.DS_Store` is ignored anywhere in the tree.
pub struct DefaultIgnore {
    patterns: Vec<Pattern>,
}

const DEFAULT_PATTERNS: &[&str] = &[
    ".DS_Store",
    ".git",
    ".gitignore",
    "*.pyc",
    "*.swp",
    "*~",
    "compiled-recipe",
];

impl DefaultIgnore {
    pub fn new() -> Self {
        // patterns are literals; compiling them cannot fail
        let patterns = DEFAULT_PATTERNS
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .collect();
        DefaultIgnore { patterns }
    }

    /// Extend the defaults with caller-supplied glob patterns. Invalid
    /// patterns are reported back rather than dropped.
    pub fn with_patterns(extra: &[&str]) -> Result<Self, glob::PatternError> {
        let mut ignore = DefaultIgnore::new();
        for raw in extra {
            ignore.patterns.push(Pattern::new(raw)?);
        }
        Ok(ignore)
    }
}

impl Default for DefaultIgnore {
    fn default() -> Self {
        Self::new()
    }
}

impl IgnoreRules for DefaultIgnore {
    fn is_ignored(&self, path: &RelativePath) -> bool {
        self.patterns.iter().any(|pattern| {
            pattern.matches(path.as_str()) || path.segments().any(|s| pattern.matches(s))
        })
    }
}

/// Ignores nothing. Useful for tests and callers that pre-filter.
pub struct IgnoreNothing;

impl IgnoreRules for IgnoreNothing {
    fn is_ignored(&self, _path: &RelativePath) -> bool {
        false
    }
}
