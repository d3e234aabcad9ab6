//! # recipe-sync
//!
//! Client-side reconciliation engine for recipe working copies. A *kitchen*
//! is a remote branch-like workspace holding *recipes* (directory trees of
//! files); this crate keeps a local working copy and the remote store in
//! agreement in both directions:
//!
//! - **pull** ([`sync::pull`]): classify the differences, three-way merge
//!   files modified on both sides, fetch remote-only content with a minimal
//!   request set, and write the results to disk. Merge conflicts are not
//!   fatal: the marker-bearing content lands on disk for in-place
//!   resolution and a [`conflict::ConflictRecord`] is kept until resolved.
//! - **push** ([`sync::push`]): plan and execute the local→remote updates,
//!   additions, and deletions, with a dry-run mode that reports the plan
//!   without sending anything.
//!
//! The network boundary is the [`api::RecipeService`] trait; conflict
//! metadata persistence is the [`conflict::ConflictStore`] trait. Both are
//! implemented by the surrounding application (and by scripted mocks in
//! this crate's tests). A background [`watcher::ServingWatcher`] can poll a
//! kitchen's active servings while other work proceeds.

pub mod api;
pub mod classify;
pub mod conflict;
pub mod error;
pub mod ignore;
pub mod materialize;
pub mod merge;
pub mod path;
pub mod push;
pub mod reduce;
pub mod report;
pub mod sync;
pub mod tree;
pub mod watcher;

#[cfg(test)]
mod reduce_proptest;

pub use error::{Error, Result};
