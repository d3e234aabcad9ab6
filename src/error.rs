//! # Error Handling
//!
//! Centralized error handling for the reconciliation core. The `Error` enum
//! covers every anticipated failure mode with enough context to produce a
//! useful message, and the `Result<T>` alias is used throughout the crate.
//!
//! A few things are deliberately *not* errors here:
//!
//! - A merge that produces conflict markers is a recorded outcome
//!   ([`crate::conflict::ConflictRecord`]), not a failure: the batch keeps
//!   going and the conflicted content is written to disk for in-place
//!   resolution.
//! - Paths excluded by ignore rules are silently skipped.
//!
//! Batch operations (merge, push, materialize) follow a partial-failure
//! policy: the first hard failure halts the remaining actions in that
//! category, and the error message is prefixed with what succeeded so far.

use thiserror::Error;

/// Main error type for recipe-sync operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required parameter (kitchen, recipe, commit message, ...) was
    /// missing or empty. Rejected before any I/O happens.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A local directory that the operation needs does not exist.
    #[error("Path not found: {path}")]
    PathNotFound { path: String },

    /// A call to the remote service collaborator failed. The message is
    /// passed through from the collaborator.
    #[error("Service error: {message}")]
    Service { message: String },

    /// A local file vanished between classification and the action that
    /// needed it. Fatal for the whole batch it occurred in.
    #[error("Local file missing: {path}")]
    LocalFileMissing { path: String },

    /// No common ancestor revision is known for the recipe, so a three-way
    /// merge cannot be performed.
    #[error("No common ancestor revision for recipe '{recipe}'")]
    NoCommonAncestor { recipe: String },

    /// A structural invariant was broken, e.g. partition buckets overlap.
    /// Should never occur if the collaborator contracts hold.
    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    /// A batch operation failed partway through. `completed` counts the
    /// actions that succeeded before the failure; no rollback is attempted
    /// (re-running the sync is safe because status recomputation is
    /// idempotent).
    #[error("{completed} actions completed before failure: {message}")]
    PartialFailure { completed: usize, message: String },

    /// An error occurred with a path-related operation.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// An error occurred while recording or loading conflict metadata.
    #[error("Conflict metadata error: {message}")]
    ConflictMeta { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
