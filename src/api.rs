//! # Service Collaborator Contract
//!
//! The reconciliation core never talks to the network itself; it depends on
//! the [`RecipeService`] trait, implemented elsewhere by the real transport
//! layer (and by scripted mocks in tests). Keeping the boundary a trait
//! means the core is checked against the contract at compile time; there
//! is no runtime "is this the right API object" test at each entry point.
//!
//! File content crosses the merge endpoint base64-encoded; the
//! [`MergeResponse`] wire type carries the encoded result plus a
//! success/conflict status.

use crate::error::{Error, Result};
use crate::path::RelativePath;
use crate::tree::{FourWayPartition, RecipeTree};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sentinel sent as the last-known sha when no prior sha is recorded.
pub const NO_PRIOR_SHA: &str = "none";

/// Outcome status of a server-side file merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStatus {
    Success,
    Conflict,
}

/// Wire response from the merge endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MergeResponse {
    pub status: MergeStatus,
    /// Base64-encoded merged content; on conflict it embeds the literal
    /// conflict markers.
    pub merged_content: String,
}

impl MergeResponse {
    /// Decode the merged content.
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64.decode(&self.merged_content).map_err(|e| Error::Service {
            message: format!("merge response content is not valid base64: {}", e),
        })
    }
}

/// Encode local file content for the merge endpoint.
pub fn encode_content(content: &[u8]) -> String {
    BASE64.encode(content)
}

/// A kitchen as reported by the listing endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KitchenInfo {
    pub name: String,
    #[serde(rename = "parent-kitchen")]
    pub parent_kitchen: String,
}

/// Summary of one active serving (order run) for the background watcher.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServingSummary {
    pub order_id: String,
    pub order_run_id: String,
    pub status: String,
}

/// The transport/API collaborator.
///
/// Implementations perform the actual network calls and authentication;
/// every failure surfaces as [`Error::Service`] with the collaborator's
/// message passed through.
pub trait RecipeService {
    /// Classify a recipe's files between the local working copy and the
    /// remote store into the four-way partition.
    fn status(
        &self,
        kitchen: &str,
        recipe: &str,
        local_path: &Path,
    ) -> Result<FourWayPartition>;

    /// Fetch recipe content for the given paths. A trailing `/*` on a path
    /// requests a whole directory.
    fn fetch(&self, kitchen: &str, recipe: &str, paths: &[String]) -> Result<RecipeTree>;

    /// Three-way merge of one file against the remote version.
    fn merge_file(
        &self,
        kitchen: &str,
        recipe: &str,
        path: &RelativePath,
        local_content_b64: &str,
        base_revision: &str,
        last_sha: &str,
    ) -> Result<MergeResponse>;

    fn add_file(
        &self,
        kitchen: &str,
        recipe: &str,
        message: &str,
        path: &RelativePath,
        content: &[u8],
    ) -> Result<()>;

    fn update_file(
        &self,
        kitchen: &str,
        recipe: &str,
        message: &str,
        path: &RelativePath,
        content: &[u8],
    ) -> Result<()>;

    fn delete_file(&self, kitchen: &str, recipe: &str, message: &str, path: &RelativePath)
        -> Result<()>;

    /// Authoritative full listing of the remote recipe tree.
    fn recipe_tree(&self, kitchen: &str, recipe: &str) -> Result<RecipeTree>;

    fn list_kitchens(&self) -> Result<Vec<KitchenInfo>>;

    fn list_recipes(&self, kitchen: &str) -> Result<Vec<String>>;

    /// Active servings in a kitchen, polled by the watcher.
    fn active_servings(&self, kitchen: &str) -> Result<Vec<ServingSummary>>;
}
