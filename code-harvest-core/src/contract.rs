//! # contract: the seams between the pipeline and the hosting platform
//!
//! The pipeline talks to the outside world through three async traits:
//! - [`CodeSearch`]: one code-search query per keyword (authenticated).
//! - [`RawFetch`]: download of a file's raw text from its `download_url` (unauthenticated).
//! - [`ContentStore`]: probe and create-or-update of the published file (authenticated).
//!
//! The wire types below mirror the JSON the GitHub REST API sends and expects; fields the
//! pipeline does not need are left out.
//!
//! ## Mocking & Testing
//! Each trait is annotated for `mockall`; the generated `Mock*` types are exported under the
//! `test-export-mocks` feature so integration tests can drive the pipeline without a network.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::config::TargetFile;
use crate::error::HarvestError;

/// Repository a search hit belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRepository {
    pub full_name: String,
}

/// One item of a code-search response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    /// Browser URL of the file; used as provenance.
    #[serde(default)]
    pub html_url: Option<String>,
    /// Direct raw-content URL. Items without one are skipped.
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub repository: Option<SearchRepository>,
}

/// One page of code-search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

/// State of the published file as returned by a successful probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Revision token required to update the file.
    pub sha: String,
}

/// Body of a create-or-update call on the contents API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpdate {
    pub message: String,
    /// Base64-encoded file content.
    pub content: String,
    pub branch: String,
    /// Present when updating an existing file, absent when creating it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// What the contents API reported after a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    /// `true` for 201 Created, `false` for 200 OK (update).
    pub created: bool,
    pub commit_sha: Option<String>,
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CodeSearch: Send + Sync {
    /// Run one code-search query for `keyword`, returning the first page of up to `per_page` items.
    async fn search_code(&self, keyword: &str, per_page: u32) -> Result<SearchPage, HarvestError>;
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RawFetch: Send + Sync {
    /// Download the raw text behind `url`. Non-success statuses are errors.
    async fn fetch_raw(&self, url: &str) -> Result<String, HarvestError>;
}

/// Access to the file the aggregate document is published to.
///
/// Implementors map a 404 on probe to `Ok(None)` and every other non-success status to an error.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn probe_file(&self, target: &TargetFile) -> Result<Option<RemoteFile>, HarvestError>;

    async fn put_file(
        &self,
        target: &TargetFile,
        update: FileUpdate,
    ) -> Result<WriteOutcome, HarvestError>;
}
