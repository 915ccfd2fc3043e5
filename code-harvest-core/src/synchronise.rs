//! High-level pipeline: orchestrates search → aggregate → publish.
//!
//! # Responsibilities
//! - Runs the [`search::harvest`] pass over every configured keyword
//! - Skips publishing entirely when nothing was collected (the remote file is left untouched)
//! - Otherwise hands the snippets to [`publish::publish`]
//! - Aggregates everything into a [`SynchroniseReport`]
//!
//! # Error Handling
//! Best effort throughout: [`synchronise`] never fails. Search and fetch failures live in
//! [`HarvestReport::failures`], a failed probe or write in [`PublishStatus::Failed`].
//!
//! # Callable From
//! The CLI crate and the integration tests, with real or mocked [`contract`](crate::contract)
//! implementations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::HarvestConfig;
use crate::contract::{CodeSearch, ContentStore, RawFetch};
use crate::publish::{self, PublishReport};
use crate::search::{self, HarvestReport};

#[derive(Debug, Serialize)]
pub enum PublishStatus {
    /// No snippets were collected, nothing was probed or written.
    Skipped,
    Published(PublishReport),
    Failed(String),
}

#[derive(Debug, Serialize)]
pub struct SynchroniseReport {
    pub harvest: HarvestReport,
    pub publish: PublishStatus,
}

impl SynchroniseReport {
    pub fn published(&self) -> bool {
        matches!(self.publish, PublishStatus::Published(_))
    }
}

pub async fn synchronise<S, F, C>(
    config: &HarvestConfig,
    searcher: &S,
    fetcher: &F,
    store: &C,
    captured_at: DateTime<Utc>,
) -> SynchroniseReport
where
    S: CodeSearch,
    F: RawFetch,
    C: ContentStore,
{
    info!(keywords = config.keywords.len(), file = %config.target, "[SYNC] Starting harvest");

    let harvest = search::harvest(config, searcher, fetcher).await;

    if harvest.is_empty() {
        warn!(
            failures = harvest.failures.len(),
            "[SYNC] No matching code files found, leaving target untouched"
        );
        return SynchroniseReport {
            harvest,
            publish: PublishStatus::Skipped,
        };
    }

    info!(snippets = harvest.snippets.len(), "[SYNC] Collected snippets, publishing");
    let publish = match publish::publish(config, store, &harvest.snippets, captured_at).await {
        Ok(report) => {
            info!(action = ?report.action, bytes = report.document_bytes, "[SYNC] Publish succeeded");
            PublishStatus::Published(report)
        }
        Err(e) => {
            error!(error = %e, "[SYNC][ERROR] Publish failed");
            PublishStatus::Failed(e.to_string())
        }
    };

    SynchroniseReport { harvest, publish }
}
