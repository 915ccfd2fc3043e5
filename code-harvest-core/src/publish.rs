//! Publisher: replaces the target file's content with the aggregate document.
//!
//! One probe (to learn the revision token), one write. The document always replaces the whole
//! file. A probe answering anything but 200 or 404 stops the publish before any write; a failed
//! write is reported and not retried.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::config::HarvestConfig;
use crate::contract::{ContentStore, FileUpdate};
use crate::error::PublishError;
use crate::search::Snippet;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S (UTC)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PublishAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub action: PublishAction,
    pub snippet_count: usize,
    pub document_bytes: usize,
    pub commit_sha: Option<String>,
}

/// Banner line(s) heading every published document.
pub fn render_banner(captured_at: DateTime<Utc>, description: &str) -> String {
    format!(
        "🔍 自动抓取时间: {}\n{description}\n\n",
        captured_at.format(TIMESTAMP_FORMAT)
    )
}

/// Banner followed by every snippet, joined with newlines.
pub fn build_document(snippets: &[Snippet], captured_at: DateTime<Utc>, description: &str) -> String {
    let banner = render_banner(captured_at, description);
    std::iter::once(banner.as_str())
        .chain(snippets.iter().map(Snippet::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn encode_document(document: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(document.as_bytes())
}

/// Create or update the configured target file with `snippets`.
pub async fn publish<C>(
    config: &HarvestConfig,
    store: &C,
    snippets: &[Snippet],
    captured_at: DateTime<Utc>,
) -> Result<PublishReport, PublishError>
where
    C: ContentStore,
{
    if snippets.is_empty() {
        return Err(PublishError::NothingToPublish);
    }
    let target = &config.target;
    let path = target.path.clone();

    info!(file = %target, "[PUBLISH] Probing target file");
    let existing = match store.probe_file(target).await {
        Ok(existing) => existing,
        Err(source) => {
            error!(file = %target, error = %source, "[PUBLISH][ERROR] Probe failed, not writing");
            return Err(PublishError::Probe { path, source });
        }
    };
    match &existing {
        Some(file) => info!(file = %target, sha = %file.sha, "[PUBLISH] File exists, will update"),
        None => info!(file = %target, "[PUBLISH] File absent, will create"),
    }

    let document = build_document(snippets, captured_at, &config.banner_description);
    let update = FileUpdate {
        message: config.commit_message.clone(),
        content: encode_document(&document),
        branch: target.branch.clone(),
        sha: existing.map(|file| file.sha),
    };

    info!(
        file = %target,
        snippets = snippets.len(),
        bytes = document.len(),
        "[PUBLISH] Writing aggregate document"
    );
    match store.put_file(target, update).await {
        Ok(outcome) => {
            let action = if outcome.created {
                PublishAction::Created
            } else {
                PublishAction::Updated
            };
            info!(file = %target, ?action, commit = ?outcome.commit_sha, "[PUBLISH] Write succeeded");
            Ok(PublishReport {
                action,
                snippet_count: snippets.len(),
                document_bytes: document.len(),
                commit_sha: outcome.commit_sha,
            })
        }
        Err(source) => {
            error!(file = %target, error = %source, "[PUBLISH][ERROR] Write failed");
            Err(PublishError::Commit { path, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::format_snippet;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    fn snippet(url: &str, body: &str) -> Snippet {
        Snippet {
            keyword: "k".into(),
            source_url: url.into(),
            rendered: format_snippet(url, body),
        }
    }

    #[test]
    fn banner_uses_zero_padded_utc_timestamp() {
        let banner = render_banner(at(), "desc");
        assert_eq!(banner, "🔍 自动抓取时间: 2024-03-09 07:05:01 (UTC)\ndesc\n\n");
    }

    #[test]
    fn document_joins_banner_and_snippets_with_newline() {
        let snippets = vec![snippet("u1", "one"), snippet("u2", "two")];
        let doc = build_document(&snippets, at(), "desc");
        let expected = format!(
            "{}\n{}\n{}",
            render_banner(at(), "desc"),
            format_snippet("u1", "one"),
            format_snippet("u2", "two")
        );
        assert_eq!(doc, expected);
        assert!(doc.starts_with("🔍 自动抓取时间: 2024-03-09 07:05:01 (UTC)\n"));
    }

    #[test]
    fn document_without_snippets_is_just_the_banner() {
        assert_eq!(build_document(&[], at(), "d"), render_banner(at(), "d"));
    }

    #[test]
    fn encoding_is_standard_padded_base64_of_utf8() {
        assert_eq!(encode_document("hello"), "aGVsbG8=");
        assert_eq!(encode_document("来源"), "5p2l5rqQ");
    }
}
