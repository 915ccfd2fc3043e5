//! Searcher: turns the configured keywords into an ordered list of snippets.
//!
//! Every keyword gets exactly one search call, in configured order. Each hit with a
//! `download_url` is fetched (one at a time) and rendered with a provenance header and a
//! separator footer. Failures of a search or a fetch are recorded in the report and the walk
//! continues; nothing here aborts the run.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::HarvestConfig;
use crate::contract::{CodeSearch, RawFetch, SearchItem};
use crate::error::HarvestError;

/// Width of the `=` rule closing every snippet.
pub const SEPARATOR_WIDTH: usize = 50;

/// One aggregated unit of output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    pub keyword: String,
    pub source_url: String,
    pub rendered: String,
}

impl Snippet {
    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FailureStage {
    Search,
    Fetch { url: String },
}

/// A search or fetch that did not contribute to the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarvestFailure {
    pub keyword: String,
    pub stage: FailureStage,
    pub reason: String,
}

/// Result of searching one keyword whose search call succeeded.
#[derive(Debug, Default)]
pub struct KeywordHarvest {
    pub snippets: Vec<Snippet>,
    pub failures: Vec<HarvestFailure>,
    pub items_found: usize,
    pub items_skipped: usize,
}

/// Outcome of a whole search pass.
#[derive(Debug, Default, Serialize)]
pub struct HarvestReport {
    pub snippets: Vec<Snippet>,
    pub failures: Vec<HarvestFailure>,
    pub keywords_searched: usize,
    pub items_skipped: usize,
}

impl HarvestReport {
    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}

/// Render one snippet: provenance header, raw text, separator, blank line.
pub fn format_snippet(source_url: &str, raw: &str) -> String {
    format!(
        "=== 来源: {source_url} ===\n{raw}\n{}\n\n",
        "=".repeat(SEPARATOR_WIDTH)
    )
}

/// Fetch and render a single search hit.
///
/// Returns `Ok(None)` without any network call when the item has no `download_url`.
pub async fn fetch_item<F>(
    fetcher: &F,
    keyword: &str,
    item: &SearchItem,
) -> Result<Option<Snippet>, HarvestError>
where
    F: RawFetch,
{
    let Some(download_url) = item.download_url.as_deref() else {
        return Ok(None);
    };
    let raw = fetcher.fetch_raw(download_url).await?;
    let source_url = item.html_url.as_deref().unwrap_or(download_url);
    debug!(keyword, source_url, bytes = raw.len(), "Fetched raw content");
    Ok(Some(Snippet {
        keyword: keyword.to_string(),
        source_url: source_url.to_string(),
        rendered: format_snippet(source_url, &raw),
    }))
}

/// Run the search for one keyword and fetch every downloadable hit.
///
/// Fails only when the search call itself fails; per-item fetch failures are collected.
pub async fn search_keyword<S, F>(
    config: &HarvestConfig,
    searcher: &S,
    fetcher: &F,
    keyword: &str,
) -> Result<KeywordHarvest, HarvestError>
where
    S: CodeSearch,
    F: RawFetch,
{
    info!(keyword, per_page = config.per_page, "[SEARCH] Searching code");
    let page = searcher.search_code(keyword, config.per_page).await?;
    info!(
        keyword,
        items = page.items.len(),
        total_count = page.total_count,
        incomplete = page.incomplete_results,
        "[SEARCH] Search returned items"
    );

    let mut harvest = KeywordHarvest {
        items_found: page.items.len(),
        ..KeywordHarvest::default()
    };

    for item in &page.items {
        match fetch_item(fetcher, keyword, item).await {
            Ok(Some(snippet)) => harvest.snippets.push(snippet),
            Ok(None) => {
                debug!(keyword, html_url = ?item.html_url, "[SEARCH] Item has no download_url, skipping");
                harvest.items_skipped += 1;
            }
            Err(e) => {
                let url = item.download_url.clone().unwrap_or_default();
                warn!(keyword, url = %url, error = %e, "[SEARCH] Could not fetch file content");
                harvest.failures.push(HarvestFailure {
                    keyword: keyword.to_string(),
                    stage: FailureStage::Fetch { url },
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(harvest)
}

/// Search every configured keyword in order and collect the snippets.
pub async fn harvest<S, F>(config: &HarvestConfig, searcher: &S, fetcher: &F) -> HarvestReport
where
    S: CodeSearch,
    F: RawFetch,
{
    let mut report = HarvestReport::default();

    for keyword in &config.keywords {
        report.keywords_searched += 1;
        match search_keyword(config, searcher, fetcher, keyword).await {
            Ok(found) => {
                info!(
                    keyword = %keyword,
                    items = found.items_found,
                    snippets = found.snippets.len(),
                    skipped = found.items_skipped,
                    failed = found.failures.len(),
                    "[SEARCH] Keyword done"
                );
                report.snippets.extend(found.snippets);
                report.failures.extend(found.failures);
                report.items_skipped += found.items_skipped;
            }
            Err(e) => {
                error!(keyword = %keyword, error = %e, "[SEARCH][ERROR] Search failed");
                report.failures.push(HarvestFailure {
                    keyword: keyword.clone(),
                    stage: FailureStage::Search,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        keywords = report.keywords_searched,
        snippets = report.snippets.len(),
        failures = report.failures.len(),
        "[SEARCH] Harvest complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{MockCodeSearch, MockRawFetch, SearchPage};

    #[test]
    fn snippet_matches_expected_layout() {
        let rendered = format_snippet("https://github.com/o/r/blob/main/x", "hello");
        assert_eq!(
            rendered,
            "=== 来源: https://github.com/o/r/blob/main/x ===\nhello\n==================================================\n\n"
        );
    }

    #[test]
    fn empty_body_still_gets_header_and_footer() {
        let rendered = format_snippet("u", "");
        assert!(rendered.starts_with("=== 来源: u ===\n\n"));
        assert!(rendered.ends_with(&format!("{}\n\n", "=".repeat(SEPARATOR_WIDTH))));
    }

    #[tokio::test]
    async fn item_without_download_url_is_not_fetched() {
        let mut fetcher = MockRawFetch::new();
        fetcher.expect_fetch_raw().never();
        let item = SearchItem {
            html_url: Some("https://github.com/o/r/blob/main/a".into()),
            ..SearchItem::default()
        };
        let out = fetch_item(&fetcher, "k", &item).await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn provenance_falls_back_to_download_url() {
        let mut fetcher = MockRawFetch::new();
        fetcher
            .expect_fetch_raw()
            .times(1)
            .returning(|_url: &str| Ok("body".to_string()));
        let item = SearchItem {
            download_url: Some("https://raw.example/a".into()),
            ..SearchItem::default()
        };
        let snippet = fetch_item(&fetcher, "k", &item).await.unwrap().unwrap();
        assert_eq!(snippet.source_url, "https://raw.example/a");
        assert!(snippet.as_str().starts_with("=== 来源: https://raw.example/a ===\nbody\n"));
    }

    #[tokio::test]
    async fn keyword_counts_found_and_skipped_items() {
        let mut searcher = MockCodeSearch::new();
        searcher
            .expect_search_code()
            .times(1)
            .returning(|_keyword: &str, _per_page: u32| {
                Ok(SearchPage {
                    items: vec![
                        SearchItem {
                            download_url: Some("https://raw.example/a".into()),
                            ..SearchItem::default()
                        },
                        SearchItem::default(),
                    ],
                    ..SearchPage::default()
                })
            });
        let mut fetcher = MockRawFetch::new();
        fetcher
            .expect_fetch_raw()
            .times(1)
            .returning(|_url: &str| Ok("body".to_string()));

        let found = search_keyword(&HarvestConfig::default(), &searcher, &fetcher, "k")
            .await
            .unwrap();
        assert_eq!(found.items_found, 2);
        assert_eq!(found.items_skipped, 1);
        assert_eq!(found.snippets.len(), 1);
        assert!(found.failures.is_empty());
    }

    #[test]
    fn report_emptiness_follows_snippets() {
        let mut report = HarvestReport::default();
        assert!(report.is_empty());
        report.snippets.push(Snippet {
            keyword: "k".into(),
            source_url: "u".into(),
            rendered: format_snippet("u", "x"),
        });
        assert!(!report.is_empty());
    }
}
