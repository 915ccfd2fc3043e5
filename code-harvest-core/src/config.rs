use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::error::HarvestError;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_OWNER: &str = "leexuben";
pub const DEFAULT_REPO: &str = "TVBOX-merge";
pub const DEFAULT_FILE_PATH: &str = "source.txt";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_KEYWORDS: [&str; 3] = ["荐片", "采集", ".spider"];
pub const DEFAULT_PER_PAGE: u32 = 100;
pub const DEFAULT_COMMIT_MESSAGE: &str = "🤖 自动更新：抓取 tvbox 相关配置代码片段";
pub const DEFAULT_BANNER_DESCRIPTION: &str = "📌 以下为包含关键词的 tvbox 配置相关代码片段：";

/// GitHub caps code search pages at 100 results.
pub const MAX_PER_PAGE: u32 = 100;

/// The file the aggregate document is written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFile {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub branch: String,
}

impl Default for TargetFile {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            path: DEFAULT_FILE_PATH.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

impl fmt::Display for TargetFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}@{}", self.owner, self.repo, self.path, self.branch)
    }
}

/// Everything a run needs except the credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestConfig {
    pub api_base: String,
    pub keywords: Vec<String>,
    pub per_page: u32,
    pub target: TargetFile,
    pub commit_message: String,
    pub banner_description: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            per_page: DEFAULT_PER_PAGE,
            target: TargetFile::default(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            banner_description: DEFAULT_BANNER_DESCRIPTION.to_string(),
        }
    }
}

impl HarvestConfig {
    /// Rejects values no request could be built from.
    pub fn validate(&self) -> Result<(), HarvestError> {
        let required = [
            ("api_base", &self.api_base),
            ("target.owner", &self.target.owner),
            ("target.repo", &self.target.repo),
            ("target.path", &self.target.path),
            ("target.branch", &self.target.branch),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(HarvestError::Config(format!("{field} must not be empty")));
            }
        }
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(HarvestError::Config(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}, got {}",
                self.per_page
            )));
        }
        if let Some(pos) = self.keywords.iter().position(|k| k.trim().is_empty()) {
            return Err(HarvestError::Config(format!("keywords[{pos}] is empty")));
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            api_base = %self.api_base,
            file = %self.target,
            keywords_count = self.keywords.len(),
            per_page = self.per_page,
            "Loaded HarvestConfig"
        );
        debug!(?self, "HarvestConfig loaded (full debug)");
    }
}

/// Access token for the hosting API. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(raw: impl Into<String>) -> Result<Self, HarvestError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(HarvestError::Config("API token is empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let config = HarvestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.keywords, vec!["荐片", "采集", ".spider"]);
        assert_eq!(config.per_page, 100);
        assert_eq!(config.target.to_string(), "leexuben/TVBOX-merge:source.txt@main");
    }

    #[test]
    fn per_page_out_of_range_is_rejected() {
        let mut config = HarvestConfig::default();
        config.per_page = 0;
        assert!(config.validate().is_err());
        config.per_page = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("per_page"), "got: {err}");
    }

    #[test]
    fn empty_target_fields_are_rejected() {
        let mut config = HarvestConfig::default();
        config.target.repo = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("target.repo"), "got: {err}");
    }

    #[test]
    fn blank_keyword_is_rejected_but_empty_list_is_allowed() {
        let mut config = HarvestConfig::default();
        config.keywords = vec!["ok".into(), " ".into()];
        assert!(config.validate().is_err());
        config.keywords.clear();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn api_token_rejects_blank_and_hides_value() {
        assert!(ApiToken::new("").is_err());
        assert!(ApiToken::new("   \n").is_err());
        let token = ApiToken::new(" ghp_secret ").unwrap();
        assert_eq!(token.expose(), "ghp_secret");
        assert_eq!(format!("{token:?}"), "ApiToken(***)");
    }
}
