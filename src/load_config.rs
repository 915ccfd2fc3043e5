//! `load_config` module: builds the run's [`HarvestConfig`] from compiled-in defaults, an
//! optional YAML override file and the token environment variable.
//!
//! # Responsibilities
//! - Parse the optional YAML file; every key is optional and overrides one default
//! - Reject unknown keys so typos do not silently fall back to defaults
//! - Read the API token from the environment (never from the YAML file)
//! - Validate everything before any network call is made
//!
//! # Accepted YAML
//! ```yaml
//! api_base: https://api.github.com
//! token_env: GH_TOKEN
//! per_page: 100
//! keywords: ["荐片", "采集", ".spider"]
//! commit_message: "update snippets"
//! banner_description: "snippets below"
//! target:
//!   owner: leexuben
//!   repo: TVBOX-merge
//!   path: source.txt
//!   branch: main
//! ```

use anyhow::{Context, Result};
use code_harvest_core::config::{ApiToken, HarvestConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Environment variable holding the token unless the YAML names another one.
pub const DEFAULT_TOKEN_ENV: &str = "GH_TOKEN";

#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub harvest: HarvestConfig,
    pub token_env: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            harvest: HarvestConfig::default(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    api_base: Option<String>,
    token_env: Option<String>,
    per_page: Option<u32>,
    keywords: Option<Vec<String>>,
    commit_message: Option<String>,
    banner_description: Option<String>,
    target: Option<RawTarget>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawTarget {
    owner: Option<String>,
    repo: Option<String>,
    path: Option<String>,
    branch: Option<String>,
}

impl RawConfig {
    fn merge_into(self, mut config: CliConfig) -> CliConfig {
        let harvest = &mut config.harvest;
        if let Some(v) = self.api_base {
            harvest.api_base = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = self.per_page {
            harvest.per_page = v;
        }
        if let Some(v) = self.keywords {
            harvest.keywords = v;
        }
        if let Some(v) = self.commit_message {
            harvest.commit_message = v;
        }
        if let Some(v) = self.banner_description {
            harvest.banner_description = v;
        }
        if let Some(target) = self.target {
            if let Some(v) = target.owner {
                harvest.target.owner = v;
            }
            if let Some(v) = target.repo {
                harvest.target.repo = v;
            }
            if let Some(v) = target.path {
                harvest.target.path = v;
            }
            if let Some(v) = target.branch {
                harvest.target.branch = v;
            }
        }
        if let Some(v) = self.token_env {
            config.token_env = v;
        }
        config
    }
}

/// Parse YAML overrides on top of the defaults and validate the result.
pub fn parse_config(yaml: &str) -> Result<CliConfig> {
    // An empty document deserialises to unit, not to a map.
    let raw: RawConfig = if yaml.trim().is_empty() {
        RawConfig::default()
    } else {
        match serde_yaml::from_str(yaml) {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = ?e, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };
    let config = raw.merge_into(CliConfig::default());
    validate(&config)?;
    Ok(config)
}

/// Load the run configuration; without a path the compiled-in defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let Some(path) = path else {
        info!("No config file given, using built-in defaults");
        let config = CliConfig::default();
        validate(&config)?;
        config.harvest.trace_loaded();
        return Ok(config);
    };

    info!(config_path = ?path, "Loading configuration from file");
    let content = match fs::read_to_string(path) {
        Ok(content) => {
            info!(config_path = ?path, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path,
                e
            ));
        }
    };

    let config = parse_config(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    config.harvest.trace_loaded();
    Ok(config)
}

fn validate(config: &CliConfig) -> Result<()> {
    if config.token_env.trim().is_empty() {
        anyhow::bail!("token_env must not be empty");
    }
    config.harvest.validate().map_err(|e| {
        error!(error = %e, "Config validation failed");
        anyhow::Error::new(e)
    })
}

/// Read and validate the API token from `var`.
pub fn load_token(var: &str) -> Result<ApiToken> {
    let raw = match std::env::var(var) {
        Ok(raw) => raw,
        Err(e) => {
            error!(error = ?e, var, "Token environment variable not set");
            return Err(anyhow::anyhow!("{var} environment variable not set: {e}"));
        }
    };
    let token = ApiToken::new(raw).with_context(|| format!("{var} is set but empty"))?;
    info!(var, "API token found in env");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.token_env, "GH_TOKEN");
    }

    #[test]
    fn partial_target_override_keeps_other_defaults() {
        let config = parse_config("target:\n  repo: other\napi_base: https://ghe.local/api/v3/\n").unwrap();
        assert_eq!(config.harvest.target.repo, "other");
        assert_eq!(config.harvest.target.owner, "leexuben");
        assert_eq!(config.harvest.target.branch, "main");
        assert_eq!(config.harvest.api_base, "https://ghe.local/api/v3");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = parse_config("keyword: [a]\n").unwrap_err();
        assert!(err.to_string().contains("parse"), "got: {err}");
    }

    #[test]
    fn invalid_values_fail_validation() {
        let err = parse_config("per_page: 500\n").unwrap_err();
        assert!(format!("{err:#}").contains("per_page"), "got: {err:#}");
        assert!(parse_config("token_env: ''\n").is_err());
    }
}
