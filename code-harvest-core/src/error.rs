use thiserror::Error;

/// Failure of a single remote operation (search, fetch, probe or write).
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for HarvestError {
    fn from(err: serde_json::Error) -> Self {
        HarvestError::Parse(err.to_string())
    }
}

/// Why a publish attempt stopped.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("nothing to publish: no snippets were collected")]
    NothingToPublish,

    #[error("probing {path} failed: {source}")]
    Probe {
        path: String,
        #[source]
        source: HarvestError,
    },

    #[error("writing {path} failed: {source}")]
    Commit {
        path: String,
        #[source]
        source: HarvestError,
    },
}
