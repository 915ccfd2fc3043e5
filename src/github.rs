//! # GitHub client
//!
//! [`GitHubClient`] wires the [`CodeSearch`], [`RawFetch`] and [`ContentStore`] traits to the
//! GitHub REST API with `reqwest`:
//!
//! - code search: `GET {api}/search/code?q=<keyword> in:file&per_page=<n>` (authenticated)
//! - raw download: `GET <download_url>` (no credentials are sent)
//! - probe: `GET {api}/repos/{owner}/{repo}/contents/{path}?ref={branch}` (authenticated)
//! - write: `PUT {api}/repos/{owner}/{repo}/contents/{path}` (authenticated)
//!
//! Requests are built by separate `*_request` methods so their shape can be checked without a
//! network; every call is sent one at a time and never retried.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Request, Response, StatusCode};
use serde::Deserialize;

use code_harvest_core::config::{ApiToken, TargetFile};
use code_harvest_core::contract::{
    CodeSearch, ContentStore, FileUpdate, RawFetch, RemoteFile, SearchPage, WriteOutcome,
};
use code_harvest_core::HarvestError;

pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("code-harvest/", env!("CARGO_PKG_VERSION"));

pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    token: ApiToken,
}

#[derive(Deserialize)]
struct PutResponse {
    #[serde(default)]
    commit: Option<CommitRef>,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: String,
}

fn network(e: reqwest::Error) -> HarvestError {
    HarvestError::Network(e.to_string())
}

/// Turn any non-2xx response into [`HarvestError::Api`] carrying the body.
async fn require_success(resp: Response) -> Result<Response, HarvestError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(HarvestError::Api {
        status: status.as_u16(),
        message,
    })
}

impl GitHubClient {
    pub fn new(api_base: &str, token: ApiToken) -> Result<Self, HarvestError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(network)?;
        tracing::info!(api_base, "Initialized GitHubClient");
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn contents_url(&self, target: &TargetFile) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            target.owner,
            target.repo,
            target.path.trim_start_matches('/')
        )
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header(AUTHORIZATION, format!("token {}", self.token.expose()))
            .header(ACCEPT, GITHUB_ACCEPT)
    }

    pub fn search_request(&self, keyword: &str, per_page: u32) -> reqwest::Result<Request> {
        let query = [
            ("q", format!("{keyword} in:file")),
            ("per_page", per_page.to_string()),
        ];
        self.authed(self.http.get(format!("{}/search/code", self.api_base)))
            .query(&query)
            .build()
    }

    pub fn raw_request(&self, url: &str) -> reqwest::Result<Request> {
        self.http.get(url).build()
    }

    pub fn probe_request(&self, target: &TargetFile) -> reqwest::Result<Request> {
        self.authed(self.http.get(self.contents_url(target)))
            .query(&[("ref", target.branch.as_str())])
            .build()
    }

    pub fn put_request(&self, target: &TargetFile, update: &FileUpdate) -> reqwest::Result<Request> {
        self.authed(self.http.put(self.contents_url(target)))
            .json(update)
            .build()
    }
}

#[async_trait]
impl CodeSearch for GitHubClient {
    async fn search_code(&self, keyword: &str, per_page: u32) -> Result<SearchPage, HarvestError> {
        let req = self.search_request(keyword, per_page).map_err(network)?;
        tracing::debug!(url = %req.url(), "Sending code search request");
        let resp = self.http.execute(req).await.map_err(network)?;
        let resp = require_success(resp).await?;
        let body = resp.text().await.map_err(network)?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RawFetch for GitHubClient {
    async fn fetch_raw(&self, url: &str) -> Result<String, HarvestError> {
        let req = self.raw_request(url).map_err(network)?;
        let resp = self.http.execute(req).await.map_err(network)?;
        let resp = require_success(resp).await?;
        resp.text().await.map_err(network)
    }
}

#[async_trait]
impl ContentStore for GitHubClient {
    async fn probe_file(&self, target: &TargetFile) -> Result<Option<RemoteFile>, HarvestError> {
        let req = self.probe_request(target).map_err(network)?;
        tracing::info!(url = %req.url(), "Probing contents API");
        let resp = self.http.execute(req).await.map_err(network)?;
        if resp.status() == StatusCode::NOT_FOUND {
            tracing::info!(path = %target.path, "Target file does not exist yet");
            return Ok(None);
        }
        let resp = require_success(resp).await?;
        let body = resp.text().await.map_err(network)?;
        let file: RemoteFile = serde_json::from_str(&body)?;
        tracing::info!(path = %target.path, sha = %file.sha, "Target file exists");
        Ok(Some(file))
    }

    async fn put_file(
        &self,
        target: &TargetFile,
        update: FileUpdate,
    ) -> Result<WriteOutcome, HarvestError> {
        let req = self.put_request(target, &update).map_err(network)?;
        tracing::info!(
            url = %req.url(),
            branch = %update.branch,
            has_sha = update.sha.is_some(),
            "Writing file through contents API"
        );
        let resp = self.http.execute(req).await.map_err(network)?;
        let created = resp.status() == StatusCode::CREATED;
        let resp = require_success(resp).await?;
        let commit_sha = match resp.json::<PutResponse>().await {
            Ok(body) => body.commit.map(|commit| commit.sha),
            Err(e) => {
                tracing::debug!(error = %e, "Could not decode write response body");
                None
            }
        };
        tracing::info!(created, commit_sha = ?commit_sha, "File written");
        Ok(WriteOutcome {
            created,
            commit_sha,
        })
    }
}
