//! GitHub Gists backend.
//!
//! Raw content is read from the unauthenticated `gist.githubusercontent.com`
//! endpoint; creation goes through the REST API with the static token.

use super::{Gist, GistError, GistStore, NewGist, RawGist, GIST_OWNER};
use crate::config::GithubConfig;
use async_trait::async_trait;
use reqwest::{header, Client, Url};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// GitHub API error body.
#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}

/// Gist store backed by GitHub.
#[derive(Clone)]
pub struct GitHubGistClient {
    client: Client,
    api_base_url: String,
    raw_base_url: String,
    token: Option<Secret<String>>,
}

impl GitHubGistClient {
    pub fn new(config: &GithubConfig) -> Result<Self, GistError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| GistError::NotConfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            raw_base_url: config.raw_base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Whether a credential is available for creating gists.
    pub fn can_create(&self) -> bool {
        self.token.is_some()
    }

    /// `{raw_base}/{owner}/{id}/raw`, with `id` escaped as one path segment.
    ///
    /// `.` and `..` are rejected: URL normalization would drop them and
    /// address a different path.
    pub fn raw_url(&self, id: &str) -> Result<Url, GistError> {
        if matches!(id, "." | "..") {
            return Err(GistError::InvalidId(id.to_string()));
        }

        let mut url = Url::parse(&self.raw_base_url)
            .map_err(|e| GistError::NotConfigured(format!("Invalid raw base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| GistError::NotConfigured("Raw base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend([GIST_OWNER, id, "raw"]);
        Ok(url)
    }
}

#[async_trait]
impl GistStore for GitHubGistClient {
    async fn fetch_raw(&self, id: &str) -> Result<RawGist, GistError> {
        let url = self.raw_url(id)?;

        tracing::debug!(gist_id = %id, url = %url, "Fetching raw gist content");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GistError::NotFound {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content = response.bytes().await?;

        Ok(RawGist {
            content,
            content_type,
        })
    }

    async fn create(&self, content: &[u8]) -> Result<Gist, GistError> {
        let token = self.token.as_ref().ok_or_else(|| {
            GistError::NotConfigured("GitHub token not configured".to_string())
        })?;

        let request = NewGist::notebook(content);
        let url = format!("{}/gists", self.api_base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.expose_secret())
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let gist: Gist =
                serde_json::from_str(&body).map_err(|e| GistError::Decode(e.to_string()))?;
            tracing::info!(
                gist_id = gist.id.as_deref().unwrap_or("-"),
                size = content.len(),
                "Gist created"
            );
            Ok(gist)
        } else {
            let message = serde_json::from_str::<GitHubErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            tracing::error!(
                status = %status,
                message = %message,
                "GitHub gist creation failed"
            );
            Err(GistError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
