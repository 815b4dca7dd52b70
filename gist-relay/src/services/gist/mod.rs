//! Gist storage abstraction and implementations.
//!
//! The relay only needs two things from the hosting provider: fetch the raw
//! content of a gist by id, and create a new gist from document content.
//! [`GistStore`] captures exactly that so the handlers can run against GitHub
//! or an in-memory stand-in.

pub mod github;
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub use github::GitHubGistClient;
pub use memory::InMemoryGistStore;

/// Account that owns every shared gist; raw URLs are built against it.
pub const GIST_OWNER: &str = "percival-bot";

/// Description attached to every created gist.
pub const GIST_DESCRIPTION: &str = "Code shared from a Percival notebook - https://percival.ink";

/// Name of the single file each shared gist contains.
pub const GIST_FILENAME: &str = "notebook.percival";

/// Error type for gist store operations.
#[derive(Error, Debug)]
pub enum GistError {
    #[error("Gist not found: upstream returned {status}")]
    NotFound { status: u16 },

    #[error("Invalid gist id: {0:?}")]
    InvalidId(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Gist API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected gist API response: {0}")]
    Decode(String),

    #[error("Gist store not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for GistError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GistError::Decode(err.to_string())
        } else {
            GistError::Transport(err.to_string())
        }
    }
}

/// Raw file content of a gist as served by the provider.
#[derive(Debug, Clone)]
pub struct RawGist {
    pub content: Bytes,
    /// Upstream `Content-Type`, relayed as-is when present.
    pub content_type: Option<String>,
}

/// A gist as represented by the provider API.
///
/// Every field is optional; whatever the provider omits is omitted again when
/// the record is relayed to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gist {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<GistOwner>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, GistFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_pull_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_push_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GistOwner {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_admin: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GistFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Creation request body for `POST /gists`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGist {
    pub description: String,
    pub public: bool,
    pub files: BTreeMap<String, NewGistFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGistFile {
    pub content: String,
}

impl NewGist {
    /// A private gist holding `content` as the single notebook file.
    pub fn notebook(content: &[u8]) -> Self {
        let mut files = BTreeMap::new();
        files.insert(
            GIST_FILENAME.to_string(),
            NewGistFile {
                content: String::from_utf8_lossy(content).into_owned(),
            },
        );

        Self {
            description: GIST_DESCRIPTION.to_string(),
            public: false,
            files,
        }
    }
}

/// Upstream capability the relay depends on.
#[async_trait]
pub trait GistStore: Send + Sync {
    /// Fetch the raw content of the gist `id` owned by [`GIST_OWNER`].
    async fn fetch_raw(&self, id: &str) -> Result<RawGist, GistError>;

    /// Create a private notebook gist containing `content`.
    async fn create(&self, content: &[u8]) -> Result<Gist, GistError>;
}
