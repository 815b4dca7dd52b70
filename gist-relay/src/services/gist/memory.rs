//! In-memory gist store for tests and offline development.

use super::{
    Gist, GistError, GistFile, GistOwner, GistStore, NewGist, RawGist, GIST_OWNER,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Gist store that keeps created gists in process memory.
///
/// Behaves like the GitHub backend from the relay's point of view: created
/// gists are private, owned by [`GIST_OWNER`], and readable back by id.
#[derive(Clone, Default)]
pub struct InMemoryGistStore {
    gists: Arc<RwLock<HashMap<String, Bytes>>>,
    fail_creates: bool,
    fetches: Arc<AtomicUsize>,
    creates: Arc<AtomicUsize>,
}

impl InMemoryGistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `create` always fails with an upstream API error.
    pub fn failing_creates() -> Self {
        Self {
            fail_creates: true,
            ..Self::default()
        }
    }

    /// Seed a gist directly, bypassing `create`.
    pub async fn insert(&self, id: &str, content: impl Into<Bytes>) {
        self.gists.write().await.insert(id.to_string(), content.into());
    }

    /// Number of `fetch_raw` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of `create` calls served so far.
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GistStore for InMemoryGistStore {
    async fn fetch_raw(&self, id: &str) -> Result<RawGist, GistError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let gists = self.gists.read().await;
        let content = gists
            .get(id)
            .cloned()
            .ok_or(GistError::NotFound { status: 404 })?;

        Ok(RawGist {
            content,
            content_type: Some("text/plain; charset=utf-8".to_string()),
        })
    }

    async fn create(&self, content: &[u8]) -> Result<Gist, GistError> {
        self.creates.fetch_add(1, Ordering::SeqCst);

        if self.fail_creates {
            return Err(GistError::Api {
                status: 401,
                message: "Bad credentials".to_string(),
            });
        }

        let request = NewGist::notebook(content);
        let id = Uuid::new_v4().simple().to_string();
        let now = Utc::now();

        let files = request
            .files
            .into_iter()
            .map(|(name, file)| {
                let entry = GistFile {
                    size: Some(file.content.len() as u64),
                    filename: Some(name.clone()),
                    kind: Some("text/plain".to_string()),
                    raw_url: Some(format!("memory://{}/{}/raw/{}", GIST_OWNER, id, name)),
                    content: Some(file.content),
                    ..GistFile::default()
                };
                (name, entry)
            })
            .collect::<std::collections::BTreeMap<_, _>>();

        // Stored exactly as the provider would hold it: the encoded file text.
        if let Some(stored) = files.values().next().and_then(|f| f.content.clone()) {
            self.gists.write().await.insert(id.clone(), Bytes::from(stored));
        }

        Ok(Gist {
            id: Some(id.clone()),
            description: Some(request.description),
            public: Some(request.public),
            owner: Some(GistOwner {
                login: Some(GIST_OWNER.to_string()),
                kind: Some("User".to_string()),
                site_admin: Some(false),
                ..GistOwner::default()
            }),
            files,
            comments: Some(0),
            html_url: Some(format!("memory://{}/{}", GIST_OWNER, id)),
            created_at: Some(now),
            updated_at: Some(now),
            ..Gist::default()
        })
    }
}
