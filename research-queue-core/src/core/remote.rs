//! Read-only sources of published snapshot documents.
//!
//! A source serves documents by relative path using the published layout:
//! `data/index.json` and `data/<quarter>/queue.json`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Failure while fetching a remote document.
///
/// The persistence resolver treats every variant as "no data here"; the type
/// exists so the cause can be logged.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "remote-http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Refusing path outside the source root: {0}")]
    InvalidPath(String),
}

/// A read-only document source.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetches the document at `path`. `Ok(None)` means the document does not exist.
    async fn fetch(&self, path: &str) -> Result<Option<String>, RemoteError>;
}

/// Source with nothing published.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRemote;

#[async_trait]
impl RemoteSource for NoRemote {
    async fn fetch(&self, _path: &str) -> Result<Option<String>, RemoteError> {
        Ok(None)
    }
}

/// Documents held in memory, keyed by path.
///
/// Records every path it is asked for, and can be switched to fail every
/// fetch as an unreachable server would.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    documents: HashMap<String, String>,
    unreachable: bool,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_document(mut self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.documents.insert(path.into(), body.into());
        self
    }

    /// Makes every fetch fail with an I/O error.
    #[must_use]
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Shared log of requested paths; stays valid after the source is moved.
    pub fn fetch_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.fetched)
    }
}

#[async_trait]
impl RemoteSource for MemorySource {
    async fn fetch(&self, path: &str) -> Result<Option<String>, RemoteError> {
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(path.to_string());
        }
        if self.unreachable {
            return Err(RemoteError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "source unreachable",
            )));
        }
        Ok(self.documents.get(path).cloned())
    }
}

/// Documents laid out under a local directory, e.g. a checked-out repository
/// containing `data/index.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, RemoteError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(RemoteError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl RemoteSource for DirectorySource {
    async fn fetch(&self, path: &str) -> Result<Option<String>, RemoteError> {
        let full = self.resolve(path)?;
        match tokio::fs::read_to_string(&full).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Documents served over HTTP relative to a base URL.
#[cfg(feature = "remote-http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "remote-http")]
impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[cfg(feature = "remote-http")]
#[async_trait]
impl RemoteSource for HttpSource {
    async fn fetch(&self, path: &str) -> Result<Option<String>, RemoteError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        Ok(Some(response.text().await?))
    }
}
