//! Page snapshot loading.
//!
//! Playlist markup comes either from a saved file or from an HTTP fetch.
//! Fetched pages are cached as JSON entries under the raw data directory,
//! keyed by URL hash. Extraction needs rendered markup, so fetched pages
//! only help when the server returns the playlist renderer elements
//! (e.g. a prerendering proxy).

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE, RETRY_AFTER};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;

/// Errors that can occur while loading a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },

    #[error("Expected an HTML page, got {0}")]
    NotHtml(String),

    #[error("Redirected to a consent page ({0}); save the page from a browser instead")]
    ConsentRequired(String),
}

/// Something that can produce the markup of a page.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Load the page markup for `url`.
    async fn load(&self, url: &Url) -> Result<String, FetchError>;
}

/// A page snapshot saved to disk; the URL only identifies the page.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PageSource for FileSource {
    async fn load(&self, url: &Url) -> Result<String, FetchError> {
        debug!("Reading snapshot of {} from {:?}", url, self.path);
        Ok(fs::read_to_string(&self.path).await?)
    }
}

/// A fetched page as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPage {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub content_type: Option<String>,
    pub body: String,
}

impl CachedPage {
    /// Whether the entry is younger than `ttl` at `now`.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.fetched_at);
        age.num_seconds() <= ttl.as_secs() as i64
    }
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Directory to cache fetched pages
    pub cache_dir: PathBuf,

    /// How long cached pages are considered fresh
    pub cache_ttl: Duration,

    pub max_content_size: usize,

    pub timeout: Duration,

    pub user_agent: String,

    /// Ignore the cache and always hit the network
    pub fresh: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./data/raw"),
            cache_ttl: Duration::from_secs(300),
            max_content_size: 20 * 1024 * 1024,
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
            fresh: false,
        }
    }
}

/// HTTP page fetcher with a local cache.
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        // Duration labels and video counts are matched in English
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch a page, serving it from the cache while fresh.
    pub async fn fetch(&self, url: &Url) -> Result<CachedPage, FetchError> {
        if !self.config.fresh {
            if let Some(page) = self.read_cache(url).await? {
                if page.is_fresh(self.config.cache_ttl, Utc::now()) {
                    info!("Serving {} from cache", url);
                    return Ok(page);
                }
                debug!("Cache expired for {}", url);
            }
        }

        let page = self.download(url).await?;
        self.write_cache(url, &page).await?;
        Ok(page)
    }

    async fn download(&self, url: &Url) -> Result<CachedPage, FetchError> {
        info!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        if response
            .url()
            .host_str()
            .is_some_and(|host| host.starts_with("consent."))
        {
            return Err(FetchError::ConsentRequired(response.url().to_string()));
        }

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown");
            let message = match response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
            {
                Some(retry) => format!("{} (retry after {}s)", reason, retry),
                None => reason.to_string(),
            };
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        if let Some(ct) = content_type.as_deref() {
            if !ct.contains("html") {
                return Err(FetchError::NotHtml(ct.to_string()));
            }
        }

        let content = response.bytes().await?;
        if content.len() > self.config.max_content_size {
            return Err(FetchError::ContentTooLarge {
                size: content.len(),
                max_size: self.config.max_content_size,
            });
        }

        Ok(CachedPage {
            url: url.to_string(),
            fetched_at: Utc::now(),
            content_type,
            body: String::from_utf8_lossy(&content).into_owned(),
        })
    }

    /// Read the cache entry for `url`. Unreadable entries count as missing.
    async fn read_cache(&self, url: &Url) -> Result<Option<CachedPage>, FetchError> {
        let path = self.cache_path_for_url(url);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).await?;
        match serde_json::from_str(&contents) {
            Ok(page) => Ok(Some(page)),
            Err(e) => {
                warn!("Ignoring unreadable cache entry {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    async fn write_cache(&self, url: &Url, page: &CachedPage) -> Result<(), FetchError> {
        let path = self.cache_path_for_url(url);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&path, serde_json::to_vec(page)?).await?;
        debug!("Cached {} at {:?}", url, path);
        Ok(())
    }

    fn cache_path_for_url(&self, url: &Url) -> PathBuf {
        let host = url.host_str().unwrap_or("unknown");
        self.config
            .cache_dir
            .join(host)
            .join(format!("{}.json", Self::url_hash(url)))
    }

    /// Hash a URL to a short string.
    fn url_hash(url: &Url) -> String {
        let digest = Sha256::digest(url.as_str().as_bytes());
        hex::encode(&digest[..8])
    }
}

#[async_trait]
impl PageSource for Fetcher {
    async fn load(&self, url: &Url) -> Result<String, FetchError> {
        Ok(self.fetch(url).await?.body)
    }
}
