//! Upstream catalog service client.
//!
//! Fetches the full catalog listing and the streaming mirror config from the
//! upstream API. The catalog is a single JSON document holding every movie
//! and show; there is no server-side search or pagination.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::lenient;

const CATALOG_PATH: &str = "/data.json";
const STREAM_CONFIG_PATH: &str = "/config/config-streamflixapp.json";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Mirror used for every list when the upstream config cannot be fetched.
pub const FALLBACK_MIRROR: &str = "https://example.com/fallback/";

lazy_static! {
    static ref SEASON_COUNT_RE: Regex = Regex::new(r"(?i)(\d+)\s+Season").unwrap();
}

/// Where catalog data comes from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Base URL of the upstream service, used as `Referer` for stream links.
    fn base_url(&self) -> &str;

    /// Every item in the catalog.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>>;

    /// Streaming mirror configuration.
    async fn fetch_stream_config(&self) -> Result<StreamConfig>;
}

/// HTTP client for the upstream catalog API.
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    /// Create a new catalog client for `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AppError::Internal(
                "Upstream base URL cannot be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Create a new catalog client wrapped in Arc for shared access.
    pub fn new_shared(base_url: impl Into<String>, timeout: Duration) -> Result<Arc<Self>> {
        Ok(Arc::new(Self::new(base_url, timeout)?))
    }

    /// Internal helper to perform GET requests and deserialize JSON responses.
    async fn get_json<T>(&self, path: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Request to {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "{} returned error status: {}",
                path, status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| {
                AppError::Upstream(format!("Failed to parse response from {}: {}", path, e))
            })
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>> {
        tracing::debug!("Fetching upstream catalog");
        let listing: CatalogListing = self.get_json(CATALOG_PATH).await?;
        tracing::debug!(items = listing.data.len(), "Fetched upstream catalog");
        Ok(listing.data)
    }

    async fn fetch_stream_config(&self) -> Result<StreamConfig> {
        tracing::debug!("Fetching upstream stream config");
        self.get_json(STREAM_CONFIG_PATH).await
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Top-level catalog document.
#[derive(Debug, Deserialize)]
pub struct CatalogListing {
    #[serde(default)]
    pub data: Vec<CatalogItem>,
}

/// Movie or show as listed upstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "moviekey", default, deserialize_with = "lenient::opt_text")]
    pub key: Option<String>,
    #[serde(rename = "moviename", default, deserialize_with = "lenient::opt_text")]
    pub name: Option<String>,
    #[serde(rename = "isTV", default, deserialize_with = "lenient::flag")]
    pub is_tv: bool,
    #[serde(rename = "movieposter", default, deserialize_with = "lenient::opt_text")]
    pub poster: Option<String>,
    #[serde(rename = "moviebanner", default, deserialize_with = "lenient::opt_text")]
    pub banner: Option<String>,
    #[serde(rename = "movieyear", default, deserialize_with = "lenient::opt_text")]
    pub year: Option<String>,
    #[serde(rename = "movierating", default, deserialize_with = "lenient::opt_number")]
    pub rating: Option<f64>,
    #[serde(rename = "moviedesc", default, deserialize_with = "lenient::opt_text")]
    pub description: Option<String>,
    /// Slash-separated genres.
    #[serde(rename = "movieinfo", default, deserialize_with = "lenient::opt_text")]
    pub info: Option<String>,
    #[serde(rename = "movietype", default, deserialize_with = "lenient::opt_text")]
    pub kind: Option<String>,
    /// Running time for movies, `"<n> Seasons"` for shows.
    #[serde(rename = "movieduration", default, deserialize_with = "lenient::opt_text")]
    pub duration: Option<String>,
    #[serde(rename = "movietrailer", default, deserialize_with = "lenient::opt_text")]
    pub trailer: Option<String>,
    #[serde(rename = "movieimdb", default, deserialize_with = "lenient::opt_text")]
    pub imdb: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub tmdb: Option<String>,
    #[serde(rename = "movieviews", default, deserialize_with = "lenient::opt_number")]
    pub views: Option<f64>,
    #[serde(rename = "movielink", default, deserialize_with = "lenient::opt_text")]
    pub link: Option<String>,
}

impl CatalogItem {
    /// Name, if it is not blank.
    pub fn title(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }

    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or_default()
    }

    pub fn media_type(&self) -> &'static str {
        if self.is_tv {
            "tv"
        } else {
            "movie"
        }
    }

    /// Release year from the leading digits of the year field.
    pub fn release_year(&self) -> Option<i64> {
        self.year.as_deref().and_then(lenient::leading_int)
    }

    /// Number of seasons, read from e.g. `"3 Seasons"`. Defaults to one.
    pub fn season_count(&self) -> u32 {
        self.duration
            .as_deref()
            .and_then(|d| SEASON_COUNT_RE.captures(d))
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(1)
    }

    /// Case-insensitive match of `needle` (already lowercased) against
    /// name, type and genres.
    pub fn matches(&self, needle: &str) -> bool {
        [&self.name, &self.kind, &self.info]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Streaming mirror configuration.
///
/// Only the mirror lists are interpreted; every other field is passed
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default)]
    pub movies: Vec<String>,
    #[serde(default)]
    pub tv: Vec<String>,
    #[serde(default)]
    pub premium: Vec<String>,
    #[serde(default)]
    pub download: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StreamConfig {
    /// Config served when the upstream one is unavailable.
    pub fn fallback() -> Self {
        let mirrors = vec![FALLBACK_MIRROR.to_string()];
        let extra = match serde_json::json!({
            "latest": 1,
            "banner": "",
            "video": "",
            "newapp": false,
            "notice": false,
            "title": "Fallback",
            "text": "Using fallback configuration"
        }) {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Self {
            movies: mirrors.clone(),
            tv: mirrors.clone(),
            premium: mirrors.clone(),
            download: mirrors,
            extra,
        }
    }
}
