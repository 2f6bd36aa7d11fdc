//! Time-bounded cache for the upstream streaming config.
//!
//! The config changes rarely but is needed for every link lookup. A fetched
//! config is served until the TTL elapses or [`ConfigCache::invalidate`] is
//! called. When a refresh fails the previous config is served if there is
//! one, otherwise the fixed fallback. The fallback is never cached, so the
//! next request tries upstream again.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::catalog::{CatalogSource, StreamConfig};

struct CachedConfig {
    config: Arc<StreamConfig>,
    fetched_at: Instant,
}

pub struct ConfigCache {
    source: Arc<dyn CatalogSource>,
    ttl: Duration,
    cached: RwLock<Option<CachedConfig>>,
}

impl ConfigCache {
    pub fn new(source: Arc<dyn CatalogSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Create a new cache wrapped in Arc for shared access.
    pub fn new_shared(source: Arc<dyn CatalogSource>, ttl: Duration) -> Arc<Self> {
        Arc::new(Self::new(source, ttl))
    }

    /// Current config, refreshing it from upstream when stale.
    pub async fn get(&self) -> Arc<StreamConfig> {
        if let Some(config) = self.fresh().await {
            return config;
        }

        match self.source.fetch_stream_config().await {
            Ok(config) => {
                let config = Arc::new(config);
                *self.cached.write().await = Some(CachedConfig {
                    config: Arc::clone(&config),
                    fetched_at: Instant::now(),
                });
                tracing::debug!("Stream config refreshed");
                config
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching stream config");
                match self.cached.read().await.as_ref() {
                    Some(stale) => {
                        tracing::warn!("Serving stale stream config");
                        Arc::clone(&stale.config)
                    }
                    None => {
                        tracing::warn!("Serving fallback stream config");
                        Arc::new(StreamConfig::fallback())
                    }
                }
            }
        }
    }

    /// Drop the cached config; the next `get` fetches again.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    async fn fresh(&self) -> Option<Arc<StreamConfig>> {
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| Arc::clone(&c.config))
    }
}
