//! Catalog API Library
//!
//! HTTP facade over the upstream streaming catalog. TV episode lists are
//! pulled from the realtime database over a WebSocket session.
//! This library exposes modules for use in integration tests.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod config;
pub mod error;
pub mod lenient;
pub mod response;
pub mod services;

use config::Config;
use services::{CatalogSource, ConfigCache, EpisodeResolver};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    catalog: Arc<dyn CatalogSource>,
    config_cache: Arc<ConfigCache>,
    episode_resolver: Arc<EpisodeResolver>,
}

impl AppState {
    /// Build the state. The config cache is created over `catalog` using
    /// the configured TTL.
    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogSource>,
        episode_resolver: Arc<EpisodeResolver>,
    ) -> Self {
        let config_cache =
            ConfigCache::new_shared(Arc::clone(&catalog), config.upstream.config_ttl());
        Self {
            config: Arc::new(config),
            catalog,
            config_cache,
            episode_resolver,
        }
    }

    /// Get a reference to the upstream catalog.
    pub fn catalog(&self) -> &dyn CatalogSource {
        self.catalog.as_ref()
    }

    /// Get a reference to the upstream config cache.
    pub fn config_cache(&self) -> &ConfigCache {
        &self.config_cache
    }

    /// Get a reference to the episode resolver.
    pub fn episode_resolver(&self) -> &EpisodeResolver {
        &self.episode_resolver
    }
}

/// Build the complete application router.
///
/// Shared by `main.rs` and the integration tests so both run the same routes.
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(api::system::health_check))
        .route("/home", get(api::catalog::home))
        .route("/search", get(api::catalog::search))
        .route("/content/:id", get(api::content::get_content))
        .route("/links/:id", get(api::links::get_links))
        .route("/config", get(api::system::get_config));

    Router::new()
        .route("/", get(api::system::index))
        .nest("/api", api_routes)
        // 404 fallback
        .fallback(api::system::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::services::episodes::{EpisodeTransport, FrameSink, TransportEvent};
    use crate::services::{CatalogItem, StreamConfig};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    struct EmptyCatalog;

    #[async_trait]
    impl CatalogSource for EmptyCatalog {
        fn base_url(&self) -> &str {
            "https://upstream.test"
        }

        async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>> {
            Ok(Vec::new())
        }

        async fn fetch_stream_config(&self) -> Result<StreamConfig> {
            Err(AppError::Upstream("offline".to_string()))
        }
    }

    struct Offline;

    #[async_trait]
    impl EpisodeTransport for Offline {
        async fn connect(&self) -> Result<(Box<dyn FrameSink>, mpsc::Receiver<TransportEvent>)> {
            Err(AppError::Upstream("offline".to_string()))
        }
    }

    fn app() -> Router {
        let resolver = EpisodeResolver::new(Arc::new(Offline), Duration::from_secs(1), 1024);
        router(AppState::new(
            Config::default(),
            Arc::new(EmptyCatalog),
            Arc::new(resolver),
        ))
    }

    async fn status_of(uri: &str) -> StatusCode {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_routes() {
        assert_eq!(status_of("/").await, StatusCode::OK);
        assert_eq!(status_of("/api/health").await, StatusCode::OK);
        assert_eq!(status_of("/api/home").await, StatusCode::OK);
        assert_eq!(status_of("/api/config").await, StatusCode::OK);
        assert_eq!(status_of("/api/search").await, StatusCode::BAD_REQUEST);
        assert_eq!(status_of("/api/content/nothing").await, StatusCode::NOT_FOUND);
        assert_eq!(status_of("/health").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight_allowed() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/home")
                    .header("origin", "https://client.test")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
