//! Service endpoints: index, health check, upstream config and the
//! catch-all 404.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::error::ErrorResponse;
use crate::response::ApiResponse;
use crate::services::StreamConfig;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub success: bool,
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: Endpoints,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub home: &'static str,
    pub search: &'static str,
    pub content: &'static str,
    pub links: &'static str,
    pub config: &'static str,
    pub health: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: String,
}

/// GET /
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        success: true,
        message: "StreamFlix API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: Endpoints {
            home: "/api/home?page=1&limit=20",
            search: "/api/search?q=query&page=1&limit=20",
            content: "/api/content/:id",
            links: "/api/links/:id",
            config: "/api/config",
            health: "/api/health",
        },
    })
}

/// GET /api/health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "StreamFlix API is running",
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}

/// GET /api/config
///
/// Never fails: the cache falls back to a fixed config when upstream is down.
pub async fn get_config(State(state): State<AppState>) -> Json<ApiResponse<StreamConfig>> {
    let config = state.config_cache().get().await;
    ApiResponse::ok(StreamConfig::clone(&config))
}

/// Fallback for unknown routes.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Endpoint not found", None)),
    )
}
