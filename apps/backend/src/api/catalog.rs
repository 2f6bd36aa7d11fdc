//! Catalog listing endpoints: home page and search.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::response::{ApiResponse, Page, PageQuery, Pagination};
use crate::services::CatalogItem;
use crate::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Query parameters for search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

/// Catalog entry as listed on the home page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    /// `<key>|movie` or `<key>|tv`, the id for the content endpoint.
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: &'static str,
    pub poster_url: Option<String>,
    pub year: Option<i64>,
    pub rating: f64,
    pub quality: &'static str,
}

impl CatalogEntry {
    pub fn from_item(item: &CatalogItem, image_base: &str) -> Self {
        Self {
            name: item.title().unwrap_or_default().to_string(),
            url: format!("{}|{}", item.key(), item.media_type()),
            media_type: item.media_type(),
            poster_url: image_url(image_base, "w500", item.poster.as_deref()),
            year: item.release_year(),
            rating: item.rating.unwrap_or(0.0),
            quality: "HD",
        }
    }
}

/// Search hit: a catalog entry plus description and genres.
#[derive(Debug, Serialize)]
pub struct SearchEntry {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    pub description: String,
    pub genre: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeData {
    pub movies: Page<CatalogEntry>,
    pub tv_shows: Page<CatalogEntry>,
}

#[derive(Debug, Serialize)]
pub struct SearchData {
    pub results: Vec<SearchEntry>,
    pub pagination: Pagination,
    pub query: String,
}

/// `<base>/<size>/<path>`, or `None` when there is no path.
pub fn image_url(base: &str, size: &str, path: Option<&str>) -> Option<String> {
    path.map(|p| p.trim_start_matches('/'))
        .filter(|p| !p.is_empty())
        .map(|p| format!("{}/{}/{}", base.trim_end_matches('/'), size, p))
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/home
///
/// Paged movies and TV shows. Both lists share the same page parameters.
pub async fn home(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<HomeData>>> {
    let params = query.params();
    let items = state.catalog().fetch_catalog().await?;
    let image_base = &state.config.upstream.image_base_url;

    let (shows, movies): (Vec<&CatalogItem>, Vec<&CatalogItem>) = items
        .iter()
        .filter(|item| item.title().is_some())
        .partition(|item| item.is_tv);

    let page_of = |list: &[&CatalogItem]| Page {
        items: params
            .slice(list)
            .iter()
            .map(|item| CatalogEntry::from_item(item, image_base))
            .collect(),
        pagination: params.pagination(list.len()),
    };

    tracing::debug!(
        page = params.page,
        movies = movies.len(),
        tv_shows = shows.len(),
        "Home listing"
    );

    Ok(ApiResponse::ok(HomeData {
        movies: page_of(&movies),
        tv_shows: page_of(&shows),
    }))
}

/// GET /api/search
///
/// Case-insensitive substring search over name, type and genres.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<SearchData>>> {
    let term = query.q.as_deref().unwrap_or_default();
    if term.is_empty() {
        return Err(AppError::BadRequest(
            "Query parameter \"q\" is required".to_string(),
        ));
    }

    let params = query.page.params();
    let needle = term.to_lowercase();
    let items = state.catalog().fetch_catalog().await?;
    let image_base = &state.config.upstream.image_base_url;

    let matches: Vec<&CatalogItem> = items
        .iter()
        .filter(|item| item.title().is_some() && item.matches(&needle))
        .collect();

    let results = params
        .slice(&matches)
        .iter()
        .map(|item| SearchEntry {
            entry: CatalogEntry::from_item(item, image_base),
            description: item.description.clone().unwrap_or_default(),
            genre: item.info.clone().unwrap_or_default(),
        })
        .collect();

    tracing::debug!(query = %term, results = matches.len(), "Catalog search");

    Ok(ApiResponse::ok(SearchData {
        results,
        pagination: params.pagination(matches.len()),
        query: term.to_string(),
    }))
}
