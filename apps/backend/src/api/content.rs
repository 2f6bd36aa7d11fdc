//! Content detail endpoint.
//!
//! TV shows get their episode list from the realtime database. When that
//! yields nothing, a fixed placeholder list is returned so clients always
//! have something to render.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::api::catalog::image_url;
use crate::error::{AppError, ErrorResponse, Result};
use crate::response::ApiResponse;
use crate::services::{AggregateResult, CatalogItem};
use crate::AppState;

/// Seasons in the placeholder episode list.
pub const FALLBACK_SEASONS: u32 = 2;

/// Episodes per season in the placeholder episode list.
pub const FALLBACK_EPISODES_PER_SEASON: u32 = 6;

/// Content key reserved for items the upstream marks as broken.
const ERROR_KEY: &str = "error";

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetail {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: &'static str,
    pub poster_url: Option<String>,
    pub background_poster_url: Option<String>,
    pub year: Option<i64>,
    pub plot: String,
    pub tags: Vec<String>,
    pub rating: i64,
    pub duration: String,
    pub trailer: String,
    pub imdb: String,
    pub tmdb: String,
    pub views: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<Vec<Episode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
}

impl ContentDetail {
    fn from_item(item: &CatalogItem, url: &str, image_base: &str) -> Self {
        Self {
            name: item.title().unwrap_or("Unknown Title").to_string(),
            url: url.to_string(),
            media_type: item.media_type(),
            poster_url: image_url(image_base, "w500", item.poster.as_deref()),
            background_poster_url: image_url(image_base, "original", item.banner.as_deref()),
            year: item.release_year(),
            plot: item.description.clone().unwrap_or_default(),
            tags: item
                .info
                .as_deref()
                .filter(|info| !info.is_empty())
                .map(|info| info.split('/').map(str::to_string).collect())
                .unwrap_or_default(),
            rating: item.rating.map(|r| (r * 1000.0).round() as i64).unwrap_or(0),
            duration: item.duration.clone().unwrap_or_default(),
            trailer: item.trailer.clone().unwrap_or_default(),
            imdb: item.imdb.clone().unwrap_or_default(),
            tmdb: item.tmdb.clone().unwrap_or_default(),
            views: item.views.map(|v| v.round() as i64).unwrap_or(0),
            episodes: None,
            season_count: None,
            data_url: None,
        }
    }
}

/// One playable episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub name: String,
    pub season: u32,
    /// 1-based episode number.
    pub episode: u32,
    pub description: String,
    pub poster_url: Option<String>,
    pub rating: i64,
    pub runtime: i64,
    /// Direct link, or a `<key>|s<season>e<episode>` id for the links endpoint.
    pub url: String,
}

/// Flatten resolved seasons into an episode list, seasons and episodes in
/// ascending order.
pub fn episode_listing(
    content_key: &str,
    seasons: &AggregateResult,
    image_base: &str,
) -> Vec<Episode> {
    seasons
        .seasons()
        .flat_map(|(season, episodes)| {
            episodes.iter().map(move |(index, record)| {
                let number = index + 1;
                Episode {
                    name: record
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("Episode {}", number)),
                    season,
                    episode: number,
                    description: record.overview.clone().unwrap_or_default(),
                    poster_url: image_url(image_base, "w500", record.still_path.as_deref()),
                    rating: record
                        .vote_average
                        .map(|v| (v * 100.0).round() as i64)
                        .unwrap_or(0),
                    runtime: record.runtime.map(|r| r.round() as i64).unwrap_or(0),
                    url: record
                        .link
                        .clone()
                        .filter(|link| !link.is_empty())
                        .unwrap_or_else(|| episode_id(content_key, season, number)),
                }
            })
        })
        .collect()
}

/// Placeholder episodes used when nothing could be resolved.
pub fn fallback_episodes(content_key: &str) -> Vec<Episode> {
    (1..=FALLBACK_SEASONS)
        .flat_map(|season| {
            (1..=FALLBACK_EPISODES_PER_SEASON).map(move |episode| Episode {
                name: format!("Episode {}", episode),
                season,
                episode,
                description: format!("Episode {} of Season {}", episode, season),
                poster_url: None,
                rating: 0,
                runtime: 0,
                url: episode_id(content_key, season, episode),
            })
        })
        .collect()
}

fn episode_id(content_key: &str, season: u32, episode: u32) -> String {
    format!("{}|s{}e{}", content_key, season, episode)
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/content/:id
///
/// `id` is `<key>|<type>` as produced by the listing endpoints.
pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let content_key = id.split('|').next().unwrap_or_default();

    if content_key == ERROR_KEY {
        return Ok(Json(ErrorResponse::new(
            "Content not available",
            Some("The StreamFlix service is currently unavailable".to_string()),
        ))
        .into_response());
    }

    let items = state.catalog().fetch_catalog().await?;
    let item = items
        .iter()
        .find(|item| item.key() == content_key)
        .ok_or_else(|| AppError::NotFound("Content not found".to_string()))?;

    let image_base = &state.config.upstream.image_base_url;
    let mut detail = ContentDetail::from_item(item, &id, image_base);

    if item.is_tv {
        let season_count = item.season_count();
        tracing::debug!(content_key = %content_key, season_count, "Resolving TV episodes");

        let seasons = state
            .episode_resolver()
            .resolve(content_key, season_count)
            .await;

        let mut episodes = episode_listing(content_key, &seasons, image_base);
        if episodes.is_empty() {
            tracing::info!(
                content_key = %content_key,
                "No episodes resolved, using placeholder episodes"
            );
            episodes = fallback_episodes(content_key);
        }

        detail.episodes = Some(episodes);
        detail.season_count = Some(season_count);
    } else {
        detail.data_url = Some(item.link.clone().unwrap_or_default());
    }

    Ok(ApiResponse::ok(detail).into_response())
}
