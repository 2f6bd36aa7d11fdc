//! Stream link endpoint.
//!
//! A link id is one of:
//! - a direct episode path from the realtime database (`tv/<key>/s1/episode1.mkv`)
//! - a synthesized episode id (`<key>|s<season>e<episode>`)
//! - anything else, treated as a movie path
//!
//! Each id is expanded against the mirror lists of the upstream config.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::{ErrorResponse, Result};
use crate::response::ApiResponse;
use crate::services::StreamConfig;
use crate::AppState;

const SOURCE: &str = "StreamFlix";
const PREMIUM: &str = "StreamFlix - Premium";
const PREMIUM_QUALITY: u32 = 720;
const STANDARD_QUALITY: u32 = 480;

lazy_static! {
    static ref SEASON_RE: Regex = Regex::new(r"s(\d+)").unwrap();
    static ref EPISODE_RE: Regex = Regex::new(r"e(\d+)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamLink {
    pub source: &'static str,
    pub name: &'static str,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub quality: u32,
    pub headers: HashMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
pub struct LinksData {
    pub links: Vec<StreamLink>,
    pub total: usize,
}

/// What a link id points at.
#[derive(Debug, PartialEq, Eq)]
enum LinkTarget<'a> {
    EpisodePath(&'a str),
    Episode { key: &'a str, season: &'a str, episode: &'a str },
    Movie(&'a str),
    Unresolvable,
}

fn classify(id: &str) -> LinkTarget<'_> {
    if id.starts_with("tv/") && id.contains("/s") && id.ends_with(".mkv") {
        return LinkTarget::EpisodePath(id);
    }

    if id.contains("|s") && id.contains('e') {
        let mut parts = id.split('|');
        let key = parts.next().unwrap_or_default();
        let info = parts.next().unwrap_or_default();
        let season = SEASON_RE.captures(info).and_then(|c| c.get(1));
        let episode = EPISODE_RE.captures(info).and_then(|c| c.get(1));
        return match (season, episode) {
            (Some(season), Some(episode)) => LinkTarget::Episode {
                key,
                season: season.as_str(),
                episode: episode.as_str(),
            },
            _ => LinkTarget::Unresolvable,
        };
    }

    if id.is_empty() {
        LinkTarget::Unresolvable
    } else {
        LinkTarget::Movie(id)
    }
}

/// Expand a link id against the configured mirrors.
pub fn build_links(id: &str, config: &StreamConfig, referer: &str) -> Vec<StreamLink> {
    let link = |name: &'static str, quality: u32, url: String| StreamLink {
        source: SOURCE,
        name,
        url,
        kind: "video",
        quality,
        headers: HashMap::from([("Referer", referer.to_string())]),
    };

    let mirrored = |mirrors: &[String], name: &'static str, quality: u32, path: &str| {
        mirrors
            .iter()
            .map(|base| link(name, quality, format!("{}{}", base, path)))
            .collect::<Vec<_>>()
    };

    match classify(id) {
        LinkTarget::EpisodePath(path) => {
            let mut links = mirrored(config.premium.as_slice(), PREMIUM, PREMIUM_QUALITY, path);
            links.extend(mirrored(config.tv.as_slice(), "StreamFlix - TV", STANDARD_QUALITY, path));
            links
        }
        LinkTarget::Episode { key, season, episode } => {
            let path = format!("tv/{}/s{}/episode{}.mkv", key, season, episode);
            mirrored(config.premium.as_slice(), PREMIUM, PREMIUM_QUALITY, path.as_str())
        }
        LinkTarget::Movie(path) => {
            let mut links = mirrored(config.premium.as_slice(), PREMIUM, PREMIUM_QUALITY, path);
            links.extend(mirrored(
                config.movies.as_slice(),
                "StreamFlix - Movies",
                STANDARD_QUALITY,
                path,
            ));
            links
        }
        LinkTarget::Unresolvable => {
            tracing::debug!(id = %id, "Link id did not resolve to a stream path");
            Vec::new()
        }
    }
}

/// GET /api/links/:id
pub async fn get_links(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    if id.starts_with("error|") {
        let body = ErrorResponse::new("Cannot load links for error item", None);
        return Ok(Json(body).into_response());
    }

    let config = state.config_cache().get().await;
    let links = build_links(&id, &config, state.catalog().base_url());
    tracing::debug!(id = %id, total = links.len(), "Built stream links");

    let total = links.len();
    Ok(ApiResponse::ok(LinksData { links, total }).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERER: &str = "https://api.streamflix.app";

    fn config() -> StreamConfig {
        let mut config = StreamConfig::fallback();
        config.premium = vec!["https://p1/".to_string(), "https://p2/".to_string()];
        config.tv = vec!["https://tv/".to_string()];
        config.movies = vec!["https://movies/".to_string()];
        config
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify("tv/abc/s1/episode2.mkv"),
            LinkTarget::EpisodePath("tv/abc/s1/episode2.mkv")
        );
        assert_eq!(
            classify("abc|s2e10"),
            LinkTarget::Episode { key: "abc", season: "2", episode: "10" }
        );
        assert_eq!(classify("movies/abc.mkv"), LinkTarget::Movie("movies/abc.mkv"));
        assert_eq!(classify("abc|sxe"), LinkTarget::Unresolvable);
    }

    #[test]
    fn test_episode_path_links() {
        let links = build_links("tv/abc/s1/episode2.mkv", &config(), REFERER);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].url, "https://p1/tv/abc/s1/episode2.mkv");
        assert_eq!(links[0].quality, 720);
        assert_eq!(links[2].name, "StreamFlix - TV");
        assert_eq!(links[2].quality, 480);
        assert_eq!(links[2].headers["Referer"], REFERER);
    }

    #[test]
    fn test_synthesized_episode_links() {
        let links = build_links("abc|s2e10", &config(), REFERER);
        let urls: Vec<_> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://p1/tv/abc/s2/episode10.mkv",
                "https://p2/tv/abc/s2/episode10.mkv"
            ]
        );
        assert!(links.iter().all(|l| l.name == "StreamFlix - Premium"));
    }

    #[test]
    fn test_movie_links() {
        let links = build_links("movies/abc.mkv", &config(), REFERER);
        assert_eq!(links.len(), 3);
        assert_eq!(links[2].name, "StreamFlix - Movies");
        assert_eq!(links[2].url, "https://movies/movies/abc.mkv");
        assert_eq!(links[2].source, "StreamFlix");
        assert_eq!(links[2].kind, "video");
    }
}
