//! Integration tests for the stream links endpoint.

mod common;

use common::{fixture_catalog, MemoryCatalog, Script, TestApp, UPSTREAM_BASE};
use serde_json::Value;

fn urls(body: &Value) -> Vec<String> {
    body["data"]["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["url"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_movie_links() {
    let app = TestApp::new();

    let response = app.server().get("/api/links/movies%2Fmatrix.mkv").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        urls(&body),
        vec![
            "https://premium.test/movies/matrix.mkv",
            "https://movies.test/movies/matrix.mkv"
        ]
    );
    assert_eq!(body["data"]["total"], 2);

    let premium = &body["data"]["links"][0];
    assert_eq!(premium["source"], "StreamFlix");
    assert_eq!(premium["name"], "StreamFlix - Premium");
    assert_eq!(premium["type"], "video");
    assert_eq!(premium["quality"], 720);
    assert_eq!(premium["headers"]["Referer"], UPSTREAM_BASE);
    assert_eq!(body["data"]["links"][1]["quality"], 480);
}

#[tokio::test]
async fn test_episode_path_links() {
    let app = TestApp::new();

    let body: Value = app
        .server()
        .get("/api/links/tv%2Fbb%2Fs1%2Fepisode2.mkv")
        .await
        .json();

    assert_eq!(
        urls(&body),
        vec![
            "https://premium.test/tv/bb/s1/episode2.mkv",
            "https://tv.test/tv/bb/s1/episode2.mkv"
        ]
    );
    assert_eq!(body["data"]["links"][1]["name"], "StreamFlix - TV");
}

#[tokio::test]
async fn test_synthesized_episode_links() {
    let app = TestApp::new();

    let body: Value = app.server().get("/api/links/bb%7Cs2e5").await.json();

    assert_eq!(urls(&body), vec!["https://premium.test/tv/bb/s2/episode5.mkv"]);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_error_item_links() {
    let app = TestApp::new();

    let response = app.server().get("/api/links/error%7Cmovie").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Cannot load links for error item");
}

#[tokio::test]
async fn test_links_use_fallback_mirrors_when_config_unavailable() {
    let mut catalog = MemoryCatalog::new(fixture_catalog());
    catalog.config = None;
    let app = TestApp::with(catalog, Script::default());

    let body: Value = app.server().get("/api/links/bb%7Cs1e1").await.json();

    assert_eq!(urls(&body), vec!["https://example.com/fallback/tv/bb/s1/episode1.mkv"]);
}
