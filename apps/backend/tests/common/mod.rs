//! Test infrastructure for catalog API integration tests.
//!
//! Provides a `TestApp` wrapper around `axum_test::TestServer` backed by an
//! in-memory catalog, and a scripted realtime-database transport that
//! replies to season queries from a fixed script and records what it saw.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use catalog_api::config::Config;
use catalog_api::error::{AppError, Result};
use catalog_api::services::episodes::{EpisodeTransport, FrameSink, TransportEvent};
use catalog_api::services::{CatalogItem, CatalogSource, EpisodeResolver, StreamConfig};
use catalog_api::AppState;

pub const UPSTREAM_BASE: &str = "https://upstream.test";

/// Deadline used by test resolvers unless a test asks for another one.
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

// =============================================================================
// In-memory catalog
// =============================================================================

pub struct MemoryCatalog {
    pub items: Vec<CatalogItem>,
    /// `None` makes config fetches fail.
    pub config: Option<StreamConfig>,
    pub failing: bool,
}

impl MemoryCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            config: Some(test_stream_config()),
            failing: false,
        }
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalog {
    fn base_url(&self) -> &str {
        UPSTREAM_BASE
    }

    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>> {
        if self.failing {
            return Err(AppError::Upstream("catalog unreachable".to_string()));
        }
        Ok(self.items.clone())
    }

    async fn fetch_stream_config(&self) -> Result<StreamConfig> {
        self.config
            .clone()
            .ok_or_else(|| AppError::Upstream("config unreachable".to_string()))
    }
}

/// Decode a catalog item from upstream-shaped JSON.
pub fn item(value: Value) -> CatalogItem {
    serde_json::from_value(value).expect("valid catalog item")
}

/// A small catalog: two movies, two shows and one item with a blank name.
pub fn fixture_catalog() -> Vec<CatalogItem> {
    vec![
        item(json!({
            "moviekey": "matrix",
            "moviename": "The Matrix",
            "isTV": false,
            "movieposter": "/matrix.jpg",
            "moviebanner": "/matrix_bg.jpg",
            "movieyear": "1999",
            "movierating": 8.7,
            "moviedesc": "A hacker learns the truth.",
            "movieinfo": "Action/Sci-Fi",
            "movieduration": "2h 16m",
            "movielink": "movies/matrix.mkv",
            "movieviews": "1234"
        })),
        item(json!({
            "moviekey": "heat",
            "moviename": "Heat",
            "isTV": false,
            "movieyear": 1995,
            "movieinfo": "Crime/Drama"
        })),
        item(json!({
            "moviekey": "bb",
            "moviename": "Breaking Bad",
            "isTV": true,
            "movieposter": "/bb.jpg",
            "movieyear": "2008-01-20",
            "movierating": 9.5,
            "movieinfo": "Drama/Crime",
            "movieduration": "2 Seasons"
        })),
        item(json!({
            "moviekey": "dark",
            "moviename": "Dark",
            "isTV": true,
            "movieinfo": "Sci-Fi/Mystery",
            "movieduration": "1 Season"
        })),
        item(json!({
            "moviekey": "blank",
            "moviename": "  ",
            "isTV": false
        })),
    ]
}

pub fn test_stream_config() -> StreamConfig {
    let mut config = StreamConfig::fallback();
    config.premium = vec!["https://premium.test/".to_string()];
    config.tv = vec!["https://tv.test/".to_string()];
    config.movies = vec!["https://movies.test/".to_string()];
    config
}

// =============================================================================
// Scripted realtime-database transport
// =============================================================================

/// How the fake server behaves.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Frames pushed in reply to the query for each season.
    pub replies: HashMap<u32, Vec<String>>,
    /// Frames pushed as soon as the connection opens.
    pub on_open: Vec<String>,
    /// Close the connection right after replying to this season.
    pub close_after: Option<u32>,
    /// Report a connection error right after replying to this season.
    pub error_after: Option<u32>,
    /// Fail the connection attempt.
    pub refuse: bool,
    /// Fail every outbound send.
    pub fail_send: bool,
}

impl Script {
    pub fn reply(mut self, season: u32, frames: Vec<String>) -> Self {
        self.replies.insert(season, frames);
        self
    }
}

/// Transport that serves a [`Script`] and records the session's behaviour.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Script,
    connects: AtomicUsize,
    sent: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            ..Default::default()
        })
    }

    /// Frames the session sent, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Request ids of the queries the session sent, in order.
    pub fn requested_seasons(&self) -> Vec<u64> {
        self.sent()
            .iter()
            .filter_map(|frame| serde_json::from_str::<Value>(frame).ok())
            .filter_map(|value| value["d"]["r"].as_u64())
            .collect()
    }

    /// How many connections were torn down.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EpisodeTransport for ScriptedTransport {
    async fn connect(&self) -> Result<(Box<dyn FrameSink>, mpsc::Receiver<TransportEvent>)> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.script.refuse {
            return Err(AppError::Upstream("connection refused".to_string()));
        }

        let (tx, rx) = mpsc::channel(256);
        for frame in &self.script.on_open {
            let _ = tx.try_send(TransportEvent::Frame(frame.clone()));
        }

        let sink = ScriptedSink {
            script: self.script.clone(),
            events: Some(tx),
            sent: Arc::clone(&self.sent),
            closes: Arc::clone(&self.closes),
            closed: false,
        };
        Ok((Box::new(sink), rx))
    }
}

struct ScriptedSink {
    script: Script,
    events: Option<mpsc::Sender<TransportEvent>>,
    sent: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
    closed: bool,
}

impl ScriptedSink {
    fn push(&self, event: TransportEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event);
        }
    }
}

#[async_trait]
impl FrameSink for ScriptedSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        if self.script.fail_send {
            return Err(AppError::Upstream("broken pipe".to_string()));
        }
        self.sent.lock().unwrap().push(text.clone());

        let season = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|value| value["d"]["r"].as_u64())
            .map(|r| r as u32);

        if let Some(season) = season {
            for frame in self.script.replies.get(&season).cloned().unwrap_or_default() {
                self.push(TransportEvent::Frame(frame));
            }
            if self.script.close_after == Some(season) {
                self.push(TransportEvent::Closed);
            }
            if self.script.error_after == Some(season) {
                self.push(TransportEvent::Error("connection reset".to_string()));
            }
        }
        Ok(())
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.events = None;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for ScriptedSink {
    fn drop(&mut self) {
        if !self.closed {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub fn resolver(transport: &Arc<ScriptedTransport>, deadline: Duration) -> EpisodeResolver {
    EpisodeResolver::new(
        Arc::clone(transport) as Arc<dyn EpisodeTransport>,
        deadline,
        rtdb_protocol::DEFAULT_MAX_CHARS,
    )
}

// =============================================================================
// Wire frames
// =============================================================================

pub fn episodes_path(key: &str, season: u32) -> String {
    format!("Data/{}/seasons/{}/episodes", key, season)
}

/// Server acknowledgement of request `id`.
pub fn completion(id: u32) -> String {
    json!({"t": "d", "d": {"r": id, "b": {"s": "ok", "d": ""}}}).to_string()
}

/// Data push for `path`.
pub fn data(path: &str, payload: Value) -> String {
    json!({"t": "d", "d": {"a": "d", "b": {"p": path, "d": payload}}}).to_string()
}

/// Episode data for one season followed by its acknowledgement.
pub fn season_reply(key: &str, season: u32, payload: Value) -> Vec<String> {
    vec![data(&episodes_path(key, season), payload), completion(season)]
}

// =============================================================================
// Test application
// =============================================================================

/// Test application wrapper around axum_test::TestServer.
pub struct TestApp {
    server: TestServer,
    transport: Arc<ScriptedTransport>,
}

impl TestApp {
    /// Fixture catalog with a realtime database that refuses connections.
    pub fn new() -> Self {
        Self::with(
            MemoryCatalog::new(fixture_catalog()),
            Script {
                refuse: true,
                ..Default::default()
            },
        )
    }

    /// Build the complete production router over `catalog` and a transport
    /// that follows `script`.
    pub fn with(catalog: MemoryCatalog, script: Script) -> Self {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.upstream.base_url = UPSTREAM_BASE.to_string();

        let transport = ScriptedTransport::new(script);
        let resolver = Arc::new(resolver(&transport, TEST_DEADLINE));
        let state = AppState::new(config, Arc::new(catalog), resolver);

        let server =
            TestServer::new(catalog_api::router(state)).expect("Failed to create test server");

        Self { server, transport }
    }

    /// Get a reference to the test server.
    pub fn server(&self) -> &TestServer {
        &self.server
    }

    /// Get a reference to the scripted transport.
    pub fn transport(&self) -> &Arc<ScriptedTransport> {
        &self.transport
    }
}
