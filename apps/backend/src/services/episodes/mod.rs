//! Episode resolution over the realtime database stream.
//!
//! [`EpisodeResolver::resolve`] opens one connection, queries the episode
//! subtree of each season in turn and returns everything it gathered. It
//! never fails: errors and the session deadline degrade to a partial or
//! empty [`AggregateResult`], and the caller decides what to show instead.

pub mod connection;
pub mod query;
pub mod session;
pub mod transport;
pub mod types;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::RtdbConfig;

pub use connection::{RtdbConnection, WebSocketTransport};
pub use query::{season_from_path, SeasonQuery};
pub use session::{EpisodeSession, SessionState, Step};
pub use transport::{EpisodeTransport, FrameSink, TransportEvent};
pub use types::{AggregateResult, EpisodeRecord, SeasonMap};

/// Resolves per-season episode metadata for TV content.
pub struct EpisodeResolver {
    transport: Arc<dyn EpisodeTransport>,
    deadline: Duration,
    max_buffer_chars: usize,
}

impl EpisodeResolver {
    pub fn new(
        transport: Arc<dyn EpisodeTransport>,
        deadline: Duration,
        max_buffer_chars: usize,
    ) -> Self {
        Self {
            transport,
            deadline,
            max_buffer_chars,
        }
    }

    /// Resolver over a WebSocket to the configured endpoint.
    pub fn from_config(config: &RtdbConfig) -> Self {
        Self::new(
            Arc::new(WebSocketTransport::new(config.endpoint())),
            config.deadline(),
            config.max_buffer_chars,
        )
    }

    /// Create a resolver wrapped in Arc for shared access.
    pub fn new_shared(config: &RtdbConfig) -> Arc<Self> {
        Arc::new(Self::from_config(config))
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Fetch the episodes of seasons `1..=total_seasons` for `content_key`.
    ///
    /// The deadline runs from the moment this is called, connection time
    /// included. When it expires the session is dropped, which closes the
    /// connection, and the result is empty.
    pub async fn resolve(&self, content_key: &str, total_seasons: u32) -> AggregateResult {
        tracing::debug!(content_key = %content_key, total_seasons, "Resolving episodes");

        let session = self.run_session(content_key, total_seasons);
        match tokio::time::timeout(self.deadline, session).await {
            Ok(result) => {
                tracing::debug!(
                    content_key = %content_key,
                    seasons = result.season_count(),
                    episodes = result.episode_count(),
                    "Episode resolution finished"
                );
                result
            }
            Err(_) => {
                tracing::warn!(
                    content_key = %content_key,
                    deadline_secs = self.deadline.as_secs(),
                    "Episode resolution timed out"
                );
                AggregateResult::new()
            }
        }
    }

    async fn run_session(&self, content_key: &str, total_seasons: u32) -> AggregateResult {
        let mut session = EpisodeSession::new(content_key, total_seasons, self.max_buffer_chars);

        let (mut sink, mut events) = match self.transport.connect().await {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!(
                    content_key = %content_key,
                    error = %e,
                    "Episode stream unavailable"
                );
                session.abort(&e.to_string());
                return session.finish();
            }
        };

        drive(&mut session, sink.as_mut(), &mut events).await;
        sink.close().await;

        session.finish()
    }
}

/// Run the session against an open connection until it reaches a terminal
/// state.
async fn drive(
    session: &mut EpisodeSession,
    sink: &mut dyn FrameSink,
    events: &mut mpsc::Receiver<TransportEvent>,
) {
    let mut step = session.on_open();

    loop {
        match step {
            Step::Send(frame) => {
                if let Err(e) = sink.send_text(frame).await {
                    session.abort(&e.to_string());
                    return;
                }
            }
            Step::Finish => return,
            Step::Continue => {}
        }

        step = match events.recv().await {
            Some(TransportEvent::Frame(text)) => session.on_frame(&text),
            Some(TransportEvent::Closed) | None => {
                session.on_closed();
                return;
            }
            Some(TransportEvent::Error(reason)) => {
                session.abort(&reason);
                return;
            }
        };
    }
}
