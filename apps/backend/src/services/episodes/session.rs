//! Per-request episode resolution state machine.
//!
//! A session owns everything one resolution needs: the reassembly buffer,
//! the accumulated result and the season counters. It performs no I/O.
//! The driver feeds it transport events and carries out the [`Step`] it
//! returns, which keeps sequencing and termination rules testable without
//! a socket.

use rtdb_protocol::{is_keepalive, Reassembly, ReassemblyBuffer, ServerMessage};
use serde_json::Value;

use super::query::{season_from_path, SeasonQuery};
use super::types::{episodes_from_payload, AggregateResult};

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the transport to open.
    Connecting,
    /// The query for this season is in flight.
    AwaitingSeason(u32),
    /// Every season has been acknowledged.
    Completed,
    /// The transport closed before completion; the partial result stands.
    Disconnected,
    /// Failed; the result is discarded.
    Aborted,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Disconnected | Self::Aborted)
    }
}

/// What the driver must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to do; wait for the next event.
    Continue,
    /// Send this text frame, then wait for the next event.
    Send(String),
    /// The session is over; close the transport and collect the result.
    Finish,
}

#[derive(Debug)]
pub struct EpisodeSession {
    content_key: String,
    total_seasons: u32,
    state: SessionState,
    completed: u32,
    buffer: ReassemblyBuffer,
    result: AggregateResult,
}

impl EpisodeSession {
    /// `total_seasons` below one is treated as one.
    pub fn new(
        content_key: impl Into<String>,
        total_seasons: u32,
        max_buffer_chars: usize,
    ) -> Self {
        Self {
            content_key: content_key.into(),
            total_seasons: total_seasons.max(1),
            state: SessionState::Connecting,
            completed: 0,
            buffer: ReassemblyBuffer::with_limit(max_buffer_chars),
            result: AggregateResult::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn seasons_completed(&self) -> u32 {
        self.completed
    }

    /// The transport is open: query the first season.
    pub fn on_open(&mut self) -> Step {
        if self.state != SessionState::Connecting {
            return Step::Continue;
        }
        tracing::debug!(
            content_key = %self.content_key,
            "Episode stream open, requesting season 1"
        );
        self.request(1)
    }

    /// Handle one inbound text frame.
    pub fn on_frame(&mut self, frame: &str) -> Step {
        let SessionState::AwaitingSeason(season) = self.state else {
            tracing::trace!(state = ?self.state, "Ignoring frame outside of a query");
            return Step::Continue;
        };

        if is_keepalive(frame) {
            return Step::Continue;
        }

        match self.buffer.push(frame) {
            Reassembly::Incomplete => Step::Continue,
            Reassembly::Overflow => {
                self.abort("reassembly buffer overflow");
                Step::Finish
            }
            Reassembly::Complete(value) => self.dispatch(ServerMessage::classify(value), season),
        }
    }

    /// The transport closed. Whatever has been gathered is kept.
    pub fn on_closed(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        tracing::debug!(
            content_key = %self.content_key,
            completed = self.completed,
            total = self.total_seasons,
            "Episode stream closed before completion"
        );
        self.state = SessionState::Disconnected;
    }

    /// Give up. The result will be empty.
    pub fn abort(&mut self, reason: &str) {
        if self.state.is_terminal() {
            return;
        }
        tracing::warn!(
            content_key = %self.content_key,
            reason = %reason,
            "Episode session aborted"
        );
        self.buffer.clear();
        self.state = SessionState::Aborted;
    }

    /// Consume the session and return its result.
    ///
    /// Aborted sessions yield an empty result; every other state yields what
    /// was accumulated.
    pub fn finish(self) -> AggregateResult {
        match self.state {
            SessionState::Aborted => AggregateResult::new(),
            _ => self.result,
        }
    }

    fn dispatch(&mut self, message: ServerMessage, season: u32) -> Step {
        match message {
            ServerMessage::Reply { .. } if message.is_ok_reply_to(u64::from(season)) => {
                self.complete_season(season)
            }
            ServerMessage::Reply { request_id, status } => {
                tracing::warn!(
                    request_id,
                    status = %status,
                    awaiting = season,
                    "Ignoring reply that does not complete the current season"
                );
                Step::Continue
            }
            ServerMessage::Data { path, payload } => {
                self.merge_payload(path.as_deref(), &payload, season);
                Step::Continue
            }
            ServerMessage::Other => Step::Continue,
        }
    }

    fn complete_season(&mut self, season: u32) -> Step {
        self.completed += 1;
        self.result.ensure_season(season);
        tracing::info!(
            content_key = %self.content_key,
            season,
            completed = self.completed,
            total = self.total_seasons,
            "Season complete"
        );

        if self.completed >= self.total_seasons {
            self.state = SessionState::Completed;
            Step::Finish
        } else {
            self.request(season + 1)
        }
    }

    fn merge_payload(&mut self, path: Option<&str>, payload: &Value, active: u32) {
        let season = match path.map(|p| (p, season_from_path(p))) {
            Some((_, Some(season))) => season,
            Some((p, None)) => {
                tracing::debug!(path = %p, active, "No season in data path, using active season");
                active
            }
            None => active,
        };

        let episodes = episodes_from_payload(payload);
        if episodes.is_empty() {
            return;
        }

        tracing::debug!(season, count = episodes.len(), "Received episodes");
        self.result.merge(season, episodes);
    }

    fn request(&mut self, season: u32) -> Step {
        match SeasonQuery::new(&self.content_key, season).to_frame() {
            Ok(frame) => {
                self.state = SessionState::AwaitingSeason(season);
                Step::Send(frame)
            }
            Err(e) => {
                self.abort(&e.to_string());
                Step::Finish
            }
        }
    }
}
