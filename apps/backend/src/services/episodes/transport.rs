//! Transport seam between the resolver and the network.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// Something that happened on an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One inbound text frame.
    Frame(String),
    /// The connection was closed by the peer or went away.
    Closed,
    /// The connection failed.
    Error(String),
}

/// Outbound half of an open connection.
#[async_trait]
pub trait FrameSink: Send {
    /// Send one text frame.
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Close the connection. Calling this more than once has no effect.
    async fn close(&mut self);
}

/// Opens connections to the realtime database.
#[async_trait]
pub trait EpisodeTransport: Send + Sync {
    /// Open a connection. Returns once it is ready to carry frames, along
    /// with the receiver for everything that arrives on it.
    async fn connect(&self) -> Result<(Box<dyn FrameSink>, mpsc::Receiver<TransportEvent>)>;
}
