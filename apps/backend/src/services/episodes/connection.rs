//! WebSocket connection to the realtime database.
//!
//! One background task owns the socket. It forwards inbound text frames to
//! the session over a channel and writes the frames the session hands back.
//! Shutdown is signalled through a oneshot, either explicitly or when the
//! connection handle is dropped.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::{AppError, Result};

use super::transport::{EpisodeTransport, FrameSink, TransportEvent};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Capacity of the inbound event channel.
const EVENT_CHANNEL_SIZE: usize = 100;

/// Capacity of the outbound frame channel. Queries are sequential, so this
/// only ever holds one frame in practice.
const OUTBOUND_CHANNEL_SIZE: usize = 8;

/// Production transport: a fresh WebSocket per session.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EpisodeTransport for WebSocketTransport {
    async fn connect(&self) -> Result<(Box<dyn FrameSink>, mpsc::Receiver<TransportEvent>)> {
        let (connection, events) = RtdbConnection::connect(&self.url).await?;
        Ok((Box::new(connection), events))
    }
}

/// Handle to an open realtime database WebSocket.
pub struct RtdbConnection {
    outbound_tx: mpsc::Sender<String>,
    /// Channel to signal shutdown to the socket task.
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl RtdbConnection {
    /// Connect and return a connection handle and event receiver.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<TransportEvent>)> {
        tracing::debug!(url = %url, "Connecting to realtime database");

        let (socket, _response) = connect_async(url).await.map_err(|e| {
            AppError::Upstream(format!("Failed to connect to realtime database: {}", e))
        })?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CHANNEL_SIZE);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(Self::run(socket, outbound_rx, event_tx, shutdown_rx));

        tracing::debug!(url = %url, "Connected to realtime database");

        Ok((
            Self {
                outbound_tx,
                shutdown_tx: Some(shutdown_tx),
            },
            event_rx,
        ))
    }

    fn signal_shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Background task that owns the socket.
    async fn run(
        mut socket: Socket,
        mut outbound_rx: mpsc::Receiver<String>,
        event_tx: mpsc::Sender<TransportEvent>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    tracing::debug!("Socket task received shutdown signal");
                    if let Err(e) = socket.close(None).await {
                        tracing::trace!(error = %e, "Error while closing socket");
                    }
                    break;
                }
                Some(text) = outbound_rx.recv() => {
                    tracing::trace!(frame = %text, "Sending frame");
                    if let Err(e) = socket.send(Message::Text(text)).await {
                        tracing::error!(error = %e, "Failed to send frame");
                        let _ = event_tx.send(TransportEvent::Error(e.to_string())).await;
                        break;
                    }
                }
                inbound = socket.next() => {
                    let event = match inbound {
                        Some(Ok(Message::Text(text))) => TransportEvent::Frame(text),
                        Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                            Ok(text) => TransportEvent::Frame(text),
                            Err(_) => {
                                tracing::warn!("Dropping non UTF-8 binary frame");
                                continue;
                            }
                        },
                        Some(Ok(Message::Close(frame))) => {
                            tracing::debug!(?frame, "Realtime database closed the connection");
                            TransportEvent::Closed
                        }
                        // Pings are answered by tungstenite on the next read or write.
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            tracing::error!(error = %e, "Error reading from realtime database");
                            TransportEvent::Error(e.to_string())
                        }
                        None => TransportEvent::Closed,
                    };

                    let terminal = !matches!(event, TransportEvent::Frame(_));
                    if event_tx.send(event).await.is_err() {
                        tracing::debug!("Event receiver dropped, stopping socket task");
                        break;
                    }
                    if terminal {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Socket task terminated");
    }
}

#[async_trait]
impl FrameSink for RtdbConnection {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.outbound_tx
            .send(text)
            .await
            .map_err(|_| AppError::Upstream("Realtime database connection is closed".to_string()))
    }

    async fn close(&mut self) {
        self.signal_shutdown();
    }
}

impl Drop for RtdbConnection {
    fn drop(&mut self) {
        // Signal shutdown if not already done
        self.signal_shutdown();
    }
}
