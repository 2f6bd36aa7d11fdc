//! Wire protocol for the realtime database WebSocket endpoint.
//!
//! The protocol exchanges JSON text frames wrapped in a `{"t": .., "d": ..}`
//! envelope. This crate only deals with the frames themselves: building
//! query requests, classifying server messages and stitching together
//! messages that arrive split over several transport frames. Connection
//! handling lives with the caller.

pub mod frame;
pub mod message;
pub mod reassembly;

pub use frame::{QueryBody, QueryRequest, DATA_FRAME, QUERY_ACTION};
pub use message::ServerMessage;
pub use reassembly::{is_keepalive, Reassembly, ReassemblyBuffer, DEFAULT_MAX_CHARS};

use thiserror::Error;

/// Protocol version spoken by this crate.
pub const PROTOCOL_VERSION: u32 = 5;

/// Errors raised while encoding frames.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Build the WebSocket endpoint URL for a database namespace.
///
/// `base` is the `.ws` endpoint without a query string, e.g.
/// `wss://example-default-rtdb.firebasedatabase.app/.ws`.
pub fn endpoint_url(base: &str, namespace: &str, version: u32) -> String {
    format!(
        "{}?ns={}&v={}",
        base.trim_end_matches('?'),
        urlencoding::encode(namespace),
        version
    )
}
