//! Outbound frames.

use serde::Serialize;

use crate::ProtocolError;

/// Envelope tag for data frames.
pub const DATA_FRAME: &str = "d";

/// Action tag for a one-shot read of a path.
pub const QUERY_ACTION: &str = "q";

#[derive(Serialize)]
struct Envelope<'a, T> {
    t: &'static str,
    d: &'a T,
}

/// A read request for the subtree at `path`.
///
/// The request id is echoed back by the server in the reply that marks the
/// end of the data for this query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    #[serde(rename = "a")]
    action: &'static str,
    #[serde(rename = "r")]
    pub request_id: u32,
    #[serde(rename = "b")]
    pub body: QueryBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryBody {
    #[serde(rename = "p")]
    pub path: String,
    /// Cached-data hash. Always empty: we never hold a local copy.
    #[serde(rename = "h")]
    pub hash: String,
}

impl QueryRequest {
    pub fn new(request_id: u32, path: impl Into<String>) -> Self {
        Self {
            action: QUERY_ACTION,
            request_id,
            body: QueryBody {
                path: path.into(),
                hash: String::new(),
            },
        }
    }

    /// Encode as a data frame ready to send as WebSocket text.
    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        let envelope = Envelope {
            t: DATA_FRAME,
            d: self,
        };
        Ok(serde_json::to_string(&envelope)?)
    }
}
