//! Inbound server messages.

use serde_json::{Map, Value};

use crate::DATA_FRAME;

/// Status carried by a successful reply.
pub const STATUS_OK: &str = "ok";

/// A parsed server message, reduced to the shapes we act on.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Reply to one of our requests: `{"t":"d","d":{"r":<id>,"b":{"s":<status>}}}`.
    ///
    /// For queries an `ok` reply means every data push for that query has
    /// already been delivered.
    Reply { request_id: u64, status: String },

    /// Data pushed for a path: `{"t":"d","d":{"b":{"p":<path>,"d":<payload>}}}`.
    Data {
        path: Option<String>,
        payload: Value,
    },

    /// Control frames, handshakes and anything else.
    Other,
}

impl ServerMessage {
    /// Classify a complete JSON message.
    pub fn classify(value: Value) -> Self {
        let Value::Object(mut envelope) = value else {
            return Self::Other;
        };

        if envelope.get("t").and_then(Value::as_str) != Some(DATA_FRAME) {
            return Self::Other;
        }

        let Some(Value::Object(mut body)) = envelope.remove("d") else {
            return Self::Other;
        };

        let request_id = body.get("r").and_then(Value::as_u64);
        let Some(Value::Object(mut inner)) = body.remove("b") else {
            return Self::Other;
        };

        if let Some(request_id) = request_id {
            if let Some(status) = inner.get("s").and_then(Value::as_str) {
                return Self::Reply {
                    request_id,
                    status: status.to_string(),
                };
            }
        }

        match inner.remove("d") {
            Some(Value::Null) | None => Self::Other,
            Some(payload) => Self::Data {
                path: take_string(&mut inner, "p"),
                payload,
            },
        }
    }

    /// Whether this is a successful reply to `request_id`.
    pub fn is_ok_reply_to(&self, id: u64) -> bool {
        matches!(
            self,
            Self::Reply { request_id, status } if *request_id == id && status == STATUS_OK
        )
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}
