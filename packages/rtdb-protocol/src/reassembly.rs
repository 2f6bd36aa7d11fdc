//! Reassembly of messages split across transport frames.
//!
//! Large messages are delivered as several text frames, each of which is
//! only a fragment of the JSON document. Fragments are concatenated until
//! the buffer parses as a whole.

use serde_json::Value;

/// Maximum number of characters held while waiting for a message to complete.
pub const DEFAULT_MAX_CHARS: usize = 100_000;

/// Outcome of feeding one fragment to the buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Reassembly {
    /// The buffer formed a complete JSON document. The buffer is now empty.
    Complete(Value),
    /// More fragments are needed.
    Incomplete,
    /// The ceiling was exceeded without forming a document. The buffer has
    /// been discarded.
    Overflow,
}

/// Accumulates text fragments until they form a complete JSON document.
#[derive(Debug)]
pub struct ReassemblyBuffer {
    buffer: String,
    chars: usize,
    max_chars: usize,
}

impl Default for ReassemblyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReassemblyBuffer {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_CHARS)
    }

    pub fn with_limit(max_chars: usize) -> Self {
        Self {
            buffer: String::new(),
            chars: 0,
            max_chars,
        }
    }

    /// Append a fragment and try to parse everything buffered so far.
    pub fn push(&mut self, fragment: &str) -> Reassembly {
        self.buffer.push_str(fragment);
        self.chars += fragment.chars().count();

        match serde_json::from_str::<Value>(&self.buffer) {
            Ok(value) => {
                self.clear();
                Reassembly::Complete(value)
            }
            Err(e) => {
                if self.chars > self.max_chars {
                    tracing::warn!(
                        buffered = self.chars,
                        limit = self.max_chars,
                        "Message too large, discarding buffer"
                    );
                    self.clear();
                    return Reassembly::Overflow;
                }
                tracing::trace!(buffered = self.chars, error = %e, "Waiting for more fragments");
                Reassembly::Incomplete
            }
        }
    }

    /// Number of characters currently buffered.
    pub fn len(&self) -> usize {
        self.chars
    }

    pub fn is_empty(&self) -> bool {
        self.chars == 0
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.chars = 0;
    }
}

/// Whether a frame is a bare integer.
///
/// The server sends these ahead of multi-frame messages and as keep-alives.
/// They carry nothing we need and must not reach the reassembly buffer.
pub fn is_keepalive(frame: &str) -> bool {
    frame.trim().parse::<i64>().is_ok()
}
