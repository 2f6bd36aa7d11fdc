//! Season queries and the paths they address.

use rtdb_protocol::{ProtocolError, QueryRequest};

/// Request for the episode subtree of one season.
///
/// The season number doubles as the request id, so the server's reply for
/// the query can be matched against the season we are waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonQuery {
    pub season: u32,
    pub path: String,
}

impl SeasonQuery {
    pub fn new(content_key: &str, season: u32) -> Self {
        Self {
            season,
            path: format!("Data/{}/seasons/{}/episodes", content_key, season),
        }
    }

    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        QueryRequest::new(self.season, self.path.as_str()).to_frame()
    }
}

/// Extract the season number from a `…/seasons/<n>/episodes` path.
///
/// Returns `None` when the path has no such segment triple. Callers fall
/// back to the season currently being queried.
pub fn season_from_path(path: &str) -> Option<u32> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    segments.windows(3).find_map(|window| match window {
        ["seasons", number, "episodes"] => number.parse().ok(),
        _ => None,
    })
}
