//! Episode data as delivered by the realtime database.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::lenient;

/// One episode's metadata. Every field is optional upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EpisodeRecord {
    pub name: Option<String>,
    pub overview: Option<String>,
    pub still_path: Option<String>,
    pub vote_average: Option<f64>,
    pub runtime: Option<f64>,
    /// Direct playable path, when the database has one.
    pub link: Option<String>,
}

impl EpisodeRecord {
    /// Decode an episode object. Fields of the wrong type are dropped;
    /// anything that is not an object yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| object.get(key).and_then(lenient::text);
        let number = |key: &str| object.get(key).and_then(lenient::number);

        Some(Self {
            name: text("name"),
            overview: text("overview"),
            still_path: text("still_path"),
            vote_average: number("vote_average"),
            runtime: number("runtime"),
            link: text("link"),
        })
    }
}

/// Episodes of one season keyed by zero-based index.
pub type SeasonMap = BTreeMap<u32, EpisodeRecord>;

/// Season number → episodes, as accumulated over one resolution session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregateResult {
    seasons: BTreeMap<u32, SeasonMap>,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge entries into a season. Existing indices are overwritten.
    pub fn merge(&mut self, season: u32, episodes: SeasonMap) {
        self.seasons.entry(season).or_default().extend(episodes);
    }

    /// Make sure `season` is present, even if nothing was received for it.
    pub fn ensure_season(&mut self, season: u32) {
        self.seasons.entry(season).or_default();
    }

    pub fn season(&self, season: u32) -> Option<&SeasonMap> {
        self.seasons.get(&season)
    }

    pub fn seasons(&self) -> impl Iterator<Item = (u32, &SeasonMap)> {
        self.seasons.iter().map(|(season, episodes)| (*season, episodes))
    }

    pub fn season_count(&self) -> usize {
        self.seasons.len()
    }

    /// Total number of episodes across all seasons.
    pub fn episode_count(&self) -> usize {
        self.seasons.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }
}

impl From<BTreeMap<u32, SeasonMap>> for AggregateResult {
    fn from(seasons: BTreeMap<u32, SeasonMap>) -> Self {
        Self { seasons }
    }
}

/// Decode a data payload into indexed episodes.
///
/// Objects are keyed by the episode index as a string; keys that are not
/// integers are skipped. Arrays (which the database produces for densely
/// indexed children) use the position as index and may contain nulls.
pub fn episodes_from_payload(payload: &Value) -> SeasonMap {
    let mut episodes = SeasonMap::new();

    match payload {
        Value::Object(entries) => {
            for (key, value) in entries {
                let Ok(index) = key.trim().parse::<u32>() else {
                    tracing::warn!(key = %key, "Skipping episode with non-numeric index");
                    continue;
                };
                match EpisodeRecord::from_value(value) {
                    Some(record) => {
                        episodes.insert(index, record);
                    }
                    None => tracing::warn!(index, "Skipping malformed episode entry"),
                }
            }
        }
        Value::Array(entries) => {
            for (index, value) in entries.iter().enumerate() {
                if value.is_null() {
                    continue;
                }
                let Ok(index) = u32::try_from(index) else {
                    break;
                };
                match EpisodeRecord::from_value(value) {
                    Some(record) => {
                        episodes.insert(index, record);
                    }
                    None => tracing::warn!(index, "Skipping malformed episode entry"),
                }
            }
        }
        other => {
            tracing::debug!(kind = ?other, "Ignoring non-collection episode payload");
        }
    }

    episodes
}
