//! Application services for the catalog API.

pub mod catalog;
pub mod config_cache;
pub mod episodes;

pub use catalog::{CatalogClient, CatalogItem, CatalogSource, StreamConfig};
pub use config_cache::ConfigCache;
pub use episodes::{AggregateResult, EpisodeRecord, EpisodeResolver};
