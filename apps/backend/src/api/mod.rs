//! API endpoint handlers for the catalog backend.

pub mod catalog;
pub mod content;
pub mod links;
pub mod system;
