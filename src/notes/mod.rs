//! OSM notes retrieval module.
//!
//! Handles the HTTP client, per-tile paged fetching with rate limiting,
//! and parsing of the notes XML into structured records.

mod client;
mod fetcher;
mod parser;
mod types;

pub use self::client::{build_http_client, RateLimiter};
pub use self::fetcher::{fetch_tile_notes, TilePage};
pub use self::parser::parse_notes_page;
pub use self::types::*;
