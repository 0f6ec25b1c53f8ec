//! Error taxonomy for the import pipeline.
//!
//! Fatal errors (configuration, region resolution, initial store
//! connection) abort the run; everything else is recoverable at tile or
//! note granularity and surfaces as a counter in the final summary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// Bad or conflicting run configuration. Raised before any network
    /// access.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The geocoder produced no usable bounding box for the region.
    #[error("no bounding box found for region '{0}'")]
    RegionNotFound(String),

    /// An explicit bounding box string that does not parse or is
    /// degenerate.
    #[error("invalid bounding box '{input}': {reason}")]
    InvalidBoundingBox { input: String, reason: String },

    /// A tile whose notes could not be fetched after all retries. The
    /// tile is skipped and the run continues.
    #[error("failed to fetch notes for tile {tile}")]
    TileFetch {
        tile: i64,
        #[source]
        source: anyhow::Error,
    },

    /// A note record missing a required field. The record is skipped and
    /// the run continues.
    #[error("malformed note record: {0}")]
    MalformedNote(String),

    /// A storage failure. Fatal when connecting, recoverable per upsert.
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}
