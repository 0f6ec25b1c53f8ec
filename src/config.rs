//! Run configuration, assembled once at startup and passed down the
//! pipeline. Nothing reads configuration ad hoc after this point.

use std::env;
use std::path::PathBuf;

use tokio::time::Duration;

use crate::error::ImportError;

/// Which geographic scope the run covers. Exactly one form must be
/// supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionSelector {
    /// A named country (or any region the geocoder knows).
    Country(String),
    /// An explicit `min_lon,min_lat,max_lon,max_lat` string.
    Box(String),
}

impl RegionSelector {
    pub fn from_options(
        country: Option<String>,
        bbox: Option<String>,
    ) -> Result<Self, ImportError> {
        match (country, bbox) {
            (Some(country), None) => Ok(RegionSelector::Country(country)),
            (None, Some(bbox)) => Ok(RegionSelector::Box(bbox)),
            (Some(_), Some(_)) => Err(ImportError::Configuration(
                "specify either a country or a bounding box, not both".to_string(),
            )),
            (None, None) => Err(ImportError::Configuration(
                "a country or a bounding box is required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub region: RegionSelector,
    /// Maximum tile edge length in degrees.
    pub tile_size: f64,
    /// Maximum records per tile request.
    pub limit: u32,
    /// Days of closed notes to include.
    pub closed_days: i32,
    /// Minimum delay between upstream calls.
    pub rate_limit: Duration,
    /// Optional cap on the number of tiles processed.
    pub max_tiles: Option<usize>,
    pub keywords_file: Option<PathBuf>,
    pub user_agent: String,
    pub database_url: String,
    pub create_tables: bool,
    pub quiet: bool,
}

impl Config {
    /// Check the invariants that must hold before any network access.
    pub fn validate(&self) -> Result<(), ImportError> {
        if !(self.tile_size > 0.0) {
            return Err(ImportError::Configuration(format!(
                "tile size must be positive, got {}",
                self.tile_size
            )));
        }
        if self.limit == 0 {
            return Err(ImportError::Configuration(
                "per-tile limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// The database URL is taken from the environment, never from a flag.
pub fn database_url_from_env() -> Result<String, ImportError> {
    env::var("DATABASE_URL").map_err(|_| {
        ImportError::Configuration("DATABASE_URL environment variable is required".to_string())
    })
}
