//! Per-tile note fetching with retries and pacing.

use anyhow::{anyhow, Result};
use tokio::time::sleep;
use tracing::{debug, warn};

use super::client::RateLimiter;
use super::parser::parse_notes_page;
use super::types::{Note, API_MAX_LIMIT, MAX_RETRIES, RETRY_DELAY};
use crate::error::ImportError;
use crate::tiles::Tile;
use crate::TARGET_WEB_REQUEST;

const NOTES_URL: &str = "https://api.openstreetmap.org/api/0.6/notes";

/// One fetched page of records for a tile. The upstream API exposes no
/// page cursor, so a response with fewer records than the limit is the
/// last (and only) page; a full response means the tile was truncated
/// and should be re-fetched with a smaller edge length.
pub struct TilePage {
    pub notes: Vec<Result<Note, ImportError>>,
    pub truncated: bool,
}

/// Fetch every note record for one tile. Each attempt waits on the
/// process-wide rate limiter first; transient failures (transport
/// errors, non-2xx statuses, unparseable bodies) are retried up to
/// [`MAX_RETRIES`] times before the tile is given up as a
/// [`ImportError::TileFetch`].
pub async fn fetch_tile_notes(
    client: &reqwest::Client,
    limiter: &mut RateLimiter,
    tile: &Tile,
    limit: u32,
    closed_days: i32,
    country: Option<&str>,
) -> Result<TilePage, ImportError> {
    let limit = limit.min(API_MAX_LIMIT);
    let mut last_error = anyhow!("no fetch attempts made");

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            warn!(
                target: TARGET_WEB_REQUEST,
                "Retrying tile {} in {:?} (attempt {}/{})",
                tile.id,
                RETRY_DELAY,
                attempt + 1,
                MAX_RETRIES
            );
            sleep(RETRY_DELAY).await;
        }

        limiter.acquire().await;
        debug!(
            target: TARGET_WEB_REQUEST,
            "Fetching notes for tile {} ({})",
            tile.id,
            tile.bbox.to_query_string()
        );

        let body = match request_page(client, tile, limit, closed_days).await {
            Ok(body) => body,
            Err(err) => {
                warn!(target: TARGET_WEB_REQUEST, "Request for tile {} failed: {}", tile.id, err);
                last_error = err;
                continue;
            }
        };

        match parse_notes_page(&body, tile.id, country) {
            Ok(notes) => {
                let truncated = notes.len() >= limit as usize;
                if truncated {
                    warn!(
                        target: TARGET_WEB_REQUEST,
                        "Tile {} returned a full page ({} records); results were likely truncated, consider a smaller tile size",
                        tile.id,
                        notes.len()
                    );
                }
                return Ok(TilePage { notes, truncated });
            }
            Err(err) => {
                warn!(target: TARGET_WEB_REQUEST, "Response for tile {} did not parse: {}", tile.id, err);
                last_error = err;
            }
        }
    }

    Err(ImportError::TileFetch {
        tile: tile.id,
        source: last_error,
    })
}

async fn request_page(
    client: &reqwest::Client,
    tile: &Tile,
    limit: u32,
    closed_days: i32,
) -> Result<String> {
    let response = client
        .get(NOTES_URL)
        .query(&[
            ("bbox", tile.bbox.to_query_string()),
            ("limit", limit.to_string()),
            ("closed", closed_days.to_string()),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("unexpected status {} from notes API", status));
    }

    Ok(response.text().await?)
}
