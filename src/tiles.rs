//! Tile grid construction: decomposes a bounding box into an ordered
//! sequence of fetch-sized sub-boxes.

use crate::error::ImportError;
use crate::region::BoundingBox;

/// One rectangular cell of the fetch grid. The id is a pure function of
/// the cell's grid coordinates, so re-running the same box and edge
/// length always lands notes in the same tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub id: i64,
    pub row: u32,
    pub col: u32,
    pub bbox: BoundingBox,
}

fn tile_id(row: u32, col: u32) -> i64 {
    ((row as i64) << 32) | col as i64
}

/// Split `bbox` into a row-major grid of tiles no wider or taller than
/// `edge_deg` degrees. Rows run bottom-to-top, columns left-to-right;
/// the last row and column are clamped to the box edge instead of
/// overshooting.
pub fn build_grid(bbox: &BoundingBox, edge_deg: f64) -> Result<Vec<Tile>, ImportError> {
    if !(edge_deg > 0.0) {
        return Err(ImportError::Configuration(format!(
            "tile size must be positive, got {}",
            edge_deg
        )));
    }

    let rows = (bbox.height() / edge_deg).ceil().max(1.0) as u32;
    let cols = (bbox.width() / edge_deg).ceil().max(1.0) as u32;

    let mut tiles = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        let min_lat = bbox.min_lat + row as f64 * edge_deg;
        let max_lat = (min_lat + edge_deg).min(bbox.max_lat);
        for col in 0..cols {
            let min_lon = bbox.min_lon + col as f64 * edge_deg;
            let max_lon = (min_lon + edge_deg).min(bbox.max_lon);
            tiles.push(Tile {
                id: tile_id(row, col),
                row,
                col,
                bbox: BoundingBox {
                    min_lon,
                    min_lat,
                    max_lon,
                    max_lat,
                },
            });
        }
    }
    Ok(tiles)
}
