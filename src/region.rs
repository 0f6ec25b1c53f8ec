//! Region resolution: turns a country name or an explicit bounding box
//! string into a canonical [`BoundingBox`].

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ImportError;
use crate::TARGET_WEB_REQUEST;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// A geographic bounding box in decimal degrees.
///
/// Invariant: `min_lon < max_lon` and `min_lat < max_lat`. Constructed
/// once and never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> Result<Self, ImportError> {
        if !(min_lon < max_lon && min_lat < max_lat) {
            return Err(ImportError::InvalidBoundingBox {
                input: format!("{},{},{},{}", min_lon, min_lat, max_lon, max_lat),
                reason: "degenerate bounds (min must be strictly less than max)".to_string(),
            });
        }
        Ok(BoundingBox {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Parse a `min_lon,min_lat,max_lon,max_lat` string.
    pub fn parse(input: &str) -> Result<Self, ImportError> {
        let parts: Vec<&str> = input.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(ImportError::InvalidBoundingBox {
                input: input.to_string(),
                reason: format!("expected 4 comma-separated values, got {}", parts.len()),
            });
        }
        let mut bounds = [0f64; 4];
        for (i, part) in parts.iter().enumerate() {
            bounds[i] = part.parse().map_err(|_| ImportError::InvalidBoundingBox {
                input: input.to_string(),
                reason: format!("'{}' is not a valid number", part),
            })?;
        }
        BoundingBox::new(bounds[0], bounds[1], bounds[2], bounds[3])
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Render in the `min_lon,min_lat,max_lon,max_lat` form the notes API
    /// expects.
    pub fn to_query_string(&self) -> String {
        format!(
            "{:.6},{:.6},{:.6},{:.6}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// One candidate from the Nominatim search endpoint. The `boundingbox`
/// array is ordered `[min_lat, max_lat, min_lon, max_lon]`, as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    boundingbox: Vec<String>,
}

/// Resolve a country (or any named region) to a bounding box via the
/// Nominatim geocoder. The first candidate is authoritative; zero
/// candidates is a fatal [`ImportError::RegionNotFound`].
pub async fn resolve_country(
    client: &reqwest::Client,
    name: &str,
) -> Result<BoundingBox, ImportError> {
    debug!(target: TARGET_WEB_REQUEST, "Looking up bounding box for region: {}", name);

    let places: Vec<NominatimPlace> = client
        .get(NOMINATIM_URL)
        .query(&[("q", name), ("format", "json"), ("limit", "1")])
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(|err| {
            debug!(target: TARGET_WEB_REQUEST, "Geocoder request failed: {}", err);
            ImportError::RegionNotFound(name.to_string())
        })?
        .json()
        .await
        .map_err(|_| ImportError::RegionNotFound(name.to_string()))?;

    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| ImportError::RegionNotFound(name.to_string()))?;

    let bbox = place_bbox(&place).ok_or_else(|| ImportError::RegionNotFound(name.to_string()))?;

    info!(
        target: TARGET_WEB_REQUEST,
        "Resolved '{}' to {} ({})",
        name,
        bbox.to_query_string(),
        place.display_name
    );
    Ok(bbox)
}

fn place_bbox(place: &NominatimPlace) -> Option<BoundingBox> {
    if place.boundingbox.len() != 4 {
        return None;
    }
    let parse = |i: usize| place.boundingbox[i].parse::<f64>().ok();
    let (min_lat, max_lat) = (parse(0)?, parse(1)?);
    let (min_lon, max_lon) = (parse(2)?, parse(3)?);
    BoundingBox::new(min_lon, min_lat, max_lon, max_lat).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_bbox() {
        let bbox = BoundingBox::parse("-74.3,-4.8,-74.0,-4.4").unwrap();
        assert_eq!(bbox.min_lon, -74.3);
        assert_eq!(bbox.min_lat, -4.8);
        assert_eq!(bbox.max_lon, -74.0);
        assert_eq!(bbox.max_lat, -4.4);
    }

    #[test]
    fn parse_allows_whitespace() {
        let bbox = BoundingBox::parse(" -74.3, -4.8, -74.0, -4.4 ").unwrap();
        assert_eq!(bbox.width(), -74.0 - -74.3);
    }

    #[test]
    fn parse_rejects_wrong_arity() {
        assert!(matches!(
            BoundingBox::parse("1.0,2.0,3.0"),
            Err(ImportError::InvalidBoundingBox { .. })
        ));
    }

    #[test]
    fn parse_rejects_non_numeric() {
        assert!(matches!(
            BoundingBox::parse("a,b,c,d"),
            Err(ImportError::InvalidBoundingBox { .. })
        ));
    }

    #[test]
    fn parse_rejects_degenerate_bounds() {
        // min_lon == max_lon
        assert!(BoundingBox::parse("10.0,0.0,10.0,1.0").is_err());
        // min_lat > max_lat
        assert!(BoundingBox::parse("0.0,5.0,1.0,4.0").is_err());
    }

    #[test]
    fn nominatim_bbox_reorders_bounds() {
        let json = r#"[{
            "display_name": "Perú",
            "boundingbox": ["-20.1984472", "-0.0392818", "-84.6356535", "-68.6519906"]
        }]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(json).unwrap();
        let bbox = place_bbox(&places[0]).unwrap();
        assert_eq!(bbox.min_lon, -84.6356535);
        assert_eq!(bbox.min_lat, -20.1984472);
        assert_eq!(bbox.max_lon, -68.6519906);
        assert_eq!(bbox.max_lat, -0.0392818);
    }

    #[test]
    fn nominatim_empty_bbox_is_rejected() {
        let place = NominatimPlace {
            display_name: "nowhere".to_string(),
            boundingbox: vec![],
        };
        assert!(place_bbox(&place).is_none());
    }
}
