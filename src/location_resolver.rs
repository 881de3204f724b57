//! Location Resolution Module
//!
//! Turns user input into a [`GeoPoint`] and defines the seam through which
//! the device location reaches the shelter finder.

use async_trait::async_trait;
use tracing::debug;

use crate::error::ShelterFinderError;
use crate::models::GeoPoint;

/// Source of the user's current location
///
/// `Ok(None)` means the location is unavailable (no fix, permission denied).
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self) -> crate::Result<Option<GeoPoint>>;
}

/// Provider that always answers with a preconfigured point
#[derive(Debug, Clone, Default)]
pub struct FixedLocationProvider {
    point: Option<GeoPoint>,
}

impl FixedLocationProvider {
    #[must_use]
    pub fn new(point: Option<GeoPoint>) -> Self {
        Self { point }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_location(&self) -> crate::Result<Option<GeoPoint>> {
        debug!("Fixed location provider answering with {:?}", self.point);
        Ok(self.point)
    }
}

/// Coordinate parsing utilities
pub struct LocationParser;

impl LocationParser {
    /// Parse coordinates from strings like "33.7756,-84.3963" or "33.7756 -84.3963"
    pub fn parse(input: &str) -> crate::Result<GeoPoint> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ShelterFinderError::validation("Location cannot be empty"));
        }

        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return Err(ShelterFinderError::validation(format!(
                "Coordinates must be in format 'lat,lon', got: {input}"
            )));
        }

        let lat = parts[0].parse::<f64>().map_err(|_| {
            ShelterFinderError::validation(format!("Invalid latitude: {}", parts[0]))
        })?;
        let lon = parts[1].parse::<f64>().map_err(|_| {
            ShelterFinderError::validation(format!("Invalid longitude: {}", parts[1]))
        })?;

        let point = GeoPoint::try_new(lat, lon)?;
        debug!("Parsed location input '{}' as {:?}", input, point);
        Ok(point)
    }
}
