//! Great-circle distance and nearest-shelter selection
//!
//! Everything here is pure and synchronous. Coordinates are not validated:
//! callers that accept user input go through [`GeoPoint::try_new`] or
//! [`crate::location_resolver::LocationParser`] first.

use serde::{Deserialize, Serialize};

use crate::models::{GeoPoint, Shelter};

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per mile, as used for display
pub const KM_PER_MILE: f64 = 1.609;

/// A derived distance, never persisted
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DistanceResult {
    pub kilometers: f64,
}

impl DistanceResult {
    #[must_use]
    pub fn miles(&self) -> f64 {
        km_to_miles(self.kilometers)
    }

    /// Format as "1.2 km (0.7 mi)"
    #[must_use]
    pub fn format(&self) -> String {
        format!("{:.1} km ({:.1} mi)", self.kilometers, self.miles())
    }
}

#[must_use]
pub fn km_to_miles(km: f64) -> f64 {
    km / KM_PER_MILE
}

/// Haversine distance in kilometers between two points
#[must_use]
pub fn haversine_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h just past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

#[must_use]
pub fn distance(a: GeoPoint, b: GeoPoint) -> DistanceResult {
    DistanceResult {
        kilometers: haversine_distance_km(a, b),
    }
}

/// The shelter closest to `origin`, or `None` when there are no candidates.
///
/// Ties keep the first shelter in iteration order.
#[must_use]
pub fn nearest(origin: GeoPoint, candidates: &[Shelter]) -> Option<&Shelter> {
    let mut best: Option<(&Shelter, f64)> = None;

    for shelter in candidates {
        let d = haversine_distance_km(origin, shelter.point);
        if best.is_none_or(|(_, min)| d < min) {
            best = Some((shelter, d));
        }
    }

    best.map(|(shelter, _)| shelter)
}

/// Every shelter paired with its distance, closest first
#[must_use]
pub fn rank_by_distance(origin: GeoPoint, shelters: &[Shelter]) -> Vec<(&Shelter, f64)> {
    let mut ranked: Vec<(&Shelter, f64)> = shelters
        .iter()
        .map(|s| (s, haversine_distance_km(origin, s.point)))
        .collect();

    // sort_by is stable, so equal distances keep input order
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}

/// Shelters within `radius_km` of `origin`, closest first
#[must_use]
pub fn within_radius(origin: GeoPoint, shelters: &[Shelter], radius_km: f64) -> Vec<(&Shelter, f64)> {
    rank_by_distance(origin, shelters)
        .into_iter()
        .filter(|(_, d)| *d <= radius_km)
        .collect()
}
