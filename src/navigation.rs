//! Map links for getting to a shelter

use crate::models::GeoPoint;

/// Cross-platform web link that opens a maps search on the point
#[must_use]
pub fn maps_search_url(point: GeoPoint) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={},{}",
        point.latitude, point.longitude
    )
}

/// Apple Maps scheme link
#[must_use]
pub fn apple_maps_url(point: GeoPoint) -> String {
    format!("maps:0,0?q={},{}", point.latitude, point.longitude)
}

/// `geo:` URI understood by Android map apps, with a label
#[must_use]
pub fn geo_uri(point: GeoPoint, label: &str) -> String {
    format!(
        "geo:0,0?q={},{}({})",
        point.latitude,
        point.longitude,
        urlencoding::encode(label)
    )
}
