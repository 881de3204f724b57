//! Places-API contact details for a shelter

use serde::{Deserialize, Serialize};

/// Details returned by the place-details endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub formatted_phone_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub photos: Vec<PlacePhoto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacePhoto {
    pub photo_reference: String,
}

impl PlaceDetails {
    /// Reference of the first photo, if the place has any
    #[must_use]
    pub fn first_photo_reference(&self) -> Option<&str> {
        self.photos.first().map(|p| p.photo_reference.as_str())
    }
}
