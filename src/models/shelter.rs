//! Shelter directory entries, resources and user-submitted proposals

use serde::{Deserialize, Serialize};
use std::fmt;

use super::GeoPoint;
use crate::error::ShelterFinderError;

/// A disaster-relief shelter as listed by the shelter directory
///
/// On the wire the point is flattened: `{ latitude, longitude, name, place }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelter {
    #[serde(flatten)]
    pub point: GeoPoint,
    pub name: String,
    /// Places-API resource name, e.g. `places/ChIJ...`
    #[serde(rename = "place")]
    pub place_ref: String,
}

impl Shelter {
    #[must_use]
    pub fn new(point: GeoPoint, name: impl Into<String>, place_ref: impl Into<String>) -> Self {
        Self {
            point,
            name: name.into(),
            place_ref: place_ref.into(),
        }
    }
}

/// Resource counts reported for a verified shelter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelterResources {
    pub name: String,
    pub food: i64,
    pub beds: i64,
    pub water: i64,
    pub electricity: i64,
    pub first_aid: i64,
    #[serde(default)]
    pub place: Option<String>,
}

/// What a proposed shelter offers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amenities {
    pub number_of_beds: u32,
    pub food: bool,
    pub first_aid: bool,
    pub water: bool,
    pub electricity: bool,
}

/// A validated, user-proposed shelter ready to submit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelterProposal {
    pub name: String,
    pub location: GeoPoint,
    pub amenities: Amenities,
}

/// Unverified shelters are listed back in the same shape they were proposed in
pub type UnverifiedShelter = ShelterProposal;

/// Raw form input for a shelter proposal, before validation
#[derive(Debug, Clone, Default)]
pub struct ShelterProposalDraft {
    pub name: String,
    pub location: Option<GeoPoint>,
    /// Bed count as typed by the user
    pub beds: String,
    pub food: bool,
    pub water: bool,
    pub electricity: bool,
    pub first_aid: bool,
}

/// Per-field validation failures for a proposal draft
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalErrors {
    pub name: Option<String>,
    pub location: Option<String>,
    pub number_of_beds: Option<String>,
}

impl ProposalErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none() && self.number_of_beds.is_none()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        [&self.name, &self.location, &self.number_of_beds]
            .into_iter()
            .filter_map(|m| m.as_deref())
            .collect()
    }
}

impl fmt::Display for ProposalErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl std::error::Error for ProposalErrors {}

impl From<ProposalErrors> for ShelterFinderError {
    fn from(errors: ProposalErrors) -> Self {
        ShelterFinderError::validation(errors.to_string())
    }
}

impl ShelterProposalDraft {
    /// Check every field and report all failures at once
    pub fn validate(&self) -> Result<ShelterProposal, ProposalErrors> {
        let mut errors = ProposalErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.name = Some("Shelter Name is required".to_string());
        }

        if self.location.is_none() {
            errors.location = Some("Location must be selected on the map".to_string());
        }

        let beds = match self.beds.trim().parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => {
                errors.number_of_beds = Some("Enter a valid number of beds".to_string());
                0
            }
        };

        match self.location {
            Some(location) if errors.is_empty() => Ok(ShelterProposal {
                name: name.to_string(),
                location,
                amenities: Amenities {
                    number_of_beds: beds,
                    food: self.food,
                    first_aid: self.first_aid,
                    water: self.water,
                    electricity: self.electricity,
                },
            }),
            _ => Err(errors),
        }
    }
}
