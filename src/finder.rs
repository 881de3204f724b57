//! Shelter finder service
//!
//! Wires a [`LocationProvider`], a [`ShelterDirectory`] and, optionally, a
//! [`PlaceLookup`] to the distance engine. "Location unavailable" is an error
//! here, at the caller level; the engine itself only ever sees a point.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::api::{PlaceLookup, ShelterDirectory};
use crate::geo::{self, DistanceResult};
use crate::location_resolver::LocationProvider;
use crate::models::{GeoPoint, PlaceDetails, Shelter, ShelterResources};
use crate::navigation;
use crate::ShelterFinderError;

/// A shelter with its distance from the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestShelter {
    pub shelter: Shelter,
    pub distance: DistanceResult,
}

/// Everything known about one shelter
#[derive(Debug, Clone, Serialize)]
pub struct ShelterOverview {
    pub shelter: Shelter,
    /// `None` when the user's location is unavailable
    pub distance: Option<DistanceResult>,
    pub resources: Option<ShelterResources>,
    pub place: Option<PlaceDetails>,
    pub photo_url: Option<String>,
    pub maps_url: String,
    pub apple_maps_url: String,
    /// `geo:` URI for Android map apps
    pub geo_uri: String,
}

pub struct ShelterFinder {
    location: Arc<dyn LocationProvider>,
    directory: Arc<dyn ShelterDirectory>,
    places: Option<Arc<dyn PlaceLookup>>,
}

impl ShelterFinder {
    pub fn new(location: Arc<dyn LocationProvider>, directory: Arc<dyn ShelterDirectory>) -> Self {
        Self {
            location,
            directory,
            places: None,
        }
    }

    /// Enable place-detail lookups for shelter overviews
    #[must_use]
    pub fn with_places(mut self, places: Arc<dyn PlaceLookup>) -> Self {
        self.places = Some(places);
        self
    }

    /// The user's location, or [`ShelterFinderError::LocationUnavailable`]
    pub async fn current_location(&self) -> crate::Result<GeoPoint> {
        self.location
            .current_location()
            .await?
            .ok_or(ShelterFinderError::LocationUnavailable)
    }

    /// Report the user's location, then pick the closest shelter.
    ///
    /// `Ok(None)` means the directory has no shelters.
    #[instrument(skip(self))]
    pub async fn find_nearest(&self) -> crate::Result<Option<NearestShelter>> {
        let origin = self.current_location().await?;

        // The location report is best effort
        if let Err(e) = self.directory.report_location(origin).await {
            warn!("Failed to report location: {}", e);
        }

        let shelters = self.directory.fetch_shelters().await?;
        let nearest = geo::nearest(origin, &shelters).map(|shelter| NearestShelter {
            shelter: shelter.clone(),
            distance: geo::distance(origin, shelter.point),
        });

        match &nearest {
            Some(found) => info!(
                "Nearest shelter is '{}' at {}",
                found.shelter.name,
                found.distance.format()
            ),
            None => info!("No shelters found"),
        }

        Ok(nearest)
    }

    /// Shelters within `radius_km` of the user, closest first, at most `limit`
    #[instrument(skip(self))]
    pub async fn nearby(&self, radius_km: f64, limit: usize) -> crate::Result<Vec<NearestShelter>> {
        let origin = self.current_location().await?;
        let shelters = self.directory.fetch_shelters().await?;

        let nearby: Vec<NearestShelter> = geo::within_radius(origin, &shelters, radius_km)
            .into_iter()
            .take(limit)
            .map(|(shelter, kilometers)| NearestShelter {
                shelter: shelter.clone(),
                distance: DistanceResult { kilometers },
            })
            .collect();

        info!(
            "{} of {} shelters within {} km",
            nearby.len(),
            shelters.len(),
            radius_km
        );
        Ok(nearby)
    }

    /// Distance, resources, contact details and a maps link for a named shelter
    #[instrument(skip(self))]
    pub async fn shelter_overview(&self, name: &str) -> crate::Result<ShelterOverview> {
        let shelters = self.directory.fetch_shelters().await?;
        let shelter = shelters
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| {
                ShelterFinderError::validation(format!("No shelter named '{name}' in the directory"))
            })?;

        let distance = match self.location.current_location().await {
            Ok(Some(origin)) => Some(geo::distance(origin, shelter.point)),
            Ok(None) => None,
            Err(e) => {
                warn!("Location lookup failed: {}", e);
                None
            }
        };

        let resources = match self.directory.shelter_resources(&shelter.name).await {
            Ok(resources) => resources,
            Err(e) => {
                warn!("Failed to fetch resources for '{}': {}", shelter.name, e);
                None
            }
        };

        let (place, photo_url) = match &self.places {
            Some(places) => match places.place_details(&shelter.place_ref).await {
                Ok(place) => {
                    let photo_url = place
                        .as_ref()
                        .and_then(PlaceDetails::first_photo_reference)
                        .map(|reference| places.photo_url(reference));
                    (place, photo_url)
                }
                Err(e) => {
                    warn!("Error fetching place details: {}", e);
                    (None, None)
                }
            },
            None => (None, None),
        };

        Ok(ShelterOverview {
            maps_url: navigation::maps_search_url(shelter.point),
            apple_maps_url: navigation::apple_maps_url(shelter.point),
            geo_uri: navigation::geo_uri(shelter.point, &shelter.name),
            shelter,
            distance,
            resources,
            place,
            photo_url,
        })
    }
}
