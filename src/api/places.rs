//! Places details API client
//!
//! Looks up contact details (address, phone, website, photo) for the place
//! reference stored with each shelter.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::{HttpClient, decode, error_for_status, join_url};
use crate::config::PlacesConfig;
use crate::models::PlaceDetails;
use crate::{ErrorCode, ShelterFinderError};

const SERVICE: &str = "Places API";
const DETAIL_FIELDS: &str = "name,formatted_address,formatted_phone_number,website,photos";
const PHOTO_MAX_WIDTH: u32 = 400;

/// Place lookups used when assembling a shelter overview
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    async fn place_details(&self, place_ref: &str) -> crate::Result<Option<PlaceDetails>>;

    fn photo_url(&self, photo_reference: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    result: Option<PlaceDetails>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

impl DetailsResponse {
    fn into_details(self) -> crate::Result<Option<PlaceDetails>> {
        let status = self.status.unwrap_or_else(|| "OK".to_string());
        let message = self.error_message.unwrap_or_else(|| status.clone());

        let code = match status.as_str() {
            "REQUEST_DENIED" => Some(ErrorCode::ApiUnauthorized),
            "OVER_QUERY_LIMIT" => Some(ErrorCode::ApiRateLimit),
            "UNKNOWN_ERROR" => Some(ErrorCode::ApiNetworkError),
            _ => None,
        };
        if let Some(code) = code {
            return Err(ShelterFinderError::api_with_context(
                format!("{SERVICE} error: {message}"),
                code,
                HashMap::from([("status".to_string(), status)]),
            ));
        }

        if self.result.is_none() {
            info!("Place details not found ({})", status);
        }
        Ok(self.result)
    }
}

/// Strip the `places/` resource prefix to get the bare place id
#[must_use]
pub fn place_id(place_ref: &str) -> &str {
    place_ref.strip_prefix("places/").unwrap_or(place_ref)
}

/// HTTP client for the places details API
pub struct PlacesClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl PlacesClient {
    /// Create a client; fails when no API key is configured
    pub fn new(http: HttpClient, config: &PlacesConfig) -> crate::Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ShelterFinderError::config(
                "Places API key is required. Set places.api_key or SHELTERFINDER_PLACES__API_KEY.",
            )
        })?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key,
        })
    }

    fn details_url(&self, place_ref: &str) -> String {
        format!(
            "{}?place_id={}&fields={}&key={}",
            join_url(&self.base_url, "details/json"),
            urlencoding::encode(place_id(place_ref)),
            DETAIL_FIELDS,
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl PlaceLookup for PlacesClient {
    #[instrument(skip(self))]
    async fn place_details(&self, place_ref: &str) -> crate::Result<Option<PlaceDetails>> {
        if place_id(place_ref).is_empty() {
            warn!("Shelter has no place reference, skipping details lookup");
            return Ok(None);
        }

        let response = self.http.get(&self.details_url(place_ref)).await?;
        let response = error_for_status(response, SERVICE).await?;
        let details: DetailsResponse = decode(response, SERVICE).await?;
        details.into_details()
    }

    fn photo_url(&self, photo_reference: &str) -> String {
        format!(
            "{}?maxwidth={}&photoreference={}&key={}",
            join_url(&self.base_url, "photo"),
            PHOTO_MAX_WIDTH,
            urlencoding::encode(photo_reference),
            urlencoding::encode(&self.api_key)
        )
    }
}
