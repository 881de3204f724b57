//! Shelter directory API client
//!
//! The directory is the backend that records user locations, lists known
//! shelters with their resources, and accepts user-proposed shelters.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::{HttpClient, decode, error_for_status, join_url, status_error};
use crate::ShelterFinderError;
use crate::config::DirectoryConfig;
use crate::models::{GeoPoint, Shelter, ShelterProposal, ShelterResources, UnverifiedShelter};

const SERVICE: &str = "Shelter directory";

/// The parts of the directory the shelter finder depends on
#[async_trait]
pub trait ShelterDirectory: Send + Sync {
    /// Record the user's latest location
    async fn report_location(&self, point: GeoPoint) -> crate::Result<()>;

    /// All shelters currently known to the directory
    async fn fetch_shelters(&self) -> crate::Result<Vec<Shelter>>;

    /// Resource counts for a shelter, `None` when the directory has none on record
    async fn shelter_resources(&self, name: &str) -> crate::Result<Option<ShelterResources>>;
}

/// Shelter list entry as sent by the directory; incomplete entries are dropped
#[derive(Debug, Deserialize)]
struct ShelterRecord {
    latitude: Option<f64>,
    longitude: Option<f64>,
    name: Option<String>,
    #[serde(default)]
    place: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShelterListResponse {
    #[serde(default)]
    coordinates: Vec<ShelterRecord>,
}

impl ShelterListResponse {
    fn into_shelters(self) -> Vec<Shelter> {
        let total = self.coordinates.len();
        let shelters: Vec<Shelter> = self
            .coordinates
            .into_iter()
            .filter_map(|record| match record {
                ShelterRecord {
                    latitude: Some(latitude),
                    longitude: Some(longitude),
                    name: Some(name),
                    place,
                } => Some(Shelter::new(
                    GeoPoint::new(latitude, longitude),
                    name,
                    place.unwrap_or_default(),
                )),
                incomplete => {
                    debug!("Skipping incomplete shelter record: {:?}", incomplete);
                    None
                }
            })
            .collect();

        if shelters.len() < total {
            warn!(
                "Dropped {} of {} shelter records with missing fields",
                total - shelters.len(),
                total
            );
        }
        shelters
    }
}

#[derive(Debug, Serialize)]
struct LocationUpdate {
    latitude: f64,
    longitude: f64,
}

/// Pull human-readable messages out of a validation error body
///
/// The directory answers `400` with either `{"field": ["msg", ...]}` or a flat
/// `{"error": "msg"}`; anything else is returned verbatim.
fn server_messages(body: &str) -> String {
    fn collect(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.push(s.clone()),
            Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
            Value::Object(map) => map.values().for_each(|v| collect(v, out)),
            _ => {}
        }
    }

    let mut messages = Vec::new();
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        collect(&value, &mut messages);
    }

    if messages.is_empty() {
        body.trim().to_string()
    } else {
        messages.join("; ")
    }
}

/// HTTP client for the shelter directory
pub struct DirectoryClient {
    http: HttpClient,
    base_url: String,
}

impl DirectoryClient {
    #[must_use]
    pub fn new(http: HttpClient, config: &DirectoryConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Submit a user-proposed shelter for verification
    #[instrument(skip(self, proposal), fields(name = %proposal.name))]
    pub async fn propose_shelter(&self, proposal: &ShelterProposal) -> crate::Result<ShelterProposal> {
        info!(
            "Proposing shelter '{}' at {}",
            proposal.name,
            proposal.location.format_coordinates()
        );

        let response = self
            .http
            .post_json(&self.endpoint("unverified-shelters/"), proposal)
            .await?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            let message = server_messages(&body);
            warn!("Shelter proposal rejected: {}", message);
            return Err(ShelterFinderError::validation(message));
        }

        let response = error_for_status(response, SERVICE).await?;
        // The echo only carries the name; location and amenities come back null
        let echo = response.text().await.unwrap_or_default();
        debug!("Directory accepted proposal: {}", echo);
        Ok(proposal.clone())
    }

    /// Shelters proposed by users that are still awaiting verification
    #[instrument(skip(self))]
    pub async fn unverified_shelters(&self) -> crate::Result<Vec<UnverifiedShelter>> {
        let response = self
            .http
            .get(&self.endpoint("api/unverified-shelters/"))
            .await?;
        let response = error_for_status(response, SERVICE).await?;
        let shelters: Vec<UnverifiedShelter> = decode(response, SERVICE).await?;
        info!("Found {} unverified shelters", shelters.len());
        Ok(shelters)
    }
}

#[async_trait]
impl ShelterDirectory for DirectoryClient {
    #[instrument(skip(self))]
    async fn report_location(&self, point: GeoPoint) -> crate::Result<()> {
        let update = LocationUpdate {
            latitude: point.latitude,
            longitude: point.longitude,
        };
        let response = self
            .http
            .post_json(&self.endpoint("update-location/"), &update)
            .await?;
        error_for_status(response, SERVICE).await?;
        debug!("Reported location {}", point.format_coordinates());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_shelters(&self) -> crate::Result<Vec<Shelter>> {
        let response = self.http.get(&self.endpoint("fetch-shelters/")).await?;
        let response = error_for_status(response, SERVICE).await?;
        let list: ShelterListResponse = decode(response, SERVICE).await?;
        let shelters = list.into_shelters();
        info!("Found {} shelters in the directory", shelters.len());
        Ok(shelters)
    }

    #[instrument(skip(self))]
    async fn shelter_resources(&self, name: &str) -> crate::Result<Option<ShelterResources>> {
        let url = format!(
            "{}?name={}",
            self.endpoint("shelter-resources/"),
            urlencoding::encode(name)
        );
        let response = self.http.get(&url).await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("No resources on record for '{}'", name);
                Ok(None)
            }
            status if status.is_success() => decode(response, SERVICE).await.map(Some),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(status_error(status, SERVICE, &body))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use crate::api::test_server;
    use crate::models::Amenities;

    #[test]
    fn test_shelter_list_decoding_skips_incomplete() {
        let body = r#"{
            "coordinates": [
                {"latitude": 33.75, "longitude": -84.39, "name": "Civic Center", "place": "places/abc"},
                {"latitude": 33.70, "longitude": null, "name": "Broken", "place": "places/def"},
                {"latitude": 33.80, "longitude": -84.41, "name": "Library"}
            ]
        }"#;
        let list: ShelterListResponse = serde_json::from_str(body).unwrap();
        let shelters = list.into_shelters();

        assert_eq!(shelters.len(), 2);
        assert_eq!(shelters[0].name, "Civic Center");
        assert_eq!(shelters[0].place_ref, "places/abc");
        assert_eq!(shelters[1].name, "Library");
        assert_eq!(shelters[1].place_ref, "");
    }

    #[test]
    fn test_empty_shelter_list() {
        let list: ShelterListResponse = serde_json::from_str("{}").unwrap();
        assert!(list.into_shelters().is_empty());
    }

    #[test]
    fn test_location_update_body() {
        let update = LocationUpdate {
            latitude: 33.7756,
            longitude: -84.3963,
        };
        assert_eq!(
            serde_json::to_string(&update).unwrap(),
            r#"{"latitude":33.7756,"longitude":-84.3963}"#
        );
    }

    #[test]
    fn test_server_messages_from_field_errors() {
        let body = r#"{"non_field_errors": ["A shelter with this location already exists."]}"#;
        assert_eq!(
            server_messages(body),
            "A shelter with this location already exists."
        );
    }

    #[test]
    fn test_server_messages_plain_text() {
        assert_eq!(server_messages(" Bad Request \n"), "Bad Request");
    }

    fn client_for(base_url: &str) -> DirectoryClient {
        DirectoryClient::new(
            HttpClient::new(5, 0).unwrap(),
            &DirectoryConfig {
                base_url: base_url.to_string(),
                timeout_seconds: 5,
                max_retries: 0,
            },
        )
    }

    fn grady_gym() -> ShelterProposal {
        ShelterProposal {
            name: "Grady Gym".to_string(),
            location: GeoPoint::new(33.7512, -84.3822),
            amenities: Amenities {
                number_of_beds: 40,
                food: true,
                first_aid: true,
                water: true,
                electricity: false,
            },
        }
    }

    #[tokio::test]
    async fn test_fetch_shelters_over_http() {
        let server = test_server::serve(vec![(
            200,
            r#"{"coordinates": [{"latitude": 33.75, "longitude": -84.39, "name": "Civic Center", "place": "places/abc"}]}"#,
        )])
        .await;

        let shelters = client_for(&server.base_url).fetch_shelters().await.unwrap();
        assert_eq!(shelters.len(), 1);
        assert_eq!(shelters[0].name, "Civic Center");

        let requests = server.requests();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/api/fetch-shelters/");
    }

    #[tokio::test]
    async fn test_fetch_shelters_server_error() {
        let server = test_server::serve(vec![(500, "oops")]).await;
        let err = client_for(&server.base_url).fetch_shelters().await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ApiNetworkError));
    }

    #[tokio::test]
    async fn test_report_location_posts_coordinates() {
        let server =
            test_server::serve(vec![(200, r#"{"latitude": 33.7756, "longitude": -84.3963}"#)]).await;

        client_for(&server.base_url)
            .report_location(GeoPoint::new(33.7756, -84.3963))
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/api/update-location/");
        assert_eq!(requests[0].body, r#"{"latitude":33.7756,"longitude":-84.3963}"#);
    }

    #[tokio::test]
    async fn test_report_location_rejected() {
        let server = test_server::serve(vec![(403, r#"{"detail": "forbidden"}"#)]).await;
        let err = client_for(&server.base_url)
            .report_location(GeoPoint::new(0.0, 0.0))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ApiUnauthorized));
    }

    #[tokio::test]
    async fn test_shelter_resources_found() {
        let server = test_server::serve(vec![(
            200,
            r#"{"name": "Civic Center", "food": 40, "beds": 12, "water": 80, "electricity": 1, "first_aid": 3, "place": "places/abc"}"#,
        )])
        .await;

        let resources = client_for(&server.base_url)
            .shelter_resources("Civic Center")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resources.beds, 12);
        assert_eq!(
            server.requests()[0].path,
            "/api/shelter-resources/?name=Civic%20Center"
        );
    }

    #[tokio::test]
    async fn test_shelter_resources_not_on_record() {
        let server = test_server::serve(vec![(404, r#"{"error": "Shelter not found"}"#)]).await;
        let resources = client_for(&server.base_url)
            .shelter_resources("Nowhere")
            .await
            .unwrap();
        assert!(resources.is_none());
    }

    #[tokio::test]
    async fn test_shelter_resources_server_error() {
        let server = test_server::serve(vec![(502, "bad gateway")]).await;
        let err = client_for(&server.base_url)
            .shelter_resources("Civic Center")
            .await
            .unwrap_err();
        match err {
            ShelterFinderError::Api { code, context, .. } => {
                assert_eq!(code, ErrorCode::ApiNetworkError);
                assert_eq!(context["status_code"], "502");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_propose_shelter_accepts_name_only_echo() {
        let server = test_server::serve(vec![(
            201,
            r#"{"name": "Grady Gym", "location": {"latitude": null, "longitude": null}, "amenities": {"numberOfBeds": null, "food": null, "firstAid": null, "water": null, "electricity": null}}"#,
        )])
        .await;

        let proposal = grady_gym();
        let created = client_for(&server.base_url)
            .propose_shelter(&proposal)
            .await
            .unwrap();
        assert_eq!(created, proposal);

        let requests = server.requests();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/api/unverified-shelters/");
        let sent: ShelterProposal = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(sent, proposal);
    }

    #[tokio::test]
    async fn test_propose_shelter_duplicate_is_validation_error() {
        let server = test_server::serve(vec![(
            400,
            r#"{"non_field_errors": ["A shelter with this location already exists."]}"#,
        )])
        .await;

        let err = client_for(&server.base_url)
            .propose_shelter(&grady_gym())
            .await
            .unwrap_err();
        match err {
            ShelterFinderError::Validation { message } => {
                assert_eq!(message, "A shelter with this location already exists.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unverified_shelters_over_http() {
        let server = test_server::serve(vec![(
            200,
            r#"[{"name": "Grady Gym", "location": {"latitude": 33.7512, "longitude": -84.3822}, "amenities": {"numberOfBeds": 40, "food": true, "firstAid": true, "water": true, "electricity": false}}]"#,
        )])
        .await;

        let shelters = client_for(&server.base_url).unverified_shelters().await.unwrap();
        assert_eq!(shelters, vec![grady_gym()]);
        assert_eq!(server.requests()[0].path, "/api/api/unverified-shelters/");
    }

    #[test]
    fn test_endpoint_paths() {
        let http = HttpClient::new(5, 0).unwrap();
        let client = DirectoryClient::new(
            http,
            &DirectoryConfig {
                base_url: "https://shelters.example/api/".to_string(),
                timeout_seconds: 5,
                max_retries: 0,
            },
        );
        assert_eq!(
            client.endpoint("fetch-shelters/"),
            "https://shelters.example/api/fetch-shelters/"
        );
        assert_eq!(
            client.endpoint("api/unverified-shelters/"),
            "https://shelters.example/api/api/unverified-shelters/"
        );
    }
}
