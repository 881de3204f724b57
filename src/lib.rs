//! `ShelterFinder` - disaster-relief shelter finder
//!
//! This library provides nearest-shelter search over great-circle distance,
//! clients for the shelter directory, places and news services, and the
//! service that ties them together for the `shelterfinder` CLI.

pub mod api;
pub mod config;
pub mod error;
pub mod finder;
pub mod geo;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod navigation;

// Re-export core types for public API
pub use api::{DirectoryClient, HttpClient, NewsClient, PlaceLookup, PlacesClient, ShelterDirectory};
pub use config::ShelterFinderConfig;
pub use error::{ErrorCode, ShelterFinderError};
pub use finder::{NearestShelter, ShelterFinder, ShelterOverview};
pub use geo::{DistanceResult, haversine_distance_km, nearest};
pub use location_resolver::{FixedLocationProvider, LocationParser, LocationProvider};
pub use models::{GeoPoint, NewsArticle, PlaceDetails, Shelter, ShelterProposal, ShelterProposalDraft};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, ShelterFinderError>;
