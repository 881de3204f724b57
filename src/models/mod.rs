//! Data models for the ShelterFinder application
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates
//! - Shelter: Directory entries, resources and user proposals
//! - Place: Places-API contact details
//! - News: Articles from the news-search API

pub mod location;
pub mod news;
pub mod place;
pub mod shelter;

// Re-export all public types for convenient access
pub use location::GeoPoint;
pub use news::NewsArticle;
pub use place::{PlaceDetails, PlacePhoto};
pub use shelter::{
    Amenities, ProposalErrors, Shelter, ShelterProposal, ShelterProposalDraft, ShelterResources,
    UnverifiedShelter,
};
