//! External collaborators of the discovery engine.
//!
//! This module provides the traits the engine talks to (listing backend,
//! geocoding service, device location) and their HTTP implementations.
//! All async methods return [`BoxFuture`] so the services can be shared as
//! `Arc<dyn Trait>` between the controller and its spawned tasks.
//!
//! ```ignore
//! use mapfolio::provider::{GooglePlacesService, HttpListingService, ReqwestClient, StaticToken};
//!
//! let listings = HttpListingService::new(
//!     ReqwestClient::new()?,
//!     StaticToken(Some(token)),
//!     "https://api.example.com",
//!     "/api/map/listings",
//! );
//! let places = GooglePlacesService::new(ReqwestClient::new()?, api_key).with_country("pk");
//! ```

mod cached;
mod google;
mod http;
mod listing;
mod location;
mod places;

use std::future::Future;
use std::pin::Pin;

pub use cached::{CachedPlaces, DEFAULT_REVERSE_CACHE_ENTRIES};
pub use google::{GooglePlacesService, DEFAULT_BASE_URL as GOOGLE_BASE_URL};
pub use http::{AsyncHttpClient, HttpRequest, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use listing::{HttpListingService, ListingQuery, ListingService, StaticToken, TokenProvider};
pub use location::{FixedLocation, LocationProvider};
pub use places::{PlaceDetails, PlaceName, PlaceSuggestion, PlacesService, SessionToken};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[cfg(test)]
pub use http::tests::MockHttpClient;
#[cfg(test)]
pub use listing::tests::MockListingService;
#[cfg(test)]
pub use places::tests::{suggestion, MockPlacesService};
