//! Google Places / Geocoding implementation of [`PlacesService`].
//!
//! Uses the Google Maps Platform web services with an API key.
//!
//! # API Endpoints
//!
//! - Autocomplete: `{base}/place/autocomplete/json?input=..&components=country:..`
//!   plus `&types=..&key=..&sessiontoken=..`
//! - Place details: `{base}/place/details/json?place_id=..&fields=..&key=..&sessiontoken=..`
//! - Reverse geocode: `{base}/geocode/json?latlng={lat},{lon}&key=..`
//!
//! Every response carries a `status` string next to the payload. HTTP 200 with
//! a non-`OK` status is still a failure and is mapped onto [`DiscoveryError`].

use serde::Deserialize;
use tracing::{debug, warn};

use super::http::{AsyncHttpClient, HttpRequest};
use super::places::{PlaceDetails, PlaceName, PlaceSuggestion, PlacesService, SessionToken};
use super::BoxFuture;
use crate::error::{DiscoveryError, DiscoveryResult, FetchError};
use crate::geo::LatLon;

/// Default Google Maps web service root.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Fields requested from place details.
const DETAIL_FIELDS: &str = "geometry,formatted_address,address_components,name";

/// Google Places provider.
///
/// Requires a valid Google Maps Platform API key with the Places and
/// Geocoding APIs enabled.
pub struct GooglePlacesService<C: AsyncHttpClient> {
    http_client: C,
    api_key: String,
    base_url: String,
    country: Option<String>,
    place_types: Option<String>,
}

impl<C: AsyncHttpClient> GooglePlacesService<C> {
    /// # Arguments
    ///
    /// * `http_client` - HTTP client for making requests
    /// * `api_key` - Google Maps Platform API key
    pub fn new(http_client: C, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            country: None,
            place_types: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Restrict predictions to one ISO 3166-1 country code.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into()).filter(|c| !c.is_empty());
        self
    }

    /// Restrict predictions to a place type collection, e.g. `(cities)`.
    pub fn with_place_types(mut self, types: impl Into<String>) -> Self {
        self.place_types = Some(types.into()).filter(|t| !t.is_empty());
        self
    }

    fn ensure_key(&self) -> DiscoveryResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(DiscoveryError::Server(
                "geocoding API key is not configured".to_string(),
            ));
        }
        Ok(())
    }

    fn autocomplete_request(&self, input: &str, session: &SessionToken) -> HttpRequest {
        let mut request = HttpRequest::get(format!("{}/place/autocomplete/json", self.base_url))
            .query("input", input);
        if let Some(country) = &self.country {
            request = request.query("components", format!("country:{}", country));
        }
        if let Some(types) = &self.place_types {
            request = request.query("types", types.clone());
        }
        request
            .query("key", self.api_key.clone())
            .query("sessiontoken", session.as_str())
    }

    fn details_request(&self, place_id: &str, session: &SessionToken) -> HttpRequest {
        HttpRequest::get(format!("{}/place/details/json", self.base_url))
            .query("place_id", place_id)
            .query("fields", DETAIL_FIELDS)
            .query("key", self.api_key.clone())
            .query("sessiontoken", session.as_str())
    }

    fn reverse_request(&self, point: LatLon) -> HttpRequest {
        HttpRequest::get(format!("{}/geocode/json", self.base_url))
            .query("latlng", format!("{},{}", point.lat, point.lon))
            .query("key", self.api_key.clone())
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: HttpRequest,
    ) -> DiscoveryResult<T> {
        let body = self.http_client.get(request).await?;
        serde_json::from_slice(&body)
            .map_err(|e| DiscoveryError::from(FetchError::Decode(e.to_string())))
    }
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    place_id: String,
    description: String,
    #[serde(default)]
    structured_formatting: Option<StructuredFormatting>,
}

#[derive(Debug, Deserialize)]
struct StructuredFormatting {
    main_text: String,
    #[serde(default)]
    secondary_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    result: Option<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    geometry: Option<Geometry>,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl PlaceResult {
    fn component(&self, kind: &str) -> Option<&str> {
        self.address_components
            .iter()
            .find(|c| c.types.iter().any(|t| t == kind))
            .map(|c| c.long_name.as_str())
    }

    fn city(&self) -> Option<String> {
        self.component("locality")
            .or_else(|| self.component("administrative_area_level_2"))
            .map(str::to_string)
    }
}

/// Map a non-`OK` service status onto the error taxonomy.
fn status_error(status: &str, message: Option<String>) -> DiscoveryError {
    let detail = match message {
        Some(m) => format!("{}: {}", status, m),
        None => status.to_string(),
    };
    match status {
        "ZERO_RESULTS" | "NOT_FOUND" | "INVALID_REQUEST" => DiscoveryError::NotFound(detail),
        _ => DiscoveryError::Server(detail),
    }
}

impl<C: AsyncHttpClient> PlacesService for GooglePlacesService<C> {
    fn autocomplete(
        &self,
        input: &str,
        session: &SessionToken,
    ) -> BoxFuture<'_, DiscoveryResult<Vec<PlaceSuggestion>>> {
        let request = self.autocomplete_request(input, session);
        Box::pin(async move {
            self.ensure_key()?;
            let response: AutocompleteResponse = self.get_json(request).await?;
            match response.status.as_str() {
                "OK" => {}
                "ZERO_RESULTS" => return Ok(Vec::new()),
                other => {
                    warn!(status = other, "Autocomplete rejected");
                    return Err(status_error(other, response.error_message));
                }
            }

            let suggestions: Vec<PlaceSuggestion> = response
                .predictions
                .into_iter()
                .map(|p| {
                    let (primary_text, secondary_text) = match p.structured_formatting {
                        Some(f) => (f.main_text, f.secondary_text),
                        None => (p.description.clone(), None),
                    };
                    PlaceSuggestion {
                        place_id: p.place_id,
                        description: p.description,
                        primary_text,
                        secondary_text,
                    }
                })
                .collect();
            debug!(count = suggestions.len(), "Autocomplete predictions");
            Ok(suggestions)
        })
    }

    fn place_details(
        &self,
        place_id: &str,
        session: &SessionToken,
    ) -> BoxFuture<'_, DiscoveryResult<PlaceDetails>> {
        let request = self.details_request(place_id, session);
        Box::pin(async move {
            self.ensure_key()?;
            let response: DetailsResponse = self.get_json(request).await?;
            if response.status != "OK" {
                return Err(status_error(&response.status, response.error_message));
            }

            let result = response
                .result
                .ok_or_else(|| DiscoveryError::NotFound("place has no details".to_string()))?;
            let location = result
                .geometry
                .as_ref()
                .and_then(|g| LatLon::checked(g.location.lat, g.location.lng))
                .ok_or_else(|| DiscoveryError::NotFound("place has no geometry".to_string()))?;
            let formatted_address = result.formatted_address.clone().unwrap_or_default();
            let city = result
                .city()
                .or_else(|| result.name.clone())
                .or_else(|| formatted_address.split(',').next().map(|s| s.trim().to_string()))
                .filter(|c| !c.is_empty())
                .ok_or_else(|| DiscoveryError::NotFound("place has no city".to_string()))?;

            Ok(PlaceDetails {
                location,
                city,
                formatted_address,
            })
        })
    }

    fn reverse_geocode(&self, point: LatLon) -> BoxFuture<'_, DiscoveryResult<PlaceName>> {
        let request = self.reverse_request(point);
        Box::pin(async move {
            self.ensure_key()?;
            let response: GeocodeResponse = self.get_json(request).await?;
            if response.status != "OK" {
                return Err(status_error(&response.status, response.error_message));
            }

            let first = response
                .results
                .first()
                .ok_or_else(|| DiscoveryError::NotFound("no address".to_string()))?;
            let city = first.city();
            let area = first
                .component("sublocality")
                .or_else(|| first.component("sublocality_level_1"))
                .or_else(|| first.component("neighborhood"));
            let label = match (area, city.as_deref()) {
                (Some(area), Some(city)) => format!("{}, {}", area, city),
                (None, Some(city)) => city.to_string(),
                _ => first.formatted_address.clone().unwrap_or_default(),
            };

            Ok(PlaceName { label, city })
        })
    }
}
