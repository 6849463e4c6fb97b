//! Place search collaborator: autocomplete, place details, reverse geocoding.

use std::fmt;

use super::BoxFuture;
use crate::error::DiscoveryResult;
use crate::geo::LatLon;

/// Token grouping an autocomplete session with its place-details lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// A fresh random token.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One ranked autocomplete prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceSuggestion {
    pub place_id: String,
    pub description: String,
    pub primary_text: String,
    pub secondary_text: Option<String>,
}

/// Resolved geometry and address for a selected suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDetails {
    pub location: LatLon,
    pub city: String,
    pub formatted_address: String,
}

/// Human-readable label for a coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceName {
    pub label: String,
    pub city: Option<String>,
}

/// The geocoding service used by search and selection.
pub trait PlacesService: Send + Sync {
    /// Ranked predictions for partial input.
    fn autocomplete(
        &self,
        input: &str,
        session: &SessionToken,
    ) -> BoxFuture<'_, DiscoveryResult<Vec<PlaceSuggestion>>>;

    /// Coordinate and city for a prediction's place id.
    fn place_details(
        &self,
        place_id: &str,
        session: &SessionToken,
    ) -> BoxFuture<'_, DiscoveryResult<PlaceDetails>>;

    /// Address label for a coordinate.
    fn reverse_geocode(&self, point: LatLon) -> BoxFuture<'_, DiscoveryResult<PlaceName>>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::error::DiscoveryError;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Scriptable places service. Records every call it receives.
    #[derive(Default)]
    pub struct MockPlacesService {
        pub suggestions: Mutex<HashMap<String, DiscoveryResult<Vec<PlaceSuggestion>>>>,
        pub details: Mutex<HashMap<String, DiscoveryResult<PlaceDetails>>>,
        pub reverse: Mutex<Option<DiscoveryResult<PlaceName>>>,
        pub autocomplete_calls: Mutex<Vec<String>>,
        pub detail_calls: Mutex<Vec<(String, SessionToken)>>,
        pub reverse_calls: Mutex<Vec<LatLon>>,
    }

    impl MockPlacesService {
        pub fn suggest(self, input: &str, result: DiscoveryResult<Vec<PlaceSuggestion>>) -> Self {
            self.suggestions.lock().insert(input.to_string(), result);
            self
        }

        pub fn detail(self, place_id: &str, result: DiscoveryResult<PlaceDetails>) -> Self {
            self.details.lock().insert(place_id.to_string(), result);
            self
        }

        pub fn reverse(self, result: DiscoveryResult<PlaceName>) -> Self {
            *self.reverse.lock() = Some(result);
            self
        }

        pub fn autocomplete_calls(&self) -> Vec<String> {
            self.autocomplete_calls.lock().clone()
        }
    }

    pub fn suggestion(place_id: &str, description: &str) -> PlaceSuggestion {
        PlaceSuggestion {
            place_id: place_id.to_string(),
            description: description.to_string(),
            primary_text: description.to_string(),
            secondary_text: None,
        }
    }

    impl PlacesService for MockPlacesService {
        fn autocomplete(
            &self,
            input: &str,
            _session: &SessionToken,
        ) -> BoxFuture<'_, DiscoveryResult<Vec<PlaceSuggestion>>> {
            self.autocomplete_calls.lock().push(input.to_string());
            let result = self
                .suggestions
                .lock()
                .get(input)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()));
            Box::pin(async move { result })
        }

        fn place_details(
            &self,
            place_id: &str,
            session: &SessionToken,
        ) -> BoxFuture<'_, DiscoveryResult<PlaceDetails>> {
            self.detail_calls
                .lock()
                .push((place_id.to_string(), session.clone()));
            let result = self
                .details
                .lock()
                .get(place_id)
                .cloned()
                .unwrap_or_else(|| Err(DiscoveryError::NotFound(place_id.to_string())));
            Box::pin(async move { result })
        }

        fn reverse_geocode(&self, point: LatLon) -> BoxFuture<'_, DiscoveryResult<PlaceName>> {
            self.reverse_calls.lock().push(point);
            let result = self
                .reverse
                .lock()
                .clone()
                .unwrap_or_else(|| Err(DiscoveryError::NotFound("no address".to_string())));
            Box::pin(async move { result })
        }
    }

    #[test]
    fn test_session_tokens_are_unique() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }
}
