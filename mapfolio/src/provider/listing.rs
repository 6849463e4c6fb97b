//! Listing query: the backend that returns properties and projects.

use tracing::{debug, info};

use super::http::{AsyncHttpClient, HttpRequest};
use super::BoxFuture;
use crate::entity::{EntityCatalog, ListingResponse};
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::geo::Viewport;

/// Parameters of one listing query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingQuery {
    pub city: Option<String>,
    pub viewport: Option<Viewport>,
}

impl ListingQuery {
    pub fn for_city(city: impl Into<String>) -> Self {
        Self {
            city: Some(city.into()),
            viewport: None,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }
}

/// Supplies the bearer token for the listing API.
///
/// Token storage and refresh are owned by the authentication collaborator.
pub trait TokenProvider: Send + Sync {
    /// The current session token, or `None` when the user is signed out.
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed token, as used by the CLI.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone().filter(|t| !t.trim().is_empty())
    }
}

/// Fetches the dataset for a city or viewport.
pub trait ListingService: Send + Sync {
    fn fetch(&self, query: ListingQuery) -> BoxFuture<'_, DiscoveryResult<EntityCatalog>>;
}

/// Listing service over HTTP.
pub struct HttpListingService<C: AsyncHttpClient, T: TokenProvider> {
    client: C,
    tokens: T,
    endpoint: String,
}

impl<C: AsyncHttpClient, T: TokenProvider> HttpListingService<C, T> {
    /// # Arguments
    ///
    /// * `client` - HTTP client for making requests
    /// * `tokens` - Source of the bearer token
    /// * `base_url` - API root, e.g. `https://api.example.com`
    /// * `path` - Listing endpoint path, e.g. `/api/map/listings`
    pub fn new(client: C, tokens: T, base_url: &str, path: &str) -> Self {
        let endpoint = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Self {
            client,
            tokens,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(&self, query: &ListingQuery, token: String) -> HttpRequest {
        let mut request = HttpRequest::get(self.endpoint.clone()).bearer(token);
        if let Some(city) = &query.city {
            request = request.query("city", city.clone());
        }
        if let Some(viewport) = &query.viewport {
            for (key, value) in viewport.query_params() {
                request = request.query(key, value);
            }
        }
        request
    }
}

impl<C: AsyncHttpClient, T: TokenProvider> ListingService for HttpListingService<C, T> {
    fn fetch(&self, query: ListingQuery) -> BoxFuture<'_, DiscoveryResult<EntityCatalog>> {
        Box::pin(async move {
            let token = self.tokens.bearer_token().ok_or(DiscoveryError::AuthRequired)?;
            let request = self.build_request(&query, token);
            debug!(endpoint = %self.endpoint, city = ?query.city, "Fetching listings");

            let body = self.client.get(request).await?;
            let catalog = ListingResponse::from_slice(&body)?.into_catalog();

            info!(
                city = ?query.city,
                properties = catalog.properties().len(),
                projects = catalog.projects().len(),
                "Listings loaded"
            );
            Ok(catalog)
        })
    }
}
