//! Reverse-geocode memoisation using moka.
//!
//! Card taps reverse-geocode the same handful of coordinates over and over.
//! [`CachedPlaces`] wraps any [`PlacesService`] and keeps successful reverse
//! lookups in a bounded `moka::future::Cache`, keyed by the coordinate rounded
//! to four decimals. Autocomplete and place details pass straight through;
//! they are session-scoped and must not be replayed.

use std::sync::Arc;

use moka::future::Cache as MokaCache;
use tracing::debug;

use super::places::{PlaceDetails, PlaceName, PlaceSuggestion, PlacesService, SessionToken};
use super::BoxFuture;
use crate::error::DiscoveryResult;
use crate::geo::LatLon;

/// Default maximum number of cached reverse lookups.
pub const DEFAULT_REVERSE_CACHE_ENTRIES: u64 = 512;

/// Places decorator caching reverse-geocode results.
pub struct CachedPlaces<P: PlacesService> {
    inner: Arc<P>,
    reverse: MokaCache<String, PlaceName>,
}

impl<P: PlacesService> CachedPlaces<P> {
    /// # Arguments
    ///
    /// * `inner` - The service to decorate
    /// * `max_entries` - Maximum number of cached reverse lookups
    pub fn new(inner: P, max_entries: u64) -> Self {
        Self {
            inner: Arc::new(inner),
            reverse: MokaCache::builder().max_capacity(max_entries).build(),
        }
    }

    /// Access the decorated service.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: PlacesService> PlacesService for CachedPlaces<P> {
    fn autocomplete(
        &self,
        input: &str,
        session: &SessionToken,
    ) -> BoxFuture<'_, DiscoveryResult<Vec<PlaceSuggestion>>> {
        self.inner.autocomplete(input, session)
    }

    fn place_details(
        &self,
        place_id: &str,
        session: &SessionToken,
    ) -> BoxFuture<'_, DiscoveryResult<PlaceDetails>> {
        self.inner.place_details(place_id, session)
    }

    fn reverse_geocode(&self, point: LatLon) -> BoxFuture<'_, DiscoveryResult<PlaceName>> {
        let key = point.rounded_key();
        Box::pin(async move {
            if let Some(hit) = self.reverse.get(&key).await {
                debug!(key = %key, "Reverse geocode cache hit");
                return Ok(hit);
            }

            let name = self.inner.reverse_geocode(point).await?;
            self.reverse.insert(key, name.clone()).await;
            Ok(name)
        })
    }
}
