//! Device position collaborator for "use my location".

use super::BoxFuture;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::geo::LatLon;

/// Yields the device's current position.
pub trait LocationProvider: Send + Sync {
    fn current_location(&self) -> BoxFuture<'_, DiscoveryResult<LatLon>>;
}

/// A position fixed at construction; `None` behaves like a denied permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<LatLon>);

impl LocationProvider for FixedLocation {
    fn current_location(&self) -> BoxFuture<'_, DiscoveryResult<LatLon>> {
        let result = self
            .0
            .ok_or_else(|| DiscoveryError::NotFound("device location unavailable".to_string()));
        Box::pin(async move { result })
    }
}
