//! Host location lookup used when an emergency alert goes out.

use std::time::Duration;

use futures_util::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("User denied the request for Geolocation.")]
    PermissionDenied,
    #[error("Location information is unavailable.")]
    PositionUnavailable,
    #[error("The request to get user location timed out.")]
    Timeout,
    #[error("Geolocation is not supported by this host.")]
    Unsupported,
    #[error("An unknown error occurred.")]
    Unknown,
}

/// Source of the device's current position.
pub trait GeolocationProvider: Send + Sync {
    fn current_position(&self) -> BoxFuture<'_, Result<Coordinates, LocationError>>;
}

/// Always reports the same coordinates.
pub struct FixedLocation(pub Coordinates);

impl GeolocationProvider for FixedLocation {
    fn current_position(&self) -> BoxFuture<'_, Result<Coordinates, LocationError>> {
        future::ready(Ok(self.0)).boxed()
    }
}

/// Always fails with the given error.
pub struct UnavailableLocation(pub LocationError);

impl GeolocationProvider for UnavailableLocation {
    fn current_position(&self) -> BoxFuture<'_, Result<Coordinates, LocationError>> {
        future::ready(Err(self.0.clone())).boxed()
    }
}

/// Never answers. Exercises the lookup timeout.
pub struct PendingLocation;

impl GeolocationProvider for PendingLocation {
    fn current_position(&self) -> BoxFuture<'_, Result<Coordinates, LocationError>> {
        future::pending().boxed()
    }
}

/// Provider for a configured `(latitude, longitude)`; unsupported when unset.
pub fn provider_for(fixed: Option<(f64, f64)>) -> Box<dyn GeolocationProvider> {
    match fixed {
        Some((latitude, longitude)) => Box::new(FixedLocation(Coordinates {
            latitude,
            longitude,
        })),
        None => Box::new(UnavailableLocation(LocationError::Unsupported)),
    }
}

/// Ask `provider` for a position, giving up after `limit`.
pub async fn locate_with_timeout(
    provider: &dyn GeolocationProvider,
    limit: Duration,
) -> Result<Coordinates, LocationError> {
    match tokio::time::timeout(limit, provider.current_position()).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_secs = limit.as_secs(), "Location lookup timed out");
            Err(LocationError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_location_resolves() {
        let provider = provider_for(Some((51.5, -0.12)));
        let position = locate_with_timeout(provider.as_ref(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(position.latitude, 51.5);
        assert_eq!(position.longitude, -0.12);
    }

    #[tokio::test]
    async fn unset_location_is_unsupported() {
        let provider = provider_for(None);
        let err = locate_with_timeout(provider.as_ref(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, LocationError::Unsupported);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_provider_times_out() {
        let err = locate_with_timeout(&PendingLocation, Duration::from_secs(10))
            .await
            .unwrap_err();
        assert_eq!(err, LocationError::Timeout);
    }

    #[test]
    fn error_messages_match_browser_wording() {
        assert_eq!(
            LocationError::PermissionDenied.to_string(),
            "User denied the request for Geolocation."
        );
        assert_eq!(
            LocationError::PositionUnavailable.to_string(),
            "Location information is unavailable."
        );
    }
}
