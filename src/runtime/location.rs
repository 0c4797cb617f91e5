//! Location Lookup
//!
//! The position collaborator consulted once per finished run. A missing or
//! late position resolves to the sentinel; a fallback region can then stand
//! in for it.

use std::time::Duration;
use futures_util::future::{self, BoxFuture, FutureExt};
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::core::rng::DeterministicRng;
use crate::persistence::leaderboard::{GeoPoint, REFERENCE_POINT};

/// Default half-width of the fallback jitter, in degrees.
pub const DEFAULT_FALLBACK_JITTER: f64 = 0.005;

/// Asynchronous position source.
pub trait Locator: Send + Sync {
    /// Current position, or `GeoPoint::UNKNOWN` if unavailable.
    fn resolve_position(&self) -> BoxFuture<'static, GeoPoint>;
}

/// Always answers with the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator(pub GeoPoint);

impl Locator for FixedLocator {
    fn resolve_position(&self) -> BoxFuture<'static, GeoPoint> {
        future::ready(self.0).boxed()
    }
}

/// No permission, no fix.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocation;

impl Locator for NoLocation {
    fn resolve_position(&self) -> BoxFuture<'static, GeoPoint> {
        future::ready(GeoPoint::UNKNOWN).boxed()
    }
}

/// Ask the locator, giving up after `timeout`.
pub async fn resolve_with_timeout(locator: &dyn Locator, timeout: Duration) -> GeoPoint {
    match tokio::time::timeout(timeout, locator.resolve_position()).await {
        Ok(position) => position,
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "location lookup timed out");
            GeoPoint::UNKNOWN
        }
    }
}

/// Stand-in region for runs without a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackRegion {
    /// Centre latitude
    pub latitude: f64,
    /// Centre longitude
    pub longitude: f64,
    /// Maximum offset per axis, in degrees
    pub jitter: f64,
}

impl Default for FallbackRegion {
    fn default() -> Self {
        Self {
            latitude: REFERENCE_POINT.lat,
            longitude: REFERENCE_POINT.lon,
            jitter: DEFAULT_FALLBACK_JITTER,
        }
    }
}

impl FallbackRegion {
    /// Keep a known position; replace the sentinel with a jittered point.
    pub fn apply(&self, position: GeoPoint, rng: &mut DeterministicRng) -> GeoPoint {
        if !position.is_unknown() {
            return position;
        }
        let lat = self.latitude + (rng.next_unit_f64() - 0.5) * 2.0 * self.jitter;
        let lon = self.longitude + (rng.next_unit_f64() - 0.5) * 2.0 * self.jitter;
        debug!(lat, lon, "using fallback position");
        GeoPoint::new(lat, lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverLocator;

    impl Locator for NeverLocator {
        fn resolve_position(&self) -> BoxFuture<'static, GeoPoint> {
            future::pending::<GeoPoint>().boxed()
        }
    }

    #[tokio::test]
    async fn test_fixed_and_missing() {
        let here = GeoPoint::new(48.85, 2.35);
        let timeout = Duration::from_secs(1);
        assert_eq!(resolve_with_timeout(&FixedLocator(here), timeout).await, here);
        assert!(resolve_with_timeout(&NoLocation, timeout).await.is_unknown());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_sentinel() {
        let position = resolve_with_timeout(&NeverLocator, Duration::from_millis(3000)).await;
        assert!(position.is_unknown());
    }

    #[test]
    fn test_fallback_jitter_bounds() {
        let region = FallbackRegion::default();
        let mut rng = DeterministicRng::new(42);
        for _ in 0..1000 {
            let p = region.apply(GeoPoint::UNKNOWN, &mut rng);
            assert!((p.lat - 32.01).abs() <= 0.005 + 1e-9);
            assert!((p.lon - 34.74).abs() <= 0.005 + 1e-9);
            assert!(p.is_mappable());
        }
    }

    #[test]
    fn test_fallback_keeps_known_position() {
        let region = FallbackRegion::default();
        let mut rng = DeterministicRng::new(1);
        let here = GeoPoint::new(1.0, 2.0);
        assert_eq!(region.apply(here, &mut rng), here);
        // No draws consumed
        assert_eq!(rng.state(), DeterministicRng::new(1).state());
    }
}
