//! Location detection for basket comparison.
//!
//! A [`LocationResolver`] asks a [`CoordinateProvider`] for the user's
//! position and hands the fix to a [`ReverseGeocoder`] to get a structured
//! address. Two providers ship with the crate: [`CoordinateSource::Ip`], which
//! uses IP geolocation through ip-api, and [`CoordinateSource::Manual`], which
//! reports fixed coordinates from `config.toml`.
//!
//! Nothing is retried. A failure at either step is returned to the caller as
//! a [`LocationError`].

use crate::config::{CoordinateSourceKind, LocationConfig};
use crate::error::LocationError;
use crate::models::{Coordinates, DetectedLocation};
use ipgeolocate::{Locator, Service};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Hints passed to a [`CoordinateProvider`] with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// Upper bound on a single provider call.
    pub timeout: Duration,
    /// A previous fix younger than this is reused.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(60),
        }
    }
}

impl From<&LocationConfig> for PositionOptions {
    fn from(c: &LocationConfig) -> Self {
        Self {
            high_accuracy: c.high_accuracy,
            timeout: c.timeout(),
            maximum_age: c.maximum_age(),
        }
    }
}

/// Source of the device's current coordinates.
pub trait CoordinateProvider: Send + Sync {
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = Result<Coordinates, LocationError>> + Send;
}

/// Turns coordinates into a structured address.
pub trait ReverseGeocoder: Send + Sync {
    fn reverse_geocode(
        &self,
        coords: Coordinates,
    ) -> impl Future<Output = Result<DetectedLocation, LocationError>> + Send;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateSource {
    Ip { address: String },
    Manual(Coordinates),
}

impl CoordinateSource {
    /// `None` when the configuration disables detection.
    pub fn from_config(c: &LocationConfig) -> Option<Self> {
        match c.source {
            CoordinateSourceKind::Ip => Some(CoordinateSource::Ip {
                address: c.ip_address.clone(),
            }),
            CoordinateSourceKind::Manual => Some(CoordinateSource::Manual(Coordinates {
                latitude: c.manual_lat,
                longitude: c.manual_lon,
            })),
            CoordinateSourceKind::Disabled => None,
        }
    }
}

impl CoordinateProvider for CoordinateSource {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, LocationError> {
        match self {
            CoordinateSource::Manual(coords) => Ok(*coords),
            CoordinateSource::Ip { address } => {
                // ip-api has a single precision level.
                debug!(high_accuracy = options.high_accuracy, "Querying IP geolocation");
                let loc = Locator::get(address, Service::IpApi).await.map_err(|e| {
                    error!("Error using geolocation service: {}", e);
                    LocationError::LocationUnavailable(e.to_string())
                })?;
                let latitude = loc.latitude.parse::<f64>();
                let longitude = loc.longitude.parse::<f64>();
                match (latitude, longitude) {
                    (Ok(latitude), Ok(longitude)) => Ok(Coordinates { latitude, longitude }),
                    _ => Err(LocationError::LocationUnavailable(format!(
                        "geolocation service returned unreadable coordinates ({}, {})",
                        loc.latitude, loc.longitude
                    ))),
                }
            }
        }
    }
}

/// Combines a coordinate provider with a reverse geocoder.
pub struct LocationResolver<C, G> {
    provider: Option<C>,
    geocoder: G,
    options: PositionOptions,
    last_fix: Mutex<Option<(Instant, Coordinates)>>,
}

impl<G: ReverseGeocoder> LocationResolver<CoordinateSource, G> {
    pub fn from_config(config: &LocationConfig, geocoder: G) -> Self {
        LocationResolver::new(
            CoordinateSource::from_config(config),
            geocoder,
            PositionOptions::from(config),
        )
    }
}

impl<C: CoordinateProvider, G: ReverseGeocoder> LocationResolver<C, G> {
    /// `provider = None` models a runtime without a coordinate capability.
    pub fn new(provider: Option<C>, geocoder: G, options: PositionOptions) -> Self {
        Self {
            provider,
            geocoder,
            options,
            last_fix: Mutex::new(None),
        }
    }

    /// Resolves the user's current address.
    ///
    /// # Errors
    ///
    /// - [`LocationError::UnsupportedCapability`] when no provider exists.
    /// - [`LocationError::LocationUnavailable`] when the provider fails, times
    ///   out, or reports coordinates outside WGS84 ranges.
    /// - [`LocationError::GeocodeFailure`] when the address lookup fails.
    pub async fn detect_location(&self) -> Result<DetectedLocation, LocationError> {
        let coords = self.current_coordinates().await?;
        let location = self.geocoder.reverse_geocode(coords).await?;
        info!(
            city = %location.city,
            pincode = %location.pincode,
            "Location detected"
        );
        Ok(location)
    }

    async fn current_coordinates(&self) -> Result<Coordinates, LocationError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(LocationError::UnsupportedCapability)?;

        if let Some(coords) = self.cached_fix() {
            debug!("Reusing cached position fix");
            return Ok(coords);
        }

        let coords = tokio::time::timeout(
            self.options.timeout,
            provider.current_position(&self.options),
        )
        .await
        .map_err(|_| {
            LocationError::LocationUnavailable(format!(
                "timed out after {}s",
                self.options.timeout.as_secs()
            ))
        })??;

        if !coords.is_valid() {
            return Err(LocationError::LocationUnavailable(format!(
                "coordinates out of range ({}, {})",
                coords.latitude, coords.longitude
            )));
        }

        info!("Geolocation successful - ({}, {})", coords.latitude, coords.longitude);
        *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((Instant::now(), coords));
        Ok(coords)
    }

    fn cached_fix(&self) -> Option<Coordinates> {
        let fix = *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner);
        fix.filter(|(at, _)| at.elapsed() < self.options.maximum_age)
            .map(|(_, coords)| coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingProvider {
        coords: Coordinates,
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl CoordinateProvider for CountingProvider {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinates, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(self.coords)
        }
    }

    struct DeniedProvider;

    impl CoordinateProvider for DeniedProvider {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinates, LocationError> {
            Err(LocationError::LocationUnavailable("permission denied".into()))
        }
    }

    struct FixedGeocoder(Result<DetectedLocation, LocationError>);

    impl ReverseGeocoder for FixedGeocoder {
        async fn reverse_geocode(
            &self,
            _coords: Coordinates,
        ) -> Result<DetectedLocation, LocationError> {
            self.0.clone()
        }
    }

    fn bengaluru() -> DetectedLocation {
        DetectedLocation {
            city: "Bengaluru".into(),
            area: "Indiranagar".into(),
            landmark: "100 Feet Road".into(),
            pincode: "560038".into(),
        }
    }

    fn counting(delay: Duration) -> (CountingProvider, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            coords: Coordinates {
                latitude: 12.97,
                longitude: 77.64,
            },
            calls: calls.clone(),
            delay,
        };
        (provider, calls)
    }

    #[tokio::test]
    async fn resolves_address_from_provider_fix() {
        let (provider, calls) = counting(Duration::ZERO);
        let resolver = LocationResolver::new(
            Some(provider),
            FixedGeocoder(Ok(bengaluru())),
            PositionOptions::default(),
        );

        let loc = resolver.detect_location().await.unwrap();

        assert_eq!(loc, bengaluru());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_provider_is_unsupported() {
        let resolver: LocationResolver<DeniedProvider, _> = LocationResolver::new(
            None,
            FixedGeocoder(Ok(bengaluru())),
            PositionOptions::default(),
        );

        assert_eq!(
            resolver.detect_location().await,
            Err(LocationError::UnsupportedCapability)
        );
    }

    #[tokio::test]
    async fn provider_failure_is_location_unavailable() {
        let resolver = LocationResolver::new(
            Some(DeniedProvider),
            FixedGeocoder(Ok(bengaluru())),
            PositionOptions::default(),
        );

        let err = resolver.detect_location().await.unwrap_err();
        assert!(matches!(err, LocationError::LocationUnavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let (provider, _) = counting(Duration::from_secs(30));
        let resolver = LocationResolver::new(
            Some(provider),
            FixedGeocoder(Ok(bengaluru())),
            PositionOptions::default(),
        );

        let err = resolver.detect_location().await.unwrap_err();
        assert_eq!(
            err,
            LocationError::LocationUnavailable("timed out after 10s".into())
        );
    }

    #[tokio::test]
    async fn geocode_failure_is_passed_through() {
        let (provider, _) = counting(Duration::ZERO);
        let resolver = LocationResolver::new(
            Some(provider),
            FixedGeocoder(Err(LocationError::GeocodeFailure("offline".into()))),
            PositionOptions::default(),
        );

        assert_eq!(
            resolver.detect_location().await,
            Err(LocationError::GeocodeFailure("offline".into()))
        );
    }

    #[tokio::test]
    async fn recent_fix_is_reused_within_maximum_age() {
        let (provider, calls) = counting(Duration::ZERO);
        let resolver = LocationResolver::new(
            Some(provider),
            FixedGeocoder(Ok(bengaluru())),
            PositionOptions::default(),
        );

        resolver.detect_location().await.unwrap();
        resolver.detect_location().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_maximum_age_always_queries_provider() {
        let (provider, calls) = counting(Duration::ZERO);
        let resolver = LocationResolver::new(
            Some(provider),
            FixedGeocoder(Ok(bengaluru())),
            PositionOptions {
                maximum_age: Duration::ZERO,
                ..PositionOptions::default()
            },
        );

        resolver.detect_location().await.unwrap();
        resolver.detect_location().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn out_of_range_fix_is_rejected() {
        let resolver = LocationResolver::new(
            Some(CoordinateSource::Manual(Coordinates {
                latitude: 123.0,
                longitude: 0.0,
            })),
            FixedGeocoder(Ok(bengaluru())),
            PositionOptions::default(),
        );

        let err = resolver.detect_location().await.unwrap_err();
        assert!(matches!(err, LocationError::LocationUnavailable(_)));
    }

    #[test]
    fn disabled_source_has_no_provider() {
        let config = LocationConfig {
            source: CoordinateSourceKind::Disabled,
            ..LocationConfig::default()
        };
        assert_eq!(CoordinateSource::from_config(&config), None);
    }
}
