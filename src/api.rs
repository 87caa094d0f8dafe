use crate::config::GeocodeConfig;
use crate::error::LocationError;
use crate::location::ReverseGeocoder;
use crate::models::{Coordinates, DetectedLocation, NominatimResponse};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, error};

/// Reverse-geocoding client for a Nominatim-compatible service.
pub struct GeocodeProvider {
    client: Client,
    base_url: Url,
}

impl GeocodeProvider {
    pub fn new(config: &GeocodeConfig) -> Result<Self, LocationError> {
        Self::with_base_url(&config.base_url, &config.user_agent, config.timeout_seconds)
    }

    /// Points the client at `base_url`; tests pass a mock server here.
    pub fn with_base_url(
        base_url: &str,
        user_agent: &str,
        timeout_secs: u64,
    ) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;

        // One trailing slash so join() appends instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            LocationError::GeocodeFailure(format!("invalid geocode URL '{base_url}': {e}"))
        })?;

        Ok(Self { client, base_url })
    }

    pub fn build_url(&self, coords: Coordinates) -> Url {
        let mut url = self
            .base_url
            .join("reverse")
            .unwrap_or_else(|_| self.base_url.clone());
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &coords.latitude.to_string())
            .append_pair("lon", &coords.longitude.to_string())
            .append_pair("addressdetails", "1");
        url
    }

    pub async fn fetch_address(
        &self,
        coords: Coordinates,
    ) -> Result<DetectedLocation, LocationError> {
        let url = self.build_url(coords);
        debug!(%url, "Reverse geocoding");

        let res = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                error!("Error fetching location data: {}", e);
                LocationError::from(e)
            })?;

        let body = res.text().await?;
        let parsed: NominatimResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Malformed geocode response: {}", e);
            LocationError::GeocodeFailure(format!("malformed response: {e}"))
        })?;

        Ok(DetectedLocation::from(parsed))
    }
}

impl ReverseGeocoder for GeocodeProvider {
    async fn reverse_geocode(
        &self,
        coords: Coordinates,
    ) -> Result<DetectedLocation, LocationError> {
        self.fetch_address(coords).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base: &str) -> GeocodeProvider {
        GeocodeProvider::with_base_url(base, "basket-tui-tests", 5).unwrap()
    }

    #[test]
    fn reverse_url_carries_coordinates() {
        let url = provider("https://nominatim.openstreetmap.org").build_url(Coordinates {
            latitude: 12.5,
            longitude: 77.25,
        });
        assert_eq!(
            url.as_str(),
            "https://nominatim.openstreetmap.org/reverse?format=json&lat=12.5&lon=77.25&addressdetails=1"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let url = provider("http://localhost:8080/nominatim/").build_url(Coordinates {
            latitude: 1.0,
            longitude: 2.0,
        });
        assert!(url.as_str().starts_with("http://localhost:8080/nominatim/reverse?"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = GeocodeProvider::with_base_url("not a url", "ua", 5).err().unwrap();
        assert!(matches!(err, LocationError::GeocodeFailure(_)));
    }
}
