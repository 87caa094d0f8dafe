//! Error types surfaced by location detection, basket comparison, the
//! product catalog and configuration loading.
//!
//! Every variant here ends up in front of the user as a notification, so the
//! `Display` strings are written to be read, not parsed.

use thiserror::Error;

/// Failures from location detection and reverse geocoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// No coordinate provider is configured (`location.source = "disabled"`).
    #[error("Location detection is not supported with the current configuration.")]
    UnsupportedCapability,

    /// The coordinate provider refused, timed out, or produced no usable fix.
    #[error("Unable to access location: {0}")]
    LocationUnavailable(String),

    /// The reverse-geocode request failed or returned an unreadable body.
    #[error("Unable to detect location: {0}")]
    GeocodeFailure(String),
}

impl From<reqwest::Error> for LocationError {
    fn from(e: reqwest::Error) -> Self {
        LocationError::GeocodeFailure(e.to_string())
    }
}

/// Failures from [`compare_basket`](crate::compare::compare_basket) and the
/// basket handoff operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("{0}")]
    InvalidPreconditions(&'static str),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
