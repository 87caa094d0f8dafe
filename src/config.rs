use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::time::Duration;
use tracing::{info, warn};

pub const CONFIG_PATH: &str = "config.toml";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub location: LocationConfig,
    pub geocode: GeocodeConfig,
    pub compare: CompareConfig,
    pub catalog: CatalogConfig,
    pub ui: UiConfig,
}

/// Where coordinates come from before reverse geocoding.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSourceKind {
    /// IP geolocation through ip-api.
    Ip,
    /// `manual_lat` / `manual_lon` below.
    Manual,
    /// No provider; detection reports it as unsupported.
    Disabled,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LocationConfig {
    pub source: CoordinateSourceKind,
    pub manual_lat: f64,
    pub manual_lon: f64,
    pub ip_address: String, // Empty means "this machine's public address"
    pub high_accuracy: bool,
    pub timeout_seconds: u64,
    pub maximum_age_seconds: u64, // Reuse a fix younger than this
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeocodeConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CompareConfig {
    pub delay_ms: u64, // Pause before showing results
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: Option<String>, // JSON product list replacing the bundled one
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
    pub default_view: String, // "Catalog", "Compare", "Results" or "Settings"
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            source: CoordinateSourceKind::Ip,
            manual_lat: 12.9716,
            manual_lon: 77.5946,
            ip_address: String::new(),
            high_accuracy: true,
            timeout_seconds: 10,
            maximum_age_seconds: 60,
        }
    }
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("basket-tui/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: 15,
        }
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self { delay_ms: 1500 }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 150,
            default_view: "Catalog".to_string(),
        }
    }
}

impl LocationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn maximum_age(&self) -> Duration {
        Duration::from_secs(self.maximum_age_seconds)
    }
}

impl Config {
    /// Loads config.toml from the working directory.
    /// If it doesn't exist, creates a default one.
    pub fn load() -> Self {
        Self::load_or_init(CONFIG_PATH)
    }

    /// Loads `path`, writing defaults there only when no file exists yet.
    /// An existing file that can't be read or parsed is left untouched.
    pub fn load_or_init(path: &str) -> Self {
        match Self::load_from(path) {
            Ok(config) => return config,
            Err(ConfigError::Io { ref source, .. })
                if source.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!("{}. Using defaults.", e);
                return Config::default();
            }
        }

        let default_config = Config::default();

        // Save default config to disk for the user to edit later
        if let Err(e) = default_config.save_to(path) {
            warn!("Could not write default {} to disk: {}", path, e);
        }

        info!("Loaded default configuration.");
        default_config
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn save_to(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })
    }
}
