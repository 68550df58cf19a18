//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present). Every value has a default, so an empty environment yields a
//! configuration that talks to a backend on localhost.

use emomap_core::LatLng;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ApiConfig,
    pub geocoder: GeocoderConfig,
    pub map: MapConfig,
    pub geolocation: GeolocationConfig,
    pub limits: LimitsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// REST backend connection
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Raw `Cookie` header value carrying the signed-in session
    pub session_cookie: Option<String>,
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Reverse geocoding service
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub enabled: bool,
    pub user_agent: String,
}

/// Map view defaults
#[derive(Debug, Clone)]
pub struct MapConfig {
    pub container: String,
    pub center: LatLng,
    pub zoom: u8,
    pub cluster_radius: u32,
    /// Zoom used when jumping to a new emotion or the located user
    pub focus_zoom: u8,
    /// Zoom used when centering on the user at start-up
    pub startup_zoom: u8,
}

/// Geolocation request limits
#[derive(Debug, Clone)]
pub struct GeolocationConfig {
    pub timeout_ms: u64,
    pub locate_max_age_secs: u64,
    pub standard_max_age_secs: u64,
}

impl GeolocationConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Text and paging limits
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_emotion_length: usize,
    pub max_comment_length: usize,
    pub page_size: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_emotion_length: default_max_emotion_length(),
            max_comment_length: default_max_comment_length(),
            page_size: default_page_size(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "emomap".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_api_timeout_secs() -> u64 {
    10
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    concat!("emomap/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_container() -> String {
    "map".to_string()
}

fn default_zoom() -> u8 {
    10
}

fn default_cluster_radius() -> u32 {
    80
}

fn default_geo_timeout_ms() -> u64 {
    10_000
}

fn default_max_emotion_length() -> usize {
    200
}

fn default_max_comment_length() -> usize {
    500
}

fn default_page_size() -> u32 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: default_env(),
            },
            api: ApiConfig {
                base_url: default_api_base_url(),
                timeout_secs: default_api_timeout_secs(),
                session_cookie: None,
            },
            geocoder: GeocoderConfig {
                base_url: default_geocoder_url(),
                enabled: true,
                user_agent: default_user_agent(),
            },
            map: MapConfig {
                container: default_container(),
                center: LatLng::MAP_CENTER,
                zoom: default_zoom(),
                cluster_radius: default_cluster_radius(),
                focus_zoom: 15,
                startup_zoom: 13,
            },
            geolocation: GeolocationConfig {
                timeout_ms: default_geo_timeout_ms(),
                locate_max_age_secs: 300,
                standard_max_age_secs: 60,
            },
            limits: LimitsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a URL or zoom level is malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or(defaults.app.name),
                env: lookup("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            api: ApiConfig {
                base_url: lookup("EMOMAP_API_BASE_URL")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.api.base_url),
                timeout_secs: parse_var(&lookup, "EMOMAP_API_TIMEOUT_SECS")
                    .unwrap_or(defaults.api.timeout_secs),
                session_cookie: lookup("EMOMAP_SESSION_COOKIE").filter(|s| !s.trim().is_empty()),
            },
            geocoder: GeocoderConfig {
                base_url: lookup("EMOMAP_GEOCODER_URL")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.geocoder.base_url),
                enabled: lookup("EMOMAP_GEOCODER_ENABLED")
                    .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                    .unwrap_or(defaults.geocoder.enabled),
                user_agent: defaults.geocoder.user_agent,
            },
            map: MapConfig {
                container: lookup("EMOMAP_MAP_CONTAINER").unwrap_or(defaults.map.container),
                zoom: parse_var(&lookup, "EMOMAP_MAP_ZOOM").unwrap_or(defaults.map.zoom),
                ..defaults.map
            },
            geolocation: GeolocationConfig {
                timeout_ms: parse_var(&lookup, "EMOMAP_GEO_TIMEOUT_MS")
                    .unwrap_or(defaults.geolocation.timeout_ms),
                ..defaults.geolocation
            },
            limits: LimitsConfig {
                max_emotion_length: parse_var(&lookup, "EMOMAP_MAX_EMOTION_LENGTH")
                    .unwrap_or(defaults.limits.max_emotion_length),
                max_comment_length: parse_var(&lookup, "EMOMAP_MAX_COMMENT_LENGTH")
                    .unwrap_or(defaults.limits.max_comment_length),
                page_size: parse_var(&lookup, "EMOMAP_PAGE_SIZE").unwrap_or(defaults.limits.page_size),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, url) in [
            ("EMOMAP_API_BASE_URL", &self.api.base_url),
            ("EMOMAP_GEOCODER_URL", &self.geocoder.base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(key, url.clone()));
            }
        }
        if !(1..=19).contains(&self.map.zoom) {
            return Err(ConfigError::InvalidValue(
                "EMOMAP_MAP_ZOOM",
                self.map.zoom.to_string(),
            ));
        }
        if self.limits.page_size == 0 {
            return Err(ConfigError::InvalidValue("EMOMAP_PAGE_SIZE", "0".to_string()));
        }
        Ok(())
    }
}

// Unparseable numbers fall back to the default
fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|s| s.trim().parse().ok())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_environment_is_production() {
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.app.name, "emomap");
        assert!(config.app.env.is_development());
        assert_eq!(config.api.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.map.zoom, 10);
        assert_eq!(config.map.cluster_radius, 80);
        assert_eq!(config.map.center, LatLng::MAP_CENTER);
        assert_eq!(config.geolocation.timeout(), Duration::from_secs(10));
        assert_eq!(config.limits.max_emotion_length, 200);
        assert_eq!(config.limits.max_comment_length, 500);
        assert_eq!(config.limits.page_size, 10);
        assert!(config.api.session_cookie.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("APP_ENV", "Production"),
            ("EMOMAP_API_BASE_URL", "https://emo.example.com/"),
            ("EMOMAP_SESSION_COOKIE", "session=abc"),
            ("EMOMAP_GEOCODER_ENABLED", "false"),
            ("EMOMAP_PAGE_SIZE", "20"),
            ("EMOMAP_MAP_ZOOM", "not-a-number"),
        ])
        .unwrap();
        assert!(config.app.env.is_production());
        assert_eq!(config.api.base_url, "https://emo.example.com");
        assert_eq!(config.api.session_cookie.as_deref(), Some("session=abc"));
        assert!(!config.geocoder.enabled);
        assert_eq!(config.limits.page_size, 20);
        assert_eq!(config.map.zoom, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            load(&[("EMOMAP_API_BASE_URL", "ftp://nope")]),
            Err(ConfigError::InvalidValue("EMOMAP_API_BASE_URL", _))
        ));
        assert!(load(&[("EMOMAP_MAP_ZOOM", "25")]).is_err());
        assert!(load(&[("EMOMAP_PAGE_SIZE", "0")]).is_err());
    }
}
