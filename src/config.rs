//! Configuration management for the `GrowCast` engine
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::GrowcastError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `GrowCast` engine
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GrowcastConfig {
    /// Upstream API configuration
    #[serde(default)]
    pub apis: ApiConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default application settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Upstream API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// OpenWeatherMap API key, required only for reverse geocoding
    pub geocoding_api_key: Option<String>,
    /// Base URL for the Open-Meteo forecast API
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    /// Base URL for the OpenWeatherMap reverse geocoding API
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    /// Base URL for the hardiness zone API
    #[serde(default = "default_zone_url")]
    pub zone_url: String,
    /// Per-request timeout in seconds; failures fall through to the next tier
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Country assumed when region estimation has no better signal
    pub country_hint: Option<String>,
}

// Default value functions
fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_geocoding_url() -> String {
    "https://api.openweathermap.org/geo/1.0/reverse".to_string()
}

fn default_zone_url() -> String {
    "https://phzmapi.org".to_string()
}

fn default_timeout() -> u32 {
    4
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("growcast").to_string_lossy().into_owned())
        .unwrap_or_else(|| ".growcast-cache".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            geocoding_api_key: None,
            forecast_url: default_forecast_url(),
            geocoding_url: default_geocoding_url(),
            zone_url: default_zone_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { country_hint: None }
    }
}

impl GrowcastConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with GROWCAST_ prefix
        builder = builder.add_source(
            Environment::with_prefix("GROWCAST")
                .separator("_")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: GrowcastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("growcast").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.apis.forecast_url.is_empty() {
            self.apis.forecast_url = default_forecast_url();
        }
        if self.apis.geocoding_url.is_empty() {
            self.apis.geocoding_url = default_geocoding_url();
        }
        if self.apis.zone_url.is_empty() {
            self.apis.zone_url = default_zone_url();
        }
        if self.apis.timeout_seconds == 0 {
            self.apis.timeout_seconds = default_timeout();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.apis.timeout_seconds > 60 {
            return Err(GrowcastError::config(
                "API timeout cannot exceed 60 seconds; fallback tiers should be reached quickly",
            )
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(GrowcastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(GrowcastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for url in [
            &self.apis.forecast_url,
            &self.apis.geocoding_url,
            &self.apis.zone_url,
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(GrowcastError::config(format!(
                    "API base URL '{url}' must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if let Some(hint) = &self.defaults.country_hint {
            hint.parse::<crate::models::CountryCode>()?;
        }

        Ok(())
    }

    /// Create configuration directory if it doesn't exist
    pub fn ensure_config_dir() -> Result<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            let growcast_config_dir = config_dir.join("growcast");
            std::fs::create_dir_all(&growcast_config_dir).with_context(|| {
                format!(
                    "Failed to create config directory: {}",
                    growcast_config_dir.display()
                )
            })?;
            Ok(growcast_config_dir)
        } else {
            Err(GrowcastError::config("Unable to determine config directory").into())
        }
    }
}
