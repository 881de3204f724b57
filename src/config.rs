//! Configuration management for `ShelterFinder`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::ShelterFinderError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShelterFinderConfig {
    /// Shelter directory API
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Places details API
    #[serde(default)]
    pub places: PlacesConfig,
    /// News search API
    #[serde(default)]
    pub news: NewsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default search settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Shelter directory API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL, endpoint paths are appended to it
    #[serde(default = "default_directory_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Places details API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    /// Places API key, required for shelter details
    pub api_key: Option<String>,
    #[serde(default = "default_places_base_url")]
    pub base_url: String,
}

/// News search API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// News API key, required for the news feed
    pub api_key: Option<String>,
    #[serde(default = "default_news_base_url")]
    pub base_url: String,
    /// Query used when none is given on the command line
    #[serde(default = "default_news_query")]
    pub default_query: String,
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

/// Default search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Search radius in kilometers
    #[serde(default = "default_search_radius")]
    pub search_radius_km: u32,
    /// Maximum number of results to list
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

// Default value functions
fn default_directory_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_places_base_url() -> String {
    "https://maps.googleapis.com/maps/api/place".to_string()
}

fn default_news_base_url() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_news_query() -> String {
    "hurricane helene".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_search_radius() -> u32 {
    50
}

fn default_max_results() -> u32 {
    10
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_directory_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_places_base_url(),
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_news_base_url(),
            default_query: default_news_query(),
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
        Self {
            search_radius_km: default_search_radius(),
            max_results: default_max_results(),
        }
    }
}

impl ShelterFinderConfig {
    /// Load configuration from the given file, or the default location, plus
    /// environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if explicit && !config_file.exists() {
            return Err(ShelterFinderError::config(format!(
                "Config file not found: {}",
                config_file.display()
            ))
            .into());
        }

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // SHELTERFINDER_NEWS__API_KEY -> news.api_key
        builder = builder.add_source(
            Environment::with_prefix("SHELTERFINDER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: ShelterFinderConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("shelterfinder").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.directory.base_url.is_empty() {
            self.directory.base_url = default_directory_base_url();
        }
        if self.directory.timeout_seconds == 0 {
            self.directory.timeout_seconds = default_timeout();
        }
        if self.places.base_url.is_empty() {
            self.places.base_url = default_places_base_url();
        }
        if self.news.base_url.is_empty() {
            self.news.base_url = default_news_base_url();
        }
        if self.news.default_query.trim().is_empty() {
            self.news.default_query = default_news_query();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.search_radius_km == 0 {
            self.defaults.search_radius_km = default_search_radius();
        }
        if self.defaults.max_results == 0 {
            self.defaults.max_results = default_max_results();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys, when present
    pub fn validate_api_keys(&self) -> Result<()> {
        validate_key("Places", self.places.api_key.as_deref())?;
        validate_key("News", self.news.api_key.as_deref())?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.directory.timeout_seconds > 300 {
            return Err(ShelterFinderError::config(
                "Directory API timeout cannot exceed 300 seconds",
            )
            .into());
        }

        if self.directory.max_retries > 10 {
            return Err(
                ShelterFinderError::config("Directory API max retries cannot exceed 10").into(),
            );
        }

        // Half the Earth's circumference covers every point
        if self.defaults.search_radius_km > 20_000 {
            return Err(
                ShelterFinderError::config("Search radius cannot exceed 20000 km").into(),
            );
        }

        if self.defaults.max_results > 100 {
            return Err(ShelterFinderError::config("Maximum results cannot exceed 100").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ShelterFinderError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(ShelterFinderError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Directory", &self.directory.base_url),
            ("Places", &self.places.base_url),
            ("News", &self.news.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ShelterFinderError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

fn validate_key(service: &str, key: Option<&str>) -> Result<()> {
    let Some(key) = key else {
        return Ok(());
    };

    if key.is_empty() {
        return Err(ShelterFinderError::config(format!(
            "{service} API key cannot be empty if provided. Either remove it or provide a valid key."
        ))
        .into());
    }

    if key.len() < 8 {
        return Err(ShelterFinderError::config(format!(
            "{service} API key appears to be invalid (too short). Please check your API key."
        ))
        .into());
    }

    if key.len() > 100 {
        return Err(ShelterFinderError::config(format!(
            "{service} API key appears to be invalid (too long). Please check your API key."
        ))
        .into());
    }

    Ok(())
}
