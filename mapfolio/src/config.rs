//! Configuration file handling.
//!
//! Settings live in an INI file at `~/.config/mapfolio/config.ini` (the
//! platform config dir, via `dirs`). Every key is optional; a missing file
//! yields [`ConfigFile::default`].
//!
//! ```ini
//! [listing]
//! base_url = https://api.example.com
//! path = /api/map/listings
//! timeout_secs = 30
//! token =
//!
//! [geocoding]
//! api_key =
//! country = pk
//! place_types = (cities)
//! reverse_cache_entries = 512
//!
//! [discovery]
//! default_city = Lahore
//! items_per_page = 8
//! markers_per_page = 10
//! debounce_ms = 350
//! scroll_retry_ms = 250
//!
//! [logging]
//! level = info
//! directory =
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use thiserror::Error;

use crate::logging::LoggingConfig;
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, DEFAULT_MARKERS_PER_PAGE};
use crate::provider::{DEFAULT_REVERSE_CACHE_ENTRIES, DEFAULT_TIMEOUT_SECS, GOOGLE_BASE_URL};
use crate::search::DEFAULT_DEBOUNCE;
use crate::selection::{SelectionConfig, DEFAULT_SCROLL_RETRY_DELAY};

/// Environment variable that overrides `listing.token`.
pub const TOKEN_ENV_VAR: &str = "MAPFOLIO_TOKEN";

/// City loaded on mount and after the location query is cleared.
pub const DEFAULT_CITY: &str = "Lahore";

/// Country restriction for autocomplete.
pub const DEFAULT_COUNTRY: &str = "pk";

/// Place-type restriction for autocomplete.
pub const DEFAULT_PLACE_TYPES: &str = "(cities)";

const DEFAULT_LISTING_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_LISTING_PATH: &str = "/api/map/listings";

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mapfolio")
        .join("config.ini")
}

/// `[listing]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSettings {
    pub base_url: String,
    pub path: String,
    pub timeout_secs: u64,
    pub token: Option<String>,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LISTING_BASE_URL.to_string(),
            path: DEFAULT_LISTING_PATH.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            token: None,
        }
    }
}

/// `[geocoding]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodingSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub country: String,
    pub place_types: String,
    pub reverse_cache_entries: u64,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: GOOGLE_BASE_URL.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            place_types: DEFAULT_PLACE_TYPES.to_string(),
            reverse_cache_entries: DEFAULT_REVERSE_CACHE_ENTRIES,
        }
    }
}

/// `[discovery]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    pub default_city: String,
    pub items_per_page: usize,
    pub markers_per_page: usize,
    pub debounce_ms: u64,
    pub scroll_retry_ms: u64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            default_city: DEFAULT_CITY.to_string(),
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            markers_per_page: DEFAULT_MARKERS_PER_PAGE,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            scroll_retry_ms: DEFAULT_SCROLL_RETRY_DELAY.as_millis() as u64,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// The parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub listing: ListingSettings,
    pub geocoding: GeocodingSettings,
    pub discovery: DiscoverySettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from [`config_file_path`], or defaults when the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse INI text. Unknown sections and keys are ignored.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("listing")) {
            let listing = &mut config.listing;
            read_string(section, "base_url", &mut listing.base_url);
            read_string(section, "path", &mut listing.path);
            read_number(section, "listing", "timeout_secs", &mut listing.timeout_secs)?;
            listing.token = optional(section, "token");
        }

        if let Some(section) = ini.section(Some("geocoding")) {
            let geocoding = &mut config.geocoding;
            geocoding.api_key = optional(section, "api_key");
            read_string(section, "base_url", &mut geocoding.base_url);
            read_string(section, "country", &mut geocoding.country);
            read_string(section, "place_types", &mut geocoding.place_types);
            read_number(
                section,
                "geocoding",
                "reverse_cache_entries",
                &mut geocoding.reverse_cache_entries,
            )?;
        }

        if let Some(section) = ini.section(Some("discovery")) {
            let discovery = &mut config.discovery;
            read_string(section, "default_city", &mut discovery.default_city);
            read_number(section, "discovery", "items_per_page", &mut discovery.items_per_page)?;
            read_number(section, "discovery", "markers_per_page", &mut discovery.markers_per_page)?;
            read_number(section, "discovery", "debounce_ms", &mut discovery.debounce_ms)?;
            read_number(section, "discovery", "scroll_retry_ms", &mut discovery.scroll_retry_ms)?;
        }

        if let Some(section) = ini.section(Some("logging")) {
            read_string(section, "level", &mut config.logging.level);
            config.logging.directory = optional(section, "directory").map(PathBuf::from);
        }

        Ok(config)
    }

    /// Serialise to INI text.
    pub fn to_ini_string(&self) -> String {
        let mut ini = Ini::new();
        ini.with_section(Some("listing"))
            .set("base_url", self.listing.base_url.as_str())
            .set("path", self.listing.path.as_str())
            .set("timeout_secs", self.listing.timeout_secs.to_string())
            .set("token", self.listing.token.clone().unwrap_or_default());
        ini.with_section(Some("geocoding"))
            .set("api_key", self.geocoding.api_key.clone().unwrap_or_default())
            .set("base_url", self.geocoding.base_url.as_str())
            .set("country", self.geocoding.country.as_str())
            .set("place_types", self.geocoding.place_types.as_str())
            .set(
                "reverse_cache_entries",
                self.geocoding.reverse_cache_entries.to_string(),
            );
        ini.with_section(Some("discovery"))
            .set("default_city", self.discovery.default_city.as_str())
            .set("items_per_page", self.discovery.items_per_page.to_string())
            .set("markers_per_page", self.discovery.markers_per_page.to_string())
            .set("debounce_ms", self.discovery.debounce_ms.to_string())
            .set("scroll_retry_ms", self.discovery.scroll_retry_ms.to_string());
        ini.with_section(Some("logging"))
            .set("level", self.logging.level.as_str())
            .set(
                "directory",
                self.logging
                    .directory
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default(),
            );

        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = ini.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Write the configuration, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, self.to_ini_string()).map_err(write_err)
    }

    /// Save to [`config_file_path`].
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Bearer token for the listing API. `MAPFOLIO_TOKEN` wins over the file.
    pub fn listing_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.listing.token.clone())
    }

    /// Runtime settings for the discovery screen.
    pub fn discovery(&self) -> DiscoveryConfig {
        let settings = &self.discovery;
        DiscoveryConfig::default()
            .with_default_city(settings.default_city.clone())
            .with_page_sizes(settings.items_per_page, settings.markers_per_page)
            .with_debounce(Duration::from_millis(settings.debounce_ms))
            .with_scroll_retry_delay(Duration::from_millis(settings.scroll_retry_ms))
    }

    pub fn logging(&self) -> LoggingConfig {
        let mut config = LoggingConfig::default().with_level(self.logging.level.clone());
        if let Some(dir) = &self.logging.directory {
            config = config.with_directory(dir.clone());
        }
        config
    }
}

fn optional(section: &Properties, key: &str) -> Option<String> {
    section
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn read_string(section: &Properties, key: &str, target: &mut String) {
    if let Some(value) = optional(section, key) {
        *target = value;
    }
}

fn read_number<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = optional(section, key) {
        *target = value.parse().map_err(|_| ConfigError::InvalidValue {
            key: format!("{}.{}", section_name, key),
            value,
        })?;
    }
    Ok(())
}

/// Settings consumed by the discovery controller.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    pub default_city: String,
    pub items_per_page: usize,
    pub markers_per_page: usize,
    /// Clamped to 300-400 ms by the debouncer.
    pub debounce: Duration,
    pub selection: SelectionConfig,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            default_city: DEFAULT_CITY.to_string(),
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            markers_per_page: DEFAULT_MARKERS_PER_PAGE,
            debounce: DEFAULT_DEBOUNCE,
            selection: SelectionConfig::default(),
        }
    }
}

impl DiscoveryConfig {
    pub fn with_default_city(mut self, city: impl Into<String>) -> Self {
        self.default_city = city.into();
        self
    }

    pub fn with_page_sizes(mut self, items_per_page: usize, markers_per_page: usize) -> Self {
        self.items_per_page = items_per_page;
        self.markers_per_page = markers_per_page;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_scroll_retry_delay(mut self, delay: Duration) -> Self {
        self.selection.scroll_retry_delay = delay;
        self
    }
}
