//! Common types and utilities shared across CLI commands.

use clap::ValueEnum;
use mapfolio::config::ConfigFile;
use mapfolio::display::{EntityTypeMode, PropertySubMode};
use mapfolio::provider::{
    CachedPlaces, GooglePlacesService, HttpListingService, ReqwestClient, StaticToken,
};
use tokio::runtime::Runtime;

use crate::error::CliError;

/// Listing service as configured in `[listing]`.
pub type ConfiguredListings = HttpListingService<ReqwestClient, StaticToken>;

/// Geocoding service as configured in `[geocoding]`.
pub type ConfiguredPlaces = CachedPlaces<GooglePlacesService<ReqwestClient>>;

/// Entity type selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum EntityTypeArg {
    /// Properties and projects
    Both,
    /// Point properties only
    Properties,
    /// Polygon projects only
    Projects,
}

impl From<EntityTypeArg> for EntityTypeMode {
    fn from(arg: EntityTypeArg) -> Self {
        match arg {
            EntityTypeArg::Both => EntityTypeMode::Both,
            EntityTypeArg::Properties => EntityTypeMode::Properties,
            EntityTypeArg::Projects => EntityTypeMode::Projects,
        }
    }
}

/// Property purpose selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PurposeArg {
    /// For sale and for rent
    Both,
    /// For sale only
    Sale,
    /// For rent only
    Rent,
}

impl From<PurposeArg> for PropertySubMode {
    fn from(arg: PurposeArg) -> Self {
        match arg {
            PurposeArg::Both => PropertySubMode::Both,
            PurposeArg::Sale => PropertySubMode::ForSale,
            PurposeArg::Rent => PropertySubMode::ForRent,
        }
    }
}

/// Single-threaded runtime for one command.
pub fn build_runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))
}

/// Build the listing service from config.
pub fn listing_service(config: &ConfigFile) -> Result<ConfiguredListings, CliError> {
    let client = ReqwestClient::with_timeout(config.listing.timeout_secs)?;
    Ok(HttpListingService::new(
        client,
        StaticToken(config.listing_token()),
        &config.listing.base_url,
        &config.listing.path,
    ))
}

/// Build the geocoding service from config. Requires `geocoding.api_key`.
pub fn places_service(config: &ConfigFile) -> Result<ConfiguredPlaces, CliError> {
    let geocoding = &config.geocoding;
    let api_key = geocoding.api_key.clone().ok_or_else(|| {
        CliError::Config(
            "Geocoding requires an API key. Set api_key in the [geocoding] section of config.ini"
                .to_string(),
        )
    })?;

    let places = GooglePlacesService::new(ReqwestClient::new()?, api_key)
        .with_base_url(geocoding.base_url.clone())
        .with_country(geocoding.country.clone())
        .with_place_types(geocoding.place_types.clone());
    Ok(CachedPlaces::new(places, geocoding.reverse_cache_entries))
}

/// Geocoding service for commands where lookups are optional.
///
/// Without an API key every lookup fails with a server error and no request
/// is sent; the discovery screen treats that like any other lookup failure.
pub fn optional_places_service(config: &ConfigFile) -> Result<ConfiguredPlaces, CliError> {
    if config.geocoding.api_key.is_some() {
        return places_service(config);
    }
    tracing::debug!("No geocoding API key configured; place lookups disabled");
    let places = GooglePlacesService::new(ReqwestClient::new()?, "");
    Ok(CachedPlaces::new(places, config.geocoding.reverse_cache_entries))
}
