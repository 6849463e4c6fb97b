//! Mapfolio - spatial discovery engine for map-and-list listing screens.
//!
//! Listings come in two shapes, point properties and polygon projects. The
//! engine normalises their raw location payloads, filters and paginates the
//! merged set, keeps the map viewport and the card list in sync, and resolves
//! free-text location search through a debounced, cancellation-safe pipeline.
//!
//! The main entry point is [`screen::DiscoveryController`]; the remaining
//! modules are usable on their own.

pub mod config;
pub mod display;
pub mod entity;
pub mod error;
pub mod geo;
pub mod logging;
pub mod pagination;
pub mod provider;
pub mod screen;
pub mod search;
pub mod selection;
pub mod viewport;

pub use error::{DiscoveryError, DiscoveryResult, StatusMessage};
