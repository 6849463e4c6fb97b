//! Display modes and dataset filtering.
//!
//! Three independent one-of-N toggles cycle on repeated invocation. Entity-type
//! mode and property sub-mode filter the dataset; map presentation is
//! rendering-only. Filtering always recomputes from the catalog's two source
//! collections, never from a previously filtered list.

use crate::entity::{EntityCatalog, GeoEntity, ListingPurpose};

/// Which entity kinds are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityTypeMode {
    #[default]
    Both,
    Properties,
    Projects,
}

impl EntityTypeMode {
    /// both → properties → projects → both
    pub fn next(self) -> Self {
        match self {
            EntityTypeMode::Both => EntityTypeMode::Properties,
            EntityTypeMode::Properties => EntityTypeMode::Projects,
            EntityTypeMode::Projects => EntityTypeMode::Both,
        }
    }

    pub fn shows_properties(self) -> bool {
        matches!(self, EntityTypeMode::Both | EntityTypeMode::Properties)
    }

    pub fn shows_projects(self) -> bool {
        matches!(self, EntityTypeMode::Both | EntityTypeMode::Projects)
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityTypeMode::Both => "Both",
            EntityTypeMode::Properties => "Properties",
            EntityTypeMode::Projects => "Projects",
        }
    }
}

/// Which property purposes are shown. Projects are unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertySubMode {
    #[default]
    Both,
    ForSale,
    ForRent,
}

impl PropertySubMode {
    /// both → for sale → for rent → both
    pub fn next(self) -> Self {
        match self {
            PropertySubMode::Both => PropertySubMode::ForSale,
            PropertySubMode::ForSale => PropertySubMode::ForRent,
            PropertySubMode::ForRent => PropertySubMode::Both,
        }
    }

    /// A property without a known purpose only passes in `Both`.
    pub fn admits(self, purpose: Option<ListingPurpose>) -> bool {
        match self {
            PropertySubMode::Both => true,
            PropertySubMode::ForSale => purpose == Some(ListingPurpose::ForSale),
            PropertySubMode::ForRent => purpose == Some(ListingPurpose::ForRent),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PropertySubMode::Both => "Both",
            PropertySubMode::ForSale => "For Sale",
            PropertySubMode::ForRent => "For Rent",
        }
    }
}

/// Base map style. Rendering only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapPresentation {
    #[default]
    Standard,
    Satellite,
    Hybrid,
}

impl MapPresentation {
    /// standard → satellite → hybrid → standard
    pub fn next(self) -> Self {
        match self {
            MapPresentation::Standard => MapPresentation::Satellite,
            MapPresentation::Satellite => MapPresentation::Hybrid,
            MapPresentation::Hybrid => MapPresentation::Standard,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MapPresentation::Standard => "Standard",
            MapPresentation::Satellite => "Satellite",
            MapPresentation::Hybrid => "Hybrid",
        }
    }
}

/// The current filter inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayModes {
    pub entity_type: EntityTypeMode,
    pub sub_mode: PropertySubMode,
    pub presentation: MapPresentation,
    pub search_text: String,
}

impl DisplayModes {
    /// Apply the filter to a catalog.
    ///
    /// Output order is properties then projects, each in source order.
    pub fn filter(&self, catalog: &EntityCatalog) -> Vec<GeoEntity> {
        filter_catalog(catalog, self.entity_type, self.sub_mode, &self.search_text)
    }
}

/// Type, sub-mode and free-text filter over the two source collections.
pub fn filter_catalog(
    catalog: &EntityCatalog,
    entity_type: EntityTypeMode,
    sub_mode: PropertySubMode,
    search_text: &str,
) -> Vec<GeoEntity> {
    let needle = search_text.trim().to_lowercase();

    let properties = catalog
        .properties()
        .iter()
        .filter(|_| entity_type.shows_properties())
        .filter(|p| sub_mode.admits(p.purpose))
        .cloned()
        .map(GeoEntity::Point);
    let projects = catalog
        .projects()
        .iter()
        .filter(|_| entity_type.shows_projects())
        .cloned()
        .map(GeoEntity::Area);

    properties
        .chain(projects)
        .filter(|entity| entity.matches_search(&needle))
        .collect()
}
