//! Geo-located listing entities.
//!
//! A listing is either a point property or a polygon-shaped project. Both are
//! carried behind [`GeoEntity`], an exhaustive tagged union; rendering and
//! lookup code matches on it instead of checking a kind string.
//!
//! Plain ids are only unique within one kind. Everything that looks up,
//! selects or diffs entities uses the composite [`EntityKey`].

mod record;

pub use record::{ListingResponse, ProjectRecord, PropertyRecord};

use std::fmt;
use std::sync::Arc;

use crate::geo::{centroid, LatLon};

/// Minimum number of vertices for an area to be drawn as a polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Which variant of [`GeoEntity`] a key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// A point property.
    Point,
    /// A polygon project.
    Area,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Point => "point",
            EntityKind::Area => "area",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite identity `(kind, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn point(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Point, id)
    }

    pub fn area(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Area, id)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Whether a property is offered for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingPurpose {
    ForSale,
    ForRent,
}

impl ListingPurpose {
    /// Lowercase label, also used for free-text search.
    pub fn label(&self) -> &'static str {
        match self {
            ListingPurpose::ForSale => "for sale",
            ListingPurpose::ForRent => "for rent",
        }
    }

    /// Parse the purpose strings the listing API uses.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "sale" | "forsale" | "sell" | "buy" => Some(ListingPurpose::ForSale),
            "rent" | "forrent" | "rental" | "lease" => Some(ListingPurpose::ForRent),
            _ => None,
        }
    }
}

/// A point property.
#[derive(Debug, Clone, PartialEq)]
pub struct PointEntity {
    pub id: String,
    pub name: String,
    pub city: Option<String>,
    pub purpose: Option<ListingPurpose>,
    pub price: Option<f64>,
    pub point: LatLon,
    location_defaulted: bool,
}

impl PointEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, point: LatLon) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            city: None,
            purpose: None,
            price: None,
            point,
            location_defaulted: false,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_purpose(mut self, purpose: ListingPurpose) -> Self {
        self.purpose = Some(purpose);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Mark the coordinate as the fallback default rather than parsed data.
    pub(crate) fn with_defaulted_location(mut self) -> Self {
        self.location_defaulted = true;
        self
    }

    /// True when the payload's location was unusable.
    pub fn location_defaulted(&self) -> bool {
        self.location_defaulted
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::point(self.id.clone())
    }
}

/// A polygon project.
///
/// The centroid is computed once from the vertices at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaEntity {
    pub id: String,
    pub name: String,
    pub city: Option<String>,
    vertices: Vec<LatLon>,
    centroid: LatLon,
}

impl AreaEntity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, vertices: Vec<LatLon>) -> Self {
        let centroid = centroid(&vertices);
        Self {
            id: id.into(),
            name: name.into(),
            city: None,
            vertices,
            centroid,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn vertices(&self) -> &[LatLon] {
        &self.vertices
    }

    pub fn centroid(&self) -> LatLon {
        self.centroid
    }

    /// True when the area has enough vertices to be drawn as a polygon.
    pub fn is_renderable_polygon(&self) -> bool {
        self.vertices.len() >= MIN_POLYGON_VERTICES
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::area(self.id.clone())
    }
}

/// A listing on the map: a point property or a polygon project.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoEntity {
    Point(Arc<PointEntity>),
    Area(Arc<AreaEntity>),
}

impl GeoEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            GeoEntity::Point(_) => EntityKind::Point,
            GeoEntity::Area(_) => EntityKind::Area,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            GeoEntity::Point(p) => &p.id,
            GeoEntity::Area(a) => &a.id,
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.kind(), self.id())
    }

    /// True when this entity has the given composite key.
    pub fn has_key(&self, key: &EntityKey) -> bool {
        self.kind() == key.kind && self.id() == key.id
    }

    pub fn name(&self) -> &str {
        match self {
            GeoEntity::Point(p) => &p.name,
            GeoEntity::Area(a) => &a.name,
        }
    }

    pub fn city(&self) -> Option<&str> {
        match self {
            GeoEntity::Point(p) => p.city.as_deref(),
            GeoEntity::Area(a) => a.city.as_deref(),
        }
    }

    /// Coordinate used for marker placement and viewport containment.
    pub fn representative_point(&self) -> LatLon {
        match self {
            GeoEntity::Point(p) => p.point,
            GeoEntity::Area(a) => a.centroid(),
        }
    }

    /// Polygon outline, if this is an area with enough vertices to draw.
    pub fn polygon(&self) -> Option<&[LatLon]> {
        match self {
            GeoEntity::Point(_) => None,
            GeoEntity::Area(a) if a.is_renderable_polygon() => Some(a.vertices()),
            GeoEntity::Area(_) => None,
        }
    }

    /// Case-insensitive substring match. `needle` must already be lowercase.
    ///
    /// Properties match on name, city and purpose label; projects on name.
    pub fn matches_search(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        match self {
            GeoEntity::Point(p) => {
                p.name.to_lowercase().contains(needle)
                    || p
                        .city
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(needle))
                    || p.purpose.is_some_and(|purpose| purpose.label().contains(needle))
            }
            GeoEntity::Area(a) => a.name.to_lowercase().contains(needle),
        }
    }
}

impl From<PointEntity> for GeoEntity {
    fn from(entity: PointEntity) -> Self {
        GeoEntity::Point(Arc::new(entity))
    }
}

impl From<AreaEntity> for GeoEntity {
    fn from(entity: AreaEntity) -> Self {
        GeoEntity::Area(Arc::new(entity))
    }
}

/// The two source collections a screen filters from.
///
/// A catalog is rebuilt on every load and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityCatalog {
    properties: Vec<Arc<PointEntity>>,
    projects: Vec<Arc<AreaEntity>>,
}

impl EntityCatalog {
    pub fn new(properties: Vec<PointEntity>, projects: Vec<AreaEntity>) -> Self {
        Self {
            properties: properties.into_iter().map(Arc::new).collect(),
            projects: projects.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn properties(&self) -> &[Arc<PointEntity>] {
        &self.properties
    }

    pub fn projects(&self) -> &[Arc<AreaEntity>] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.properties.len() + self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Properties first, then projects, each in source order.
    pub fn merged(&self) -> Vec<GeoEntity> {
        self.properties
            .iter()
            .cloned()
            .map(GeoEntity::Point)
            .chain(self.projects.iter().cloned().map(GeoEntity::Area))
            .collect()
    }

    /// Find an entity by composite key.
    pub fn find(&self, key: &EntityKey) -> Option<GeoEntity> {
        match key.kind {
            EntityKind::Point => self
                .properties
                .iter()
                .find(|p| p.id == key.id)
                .cloned()
                .map(GeoEntity::Point),
            EntityKind::Area => self
                .projects
                .iter()
                .find(|a| a.id == key.id)
                .cloned()
                .map(GeoEntity::Area),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::DEFAULT_COORDINATE;

    fn triangle() -> Vec<LatLon> {
        vec![
            LatLon::new(0.0, 0.0),
            LatLon::new(0.0, 3.0),
            LatLon::new(3.0, 0.0),
        ]
    }

    #[test]
    fn test_key_display() {
        assert_eq!(EntityKey::point("12").to_string(), "point:12");
        assert_eq!(EntityKey::area("12").to_string(), "area:12");
    }

    #[test]
    fn test_same_id_different_kind_are_distinct() {
        let catalog = EntityCatalog::new(
            vec![PointEntity::new("7", "House", LatLon::new(1.0, 1.0))],
            vec![AreaEntity::new("7", "Township", triangle())],
        );
        let point = catalog.find(&EntityKey::point("7")).unwrap();
        let area = catalog.find(&EntityKey::area("7")).unwrap();
        assert_eq!(point.name(), "House");
        assert_eq!(area.name(), "Township");
        assert_ne!(point.key(), area.key());
    }

    #[test]
    fn test_area_representative_point_is_centroid() {
        let entity = GeoEntity::from(AreaEntity::new("1", "Estate", triangle()));
        assert_eq!(entity.representative_point(), LatLon::new(1.0, 1.0));
    }

    #[test]
    fn test_two_vertex_area_has_no_polygon_but_has_point() {
        let area = AreaEntity::new(
            "1",
            "Strip",
            vec![LatLon::new(1.0, 1.0), LatLon::new(3.0, 3.0)],
        );
        let entity = GeoEntity::from(area);
        assert!(entity.polygon().is_none());
        assert_eq!(entity.representative_point(), LatLon::new(2.0, 2.0));
    }

    #[test]
    fn test_empty_area_uses_default_coordinate() {
        let entity = GeoEntity::from(AreaEntity::new("1", "Unknown", vec![]));
        assert_eq!(entity.representative_point(), DEFAULT_COORDINATE);
    }

    #[test]
    fn test_merged_order_properties_then_projects() {
        let catalog = EntityCatalog::new(
            vec![
                PointEntity::new("a", "A", LatLon::new(1.0, 1.0)),
                PointEntity::new("b", "B", LatLon::new(1.0, 1.0)),
            ],
            vec![AreaEntity::new("c", "C", triangle())],
        );
        let ids: Vec<_> = catalog.merged().iter().map(|e| e.key().to_string()).collect();
        assert_eq!(ids, vec!["point:a", "point:b", "area:c"]);
    }

    mod search {
        use super::*;

        #[test]
        fn test_property_matches_name_city_and_purpose() {
            let entity = GeoEntity::from(
                PointEntity::new("1", "Garden Villa", LatLon::new(1.0, 1.0))
                    .with_city("Lahore")
                    .with_purpose(ListingPurpose::ForRent),
            );
            assert!(entity.matches_search("villa"));
            assert!(entity.matches_search("lahore"));
            assert!(entity.matches_search("for rent"));
            assert!(!entity.matches_search("for sale"));
        }

        #[test]
        fn test_project_matches_name_only() {
            let entity = GeoEntity::from(
                AreaEntity::new("1", "Bahria Greens", triangle()).with_city("Karachi"),
            );
            assert!(entity.matches_search("greens"));
            assert!(!entity.matches_search("karachi"));
        }

        #[test]
        fn test_empty_needle_matches_everything() {
            let entity = GeoEntity::from(AreaEntity::new("1", "X", triangle()));
            assert!(entity.matches_search(""));
        }
    }

    #[test]
    fn test_purpose_parse_variants() {
        assert_eq!(ListingPurpose::parse("Sale"), Some(ListingPurpose::ForSale));
        assert_eq!(ListingPurpose::parse("for_sale"), Some(ListingPurpose::ForSale));
        assert_eq!(ListingPurpose::parse("For Rent"), Some(ListingPurpose::ForRent));
        assert_eq!(ListingPurpose::parse("auction"), None);
    }
}
