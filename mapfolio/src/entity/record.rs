//! Raw listing-API records and their conversion to entities.
//!
//! Records are decoded one at a time so a single malformed record cannot take
//! the rest of the response down with it. Unusable locations and oddly typed
//! fields never drop a record; only a record that is not an object or has no
//! usable id is skipped, since it cannot be keyed.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{AreaEntity, EntityCatalog, ListingPurpose, PointEntity};
use crate::error::{DiscoveryError, FetchError};
use crate::geo::{parse_point_value, parse_polygon_value, LatLon, DEFAULT_COORDINATE};

/// Body of a listing query response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingResponse {
    #[serde(default)]
    pub properties: Vec<Value>,
    #[serde(default)]
    pub projects: Vec<Value>,
}

type Fields = serde_json::Map<String, Value>;

/// A property record as the listing API sends it.
///
/// Field names vary between backend versions; each field is looked up under
/// its known names in order, so a record carrying both `title` and `name`
/// takes `title`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    pub id: Value,
    pub title: Option<String>,
    pub city: Option<String>,
    pub purpose: Option<String>,
    pub price: Option<Value>,
    pub location: Option<Value>,
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
}

/// A project record as the listing API sends it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub id: Value,
    pub name: Option<String>,
    pub city: Option<String>,
    pub polygon: Option<Value>,
}

impl PropertyRecord {
    /// Read a record from one element of the `properties` array. Only a
    /// non-object element is rejected.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let map = raw.as_object()?;
        Some(Self {
            id: map.get("id").cloned().unwrap_or(Value::Null),
            title: text(map, &["title", "name"]),
            city: text(map, &["city"]),
            purpose: text(map, &["purpose", "type", "listing_type"]),
            price: field(map, &["price"]),
            location: field(map, &["location", "coordinates", "geo"]),
            latitude: field(map, &["latitude", "lat"]),
            longitude: field(map, &["longitude", "lng", "lon"]),
        })
    }
}

impl ProjectRecord {
    /// Read a record from one element of the `projects` array.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let map = raw.as_object()?;
        Some(Self {
            id: map.get("id").cloned().unwrap_or(Value::Null),
            name: text(map, &["name", "title"]),
            city: text(map, &["city"]),
            polygon: field(map, &["polygon", "coordinates", "boundary"]),
        })
    }
}

impl ListingResponse {
    /// Decode a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, DiscoveryError> {
        serde_json::from_slice(body)
            .map_err(|e| DiscoveryError::from(FetchError::Decode(e.to_string())))
    }

    /// Convert every decodable record into the merged catalog.
    pub fn into_catalog(self) -> EntityCatalog {
        let properties: Vec<PointEntity> = self
            .properties
            .iter()
            .filter_map(|raw| decode(raw, "property", PropertyRecord::from_value))
            .filter_map(|record| PointEntity::try_from(record).ok())
            .collect();
        let projects: Vec<AreaEntity> = self
            .projects
            .iter()
            .filter_map(|raw| decode(raw, "project", ProjectRecord::from_value))
            .filter_map(|record| AreaEntity::try_from(record).ok())
            .collect();

        let defaulted = properties.iter().filter(|p| p.location_defaulted()).count();
        let flat = projects.iter().filter(|a| !a.is_renderable_polygon()).count();
        debug!(
            properties = properties.len(),
            projects = projects.len(),
            defaulted_locations = defaulted,
            non_polygon_projects = flat,
            "Built entity catalog"
        );

        EntityCatalog::new(properties, projects)
    }
}

fn decode<T>(raw: &Value, what: &str, read: fn(&Value) -> Option<T>) -> Option<T> {
    let record = read(raw);
    if record.is_none() {
        warn!(record = what, "Skipping listing record that is not an object");
    }
    record
}

/// First non-null value under any of `keys`.
fn field(map: &Fields, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
        .cloned()
}

/// First value under any of `keys` that reads as non-empty text. Numbers and
/// booleans are rendered as text.
fn text(map: &Fields, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| map.get(*k)).find_map(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Ids arrive as numbers or strings; anything else cannot key an entity.
fn id_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    let parsed: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

impl PropertyRecord {
    fn location(&self) -> Option<LatLon> {
        if let Some(point) = self.location.as_ref().and_then(parse_point_value) {
            return Some(point);
        }
        let lat = self.latitude.as_ref().and_then(number)?;
        let lon = self.longitude.as_ref().and_then(number)?;
        LatLon::checked(lat, lon)
    }
}

impl TryFrom<PropertyRecord> for PointEntity {
    type Error = DiscoveryError;

    fn try_from(record: PropertyRecord) -> Result<Self, Self::Error> {
        let id = id_string(&record.id).ok_or_else(|| {
            warn!(id = %record.id, "Skipping property without usable id");
            DiscoveryError::NotFound("property id".to_string())
        })?;

        let point = record.location();
        let name = record.title.clone().unwrap_or_else(|| format!("Property {}", id));
        let mut entity = PointEntity::new(id, name, point.unwrap_or(DEFAULT_COORDINATE));
        if point.is_none() {
            debug!(id = %entity.id, "Property location unusable, using default coordinate");
            entity = entity.with_defaulted_location();
        }
        if let Some(city) = record.city {
            entity = entity.with_city(city);
        }
        if let Some(purpose) = record.purpose.as_deref().and_then(ListingPurpose::parse) {
            entity = entity.with_purpose(purpose);
        }
        if let Some(price) = record.price.as_ref().and_then(number) {
            entity = entity.with_price(price);
        }
        Ok(entity)
    }
}

impl TryFrom<ProjectRecord> for AreaEntity {
    type Error = DiscoveryError;

    fn try_from(record: ProjectRecord) -> Result<Self, Self::Error> {
        let id = id_string(&record.id).ok_or_else(|| {
            warn!(id = %record.id, "Skipping project without usable id");
            DiscoveryError::NotFound("project id".to_string())
        })?;

        let vertices = record
            .polygon
            .as_ref()
            .map(parse_polygon_value)
            .unwrap_or_default();
        let name = record.name.unwrap_or_else(|| format!("Project {}", id));
        let mut entity = AreaEntity::new(id, name, vertices);
        if let Some(city) = record.city {
            entity = entity.with_city(city);
        }
        Ok(entity)
    }
}
