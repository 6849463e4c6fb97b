//! Geographic primitives shared by the discovery engine.
//!
//! Coordinates are WGS84 degrees. Every coordinate that leaves this module is
//! finite; payloads that cannot be parsed resolve to [`DEFAULT_COORDINATE`]
//! instead of being dropped (see [`resolver`]).

pub mod resolver;

pub use resolver::{
    centroid, parse_point, parse_point_value, parse_polygon, parse_polygon_value,
    try_parse_point,
};

/// Fallback coordinate for entities whose location payload is unusable.
///
/// This is the national centroid the map opens on before any city is chosen.
pub const DEFAULT_COORDINATE: LatLon = LatLon {
    lat: 30.3753,
    lon: 69.3451,
};

/// Camera span (degrees) used when focusing a single tapped marker.
pub const MARKER_FOCUS_SPAN: f64 = 0.01;

/// Camera span (degrees) used when focusing a card from the list.
pub const CARD_OVERVIEW_SPAN: f64 = 0.05;

/// Span (degrees) of the viewport opened on a freshly selected city.
pub const CITY_SPAN: f64 = 0.2;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    /// Create a coordinate without validation.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Create a coordinate if both components are finite and in range.
    pub fn checked(lat: f64, lon: f64) -> Option<Self> {
        let point = Self { lat, lon };
        point.is_valid().then_some(point)
    }

    /// True when both components are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Cache key with the coordinate rounded to four decimals (~11 m).
    pub fn rounded_key(&self) -> String {
        format!("{:.4},{:.4}", self.lat, self.lon)
    }
}

impl std::fmt::Display for LatLon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    /// Minimum (southernmost) latitude
    pub min_lat: f64,
    /// Maximum (northernmost) latitude
    pub max_lat: f64,
    /// Minimum (westernmost) longitude
    pub min_lon: f64,
    /// Maximum (easternmost) longitude
    pub max_lon: f64,
}

impl GeoBounds {
    /// Create a new bounding box.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: LatLon) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

/// The rectangular region currently visible on the map.
///
/// Field names follow the listing API's query parameters
/// (`latitude`, `longitude`, `latitudeDelta`, `longitudeDelta`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: LatLon,
    pub lat_span: f64,
    pub lon_span: f64,
}

impl Viewport {
    /// Create a viewport centred on `center` with the given spans.
    ///
    /// Negative spans are treated as their absolute value.
    pub fn new(center: LatLon, lat_span: f64, lon_span: f64) -> Self {
        Self {
            center,
            lat_span: lat_span.abs(),
            lon_span: lon_span.abs(),
        }
    }

    /// Square viewport of `span` degrees around `center`.
    pub fn around(center: LatLon, span: f64) -> Self {
        Self::new(center, span, span)
    }

    /// `[center ± span/2]` on both axes.
    pub fn bounds(&self) -> GeoBounds {
        let half_lat = self.lat_span / 2.0;
        let half_lon = self.lon_span / 2.0;
        GeoBounds::new(
            self.center.lat - half_lat,
            self.center.lat + half_lat,
            self.center.lon - half_lon,
            self.center.lon + half_lon,
        )
    }

    /// True when `point` lies inside (or on the edge of) the viewport.
    pub fn contains(&self, point: LatLon) -> bool {
        self.bounds().contains(point)
    }

    /// Listing-query parameters describing this viewport.
    pub fn query_params(&self) -> [(&'static str, String); 4] {
        [
            ("latitude", self.center.lat.to_string()),
            ("longitude", self.center.lon.to_string()),
            ("latitudeDelta", self.lat_span.to_string()),
            ("longitudeDelta", self.lon_span.to_string()),
        ]
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::around(DEFAULT_COORDINATE, CITY_SPAN)
    }
}
