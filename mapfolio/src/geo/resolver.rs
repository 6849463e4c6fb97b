//! Normalization of raw location payloads into geometry.
//!
//! The listing API is loose about how it encodes locations. A point may arrive
//! as an object (`{"lat": .., "lng": ..}` or `{"latitude": .., "longitude": ..}`,
//! numbers or numeric strings), as a `[lat, lon]` pair, as a `"lat,lon"` string,
//! or as any of those JSON-encoded inside a string. Polygons are arrays of such
//! vertices, optionally JSON-encoded as well.
//!
//! Nothing here returns an error to the caller: points fail closed to
//! [`DEFAULT_COORDINATE`] and polygons to an empty vertex list.

use serde_json::Value;
use tracing::debug;

use super::{LatLon, DEFAULT_COORDINATE};
use crate::error::DiscoveryError;

const LAT_KEYS: [&str; 2] = ["lat", "latitude"];
const LON_KEYS: [&str; 4] = ["lng", "lon", "long", "longitude"];

/// Parse a single-point payload, falling back to the default coordinate.
pub fn parse_point(raw: &str) -> LatLon {
    match try_parse_point(raw) {
        Ok(point) => point,
        Err(e) => {
            debug!(error = %e, "Point payload unusable, using default coordinate");
            DEFAULT_COORDINATE
        }
    }
}

/// Parse a single-point payload, reporting why it could not be used.
pub fn try_parse_point(raw: &str) -> Result<LatLon, DiscoveryError> {
    point_from_str(raw, true)
}

/// [`parse_point`] for a payload that has already been decoded as JSON.
pub fn parse_point_value(value: &Value) -> Option<LatLon> {
    point_from_value(value, true).ok()
}

/// Parse a vertex array. Invalid vertices are dropped individually; a payload
/// that is not an array at all yields an empty sequence.
pub fn parse_polygon(raw: &str) -> Vec<LatLon> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => polygon_from_value(&value, true),
        Err(e) => {
            debug!(error = %e, "Polygon payload is not JSON");
            Vec::new()
        }
    }
}

/// [`parse_polygon`] for a payload that has already been decoded as JSON.
pub fn parse_polygon_value(value: &Value) -> Vec<LatLon> {
    polygon_from_value(value, true)
}

/// Arithmetic mean of the vertices, or the default coordinate when empty.
pub fn centroid(vertices: &[LatLon]) -> LatLon {
    if vertices.is_empty() {
        return DEFAULT_COORDINATE;
    }

    let n = vertices.len() as f64;
    let (lat_sum, lon_sum) = vertices
        .iter()
        .fold((0.0, 0.0), |(lat, lon), v| (lat + v.lat, lon + v.lon));

    LatLon::new(lat_sum / n, lon_sum / n)
}

fn point_from_str(raw: &str, allow_nested: bool) -> Result<LatLon, DiscoveryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(geometry("empty point payload"));
    }

    match serde_json::from_str::<Value>(trimmed) {
        // A bare number decodes fine as JSON but is never a point.
        Ok(value) if !value.is_number() => point_from_value(&value, allow_nested),
        _ => point_from_pair_str(trimmed),
    }
}

fn point_from_value(value: &Value, allow_nested: bool) -> Result<LatLon, DiscoveryError> {
    match value {
        Value::Object(map) => {
            let lat = LAT_KEYS
                .iter()
                .find_map(|k| map.get(*k))
                .and_then(number)
                .ok_or_else(|| geometry("missing latitude"))?;
            let lon = LON_KEYS
                .iter()
                .find_map(|k| map.get(*k))
                .and_then(number)
                .ok_or_else(|| geometry("missing longitude"))?;
            checked(lat, lon)
        }
        Value::Array(items) if items.len() == 2 => {
            let lat = number(&items[0]).ok_or_else(|| geometry("latitude is not numeric"))?;
            let lon = number(&items[1]).ok_or_else(|| geometry("longitude is not numeric"))?;
            checked(lat, lon)
        }
        Value::String(inner) if allow_nested => point_from_str(inner, false),
        Value::String(inner) => point_from_pair_str(inner),
        _ => Err(geometry("unsupported point shape")),
    }
}

fn point_from_pair_str(raw: &str) -> Result<LatLon, DiscoveryError> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| geometry("point is not JSON or a lat,lon pair"))?;
    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|_| geometry("latitude is not numeric"))?;
    let lon = lon
        .trim()
        .parse::<f64>()
        .map_err(|_| geometry("longitude is not numeric"))?;
    checked(lat, lon)
}

fn polygon_from_value(value: &Value, allow_nested: bool) -> Vec<LatLon> {
    match value {
        Value::Array(items) => {
            let vertices: Vec<LatLon> = items
                .iter()
                .filter_map(|item| point_from_value(item, false).ok())
                .collect();
            if vertices.len() < items.len() {
                debug!(
                    dropped = items.len() - vertices.len(),
                    kept = vertices.len(),
                    "Dropped invalid polygon vertices"
                );
            }
            vertices
        }
        Value::String(inner) if allow_nested => match serde_json::from_str::<Value>(inner) {
            Ok(decoded) => polygon_from_value(&decoded, false),
            Err(e) => {
                debug!(error = %e, "Encoded polygon payload is not JSON");
                Vec::new()
            }
        },
        _ => Vec::new(),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn checked(lat: f64, lon: f64) -> Result<LatLon, DiscoveryError> {
    LatLon::checked(lat, lon).ok_or_else(|| geometry("coordinate is not finite or out of range"))
}

fn geometry(reason: &str) -> DiscoveryError {
    DiscoveryError::Geometry(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    mod points {
        use super::*;

        #[test]
        fn test_lat_lng_object() {
            let point = parse_point(r#"{"lat": 31.52, "lng": 74.35}"#);
            assert_eq!(point, LatLon::new(31.52, 74.35));
        }

        #[test]
        fn test_latitude_longitude_strings() {
            let point = parse_point(r#"{"latitude": "24.86", "longitude": "67.01"}"#);
            assert_eq!(point, LatLon::new(24.86, 67.01));
        }

        #[test]
        fn test_pair_array() {
            assert_eq!(parse_point("[33.68, 73.04]"), LatLon::new(33.68, 73.04));
        }

        #[test]
        fn test_comma_separated_pair() {
            assert_eq!(parse_point("33.68, 73.04"), LatLon::new(33.68, 73.04));
        }

        #[test]
        fn test_double_encoded_object() {
            let raw = json!(r#"{"lat": 31.5, "lng": 74.3}"#).to_string();
            assert_eq!(parse_point(&raw), LatLon::new(31.5, 74.3));
        }

        #[test]
        fn test_invalid_json_falls_back() {
            assert_eq!(parse_point("{not json"), DEFAULT_COORDINATE);
            assert_eq!(parse_point(""), DEFAULT_COORDINATE);
            assert_eq!(parse_point("42"), DEFAULT_COORDINATE);
        }

        #[test]
        fn test_out_of_range_falls_back() {
            assert_eq!(parse_point(r#"{"lat": 500, "lng": 74.3}"#), DEFAULT_COORDINATE);
        }

        #[test]
        fn test_non_numeric_string_falls_back() {
            assert_eq!(parse_point(r#"{"lat": "NaN", "lng": 1}"#), DEFAULT_COORDINATE);
        }

        #[test]
        fn test_try_parse_reports_geometry_error() {
            let err = try_parse_point(r#"{"lat": 1}"#).unwrap_err();
            assert!(matches!(err, DiscoveryError::Geometry(_)));
        }

        #[test]
        fn test_parse_point_value() {
            assert_eq!(
                parse_point_value(&json!({"lat": 1.0, "lon": 2.0})),
                Some(LatLon::new(1.0, 2.0))
            );
            assert_eq!(parse_point_value(&json!(null)), None);
        }
    }

    mod polygons {
        use super::*;

        #[test]
        fn test_vertex_array() {
            let vertices = parse_polygon(r#"[{"lat":1,"lng":2},{"lat":3,"lng":4},[5,6]]"#);
            assert_eq!(
                vertices,
                vec![
                    LatLon::new(1.0, 2.0),
                    LatLon::new(3.0, 4.0),
                    LatLon::new(5.0, 6.0)
                ]
            );
        }

        #[test]
        fn test_drops_individual_invalid_vertices() {
            let vertices =
                parse_polygon(r#"[{"lat":1,"lng":2},{"lat":"x","lng":4},{"lat":3,"lng":999}]"#);
            assert_eq!(vertices, vec![LatLon::new(1.0, 2.0)]);
        }

        #[test]
        fn test_malformed_json_is_empty() {
            assert!(parse_polygon("[{\"lat\":1,").is_empty());
            assert!(parse_polygon("garbage").is_empty());
        }

        #[test]
        fn test_non_array_is_empty() {
            assert!(parse_polygon(r#"{"lat":1,"lng":2}"#).is_empty());
        }

        #[test]
        fn test_double_encoded_polygon() {
            let raw = json!(r#"[[1,2],[3,4],[5,6]]"#).to_string();
            assert_eq!(parse_polygon(&raw).len(), 3);
            assert_eq!(parse_polygon(&raw), parse_polygon_value(&json!(r#"[[1,2],[3,4],[5,6]]"#)));
        }

        #[test]
        fn test_encoded_polygon_value() {
            let value = json!(r#"[[1,2],[3,4],[5,6]]"#);
            assert_eq!(parse_polygon_value(&value).len(), 3);
        }
    }

    mod centroids {
        use super::*;

        #[test]
        fn test_empty_is_default() {
            assert_eq!(centroid(&[]), DEFAULT_COORDINATE);
        }

        #[test]
        fn test_square_centroid() {
            let square = [
                LatLon::new(0.0, 0.0),
                LatLon::new(0.0, 2.0),
                LatLon::new(2.0, 2.0),
                LatLon::new(2.0, 0.0),
            ];
            assert_eq!(centroid(&square), LatLon::new(1.0, 1.0));
        }

        #[test]
        fn test_single_vertex() {
            let p = LatLon::new(31.5, 74.3);
            assert_eq!(centroid(&[p]), p);
        }
    }

    proptest! {
        #[test]
        fn prop_centroid_is_arithmetic_mean(
            coords in prop::collection::vec((-90.0f64..90.0, -180.0f64..180.0), 1..40)
        ) {
            let vertices: Vec<LatLon> = coords.iter().map(|(a, b)| LatLon::new(*a, *b)).collect();
            let c = centroid(&vertices);
            let n = vertices.len() as f64;
            let mean_lat = coords.iter().map(|(a, _)| a).sum::<f64>() / n;
            let mean_lon = coords.iter().map(|(_, b)| b).sum::<f64>() / n;
            prop_assert!((c.lat - mean_lat).abs() < 1e-9);
            prop_assert!((c.lon - mean_lon).abs() < 1e-9);
        }

        #[test]
        fn prop_parse_polygon_never_panics(raw in ".*") {
            let vertices = parse_polygon(&raw);
            prop_assert!(vertices.iter().all(LatLon::is_valid));
        }
    }
}
