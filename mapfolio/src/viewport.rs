//! Restriction of the revealed entities to the visible map region.
//!
//! Pure and synchronous. Order is preserved from the upstream filtered list;
//! there is no distance ranking.

use crate::entity::GeoEntity;
use crate::geo::{GeoBounds, LatLon, Viewport};

/// Entities whose representative point lies inside `viewport`.
pub fn filter_viewport(entities: &[GeoEntity], viewport: &Viewport) -> Vec<GeoEntity> {
    let bounds = viewport.bounds();
    entities
        .iter()
        .filter(|entity| bounds.contains(entity.representative_point()))
        .cloned()
        .collect()
}

/// A polygon to draw for a project marker.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonOverlay {
    pub entity: GeoEntity,
    pub vertices: Vec<LatLon>,
}

/// Polygons for the areas among `markers` that have at least three vertices.
pub fn polygon_overlays(markers: &[GeoEntity]) -> Vec<PolygonOverlay> {
    markers
        .iter()
        .filter_map(|entity| {
            entity.polygon().map(|vertices| PolygonOverlay {
                entity: entity.clone(),
                vertices: vertices.to_vec(),
            })
        })
        .collect()
}

/// Margin added around fitted points, as a factor of the span.
pub const FIT_PADDING: f64 = 1.1;

/// Viewport covering every entity with a parsed location, with a
/// [`FIT_PADDING`] margin.
///
/// Spans never drop below `min_span`. Points that fell back to the default
/// coordinate are ignored. Returns `None` when nothing qualifies.
pub fn fit_viewport(entities: &[GeoEntity], min_span: f64) -> Option<Viewport> {
    let mut points = entities.iter().filter_map(|entity| match entity {
        GeoEntity::Point(p) if p.location_defaulted() => None,
        other => Some(other.representative_point()),
    });

    let first = points.next()?;
    let mut bounds = GeoBounds::new(first.lat, first.lat, first.lon, first.lon);
    for p in points {
        bounds.min_lat = bounds.min_lat.min(p.lat);
        bounds.max_lat = bounds.max_lat.max(p.lat);
        bounds.min_lon = bounds.min_lon.min(p.lon);
        bounds.max_lon = bounds.max_lon.max(p.lon);
    }

    Some(Viewport::new(
        bounds.center(),
        ((bounds.max_lat - bounds.min_lat) * FIT_PADDING).max(min_span),
        ((bounds.max_lon - bounds.min_lon) * FIT_PADDING).max(min_span),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{AreaEntity, PointEntity};
    use proptest::prelude::*;

    fn point(id: &str, lat: f64, lon: f64) -> GeoEntity {
        PointEntity::new(id, id, LatLon::new(lat, lon)).into()
    }

    #[test]
    fn test_keeps_only_contained() {
        let entities = vec![
            point("in", 0.5, 0.5),
            point("out", 1.5, 0.5),
            point("edge", 0.75, 0.25),
        ];
        let viewport = Viewport::new(LatLon::new(0.5, 0.5), 0.5, 0.5);
        let ids: Vec<_> = filter_viewport(&entities, &viewport)
            .iter()
            .map(|e| e.id().to_string())
            .collect();
        assert_eq!(ids, vec!["in", "edge"]);
    }

    #[test]
    fn test_order_is_stable() {
        let entities = vec![point("c", 0.3, 0.0), point("a", 0.1, 0.0), point("b", 0.2, 0.0)];
        let viewport = Viewport::around(LatLon::new(0.0, 0.0), 2.0);
        let ids: Vec<_> = filter_viewport(&entities, &viewport)
            .iter()
            .map(|e| e.id().to_string())
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_area_uses_centroid() {
        let area: GeoEntity = AreaEntity::new(
            "1",
            "Estate",
            vec![LatLon::new(-5.0, -5.0), LatLon::new(5.0, 5.0)],
        )
        .into();
        let viewport = Viewport::around(LatLon::new(0.0, 0.0), 1.0);
        assert_eq!(filter_viewport(&[area], &viewport).len(), 1);
    }

    #[test]
    fn test_two_vertex_area_has_marker_but_no_overlay() {
        let strip: GeoEntity = AreaEntity::new(
            "1",
            "Strip",
            vec![LatLon::new(0.0, 0.0), LatLon::new(0.2, 0.2)],
        )
        .into();
        let estate: GeoEntity = AreaEntity::new(
            "2",
            "Estate",
            vec![
                LatLon::new(0.0, 0.0),
                LatLon::new(0.0, 0.3),
                LatLon::new(0.3, 0.0),
            ],
        )
        .into();
        let markers = filter_viewport(
            &[strip, estate, point("p", 0.0, 0.0)],
            &Viewport::around(LatLon::new(0.0, 0.0), 1.0),
        );
        assert_eq!(markers.len(), 3);

        let overlays = polygon_overlays(&markers);
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].entity.id(), "2");
    }

    #[test]
    fn test_fit_covers_all_points() {
        let entities = vec![point("a", 31.0, 74.0), point("b", 32.0, 75.0)];
        let fitted = fit_viewport(&entities, 0.2).unwrap();
        assert_eq!(fitted.center, LatLon::new(31.5, 74.5));
        assert!(fitted.lat_span > 1.0);
        assert!(entities.iter().all(|e| fitted.contains(e.representative_point())));
    }

    #[test]
    fn test_fit_single_point_uses_min_span() {
        let fitted = fit_viewport(&[point("a", 31.5, 74.25)], 0.25).unwrap();
        assert_eq!(fitted, Viewport::around(LatLon::new(31.5, 74.25), 0.25));
    }

    #[test]
    fn test_fit_ignores_defaulted_points() {
        let defaulted: GeoEntity = PointEntity::new("d", "d", crate::geo::DEFAULT_COORDINATE)
            .with_defaulted_location()
            .into();
        assert!(fit_viewport(&[defaulted.clone()], 0.2).is_none());

        let fitted = fit_viewport(&[defaulted, point("a", 31.5, 74.25)], 0.25).unwrap();
        assert_eq!(fitted.center, LatLon::new(31.5, 74.25));
    }

    proptest! {
        #[test]
        fn prop_result_is_contained_subset(
            coords in prop::collection::vec((-60.0f64..60.0, -120.0f64..120.0), 0..50),
            center in (-50.0f64..50.0, -100.0f64..100.0),
            spans in (0.0f64..40.0, 0.0f64..40.0),
        ) {
            let entities: Vec<GeoEntity> = coords
                .iter()
                .enumerate()
                .map(|(i, (lat, lon))| point(&i.to_string(), *lat, *lon))
                .collect();
            let viewport = Viewport::new(LatLon::new(center.0, center.1), spans.0, spans.1);
            let visible = filter_viewport(&entities, &viewport);

            let bounds = viewport.bounds();
            let mut cursor = 0;
            for entity in &visible {
                let p = entity.representative_point();
                prop_assert!(p.lat >= bounds.min_lat && p.lat <= bounds.max_lat);
                prop_assert!(p.lon >= bounds.min_lon && p.lon <= bounds.max_lon);
                // Subset in upstream order.
                let pos = entities[cursor..].iter().position(|e| e == entity);
                prop_assert!(pos.is_some());
                cursor += pos.unwrap() + 1;
            }
        }
    }
}
