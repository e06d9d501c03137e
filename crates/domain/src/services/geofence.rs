//! Geofence membership evaluation.
//!
//! Decides whether a coordinate lies inside any of a subject's effective
//! zones. Circles are measured on the sphere (Haversine); polygons and
//! rectangles are tested on the plane with longitude as x and latitude as y,
//! which holds at municipal scale.

use geo::{LineString, Rect};
use serde::Serialize;
use shared::geodesy::{haversine_distance, Coordinate};
use tracing::warn;
use uuid::Uuid;

use crate::models::zone::{Zone, ZoneDefinition, ZoneGeometry, ZoneSummary};

/// Added to every edge's latitude delta in the crossing test so horizontal
/// edges never divide by zero.
pub const POLYGON_EDGE_EPSILON: f64 = 1e-7;

/// A zone that could not be evaluated and was left out.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedZone {
    pub zone_id: Uuid,
    pub reason: String,
}

/// Outcome of evaluating one coordinate against a zone set.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub inside_any: bool,
    /// Distance to the closest circle centre. Polygons and rectangles never
    /// contribute, so this stays `None` for subjects without circle zones.
    pub nearest_distance_meters: Option<f64>,
    pub nearest_zone: Option<ZoneSummary>,
    /// Zones that contain the coordinate, in evaluation order.
    pub matched_zone_ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_zones: Vec<SkippedZone>,
}

impl EvaluationResult {
    /// Result for a subject without any zone: nothing to enforce.
    pub fn unrestricted() -> Self {
        Self {
            inside_any: true,
            nearest_distance_meters: None,
            nearest_zone: None,
            matched_zone_ids: Vec::new(),
            skipped_zones: Vec::new(),
        }
    }
}

/// Seam used by the decision pipeline so tests can observe evaluation.
pub trait GeofenceCheck {
    fn evaluate(&self, zones: &[ZoneDefinition], at: Coordinate) -> EvaluationResult;
}

/// Stateless evaluator over stored zone definitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeofenceEvaluator;

impl GeofenceCheck for GeofenceEvaluator {
    fn evaluate(&self, zones: &[ZoneDefinition], at: Coordinate) -> EvaluationResult {
        evaluate(zones, at)
    }
}

/// Evaluates `at` against every zone with union semantics.
///
/// An empty zone set is unrestricted. Zones whose stored geometry is
/// malformed are skipped with a warning and listed in `skipped_zones`; the
/// remaining zones are still evaluated.
pub fn evaluate(zones: &[ZoneDefinition], at: Coordinate) -> EvaluationResult {
    if zones.is_empty() {
        return EvaluationResult::unrestricted();
    }

    let mut result = EvaluationResult {
        inside_any: false,
        nearest_distance_meters: None,
        nearest_zone: None,
        matched_zone_ids: Vec::new(),
        skipped_zones: Vec::new(),
    };

    for definition in zones {
        let zone = match Zone::try_from(definition) {
            Ok(zone) => zone,
            Err(e) => {
                warn!(
                    zone_id = %definition.id,
                    zone_name = %definition.name,
                    shape = %definition.shape,
                    error = %e,
                    "Skipping malformed geofence zone"
                );
                result.skipped_zones.push(SkippedZone {
                    zone_id: definition.id,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let inside = match &zone.geometry {
            ZoneGeometry::Circle {
                center,
                radius_meters,
            } => {
                let distance = haversine_distance(at, *center);
                let closer = result
                    .nearest_distance_meters
                    .map_or(true, |best| distance < best);
                if closer {
                    result.nearest_distance_meters = Some(distance);
                    result.nearest_zone = Some(zone.summary());
                }
                distance <= *radius_meters
            }
            ZoneGeometry::Polygon { ring } => ring_contains(ring, at),
            ZoneGeometry::Rectangle { bounds } => rect_contains(bounds, at),
        };

        if inside {
            result.inside_any = true;
            result.matched_zone_ids.push(zone.id);
        }
    }

    result
}

/// Even-odd ray casting against a closed ring.
///
/// Points exactly on an edge or vertex may land on either side.
pub fn ring_contains(ring: &LineString<f64>, at: Coordinate) -> bool {
    let (x, y) = (at.longitude, at.latitude);
    let mut inside = false;

    for edge in ring.lines() {
        let (a, b) = (edge.start, edge.end);
        if (a.y > y) != (b.y > y) {
            let crossing_x = (b.x - a.x) * (y - a.y) / (b.y - a.y + POLYGON_EDGE_EPSILON) + a.x;
            if x < crossing_x {
                inside = !inside;
            }
        }
    }

    inside
}

/// Inclusive bounding-box test.
pub fn rect_contains(bounds: &Rect<f64>, at: Coordinate) -> bool {
    let (min, max) = (bounds.min(), bounds.max());
    (min.y..=max.y).contains(&at.latitude) && (min.x..=max.x).contains(&at.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::zone::ZoneShape;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng)
    }

    fn unit_square() -> ZoneDefinition {
        ZoneDefinition::polygon(
            "Unit square",
            vec![c(0.0, 0.0), c(0.0, 1.0), c(1.0, 1.0), c(1.0, 0.0)],
        )
    }

    #[test]
    fn test_empty_zone_set_is_unrestricted() {
        let result = evaluate(&[], c(45.0, 45.0));
        assert!(result.inside_any);
        assert!(result.nearest_distance_meters.is_none());
        assert!(result.nearest_zone.is_none());
    }

    #[test]
    fn test_circle_boundary() {
        let zone = ZoneDefinition::circle("Origin", c(0.0, 0.0), 1000.0);
        let zones = [zone.clone()];

        let inside = evaluate(&zones, c(0.0, 0.0089));
        assert!(inside.inside_any);
        assert_eq!(inside.matched_zone_ids, vec![zone.id]);

        let near_edge = evaluate(&zones, c(0.0, 0.008983));
        assert!(near_edge.inside_any);
        let d = near_edge.nearest_distance_meters.unwrap();
        assert!((d - 1000.0).abs() < 2.0, "got {d}");

        let outside = evaluate(&zones, c(0.0, 0.0091));
        assert!(!outside.inside_any);
        assert!(outside.nearest_distance_meters.unwrap() > 1000.0);
        assert_eq!(outside.nearest_zone.unwrap().id, zone.id);
    }

    #[test]
    fn test_nearest_circle_is_tracked() {
        let far = ZoneDefinition::circle("Far", c(0.0, 1.0), 100.0);
        let near = ZoneDefinition::circle("Near", c(0.0, 0.01), 100.0);
        let result = evaluate(&[far, near.clone()], c(0.0, 0.0));

        assert!(!result.inside_any);
        let nearest = result.nearest_zone.unwrap();
        assert_eq!(nearest.id, near.id);
        assert_eq!(nearest.shape, ZoneShape::Circle);
        let d = result.nearest_distance_meters.unwrap();
        assert!((d - 1111.95).abs() < 0.5, "got {d}");
    }

    #[test]
    fn test_polygon_containment() {
        let zones = [unit_square()];
        assert!(evaluate(&zones, c(0.5, 0.5)).inside_any);
        assert!(!evaluate(&zones, c(1.5, 1.5)).inside_any);
        assert!(!evaluate(&zones, c(-0.5, 0.5)).inside_any);
    }

    #[test]
    fn test_polygon_vertex_and_edge_do_not_panic() {
        let zones = [unit_square()];
        for point in [c(0.0, 0.0), c(1.0, 1.0), c(0.5, 0.0), c(0.0, 0.5), c(1.0, 0.5)] {
            let _ = evaluate(&zones, point);
        }
    }

    #[test]
    fn test_polygon_contributes_no_distance() {
        let result = evaluate(&[unit_square()], c(0.5, 0.5));
        assert!(result.inside_any);
        assert!(result.nearest_distance_meters.is_none());
        assert!(result.nearest_zone.is_none());
    }

    #[test]
    fn test_concave_polygon() {
        // "U" shape opening to the north.
        let zone = ZoneDefinition::polygon(
            "U",
            vec![
                c(0.0, 0.0),
                c(0.0, 3.0),
                c(3.0, 3.0),
                c(3.0, 2.0),
                c(1.0, 2.0),
                c(1.0, 1.0),
                c(3.0, 1.0),
                c(3.0, 0.0),
            ],
        );
        let zones = [zone];
        assert!(evaluate(&zones, c(0.5, 1.5)).inside_any);
        assert!(evaluate(&zones, c(2.0, 0.5)).inside_any);
        assert!(!evaluate(&zones, c(2.0, 1.5)).inside_any);
    }

    #[test]
    fn test_polygon_with_horizontal_edges() {
        let ring: LineString<f64> = vec![
            geo::coord! { x: 0.0, y: 0.0 },
            geo::coord! { x: 2.0, y: 0.0 },
            geo::coord! { x: 2.0, y: 2.0 },
            geo::coord! { x: 0.0, y: 2.0 },
            geo::coord! { x: 0.0, y: 0.0 },
        ]
        .into();
        assert!(ring_contains(&ring, c(1.0, 1.0)));
        assert!(!ring_contains(&ring, c(1.0, 3.0)));
    }

    #[test]
    fn test_rectangle_order_independent() {
        let sorted = ZoneDefinition::rectangle("Sorted", c(0.0, 0.0), c(10.0, 10.0));
        let unsorted = ZoneDefinition::rectangle("Unsorted", c(10.0, 10.0), c(0.0, 0.0));

        for point in [c(5.0, 5.0), c(0.0, 10.0), c(10.5, 5.0), c(-1.0, -1.0)] {
            assert_eq!(
                evaluate(&[sorted.clone()], point).inside_any,
                evaluate(&[unsorted.clone()], point).inside_any
            );
        }
        assert!(evaluate(&[unsorted.clone()], c(5.0, 5.0)).inside_any);
        assert!(evaluate(&[unsorted.clone()], c(10.0, 0.0)).inside_any);
        assert!(!evaluate(&[unsorted], c(10.5, 5.0)).inside_any);
    }

    #[test]
    fn test_union_semantics() {
        let circle = ZoneDefinition::circle("Office", c(-6.9, 107.6), 200.0);
        let far_polygon = ZoneDefinition::polygon(
            "Warehouse",
            vec![c(-7.0, 108.0), c(-7.0, 108.1), c(-7.1, 108.1)],
        );

        let result = evaluate(&[far_polygon, circle.clone()], c(-6.9, 107.6005));
        assert!(result.inside_any);
        assert_eq!(result.matched_zone_ids, vec![circle.id]);
    }

    #[test]
    fn test_malformed_zone_is_skipped() {
        let broken = ZoneDefinition {
            radius_meters: None,
            ..ZoneDefinition::circle("Broken", c(0.0, 0.0), 1.0)
        };
        let unknown = ZoneDefinition {
            shape: "hexagon".to_string(),
            ..unit_square()
        };
        let good = ZoneDefinition::rectangle("Good", c(0.0, 0.0), c(1.0, 1.0));

        let result = evaluate(&[broken.clone(), unknown.clone(), good.clone()], c(0.5, 0.5));
        assert!(result.inside_any);
        assert_eq!(result.matched_zone_ids, vec![good.id]);
        assert!(result.nearest_distance_meters.is_none());

        let skipped: Vec<Uuid> = result.skipped_zones.iter().map(|s| s.zone_id).collect();
        assert_eq!(skipped, vec![broken.id, unknown.id]);
    }

    #[test]
    fn test_only_malformed_zones_is_not_unrestricted() {
        let broken = ZoneDefinition::polygon("Line", vec![c(0.0, 0.0), c(1.0, 1.0)]);
        let result = evaluate(&[broken], c(0.5, 0.5));
        assert!(!result.inside_any);
        assert_eq!(result.skipped_zones.len(), 1);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let zones = [
            ZoneDefinition::circle("A", c(0.0, 0.0), 500.0),
            unit_square(),
            ZoneDefinition::rectangle("B", c(2.0, 2.0), c(3.0, 3.0)),
        ];
        let evaluator = GeofenceEvaluator;
        let first = evaluator.evaluate(&zones, c(0.2, 0.3));
        let second = evaluator.evaluate(&zones, c(0.2, 0.3));
        assert_eq!(first, second);
    }

    #[test]
    fn test_nan_coordinate_is_outside() {
        let zones = [
            ZoneDefinition::circle("A", c(0.0, 0.0), 500.0),
            unit_square(),
            ZoneDefinition::rectangle("B", c(0.0, 0.0), c(3.0, 3.0)),
        ];
        let result = evaluate(&zones, c(f64::NAN, 0.5));
        assert!(!result.inside_any);
    }
}
