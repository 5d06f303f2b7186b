//! Point containment primitives.
//!
//! All tests treat shapes as closed sets: a point exactly on an edge or vertex
//! of an outer ring is inside, and a point on the edge of a hole still belongs
//! to the polygon. Boundary detection uses exact floating-point arithmetic, so
//! the classification of a given input is deterministic but may differ from
//! other libraries for points that are only nearly collinear with an edge.

use geo::{Coord, LineString, MultiPolygon, Polygon};

use crate::models::BoundingBox;

/// Where a point lies relative to a single ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingPosition {
    Inside,
    Boundary,
    Outside,
}

fn is_finite(point: Coord<f64>) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

/// Bounding box pre-filter. Missing inputs fail closed.
pub fn point_in_bbox(point: Option<Coord<f64>>, bbox: Option<&BoundingBox>) -> bool {
    match (point, bbox) {
        (Some(point), Some(bbox)) => bbox.contains(point),
        _ => false,
    }
}

/// True if `p` lies on the closed segment `a`-`b`.
fn on_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross != 0.0 {
        return false;
    }
    a.x.min(b.x) <= p.x && p.x <= a.x.max(b.x) && a.y.min(b.y) <= p.y && p.y <= a.y.max(b.y)
}

/// Classify a point against one ring using the crossing-number rule.
///
/// The ring may or may not repeat its first coordinate at the end; the
/// implicit closing edge is always tested.
pub fn ring_position(point: Coord<f64>, ring: &LineString<f64>) -> RingPosition {
    let coords = &ring.0;
    if coords.is_empty() || !is_finite(point) {
        return RingPosition::Outside;
    }

    let mut inside = false;
    let mut j = coords.len() - 1;
    for i in 0..coords.len() {
        let a = coords[i];
        let b = coords[j];

        if on_segment(point, a, b) {
            return RingPosition::Boundary;
        }

        // Half-open in y so a ray through a vertex is counted exactly once.
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    if inside {
        RingPosition::Inside
    } else {
        RingPosition::Outside
    }
}

pub fn point_in_ring(point: Coord<f64>, ring: &LineString<f64>) -> bool {
    ring_position(point, ring) != RingPosition::Outside
}

/// Inside (or on) the outer ring and not strictly inside any hole.
pub fn point_in_polygon(point: Coord<f64>, polygon: &Polygon<f64>) -> bool {
    point_in_ring(point, polygon.exterior())
        && polygon
            .interiors()
            .iter()
            .all(|hole| ring_position(point, hole) != RingPosition::Inside)
}

/// True if any polygon of the set contains the point.
pub fn point_in_multi_polygon(point: Coord<f64>, polygons: &MultiPolygon<f64>) -> bool {
    polygons.iter().any(|polygon| point_in_polygon(point, polygon))
}

/// Union over several ring-set groups.
pub fn point_in_any(point: Coord<f64>, groups: &[MultiPolygon<f64>]) -> bool {
    groups
        .iter()
        .any(|group| point_in_multi_polygon(point, group))
}
