//! Two-level region hierarchy: level1 (province) containing level2 (district).

use geo::{BoundingRect, Coord, MultiPolygon};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in lon/lat space, stored as `[west, north, east, south]`.
///
/// The north/south (and west/east) pairs are compared as plain numbers:
/// whichever of the two is smaller acts as the lower bound. Datasets in the
/// wild disagree on whether "north" holds the min or the max latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub west: f64,
    pub north: f64,
    pub east: f64,
    pub south: f64,
}

impl BoundingBox {
    pub fn new(west: f64, north: f64, east: f64, south: f64) -> Self {
        Self {
            west,
            north,
            east,
            south,
        }
    }

    /// Compute a compass-correct box covering a geometry.
    pub fn of_geometry(geometry: &MultiPolygon<f64>) -> Option<Self> {
        geometry
            .bounding_rect()
            .map(|rect| Self::new(rect.min().x, rect.max().y, rect.max().x, rect.min().y))
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> Self {
        let (min_x, max_x) = self.lon_range();
        let (min_y, max_y) = self.lat_range();
        let (o_min_x, o_max_x) = other.lon_range();
        let (o_min_y, o_max_y) = other.lat_range();
        Self::new(
            min_x.min(o_min_x),
            max_y.max(o_max_y),
            max_x.max(o_max_x),
            min_y.min(o_min_y),
        )
    }

    pub fn lon_range(&self) -> (f64, f64) {
        (self.west.min(self.east), self.west.max(self.east))
    }

    pub fn lat_range(&self) -> (f64, f64) {
        (self.north.min(self.south), self.north.max(self.south))
    }

    /// Inclusive on all four edges. Non-finite coordinates never match.
    pub fn contains(&self, coord: Coord<f64>) -> bool {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return false;
        }
        let (min_x, max_x) = self.lon_range();
        let (min_y, max_y) = self.lat_range();
        min_x <= coord.x && coord.x <= max_x && min_y <= coord.y && coord.y <= max_y
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([west, north, east, south]: [f64; 4]) -> Self {
        Self::new(west, north, east, south)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.west, b.north, b.east, b.south]
    }
}

/// A district-level region with its boundary.
///
/// GeoJSON `Polygon` geometries are stored as a one-element `MultiPolygon`
/// so lookups never branch on the source encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Level2Region {
    pub level2_id: String,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl Level2Region {
    pub fn new(
        level2_id: impl Into<String>,
        name: impl Into<String>,
        geometry: MultiPolygon<f64>,
    ) -> Self {
        Self {
            level2_id: level2_id.into(),
            name: name.into(),
            geometry,
        }
    }
}

/// A province-level region and its ordered districts.
#[derive(Debug, Clone, PartialEq)]
pub struct Level1Region {
    pub level1_id: String,
    pub name: String,
    pub bbox: Option<BoundingBox>,
    pub level2s: Vec<Level2Region>,
}

impl Level1Region {
    pub fn new(level1_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            level1_id: level1_id.into(),
            name: name.into(),
            bbox: None,
            level2s: Vec::new(),
        }
    }

    pub fn with_level2(mut self, level2: Level2Region) -> Self {
        self.level2s.push(level2);
        self
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Box covering every district geometry, if any has coordinates.
    pub fn computed_bbox(&self) -> Option<BoundingBox> {
        self.level2s
            .iter()
            .filter_map(|l2| BoundingBox::of_geometry(&l2.geometry))
            .reduce(|acc, b| acc.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, polygon};

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
        ]])
    }

    #[test]
    fn test_bbox_edges_are_inclusive() {
        let bbox = BoundingBox::new(105.3, 21.5, 106.0, 20.5);
        assert!(bbox.contains(coord! { x: 105.3, y: 21.0 }));
        assert!(bbox.contains(coord! { x: 106.0, y: 21.0 }));
        assert!(bbox.contains(coord! { x: 105.5, y: 21.5 }));
        assert!(bbox.contains(coord! { x: 105.5, y: 20.5 }));
        assert!(bbox.contains(coord! { x: 105.3, y: 20.5 }));
        assert!(!bbox.contains(coord! { x: 105.29, y: 21.0 }));
        assert!(!bbox.contains(coord! { x: 105.5, y: 21.51 }));
    }

    #[test]
    fn test_bbox_label_order_does_not_matter() {
        let stored = BoundingBox::new(105.3, 21.5, 106.0, 20.5);
        let swapped = BoundingBox::new(105.3, 20.5, 106.0, 21.5);
        let point = coord! { x: 105.85, y: 21.03 };
        assert!(stored.contains(point));
        assert!(swapped.contains(point));
    }

    #[test]
    fn test_bbox_rejects_non_finite() {
        let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
        assert!(!bbox.contains(coord! { x: f64::NAN, y: 0.0 }));
        assert!(!bbox.contains(coord! { x: 0.0, y: f64::INFINITY }));
    }

    #[test]
    fn test_bbox_deserializes_from_array() {
        let bbox: BoundingBox = serde_json::from_str("[105.3, 21.5, 106.0, 20.5]").unwrap();
        assert_eq!(bbox.west, 105.3);
        assert_eq!(bbox.north, 21.5);
        assert_eq!(bbox.east, 106.0);
        assert_eq!(bbox.south, 20.5);
        assert_eq!(
            serde_json::to_string(&bbox).unwrap(),
            "[105.3,21.5,106.0,20.5]"
        );
    }

    #[test]
    fn test_computed_bbox_covers_all_districts() {
        let region = Level1Region::new("01", "Test")
            .with_level2(Level2Region::new("001", "A", square(0.0, 0.0, 1.0)))
            .with_level2(Level2Region::new("002", "B", square(2.0, 3.0, 1.0)));

        let bbox = region.computed_bbox().unwrap();
        assert_eq!(bbox, BoundingBox::new(0.0, 4.0, 3.0, 0.0));
    }

    #[test]
    fn test_computed_bbox_empty_region() {
        assert!(Level1Region::new("01", "Empty").computed_bbox().is_none());
    }
}
