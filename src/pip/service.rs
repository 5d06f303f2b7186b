//! Resolver: coordinate to province/district.

use std::sync::Arc;

use geo::Coord;
use rayon::prelude::*;
use tracing::{debug, warn};

use super::geometry::{point_in_bbox, point_in_multi_polygon};
use super::RegionIndex;
use crate::config::DetailErrorPolicy;
use crate::error::{LookupError, Result};
use crate::models::{LookupResult, RegionMatch};

/// Point lookup over a shared [`RegionIndex`].
#[derive(Clone)]
pub struct Resolver {
    index: Arc<RegionIndex>,
    policy: DetailErrorPolicy,
}

impl Resolver {
    /// Uses the detail-error policy the index was configured with.
    pub fn new(index: Arc<RegionIndex>) -> Self {
        let policy = index.detail_error_policy();
        Self { index, policy }
    }

    /// Override the index's detail-error policy for this resolver.
    pub fn with_policy(mut self, policy: DetailErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve a longitude/latitude pair.
    pub fn resolve(&self, longitude: f64, latitude: f64) -> Result<LookupResult> {
        self.resolve_point(Coord {
            x: longitude,
            y: latitude,
        })
    }

    /// Level1 regions are tried in index order and level2 regions in stored
    /// order; the first polygon that contains the point wins. A bbox hit
    /// without a polygon hit moves on to the next level1.
    pub fn resolve_point(&self, point: Coord<f64>) -> Result<LookupResult> {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(LookupError::InvalidInput {
                longitude: point.x,
                latitude: point.y,
            });
        }

        for (level1_id, bbox) in self.index.list_level1_regions() {
            if !point_in_bbox(Some(point), bbox) {
                continue;
            }

            let level1 = match self.index.get_level2_detail(level1_id) {
                Ok(detail) => detail,
                Err(e) if e.is_data_error() && self.policy == DetailErrorPolicy::Skip => {
                    warn!("Skipping level1 '{}': {}", level1_id, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Some(level2) = level1
                .level2s
                .iter()
                .find(|level2| point_in_multi_polygon(point, &level2.geometry))
            {
                debug!(
                    "({}, {}) resolved to {}/{}",
                    point.x, point.y, level1.level1_id, level2.level2_id
                );
                return Ok(LookupResult::Found(RegionMatch::from_regions(
                    &level1, level2,
                )));
            }
        }

        debug!("({}, {}) is outside all regions", point.x, point.y);
        Ok(LookupResult::NotFound)
    }

    /// Resolve many points in parallel. Results keep the input order.
    pub fn resolve_many(&self, points: &[Coord<f64>]) -> Vec<Result<LookupResult>> {
        points
            .par_iter()
            .map(|point| self.resolve_point(*point))
            .collect()
    }

    /// Get the region index (for stats/debugging)
    pub fn index(&self) -> &RegionIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::models::{BoundingBox, Level1Region, Level2Region};
    use crate::pip::MemorySource;
    use geo::{coord, polygon, MultiPolygon};

    fn rect(west: f64, south: f64, east: f64, north: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: west, y: south),
            (x: east, y: south),
            (x: east, y: north),
            (x: west, y: north),
        ]])
    }

    fn hanoi() -> Level1Region {
        Level1Region::new("01", "Hà Nội")
            .with_bbox(BoundingBox::new(105.3, 21.5, 106.0, 20.5))
            .with_level2(Level2Region::new(
                "002",
                "Hoàn Kiếm",
                rect(105.84, 21.01, 105.86, 21.04),
            ))
            .with_level2(Level2Region::new(
                "001",
                "Ba Đình",
                rect(105.80, 21.00, 105.90, 21.06),
            ))
    }

    fn resolver(source: MemorySource) -> Resolver {
        let index = RegionIndex::build(source, &IndexConfig::default()).unwrap();
        Resolver::new(Arc::new(index))
    }

    fn found_codes(result: &LookupResult) -> (&str, &str) {
        let m = result.as_match().expect("expected a match");
        (m.province_code.as_str(), m.district_code.as_str())
    }

    #[test]
    fn test_central_hanoi() {
        let resolver = resolver(MemorySource::new().with_region(hanoi()));
        let result = resolver.resolve(105.85, 21.03).unwrap();
        // overlapping districts: the first stored one wins
        assert_eq!(found_codes(&result), ("01", "002"));
        let m = result.as_match().unwrap();
        assert_eq!(m.province_name, "Hà Nội");
        assert_eq!(m.district_name, "Hoàn Kiếm");

        let result = resolver.resolve(105.81, 21.05).unwrap();
        assert_eq!(found_codes(&result), ("01", "001"));
    }

    #[test]
    fn test_open_water_is_not_found() {
        let resolver = resolver(MemorySource::new().with_region(hanoi()));
        assert_eq!(resolver.resolve(0.0, 0.0).unwrap(), LookupResult::NotFound);
    }

    #[test]
    fn test_in_bbox_but_outside_polygons() {
        let resolver = resolver(MemorySource::new().with_region(hanoi()));
        assert_eq!(
            resolver.resolve(105.5, 21.3).unwrap(),
            LookupResult::NotFound
        );
    }

    #[test]
    fn test_invalid_input() {
        let resolver = resolver(MemorySource::new().with_region(hanoi()));
        for (lng, lat) in [
            (f64::NAN, 21.0),
            (105.85, f64::NAN),
            (f64::INFINITY, 21.0),
            (105.85, f64::NEG_INFINITY),
        ] {
            assert!(matches!(
                resolver.resolve(lng, lat),
                Err(LookupError::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn test_hole_is_not_a_match() {
        let donut = MultiPolygon::new(vec![polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 4.0, y: 4.0), (x: 6.0, y: 4.0), (x: 6.0, y: 6.0), (x: 4.0, y: 6.0)]],
        )]);
        let resolver = resolver(
            MemorySource::new()
                .with_region(Level1Region::new("D", "Donut").with_level2(Level2Region::new(
                    "D1", "Ring", donut,
                ))),
        );
        assert!(resolver.resolve(2.0, 2.0).unwrap().is_found());
        assert_eq!(resolver.resolve(5.0, 5.0).unwrap(), LookupResult::NotFound);
    }

    #[test]
    fn test_continues_past_bbox_hit_without_polygon_hit() {
        // Both boxes cover (5, 5); only the second region's polygon does.
        let first = Level1Region::new("A", "First")
            .with_bbox(BoundingBox::new(0.0, 10.0, 10.0, 0.0))
            .with_level2(Level2Region::new("A1", "West", rect(0.0, 0.0, 2.0, 10.0)));
        let second = Level1Region::new("B", "Second")
            .with_bbox(BoundingBox::new(3.0, 10.0, 10.0, 0.0))
            .with_level2(Level2Region::new("B1", "East", rect(3.0, 0.0, 10.0, 10.0)));

        let resolver = resolver(MemorySource::new().with_region(first).with_region(second));
        let result = resolver.resolve(5.0, 5.0).unwrap();
        assert_eq!(found_codes(&result), ("B", "B1"));
    }

    #[test]
    fn test_enumeration_order_breaks_ties() {
        let a = Level1Region::new("A", "A").with_level2(Level2Region::new(
            "A1",
            "A1",
            rect(0.0, 0.0, 10.0, 10.0),
        ));
        let b = Level1Region::new("B", "B").with_level2(Level2Region::new(
            "B1",
            "B1",
            rect(0.0, 0.0, 10.0, 10.0),
        ));

        let ab = resolver(MemorySource::new().with_region(a.clone()).with_region(b.clone()));
        let ba = resolver(MemorySource::new().with_region(b).with_region(a));
        assert_eq!(found_codes(&ab.resolve(5.0, 5.0).unwrap()), ("A", "A1"));
        assert_eq!(found_codes(&ba.resolve(5.0, 5.0).unwrap()), ("B", "B1"));
    }

    #[test]
    fn test_missing_detail_policy() {
        let source = MemorySource::new()
            .with_missing_detail("X", BoundingBox::new(105.0, 22.0, 106.5, 20.0))
            .with_region(hanoi());

        let propagate = resolver(source.clone());
        assert!(matches!(
            propagate.resolve(105.85, 21.03),
            Err(LookupError::DataNotFound { ref level1_id }) if level1_id == "X"
        ));

        let skip = resolver(source).with_policy(DetailErrorPolicy::Skip);
        let result = skip.resolve(105.85, 21.03).unwrap();
        assert_eq!(found_codes(&result), ("01", "002"));
    }

    #[test]
    fn test_policy_comes_from_index_config() {
        let source = MemorySource::new()
            .with_missing_detail("X", BoundingBox::new(105.0, 22.0, 106.5, 20.0))
            .with_region(hanoi());
        let config = IndexConfig {
            on_detail_error: DetailErrorPolicy::Skip,
            ..IndexConfig::default()
        };
        let index = RegionIndex::build(source, &config).unwrap();
        let resolver = Resolver::new(Arc::new(index));

        let result = resolver.resolve(105.85, 21.03).unwrap();
        assert_eq!(found_codes(&result), ("01", "002"));

        let strict = resolver.with_policy(DetailErrorPolicy::Propagate);
        assert!(matches!(
            strict.resolve(105.85, 21.03),
            Err(LookupError::DataNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_detail_outside_bbox_is_never_loaded() {
        let source = MemorySource::new()
            .with_missing_detail("X", BoundingBox::new(0.0, 1.0, 1.0, 0.0))
            .with_region(hanoi());
        let resolver = resolver(source);
        assert!(resolver.resolve(105.85, 21.03).unwrap().is_found());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let resolver = resolver(MemorySource::new().with_region(hanoi()));
        for (lng, lat) in [(105.85, 21.03), (0.0, 0.0), (105.5, 21.3)] {
            assert_eq!(
                resolver.resolve(lng, lat).unwrap(),
                resolver.resolve(lng, lat).unwrap()
            );
        }
    }

    #[test]
    fn test_resolve_many_keeps_order() {
        let resolver = resolver(MemorySource::new().with_region(hanoi()));
        let points: Vec<Coord<f64>> = (0..200)
            .map(|i| {
                if i % 2 == 0 {
                    coord! { x: 105.85, y: 21.03 }
                } else {
                    coord! { x: 0.0, y: 0.0 }
                }
            })
            .collect();

        let results = resolver.resolve_many(&points);
        assert_eq!(results.len(), 200);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.as_ref().unwrap().is_found(), i % 2 == 0);
        }
        assert_eq!(resolver.index().cached_len(), 1);
    }

    #[test]
    fn test_empty_index() {
        let resolver = resolver(MemorySource::new());
        assert_eq!(resolver.resolve(8.5, 47.4).unwrap(), LookupResult::NotFound);
    }
}
