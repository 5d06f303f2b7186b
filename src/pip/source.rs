//! Boundary data sources.
//!
//! A source supplies the ordered level1 bounding-box table and, per level1,
//! a detail record with the level2 polygons. The on-disk layout read by
//! [`FileSource`] is:
//!
//! ```text
//! <data_dir>/level1s_bbox.json   {"01": [west, north, east, south], ...}
//! <data_dir>/01.json             {"level1_id": "01", "name": ..., "level2s": [...]}
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use geo::{Coord, LineString, MultiPolygon, Polygon};
use hashbrown::HashMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::{LookupError, Result};
use crate::models::{BoundingBox, Level1Region, Level2Region};

/// Default name of the bounding-box table inside a data directory.
pub const DEFAULT_BBOX_FILE: &str = "level1s_bbox.json";

/// Supplies level1 bounding boxes and level2 detail records.
pub trait RegionSource: Send + Sync {
    /// Level1 ids with their boxes, in lookup order.
    fn bounding_boxes(&self) -> Result<Vec<(String, Option<BoundingBox>)>>;

    /// Full detail record for one level1 region.
    fn load_detail(&self, level1_id: &str) -> Result<Level1Region>;
}

/// Identifier that may be written as a JSON string or number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(s) => s,
            RawId::Integer(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
enum GeometryKind {
    Polygon,
    MultiPolygon,
}

#[derive(Debug, Deserialize)]
struct RawLevel2 {
    level2_id: RawId,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: GeometryKind,
    coordinates: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawLevel1 {
    level1_id: Option<RawId>,
    #[serde(default)]
    name: String,
    level2s: Vec<RawLevel2>,
}

type Position = Vec<f64>;

fn to_ring(positions: Vec<Position>) -> std::result::Result<LineString<f64>, String> {
    if positions.len() < 3 {
        return Err(format!(
            "ring has {} positions, at least 3 required",
            positions.len()
        ));
    }
    positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
            _ => Err(format!("malformed position {:?}", p)),
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(LineString::new)
}

/// First ring is the outer boundary, the rest are holes.
fn to_polygon(rings: Vec<Vec<Position>>) -> std::result::Result<Polygon<f64>, String> {
    let mut rings = rings.into_iter().map(to_ring);
    let exterior = rings
        .next()
        .ok_or_else(|| "polygon has no rings".to_string())??;
    let interiors = rings.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn to_geometry(
    kind: GeometryKind,
    coordinates: serde_json::Value,
) -> std::result::Result<MultiPolygon<f64>, String> {
    match kind {
        GeometryKind::Polygon => {
            let rings: Vec<Vec<Position>> =
                serde_json::from_value(coordinates).map_err(|e| e.to_string())?;
            Ok(MultiPolygon::new(vec![to_polygon(rings)?]))
        }
        GeometryKind::MultiPolygon => {
            let polygons: Vec<Vec<Vec<Position>>> =
                serde_json::from_value(coordinates).map_err(|e| e.to_string())?;
            if polygons.is_empty() {
                return Err("multipolygon has no polygons".to_string());
            }
            polygons
                .into_iter()
                .map(to_polygon)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(MultiPolygon::new)
        }
    }
}

/// Parse a detail record. `level1_id` is the key the record was requested
/// under; it is used when the record carries no id of its own.
pub fn parse_detail(level1_id: &str, json: &str) -> Result<Level1Region> {
    let raw: RawLevel1 =
        serde_json::from_str(json).map_err(|e| LookupError::corrupt(level1_id, e))?;

    let level2s = raw
        .level2s
        .into_iter()
        .map(|l2| {
            let level2_id = String::from(l2.level2_id);
            let geometry = to_geometry(l2.kind, l2.coordinates).map_err(|reason| {
                LookupError::corrupt(level1_id, format!("level2 '{}': {}", level2_id, reason))
            })?;
            Ok(Level2Region::new(level2_id, l2.name, geometry))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Level1Region {
        level1_id: raw
            .level1_id
            .map(String::from)
            .unwrap_or_else(|| level1_id.to_string()),
        name: raw.name,
        bbox: None,
        level2s,
    })
}

/// Parse the bounding-box table, keeping the key order of the JSON object.
pub fn parse_bbox_table(json: &str) -> Result<Vec<(String, Option<BoundingBox>)>> {
    let table: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).map_err(|e| LookupError::corrupt("<bbox table>", e))?;

    table
        .into_iter()
        .map(|(id, value)| {
            let bbox: Option<BoundingBox> = serde_json::from_value(value)
                .map_err(|e| LookupError::corrupt(id.as_str(), format!("bad bbox: {}", e)))?;
            Ok((id, bbox))
        })
        .collect()
}

/// Reads boundary data from a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileSource {
    data_dir: PathBuf,
    bbox_file: String,
}

impl FileSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            bbox_file: DEFAULT_BBOX_FILE.to_string(),
        }
    }

    pub fn with_bbox_file(mut self, bbox_file: impl Into<String>) -> Self {
        self.bbox_file = bbox_file.into();
        self
    }

    /// Ids become file names; anything that could escape the data directory
    /// is treated as unknown.
    fn detail_path(&self, level1_id: &str) -> Option<PathBuf> {
        let safe = !level1_id.is_empty()
            && level1_id != "."
            && level1_id != ".."
            && !level1_id.contains(['/', '\\', '\0']);
        safe.then(|| self.data_dir.join(format!("{}.json", level1_id)))
    }

    /// A missing file is `DataNotFound`; any other read failure (bad UTF-8,
    /// permissions, a directory in the file's place) is `DataCorrupt`.
    fn read(&self, path: &Path, level1_id: &str) -> Result<String> {
        fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LookupError::not_found(level1_id),
            _ => LookupError::corrupt(
                level1_id,
                format!("failed to read {}: {}", path.display(), e),
            ),
        })
    }
}

impl RegionSource for FileSource {
    fn bounding_boxes(&self) -> Result<Vec<(String, Option<BoundingBox>)>> {
        let path = self.data_dir.join(&self.bbox_file);
        debug!("Reading bounding-box table from {}", path.display());
        let json = self.read(&path, "<bbox table>")?;
        parse_bbox_table(&json)
    }

    fn load_detail(&self, level1_id: &str) -> Result<Level1Region> {
        let path = self
            .detail_path(level1_id)
            .ok_or_else(|| LookupError::not_found(level1_id))?;
        debug!("Loading level1 detail {}", path.display());
        let json = self.read(&path, level1_id)?;
        parse_detail(level1_id, &json)
    }
}

/// In-memory source, mostly for tests and embedding small datasets.
///
/// Bounding boxes default to the box computed from the level2 geometries.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    order: Vec<(String, Option<BoundingBox>)>,
    details: HashMap<String, Level1Region>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a region. Its explicit bbox wins over the computed one.
    pub fn with_region(mut self, region: Level1Region) -> Self {
        let bbox = region.bbox.or_else(|| region.computed_bbox());
        self.order.push((region.level1_id.clone(), bbox));
        self.details.insert(region.level1_id.clone(), region);
        self
    }

    /// Append a bbox entry with no detail record behind it.
    pub fn with_missing_detail(mut self, level1_id: impl Into<String>, bbox: BoundingBox) -> Self {
        self.order.push((level1_id.into(), Some(bbox)));
        self
    }
}

impl RegionSource for MemorySource {
    fn bounding_boxes(&self) -> Result<Vec<(String, Option<BoundingBox>)>> {
        Ok(self.order.clone())
    }

    fn load_detail(&self, level1_id: &str) -> Result<Level1Region> {
        self.details
            .get(level1_id)
            .cloned()
            .ok_or_else(|| LookupError::not_found(level1_id))
    }
}
