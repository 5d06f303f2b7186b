//! Point-in-Polygon (PIP) region lookup.
//!
//! Level1 regions are pruned by bounding box, then the point is tested
//! against each candidate's level2 polygons.

pub mod geometry;
mod index;
mod service;
mod source;

pub use index::RegionIndex;
pub use service::Resolver;
pub use source::{
    parse_bbox_table, parse_detail, FileSource, MemorySource, RegionSource, DEFAULT_BBOX_FILE,
};
