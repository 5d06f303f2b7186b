//! Region Locator - resolves a coordinate to the province and district
//! that contain it.
//!
//! This library provides the lookup core and shared types for the `locate` binary.

pub mod config;
pub mod error;
pub mod models;
pub mod pip;

pub use config::{Config, DetailErrorPolicy, IndexConfig, LoadMode};
pub use error::LookupError;
pub use models::{BoundingBox, Level1Region, Level2Region, LookupResult, RegionMatch};
pub use pip::{FileSource, MemorySource, RegionIndex, RegionSource, Resolver};
