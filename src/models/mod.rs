//! Core data models for region lookups.

pub mod lookup;
pub mod region;

pub use lookup::{LookupResult, RegionMatch};
pub use region::{BoundingBox, Level1Region, Level2Region};
