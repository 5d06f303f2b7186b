//! Error types for region lookups.

use thiserror::Error;

/// Errors surfaced by the region index and resolver.
///
/// A point that lies outside every region is not an error; see
/// [`LookupResult::NotFound`](crate::models::LookupResult::NotFound).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LookupError {
    /// Coordinates were NaN or infinite.
    #[error("invalid coordinate (lng={longitude}, lat={latitude}): both values must be finite")]
    InvalidInput { longitude: f64, latitude: f64 },

    /// No detail record exists for a level1 region.
    #[error("no boundary data for level1 region '{level1_id}'")]
    DataNotFound { level1_id: String },

    /// A detail record exists but does not have the expected shape.
    #[error("boundary data for level1 region '{level1_id}' is corrupt: {reason}")]
    DataCorrupt { level1_id: String, reason: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl LookupError {
    pub fn not_found(level1_id: impl Into<String>) -> Self {
        LookupError::DataNotFound {
            level1_id: level1_id.into(),
        }
    }

    pub fn corrupt(level1_id: impl Into<String>, reason: impl ToString) -> Self {
        LookupError::DataCorrupt {
            level1_id: level1_id.into(),
            reason: reason.to_string(),
        }
    }

    /// True for errors caused by unreadable boundary data.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            LookupError::DataNotFound { .. } | LookupError::DataCorrupt { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
