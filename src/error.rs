//! Error types for diagram construction

use thiserror::Error;

/// Errors that can occur while building a warped diagram
///
/// Every error is a caller input problem. Near-degenerate geometry
/// (collinear sites, vertices on the region boundary) is resolved
/// internally and never surfaces here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WarpError {
    /// A parameter is outside its domain (count, region, frequency, amplitude, points)
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Fewer than one distinct site survived deduplication
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

/// Result type alias for diagram operations
pub type Result<T> = std::result::Result<T, WarpError>;
