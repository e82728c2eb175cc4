//! Error types for grid construction.

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;

/// Errors that can occur while constructing a grid.
///
/// Queries never fail: a miss is reported through `false`, `None` or a
/// sentinel value. Only construction validates its input.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GridError {
    /// No triangles were supplied to the builder.
    #[error("cannot build a grid from an empty triangle set")]
    EmptyInput,

    /// The cell size must be positive and finite.
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f64),

    /// The grid dimensions are invalid.
    #[error("invalid grid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Width in cells.
        width: usize,
        /// Height in cells.
        height: usize,
    },

    /// The number of supplied cells does not match the grid dimensions.
    #[error("expected {expected} cells, got {actual}")]
    CellCountMismatch {
        /// Number of cells implied by the extents.
        expected: usize,
        /// Number of cells supplied.
        actual: usize,
    },

    /// The triangle set has more faces than a `u32` index can address.
    #[error("too many faces for u32 indices: {count}")]
    TooManyFaces {
        /// Number of supplied triangles.
        count: usize,
    },

    /// A triangle has a NaN or infinite coordinate.
    #[error("triangle {face} has a non-finite vertex")]
    NonFiniteVertex {
        /// Index of the offending triangle.
        face: usize,
    },

    /// A builder parameter is out of range.
    #[error("invalid grid parameter: {0}")]
    InvalidParams(String),
}
