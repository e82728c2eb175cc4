//! Error types for collision setup.

use cf_grid::GridError;
use thiserror::Error;

/// Result type for collision operations.
pub type CollideResult<T> = Result<T, CollideError>;

/// Errors that can occur while building collision structures.
///
/// Queries themselves never fail; a miss is a `None`, `false` or an infinite
/// height.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CollideError {
    /// Mesh has no faces.
    #[error("mesh is empty")]
    EmptyMesh,

    /// A face refers to a vertex that does not exist.
    #[error("face {face} refers to vertex {vertex}, but the mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        /// Index of the offending face.
        face: usize,
        /// The out-of-range vertex index.
        vertex: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A grid cell refers to a triangle the source does not have.
    #[error("grid references face {face}, but the source has {face_count} faces")]
    GridFaceOutOfRange {
        /// The out-of-range face index.
        face: usize,
        /// Number of faces in the source.
        face_count: usize,
    },

    /// More vertices than a `u32` face index can address.
    #[error("too many vertices: {0}")]
    TooManyVertices(usize),

    /// A query parameter or mesh constructor argument is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParams(String),

    /// Grid construction failed.
    #[error(transparent)]
    Grid(#[from] GridError),
}
