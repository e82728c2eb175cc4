//! Indexed triangle mesh for collision queries.

use cf_grid::DuplicatePointsEliminator;
use nalgebra::{Point2, Point3};
use tracing::debug;

use crate::error::{CollideError, CollideResult};
use crate::geometry::Triangle;
use crate::source::TriangleSource;

/// An indexed triangle mesh.
///
/// Faces index into `vertices` with counter-clockwise winding seen from
/// outside. Indices are validated on construction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollisionMesh {
    vertices: Vec<Point3<f64>>,
    faces: Vec<[u32; 3]>,
}

impl CollisionMesh {
    /// Creates a mesh from vertex positions and faces.
    ///
    /// # Errors
    ///
    /// - [`CollideError::EmptyMesh`] if there are no faces.
    /// - [`CollideError::FaceIndexOutOfRange`] if a face refers to a missing
    ///   vertex.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_collide::{CollideError, CollisionMesh};
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// ];
    /// assert!(CollisionMesh::new(vertices.clone(), vec![[0, 1, 2]]).is_ok());
    /// assert!(matches!(
    ///     CollisionMesh::new(vertices, vec![[0, 1, 3]]),
    ///     Err(CollideError::FaceIndexOutOfRange { face: 0, vertex: 3, .. })
    /// ));
    /// ```
    pub fn new(vertices: Vec<Point3<f64>>, faces: Vec<[u32; 3]>) -> CollideResult<Self> {
        if faces.is_empty() {
            return Err(CollideError::EmptyMesh);
        }
        for (face, indices) in faces.iter().enumerate() {
            if let Some(&vertex) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
                return Err(CollideError::FaceIndexOutOfRange {
                    face,
                    vertex,
                    vertex_count: vertices.len(),
                });
            }
        }
        Ok(Self { vertices, faces })
    }

    /// Builds a mesh from unconnected triangles, welding vertices closer than
    /// `weld_epsilon`.
    ///
    /// The first vertex seen in a cluster is kept. Faces that collapse because
    /// two of their corners were welded are dropped, so face indices may
    /// shift relative to `triangles`.
    ///
    /// # Errors
    ///
    /// - [`CollideError::EmptyMesh`] if no face survives.
    /// - [`CollideError::TooManyVertices`] if the welded vertex count does not
    ///   fit a `u32` index.
    pub fn from_triangle_soup(triangles: &[Triangle], weld_epsilon: f64) -> CollideResult<Self> {
        let mut welder = DuplicatePointsEliminator::new(weld_epsilon);
        let mut faces = Vec::with_capacity(triangles.len());
        let mut collapsed = 0usize;

        for tri in triangles {
            let mut face = [0u32; 3];
            for (slot, vertex) in face.iter_mut().zip(tri.to_array()) {
                let (handle, _) = welder.insert(vertex);
                *slot =
                    u32::try_from(handle).map_err(|_| CollideError::TooManyVertices(handle + 1))?;
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                collapsed += 1;
                continue;
            }
            faces.push(face);
        }

        debug!(
            input_vertices = triangles.len() * 3,
            welded_vertices = welder.len(),
            collapsed,
            "Welded triangle soup"
        );

        Self::new(welder.into_points(), faces)
    }

    /// Builds a regular height field with `columns x rows` samples spaced
    /// `spacing` apart, starting at `origin`.
    ///
    /// `heights` is row-major. Each grid square is split into two triangles
    /// facing up.
    ///
    /// # Errors
    ///
    /// Returns [`CollideError::InvalidParams`] if there are fewer than two
    /// samples per axis, the spacing is not positive, or `heights` has the
    /// wrong length.
    pub fn from_heightfield(
        origin: Point2<f64>,
        spacing: f64,
        columns: usize,
        rows: usize,
        heights: &[f64],
    ) -> CollideResult<Self> {
        if columns < 2 || rows < 2 {
            return Err(CollideError::InvalidParams(format!(
                "height field needs at least 2x2 samples, got {columns}x{rows}"
            )));
        }
        if spacing <= 0.0 || !spacing.is_finite() {
            return Err(CollideError::InvalidParams(format!(
                "spacing must be positive and finite, got {spacing}"
            )));
        }
        if heights.len() != columns * rows {
            return Err(CollideError::InvalidParams(format!(
                "expected {} heights, got {}",
                columns * rows,
                heights.len()
            )));
        }
        if u32::try_from(heights.len()).is_err() {
            return Err(CollideError::TooManyVertices(heights.len()));
        }

        let mut vertices = Vec::with_capacity(heights.len());
        for row in 0..rows {
            for col in 0..columns {
                #[allow(clippy::cast_precision_loss)]
                let (x, y) = (col as f64, row as f64);
                vertices.push(Point3::new(
                    x.mul_add(spacing, origin.x),
                    y.mul_add(spacing, origin.y),
                    heights[row * columns + col],
                ));
            }
        }

        // Indices fit in u32 because the vertex count does
        #[allow(clippy::cast_possible_truncation)]
        let index = |col: usize, row: usize| (row * columns + col) as u32;
        let mut faces = Vec::with_capacity((columns - 1) * (rows - 1) * 2);
        for row in 0..rows - 1 {
            for col in 0..columns - 1 {
                let a = index(col, row);
                let b = index(col + 1, row);
                let c = index(col + 1, row + 1);
                let d = index(col, row + 1);
                faces.push([a, b, c]);
                faces.push([a, c, d]);
            }
        }

        Self::new(vertices, faces)
    }

    /// Axis-aligned cube `[0, 1]^3` with outward-facing triangles.
    #[must_use]
    pub fn unit_cube() -> Self {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let faces = vec![
            // Bottom (-Z)
            [0, 2, 1],
            [0, 3, 2],
            // Top (+Z)
            [4, 5, 6],
            [4, 6, 7],
            // Front (-Y)
            [0, 1, 5],
            [0, 5, 4],
            // Back (+Y)
            [3, 7, 6],
            [3, 6, 2],
            // Left (-X)
            [0, 4, 7],
            [0, 7, 3],
            // Right (+X)
            [1, 2, 6],
            [1, 6, 5],
        ];
        Self { vertices, faces }
    }

    /// Vertex positions.
    #[must_use]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Vertex indices of every face.
    #[must_use]
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Iterates over the faces as triangles.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|f| self.resolve(f))
    }

    fn resolve(&self, face: &[u32; 3]) -> Triangle {
        Triangle::new(
            self.vertices[face[0] as usize],
            self.vertices[face[1] as usize],
            self.vertices[face[2] as usize],
        )
    }
}

impl TriangleSource for CollisionMesh {
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn triangle(&self, face: usize) -> Triangle {
        self.resolve(&self.faces[face])
    }
}
