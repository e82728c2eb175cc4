//! A triangle source bound to its grid.

use cf_grid::{GridParams, Grid2L, Rect, ZRange, build_grid};
use nalgebra::{Point2, Point3, Vector3};
use tracing::info;

use crate::closest::closest_point;
use crate::error::{CollideError, CollideResult};
use crate::gather::{triangles_in_contour, triangles_in_rect};
use crate::inside::point_inside;
use crate::params::QueryParams;
use crate::result::{ClosestPointResult, InsideResult, VertIntersectionResult};
use crate::scratch::QueryScratch;
use crate::source::TriangleSource;
use crate::vertical::{shoot_vertical, shoot_vertical_filtered};

/// Collision queries over a triangle source.
///
/// Owns the source and a grid built over it. The collider is immutable once
/// built: each query either allocates its own [`QueryScratch`] or borrows one
/// from the caller, so a collider can be shared across threads with one
/// scratch per thread.
///
/// # Example
///
/// ```
/// use cf_grid::GridParams;
/// use mesh_collide::{Collider, CollisionMesh};
/// use nalgebra::{Point2, Point3};
///
/// let collider = Collider::build(CollisionMesh::unit_cube(), &GridParams::default()).unwrap();
///
/// assert!(collider.point_inside(&Point3::new(0.3, 0.6, 0.2)));
/// assert!(!collider.point_inside(&Point3::new(0.3, 0.6, 1.2)));
///
/// let hit = collider.closest_point(&Point3::new(0.3, 0.6, 1.5), 10.0).unwrap();
/// assert!((hit.distance - 0.5).abs() < 1e-12);
///
/// assert_eq!(collider.height_at(&Point2::new(0.3, 0.6)), Some(1.0));
/// ```
#[derive(Debug, Clone)]
pub struct Collider<S> {
    source: S,
    grid: Grid2L,
    params: QueryParams,
}

impl<S: TriangleSource> Collider<S> {
    /// Builds a grid over `source` with default query parameters.
    ///
    /// # Errors
    ///
    /// - [`CollideError::EmptyMesh`] if `source` has no faces.
    /// - [`CollideError::Grid`] if grid construction fails.
    pub fn build(source: S, grid_params: &GridParams) -> CollideResult<Self> {
        Self::build_with(source, grid_params, QueryParams::default())
    }

    /// Builds a grid over `source` with the given query parameters.
    ///
    /// # Errors
    ///
    /// As [`Collider::build`], plus any error of [`QueryParams::validate`].
    pub fn build_with(
        source: S,
        grid_params: &GridParams,
        params: QueryParams,
    ) -> CollideResult<Self> {
        params.validate()?;
        if source.face_count() == 0 {
            return Err(CollideError::EmptyMesh);
        }
        let grid = build_grid(&source.triangle_arrays(), grid_params)?;
        info!(
            faces = source.face_count(),
            big_cells = grid.extents().len(),
            small_cells = grid.small_cell_count(),
            "Built collider"
        );
        Ok(Self {
            source,
            grid,
            params,
        })
    }

    /// Binds a source to a grid built elsewhere.
    ///
    /// # Errors
    ///
    /// - [`CollideError::GridFaceOutOfRange`] if the grid references a face
    ///   the source does not have.
    /// - Any error of [`QueryParams::validate`].
    pub fn from_parts(source: S, grid: Grid2L, params: QueryParams) -> CollideResult<Self> {
        params.validate()?;
        let face_count = source.face_count();
        let out_of_range = grid
            .big_cells()
            .iter()
            .flatten()
            .flat_map(|big| big.cells())
            .flat_map(|cell| cell.faces())
            .find(|&&face| face as usize >= face_count);
        if let Some(&face) = out_of_range {
            return Err(CollideError::GridFaceOutOfRange {
                face: face as usize,
                face_count,
            });
        }
        Ok(Self {
            source,
            grid,
            params,
        })
    }

    /// The triangle source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// The grid over the source.
    #[must_use]
    pub const fn grid(&self) -> &Grid2L {
        &self.grid
    }

    /// Query parameters.
    #[must_use]
    pub const fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Splits the collider into its source and grid.
    #[must_use]
    pub fn into_parts(self) -> (S, Grid2L) {
        (self.source, self.grid)
    }

    /// Fresh scratch space for the `*_with` queries.
    #[must_use]
    pub fn scratch(&self) -> QueryScratch {
        QueryScratch::new()
    }

    /// Nearest surface point strictly within `max_distance` of `origin`.
    #[must_use]
    pub fn closest_point(
        &self,
        origin: &Point3<f64>,
        max_distance: f64,
    ) -> Option<ClosestPointResult> {
        self.closest_point_with(origin, max_distance, &mut self.scratch())
    }

    /// [`Collider::closest_point`] reusing `scratch`.
    pub fn closest_point_with(
        &self,
        origin: &Point3<f64>,
        max_distance: f64,
        scratch: &mut QueryScratch,
    ) -> Option<ClosestPointResult> {
        closest_point(
            &self.source,
            &self.grid,
            origin,
            max_distance,
            &self.params,
            scratch,
        )
    }

    /// Whether `point` is inside the surface, casting along +Z.
    #[must_use]
    pub fn point_inside(&self, point: &Point3<f64>) -> bool {
        self.point_inside_along(point, &Vector3::z()).inside
    }

    /// Inside test casting along `direction`, with the nearest crossing.
    #[must_use]
    pub fn point_inside_along(&self, point: &Point3<f64>, direction: &Vector3<f64>) -> InsideResult {
        self.point_inside_with(point, direction, &mut self.scratch())
    }

    /// [`Collider::point_inside_along`] reusing `scratch`.
    pub fn point_inside_with(
        &self,
        point: &Point3<f64>,
        direction: &Vector3<f64>,
        scratch: &mut QueryScratch,
    ) -> InsideResult {
        point_inside(
            &self.source,
            &self.grid,
            point,
            direction,
            &self.params,
            scratch,
        )
    }

    /// Vertical shot at `point` from `from` toward `to`.
    #[must_use]
    pub fn shoot_vertical(&self, point: &Point2<f64>, from: f64, to: f64) -> VertIntersectionResult {
        shoot_vertical(&self.source, &self.grid, point, from, to)
    }

    /// Vertical shot ignoring faces rejected by `filter`.
    pub fn shoot_vertical_filtered<F>(
        &self,
        point: &Point2<f64>,
        from: f64,
        to: f64,
        filter: F,
    ) -> VertIntersectionResult
    where
        F: FnMut(usize) -> bool,
    {
        shoot_vertical_filtered(&self.source, &self.grid, point, from, to, filter)
    }

    /// Height of the topmost surface above `point`, if any.
    #[must_use]
    pub fn height_at(&self, point: &Point2<f64>) -> Option<f64> {
        let hit = self.shoot_vertical(point, f64::NEG_INFINITY, f64::INFINITY);
        hit.is_found().then_some(hit.height)
    }

    /// Distinct faces under `rect`, optionally limited to cells meeting
    /// `z_range`.
    #[must_use]
    pub fn triangles_in_rect(&self, rect: &Rect, z_range: Option<ZRange>) -> Vec<usize> {
        self.triangles_in_rect_with(rect, z_range, &mut self.scratch())
    }

    /// [`Collider::triangles_in_rect`] reusing `scratch`.
    pub fn triangles_in_rect_with(
        &self,
        rect: &Rect,
        z_range: Option<ZRange>,
        scratch: &mut QueryScratch,
    ) -> Vec<usize> {
        triangles_in_rect(self.source.face_count(), &self.grid, rect, z_range, scratch)
    }

    /// Distinct faces under the polygon `contour`.
    #[must_use]
    pub fn triangles_in_contour(
        &self,
        contour: &[Point2<f64>],
        z_range: Option<ZRange>,
    ) -> Vec<usize> {
        self.triangles_in_contour_with(contour, z_range, &mut self.scratch())
    }

    /// [`Collider::triangles_in_contour`] reusing `scratch`.
    pub fn triangles_in_contour_with(
        &self,
        contour: &[Point2<f64>],
        z_range: Option<ZRange>,
        scratch: &mut QueryScratch,
    ) -> Vec<usize> {
        triangles_in_contour(
            self.source.face_count(),
            &self.grid,
            contour,
            z_range,
            self.params.contour_epsilon,
            scratch,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use crate::mesh::CollisionMesh;

    const fn assert_sync<T: Sync + Send>() {}

    #[test]
    fn test_collider_is_sync() {
        assert_sync::<Collider<CollisionMesh>>();
        assert_sync::<Collider<Vec<Triangle>>>();
    }

    #[test]
    fn test_empty_source() {
        let empty: Vec<Triangle> = Vec::new();
        assert!(matches!(
            Collider::build(empty, &GridParams::default()),
            Err(CollideError::EmptyMesh)
        ));
    }

    #[test]
    fn test_invalid_params() {
        let result = Collider::build_with(
            CollisionMesh::unit_cube(),
            &GridParams::default(),
            QueryParams::default().with_ray_length_factor(0.0),
        );
        assert!(matches!(result, Err(CollideError::InvalidParams(_))));

        let result = Collider::build(
            CollisionMesh::unit_cube(),
            &GridParams::default().with_big_cell_size(-1.0),
        );
        assert!(matches!(result, Err(CollideError::Grid(_))));
    }

    #[test]
    fn test_from_parts_checks_faces() {
        let cube = CollisionMesh::unit_cube();
        let grid = build_grid(&cube.triangle_arrays(), &GridParams::default()).unwrap();
        let two = vec![
            Triangle::from_arrays([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            Triangle::from_arrays([0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]),
        ];
        assert!(matches!(
            Collider::from_parts(two, grid.clone(), QueryParams::default()),
            Err(CollideError::GridFaceOutOfRange { face_count: 2, .. })
        ));
        assert!(Collider::from_parts(cube, grid, QueryParams::default()).is_ok());
    }

    #[test]
    fn test_queries_share_scratch() {
        let collider =
            Collider::build(CollisionMesh::unit_cube(), &GridParams::fine()).unwrap();
        let mut scratch = collider.scratch();
        let p = Point3::new(0.3, 0.6, 0.2);

        for _ in 0..3 {
            assert!(
                collider
                    .point_inside_with(&p, &Vector3::z(), &mut scratch)
                    .inside
            );
            let hit = collider.closest_point_with(&p, 1.0, &mut scratch).unwrap();
            assert!((hit.distance - 0.2).abs() < 1e-12);
            let rect = Rect::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
            assert_eq!(
                collider
                    .triangles_in_rect_with(&rect, None, &mut scratch)
                    .len(),
                12
            );
        }
    }

    #[test]
    fn test_height_at() {
        let collider =
            Collider::build(CollisionMesh::unit_cube(), &GridParams::default()).unwrap();
        assert_eq!(collider.height_at(&Point2::new(0.2, 0.7)), Some(1.0));
        assert_eq!(collider.height_at(&Point2::new(2.0, 0.7)), None);

        let low = collider.shoot_vertical_filtered(&Point2::new(0.2, 0.7), 5.0, -5.0, |f| f < 2);
        assert_eq!(low.height, 0.0);
    }
}
