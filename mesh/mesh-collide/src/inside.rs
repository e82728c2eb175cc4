//! Point-in-solid classification by ray parity.
//!
//! A ray leaves the query point long enough to exit the indexed area and the
//! number of surface crossings decides the answer: odd means inside.
//! The ray is rasterized through the grid; a cell is only scanned if the
//! height span of the ray over that cell meets the cell's Z range.
//!
//! A ray through an edge or vertex hits every face sharing it. Hits at the same
//! depth with the same facing are one crossing. Hits at the same depth with
//! opposite facing graze a silhouette and both count, which keeps the parity.

use cf_grid::{Grid2L, SmallCell, VisitState, ZRange, visit_segment};
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;
use tracing::debug;

use crate::params::QueryParams;
use crate::result::{InsideResult, PointInsideParams};
use crate::scratch::QueryScratch;
use crate::source::TriangleSource;

/// Floor on the crossing merge distance, relative to the ray length.
const MERGE_RELATIVE: f64 = 1e-12;

/// Classifies `point` against the closed surface in `source`, casting a ray
/// along `direction`.
///
/// The result also reports the crossing nearest to `point` along the ray.
/// Faces hit within `params.negligible_distance` of each other along the ray
/// and with the same facing count as one crossing. A zero or non-finite direction, or a ray whose footprint misses the grid,
/// counts no crossings.
///
/// # Example
///
/// ```
/// use cf_grid::{GridParams, build_grid};
/// use mesh_collide::{CollisionMesh, QueryParams, QueryScratch, TriangleSource, point_inside};
/// use nalgebra::{Point3, Vector3};
///
/// let cube = CollisionMesh::unit_cube();
/// let grid = build_grid(&cube.triangle_arrays(), &GridParams::default()).unwrap();
/// let mut scratch = QueryScratch::new();
/// let params = QueryParams::default();
///
/// let up = Vector3::z();
/// let inside = point_inside(&cube, &grid, &Point3::new(0.3, 0.6, 0.25), &up, &params, &mut scratch);
/// assert!(inside.inside);
/// assert!((inside.nearest.unwrap().depth - 0.75).abs() < 1e-12);
///
/// let outside = point_inside(&cube, &grid, &Point3::new(0.3, 0.6, 1.5), &up, &params, &mut scratch);
/// assert!(!outside.inside);
/// ```
pub fn point_inside<S>(
    source: &S,
    grid: &Grid2L,
    point: &Point3<f64>,
    direction: &Vector3<f64>,
    params: &QueryParams,
    scratch: &mut QueryScratch,
) -> InsideResult
where
    S: TriangleSource + ?Sized,
{
    let Some(unit_dir) = direction.try_normalize(0.0) else {
        return InsideResult::default();
    };
    if !unit_dir.iter().all(|c| c.is_finite()) {
        return InsideResult::default();
    }

    let bounds = grid.bounds();
    let start = point.xy();
    let length =
        (bounds.diagonal() + bounds.distance_to_point(&start)) * params.ray_length_factor;
    let ray = unit_dir * length;
    let end = start + ray.xy();

    let faces = &mut scratch.faces;
    faces.begin(source.face_count());

    let mut result = InsideResult::default();
    let mut nearest_t = f64::INFINITY;
    let pad = params.negligible_distance;
    let merge = params.negligible_distance.max(length * MERGE_RELATIVE);
    // (depth, front_facing) of each counted crossing
    let mut counted: SmallVec<[(f64, bool); 8]> = SmallVec::new();

    let mut scan = |state: &VisitState, cell: &SmallCell| {
        // A vertical ray spends its whole length in one column
        let (t0, t1) = if start == end {
            (0.0, 1.0)
        } else {
            state.segment().unwrap_or((0.0, 1.0))
        };
        let span = ZRange::new(point.z + ray.z * t0, point.z + ray.z * t1);
        let span = ZRange::new(span.min - pad, span.max + pad);
        if !span.overlaps(&cell.z_range()) {
            return false;
        }

        for &face in cell.faces() {
            let face = face as usize;
            if !faces.mark(face) {
                continue;
            }
            let Some(hit) = source.intersect(face, point, &ray, params.cull_backfaces) else {
                continue;
            };
            if hit.t > 1.0 {
                continue;
            }
            let depth = hit.t * length;
            if counted
                .iter()
                .any(|&(d, front)| front == hit.front_facing && (d - depth).abs() <= merge)
            {
                continue;
            }
            counted.push((depth, hit.front_facing));
            result.crossings += 1;
            if hit.t < nearest_t {
                nearest_t = hit.t;
                result.nearest = Some(PointInsideParams {
                    normal: source.triangle_normal(face).unwrap_or_else(Vector3::zeros),
                    depth,
                    face,
                });
            }
        }
        false
    };
    visit_segment(grid, &start, &end, &mut scan);

    result.inside = result.crossings % 2 == 1;
    debug!(
        crossings = result.crossings,
        inside = result.inside,
        "Point inside query"
    );
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use crate::mesh::CollisionMesh;
    use approx::assert_relative_eq;
    use cf_grid::{GridParams, build_grid};

    fn cube_grid(params: &GridParams) -> (CollisionMesh, Grid2L) {
        let cube = CollisionMesh::unit_cube();
        let grid = build_grid(&cube.triangle_arrays(), params).unwrap();
        (cube, grid)
    }

    fn classify(mesh: &CollisionMesh, grid: &Grid2L, p: Point3<f64>, dir: Vector3<f64>) -> InsideResult {
        point_inside(
            mesh,
            grid,
            &p,
            &dir,
            &QueryParams::default(),
            &mut QueryScratch::new(),
        )
    }

    #[test]
    fn test_vertical_ray_through_cube() {
        let (cube, grid) = cube_grid(&GridParams::fine());
        let r = classify(&cube, &grid, Point3::new(0.3, 0.6, 0.4), Vector3::z());
        assert!(r.inside);
        assert_eq!(r.crossings, 1);
        let nearest = r.nearest.unwrap();
        assert_relative_eq!(nearest.depth, 0.6, epsilon = 1e-12);
        assert_relative_eq!(nearest.normal.z, 1.0, epsilon = 1e-12);

        let below = classify(&cube, &grid, Point3::new(0.3, 0.6, -1.0), Vector3::z());
        assert!(!below.inside);
        assert_eq!(below.crossings, 2);
        assert_relative_eq!(below.nearest.unwrap().depth, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_oblique_rays_agree() {
        let (cube, grid) = cube_grid(&GridParams::default().with_big_cell_size(0.3));
        let dirs = [
            Vector3::new(1.0, 0.3, 0.2),
            Vector3::new(-0.4, 1.0, -0.7),
            Vector3::new(0.1, -0.2, -1.0),
        ];
        for dir in dirs {
            assert!(classify(&cube, &grid, Point3::new(0.41, 0.52, 0.63), dir).inside);
            assert!(!classify(&cube, &grid, Point3::new(1.41, 0.52, 0.63), dir).inside);
            assert!(!classify(&cube, &grid, Point3::new(0.41, 0.52, 1.63), dir).inside);
        }
    }

    #[test]
    fn test_ray_missing_grid() {
        let (cube, grid) = cube_grid(&GridParams::default());
        let r = classify(&cube, &grid, Point3::new(3.0, 3.0, 0.5), Vector3::x());
        assert_eq!(r, InsideResult::default());
    }

    #[test]
    fn test_zero_direction() {
        let (cube, grid) = cube_grid(&GridParams::default());
        let r = classify(&cube, &grid, Point3::new(0.5, 0.5, 0.5), Vector3::zeros());
        assert!(!r.inside);
        assert_eq!(r.crossings, 0);
    }

    #[test]
    fn test_face_spanning_cells_counted_once() {
        // A single large sloped face referenced by many small cells
        let tris = vec![Triangle::from_arrays(
            [0.0, 0.0, 0.0],
            [10.0, 0.0, 1.0],
            [0.0, 10.0, 1.0],
        )];
        let grid = build_grid(
            &tris.triangle_arrays(),
            &GridParams::default().with_big_cell_size(1.0),
        )
        .unwrap();
        let r = point_inside(
            &tris,
            &grid,
            &Point3::new(0.5, 0.5, -1.0),
            &Vector3::new(1.0, 1.0, 1.0),
            &QueryParams::default(),
            &mut QueryScratch::new(),
        );
        assert_eq!(r.crossings, 1);
    }

    #[test]
    fn test_shared_edge_counts_once() {
        let (cube, grid) = cube_grid(&GridParams::default());
        // The top face is split along x == y
        for p in [Point3::new(0.5, 0.5, 0.5), Point3::new(0.25, 0.25, 0.5)] {
            let r = classify(&cube, &grid, p, Vector3::z());
            assert!(r.inside, "{p:?}");
            assert_eq!(r.crossings, 1);
            assert_relative_eq!(r.nearest.unwrap().depth, 0.5, epsilon = 1e-9);
        }

        // Oblique ray exiting through the top diagonal at (0.75, 0.75, 1)
        let r = classify(&cube, &grid, Point3::new(0.5, 0.5, 0.5), Vector3::new(1.0, 1.0, 2.0));
        assert!(r.inside);
        assert_eq!(r.crossings, 1);

        let below = classify(&cube, &grid, Point3::new(0.5, 0.5, -1.0), Vector3::z());
        assert!(!below.inside);
        assert_eq!(below.crossings, 2);
    }

    #[test]
    fn test_shared_vertex_counts_once() {
        let (cube, grid) = cube_grid(&GridParams::default());
        // Every face meeting at the corner (1, 1, 1) is hit
        let r = classify(&cube, &grid, Point3::new(0.5, 0.5, 0.5), Vector3::new(1.0, 1.0, 1.0));
        assert!(r.inside);
        assert_eq!(r.crossings, 1);
        assert_relative_eq!(r.nearest.unwrap().depth, 0.75_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_silhouette_graze_keeps_parity() {
        let (cube, grid) = cube_grid(&GridParams::default());
        // Grazes the top-front edge from outside: front face and top face
        // meet there with opposite facing along the ray
        let r = classify(&cube, &grid, Point3::new(0.5, -0.5, 0.5), Vector3::new(0.0, 1.0, 1.0));
        assert!(!r.inside);
        assert_eq!(r.crossings % 2, 0);
    }

    #[test]
    fn test_backface_culling() {
        let (cube, grid) = cube_grid(&GridParams::default());
        let params = QueryParams::default().with_cull_backfaces(true);
        let r = point_inside(
            &cube,
            &grid,
            &Point3::new(0.3, 0.6, -1.0),
            &Vector3::z(),
            &params,
            &mut QueryScratch::new(),
        );
        // Bottom is seen from outside, top from inside
        assert_eq!(r.crossings, 1);
        assert_eq!(r.nearest.unwrap().normal, Vector3::new(0.0, 0.0, -1.0));
    }
}
