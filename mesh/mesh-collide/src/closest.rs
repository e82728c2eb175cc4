//! Closest point on the surface.
//!
//! The search expands a circle over the grid from the query point's
//! footprint. Cells arrive in order of increasing horizontal distance, so
//! once a cell is farther away than the best candidate nothing later can
//! improve it. Cells whose column box is out of reach in 3D are skipped
//! without touching their triangles, and each triangle is measured at most
//! once per query however many cells reference it.

use cf_grid::{Grid2L, SmallCell, VisitState, visit_circle};
use nalgebra::{Point3, Vector2};
use tracing::debug;

use crate::params::QueryParams;
use crate::result::ClosestPointResult;
use crate::scratch::QueryScratch;
use crate::source::TriangleSource;

/// Finds the point of the surface nearest to `origin`, strictly within
/// `max_distance`.
///
/// Returns `None` if nothing lies within range or if the horizontal position
/// of `origin` is outside the grid. Among equally distant faces the first one
/// examined wins.
///
/// # Example
///
/// ```
/// use cf_grid::{GridParams, build_grid};
/// use mesh_collide::{QueryParams, QueryScratch, Triangle, TriangleSource, closest_point};
/// use nalgebra::Point3;
///
/// let tris = vec![
///     Triangle::from_arrays([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]),
///     Triangle::from_arrays([0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]),
/// ];
/// let grid = build_grid(&tris.triangle_arrays(), &GridParams::default()).unwrap();
///
/// let mut scratch = QueryScratch::new();
/// let hit = closest_point(
///     &tris,
///     &grid,
///     &Point3::new(0.25, 0.5, 2.0),
///     10.0,
///     &QueryParams::default(),
///     &mut scratch,
/// )
/// .unwrap();
/// assert!((hit.distance - 2.0).abs() < 1e-12);
/// assert_eq!(hit.face, 1);
/// ```
pub fn closest_point<S>(
    source: &S,
    grid: &Grid2L,
    origin: &Point3<f64>,
    max_distance: f64,
    params: &QueryParams,
    scratch: &mut QueryScratch,
) -> Option<ClosestPointResult>
where
    S: TriangleSource + ?Sized,
{
    let QueryScratch { cells, faces } = scratch;
    faces.begin(source.face_count());

    let mut best: Option<ClosestPointResult> = None;
    let mut bound = max_distance;
    let mut examined = 0usize;

    visit_circle(
        grid,
        &origin.xy(),
        max_distance,
        cells,
        &mut |state: &VisitState, cell: &SmallCell| {
            if best.is_some() && bound <= params.negligible_distance {
                return true;
            }
            let d_xy = state.distance().unwrap_or(0.0);
            if d_xy >= bound {
                return true;
            }
            let d_z = cell.z_range().distance_to(origin.z);
            if d_xy.hypot(d_z) >= bound {
                return false;
            }

            for &face in cell.faces() {
                let face = face as usize;
                if !faces.mark(face) {
                    continue;
                }
                examined += 1;
                if let Some((distance, point)) = source.closest(bound, face, origin) {
                    bound = distance;
                    let barycentric = source
                        .triangle(face)
                        .barycentric(&point)
                        .unwrap_or_else(Vector2::zeros);
                    best = Some(ClosestPointResult {
                        distance,
                        face,
                        point,
                        barycentric,
                    });
                }
            }
            false
        },
    );

    debug!(
        examined,
        found = best.is_some(),
        distance = best.map(|b| b.distance),
        "Closest point query"
    );
    best
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::geometry::{Triangle, closest_point_on_triangle};
    use approx::assert_relative_eq;
    use cf_grid::{GridParams, build_grid};

    fn unit_square(z: f64) -> Vec<Triangle> {
        vec![
            Triangle::from_arrays([0.0, 0.0, z], [1.0, 0.0, z], [1.0, 1.0, z]),
            Triangle::from_arrays([0.0, 0.0, z], [1.0, 1.0, z], [0.0, 1.0, z]),
        ]
    }

    fn query(tris: &[Triangle], grid: &Grid2L, p: Point3<f64>, max: f64) -> Option<ClosestPointResult> {
        closest_point(
            tris,
            grid,
            &p,
            max,
            &QueryParams::default(),
            &mut QueryScratch::with_epoch(7),
        )
    }

    #[test]
    fn test_point_above_square() {
        let tris = unit_square(0.0);
        let grid = build_grid(&tris.triangle_arrays(), &GridParams::default()).unwrap();

        let hit = query(&tris, &grid, Point3::new(0.5, 0.5, 3.0), 10.0).unwrap();
        assert_relative_eq!(hit.distance, 3.0, epsilon = 1e-12);
        assert_relative_eq!(hit.point.z, 0.0, epsilon = 1e-12);
        let back = tris[hit.face].point_at(&hit.barycentric);
        assert_relative_eq!(back.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(back.y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_range() {
        let tris = unit_square(0.0);
        let grid = build_grid(&tris.triangle_arrays(), &GridParams::default()).unwrap();
        assert!(query(&tris, &grid, Point3::new(0.5, 0.5, 3.0), 2.0).is_none());
        // Exactly at the limit is not strictly within
        assert!(query(&tris, &grid, Point3::new(0.5, 0.5, 3.0), 3.0).is_none());
    }

    #[test]
    fn test_footprint_outside_grid() {
        let tris = unit_square(0.0);
        let grid = build_grid(&tris.triangle_arrays(), &GridParams::default()).unwrap();
        assert!(query(&tris, &grid, Point3::new(1.5, 0.5, 0.0), 10.0).is_none());
    }

    #[test]
    fn test_matches_brute_force_on_slope() {
        let mut tris = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                let (x, y) = (f64::from(i), f64::from(j));
                let z = |x: f64, y: f64| (x * 0.7).sin() + (y * 0.3).cos() * 2.0;
                tris.push(Triangle::from_arrays(
                    [x, y, z(x, y)],
                    [x + 1.0, y, z(x + 1.0, y)],
                    [x + 1.0, y + 1.0, z(x + 1.0, y + 1.0)],
                ));
                tris.push(Triangle::from_arrays(
                    [x, y, z(x, y)],
                    [x + 1.0, y + 1.0, z(x + 1.0, y + 1.0)],
                    [x, y + 1.0, z(x, y + 1.0)],
                ));
            }
        }
        let params = GridParams::default()
            .with_big_cell_size(2.5)
            .with_faces_per_small_cell(2);
        let grid = build_grid(&tris.triangle_arrays(), &params).unwrap();

        for p in [
            Point3::new(3.3, 4.1, 5.0),
            Point3::new(0.1, 9.9, -3.0),
            Point3::new(7.5, 2.5, 0.2),
        ] {
            let hit = query(&tris, &grid, p, 100.0).unwrap();
            let brute = tris
                .iter()
                .map(|t| (closest_point_on_triangle(&p, t) - p).norm())
                .fold(f64::INFINITY, f64::min);
            assert_relative_eq!(hit.distance, brute, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_negligible_distance_stops_early() {
        let tris = unit_square(0.0);
        let grid = build_grid(&tris.triangle_arrays(), &GridParams::fine()).unwrap();
        let hit = closest_point(
            &tris,
            &grid,
            &Point3::new(0.5, 0.5, 0.0),
            1.0,
            &QueryParams::default().with_negligible_distance(1e-3),
            &mut QueryScratch::new(),
        )
        .unwrap();
        assert_eq!(hit.distance, 0.0);
    }
}
