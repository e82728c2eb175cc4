//! Vertical ray shooting for height queries.
//!
//! A vertical line meets only the faces of the one small cell containing its
//! footprint, so a shot is a single point visit.

use cf_grid::{Grid2L, SmallCell, VisitState, ZRange, visit_point};
use nalgebra::Point2;

use crate::result::VertIntersectionResult;
use crate::source::TriangleSource;

/// Shoots a vertical ray at `point` from height `from` toward `to`.
///
/// Only hits within `[min(from, to), max(from, to)]` count. Among them, the
/// one farthest along the direction of travel wins: the highest when
/// shooting up, the lowest when shooting down. A miss keeps the infinite
/// sentinel of [`VertIntersectionResult::not_found`].
///
/// # Example
///
/// ```
/// use cf_grid::{GridParams, build_grid};
/// use mesh_collide::{Triangle, TriangleSource, shoot_vertical};
/// use nalgebra::Point2;
///
/// let floor = vec![
///     Triangle::from_arrays([0.0, 0.0, 5.0], [4.0, 0.0, 5.0], [4.0, 4.0, 5.0]),
///     Triangle::from_arrays([0.0, 0.0, 5.0], [4.0, 4.0, 5.0], [0.0, 4.0, 5.0]),
/// ];
/// let grid = build_grid(&floor.triangle_arrays(), &GridParams::default()).unwrap();
/// let p = Point2::new(1.0, 2.0);
///
/// assert_eq!(shoot_vertical(&floor, &grid, &p, 0.0, 10.0).height, 5.0);
/// assert_eq!(shoot_vertical(&floor, &grid, &p, 10.0, 0.0).height, 5.0);
/// assert!(!shoot_vertical(&floor, &grid, &p, 6.0, 10.0).is_found());
/// ```
pub fn shoot_vertical<S>(
    source: &S,
    grid: &Grid2L,
    point: &Point2<f64>,
    from: f64,
    to: f64,
) -> VertIntersectionResult
where
    S: TriangleSource + ?Sized,
{
    shoot_vertical_filtered(source, grid, point, from, to, |_| true)
}

/// Like [`shoot_vertical`], considering only faces for which `filter`
/// returns `true`.
pub fn shoot_vertical_filtered<S, F>(
    source: &S,
    grid: &Grid2L,
    point: &Point2<f64>,
    from: f64,
    to: f64,
    mut filter: F,
) -> VertIntersectionResult
where
    S: TriangleSource + ?Sized,
    F: FnMut(usize) -> bool,
{
    let mut best = VertIntersectionResult::not_found(from, to);
    let upward = to >= from;
    let window = ZRange::new(from, to);

    visit_point(grid, point, &mut |_: &VisitState, cell: &SmallCell| {
        if !window.overlaps(&cell.z_range()) {
            return true;
        }
        for &face in cell.faces() {
            let face = face as usize;
            if !filter(face) {
                continue;
            }
            let Some((height, barycentric)) = source.vertical_intersect(face, point) else {
                continue;
            };
            if !window.contains(height) {
                continue;
            }
            let improves = if upward {
                height > best.height
            } else {
                height < best.height
            };
            if improves {
                best = VertIntersectionResult {
                    height,
                    face: Some(face),
                    barycentric,
                };
            }
        }
        best.is_found()
    });
    best
}
