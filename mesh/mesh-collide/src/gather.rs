//! Collection of the faces under a rectangle or a contour.
//!
//! Results are conservative at cell granularity: every face referenced by a
//! small cell that meets the region is returned, once, in the order it was
//! first met.

use cf_grid::{Grid2L, Rect, SmallCell, VisitState, ZRange, visit_rect};
use nalgebra::Point2;
use tracing::debug;

use crate::scratch::QueryScratch;
use crate::triangulate::triangulate_contour;

/// Faces referenced by the small cells overlapping `rect`.
///
/// With `z_range`, cells whose Z range misses it are skipped.
///
/// # Example
///
/// ```
/// use cf_grid::{GridParams, Rect, build_grid};
/// use mesh_collide::{QueryScratch, Triangle, TriangleSource, triangles_in_rect};
/// use nalgebra::Point2;
///
/// let tris = vec![
///     Triangle::from_arrays([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
///     Triangle::from_arrays([8.0, 8.0, 0.0], [9.0, 8.0, 0.0], [8.0, 9.0, 0.0]),
/// ];
/// let grid = build_grid(&tris.triangle_arrays(), &GridParams::default().with_big_cell_size(2.0)).unwrap();
///
/// let rect = Rect::new(Point2::new(-1.0, -1.0), Point2::new(3.0, 3.0));
/// let faces = triangles_in_rect(tris.len(), &grid, &rect, None, &mut QueryScratch::new());
/// assert_eq!(faces, vec![0]);
/// ```
pub fn triangles_in_rect(
    face_count: usize,
    grid: &Grid2L,
    rect: &Rect,
    z_range: Option<ZRange>,
    scratch: &mut QueryScratch,
) -> Vec<usize> {
    let faces = &mut scratch.faces;
    faces.begin(face_count);

    let mut out = Vec::new();
    visit_rect(grid, rect, &mut |_: &VisitState, cell: &SmallCell| {
        collect(cell, z_range, &mut |face| {
            if faces.mark(face) {
                out.push(face);
            }
        });
        false
    });

    debug!(found = out.len(), "Faces in rectangle");
    out
}

/// Faces referenced by the small cells overlapping the polygon `contour`.
///
/// The contour is cleaned with `epsilon` and triangulated; each piece drives
/// a rectangle visit whose cells are kept only if they meet the piece
/// itself. Degenerate contours select nothing.
pub fn triangles_in_contour(
    face_count: usize,
    grid: &Grid2L,
    contour: &[Point2<f64>],
    z_range: Option<ZRange>,
    epsilon: f64,
    scratch: &mut QueryScratch,
) -> Vec<usize> {
    let pieces = triangulate_contour(contour, epsilon);
    let faces = &mut scratch.faces;
    faces.begin(face_count);

    let mut out = Vec::new();
    for [a, b, c] in &pieces {
        let mut bounds = Rect::new(*a, *b);
        bounds.expand_to_include(c);
        visit_rect(grid, &bounds, &mut |state: &VisitState, cell: &SmallCell| {
            let small = state.small.unwrap_or(0);
            if grid.small_rect(state.big, small).overlaps_triangle(a, b, c) {
                collect(cell, z_range, &mut |face| {
                    if faces.mark(face) {
                        out.push(face);
                    }
                });
            }
            false
        });
    }

    debug!(
        pieces = pieces.len(),
        found = out.len(),
        "Faces in contour"
    );
    out
}

fn collect(cell: &SmallCell, z_range: Option<ZRange>, sink: &mut impl FnMut(usize)) {
    if z_range.is_some_and(|z| !z.overlaps(&cell.z_range())) {
        return;
    }
    for &face in cell.faces() {
        sink(face as usize);
    }
}
