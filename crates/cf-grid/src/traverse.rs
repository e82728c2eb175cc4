//! Point, rectangle, segment and full-grid traversals over a [`Grid2L`].
//!
//! All traversals only ever hand small cells of non-empty big cells to the
//! visitor and return `true` iff the visitor asked to stop.
//!
//! # Example
//!
//! ```
//! use cf_grid::{GridParams, Rect, SmallCell, VisitState, build_grid, traverse};
//! use nalgebra::{Point2, Point3};
//!
//! let triangles = [[
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(10.0, 0.0, 0.0),
//!     Point3::new(0.0, 10.0, 1.0),
//! ]];
//! let grid = build_grid(&triangles, &GridParams::default().with_big_cell_size(5.0)).unwrap();
//!
//! let mut faces = Vec::new();
//! let rect = Rect::new(Point2::new(1.0, 1.0), Point2::new(2.0, 2.0));
//! traverse::visit_rect(&grid, &rect, &mut |_: &VisitState, cell: &SmallCell| {
//!     faces.extend_from_slice(cell.faces());
//!     false
//! });
//! assert_eq!(faces, vec![0]);
//! ```

// Lattice coordinates are converted between f64 and integer indices.
#![allow(clippy::cast_precision_loss)]

use nalgebra::{Point2, Vector2};

use crate::grid::{Grid2L, SmallCell};
use crate::rect::Rect;
use crate::visit::{CellVisitor, VisitParam, VisitState};
use crate::walk::GridWalk;

/// Visits the single small cell containing `point`.
///
/// Nothing is visited if the point lies outside the grid or in an empty big
/// cell.
pub fn visit_point<V>(grid: &Grid2L, point: &Point2<f64>, visitor: &mut V) -> bool
where
    V: CellVisitor<SmallCell> + ?Sized,
{
    visit_located(grid, point, VisitParam::None, visitor)
}

fn visit_located<V>(grid: &Grid2L, point: &Point2<f64>, param: VisitParam, visitor: &mut V) -> bool
where
    V: CellVisitor<SmallCell> + ?Sized,
{
    let Some(id) = grid.locate(point) else {
        return false;
    };
    let Some(cell) = grid.small_cell(id) else {
        return false;
    };
    let state = VisitState {
        big: id.big,
        small: id.small,
        param,
    };
    visitor.visit(&state, cell)
}

/// Visits every small cell whose closed rectangle overlaps `rect`.
///
/// Big cells are processed row-major, and the matching small cells of each
/// big cell row-major. [`CellVisitor::finish_big_cell`] runs after each
/// overlapping big cell, empty ones included.
pub fn visit_rect<V>(grid: &Grid2L, rect: &Rect, visitor: &mut V) -> bool
where
    V: CellVisitor<SmallCell> + ?Sized,
{
    let Some(big_range) = grid.big_range(rect) else {
        return false;
    };
    let extents = grid.extents();

    for (bx, by) in big_range.iter() {
        let big_index = extents.index(bx, by);
        if let (Some(big), Some(small_range)) =
            (grid.big_cell(big_index), grid.small_range(big_index, rect))
        {
            let small_ext = big.extents();
            for (sx, sy) in small_range.iter() {
                let small_index = small_ext.index(sx, sy);
                let state = VisitState {
                    big: big_index,
                    small: Some(small_index),
                    param: VisitParam::None,
                };
                if visitor.visit(&state, &big.cells()[small_index]) {
                    return true;
                }
            }
        }
        visitor.finish_big_cell(big_index);
    }
    false
}

/// Visits the small cells crossed by the segment `a -> b`, in order from `a`.
///
/// The segment is first clipped to the grid. Each visit carries
/// [`VisitParam::Segment`] with the parameter range inside the cell, relative
/// to the unclipped segment. A zero-length segment visits the cell containing
/// its point, with both parameters zero.
pub fn visit_segment<V>(grid: &Grid2L, a: &Point2<f64>, b: &Point2<f64>, visitor: &mut V) -> bool
where
    V: CellVisitor<SmallCell> + ?Sized,
{
    if a == b {
        return visit_located(
            grid,
            a,
            VisitParam::Segment {
                enter: 0.0,
                exit: 0.0,
            },
            visitor,
        );
    }

    let Some((t0, t1)) = grid.bounds().clip_segment(a, b) else {
        return false;
    };

    let start = grid.to_local(a);
    let end = grid.to_local(b);
    let dir = end - start;
    let extents = grid.extents();

    for big_step in GridWalk::new(start, dir, t0, t1, extents) {
        let big_index = extents.index(big_step.x, big_step.y);
        let Some(big) = grid.big_cell(big_index) else {
            continue;
        };

        // Local coordinates of the big cell scaled to its own resolution
        let small_ext = big.extents();
        let scale = Vector2::new(small_ext.width as f64, small_ext.height as f64);
        let offset = Vector2::new(big_step.x as f64, big_step.y as f64);
        let small_start = Point2::from((start.coords - offset).component_mul(&scale));
        let small_dir = dir.component_mul(&scale);

        let walk = GridWalk::new(
            small_start,
            small_dir,
            big_step.enter,
            big_step.exit,
            small_ext,
        );
        for step in walk {
            let small_index = small_ext.index(step.x, step.y);
            let state = VisitState {
                big: big_index,
                small: Some(small_index),
                param: VisitParam::Segment {
                    enter: step.enter,
                    exit: step.exit,
                },
            };
            if visitor.visit(&state, &big.cells()[small_index]) {
                return true;
            }
        }
    }
    false
}

/// Visits every small cell of every non-empty big cell in storage order.
///
/// [`CellVisitor::finish_big_cell`] runs after each big cell, empty ones
/// included.
pub fn visit_all<V>(grid: &Grid2L, visitor: &mut V) -> bool
where
    V: CellVisitor<SmallCell> + ?Sized,
{
    for (big_index, big) in grid.big_cells().iter().enumerate() {
        if let Some(big) = big {
            for (small_index, cell) in big.cells().iter().enumerate() {
                let state = VisitState {
                    big: big_index,
                    small: Some(small_index),
                    param: VisitParam::None,
                };
                if visitor.visit(&state, cell) {
                    return true;
                }
            }
        }
        visitor.finish_big_cell(big_index);
    }
    false
}
