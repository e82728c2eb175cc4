//! Expanding-circle search over a [`Grid2L`].
//!
//! Cells are visited in order of increasing distance from a center point,
//! which lets a nearest-neighbour query stop as soon as the next cell is
//! farther than its best candidate.
//!
//! The search keeps a priority queue of traversal nodes keyed by the distance
//! from the center to the node's rectangle. A node is a small cell of a
//! non-empty big cell, or a whole empty big cell. Empty big cells are never
//! handed to the visitor but still propagate the search, so sparse regions do
//! not cut it off.
//!
//! Neighbouring big cells may use different small-cell resolutions; across a
//! big-cell border every small cell whose closed rectangle touches the current
//! node is a neighbour.

// Big-cell coordinates are stepped in signed arithmetic.
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use nalgebra::Point2;
use smallvec::SmallVec;

use crate::cell::{CellId, Extents};
use crate::epoch::EpochMarks;
use crate::grid::{BigCell, Grid2L, SmallCell};
use crate::visit::{CellVisitor, VisitParam, VisitState};

/// Queue entry ordered so that [`BinaryHeap`] pops the nearest node first.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueueEntry<I> {
    pub distance: f64,
    pub key: usize,
    pub id: I,
}

impl<I> PartialEq for QueueEntry<I> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<I> Eq for QueueEntry<I> {}

impl<I> PartialOrd for QueueEntry<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I> Ord for QueueEntry<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: smaller distance and then smaller key have priority
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.key.cmp(&self.key))
    }
}

/// Visits the small cells within `max_radius` of `center` in order of
/// increasing distance.
///
/// Each visit carries [`VisitParam::Distance`] with the distance from
/// `center` to the cell rectangle (zero for the cell containing it). `marks`
/// is reset at the start and records which nodes were queued.
///
/// Nothing is visited if `center` lies outside the grid.
///
/// # Example
///
/// ```
/// use cf_grid::{EpochMarks, GridParams, SmallCell, VisitState, build_grid, circle};
/// use nalgebra::{Point2, Point3};
///
/// let triangles = [
///     [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
///     [Point3::new(9.0, 9.0, 0.0), Point3::new(10.0, 9.0, 0.0), Point3::new(9.0, 10.0, 0.0)],
/// ];
/// let grid = build_grid(&triangles, &GridParams::default().with_big_cell_size(2.0)).unwrap();
///
/// let mut marks = EpochMarks::new();
/// let mut distances = Vec::new();
/// circle::visit_circle(&grid, &Point2::new(0.5, 0.5), 100.0, &mut marks, &mut |state: &VisitState, _: &SmallCell| {
///     distances.push(state.distance().unwrap());
///     false
/// });
/// assert_eq!(distances.len(), 2);
/// assert!(distances[0] < distances[1]);
/// ```
pub fn visit_circle<V>(
    grid: &Grid2L,
    center: &Point2<f64>,
    max_radius: f64,
    marks: &mut EpochMarks,
    visitor: &mut V,
) -> bool
where
    V: CellVisitor<SmallCell> + ?Sized,
{
    let Some(start) = grid.locate(center) else {
        return false;
    };

    marks.begin(grid.node_count());
    let mut queue = BinaryHeap::new();
    let start_key = grid.node_key(start);
    marks.mark(start_key);
    queue.push(QueueEntry {
        distance: 0.0,
        key: start_key,
        id: start,
    });

    while let Some(QueueEntry { distance, id, .. }) = queue.pop() {
        if distance > max_radius {
            break;
        }

        if let Some(cell) = grid.small_cell(id) {
            let state = VisitState {
                big: id.big,
                small: id.small,
                param: VisitParam::Distance(distance),
            };
            if visitor.visit(&state, cell) {
                return true;
            }
        }

        for neighbour in neighbours(grid, id) {
            let key = grid.node_key(neighbour);
            if marks.is_marked(key) {
                continue;
            }
            // Pruned nodes stay pruned, so they can be marked as well
            marks.mark(key);
            let d = grid.node_rect(neighbour).distance_to_point(center);
            if d <= max_radius {
                queue.push(QueueEntry {
                    distance: d,
                    key,
                    id: neighbour,
                });
            }
        }
    }
    false
}

/// Nodes whose closed rectangles touch the rectangle of `id`.
fn neighbours(grid: &Grid2L, id: CellId) -> SmallVec<[CellId; 16]> {
    let mut out = SmallVec::new();
    let grid_ext = grid.extents();
    let (bx, by) = grid_ext.coord(id.big);
    // An empty big cell behaves as a single-cell big cell
    let own = grid
        .big_cell(id.big)
        .map_or(Extents::new(1, 1), BigCell::extents);
    let (sx, sy) = own.coord(id.small.unwrap_or(0));

    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            let nbx = bx as i64 + dx;
            let nby = by as i64 + dy;
            if !grid_ext.contains(nbx, nby) {
                continue;
            }
            // Only cells on the matching border reach into the next big cell
            if !on_border(dx, sx, own.width) || !on_border(dy, sy, own.height) {
                continue;
            }

            let neighbour_index = grid_ext.index(nbx as usize, nby as usize);

            if dx == 0 && dy == 0 {
                if id.small.is_none() {
                    continue;
                }
                let (x0, x1) = (sx.saturating_sub(1), (sx + 1).min(own.width - 1));
                let (y0, y1) = (sy.saturating_sub(1), (sy + 1).min(own.height - 1));
                for y in y0..=y1 {
                    for x in x0..=x1 {
                        if (x, y) != (sx, sy) {
                            out.push(CellId::small(id.big, own.index(x, y)));
                        }
                    }
                }
                continue;
            }

            let Some(next) = grid.big_cell(neighbour_index) else {
                out.push(CellId::big(neighbour_index));
                continue;
            };
            let next_ext = next.extents();
            let (x0, x1) = strip(dx, sx, own.width, next_ext.width);
            let (y0, y1) = strip(dy, sy, own.height, next_ext.height);
            for y in y0..=y1 {
                for x in x0..=x1 {
                    out.push(CellId::small(neighbour_index, next_ext.index(x, y)));
                }
            }
        }
    }
    out
}

/// Whether a cell at `s` of `n` may step by `d` into the next big cell.
const fn on_border(d: i64, s: usize, n: usize) -> bool {
    match d {
        -1 => s == 0,
        1 => s + 1 == n,
        _ => true,
    }
}

/// Inclusive range of neighbour-cell indices along one axis.
///
/// `d` is the big-cell step, `s` the current index out of `n` cells, and
/// `m` the resolution of the neighbouring big cell.
const fn strip(d: i64, s: usize, n: usize, m: usize) -> (usize, usize) {
    match d {
        -1 => (m - 1, m - 1),
        1 => (0, 0),
        _ => {
            // Cells j with [j/m, (j+1)/m] touching [s/n, (s+1)/n]
            let lo = (s * m).div_ceil(n).saturating_sub(1);
            let hi = (s + 1) * m / n;
            let hi = if hi > m - 1 { m - 1 } else { hi };
            (lo, hi)
        }
    }
}
