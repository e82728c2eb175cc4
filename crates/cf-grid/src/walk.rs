//! Cell walk along a segment using the DDA algorithm.
//!
//! [`GridWalk`] rasterizes a parametric segment through a unit lattice,
//! yielding every cell it crosses together with the parameter range spent
//! inside that cell. Both grid levels use it: the two-level segment traversal
//! runs one walk over the big cells and a nested walk over the small cells of
//! each big cell.
//!
//! Based on "A Fast Voxel Traversal Algorithm for Ray Tracing" by Amanatides
//! and Woo, restricted to two dimensions.

// Lattice coordinates are converted between f64 and integer indices.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use nalgebra::{Point2, Vector2};

use crate::cell::Extents;
use crate::grid::floor_clamp;

/// A cell crossed by a [`GridWalk`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkStep {
    /// Column of the cell.
    pub x: usize,
    /// Row of the cell.
    pub y: usize,
    /// Parameter at which the segment enters the cell.
    pub enter: f64,
    /// Parameter at which the segment leaves the cell.
    pub exit: f64,
}

/// An iterator over the lattice cells crossed by `start + dir * t`,
/// `t` in `[t0, t1]`.
///
/// Cell `(x, y)` covers `[x, x + 1) x [y, y + 1)`. The walk is clamped to the
/// given extents: it starts in the clamped cell containing `start + dir * t0`
/// and stops when it leaves the extents or reaches `t1`. Steps are yielded in
/// increasing `t`, and consecutive steps share their boundary parameter.
///
/// An axis with a zero direction component never steps along that axis. A
/// zero-length parameter range yields exactly one cell.
///
/// # Example
///
/// ```
/// use cf_grid::{Extents, GridWalk};
/// use nalgebra::{Point2, Vector2};
///
/// let walk = GridWalk::new(
///     Point2::new(0.5, 0.2),
///     Vector2::new(3.0, 1.0),
///     0.0,
///     1.0,
///     Extents::new(4, 4),
/// );
/// let cells: Vec<_> = walk.map(|s| (s.x, s.y)).collect();
/// assert_eq!(cells, vec![(0, 0), (1, 0), (2, 0), (2, 1), (3, 1)]);
/// ```
#[derive(Debug, Clone)]
pub struct GridWalk {
    /// Current cell.
    current: [i64; 2],
    /// Step direction for each axis (-1, 0 or 1).
    step: [i64; 2],
    /// Parameter of the next boundary crossing on each axis.
    t_max: [f64; 2],
    /// Parameter distance between boundaries on each axis.
    t_delta: [f64; 2],
    /// Parameter at which the current cell was entered.
    t_enter: f64,
    /// End of the parameter range.
    t_end: f64,
    /// Lattice bounds.
    extents: Extents,
    /// Whether the walk has finished.
    done: bool,
}

impl GridWalk {
    /// Creates a walk over the cells of `extents`.
    ///
    /// A reversed parameter range is treated as the single parameter `t0`.
    #[must_use]
    pub fn new(start: Point2<f64>, dir: Vector2<f64>, t0: f64, t1: f64, extents: Extents) -> Self {
        let t1 = t1.max(t0);
        let entry = start + dir * t0;
        let current = [
            floor_clamp(entry.x, extents.width) as i64,
            floor_clamp(entry.y, extents.height) as i64,
        ];

        let mut step = [0i64; 2];
        let mut t_max = [f64::INFINITY; 2];
        let mut t_delta = [f64::INFINITY; 2];

        let d = [dir.x, dir.y];
        let pos = [start.x, start.y];
        for axis in 0..2 {
            if d[axis] > 0.0 {
                step[axis] = 1;
                t_delta[axis] = 1.0 / d[axis];
                t_max[axis] = (current[axis] as f64 + 1.0 - pos[axis]) / d[axis];
            } else if d[axis] < 0.0 {
                step[axis] = -1;
                t_delta[axis] = -1.0 / d[axis];
                t_max[axis] = (current[axis] as f64 - pos[axis]) / d[axis];
            }
        }

        Self {
            current,
            step,
            t_max,
            t_delta,
            t_enter: t0,
            t_end: t1,
            extents,
            done: extents.is_empty(),
        }
    }
}

impl Iterator for GridWalk {
    type Item = WalkStep;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // Axis whose boundary is crossed first; X wins ties
        let axis = usize::from(self.t_max[1] < self.t_max[0]);
        let crossing = self.t_max[axis];
        let enter = self.t_enter;
        let exit = crossing.min(self.t_end).max(enter);

        let item = WalkStep {
            x: self.current[0] as usize,
            y: self.current[1] as usize,
            enter,
            exit,
        };

        if crossing >= self.t_end || crossing.is_nan() {
            self.done = true;
        } else {
            self.current[axis] += self.step[axis];
            self.t_max[axis] += self.t_delta[axis];
            self.t_enter = exit;
            if !self.extents.contains(self.current[0], self.current[1]) {
                self.done = true;
            }
        }

        Some(item)
    }
}
