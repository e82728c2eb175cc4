//! Single-level uniform grid with a generic cell payload.
//!
//! [`Grid1L`] is the flat counterpart of [`Grid2L`](crate::Grid2L): one array
//! of equally sized cells, each holding a `T`. It supports the same
//! traversals, with the cell index reported as [`VisitState::big`].
//!
//! # Example
//!
//! ```
//! use cf_grid::{Extents, Grid1L, VisitState};
//! use nalgebra::{Point2, Vector2};
//!
//! let mut grid: Grid1L<Vec<u32>> =
//!     Grid1L::new(Point2::origin(), Vector2::new(1.0, 1.0), Extents::new(4, 4)).unwrap();
//! grid.cell_mut(2, 1).unwrap().push(9);
//!
//! let mut found = Vec::new();
//! grid.visit_segment(&Point2::new(0.5, 1.5), &Point2::new(3.5, 1.5), &mut |_: &VisitState, items: &Vec<u32>| {
//!     found.extend_from_slice(items);
//!     false
//! });
//! assert_eq!(found, vec![9]);
//! ```

// Cell coordinates are converted between f64 and integer indices.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

use std::collections::BinaryHeap;

use nalgebra::{Point2, Vector2};

use crate::cell::Extents;
use crate::circle::QueueEntry;
use crate::epoch::EpochMarks;
use crate::error::{GridError, GridResult};
use crate::grid::{CellRange, floor_clamp};
use crate::rect::Rect;
use crate::visit::{CellVisitor, VisitParam, VisitState};
use crate::walk::GridWalk;

/// A uniform grid of `T` cells over the horizontal plane.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid1L<T> {
    origin: Point2<f64>,
    unit: Vector2<f64>,
    inv_unit: Vector2<f64>,
    extents: Extents,
    cells: Vec<T>,
}

impl<T: Default + Clone> Grid1L<T> {
    /// Creates a grid of default-valued cells.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidCellSize`] for a bad cell size and
    /// [`GridError::InvalidDimensions`] for empty or oversized extents.
    pub fn new(origin: Point2<f64>, unit: Vector2<f64>, extents: Extents) -> GridResult<Self> {
        Self::from_cells(origin, unit, extents, vec![T::default(); extents.cell_count()?])
    }
}

impl<T> Grid1L<T> {
    /// Creates a grid from existing cells, row-major.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CellCountMismatch`] if `cells` does not match
    /// `extents`, plus the errors of [`Grid1L::new`].
    pub fn from_cells(
        origin: Point2<f64>,
        unit: Vector2<f64>,
        extents: Extents,
        cells: Vec<T>,
    ) -> GridResult<Self> {
        for size in [unit.x, unit.y] {
            if size <= 0.0 || !size.is_finite() {
                return Err(GridError::InvalidCellSize(size));
            }
        }
        let expected = extents.cell_count()?;
        if cells.len() != expected {
            return Err(GridError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            origin,
            unit,
            inv_unit: Vector2::new(1.0 / unit.x, 1.0 / unit.y),
            extents,
            cells,
        })
    }

    /// World position of the lower-left corner.
    #[must_use]
    pub const fn origin(&self) -> &Point2<f64> {
        &self.origin
    }

    /// Cell size per axis.
    #[must_use]
    pub const fn unit(&self) -> &Vector2<f64> {
        &self.unit
    }

    /// Grid dimensions.
    #[must_use]
    pub const fn extents(&self) -> Extents {
        self.extents
    }

    /// All cells, row-major.
    #[must_use]
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Cell at `(x, y)`.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.extents.width || y >= self.extents.height {
            return None;
        }
        self.cells.get(self.extents.index(x, y))
    }

    /// Mutable cell at `(x, y)`.
    pub fn cell_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x >= self.extents.width || y >= self.extents.height {
            return None;
        }
        self.cells.get_mut(self.extents.index(x, y))
    }

    /// Mutable cell by linear index.
    pub fn cell_at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.cells.get_mut(index)
    }

    /// Converts a world point to continuous cell coordinates.
    #[must_use]
    pub fn to_local(&self, point: &Point2<f64>) -> Point2<f64> {
        let rel = point - self.origin;
        Point2::new(rel.x * self.inv_unit.x, rel.y * self.inv_unit.y)
    }

    /// Linear index of the cell containing `point`.
    ///
    /// Points on the outer border belong to the border cells.
    #[must_use]
    pub fn locate(&self, point: &Point2<f64>) -> Option<usize> {
        let local = self.to_local(point);
        let w = self.extents.width as f64;
        let h = self.extents.height as f64;
        if !(local.x >= 0.0 && local.x <= w && local.y >= 0.0 && local.y <= h) {
            return None;
        }
        Some(self.extents.index(
            floor_clamp(local.x, self.extents.width),
            floor_clamp(local.y, self.extents.height),
        ))
    }

    /// World rectangle of a cell.
    #[must_use]
    pub fn cell_rect(&self, index: usize) -> Rect {
        let (x, y) = self.extents.coord(index);
        let (x, y) = (x as f64, y as f64);
        Rect {
            min: Point2::new(
                x.mul_add(self.unit.x, self.origin.x),
                y.mul_add(self.unit.y, self.origin.y),
            ),
            max: Point2::new(
                (x + 1.0).mul_add(self.unit.x, self.origin.x),
                (y + 1.0).mul_add(self.unit.y, self.origin.y),
            ),
        }
    }

    /// World rectangle covered by the grid.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect {
            min: self.origin,
            max: Point2::new(
                (self.extents.width as f64).mul_add(self.unit.x, self.origin.x),
                (self.extents.height as f64).mul_add(self.unit.y, self.origin.y),
            ),
        }
    }

    /// Inclusive cell range overlapping `rect`, or `None` if it misses the grid.
    #[must_use]
    pub fn cell_range(&self, rect: &Rect) -> Option<CellRange> {
        let clipped = rect.intersection(&self.bounds())?;
        let lo = self.to_local(&clipped.min);
        let hi = self.to_local(&clipped.max);
        Some(CellRange {
            x0: floor_clamp(lo.x, self.extents.width),
            y0: floor_clamp(lo.y, self.extents.height),
            x1: floor_clamp(hi.x, self.extents.width),
            y1: floor_clamp(hi.y, self.extents.height),
        })
    }

    /// Linear indices of the cells crossed by `a -> b`, with the parameter
    /// range spent in each, after clipping to the grid.
    pub fn segment_cells(
        &self,
        a: &Point2<f64>,
        b: &Point2<f64>,
    ) -> impl Iterator<Item = (usize, f64, f64)> + use<T> {
        let extents = self.extents;
        let walk = if a == b {
            self.locate(a).map(|index| {
                let (x, y) = extents.coord(index);
                GridWalk::new(
                    Point2::new(x as f64 + 0.5, y as f64 + 0.5),
                    Vector2::zeros(),
                    0.0,
                    0.0,
                    extents,
                )
            })
        } else {
            self.bounds().clip_segment(a, b).map(|(t0, t1)| {
                let start = self.to_local(a);
                let dir = self.to_local(b) - start;
                GridWalk::new(start, dir, t0, t1, extents)
            })
        };
        walk.into_iter()
            .flatten()
            .map(move |s| (extents.index(s.x, s.y), s.enter, s.exit))
    }

    /// Visits the cell containing `point`.
    pub fn visit_point<V>(&self, point: &Point2<f64>, visitor: &mut V) -> bool
    where
        V: CellVisitor<T> + ?Sized,
    {
        let Some(index) = self.locate(point) else {
            return false;
        };
        visitor.visit(&self.state(index, VisitParam::None), &self.cells[index])
    }

    /// Visits the cells overlapping `rect`, row-major.
    pub fn visit_rect<V>(&self, rect: &Rect, visitor: &mut V) -> bool
    where
        V: CellVisitor<T> + ?Sized,
    {
        let Some(range) = self.cell_range(rect) else {
            return false;
        };
        range.iter().any(|(x, y)| {
            let index = self.extents.index(x, y);
            visitor.visit(&self.state(index, VisitParam::None), &self.cells[index])
        })
    }

    /// Visits the cells crossed by `a -> b` in order from `a`.
    ///
    /// Parameters are relative to the unclipped segment.
    pub fn visit_segment<V>(&self, a: &Point2<f64>, b: &Point2<f64>, visitor: &mut V) -> bool
    where
        V: CellVisitor<T> + ?Sized,
    {
        self.segment_cells(a, b).any(|(index, enter, exit)| {
            let state = self.state(index, VisitParam::Segment { enter, exit });
            visitor.visit(&state, &self.cells[index])
        })
    }

    /// Visits the cells within `max_radius` of `center` in order of
    /// increasing distance, expanding through the 8-neighbourhood.
    ///
    /// Nothing is visited if `center` lies outside the grid.
    pub fn visit_circle<V>(
        &self,
        center: &Point2<f64>,
        max_radius: f64,
        marks: &mut EpochMarks,
        visitor: &mut V,
    ) -> bool
    where
        V: CellVisitor<T> + ?Sized,
    {
        let Some(start) = self.locate(center) else {
            return false;
        };

        marks.begin(self.cells.len());
        marks.mark(start);
        let mut queue = BinaryHeap::new();
        queue.push(QueueEntry {
            distance: 0.0,
            key: start,
            id: start,
        });

        while let Some(QueueEntry { distance, id, .. }) = queue.pop() {
            if distance > max_radius {
                break;
            }
            let state = self.state(id, VisitParam::Distance(distance));
            if visitor.visit(&state, &self.cells[id]) {
                return true;
            }

            let (x, y) = self.extents.coord(id);
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                    if (dx, dy) == (0, 0) || !self.extents.contains(nx, ny) {
                        continue;
                    }
                    let index = self.extents.index(nx as usize, ny as usize);
                    if !marks.mark(index) {
                        continue;
                    }
                    let d = self.cell_rect(index).distance_to_point(center);
                    if d <= max_radius {
                        queue.push(QueueEntry {
                            distance: d,
                            key: index,
                            id: index,
                        });
                    }
                }
            }
        }
        false
    }

    /// Visits every cell in storage order.
    pub fn visit_all<V>(&self, visitor: &mut V) -> bool
    where
        V: CellVisitor<T> + ?Sized,
    {
        self.cells
            .iter()
            .enumerate()
            .any(|(index, cell)| visitor.visit(&self.state(index, VisitParam::None), cell))
    }

    const fn state(&self, index: usize, param: VisitParam) -> VisitState {
        VisitState {
            big: index,
            small: None,
            param,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn numbered(width: usize, height: usize) -> Grid1L<usize> {
        let ext = Extents::new(width, height);
        Grid1L::from_cells(
            Point2::new(10.0, 20.0),
            Vector2::new(2.0, 2.0),
            ext,
            (0..ext.len()).collect(),
        )
        .unwrap()
    }

    fn collect<F>(run: F) -> Vec<usize>
    where
        F: FnOnce(&mut dyn CellVisitor<usize>) -> bool,
    {
        let mut out = Vec::new();
        run(&mut |_: &VisitState, cell: &usize| {
            out.push(*cell);
            false
        });
        out
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            Grid1L::<u8>::new(Point2::origin(), Vector2::new(-1.0, 1.0), Extents::new(1, 1)),
            Err(GridError::InvalidCellSize(_))
        ));
        assert!(matches!(
            Grid1L::<u8>::new(Point2::origin(), Vector2::new(1.0, 1.0), Extents::new(1 << 20, 1 << 20)),
            Err(GridError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Grid1L::from_cells(Point2::origin(), Vector2::new(1.0, 1.0), Extents::new(2, 2), vec![0u8]),
            Err(GridError::CellCountMismatch { .. })
        ));
    }

    #[test]
    fn test_locate_and_rect() {
        let grid = numbered(3, 2);
        assert_eq!(grid.locate(&Point2::new(11.0, 21.0)), Some(0));
        assert_eq!(grid.locate(&Point2::new(15.0, 23.0)), Some(5));
        assert_eq!(grid.locate(&Point2::new(16.0, 24.0)), Some(5));
        assert_eq!(grid.locate(&Point2::new(16.1, 24.0)), None);

        let r = grid.cell_rect(4);
        assert_eq!(r.min, Point2::new(12.0, 22.0));
        assert_eq!(r.max, Point2::new(14.0, 24.0));
        assert!(grid.cell(3, 0).is_none());
    }

    #[test]
    fn test_visit_rect() {
        let grid = numbered(3, 3);
        let rect = Rect::new(Point2::new(13.0, 21.0), Point2::new(20.0, 23.0));
        assert_eq!(collect(|v| grid.visit_rect(&rect, v)), vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_visit_segment_clips() {
        let grid = numbered(3, 1);
        let a = Point2::new(0.0, 21.0);
        let b = Point2::new(30.0, 21.0);
        let cells: Vec<_> = grid.segment_cells(&a, &b).collect();
        assert_eq!(
            cells.iter().map(|c| c.0).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!((cells[0].1 - 1.0 / 3.0).abs() < 1e-12);
        assert!((cells[2].2 - 16.0 / 30.0).abs() < 1e-12);
        assert_eq!(collect(|v| grid.visit_segment(&a, &b, v)), vec![0, 1, 2]);
    }

    #[test]
    fn test_visit_segment_degenerate() {
        let grid = numbered(3, 1);
        let p = Point2::new(13.0, 21.0);
        assert_eq!(collect(|v| grid.visit_segment(&p, &p, v)), vec![1]);
        let outside = Point2::new(0.0, 0.0);
        assert!(collect(|v| grid.visit_segment(&outside, &outside, v)).is_empty());
    }

    #[test]
    fn test_visit_circle_order() {
        let grid = numbered(5, 5);
        let center = Point2::new(15.0, 25.0);
        let mut marks = EpochMarks::new();
        let mut visits = Vec::new();
        grid.visit_circle(&center, 3.0, &mut marks, &mut |s: &VisitState, c: &usize| {
            visits.push((*c, s.distance().unwrap()));
            false
        });
        // The 3x3 block around the centre plus the four cells two steps away
        // along the axes, at distance 3
        assert_eq!(visits[0], (12, 0.0));
        assert_eq!(visits.len(), 9 + 4);
        assert!(visits.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_visit_all_and_stop() {
        let grid = numbered(2, 2);
        assert_eq!(collect(|v| grid.visit_all(v)), vec![0, 1, 2, 3]);
        let mut seen = 0;
        assert!(grid.visit_all(&mut |_: &VisitState, c: &usize| {
            seen += 1;
            *c == 1
        }));
        assert_eq!(seen, 2);
    }
}
