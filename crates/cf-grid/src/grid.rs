//! Two-level grid data structure.
//!
//! The outer level is a uniform array of big cells covering the footprint of
//! a triangulated surface. Each big cell is either empty or owns its own array
//! of small cells, with a resolution chosen per big cell. Small cells hold the
//! indices of the triangles overlapping them and the Z range spanned by those
//! triangles.
//!
//! Big cells live in a single arena indexed row-major; there are no pointers
//! between cells. The grid is immutable once built.

// Grid arithmetic converts between continuous coordinates and cell indices.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

use nalgebra::{Point2, Vector2};
use smallvec::SmallVec;

use crate::cell::{CellId, Extents, ZRange};
use crate::error::{GridError, GridResult};
use crate::rect::Rect;

/// Inline storage for the face indices of a small cell.
pub type FaceList = SmallVec<[u32; 8]>;

/// Leaf cell of the grid.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmallCell {
    faces: FaceList,
    z_range: ZRange,
}

impl SmallCell {
    /// Creates an empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices of the triangles overlapping this cell.
    #[must_use]
    pub fn faces(&self) -> &[u32] {
        &self.faces
    }

    /// Vertical extent of every triangle referenced by this cell.
    #[must_use]
    pub const fn z_range(&self) -> ZRange {
        self.z_range
    }

    /// Number of referenced triangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Returns `true` if no triangle overlaps this cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Adds a triangle reference and grows the cached Z range to cover it.
    pub fn push(&mut self, face: u32, z_range: ZRange) {
        self.faces.push(face);
        self.z_range = self.z_range.union(&z_range);
    }
}

/// Coarse cell owning a locally sized array of small cells.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BigCell {
    extents: Extents,
    cells: Vec<SmallCell>,
}

impl BigCell {
    /// Creates a big cell with `extents` empty small cells.
    ///
    /// Zero dimensions are raised to one.
    #[must_use]
    pub fn new(extents: Extents) -> Self {
        let extents = Extents::new(extents.width.max(1), extents.height.max(1));
        Self {
            extents,
            cells: vec![SmallCell::new(); extents.len()],
        }
    }

    /// Creates a big cell from an existing small-cell array.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] for empty or oversized extents
    /// and [`GridError::CellCountMismatch`] if `cells` does not match them.
    pub fn from_cells(extents: Extents, cells: Vec<SmallCell>) -> GridResult<Self> {
        let expected = extents.cell_count()?;
        if cells.len() != expected {
            return Err(GridError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { extents, cells })
    }

    /// Dimensions of the small-cell array.
    #[must_use]
    pub const fn extents(&self) -> Extents {
        self.extents
    }

    /// All small cells, row-major.
    #[must_use]
    pub fn cells(&self) -> &[SmallCell] {
        &self.cells
    }

    /// Small cell by linear index.
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<&SmallCell> {
        self.cells.get(index)
    }

    /// Mutable small cell by linear index.
    pub fn cell_mut(&mut self, index: usize) -> Option<&mut SmallCell> {
        self.cells.get_mut(index)
    }

    /// Union of the Z ranges of all small cells.
    #[must_use]
    pub fn z_range(&self) -> ZRange {
        self.cells
            .iter()
            .fold(ZRange::EMPTY, |acc, cell| acc.union(&cell.z_range))
    }

    /// Total number of triangle references held by the small cells.
    #[must_use]
    pub fn face_ref_count(&self) -> usize {
        self.cells.iter().map(SmallCell::len).sum()
    }
}

/// A two-level spatial grid over the horizontal plane.
///
/// # Coordinate Systems
///
/// - **World space**: continuous `f64` XY coordinates.
/// - **Local space**: world coordinates relative to `origin`, divided by the
///   big-cell size. Big cell `(i, j)` covers local `[i, i + 1) x [j, j + 1)`.
///
/// Inside a big cell with small extents `(w, h)`, the fractional part of the
/// local coordinate scaled by `(w, h)` addresses the small cell.
///
/// # Example
///
/// ```
/// use cf_grid::{BigCell, CellId, Extents, Grid2L, ZRange};
/// use nalgebra::{Point2, Vector2};
///
/// let mut big = BigCell::new(Extents::new(2, 2));
/// big.cell_mut(3).unwrap().push(7, ZRange::new(0.0, 1.0));
///
/// let grid = Grid2L::from_parts(
///     Point2::origin(),
///     Vector2::new(10.0, 10.0),
///     Extents::new(2, 1),
///     vec![Some(big), None],
/// )
/// .unwrap();
///
/// // (7, 8) lies in big cell 0, upper-right small cell
/// assert_eq!(grid.locate(&Point2::new(7.0, 8.0)), Some(CellId::small(0, 3)));
/// // (15, 5) lies in the empty big cell 1
/// assert_eq!(grid.locate(&Point2::new(15.0, 5.0)), Some(CellId::big(1)));
/// // Outside the grid
/// assert_eq!(grid.locate(&Point2::new(25.0, 5.0)), None);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid2L {
    /// World position of the lower-left grid corner.
    origin: Point2<f64>,
    /// Big-cell size per axis.
    unit: Vector2<f64>,
    /// Inverse of `unit` for faster coordinate conversion.
    inv_unit: Vector2<f64>,
    /// Big-cell array dimensions.
    extents: Extents,
    /// Big cells, row-major. `None` means no geometry.
    big: Vec<Option<BigCell>>,
    /// First traversal-node key of each big cell.
    node_offsets: Vec<usize>,
    /// Total number of traversal nodes.
    node_count: usize,
}

impl Grid2L {
    /// Assembles a grid from its big cells.
    ///
    /// # Errors
    ///
    /// - [`GridError::InvalidCellSize`] if a component of `unit` is not
    ///   positive and finite.
    /// - [`GridError::InvalidDimensions`] if `extents` is empty or holds more
    ///   than [`Extents::MAX_LEN`] cells.
    /// - [`GridError::CellCountMismatch`] if `big` does not hold exactly
    ///   `extents.len()` entries.
    pub fn from_parts(
        origin: Point2<f64>,
        unit: Vector2<f64>,
        extents: Extents,
        big: Vec<Option<BigCell>>,
    ) -> GridResult<Self> {
        for size in [unit.x, unit.y] {
            if size <= 0.0 || !size.is_finite() {
                return Err(GridError::InvalidCellSize(size));
            }
        }
        let expected = extents.cell_count()?;
        if big.len() != expected {
            return Err(GridError::CellCountMismatch {
                expected,
                actual: big.len(),
            });
        }

        // Empty big cells still take one node so the circle search can cross them
        let mut node_offsets = Vec::with_capacity(big.len());
        let mut node_count = 0;
        for cell in &big {
            node_offsets.push(node_count);
            node_count += cell.as_ref().map_or(1, |b| b.extents.len());
        }

        Ok(Self {
            origin,
            unit,
            inv_unit: Vector2::new(1.0 / unit.x, 1.0 / unit.y),
            extents,
            big,
            node_offsets,
            node_count,
        })
    }

    /// Creates a grid where every big cell is empty.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Grid2L::from_parts`].
    pub fn empty(origin: Point2<f64>, unit: Vector2<f64>, extents: Extents) -> GridResult<Self> {
        Self::from_parts(origin, unit, extents, vec![None; extents.cell_count()?])
    }

    /// World position of the lower-left corner.
    #[must_use]
    pub const fn origin(&self) -> &Point2<f64> {
        &self.origin
    }

    /// Big-cell size per axis.
    #[must_use]
    pub const fn unit(&self) -> &Vector2<f64> {
        &self.unit
    }

    /// Big-cell array dimensions.
    #[must_use]
    pub const fn extents(&self) -> Extents {
        self.extents
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

    /// All big cells, row-major.
    #[must_use]
    pub fn big_cells(&self) -> &[Option<BigCell>] {
        &self.big
    }

    /// Big cell by linear index. `None` if empty or out of range.
    #[must_use]
    pub fn big_cell(&self, index: usize) -> Option<&BigCell> {
        self.big.get(index).and_then(Option::as_ref)
    }

    /// Small cell addressed by `id`. `None` for big-cell-only ids.
    #[must_use]
    pub fn small_cell(&self, id: CellId) -> Option<&SmallCell> {
        self.big_cell(id.big)?.cell(id.small?)
    }

    /// Converts a world point to continuous local big-cell coordinates.
    #[must_use]
    pub fn to_local(&self, point: &Point2<f64>) -> Point2<f64> {
        let rel = point - self.origin;
        Point2::new(rel.x * self.inv_unit.x, rel.y * self.inv_unit.y)
    }

    /// Big-cell coordinate containing a world point.
    ///
    /// Points on the outer border of the grid belong to the border cells.
    #[must_use]
    pub fn big_coord(&self, point: &Point2<f64>) -> Option<(usize, usize)> {
        let local = self.to_local(point);
        let w = self.extents.width as f64;
        let h = self.extents.height as f64;
        // Negated comparisons also reject NaN
        if !(local.x >= 0.0 && local.x <= w && local.y >= 0.0 && local.y <= h) {
            return None;
        }
        Some((
            floor_clamp(local.x, self.extents.width),
            floor_clamp(local.y, self.extents.height),
        ))
    }

    /// Finds the traversal node containing a world point.
    ///
    /// Returns a small-cell id when the big cell holds geometry, a
    /// big-cell-only id when it is empty, and `None` outside the grid.
    #[must_use]
    pub fn locate(&self, point: &Point2<f64>) -> Option<CellId> {
        let (bx, by) = self.big_coord(point)?;
        let big_index = self.extents.index(bx, by);
        let Some(big) = self.big_cell(big_index) else {
            return Some(CellId::big(big_index));
        };

        let local = self.to_local(point);
        let ext = big.extents;
        let sx = floor_clamp((local.x - bx as f64) * ext.width as f64, ext.width);
        let sy = floor_clamp((local.y - by as f64) * ext.height as f64, ext.height);
        Some(CellId::small(big_index, ext.index(sx, sy)))
    }

    /// World rectangle of a big cell.
    #[must_use]
    pub fn big_rect(&self, index: usize) -> Rect {
        let (bx, by) = self.extents.coord(index);
        let (bx, by) = (bx as f64, by as f64);
        Rect {
            min: Point2::new(
                bx.mul_add(self.unit.x, self.origin.x),
                by.mul_add(self.unit.y, self.origin.y),
            ),
            max: Point2::new(
                (bx + 1.0).mul_add(self.unit.x, self.origin.x),
                (by + 1.0).mul_add(self.unit.y, self.origin.y),
            ),
        }
    }

    /// World rectangle of a small cell inside a non-empty big cell.
    ///
    /// For an empty big cell the whole big-cell rectangle is returned.
    #[must_use]
    pub fn small_rect(&self, big_index: usize, small_index: usize) -> Rect {
        let outer = self.big_rect(big_index);
        match self.big_cell(big_index) {
            Some(big) => sub_rect(&outer, big.extents, small_index),
            None => outer,
        }
    }

    /// World rectangle of a traversal node.
    #[must_use]
    pub fn node_rect(&self, id: CellId) -> Rect {
        match id.small {
            Some(small) => self.small_rect(id.big, small),
            None => self.big_rect(id.big),
        }
    }

    /// Number of traversal nodes: one per small cell, plus one per empty big cell.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.node_count
    }

    /// Dense key of a traversal node in `0..node_count()`.
    ///
    /// # Panics
    ///
    /// Panics if `id.big` is out of range.
    #[must_use]
    pub fn node_key(&self, id: CellId) -> usize {
        self.node_offsets[id.big] + id.small.unwrap_or(0)
    }

    /// Number of big cells that hold geometry.
    #[must_use]
    pub fn non_empty_count(&self) -> usize {
        self.big.iter().filter(|b| b.is_some()).count()
    }

    /// Total number of small cells.
    #[must_use]
    pub fn small_cell_count(&self) -> usize {
        self.big
            .iter()
            .flatten()
            .map(|b| b.extents.len())
            .sum()
    }

    /// Total number of triangle references over all small cells.
    #[must_use]
    pub fn face_ref_count(&self) -> usize {
        self.big.iter().flatten().map(BigCell::face_ref_count).sum()
    }

    /// Inclusive big-cell coordinate range overlapping a world rectangle.
    ///
    /// Returns `None` if the rectangle misses the grid.
    #[must_use]
    pub fn big_range(&self, rect: &Rect) -> Option<CellRange> {
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

    /// Inclusive small-cell coordinate range of a big cell overlapping a
    /// world rectangle, clamped to the big cell.
    ///
    /// Returns `None` for empty big cells.
    #[must_use]
    pub fn small_range(&self, big_index: usize, rect: &Rect) -> Option<CellRange> {
        let big = self.big_cell(big_index)?;
        let (bx, by) = self.extents.coord(big_index);
        let ext = big.extents;
        let lo = self.to_local(&rect.min);
        let hi = self.to_local(&rect.max);
        let scale_x = ext.width as f64;
        let scale_y = ext.height as f64;
        Some(CellRange {
            x0: floor_clamp((lo.x - bx as f64) * scale_x, ext.width),
            y0: floor_clamp((lo.y - by as f64) * scale_y, ext.height),
            x1: floor_clamp((hi.x - bx as f64) * scale_x, ext.width),
            y1: floor_clamp((hi.y - by as f64) * scale_y, ext.height),
        })
    }
}

/// Inclusive rectangular range of cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    /// First column.
    pub x0: usize,
    /// First row.
    pub y0: usize,
    /// Last column (inclusive).
    pub x1: usize,
    /// Last row (inclusive).
    pub y1: usize,
}

impl CellRange {
    /// Iterates the range row-major.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let Self { x0, y0, x1, y1 } = *self;
        (y0..=y1).flat_map(move |y| (x0..=x1).map(move |x| (x, y)))
    }
}

/// Rectangle of cell `index` when `outer` is split into `ext` cells.
pub(crate) fn sub_rect(outer: &Rect, ext: Extents, index: usize) -> Rect {
    let (sx, sy) = ext.coord(index);
    let fx0 = sx as f64 / ext.width as f64;
    let fx1 = (sx + 1) as f64 / ext.width as f64;
    let fy0 = sy as f64 / ext.height as f64;
    let fy1 = (sy + 1) as f64 / ext.height as f64;
    Rect {
        min: Point2::new(
            fx0.mul_add(outer.width(), outer.min.x),
            fy0.mul_add(outer.height(), outer.min.y),
        ),
        max: Point2::new(
            fx1.mul_add(outer.width(), outer.min.x),
            fy1.mul_add(outer.height(), outer.min.y),
        ),
    }
}

/// Floors `v` and clamps it into `0..n`. NaN maps to 0.
pub(crate) fn floor_clamp(v: f64, n: usize) -> usize {
    if v <= 0.0 || v.is_nan() {
        0
    } else {
        (v.floor() as usize).min(n.saturating_sub(1))
    }
}
