//! Bulk construction of a [`Grid2L`] from a triangle set.
//!
//! The builder buckets every triangle into the big cells its footprint
//! overlaps, picks a small-cell resolution for each big cell from the number
//! of triangles it received, and then buckets those triangles again into the
//! small cells. Overlap is tested exactly (bounding box, then separating
//! axes), so thin diagonal triangles do not spill into cells they only
//! bound.

// Cell counts are derived from f64 sizes and back.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use nalgebra::{Point2, Point3, Vector2};
use tracing::{debug, info};

use crate::cell::{Extents, ZRange};
use crate::error::{GridError, GridResult};
use crate::grid::{BigCell, CellRange, Grid2L, floor_clamp, sub_rect};
use crate::rect::Rect;

/// Parameters for grid construction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridParams {
    /// Edge length of a big cell.
    ///
    /// `None` picks a size so that on average `faces_per_big_cell` triangles
    /// fall in each big cell.
    /// Default: `None`
    pub big_cell_size: Option<f64>,

    /// Target number of triangles per big cell when the size is automatic.
    ///
    /// Default: `256`
    pub faces_per_big_cell: usize,

    /// Target number of triangles per small cell.
    ///
    /// Drives the per-big-cell resolution.
    /// Default: `8`
    pub faces_per_small_cell: usize,

    /// Upper bound on the small-cell resolution per axis.
    ///
    /// Default: `32`
    pub max_small_extent: usize,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            big_cell_size: None,
            faces_per_big_cell: 256,
            faces_per_small_cell: 8,
            max_small_extent: 32,
        }
    }
}

impl GridParams {
    /// Create params for meshes queried mostly by points and short rays.
    ///
    /// Uses more, finer cells at the cost of memory.
    #[must_use]
    pub fn fine() -> Self {
        Self {
            faces_per_big_cell: 64,
            faces_per_small_cell: 2,
            max_small_extent: 64,
            ..Default::default()
        }
    }

    /// Create params for very large meshes where memory matters more than
    /// query speed.
    #[must_use]
    pub fn coarse() -> Self {
        Self {
            faces_per_big_cell: 1024,
            faces_per_small_cell: 32,
            max_small_extent: 16,
            ..Default::default()
        }
    }

    /// Set a fixed big-cell size.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_grid::GridParams;
    ///
    /// let params = GridParams::default().with_big_cell_size(10.0);
    /// assert_eq!(params.big_cell_size, Some(10.0));
    /// ```
    #[must_use]
    pub const fn with_big_cell_size(mut self, size: f64) -> Self {
        self.big_cell_size = Some(size);
        self
    }

    /// Set the target number of triangles per big cell.
    #[must_use]
    pub const fn with_faces_per_big_cell(mut self, count: usize) -> Self {
        self.faces_per_big_cell = count;
        self
    }

    /// Set the target number of triangles per small cell.
    #[must_use]
    pub const fn with_faces_per_small_cell(mut self, count: usize) -> Self {
        self.faces_per_small_cell = count;
        self
    }

    /// Set the maximum small-cell resolution per axis.
    #[must_use]
    pub const fn with_max_small_extent(mut self, extent: usize) -> Self {
        self.max_small_extent = extent;
        self
    }

    /// Checks that every parameter is in range.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidCellSize`] for a non-positive or
    /// non-finite cell size and [`GridError::InvalidParams`] for zero counts.
    pub fn validate(&self) -> GridResult<()> {
        if let Some(size) = self.big_cell_size {
            if size <= 0.0 || !size.is_finite() {
                return Err(GridError::InvalidCellSize(size));
            }
        }
        if self.faces_per_big_cell == 0 {
            return Err(GridError::InvalidParams(
                "faces_per_big_cell must be at least 1".into(),
            ));
        }
        if self.faces_per_small_cell == 0 {
            return Err(GridError::InvalidParams(
                "faces_per_small_cell must be at least 1".into(),
            ));
        }
        if self.max_small_extent == 0 {
            return Err(GridError::InvalidParams(
                "max_small_extent must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Small-cell resolution per axis for a big cell holding `count`
    /// triangles.
    #[must_use]
    pub fn small_extent_for(&self, count: usize) -> usize {
        let per_cell = self.faces_per_small_cell.max(1) as f64;
        let side = (count as f64 / per_cell).sqrt().ceil() as usize;
        side.clamp(1, self.max_small_extent.max(1))
    }
}

/// Builds a two-level grid over the XY footprint of `triangles`.
///
/// Face indices stored in the grid are positions in `triangles`. Every small
/// cell's Z range covers the full Z extent of each triangle it references.
///
/// # Errors
///
/// - [`GridError::EmptyInput`] if `triangles` is empty.
/// - [`GridError::TooManyFaces`] if face indices do not fit in `u32`.
/// - [`GridError::NonFiniteVertex`] if a coordinate is NaN or infinite.
/// - [`GridError::InvalidDimensions`] if the cell size would need more than
///   [`Extents::MAX_LEN`] big cells.
/// - Any error of [`GridParams::validate`].
///
/// # Example
///
/// ```
/// use cf_grid::{build_grid, GridParams};
/// use nalgebra::Point3;
///
/// let triangles = vec![
///     [Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0), Point3::new(4.0, 4.0, 2.0)],
///     [Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 4.0, 2.0), Point3::new(0.0, 4.0, 2.0)],
/// ];
/// let grid = build_grid(&triangles, &GridParams::default().with_big_cell_size(2.0)).unwrap();
///
/// assert_eq!(grid.extents().len(), 4);
/// assert_eq!(grid.non_empty_count(), 4);
/// ```
pub fn build_grid(triangles: &[[Point3<f64>; 3]], params: &GridParams) -> GridResult<Grid2L> {
    params.validate()?;
    if triangles.is_empty() {
        return Err(GridError::EmptyInput);
    }
    check_face_count(triangles.len())?;
    if let Some(face) = triangles
        .iter()
        .position(|t| t.iter().any(|v| !v.coords.iter().all(|c| c.is_finite())))
    {
        return Err(GridError::NonFiniteVertex { face });
    }

    let mut footprint = triangle_bounds(&footprint_of(&triangles[0]));
    for tri in triangles {
        for p in &footprint_of(tri) {
            footprint.expand_to_include(p);
        }
    }

    let size = params
        .big_cell_size
        .unwrap_or_else(|| auto_cell_size(&footprint, triangles.len(), params.faces_per_big_cell));
    let unit = Vector2::new(size, size);
    let extents = Extents::covering(footprint.width(), footprint.height(), size)?;
    let layout = Grid2L::empty(footprint.min, unit, extents)?;

    // Pass 1: big-cell buckets
    let mut buckets: Vec<Vec<u32>> = vec![Vec::new(); extents.len()];
    for (face, tri) in triangles.iter().enumerate() {
        let [a, b, c] = footprint_of(tri);
        let Some(range) = layout.big_range(&triangle_bounds(&[a, b, c])) else {
            continue;
        };
        for (bx, by) in widen(range, extents).iter() {
            let index = extents.index(bx, by);
            if layout.big_rect(index).overlaps_triangle(&a, &b, &c) {
                // Fits: the face count was checked above
                buckets[index].push(face as u32);
            }
        }
    }

    // Pass 2: per-big-cell resolution and small-cell buckets
    let big_cells: Vec<Option<BigCell>> = buckets
        .iter()
        .enumerate()
        .map(|(index, faces)| {
            (!faces.is_empty()).then(|| {
                let n = params.small_extent_for(faces.len());
                fill_big_cell(&layout.big_rect(index), Extents::new(n, n), faces, triangles)
            })
        })
        .collect();

    let grid = Grid2L::from_parts(footprint.min, unit, extents, big_cells)?;
    info!(
        faces = triangles.len(),
        big_cells = extents.len(),
        non_empty = grid.non_empty_count(),
        small_cells = grid.small_cell_count(),
        face_refs = grid.face_ref_count(),
        cell_size = size,
        "Built two-level grid"
    );
    Ok(grid)
}

/// Face indices are stored as `u32`.
fn check_face_count(count: usize) -> GridResult<()> {
    if u32::try_from(count).is_err() {
        return Err(GridError::TooManyFaces { count });
    }
    Ok(())
}

fn fill_big_cell(
    outer: &Rect,
    ext: Extents,
    faces: &[u32],
    triangles: &[[Point3<f64>; 3]],
) -> BigCell {
    let mut big = BigCell::new(ext);
    let cell_w = outer.width() / ext.width as f64;
    let cell_h = outer.height() / ext.height as f64;

    for &face in faces {
        let tri = &triangles[face as usize];
        let [a, b, c] = footprint_of(tri);
        let mut z = ZRange::EMPTY;
        for v in tri {
            z.expand(v.z);
        }
        let Some(clipped) = triangle_bounds(&[a, b, c]).intersection(outer) else {
            continue;
        };

        let range = CellRange {
            x0: floor_clamp((clipped.min.x - outer.min.x) / cell_w, ext.width),
            y0: floor_clamp((clipped.min.y - outer.min.y) / cell_h, ext.height),
            x1: floor_clamp((clipped.max.x - outer.min.x) / cell_w, ext.width),
            y1: floor_clamp((clipped.max.y - outer.min.y) / cell_h, ext.height),
        };
        for (sx, sy) in widen(range, ext).iter() {
            let small = ext.index(sx, sy);
            if sub_rect(outer, ext, small).overlaps_triangle(&a, &b, &c) {
                if let Some(cell) = big.cell_mut(small) {
                    cell.push(face, z);
                }
            }
        }
    }

    debug!(
        faces = faces.len(),
        resolution = ext.width,
        face_refs = big.face_ref_count(),
        "Filled big cell"
    );
    big
}

/// Grows a range by one cell on every side so that cells touching the
/// shape only along a shared border are tested too.
const fn widen(range: CellRange, ext: Extents) -> CellRange {
    CellRange {
        x0: range.x0.saturating_sub(1),
        y0: range.y0.saturating_sub(1),
        x1: if range.x1 + 1 < ext.width { range.x1 + 1 } else { ext.width - 1 },
        y1: if range.y1 + 1 < ext.height { range.y1 + 1 } else { ext.height - 1 },
    }
}

fn triangle_bounds(points: &[Point2<f64>; 3]) -> Rect {
    let mut rect = Rect::new(points[0], points[1]);
    rect.expand_to_include(&points[2]);
    rect
}

fn footprint_of(tri: &[Point3<f64>; 3]) -> [Point2<f64>; 3] {
    tri.map(|v| Point2::new(v.x, v.y))
}

/// Square cell size giving about `per_cell` triangles per big cell, assuming
/// a uniform spread over the footprint.
fn auto_cell_size(footprint: &Rect, count: usize, per_cell: usize) -> f64 {
    let cells = (count as f64 / per_cell.max(1) as f64).max(1.0);
    let area = footprint.width() * footprint.height();
    // A sliver or a line gets no more cells along its long side than faces
    let long = footprint.width().max(footprint.height());
    let size = (area / cells).sqrt().max(long / cells);
    if size > 0.0 && size.is_finite() {
        size
    } else {
        1.0
    }
}
