//! Cell addressing and cached vertical ranges.

use crate::error::{GridError, GridResult};

/// Dimensions of a rectangular array of cells.
///
/// Cells are stored row-major: `x` varies fastest.
///
/// # Example
///
/// ```
/// use cf_grid::Extents;
///
/// let ext = Extents::new(4, 3);
/// assert_eq!(ext.len(), 12);
/// assert_eq!(ext.index(1, 2), 9);
/// assert_eq!(ext.coord(9), (1, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extents {
    /// Number of cells along X.
    pub width: usize,
    /// Number of cells along Y.
    pub height: usize,
}

impl Extents {
    /// Largest number of cells a grid may hold.
    pub const MAX_LEN: usize = 1 << 24;

    /// Creates new extents.
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Returns the total number of cells.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.width * self.height
    }

    /// Returns the total number of cells, or `None` on overflow.
    #[must_use]
    pub const fn checked_len(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }

    /// Returns the total number of cells of extents a grid can be built on.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] if the extents are empty or
    /// hold more than [`Extents::MAX_LEN`] cells.
    pub fn cell_count(&self) -> GridResult<usize> {
        match self.checked_len() {
            Some(n) if n > 0 && n <= Self::MAX_LEN => Ok(n),
            _ => Err(GridError::InvalidDimensions {
                width: self.width,
                height: self.height,
            }),
        }
    }

    /// Extents of square `size` cells covering a `width` by `height` area,
    /// with at least one cell per axis.
    ///
    /// # Errors
    ///
    /// - [`GridError::InvalidCellSize`] if `size` is not positive and finite.
    /// - [`GridError::InvalidDimensions`] if the area needs more than
    ///   [`Extents::MAX_LEN`] cells.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_grid::Extents;
    ///
    /// assert_eq!(Extents::covering(10.0, 4.5, 2.0).unwrap(), Extents::new(5, 3));
    /// assert!(Extents::covering(10.0, 4.5, 0.0).is_err());
    /// assert!(Extents::covering(1000.0, 1000.0, 1e-9).is_err());
    /// ```
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn covering(width: f64, height: f64, size: f64) -> GridResult<Self> {
        if size <= 0.0 || !size.is_finite() {
            return Err(GridError::InvalidCellSize(size));
        }
        // Float to int casts saturate, so a huge ratio fails the count check
        let count = |span: f64| ((span / size).ceil() as usize).max(1);
        let extents = Self::new(count(width), count(height));
        extents.cell_count()?;
        Ok(extents)
    }

    /// Returns `true` if either dimension is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the linear index of cell `(x, y)`.
    #[must_use]
    pub const fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Returns the `(x, y)` coordinate of a linear index.
    #[must_use]
    pub const fn coord(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Checks whether a signed coordinate lies inside the extents.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }
}

/// Address of a node visited by a traversal.
///
/// `small` is `None` for a big-cell-only node, which the circle search uses to
/// cross big cells that hold no geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellId {
    /// Index of the big cell.
    pub big: usize,
    /// Index of the small cell within the big cell.
    pub small: Option<usize>,
}

impl CellId {
    /// Address of a small cell.
    #[must_use]
    pub const fn small(big: usize, small: usize) -> Self {
        Self {
            big,
            small: Some(small),
        }
    }

    /// Address of a whole big cell.
    #[must_use]
    pub const fn big(big: usize) -> Self {
        Self { big, small: None }
    }
}

/// Closed vertical interval `[min, max]`.
///
/// The empty range is `(+inf, -inf)`, so expanding it by any value yields a
/// degenerate range at that value.
///
/// # Example
///
/// ```
/// use cf_grid::ZRange;
///
/// let mut range = ZRange::EMPTY;
/// assert!(range.is_empty());
///
/// range.expand(2.0);
/// range.expand(-1.0);
/// assert_eq!(range, ZRange::new(-1.0, 2.0));
/// assert!(range.overlaps(&ZRange::new(2.0, 5.0)));
/// assert!(!range.overlaps(&ZRange::new(2.5, 5.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZRange {
    /// Lowest Z value.
    pub min: f64,
    /// Highest Z value.
    pub max: f64,
}

impl ZRange {
    /// The empty range.
    pub const EMPTY: Self = Self {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    /// The range covering every finite height.
    pub const ALL: Self = Self {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    /// Creates a range from two bounds in any order.
    #[must_use]
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Returns `true` if the range contains no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Grows the range to include `z`.
    pub fn expand(&mut self, z: f64) {
        self.min = self.min.min(z);
        self.max = self.max.max(z);
    }

    /// Returns the smallest range containing both ranges.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Checks whether two closed ranges share at least one value.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.is_empty() && !other.is_empty() && self.min <= other.max && other.min <= self.max
    }

    /// Checks whether `z` lies within the range.
    #[must_use]
    pub fn contains(&self, z: f64) -> bool {
        z >= self.min && z <= self.max
    }

    /// Distance from `z` to the range, zero when inside.
    #[must_use]
    pub fn distance_to(&self, z: f64) -> f64 {
        if self.is_empty() {
            f64::INFINITY
        } else {
            (self.min - z).max(z - self.max).max(0.0)
        }
    }
}

impl Default for ZRange {
    fn default() -> Self {
        Self::EMPTY
    }
}
