//! Visitor protocol shared by every traversal.
//!
//! A traversal calls [`CellVisitor::visit`] once per touched cell. Returning
//! `true` stops the traversal immediately; the traversal then returns `true`
//! to its caller as well.

/// Shape-specific scalar attached to a visited cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum VisitParam {
    /// Point, rectangle and full-grid traversals carry no parameter.
    #[default]
    None,
    /// Parameter range of the segment inside the cell, relative to the
    /// unclipped segment (`0` at its start, `1` at its end).
    Segment {
        /// Parameter at which the segment enters the cell.
        enter: f64,
        /// Parameter at which the segment leaves the cell.
        exit: f64,
    },
    /// Minimum distance from the circle center to the cell.
    Distance(f64),
}

/// Traversal state handed to the visitor for one cell.
///
/// For a single-level grid `big` is the cell index and `small` is `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisitState {
    /// Index of the big cell.
    pub big: usize,
    /// Index of the small cell within the big cell.
    pub small: Option<usize>,
    /// Shape-specific parameter.
    pub param: VisitParam,
}

impl VisitState {
    /// Segment parameters, if this state comes from a segment traversal.
    #[must_use]
    pub const fn segment(&self) -> Option<(f64, f64)> {
        match self.param {
            VisitParam::Segment { enter, exit } => Some((enter, exit)),
            _ => None,
        }
    }

    /// Cell distance, if this state comes from a circle traversal.
    #[must_use]
    pub const fn distance(&self) -> Option<f64> {
        match self.param {
            VisitParam::Distance(d) => Some(d),
            _ => None,
        }
    }
}

/// Callback invoked by the traversals.
///
/// Closures of the form `|state: &VisitState, cell: &C| -> bool` implement
/// this trait directly.
///
/// # Example
///
/// ```
/// use cf_grid::{CellVisitor, VisitState};
///
/// struct CountUpTo(usize);
///
/// impl CellVisitor<u32> for CountUpTo {
///     fn visit(&mut self, _state: &VisitState, _cell: &u32) -> bool {
///         self.0 -= 1;
///         self.0 == 0
///     }
/// }
/// ```
pub trait CellVisitor<C: ?Sized> {
    /// Processes one cell. Returns `true` to stop the traversal.
    fn visit(&mut self, state: &VisitState, cell: &C) -> bool;

    /// Called after the cells of a big cell have been visited.
    ///
    /// Rectangle and full-grid traversals call this for every big cell they
    /// cover, including empty ones, unless the traversal was stopped.
    fn finish_big_cell(&mut self, _big: usize) {}
}

impl<C: ?Sized, F> CellVisitor<C> for F
where
    F: FnMut(&VisitState, &C) -> bool,
{
    fn visit(&mut self, state: &VisitState, cell: &C) -> bool {
        self(state, cell)
    }
}
