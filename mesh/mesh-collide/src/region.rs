//! Planar classification against a set of contours.
//!
//! [`ContourIndex`] buckets contour edges into a uniform grid by walking each
//! edge through it. A shot along a segment then only tests the edges of the
//! cells the segment crosses, nearest cells first, and stops as soon as the
//! best hit lies before the current cell's exit.

// Cell counts are derived from f64 sizes.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use cf_grid::{Extents, Grid1L, Rect, VisitState};
use nalgebra::{Point2, Vector2};
use smallvec::SmallVec;
use tracing::debug;

use crate::error::{CollideError, CollideResult};
use crate::geometry::{point_segment_distance_2d, segment_intersect_2d};
use crate::scratch::QueryScratch;

/// A closed polygon tagged with the id of the item it bounds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contour {
    /// Item id reported by queries.
    pub id: usize,
    /// Vertices, without repeating the first one at the end.
    pub points: Vec<Point2<f64>>,
}

impl Contour {
    /// Create a contour.
    #[must_use]
    pub const fn new(id: usize, points: Vec<Point2<f64>>) -> Self {
        Self { id, points }
    }
}

/// One edge of an indexed contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourEdge {
    /// Start point.
    pub a: Point2<f64>,
    /// End point.
    pub b: Point2<f64>,
    /// Id of the contour the edge belongs to.
    pub id: usize,
}

/// Uniform-grid index over contour edges.
///
/// # Example
///
/// ```
/// use mesh_collide::{Contour, ContourIndex, QueryScratch};
/// use nalgebra::Point2;
///
/// let square = |id, x0: f64| {
///     Contour::new(id, vec![
///         Point2::new(x0, 0.0),
///         Point2::new(x0 + 1.0, 0.0),
///         Point2::new(x0 + 1.0, 1.0),
///         Point2::new(x0, 1.0),
///     ])
/// };
/// let index = ContourIndex::new(&[square(1, 0.0), square(2, 3.0)], None).unwrap();
/// let mut scratch = QueryScratch::new();
///
/// // Leaving square 1 toward square 2
/// let a = Point2::new(0.5, 0.5);
/// let b = Point2::new(3.5, 0.5);
/// assert_eq!(index.shoot_ray(&a, &b, 0, None, &mut scratch), 1);
/// assert_eq!(index.shoot_ray(&a, &b, 0, Some(1), &mut scratch), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ContourIndex {
    edges: Vec<ContourEdge>,
    grid: Grid1L<Vec<u32>>,
}

impl ContourIndex {
    /// Indexes the edges of `contours`.
    ///
    /// `cell_size` defaults to about one edge per cell over the bounding
    /// rectangle.
    ///
    /// # Errors
    ///
    /// - [`CollideError::InvalidParams`] if the contours have no edge.
    /// - [`CollideError::Grid`] for a non-positive or non-finite cell size,
    ///   or one so small the index would exceed [`Extents::MAX_LEN`] cells.
    pub fn new(contours: &[Contour], cell_size: Option<f64>) -> CollideResult<Self> {
        let mut edges = Vec::new();
        for contour in contours {
            let n = contour.points.len();
            // Two points make a single edge, not a closed loop
            let count = if n > 2 { n } else { n.saturating_sub(1) };
            for i in 0..count {
                let (a, b) = (contour.points[i], contour.points[(i + 1) % n]);
                if a != b {
                    edges.push(ContourEdge { a, b, id: contour.id });
                }
            }
        }
        if u32::try_from(edges.len()).is_err() {
            return Err(CollideError::InvalidParams(format!(
                "too many contour edges: {}",
                edges.len()
            )));
        }

        let Some(bounds) = Rect::from_points(edges.iter().flat_map(|e| [&e.a, &e.b])) else {
            return Err(CollideError::InvalidParams(
                "contours have no edges".into(),
            ));
        };
        let size = cell_size.unwrap_or_else(|| auto_cell_size(&bounds, edges.len()));
        let extents = Extents::covering(bounds.width(), bounds.height(), size)?;
        let mut grid: Grid1L<Vec<u32>> =
            Grid1L::new(bounds.min, Vector2::new(size, size), extents)?;

        let mut refs = 0usize;
        for (index, edge) in edges.iter().enumerate() {
            let cells: SmallVec<[usize; 8]> = grid
                .segment_cells(&edge.a, &edge.b)
                .map(|(cell, _, _)| cell)
                .collect();
            for cell in cells {
                if let Some(items) = grid.cell_at_mut(cell) {
                    // Bounded by the u32 check above
                    items.push(index as u32);
                    refs += 1;
                }
            }
        }

        debug!(
            edges = edges.len(),
            cells = extents.len(),
            edge_refs = refs,
            cell_size = size,
            "Indexed contours"
        );
        Ok(Self { edges, grid })
    }

    /// Indexed edges.
    #[must_use]
    pub fn edges(&self) -> &[ContourEdge] {
        &self.edges
    }

    /// The underlying grid of edge indices.
    #[must_use]
    pub const fn grid(&self) -> &Grid1L<Vec<u32>> {
        &self.grid
    }

    /// Id of the first contour crossed on the way from `a` to `b`.
    ///
    /// Edges of contour `invisible` are ignored. Returns `default_id` if no
    /// edge is crossed.
    pub fn shoot_ray(
        &self,
        a: &Point2<f64>,
        b: &Point2<f64>,
        default_id: usize,
        invisible: Option<usize>,
        scratch: &mut QueryScratch,
    ) -> usize {
        let seen = &mut scratch.faces;
        seen.begin(self.edges.len());

        let mut best: Option<(f64, usize)> = None;
        self.grid
            .visit_segment(a, b, &mut |state: &VisitState, items: &Vec<u32>| {
                for &item in items {
                    let edge = &self.edges[item as usize];
                    if !seen.mark(item as usize) || invisible == Some(edge.id) {
                        continue;
                    }
                    if let Some((t, _)) = segment_intersect_2d(a, b, &edge.a, &edge.b) {
                        if best.is_none_or(|(best_t, _)| t < best_t) {
                            best = Some((t, edge.id));
                        }
                    }
                }
                let exit = state.segment().map_or(f64::INFINITY, |(_, exit)| exit);
                best.is_some_and(|(t, _)| t <= exit)
            });

        best.map_or(default_id, |(_, id)| id)
    }

    /// Nearest edge to `point` within `max_distance`, with its distance.
    ///
    /// Returns `None` if `point` is outside the indexed area.
    pub fn closest_edge(
        &self,
        point: &Point2<f64>,
        max_distance: f64,
        scratch: &mut QueryScratch,
    ) -> Option<(usize, f64)> {
        let QueryScratch { cells, faces: seen } = scratch;
        seen.begin(self.edges.len());

        let mut best: Option<(usize, f64)> = None;
        self.grid.visit_circle(
            point,
            max_distance,
            cells,
            &mut |state: &VisitState, items: &Vec<u32>| {
                let reach = state.distance().unwrap_or(0.0);
                if best.is_some_and(|(_, d)| reach > d) {
                    return true;
                }
                for &item in items {
                    if !seen.mark(item as usize) {
                        continue;
                    }
                    let edge = &self.edges[item as usize];
                    let d = point_segment_distance_2d(point, &edge.a, &edge.b);
                    if d <= max_distance && best.is_none_or(|(_, best_d)| d < best_d) {
                        best = Some((item as usize, d));
                    }
                }
                false
            },
        );
        best
    }
}

fn auto_cell_size(bounds: &Rect, edges: usize) -> f64 {
    let n = edges.max(1) as f64;
    let area = bounds.width() * bounds.height();
    let long = bounds.width().max(bounds.height());
    let size = (area / n).sqrt().max(long / n);
    if size > 0.0 && size.is_finite() {
        size
    } else {
        1.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use cf_grid::GridError;

    fn square(id: usize, x0: f64, y0: f64, side: f64) -> Contour {
        Contour::new(
            id,
            vec![
                Point2::new(x0, y0),
                Point2::new(x0 + side, y0),
                Point2::new(x0 + side, y0 + side),
                Point2::new(x0, y0 + side),
            ],
        )
    }

    fn nested() -> ContourIndex {
        // Outer ring 1 around inner ring 2, plus a far square 3
        ContourIndex::new(
            &[
                square(1, 0.0, 0.0, 10.0),
                square(2, 4.0, 4.0, 2.0),
                square(3, 20.0, 0.0, 1.0),
            ],
            Some(1.5),
        )
        .unwrap()
    }

    #[test]
    fn test_edge_count() {
        let index = nested();
        assert_eq!(index.edges().len(), 12);
        assert!(index.grid().cells().iter().any(|c| c.len() > 1));
    }

    #[test]
    fn test_first_hit_wins() {
        let index = nested();
        let mut scratch = QueryScratch::with_epoch(3);
        let from = Point2::new(1.0, 5.0);

        assert_eq!(index.shoot_ray(&from, &Point2::new(9.0, 5.0), 0, None, &mut scratch), 2);
        assert_eq!(index.shoot_ray(&from, &Point2::new(-5.0, 5.0), 0, None, &mut scratch), 1);
        assert_eq!(
            index.shoot_ray(&from, &Point2::new(9.0, 5.0), 0, Some(2), &mut scratch),
            0
        );
        assert_eq!(
            index.shoot_ray(&from, &Point2::new(15.0, 5.0), 0, Some(2), &mut scratch),
            1
        );
    }

    #[test]
    fn test_miss_returns_default() {
        let index = nested();
        let mut scratch = QueryScratch::new();
        let id = index.shoot_ray(
            &Point2::new(12.0, 2.0),
            &Point2::new(18.0, 2.0),
            42,
            None,
            &mut scratch,
        );
        assert_eq!(id, 42);
    }

    #[test]
    fn test_closest_edge() {
        let index = nested();
        let mut scratch = QueryScratch::new();
        let (edge, d) = index
            .closest_edge(&Point2::new(3.0, 5.0), 10.0, &mut scratch)
            .unwrap();
        assert_eq!(index.edges()[edge].id, 2);
        assert!((d - 1.0).abs() < 1e-12);

        assert!(
            index
                .closest_edge(&Point2::new(13.0, 5.0), 1.0, &mut scratch)
                .is_none()
        );
    }

    #[test]
    fn test_no_edges() {
        let err = ContourIndex::new(&[Contour::new(1, vec![Point2::new(1.0, 1.0)])], None);
        assert!(matches!(err, Err(CollideError::InvalidParams(_))));
    }

    #[test]
    fn test_bad_cell_size() {
        let contours = [square(1, 0.0, 0.0, 10.0)];
        for size in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                ContourIndex::new(&contours, Some(size)),
                Err(CollideError::Grid(GridError::InvalidCellSize(_)))
            ));
        }
        assert!(matches!(
            ContourIndex::new(&contours, Some(1e-9)),
            Err(CollideError::Grid(GridError::InvalidDimensions { .. }))
        ));
    }

    #[test]
    fn test_two_point_contour_is_one_edge() {
        let index = ContourIndex::new(
            &[Contour::new(
                5,
                vec![Point2::new(0.0, 0.0), Point2::new(4.0, 4.0)],
            )],
            None,
        )
        .unwrap();
        assert_eq!(index.edges().len(), 1);
    }
}
