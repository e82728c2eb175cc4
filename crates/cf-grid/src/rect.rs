//! Axis-aligned rectangles in the horizontal plane.
//!
//! Grid footprints, query rectangles and cell bounds are all [`Rect`]s. Every
//! predicate here works on closed sets, so a shape touching a cell border is
//! reported as overlapping both neighbours. The grid relies on this to stay
//! conservative: a triangle is never missing from a cell it touches.
//!
//! # Example
//!
//! ```
//! use cf_grid::Rect;
//! use nalgebra::Point2;
//!
//! let rect = Rect::new(Point2::new(0.0, 0.0), Point2::new(4.0, 2.0));
//!
//! // Clip a segment to the rectangle
//! let (t0, t1) = rect
//!     .clip_segment(&Point2::new(-2.0, 1.0), &Point2::new(6.0, 1.0))
//!     .unwrap();
//! assert!((t0 - 0.25).abs() < 1e-12);
//! assert!((t1 - 0.75).abs() < 1e-12);
//!
//! // Exact triangle overlap
//! assert!(rect.overlaps_triangle(
//!     &Point2::new(3.0, 1.0),
//!     &Point2::new(5.0, 1.0),
//!     &Point2::new(5.0, 3.0),
//! ));
//! assert!(!rect.overlaps_triangle(
//!     &Point2::new(4.5, 0.0),
//!     &Point2::new(6.0, 0.0),
//!     &Point2::new(6.0, 2.0),
//! ));
//! ```

use nalgebra::{Point2, Vector2};

/// An axis-aligned rectangle in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Lower-left corner.
    pub min: Point2<f64>,
    /// Upper-right corner.
    pub max: Point2<f64>,
}

impl Rect {
    /// Creates a rectangle from two corners in any order.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_grid::Rect;
    /// use nalgebra::Point2;
    ///
    /// let rect = Rect::new(Point2::new(3.0, 1.0), Point2::new(0.0, 2.0));
    /// assert_eq!(rect.min, Point2::new(0.0, 1.0));
    /// assert_eq!(rect.max, Point2::new(3.0, 2.0));
    /// ```
    #[must_use]
    pub fn new(a: Point2<f64>, b: Point2<f64>) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Returns the bounding rectangle of a point set, or `None` if it is empty.
    #[must_use]
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point2<f64>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut rect = Self {
            min: first,
            max: first,
        };
        for p in iter {
            rect.expand_to_include(p);
        }
        Some(rect)
    }

    /// Grows the rectangle to include a point.
    pub fn expand_to_include(&mut self, point: &Point2<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Width along X.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height along Y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Length of the diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point2<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Checks if a point lies inside or on the border.
    #[must_use]
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Checks if two closed rectangles share at least one point.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Returns the overlap of two rectangles, if any.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let min = Point2::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y));
        let max = Point2::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y));
        if min.x <= max.x && min.y <= max.y {
            Some(Self { min, max })
        } else {
            None
        }
    }

    /// Euclidean distance from a point to the rectangle, zero when inside.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_grid::Rect;
    /// use nalgebra::Point2;
    ///
    /// let rect = Rect::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
    /// assert_eq!(rect.distance_to_point(&Point2::new(0.5, 0.5)), 0.0);
    /// assert!((rect.distance_to_point(&Point2::new(4.0, 5.0)) - 5.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn distance_to_point(&self, point: &Point2<f64>) -> f64 {
        let dx = (self.min.x - point.x).max(point.x - self.max.x).max(0.0);
        let dy = (self.min.y - point.y).max(point.y - self.max.y).max(0.0);
        dx.hypot(dy)
    }

    /// Clips the segment `a → b` against the rectangle.
    ///
    /// Returns the parameter range `(t0, t1)` with `0 <= t0 <= t1 <= 1` of the
    /// part of the segment inside the rectangle, or `None` if the segment
    /// misses it. Uses the Liang-Barsky algorithm.
    #[must_use]
    pub fn clip_segment(&self, a: &Point2<f64>, b: &Point2<f64>) -> Option<(f64, f64)> {
        let d = b - a;
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;

        let checks = [
            (-d.x, a.x - self.min.x),
            (d.x, self.max.x - a.x),
            (-d.y, a.y - self.min.y),
            (d.y, self.max.y - a.y),
        ];

        for (p, q) in checks {
            if p == 0.0 {
                // Parallel to this border: inside or entirely outside
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return None;
            }
        }

        Some((t0, t1))
    }

    /// Exact overlap test between the closed rectangle and a closed triangle.
    ///
    /// Separating-axis test over the two rectangle axes and the three edge
    /// normals. Degenerate triangles reduce to their bounding-box test.
    #[must_use]
    pub fn overlaps_triangle(&self, a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> bool {
        let tri_min_x = a.x.min(b.x).min(c.x);
        let tri_max_x = a.x.max(b.x).max(c.x);
        let tri_min_y = a.y.min(b.y).min(c.y);
        let tri_max_y = a.y.max(b.y).max(c.y);
        if tri_min_x > self.max.x
            || tri_max_x < self.min.x
            || tri_min_y > self.max.y
            || tri_max_y < self.min.y
        {
            return false;
        }

        let corners = [
            self.min,
            Point2::new(self.max.x, self.min.y),
            self.max,
            Point2::new(self.min.x, self.max.y),
        ];
        let tri = [a, b, c];

        for i in 0..3 {
            let p = tri[i];
            let q = tri[(i + 1) % 3];
            let edge = q - p;
            let axis = Vector2::new(-edge.y, edge.x);
            if axis.norm_squared() == 0.0 {
                continue;
            }

            let tri_proj = [a, b, c].map(|v| axis.dot(&v.coords));
            let t_min = tri_proj[0].min(tri_proj[1]).min(tri_proj[2]);
            let t_max = tri_proj[0].max(tri_proj[1]).max(tri_proj[2]);

            let mut r_min = f64::INFINITY;
            let mut r_max = f64::NEG_INFINITY;
            for corner in &corners {
                let proj = axis.dot(&corner.coords);
                r_min = r_min.min(proj);
                r_max = r_max.max(proj);
            }

            if r_max < t_min || r_min > t_max {
                return false;
            }
        }

        true
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::new(Point2::origin(), Point2::new(1.0, 1.0))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit() -> Rect {
        Rect::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0))
    }

    #[test]
    fn test_from_points() {
        let pts = [
            Point2::new(1.0, 5.0),
            Point2::new(-2.0, 3.0),
            Point2::new(0.0, 7.0),
        ];
        let rect = Rect::from_points(&pts).unwrap();
        assert_eq!(rect.min, Point2::new(-2.0, 3.0));
        assert_eq!(rect.max, Point2::new(1.0, 7.0));
        assert!(Rect::from_points(&[]).is_none());
    }

    #[test]
    fn test_closed_intersection() {
        let a = unit();
        let b = Rect::new(Point2::new(1.0, 0.0), Point2::new(2.0, 1.0));
        assert!(a.intersects(&b));
        let shared = a.intersection(&b).unwrap();
        assert_eq!(shared.width(), 0.0);

        let c = Rect::new(Point2::new(1.5, 0.0), Point2::new(2.0, 1.0));
        assert!(!a.intersects(&c));
        assert!(a.intersection(&c).is_none());
    }

    #[test]
    fn test_clip_segment_inside() {
        let (t0, t1) = unit()
            .clip_segment(&Point2::new(0.2, 0.2), &Point2::new(0.8, 0.4))
            .unwrap();
        assert_eq!((t0, t1), (0.0, 1.0));
    }

    #[test]
    fn test_clip_segment_diagonal() {
        let (t0, t1) = unit()
            .clip_segment(&Point2::new(-1.0, -1.0), &Point2::new(2.0, 2.0))
            .unwrap();
        assert_relative_eq!(t0, 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(t1, 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clip_segment_miss() {
        assert!(
            unit()
                .clip_segment(&Point2::new(-1.0, 2.0), &Point2::new(2.0, 2.0))
                .is_none()
        );
        assert!(
            unit()
                .clip_segment(&Point2::new(2.0, -1.0), &Point2::new(3.0, 2.0))
                .is_none()
        );
    }

    #[test]
    fn test_clip_degenerate_segment() {
        let p = Point2::new(0.5, 0.5);
        assert_eq!(unit().clip_segment(&p, &p), Some((0.0, 1.0)));
        let q = Point2::new(3.0, 0.5);
        assert!(unit().clip_segment(&q, &q).is_none());
    }

    #[test]
    fn test_triangle_bbox_overlap_but_separated() {
        // Bounding boxes overlap, but the hypotenuse separates the shapes
        let rect = unit();
        let a = Point2::new(2.5, 0.0);
        let b = Point2::new(2.5, 2.5);
        let c = Point2::new(0.0, 2.5);
        assert!(!rect.overlaps_triangle(&a, &b, &c));

        let a = Point2::new(0.5, -1.0);
        let b = Point2::new(0.5, 0.5);
        let c = Point2::new(3.0, -1.0);
        assert!(rect.overlaps_triangle(&a, &b, &c));
    }

    #[test]
    fn test_triangle_containing_rect() {
        let rect = Rect::new(Point2::new(0.4, 0.4), Point2::new(0.5, 0.5));
        assert!(rect.overlaps_triangle(
            &Point2::new(-10.0, -10.0),
            &Point2::new(10.0, -10.0),
            &Point2::new(0.0, 10.0),
        ));
    }

    #[test]
    fn test_triangle_touching_corner() {
        let rect = unit();
        assert!(rect.overlaps_triangle(
            &Point2::new(1.0, 1.0),
            &Point2::new(2.0, 1.0),
            &Point2::new(2.0, 2.0),
        ));
    }

    #[test]
    fn test_degenerate_triangle() {
        let rect = unit();
        let p = Point2::new(0.5, 0.5);
        assert!(rect.overlaps_triangle(&p, &p, &p));
        let q = Point2::new(2.0, 2.0);
        assert!(!rect.overlaps_triangle(&q, &q, &q));
    }

    #[test]
    fn test_distance_to_point() {
        let rect = unit();
        assert_eq!(rect.distance_to_point(&Point2::new(1.0, 0.5)), 0.0);
        assert_relative_eq!(rect.distance_to_point(&Point2::new(-2.0, 0.5)), 2.0);
    }
}
