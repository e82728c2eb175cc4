//! Triangle geometry used by the collision queries.
//!
//! Barycentric coordinates are always `(alpha, beta)` such that a point is
//! `v0 + alpha * (v1 - v0) + beta * (v2 - v0)`.

use cf_grid::ZRange;
use nalgebra::{Point2, Point3, Vector2, Vector3};

/// Tolerance on barycentric coordinates for vertical and ray intersections,
/// so a point on an edge shared by two triangles hits both of them.
pub const BARYCENTRIC_TOLERANCE: f64 = 1e-12;

/// Minimum ray parameter and determinant for Möller-Trumbore.
pub const RAY_EPSILON: f64 = 1e-10;

/// A triangle with concrete vertex positions.
///
/// Winding is counter-clockwise when viewed from the front.
///
/// # Example
///
/// ```
/// use mesh_collide::Triangle;
///
/// let tri = Triangle::from_arrays([0.0, 0.0, 0.0], [2.0, 0.0, 1.0], [0.0, 2.0, 3.0]);
/// assert_eq!(tri.z_range().max, 3.0);
///
/// let bary = tri.barycentric(&tri.centroid()).unwrap();
/// assert!((bary.x - 1.0 / 3.0).abs() < 1e-12);
/// assert!((bary.y - 1.0 / 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Triangle {
    /// First vertex.
    pub v0: Point3<f64>,
    /// Second vertex.
    pub v1: Point3<f64>,
    /// Third vertex.
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    #[must_use]
    pub const fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Create a triangle from coordinate arrays.
    #[inline]
    #[must_use]
    pub fn from_arrays(v0: [f64; 3], v1: [f64; 3], v2: [f64; 3]) -> Self {
        Self {
            v0: Point3::from(v0),
            v1: Point3::from(v1),
            v2: Point3::from(v2),
        }
    }

    /// Vertices as an array.
    #[inline]
    #[must_use]
    pub const fn to_array(&self) -> [Point3<f64>; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Unnormalized face normal, twice the area in magnitude.
    #[inline]
    #[must_use]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Unit face normal, or `None` for a degenerate triangle.
    #[must_use]
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        let len_sq = n.norm_squared();
        if len_sq > f64::EPSILON * f64::EPSILON {
            Some(n / len_sq.sqrt())
        } else {
            None
        }
    }

    /// Area of the triangle.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    /// Center of mass.
    #[inline]
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Vertical extent.
    #[must_use]
    pub fn z_range(&self) -> ZRange {
        let mut range = ZRange::new(self.v0.z, self.v1.z);
        range.expand(self.v2.z);
        range
    }

    /// Projection onto the XY plane.
    #[must_use]
    pub fn footprint(&self) -> [Point2<f64>; 3] {
        [self.v0.xy(), self.v1.xy(), self.v2.xy()]
    }

    /// Point at the given barycentric coordinates.
    #[must_use]
    pub fn point_at(&self, barycentric: &Vector2<f64>) -> Point3<f64> {
        self.v0 + (self.v1 - self.v0) * barycentric.x + (self.v2 - self.v0) * barycentric.y
    }

    /// Barycentric coordinates of `point`, computed in the coordinate plane
    /// most parallel to the triangle.
    ///
    /// The point is assumed to lie in the triangle's plane; otherwise the
    /// result is that of its projection along the dominant normal axis.
    /// Returns `None` for a degenerate triangle.
    #[must_use]
    pub fn barycentric(&self, point: &Point3<f64>) -> Option<Vector2<f64>> {
        let n = self.normal_unnormalized().abs();
        let (i, j) = if n.x >= n.y && n.x >= n.z {
            (1, 2)
        } else if n.y >= n.z {
            (2, 0)
        } else {
            (0, 1)
        };
        let project = |p: &Point3<f64>| Vector2::new(p[i], p[j]);

        let origin = project(&self.v0);
        let e1 = project(&self.v1) - origin;
        let e2 = project(&self.v2) - origin;
        let w = project(point) - origin;

        let det = e1.perp(&e2);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Vector2::new(w.perp(&e2) / det, e1.perp(&w) / det))
    }

    /// Lower bound on the distance from `point` to the triangle, from its
    /// axis-aligned bounding box.
    #[must_use]
    pub fn bounding_box_distance(&self, point: &Point3<f64>) -> f64 {
        let lo = self.v0.coords.inf(&self.v1.coords).inf(&self.v2.coords);
        let hi = self.v0.coords.sup(&self.v1.coords).sup(&self.v2.coords);
        let below = lo - point.coords;
        let above = point.coords - hi;
        below.sup(&above).sup(&Vector3::zeros()).norm()
    }
}

impl From<[Point3<f64>; 3]> for Triangle {
    fn from([v0, v1, v2]: [Point3<f64>; 3]) -> Self {
        Self { v0, v1, v2 }
    }
}

/// A ray-triangle intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Ray parameter of the hit, in units of the direction vector.
    pub t: f64,
    /// Barycentric coordinates of the hit on the triangle.
    pub barycentric: Vector2<f64>,
    /// `true` if the ray hits the front (counter-clockwise) side.
    pub front_facing: bool,
}

/// Closest point on a triangle to a query point.
///
/// Implements the region classification from "Real-Time Collision
/// Detection" by Christer Ericson.
#[must_use]
pub fn closest_point_on_triangle(point: &Point3<f64>, tri: &Triangle) -> Point3<f64> {
    let Triangle { v0, v1, v2 } = *tri;
    let ab = v1 - v0;
    let ac = v2 - v0;
    let ap = point - v0;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);

    // Vertex region outside A
    if d1 <= 0.0 && d2 <= 0.0 {
        return v0;
    }

    let bp = point - v1;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);

    // Vertex region outside B
    if d3 >= 0.0 && d4 <= d3 {
        return v1;
    }

    // Edge region of AB
    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return v0 + ab * v;
    }

    let cp = point - v2;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);

    // Vertex region outside C
    if d6 >= 0.0 && d5 <= d6 {
        return v2;
    }

    // Edge region of AC
    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return v0 + ac * w;
    }

    // Edge region of BC
    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return v1 + (v2 - v1) * w;
    }

    // Face region
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;

    v0 + ab * v + ac * w
}

/// Intersects the ray `origin + t * dir`, `t > 0`, with a triangle.
///
/// Uses the Möller-Trumbore algorithm. With `cull_backface`, hits on the
/// back side are ignored.
///
/// Edges are closed and padded by [`BARYCENTRIC_TOLERANCE`]: a ray through an
/// edge or vertex shared by several triangles hits every one of them. Callers
/// that count crossings must merge hits at the same `t`.
#[must_use]
pub fn ray_triangle_intersect(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    tri: &Triangle,
    cull_backface: bool,
) -> Option<RayHit> {
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;

    let h = dir.cross(&edge2);
    let a = edge1.dot(&h);

    // Parallel, or seen from behind when culling
    if a.abs() < RAY_EPSILON || (cull_backface && a < 0.0) {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - tri.v0;
    let u = f * s.dot(&h);
    if !(-BARYCENTRIC_TOLERANCE..=1.0 + BARYCENTRIC_TOLERANCE).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);
    if v < -BARYCENTRIC_TOLERANCE || u + v > 1.0 + BARYCENTRIC_TOLERANCE {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > RAY_EPSILON).then(|| RayHit {
        t,
        barycentric: Vector2::new(u, v),
        front_facing: a > 0.0,
    })
}

/// Intersects the vertical line through `point` with a triangle.
///
/// Returns the height of the hit and its barycentric coordinates. Vertical
/// triangles never intersect.
#[must_use]
pub fn vertical_intersect(tri: &Triangle, point: &Point2<f64>) -> Option<(f64, Vector2<f64>)> {
    let e1 = (tri.v1 - tri.v0).xy();
    let e2 = (tri.v2 - tri.v0).xy();
    let w = point - tri.v0.xy();

    let det = e1.perp(&e2);
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let alpha = w.perp(&e2) / det;
    let beta = e1.perp(&w) / det;
    if alpha < -BARYCENTRIC_TOLERANCE
        || beta < -BARYCENTRIC_TOLERANCE
        || alpha + beta > 1.0 + BARYCENTRIC_TOLERANCE
    {
        return None;
    }

    let height = tri.v0.z + alpha * (tri.v1.z - tri.v0.z) + beta * (tri.v2.z - tri.v0.z);
    Some((height, Vector2::new(alpha, beta)))
}

/// Intersects the segments `a -> b` and `c -> d`.
///
/// Returns the parameters `(t, u)` of the crossing along each segment.
/// Parallel segments, overlapping or not, do not intersect.
#[must_use]
pub fn segment_intersect_2d(
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    d: &Point2<f64>,
) -> Option<(f64, f64)> {
    let r = b - a;
    let s = d - c;
    let denom = r.perp(&s);
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    let ac = c - a;
    let t = ac.perp(&s) / denom;
    let u = ac.perp(&r) / denom;
    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then_some((t, u))
}

/// Distance from a point to a segment in the plane.
#[must_use]
pub fn point_segment_distance_2d(point: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let ap = point - a;

    let t = (ap.dot(&ab) / ab.norm_squared().max(f64::EPSILON)).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm()
}
