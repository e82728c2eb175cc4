//! Triangulation of simple polygons by ear clipping.

use cf_grid::DuplicatePointsEliminator;
use nalgebra::Point2;
use tracing::warn;

/// Twice the signed area of a polygon; positive when counter-clockwise.
#[must_use]
pub fn signed_area_doubled(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum()
}

/// Removes repeated vertices from a closed contour.
///
/// Consecutive vertices closer than `epsilon` collapse into the first one,
/// including the last vertex when it closes back onto the first. Vertices
/// that merely revisit an earlier position are kept.
#[must_use]
pub fn clean_contour(contour: &[Point2<f64>], epsilon: f64) -> Vec<Point2<f64>> {
    let mut merged = DuplicatePointsEliminator::new(epsilon);
    let mut handles: Vec<usize> = Vec::with_capacity(contour.len());
    for &p in contour {
        let (handle, _) = merged.insert(p);
        if handles.last() != Some(&handle) {
            handles.push(handle);
        }
    }
    if handles.len() > 1 && handles.first() == handles.last() {
        handles.pop();
    }
    handles
        .into_iter()
        .filter_map(|h| merged.get(h).copied())
        .collect()
}

/// Triangulates a simple closed polygon.
///
/// The contour may be given in either orientation and need not repeat its
/// first vertex. It is cleaned with [`clean_contour`] first. Output
/// triangles are counter-clockwise. Contours with fewer than three distinct
/// vertices or zero area yield nothing. If no ear can be found, which only
/// happens for self-intersecting input, the remainder is fanned from its
/// first vertex.
///
/// # Example
///
/// ```
/// use mesh_collide::triangulate::triangulate_contour;
/// use nalgebra::Point2;
///
/// // L-shaped hexagon, area 3
/// let contour = [
///     Point2::new(0.0, 0.0),
///     Point2::new(2.0, 0.0),
///     Point2::new(2.0, 1.0),
///     Point2::new(1.0, 1.0),
///     Point2::new(1.0, 2.0),
///     Point2::new(0.0, 2.0),
/// ];
/// let tris = triangulate_contour(&contour, 1e-9);
/// assert_eq!(tris.len(), 4);
/// ```
#[must_use]
pub fn triangulate_contour(contour: &[Point2<f64>], epsilon: f64) -> Vec<[Point2<f64>; 3]> {
    let mut points = clean_contour(contour, epsilon);
    if points.len() < 3 {
        return Vec::new();
    }
    let area = signed_area_doubled(&points);
    if area == 0.0 || !area.is_finite() {
        return Vec::new();
    }
    if area < 0.0 {
        points.reverse();
    }

    let mut ring: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity(points.len() - 2);
    let mut misses = 0;
    let mut i = 0;

    while ring.len() > 3 {
        let n = ring.len();
        let (prev, cur, next) = (ring[(i + n - 1) % n], ring[i % n], ring[(i + 1) % n]);
        let (a, b, c) = (points[prev], points[cur], points[next]);
        let turn = (b - a).perp(&(c - b));

        if turn == 0.0 {
            // Collinear vertex: drop it without emitting a triangle
            ring.remove(i % n);
            misses = 0;
            continue;
        }
        if turn > 0.0 && is_ear(&points, &ring, prev, cur, next) {
            triangles.push([a, b, c]);
            ring.remove(i % n);
            misses = 0;
            continue;
        }

        i = (i + 1) % n;
        misses += 1;
        if misses >= n {
            warn!(
                remaining = n,
                "No ear found in contour, falling back to a fan"
            );
            let first = points[ring[0]];
            for w in ring[1..].windows(2) {
                triangles.push([first, points[w[0]], points[w[1]]]);
            }
            return triangles;
        }
    }

    let last = [points[ring[0]], points[ring[1]], points[ring[2]]];
    if (last[1] - last[0]).perp(&(last[2] - last[0])) != 0.0 {
        triangles.push(last);
    }
    triangles
}

/// Checks that no other ring vertex lies inside or on the candidate ear.
fn is_ear(points: &[Point2<f64>], ring: &[usize], prev: usize, cur: usize, next: usize) -> bool {
    let (a, b, c) = (points[prev], points[cur], points[next]);
    ring.iter()
        .filter(|&&k| k != prev && k != cur && k != next)
        .map(|&k| points[k])
        .filter(|p| *p != a && *p != b && *p != c)
        .all(|p| !in_triangle(&p, &a, &b, &c))
}

/// Closed containment test for a counter-clockwise triangle.
fn in_triangle(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> bool {
    (b - a).perp(&(p - a)) >= 0.0 && (c - b).perp(&(p - b)) >= 0.0 && (a - c).perp(&(p - c)) >= 0.0
}
