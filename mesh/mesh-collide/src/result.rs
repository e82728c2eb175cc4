//! Query result records.

use nalgebra::{Point3, Vector2, Vector3};

/// Nearest point on the surface to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClosestPointResult {
    /// Distance from the query point.
    pub distance: f64,
    /// Face holding the closest point.
    pub face: usize,
    /// The closest point itself.
    pub point: Point3<f64>,
    /// Barycentric coordinates of `point` on `face`.
    pub barycentric: Vector2<f64>,
}

/// Surface data at the crossing nearest to the origin of an inside test.
///
/// This is the nearest crossing along the ray, not necessarily the one that
/// decided the parity.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointInsideParams {
    /// Unit normal of the crossed face, zero if the face is degenerate.
    pub normal: Vector3<f64>,
    /// Distance from the query point to the crossing.
    pub depth: f64,
    /// The crossed face.
    pub face: usize,
}

/// Outcome of a ray-parity inside test.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InsideResult {
    /// Odd number of crossings.
    pub inside: bool,
    /// Number of surface crossings. Faces hit at the same point with the same
    /// facing count once.
    pub crossings: usize,
    /// Nearest crossing, if any.
    pub nearest: Option<PointInsideParams>,
}

/// Outcome of a vertical shot.
///
/// An unsuccessful shot keeps its starting sentinel: `-inf` when shooting
/// upward and `+inf` when shooting downward.
///
/// # Example
///
/// ```
/// use mesh_collide::VertIntersectionResult;
///
/// let up = VertIntersectionResult::not_found(0.0, 10.0);
/// assert_eq!(up.height, f64::NEG_INFINITY);
/// assert!(!up.is_found());
///
/// let down = VertIntersectionResult::not_found(10.0, 0.0);
/// assert_eq!(down.height, f64::INFINITY);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertIntersectionResult {
    /// Height of the hit, or the infinite sentinel.
    pub height: f64,
    /// Face hit.
    pub face: Option<usize>,
    /// Barycentric coordinates of the hit on `face`.
    pub barycentric: Vector2<f64>,
}

impl VertIntersectionResult {
    /// Empty result for a shot from `from` toward `to`.
    #[must_use]
    pub fn not_found(from: f64, to: f64) -> Self {
        Self {
            height: if to >= from {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            },
            face: None,
            barycentric: Vector2::zeros(),
        }
    }

    /// Returns `true` if a face was hit.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.height.is_finite()
    }
}
