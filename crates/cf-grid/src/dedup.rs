//! Duplicate-point elimination with an epsilon tolerance.
//!
//! Points are kept in an ordered map sorted lexicographically (x, then y,
//! then z). A lookup seeks to `x - epsilon` and scans forward until the
//! primary coordinate exceeds `x + epsilon`, testing the true distance of each
//! candidate on the way.
//!
//! The first accepted point represents its whole epsilon neighbourhood: later
//! points within epsilon of it are reported as duplicates and never move it.
//! Chains of points each within epsilon of the previous one can therefore
//! produce several representatives; no centroid is maintained.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use nalgebra::{Point2, Point3};

/// Lexicographic key with a total order over `f64` coordinates.
#[derive(Debug, Clone, Copy)]
pub struct LexKey([f64; 3]);

impl PartialEq for LexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LexKey {}

impl PartialOrd for LexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.total_cmp(b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// A point type the eliminator can order.
pub trait LexPoint: Copy {
    /// Lexicographic key of the point.
    fn lex_key(&self) -> LexKey;

    /// Smallest key with the given primary coordinate.
    fn search_key(primary: f64) -> LexKey;

    /// Primary (X) coordinate.
    fn primary(&self) -> f64;

    /// Squared Euclidean distance to another point.
    fn distance_squared(&self, other: &Self) -> f64;
}

impl LexPoint for Point2<f64> {
    fn lex_key(&self) -> LexKey {
        LexKey([self.x, self.y, 0.0])
    }

    fn search_key(primary: f64) -> LexKey {
        LexKey([primary, f64::NEG_INFINITY, f64::NEG_INFINITY])
    }

    fn primary(&self) -> f64 {
        self.x
    }

    fn distance_squared(&self, other: &Self) -> f64 {
        nalgebra::distance_squared(self, other)
    }
}

impl LexPoint for Point3<f64> {
    fn lex_key(&self) -> LexKey {
        LexKey([self.x, self.y, self.z])
    }

    fn search_key(primary: f64) -> LexKey {
        LexKey([primary, f64::NEG_INFINITY, f64::NEG_INFINITY])
    }

    fn primary(&self) -> f64 {
        self.x
    }

    fn distance_squared(&self, other: &Self) -> f64 {
        nalgebra::distance_squared(self, other)
    }
}

/// Incremental set of points that rejects near-duplicates.
///
/// Handles are dense indices in insertion order of the accepted points.
///
/// # Example
///
/// ```
/// use cf_grid::DuplicatePointsEliminator;
/// use nalgebra::Point2;
///
/// let mut points = DuplicatePointsEliminator::new(0.01);
/// let (a, new_a) = points.insert(Point2::new(1.0, 1.0));
/// let (b, new_b) = points.insert(Point2::new(1.005, 1.0));
/// let (c, new_c) = points.insert(Point2::new(2.0, 1.0));
///
/// assert!(new_a && !new_b && new_c);
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// assert_eq!(points.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct DuplicatePointsEliminator<P> {
    epsilon: f64,
    index: BTreeMap<LexKey, usize>,
    points: Vec<P>,
}

impl<P: LexPoint> DuplicatePointsEliminator<P> {
    /// Creates an empty set. Negative epsilons are taken by magnitude.
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.abs(),
            index: BTreeMap::new(),
            points: Vec::new(),
        }
    }

    /// Merge distance.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Inserts a point unless an accepted point lies within epsilon.
    ///
    /// Returns the handle of the representative and `true` if `point` itself
    /// was accepted.
    pub fn insert(&mut self, point: P) -> (usize, bool) {
        if let Some(handle) = self.find(&point) {
            return (handle, false);
        }
        let handle = self.points.len();
        self.points.push(point);
        self.index.insert(point.lex_key(), handle);
        (handle, true)
    }

    /// Finds an accepted point within epsilon of `point`.
    #[must_use]
    pub fn find(&self, point: &P) -> Option<usize> {
        let x = point.primary();
        let eps_sq = self.epsilon * self.epsilon;
        for (key, &handle) in self.index.range(P::search_key(x - self.epsilon)..) {
            if key.0[0] > x + self.epsilon {
                break;
            }
            if self.points[handle].distance_squared(point) <= eps_sq {
                return Some(handle);
            }
        }
        None
    }

    /// Accepted point by handle.
    #[must_use]
    pub fn get(&self, handle: usize) -> Option<&P> {
        self.points.get(handle)
    }

    /// Accepted points in handle order.
    #[must_use]
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// Consumes the set, returning the accepted points in handle order.
    #[must_use]
    pub fn into_points(self) -> Vec<P> {
        self.points
    }

    /// Number of accepted points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if no point was accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_first_point_wins() {
        let mut set = DuplicatePointsEliminator::new(0.1);
        set.insert(Point2::new(0.0, 0.0));
        let (handle, inserted) = set.insert(Point2::new(0.05, 0.05));
        assert!(!inserted);
        assert_eq!(handle, 0);
        assert_eq!(set.get(0).unwrap(), &Point2::new(0.0, 0.0));
    }

    #[test]
    fn test_chain_keeps_representatives() {
        let mut set = DuplicatePointsEliminator::new(0.1);
        set.insert(Point2::new(0.0, 0.0));
        set.insert(Point2::new(0.08, 0.0));
        let (_, inserted) = set.insert(Point2::new(0.16, 0.0));
        // Within epsilon of the rejected point only
        assert!(inserted);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_scan_skips_far_secondary_axis() {
        let mut set = DuplicatePointsEliminator::new(0.5);
        set.insert(Point2::new(1.0, 10.0));
        set.insert(Point2::new(1.2, -10.0));
        // Same X band as both, far in Y from either
        let (_, inserted) = set.insert(Point2::new(1.1, 0.0));
        assert!(inserted);
        // Close to the second one, found after skipping the first
        assert_eq!(set.find(&Point2::new(0.9, -10.2)), Some(1));
    }

    #[test]
    fn test_epsilon_boundary_is_inclusive() {
        let mut set = DuplicatePointsEliminator::new(0.5);
        set.insert(Point3::new(0.0, 0.0, 0.0));
        assert_eq!(set.find(&Point3::new(0.0, 0.0, 0.5)), Some(0));
        assert_eq!(set.find(&Point3::new(0.0, 0.0, 0.51)), None);
    }

    #[test]
    fn test_zero_epsilon_merges_exact_copies() {
        let mut set = DuplicatePointsEliminator::new(0.0);
        assert!(set.insert(Point3::new(1.0, 2.0, 3.0)).1);
        assert!(!set.insert(Point3::new(1.0, 2.0, 3.0)).1);
        assert!(set.insert(Point3::new(1.0, 2.0, 3.000_001)).1);
        assert_eq!(set.into_points().len(), 2);
    }

    #[test]
    fn test_lex_key_order() {
        let a = Point3::new(1.0, 5.0, 0.0).lex_key();
        let b = Point3::new(1.0, 6.0, -1.0).lex_key();
        let c = Point3::new(2.0, 0.0, 0.0).lex_key();
        assert!(a < b && b < c);
        assert!(<Point3<f64> as LexPoint>::search_key(1.0) < a);
    }
}
