//! Access to the triangles a grid indexes.
//!
//! A grid only stores face indices. Queries reach the actual geometry through
//! [`TriangleSource`], which also carries the per-face predicates. The
//! defaults evaluate them on [`TriangleSource::triangle`]; implementors with
//! cached normals or a faster test can override them.

use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::geometry::{RayHit, Triangle, closest_point_on_triangle, ray_triangle_intersect};

/// Indexed access to triangles and the geometric tests queries run on them.
///
/// # Example
///
/// ```
/// use mesh_collide::{Triangle, TriangleSource};
/// use nalgebra::{Point2, Point3};
///
/// let tris = vec![Triangle::from_arrays([0.0, 0.0, 1.0], [4.0, 0.0, 1.0], [0.0, 4.0, 1.0])];
/// assert_eq!(tris.face_count(), 1);
///
/// let (height, _) = tris.vertical_intersect(0, &Point2::new(1.0, 1.0)).unwrap();
/// assert_eq!(height, 1.0);
///
/// let (dist, _) = tris.closest(f64::INFINITY, 0, &Point3::new(1.0, 1.0, 3.0)).unwrap();
/// assert_eq!(dist, 2.0);
/// ```
pub trait TriangleSource {
    /// Number of triangles.
    fn face_count(&self) -> usize;

    /// Triangle by index.
    ///
    /// # Panics
    ///
    /// May panic if `face >= face_count()`.
    fn triangle(&self, face: usize) -> Triangle;

    /// Unit normal of a triangle, `None` if it is degenerate.
    fn triangle_normal(&self, face: usize) -> Option<Vector3<f64>> {
        self.triangle(face).normal()
    }

    /// Ray intersection, see [`ray_triangle_intersect`].
    fn intersect(
        &self,
        face: usize,
        origin: &Point3<f64>,
        dir: &Vector3<f64>,
        cull_backface: bool,
    ) -> Option<RayHit> {
        ray_triangle_intersect(origin, dir, &self.triangle(face), cull_backface)
    }

    /// Height and barycentric coordinates where the vertical line through
    /// `point` crosses the triangle.
    fn vertical_intersect(&self, face: usize, point: &Point2<f64>) -> Option<(f64, Vector2<f64>)> {
        crate::geometry::vertical_intersect(&self.triangle(face), point)
    }

    /// Distance from `origin` to the triangle and the closest point, if that
    /// distance is strictly below `max_dist_so_far`.
    fn closest(
        &self,
        max_dist_so_far: f64,
        face: usize,
        origin: &Point3<f64>,
    ) -> Option<(f64, Point3<f64>)> {
        let tri = self.triangle(face);
        if tri.bounding_box_distance(origin) >= max_dist_so_far {
            return None;
        }
        let point = closest_point_on_triangle(origin, &tri);
        let dist = (point - origin).norm();
        (dist < max_dist_so_far).then_some((dist, point))
    }

    /// All triangles as vertex arrays, in face order.
    fn triangle_arrays(&self) -> Vec<[Point3<f64>; 3]> {
        (0..self.face_count())
            .map(|face| self.triangle(face).to_array())
            .collect()
    }
}

impl TriangleSource for [Triangle] {
    fn face_count(&self) -> usize {
        self.len()
    }

    fn triangle(&self, face: usize) -> Triangle {
        self[face]
    }
}

impl TriangleSource for Vec<Triangle> {
    fn face_count(&self) -> usize {
        self.len()
    }

    fn triangle(&self, face: usize) -> Triangle {
        self[face]
    }
}

impl<S: TriangleSource + ?Sized> TriangleSource for &S {
    fn face_count(&self) -> usize {
        (**self).face_count()
    }

    fn triangle(&self, face: usize) -> Triangle {
        (**self).triangle(face)
    }

    fn triangle_normal(&self, face: usize) -> Option<Vector3<f64>> {
        (**self).triangle_normal(face)
    }

    fn intersect(
        &self,
        face: usize,
        origin: &Point3<f64>,
        dir: &Vector3<f64>,
        cull_backface: bool,
    ) -> Option<RayHit> {
        (**self).intersect(face, origin, dir, cull_backface)
    }

    fn vertical_intersect(&self, face: usize, point: &Point2<f64>) -> Option<(f64, Vector2<f64>)> {
        (**self).vertical_intersect(face, point)
    }

    fn closest(
        &self,
        max_dist_so_far: f64,
        face: usize,
        origin: &Point3<f64>,
    ) -> Option<(f64, Point3<f64>)> {
        (**self).closest(max_dist_so_far, face, origin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn tris() -> Vec<Triangle> {
        vec![
            Triangle::from_arrays([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            Triangle::from_arrays([5.0, 5.0, 2.0], [6.0, 5.0, 2.0], [5.0, 6.0, 2.0]),
        ]
    }

    #[test]
    fn test_closest_respects_bound() {
        let tris = tris();
        let origin = Point3::new(0.2, 0.2, 1.0);
        let (dist, point) = tris.closest(10.0, 0, &origin).unwrap();
        assert!((dist - 1.0).abs() < 1e-12);
        assert!((point.z).abs() < 1e-12);

        // Equal to the bound is not an improvement
        assert!(tris.closest(1.0, 0, &origin).is_none());
        // Rejected by the bounding box alone
        assert!(tris.closest(1.0, 1, &origin).is_none());
    }

    #[test]
    fn test_slice_and_reference_agree() {
        let tris = tris();
        let slice: &[Triangle] = &tris;
        let by_ref = &slice;
        assert_eq!(slice.face_count(), 2);
        assert_eq!(by_ref.triangle(1), tris[1]);
        assert_eq!(by_ref.triangle_arrays().len(), 2);
        assert_eq!(
            by_ref.triangle_normal(0).unwrap(),
            Vector3::new(0.0, 0.0, 1.0)
        );
    }

    #[test]
    fn test_intersect_through_trait() {
        let tris = tris();
        let hit = tris
            .intersect(
                1,
                &Point3::new(5.2, 5.2, 0.0),
                &Vector3::new(0.0, 0.0, 1.0),
                false,
            )
            .unwrap();
        assert!((hit.t - 2.0).abs() < 1e-12);
        assert!(tris.vertical_intersect(1, &Point2::new(0.2, 0.2)).is_none());
    }
}
