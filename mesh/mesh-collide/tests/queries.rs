//! End-to-end query tests over small meshes and terrain patches.
//!
//! Run with: cargo test -p mesh-collide --test queries

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::cast_precision_loss
)]

use approx::assert_relative_eq;
use mesh_collide::{
    Collider, CollisionMesh, Contour, ContourIndex, GridParams, QueryParams, Rect, Triangle,
    ZRange,
};
use nalgebra::{Point2, Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// =============================================================================
// Fixtures
// =============================================================================

/// Rolling terrain, `n x n` samples at 1 m spacing.
fn rolling_terrain(n: usize) -> CollisionMesh {
    let mut heights = Vec::with_capacity(n * n);
    for row in 0..n {
        for col in 0..n {
            let (x, y) = (col as f64, row as f64);
            heights.push((x * 0.4).sin() * 2.0 + (y * 0.3).cos() * 1.5);
        }
    }
    CollisionMesh::from_heightfield(Point2::origin(), 1.0, n, n, &heights).unwrap()
}

fn terrain_collider(n: usize) -> Collider<CollisionMesh> {
    Collider::build(rolling_terrain(n), &GridParams::default().with_faces_per_small_cell(4))
        .unwrap()
}

// =============================================================================
// Closest point
// =============================================================================

#[test]
fn closest_point_above_centroid() {
    let tri = vec![Triangle::from_arrays(
        [0.0, 0.0, 0.0],
        [3.0, 0.0, 0.0],
        [0.0, 3.0, 0.0],
    )];
    let collider = Collider::build(tri, &GridParams::default()).unwrap();

    let h = 2.5;
    let hit = collider
        .closest_point(&Point3::new(1.0, 1.0, h), 10.0)
        .unwrap();
    assert_relative_eq!(hit.distance, h, epsilon = 1e-12);
    assert_eq!(hit.face, 0);
    assert_relative_eq!(hit.barycentric.x, 1.0 / 3.0, epsilon = 1e-12);
    assert_relative_eq!(hit.barycentric.y, 1.0 / 3.0, epsilon = 1e-12);

    // Strictly within range
    assert!(collider.closest_point(&Point3::new(1.0, 1.0, h), h).is_none());
}

#[test]
fn closest_point_matches_brute_force_on_terrain() {
    let collider = terrain_collider(24);
    let mesh = collider.source();
    let mut scratch = collider.scratch();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..200 {
        let origin = Point3::new(
            rng.gen_range(0.0..23.0),
            rng.gen_range(0.0..23.0),
            rng.gen_range(-6.0..8.0),
        );
        let brute = mesh
            .triangles()
            .map(|t| (mesh_collide::closest_point_on_triangle(&origin, &t) - origin).norm())
            .fold(f64::INFINITY, f64::min);

        let hit = collider
            .closest_point_with(&origin, 50.0, &mut scratch)
            .unwrap();
        assert_relative_eq!(hit.distance, brute, epsilon = 1e-9);
        assert_relative_eq!((hit.point - origin).norm(), hit.distance, epsilon = 1e-12);
    }
}

// =============================================================================
// Point inside
// =============================================================================

/// Points this close to a cube face are ambiguous for the oracle.
fn near_cube_face(p: &Point3<f64>) -> bool {
    const EPS: f64 = 1e-6;
    p.iter().any(|&c| c.abs() < EPS || (c - 1.0).abs() < EPS)
}

#[test]
fn point_inside_agrees_with_cube_oracle() {
    let collider = Collider::build(CollisionMesh::unit_cube(), &GridParams::fine()).unwrap();
    let mut scratch = collider.scratch();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let directions = [Vector3::z(), Vector3::new(0.31, 0.17, 0.93)];

    let mut checked = 0;
    while checked < 1000 {
        let p = Point3::new(
            rng.gen_range(-0.5..1.5),
            rng.gen_range(-0.5..1.5),
            rng.gen_range(-0.5..1.5),
        );
        if near_cube_face(&p) {
            continue;
        }
        let expected = p.iter().all(|&c| c > 0.0 && c < 1.0);
        for dir in &directions {
            let result = collider.point_inside_with(&p, dir, &mut scratch);
            assert_eq!(result.inside, expected, "point {p:?} along {dir:?}");
            assert_eq!(result.crossings % 2 == 1, result.inside);
        }
        checked += 1;
    }
}

#[test]
fn point_inside_on_face_diagonals() {
    // Rays through the diagonal edges that split each cube face
    let collider = Collider::build(CollisionMesh::unit_cube(), &GridParams::fine()).unwrap();
    let mut scratch = collider.scratch();
    let directions = [
        Vector3::z(),
        -Vector3::z(),
        Vector3::new(1.0, 1.0, 2.0),
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::new(0.31, 0.17, 0.93),
    ];
    let points = [
        Point3::new(0.5, 0.5, 0.5),
        Point3::new(0.25, 0.25, 0.5),
        Point3::new(0.8, 0.8, 0.1),
        Point3::new(0.3, 0.7, 0.5),
    ];

    for p in &points {
        for dir in &directions {
            let result = collider.point_inside_with(p, dir, &mut scratch);
            assert!(result.inside, "point {p:?} along {dir:?}");
            assert_eq!(result.crossings, 1, "point {p:?} along {dir:?}");
        }
    }

    for z in [-0.5, 1.5] {
        let p = Point3::new(0.5, 0.5, z);
        for dir in [Vector3::z(), -Vector3::z()] {
            let result = collider.point_inside_with(&p, &dir, &mut scratch);
            assert!(!result.inside, "point {p:?} along {dir:?}");
            assert_eq!(result.crossings % 2, 0);
        }
    }
}

#[test]
fn point_inside_reports_nearest_crossing() {
    let collider = Collider::build(CollisionMesh::unit_cube(), &GridParams::default()).unwrap();

    let below = collider.point_inside_along(&Point3::new(0.3, 0.6, -2.0), &Vector3::z());
    assert!(!below.inside);
    assert_eq!(below.crossings, 2);
    let nearest = below.nearest.unwrap();
    assert_relative_eq!(nearest.depth, 2.0, epsilon = 1e-9);
    // Bottom faces point down
    assert_relative_eq!(nearest.normal.z, -1.0, epsilon = 1e-12);

    let degenerate = collider.point_inside_along(&Point3::new(0.3, 0.6, 0.5), &Vector3::zeros());
    assert_eq!(degenerate.crossings, 0);
    assert!(degenerate.nearest.is_none());
}

// =============================================================================
// Vertical shooting
// =============================================================================

#[test]
fn vertical_shots_follow_direction() {
    // Floors at z = 1 and z = 4
    let mut tris = Vec::new();
    for z in [1.0, 4.0] {
        tris.push(Triangle::from_arrays([0.0, 0.0, z], [5.0, 0.0, z], [5.0, 5.0, z]));
        tris.push(Triangle::from_arrays([0.0, 0.0, z], [5.0, 5.0, z], [0.0, 5.0, z]));
    }
    let collider = Collider::build(tris, &GridParams::default()).unwrap();
    let p = Point2::new(2.0, 3.5);

    assert_eq!(collider.shoot_vertical(&p, -10.0, 10.0).height, 4.0);
    assert_eq!(collider.shoot_vertical(&p, 10.0, -10.0).height, 1.0);
    assert_eq!(collider.shoot_vertical(&p, 2.0, 10.0).height, 4.0);
    assert_eq!(collider.shoot_vertical(&p, 2.0, -10.0).height, 1.0);
    assert_eq!(collider.shoot_vertical(&p, 2.0, 3.0).height, f64::NEG_INFINITY);
    assert_eq!(collider.shoot_vertical(&p, 3.0, 2.0).height, f64::INFINITY);
    assert_eq!(collider.height_at(&p), Some(4.0));
}

#[test]
fn height_at_matches_heightfield_samples() {
    let mesh = rolling_terrain(16);
    let expected: Vec<f64> = mesh.vertices().iter().map(|v| v.z).collect();
    let collider = Collider::build(mesh, &GridParams::default()).unwrap();

    for row in 1..15 {
        for col in 1..15 {
            let h = collider
                .height_at(&Point2::new(col as f64, row as f64))
                .unwrap();
            assert_relative_eq!(h, expected[row * 16 + col], epsilon = 1e-9);
        }
    }
}

// =============================================================================
// Region gathering
// =============================================================================

#[test]
fn rect_gather_is_unique_and_complete() {
    let collider = terrain_collider(20);
    let rect = Rect::new(Point2::new(3.3, 4.1), Point2::new(9.7, 12.2));
    let found = collider.triangles_in_rect(&rect, None);

    let mut sorted = found.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), found.len());

    for (face, tri) in collider.source().triangles().enumerate() {
        let [a, b, c] = tri.footprint();
        if rect.overlaps_triangle(&a, &b, &c) {
            assert!(found.contains(&face), "face {face} missing");
        }
    }
}

#[test]
fn rect_gather_with_z_filter() {
    let collider = terrain_collider(20);
    let rect = Rect::new(Point2::new(0.0, 0.0), Point2::new(19.0, 19.0));
    let all = collider.triangles_in_rect(&rect, None);
    let high = collider.triangles_in_rect(&rect, Some(ZRange::new(3.0, 10.0)));
    assert!(!high.is_empty());
    assert!(high.len() < all.len());
    assert!(high.iter().all(|f| all.contains(f)));
}

#[test]
fn contour_gather_covers_polygon() {
    let collider = terrain_collider(20);
    // Triangle-shaped region
    let contour = [
        Point2::new(2.0, 2.0),
        Point2::new(16.0, 3.0),
        Point2::new(6.0, 15.0),
    ];
    let found = collider.triangles_in_contour(&contour, None);

    let mut sorted = found.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), found.len());

    // Every face whose centroid lies inside the region is found
    let [a, b, d] = contour;
    for (face, tri) in collider.source().triangles().enumerate() {
        let c = tri.centroid().xy();
        let inside = (b - a).perp(&(c - a)) > 0.0
            && (d - b).perp(&(c - b)) > 0.0
            && (a - d).perp(&(c - d)) > 0.0;
        if inside {
            assert!(found.contains(&face), "face {face} missing");
        }
    }

    let bounds = Rect::new(Point2::new(2.0, 2.0), Point2::new(16.0, 15.0));
    assert!(found.len() < collider.triangles_in_rect(&bounds, None).len());
}

// =============================================================================
// Contours
// =============================================================================

#[test]
fn contour_index_classifies_rays() {
    let parcels = [
        Contour::new(
            10,
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 4.0),
                Point2::new(0.0, 4.0),
            ],
        ),
        Contour::new(
            20,
            vec![
                Point2::new(6.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(8.0, 4.0),
            ],
        ),
    ];
    let index = ContourIndex::new(&parcels, None).unwrap();
    let mut scratch = mesh_collide::QueryScratch::new();

    let from = Point2::new(5.0, 1.0);
    assert_eq!(index.shoot_ray(&from, &Point2::new(-1.0, 1.0), 0, None, &mut scratch), 10);
    assert_eq!(index.shoot_ray(&from, &Point2::new(11.0, 1.0), 0, None, &mut scratch), 20);
    assert_eq!(index.shoot_ray(&from, &Point2::new(5.0, 3.5), 0, None, &mut scratch), 0);
}

// =============================================================================
// Determinism and sharing
// =============================================================================

#[test]
fn queries_are_deterministic() {
    let collider = terrain_collider(18);
    let params = QueryParams::for_terrain();
    let again = Collider::build_with(
        rolling_terrain(18),
        &GridParams::default().with_faces_per_small_cell(4),
        params,
    )
    .unwrap();

    let origin = Point3::new(7.2, 9.9, 5.0);
    let rect = Rect::new(Point2::new(1.0, 1.0), Point2::new(8.0, 6.0));
    for c in [&collider, &again] {
        let first = (
            c.closest_point(&origin, 20.0),
            c.point_inside_along(&origin, &Vector3::new(0.2, 0.1, -1.0)),
            c.triangles_in_rect(&rect, None),
            c.shoot_vertical(&origin.xy(), 10.0, -10.0),
        );
        let second = (
            c.closest_point(&origin, 20.0),
            c.point_inside_along(&origin, &Vector3::new(0.2, 0.1, -1.0)),
            c.triangles_in_rect(&rect, None),
            c.shoot_vertical(&origin.xy(), 10.0, -10.0),
        );
        assert_eq!(first, second);
    }
}

#[test]
fn collider_is_shared_across_threads() {
    let collider = terrain_collider(20);
    let heights: Vec<Option<f64>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let collider = &collider;
                s.spawn(move || collider.height_at(&Point2::new(2.5 + f64::from(i), 3.5)))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(heights.iter().all(Option::is_some));
}
