//! Collision queries against triangulated terrain and meshes.
//!
//! This crate answers spatial questions about large triangle sets through a
//! [`cf_grid::Grid2L`] built over their horizontal footprint:
//!
//! - [`closest_point`] - Nearest surface point within a radius
//! - [`point_inside`] - Ray-parity inside test with the nearest crossing
//! - [`shoot_vertical`] - Height of the surface above or below a point
//! - [`triangles_in_rect`] / [`triangles_in_contour`] - Faces under a region
//! - [`ContourIndex`] - First contour crossed by a planar segment
//!
//! [`Collider`] bundles a [`TriangleSource`] with its grid and exposes every
//! query as a method. Triangles come from anything implementing
//! [`TriangleSource`]: an indexed [`CollisionMesh`], a `Vec<Triangle>`, or a
//! caller's own storage.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use cf_grid::GridParams;
//! use mesh_collide::{Collider, CollisionMesh};
//! use nalgebra::{Point2, Point3};
//!
//! // 3x3 terrain patch, 1 m spacing, a bump in the middle
//! let heights = [0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0];
//! let terrain = CollisionMesh::from_heightfield(Point2::origin(), 1.0, 3, 3, &heights).unwrap();
//! let collider = Collider::build(terrain, &GridParams::default()).unwrap();
//!
//! assert_eq!(collider.height_at(&Point2::new(1.0, 1.0)), Some(2.0));
//!
//! let hit = collider.closest_point(&Point3::new(0.25, 0.25, 5.0), 10.0).unwrap();
//! assert!(hit.distance < 5.0);
//! ```
//!
//! # Thread Safety
//!
//! A [`Collider`] is immutable after construction. Queries that need
//! visited-flags borrow a [`QueryScratch`]; keep one per thread and pass it to
//! the `*_with` methods to avoid reallocating per query.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod closest;
mod collider;
mod error;
mod gather;
mod geometry;
mod inside;
mod mesh;
mod params;
mod region;
mod result;
mod scratch;
mod source;
pub mod triangulate;
mod vertical;

// Re-export core types
pub use closest::closest_point;
pub use collider::Collider;
pub use error::{CollideError, CollideResult};
pub use gather::{triangles_in_contour, triangles_in_rect};
pub use geometry::{
    BARYCENTRIC_TOLERANCE, RAY_EPSILON, RayHit, Triangle, closest_point_on_triangle,
    point_segment_distance_2d, ray_triangle_intersect, segment_intersect_2d, vertical_intersect,
};
pub use inside::point_inside;
pub use mesh::CollisionMesh;
pub use params::QueryParams;
pub use region::{Contour, ContourEdge, ContourIndex};
pub use result::{ClosestPointResult, InsideResult, PointInsideParams, VertIntersectionResult};
pub use scratch::QueryScratch;
pub use source::TriangleSource;
pub use vertical::{shoot_vertical, shoot_vertical_filtered};

// Re-export grid types used in signatures
pub use cf_grid::{Grid2L, GridParams, Rect, ZRange};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};
