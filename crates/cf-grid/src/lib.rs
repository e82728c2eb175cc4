//! Two-level spatial grid and cell traversals for CortenForge.
//!
//! This crate indexes the horizontal footprint of large triangulated surfaces
//! and walks the index under different query shapes:
//!
//! - [`Grid2L`] - Adaptive two-level grid: big cells own locally sized arrays
//!   of small cells holding triangle indices and a cached Z range
//! - [`build_grid`] and [`GridParams`] - Bulk construction from a triangle set
//! - [`traverse`] - Point, rectangle, segment and full-grid traversals
//! - [`circle`] - Expanding-circle search in order of increasing distance
//! - [`Grid1L`] - Uniform single-level grid with a generic payload
//! - [`GridWalk`] - 2D DDA cell walk along a segment
//! - [`EpochMarks`] - Visited flags that reset in O(1)
//! - [`DuplicatePointsEliminator`] - Epsilon merging of 2D/3D points
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in
//! CLI tools, servers, WASM builds and other engines.
//!
//! # Coordinate Systems
//!
//! Right-handed, Z up:
//! - X, Y: the indexed horizontal plane
//! - Z: height, only tracked as per-cell [`ZRange`]s
//!
//! # Visitors
//!
//! Every traversal drives a [`CellVisitor`] and stops as soon as it returns
//! `true`. Closures work directly:
//!
//! ```
//! use cf_grid::{GridParams, SmallCell, VisitState, build_grid, traverse};
//! use nalgebra::{Point2, Point3};
//!
//! let triangles = [
//!     [Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0), Point3::new(0.0, 4.0, 0.0)],
//!     [Point3::new(4.0, 0.0, 1.0), Point3::new(4.0, 4.0, 1.0), Point3::new(0.0, 4.0, 1.0)],
//! ];
//! let grid = build_grid(&triangles, &GridParams::default()).unwrap();
//!
//! let mut hits = Vec::new();
//! traverse::visit_segment(
//!     &grid,
//!     &Point2::new(0.5, 0.5),
//!     &Point2::new(3.5, 3.5),
//!     &mut |_: &VisitState, cell: &SmallCell| {
//!         hits.extend_from_slice(cell.faces());
//!         false
//!     },
//! );
//! assert!(hits.contains(&0) && hits.contains(&1));
//! ```
//!
//! # Thread Safety
//!
//! Grids are immutable after construction and can be shared freely. All
//! per-query state ([`EpochMarks`]) is owned by the caller.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod build;
mod cell;
pub mod circle;
mod dedup;
mod epoch;
mod error;
mod grid;
mod grid1l;
mod rect;
pub mod traverse;
mod visit;
mod walk;

// Re-export core types
pub use build::{GridParams, build_grid};
pub use cell::{CellId, Extents, ZRange};
pub use circle::visit_circle;
pub use dedup::{DuplicatePointsEliminator, LexKey, LexPoint};
pub use epoch::EpochMarks;
pub use error::{GridError, GridResult};
pub use grid::{BigCell, CellRange, FaceList, Grid2L, SmallCell};
pub use grid1l::Grid1L;
pub use rect::Rect;
pub use traverse::{visit_all, visit_point, visit_rect, visit_segment};
pub use visit::{CellVisitor, VisitParam, VisitState};
pub use walk::{GridWalk, WalkStep};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};
