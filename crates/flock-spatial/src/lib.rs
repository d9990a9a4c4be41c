//! Flock spatial indexing
//!
//! Answers "which boids are near this point" for a per-frame flocking step.
//! The simulation rebuilds an index from its current boids, then asks each
//! boid's neighbourhood once; the behaviour rules (separation, alignment,
//! cohesion) run outside this crate on the returned neighbours.
//!
//! # Frame model
//!
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Phase 1: index.update(&boids)         (&mut, one writer)   │
//! │  Phase 2: find_nearby per boid         (&, sequential or    │
//! │           par_neighbourhoods on the rayon pool)             │
//! │  Phase 3: behaviour rules move boids   (outside this crate) │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Strategies
//!
//! - [`UniformGrid`]: square cells sized to the query radius. The default.
//! - [`QuadTree`]: adaptive subdivision for heavily clustered flocks.
//! - [`LinearScan`]: checks everything; fine for tiny flocks.
//!
//! All three implement [`SpatialIndex`], so the caller can swap them without
//! touching the behaviour code.
//!
//! # Usage
//!
//! ```
//! use flock_spatial::{Entity, Point, SpatialIndex, UniformGrid};
//!
//! let mut grid = UniformGrid::new(10.0)?;
//! grid.update(&[
//!     Entity::new("a", Point::new(0.0, 0.0)),
//!     Entity::new("b", Point::new(9.0, 0.0)),
//!     Entity::new("c", Point::new(11.0, 0.0)),
//! ]);
//!
//! let mut near: Vec<_> = grid
//!     .find_nearby(Point::new(0.0, 0.0), 10.0)?
//!     .into_iter()
//!     .map(|e| e.id)
//!     .collect();
//! near.sort_unstable();
//! assert_eq!(near, ["a", "b"]);
//! # Ok::<(), flock_spatial::SpatialError>(())
//! ```

mod cell;
mod config;
mod entity;
mod error;
mod grid;
mod index;
mod linear;
mod parallel;
mod point;
mod quadtree;
mod stats;

pub use cell::{CellKey, CellRange};
pub use config::{
    DEFAULT_CELL_SIZE, DEFAULT_RETAINED_CELLS, GridConfig, MAX_QUADTREE_DEPTH, QuadTreeConfig,
};
pub use entity::{Entity, EntityId, UpdateReport};
pub use error::{SpatialError, SpatialResult};
pub use grid::UniformGrid;
pub use index::SpatialIndex;
pub use linear::LinearScan;
pub use parallel::{par_find_nearby, par_neighbourhoods};
pub use point::{Aabb, Point};
pub use quadtree::QuadTree;
pub use stats::GridStats;
