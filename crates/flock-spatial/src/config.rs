//! Index configuration.
//!
//! Both configs derive serde traits with `#[serde(default)]`, so a host can
//! embed them in its own settings file and omit any field.

use serde::{Deserialize, Serialize};

use crate::{Aabb, SpatialError, SpatialResult};

/// Default cell size in world units. Matches a typical boid perception radius.
pub const DEFAULT_CELL_SIZE: f32 = 50.0;

/// Default cap on empty buckets kept alive across [`clear`](crate::SpatialIndex::clear).
pub const DEFAULT_RETAINED_CELLS: usize = 16_384;

/// Deepest level a quadtree may split to. Past this an `f32` box around a
/// world-scale point no longer halves into distinct quadrants.
pub const MAX_QUADTREE_DEPTH: u32 = 32;

/// Configuration for [`UniformGrid`](crate::UniformGrid).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Side length of a cell in world units. Fixed for the grid's lifetime.
    pub cell_size: f32,
    /// Maximum number of allocated buckets kept when the grid is cleared.
    /// Above this the bucket table is released so a drifting flock cannot
    /// grow memory without bound.
    pub retained_cells: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            retained_cells: DEFAULT_RETAINED_CELLS,
        }
    }
}

impl GridConfig {
    /// Config with the given cell size and default limits.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            ..Self::default()
        }
    }

    /// Cell size derived from the largest radius that will be queried.
    ///
    /// `factor` of 1.0 visits at most a 3x3 block per query; larger factors
    /// visit fewer cells with more candidates each.
    #[must_use]
    pub fn for_radius(max_radius: f32, factor: f32) -> Self {
        Self::new(max_radius * factor)
    }

    pub fn validate(&self) -> SpatialResult<()> {
        if self.cell_size.is_finite() && self.cell_size > 0.0 {
            Ok(())
        } else {
            Err(SpatialError::InvalidCellSize(self.cell_size))
        }
    }
}

/// Configuration for [`QuadTree`](crate::QuadTree).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadTreeConfig {
    /// Initial root bounds. When absent the root is centred on the first
    /// inserted point.
    pub bounds: Option<Aabb>,
    /// Half side of the root created around the first point.
    pub initial_extent: f32,
    /// Entries a leaf holds before it splits. At least 1.
    pub leaf_capacity: usize,
    /// Depth below which leaves never split. At most [`MAX_QUADTREE_DEPTH`].
    pub max_depth: u32,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            bounds: None,
            initial_extent: 1024.0,
            leaf_capacity: 8,
            max_depth: 16,
        }
    }
}

impl QuadTreeConfig {
    pub fn validate(&self) -> SpatialResult<()> {
        if !(self.initial_extent.is_finite() && self.initial_extent > 0.0) {
            return Err(SpatialError::InvalidCellSize(self.initial_extent));
        }
        if self.leaf_capacity == 0 {
            return Err(SpatialError::InvalidLeafCapacity(0));
        }
        if self.max_depth > MAX_QUADTREE_DEPTH {
            return Err(SpatialError::InvalidMaxDepth(self.max_depth));
        }
        if let Some(bounds) = self.bounds {
            let width = bounds.width();
            let height = bounds.max.y - bounds.min.y;
            if !(bounds.min.is_finite() && bounds.max.is_finite() && width > 0.0 && height > 0.0)
            {
                return Err(SpatialError::InvalidCellSize(width.min(height)));
            }
        }
        Ok(())
    }
}
