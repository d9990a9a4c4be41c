//! Occupancy statistics for tuning the cell size.

/// Snapshot of how entities are spread over a grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridStats {
    /// Tracked entities.
    pub entities: usize,
    /// Buckets holding at least one entity.
    pub occupied_cells: usize,
    /// Buckets allocated, including empty ones kept for reuse.
    pub allocated_cells: usize,
    /// Entities in the fullest bucket.
    pub max_occupancy: usize,
}

impl GridStats {
    /// Average entities per occupied cell.
    #[must_use]
    pub fn mean_occupancy(&self) -> f32 {
        if self.occupied_cells == 0 {
            0.0
        } else {
            self.entities as f32 / self.occupied_cells as f32
        }
    }
}
