//! Spatial index error types.

use thiserror::Error;

/// Spatial index error type.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SpatialError {
    /// A position component is NaN or infinite.
    #[error("invalid position: ({x}, {y}) is not finite")]
    InvalidPosition {
        /// X component as supplied.
        x: f32,
        /// Y component as supplied.
        y: f32,
    },

    /// Query radius is negative or NaN.
    #[error("invalid radius: {0}")]
    InvalidRadius(f32),

    /// Cell size (or quadtree extent) is not a positive finite number.
    #[error("invalid cell size: {0}")]
    InvalidCellSize(f32),

    /// Quadtree leaves must hold at least one entry.
    #[error("invalid leaf capacity: {0}")]
    InvalidLeafCapacity(usize),

    /// Quadtree depth limit is above [`MAX_QUADTREE_DEPTH`](crate::MAX_QUADTREE_DEPTH).
    #[error("invalid max depth: {0} (limit is {limit})", limit = crate::MAX_QUADTREE_DEPTH)]
    InvalidMaxDepth(u32),
}

/// Result type for spatial index operations.
pub type SpatialResult<T> = Result<T, SpatialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SpatialError::InvalidPosition { x: f32::NAN, y: 0.0 };
        assert_eq!(err.to_string(), "invalid position: (NaN, 0) is not finite");

        let err = SpatialError::InvalidRadius(-1.0);
        assert_eq!(err.to_string(), "invalid radius: -1");

        let err = SpatialError::InvalidMaxDepth(40);
        assert_eq!(err.to_string(), "invalid max depth: 40 (limit is 32)");
    }
}
