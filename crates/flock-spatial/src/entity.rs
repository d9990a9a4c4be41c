//! Entity references stored by an index.

use std::{fmt::Debug, hash::Hash};

use crate::{Point, SpatialError};

/// Identity handle for an indexed entity.
///
/// Blanket-implemented for anything cheap to copy, hash and compare, so a
/// caller can use raw indices, generational handles or static names.
pub trait EntityId: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> EntityId for T {}

/// An entity identity paired with the position it was indexed at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entity<K> {
    pub id: K,
    pub position: Point,
}

impl<K> Entity<K> {
    /// Create a new entity reference.
    #[must_use]
    pub const fn new(id: K, position: Point) -> Self {
        Self { id, position }
    }
}

impl<K> From<(K, Point)> for Entity<K> {
    fn from((id, position): (K, Point)) -> Self {
        Self::new(id, position)
    }
}

/// Outcome of a bulk rebuild.
///
/// Rejections do not abort the rebuild; every valid entity is indexed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateReport {
    /// Number of accepted entities. A repeated identity counts once per
    /// occurrence even though only its last position is kept.
    pub accepted: usize,
    /// Slice index and cause of every rejected entity.
    pub rejected: Vec<(usize, SpatialError)>,
}

impl UpdateReport {
    /// True when no entity was rejected.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Record the result of inserting the entity at `index`.
    pub(crate) fn record(&mut self, index: usize, result: Result<(), SpatialError>) {
        match result {
            Ok(()) => self.accepted += 1,
            Err(err) => {
                tracing::trace!("Rejected entity #{index}: {err}");
                self.rejected.push((index, err));
            }
        }
    }
}
