//! Parallel query phase over a frozen index.
//!
//! Frames follow a write-then-read pattern: rebuild the index, then query it
//! once per boid. The queries only need `&I`, so once the rebuild is done they
//! can fan out across the rayon pool; mutation needs `&mut I` and therefore
//! cannot overlap with them.

use rayon::prelude::*;

use crate::{Entity, EntityId, Point, SpatialIndex, SpatialResult, index::validate_query};

/// Run every `(position, radius)` query in parallel.
///
/// Results are returned in query order. All queries are validated up front;
/// the first invalid one fails the whole batch and nothing is computed.
pub fn par_find_nearby<K, I>(
    index: &I,
    queries: &[(Point, f32)],
) -> SpatialResult<Vec<Vec<Entity<K>>>>
where
    K: EntityId + Send + Sync,
    I: SpatialIndex<K> + Sync + ?Sized,
{
    for &(position, radius) in queries {
        validate_query(position, radius)?;
    }

    queries
        .par_iter()
        .map(|&(position, radius)| index.find_nearby(position, radius))
        .collect()
}

/// Neighbours of each entity within `radius`, excluding the entity itself.
///
/// This is the per-boid neighbourhood a flocking step feeds into its
/// separation, alignment and cohesion rules. Results are in `entities` order.
pub fn par_neighbourhoods<K, I>(
    index: &I,
    entities: &[Entity<K>],
    radius: f32,
) -> SpatialResult<Vec<Vec<Entity<K>>>>
where
    K: EntityId + Send + Sync,
    I: SpatialIndex<K> + Sync + ?Sized,
{
    for entity in entities {
        validate_query(entity.position, radius)?;
    }

    entities
        .par_iter()
        .map(|entity| {
            let mut neighbours = Vec::new();
            index.for_each_nearby(entity.position, radius, &mut |other: Entity<K>| {
                if other.id != entity.id {
                    neighbours.push(other);
                }
            })?;
            Ok(neighbours)
        })
        .collect()
}
