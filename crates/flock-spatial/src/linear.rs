//! Brute-force index: every query checks every entity.
//!
//! Beats the partitioned indexes for a few dozen boids and serves as the
//! reference the other strategies are tested against.

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::{Entity, EntityId, Point, SpatialIndex, SpatialResult, index::validate_query};

/// Flat list of entities with an identity map for moves and removals.
pub struct LinearScan<K> {
    entities: Vec<Entity<K>>,
    /// Entity id -> position in `entities`.
    ids: HashMap<K, usize, FxBuildHasher>,
}

impl<K: EntityId> Default for LinearScan<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EntityId> LinearScan<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            ids: HashMap::default(),
        }
    }

    /// Every tracked entity in storage order.
    #[must_use]
    pub fn entities(&self) -> &[Entity<K>] {
        &self.entities
    }
}

impl<K: EntityId> SpatialIndex<K> for LinearScan<K> {
    fn insert(&mut self, id: K, position: Point) -> SpatialResult<()> {
        let position = position.validate()?;
        if let Some(&index) = self.ids.get(&id) {
            self.entities[index].position = position;
        } else {
            self.ids.insert(id, self.entities.len());
            self.entities.push(Entity::new(id, position));
        }
        Ok(())
    }

    fn remove(&mut self, id: K) -> bool {
        let Some(index) = self.ids.remove(&id) else {
            return false;
        };
        self.entities.swap_remove(index);
        if let Some(moved) = self.entities.get(index) {
            self.ids.insert(moved.id, index);
        }
        true
    }

    fn clear(&mut self) {
        self.entities.clear();
        self.ids.clear();
    }

    fn len(&self) -> usize {
        self.entities.len()
    }

    fn for_each_nearby(
        &self,
        position: Point,
        radius: f32,
        visit: &mut dyn FnMut(Entity<K>),
    ) -> SpatialResult<()> {
        let radius_sq = validate_query(position, radius)?;
        for entity in &self.entities {
            if entity.position.distance_squared(position) <= radius_sq {
                visit(*entity);
            }
        }
        Ok(())
    }
}
