//! Uniform grid spatial index.
//!
//! Space is cut into square cells of a fixed size. Buckets are created the
//! first time an entity lands in a cell and survive [`clear`], so a grid that
//! is rebuilt every frame stops allocating once the flock has settled.
//!
//! # Layout
//!
//! ```text
//!   cells: CellKey ──► bucket index
//!
//!   buckets: [ key | head | len ] [ key | head | len ] ...
//!                     │
//!                     ▼
//!   slots:   [ entity | bucket | prev | next ] ...   (one contiguous arena)
//!
//!   ids:     EntityId ──► slot index
//! ```
//!
//! Each bucket is an intrusive doubly linked list threaded through the slot
//! arena, so there is no per-cell heap container and moving or removing an
//! entity is O(1).
//!
//! [`clear`]: SpatialIndex::clear

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::{
    CellKey, CellRange, Entity, EntityId, GridConfig, GridStats, Point, SpatialIndex,
    SpatialResult, UpdateReport,
    index::{insert_all, validate_query},
};

/// Sentinel for "no slot".
const NIL: u32 = u32::MAX;

/// A cell's linked list of slots.
#[derive(Clone, Copy, Debug)]
struct Bucket {
    key: CellKey,
    head: u32,
    len: u32,
}

/// An arena slot. Vacant slots have `bucket == NIL` and sit on the free list.
#[derive(Clone, Copy, Debug)]
struct Slot<K> {
    entity: Entity<K>,
    bucket: u32,
    prev: u32,
    next: u32,
}

/// A 2D uniform grid over entities identified by `K`.
pub struct UniformGrid<K> {
    config: GridConfig,
    /// Cell key -> bucket index.
    cells: HashMap<CellKey, u32, FxBuildHasher>,
    /// Bucket storage, indexed by the values of `cells`.
    buckets: Vec<Bucket>,
    /// Entity arena shared by all buckets.
    slots: Vec<Slot<K>>,
    /// Vacant slots available for reuse.
    free: Vec<u32>,
    /// Entity id -> slot index.
    ids: HashMap<K, u32, FxBuildHasher>,
}

impl<K: EntityId> Default for UniformGrid<K> {
    fn default() -> Self {
        Self::from_valid_config(GridConfig::default())
    }
}

impl<K: EntityId> UniformGrid<K> {
    /// Create a grid with the given cell size.
    pub fn new(cell_size: f32) -> SpatialResult<Self> {
        Self::with_config(GridConfig::new(cell_size))
    }

    /// Create a grid from a full configuration.
    pub fn with_config(config: GridConfig) -> SpatialResult<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: GridConfig) -> Self {
        Self {
            config,
            cells: HashMap::default(),
            buckets: Vec::new(),
            slots: Vec::new(),
            free: Vec::new(),
            ids: HashMap::default(),
        }
    }

    /// Cell size in world units.
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.config.cell_size
    }

    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Cell key for a world position.
    #[must_use]
    pub fn cell_of(&self, position: Point) -> CellKey {
        CellKey::containing(position, self.config.cell_size)
    }

    /// Entities currently stored in the cell `key`.
    pub fn cell(&self, key: CellKey) -> impl Iterator<Item = Entity<K>> + '_ {
        let head = self
            .cells
            .get(&key)
            .map_or(NIL, |&bucket| self.buckets[bucket as usize].head);
        self.chain(head)
    }

    /// Keys of every cell holding at least one entity.
    pub fn occupied_cells(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.buckets.iter().filter(|b| b.len > 0).map(|b| b.key)
    }

    /// Position an entity was last indexed at.
    #[must_use]
    pub fn position_of(&self, id: K) -> Option<Point> {
        self.ids
            .get(&id)
            .map(|&slot| self.slots[slot as usize].entity.position)
    }

    /// Occupancy snapshot.
    #[must_use]
    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats {
            entities: self.ids.len(),
            allocated_cells: self.buckets.len(),
            ..GridStats::default()
        };
        for bucket in self.buckets.iter().filter(|b| b.len > 0) {
            stats.occupied_cells += 1;
            stats.max_occupancy = stats.max_occupancy.max(bucket.len as usize);
        }
        stats
    }

    /// Walk a bucket's list starting at `head`.
    fn chain(&self, head: u32) -> impl Iterator<Item = Entity<K>> + '_ {
        let mut cursor = head;
        std::iter::from_fn(move || {
            if cursor == NIL {
                return None;
            }
            let slot = &self.slots[cursor as usize];
            cursor = slot.next;
            Some(slot.entity)
        })
    }

    /// Bucket index for `key`, allocating the bucket on first use.
    fn bucket_for(&mut self, key: CellKey) -> u32 {
        let buckets = &mut self.buckets;
        *self.cells.entry(key).or_insert_with(|| {
            let index = buckets.len() as u32;
            buckets.push(Bucket { key, head: NIL, len: 0 });
            index
        })
    }

    /// Push `slot` onto the front of `bucket`'s list.
    fn link(&mut self, slot: u32, bucket: u32) {
        let head = self.buckets[bucket as usize].head;
        if head != NIL {
            self.slots[head as usize].prev = slot;
        }

        let s = &mut self.slots[slot as usize];
        s.bucket = bucket;
        s.prev = NIL;
        s.next = head;

        let b = &mut self.buckets[bucket as usize];
        b.head = slot;
        b.len += 1;
    }

    /// Detach `slot` from its bucket's list.
    fn unlink(&mut self, slot: u32) {
        let Slot {
            bucket, prev, next, ..
        } = self.slots[slot as usize];

        if prev == NIL {
            self.buckets[bucket as usize].head = next;
        } else {
            self.slots[prev as usize].next = next;
        }
        if next != NIL {
            self.slots[next as usize].prev = prev;
        }
        self.buckets[bucket as usize].len -= 1;

        let s = &mut self.slots[slot as usize];
        s.bucket = NIL;
        s.prev = NIL;
        s.next = NIL;
    }

    /// Take a vacant slot (or grow the arena) for `entity`.
    fn allocate(&mut self, entity: Entity<K>) -> u32 {
        let slot = Slot {
            entity,
            bucket: NIL,
            prev: NIL,
            next: NIL,
        };
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = slot;
            index
        } else {
            debug_assert!(self.slots.len() < NIL as usize, "slot arena exhausted");
            self.slots.push(slot);
            (self.slots.len() - 1) as u32
        }
    }

    /// Visit candidates of every populated bucket in `range`.
    fn visit_range(&self, range: CellRange, mut visit_bucket: impl FnMut(&Bucket)) {
        // A huge range would spend most of its time probing empty keys;
        // walking the allocated buckets is cheaper then.
        if range.cell_count() > self.buckets.len() as u64 {
            for bucket in &self.buckets {
                if bucket.len > 0 && range.contains(bucket.key) {
                    visit_bucket(bucket);
                }
            }
        } else {
            for key in range.iter() {
                if let Some(&index) = self.cells.get(&key) {
                    visit_bucket(&self.buckets[index as usize]);
                }
            }
        }
    }
}

impl<K: EntityId> SpatialIndex<K> for UniformGrid<K> {
    fn insert(&mut self, id: K, position: Point) -> SpatialResult<()> {
        let position = position.validate()?;
        let key = self.cell_of(position);

        if let Some(&slot) = self.ids.get(&id) {
            let current = self.slots[slot as usize].bucket;
            if self.buckets[current as usize].key != key {
                self.unlink(slot);
                let bucket = self.bucket_for(key);
                self.link(slot, bucket);
            }
            self.slots[slot as usize].entity.position = position;
            return Ok(());
        }

        let slot = self.allocate(Entity::new(id, position));
        let bucket = self.bucket_for(key);
        self.link(slot, bucket);
        self.ids.insert(id, slot);
        Ok(())
    }

    fn remove(&mut self, id: K) -> bool {
        let Some(slot) = self.ids.remove(&id) else {
            return false;
        };
        self.unlink(slot);
        self.free.push(slot);
        true
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.ids.clear();

        if self.buckets.len() > self.config.retained_cells {
            tracing::debug!(
                "Releasing {} buckets (retain limit {})",
                self.buckets.len(),
                self.config.retained_cells
            );
            self.cells = HashMap::default();
            self.buckets = Vec::new();
        } else {
            for bucket in &mut self.buckets {
                bucket.head = NIL;
                bucket.len = 0;
            }
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn for_each_nearby(
        &self,
        position: Point,
        radius: f32,
        visit: &mut dyn FnMut(Entity<K>),
    ) -> SpatialResult<()> {
        let radius_sq = validate_query(position, radius)?;
        let range = CellRange::around(position, radius, self.config.cell_size);

        self.visit_range(range, |bucket| {
            for entity in self.chain(bucket.head) {
                if entity.position.distance_squared(position) <= radius_sq {
                    visit(entity);
                }
            }
        });
        Ok(())
    }

    fn update(&mut self, entities: &[Entity<K>]) -> UpdateReport {
        self.clear();
        self.slots.reserve(entities.len());
        self.ids.reserve(entities.len());
        let report = insert_all(self, entities);

        tracing::debug!(
            "Rebuilt grid: {} accepted, {} rejected, {} entities in {} cells",
            report.accepted,
            report.rejected.len(),
            self.ids.len(),
            self.occupied_cells().count()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpatialError;

    fn ids(mut found: Vec<Entity<char>>) -> Vec<char> {
        found.sort_by_key(|e| e.id);
        found.into_iter().map(|e| e.id).collect()
    }

    fn scenario() -> UniformGrid<char> {
        let mut grid = UniformGrid::new(10.0).unwrap();
        let report = grid.update(&[
            Entity::new('A', Point::new(0.0, 0.0)),
            Entity::new('B', Point::new(9.0, 0.0)),
            Entity::new('C', Point::new(11.0, 0.0)),
            Entity::new('D', Point::new(50.0, 50.0)),
        ]);
        assert!(report.is_complete());
        grid
    }

    #[test]
    fn test_scenario_query() {
        let grid = scenario();
        let found = grid.find_nearby(Point::new(0.0, 0.0), 10.0).unwrap();
        assert_eq!(ids(found), vec!['A', 'B']);
    }

    #[test]
    fn test_clear_empties_queries() {
        let mut grid = scenario();
        grid.clear();
        assert!(grid.is_empty());
        assert!(grid.find_nearby(Point::new(0.0, 0.0), 1.0).unwrap().is_empty());
        assert!(grid.find_nearby(Point::new(50.0, 50.0), 1000.0).unwrap().is_empty());
    }

    #[test]
    fn test_clear_retains_buckets() {
        let mut grid = scenario();
        let allocated = grid.stats().allocated_cells;
        assert_eq!(allocated, 3);

        grid.clear();
        let stats = grid.stats();
        assert_eq!(stats.allocated_cells, allocated);
        assert_eq!(stats.occupied_cells, 0);
        assert_eq!(stats.entities, 0);
    }

    #[test]
    fn test_clear_releases_buckets_over_limit() {
        let mut grid = UniformGrid::with_config(GridConfig {
            cell_size: 1.0,
            retained_cells: 4,
        })
        .unwrap();
        for i in 0..10u32 {
            grid.insert(i, Point::new(i as f32 * 5.0, 0.0)).unwrap();
        }
        assert_eq!(grid.stats().allocated_cells, 10);

        grid.clear();
        assert_eq!(grid.stats().allocated_cells, 0);

        // Still usable afterwards
        grid.insert(1, Point::new(0.5, 0.5)).unwrap();
        assert_eq!(grid.find_nearby(Point::ZERO, 1.0).unwrap().len(), 1);
    }

    #[test]
    fn test_reinsert_moves_entity() {
        let mut grid = UniformGrid::new(10.0).unwrap();
        grid.insert('A', Point::new(0.0, 0.0)).unwrap();
        grid.insert('A', Point::new(95.0, 95.0)).unwrap();

        assert_eq!(grid.len(), 1);
        assert!(grid.find_nearby(Point::ZERO, 5.0).unwrap().is_empty());
        let found = grid.find_nearby(Point::new(95.0, 95.0), 0.0).unwrap();
        assert_eq!(found, vec![Entity::new('A', Point::new(95.0, 95.0))]);
        assert_eq!(grid.cell(CellKey::new(0, 0)).count(), 0);
        assert_eq!(grid.cell(CellKey::new(9, 9)).count(), 1);
    }

    #[test]
    fn test_reinsert_within_cell_updates_position() {
        let mut grid = UniformGrid::new(10.0).unwrap();
        grid.insert(7u32, Point::new(1.0, 1.0)).unwrap();
        grid.insert(7u32, Point::new(2.0, 2.0)).unwrap();

        assert_eq!(grid.position_of(7), Some(Point::new(2.0, 2.0)));
        assert_eq!(grid.stats().max_occupancy, 1);
    }

    #[test]
    fn test_remove_middle_of_bucket() {
        let mut grid = UniformGrid::new(100.0).unwrap();
        for i in 0..5u32 {
            grid.insert(i, Point::new(i as f32, 0.0)).unwrap();
        }

        assert!(grid.remove(2));
        assert!(!grid.remove(2));
        assert_eq!(grid.len(), 4);

        let mut found: Vec<u32> = grid.cell(CellKey::new(0, 0)).map(|e| e.id).collect();
        found.sort_unstable();
        assert_eq!(found, vec![0, 1, 3, 4]);

        // Freed slot is reused
        grid.insert(9, Point::new(3.0, 3.0)).unwrap();
        assert_eq!(grid.slots.len(), 5);
    }

    #[test]
    fn test_invalid_insert_leaves_grid_untouched() {
        let mut grid = scenario();
        let before = grid.stats();

        // NaN never compares equal, so match on the variant.
        assert!(matches!(
            grid.insert('X', Point::new(f32::NAN, 0.0)),
            Err(SpatialError::InvalidPosition { .. })
        ));
        assert_eq!(grid.stats(), before);
        assert!(grid.position_of('X').is_none());
    }

    #[test]
    fn test_negative_radius_rejected() {
        let grid = scenario();
        assert_eq!(
            grid.find_nearby(Point::ZERO, -1.0),
            Err(SpatialError::InvalidRadius(-1.0))
        );
    }

    #[test]
    fn test_huge_radius_walks_buckets() {
        let grid = scenario();
        let found = grid.find_nearby(Point::ZERO, f32::INFINITY).unwrap();
        assert_eq!(ids(found), vec!['A', 'B', 'C', 'D']);

        let found = grid.find_nearby(Point::new(0.0, 0.0), 1.0e30).unwrap();
        assert_eq!(ids(found), vec!['A', 'B', 'C', 'D']);
    }

    #[test]
    fn test_find_nearby_into_reuses_buffer() {
        let grid = scenario();
        let mut buffer = vec![Entity::new('Z', Point::ZERO)];

        grid.find_nearby_into(Point::new(50.0, 50.0), 1.0, &mut buffer)
            .unwrap();
        assert_eq!(ids(buffer.clone()), vec!['D']);

        assert!(grid.find_nearby_into(Point::ZERO, f32::NAN, &mut buffer).is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_update_reports_like_default_rebuild() {
        let frame = [
            Entity::new('A', Point::new(0.0, 0.0)),
            Entity::new('B', Point::new(f32::NAN, 0.0)),
            Entity::new('A', Point::new(3.0, 0.0)),
            Entity::new('C', Point::new(0.0, f32::NEG_INFINITY)),
        ];

        let mut grid = UniformGrid::new(10.0).unwrap();
        let mut linear = crate::LinearScan::new();
        let report = grid.update(&frame);
        let expected = linear.update(&frame);

        // NaN payloads never compare equal, so compare the shape of each rejection
        let rejected = |r: &UpdateReport| -> Vec<(usize, String)> {
            r.rejected.iter().map(|(at, err)| (*at, err.to_string())).collect()
        };
        assert_eq!(report.accepted, expected.accepted);
        assert_eq!(rejected(&report), rejected(&expected));

        assert_eq!(report.accepted, 2);
        let at: Vec<usize> = report.rejected.iter().map(|&(at, _)| at).collect();
        assert_eq!(at, vec![1, 3]);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.position_of('A'), Some(Point::new(3.0, 0.0)));
    }
}
