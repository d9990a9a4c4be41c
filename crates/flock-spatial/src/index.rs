//! The spatial index capability shared by every partitioning strategy.

use crate::{Entity, EntityId, Point, SpatialError, SpatialResult, UpdateReport};

/// A spatial partition over a dynamic set of 2D-positioned entities.
///
/// Identity is unique inside an index: inserting an id that is already
/// tracked moves it, so query results never hold the same id twice.
///
/// The trait is object safe, so a simulation can hold a
/// `Box<dyn SpatialIndex<K>>` and pick the strategy at runtime.
pub trait SpatialIndex<K: EntityId> {
    /// Index `id` at `position`, moving it if already tracked.
    ///
    /// A non-finite position fails with [`SpatialError::InvalidPosition`]
    /// and leaves the index untouched.
    fn insert(&mut self, id: K, position: Point) -> SpatialResult<()>;

    /// Stop tracking `id`. Returns whether it was tracked.
    fn remove(&mut self, id: K) -> bool;

    /// Drop every entity, keeping allocated storage for reuse.
    fn clear(&mut self);

    /// Number of tracked entities.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call `visit` for every entity within `radius` of `position`
    /// (inclusive), in no particular order.
    ///
    /// Arguments are validated before anything is visited.
    fn for_each_nearby(
        &self,
        position: Point,
        radius: f32,
        visit: &mut dyn FnMut(Entity<K>),
    ) -> SpatialResult<()>;

    /// Replace the whole indexed set with `entities`.
    ///
    /// Equivalent to [`clear`](Self::clear) followed by
    /// [`insert`](Self::insert) of each entity in order. Invalid entities are
    /// skipped and reported; the rest are indexed.
    fn update(&mut self, entities: &[Entity<K>]) -> UpdateReport {
        self.clear();
        let report = insert_all(self, entities);

        tracing::debug!(
            "Rebuilt spatial index: {} accepted, {} rejected",
            report.accepted,
            report.rejected.len()
        );
        report
    }

    /// Collect the neighbourhood of `position` into `out`.
    ///
    /// `out` is cleared first, which lets a frame loop reuse one buffer for
    /// every query. On error `out` is left empty.
    fn find_nearby_into(
        &self,
        position: Point,
        radius: f32,
        out: &mut Vec<Entity<K>>,
    ) -> SpatialResult<()> {
        out.clear();
        self.for_each_nearby(position, radius, &mut |entity: Entity<K>| {
            out.push(entity);
        })
    }

    /// All entities within `radius` of `position` (inclusive), unordered.
    fn find_nearby(&self, position: Point, radius: f32) -> SpatialResult<Vec<Entity<K>>> {
        let mut out = Vec::new();
        self.find_nearby_into(position, radius, &mut out)?;
        Ok(out)
    }
}

/// Insert `entities` in order, recording which ones were rejected.
pub(crate) fn insert_all<K, I>(index: &mut I, entities: &[Entity<K>]) -> UpdateReport
where
    K: EntityId,
    I: SpatialIndex<K> + ?Sized,
{
    let mut report = UpdateReport::default();
    for (at, entity) in entities.iter().enumerate() {
        report.record(at, index.insert(entity.id, entity.position));
    }
    report
}

/// Validate query arguments. Radius is checked first.
pub(crate) fn validate_query(position: Point, radius: f32) -> SpatialResult<f64> {
    if radius.is_nan() || radius < 0.0 {
        return Err(SpatialError::InvalidRadius(radius));
    }
    position.validate()?;
    let r = f64::from(radius);
    Ok(r * r)
}
