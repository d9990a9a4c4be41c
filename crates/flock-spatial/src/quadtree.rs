//! Region quadtree index for strongly clustered flocks.
//!
//! A uniform grid degrades when most boids pile into a handful of cells; the
//! quadtree subdivides only where entities are, so dense clusters split into
//! small leaves while empty space stays one node.
//!
//! Nodes live in one arena. A node is either a leaf holding up to
//! `leaf_capacity` slot indices, or an interior node whose four children are
//! stored consecutively starting at `children`. When removals leave all four
//! children of a node as empty leaves the node collapses back into a leaf and
//! the block of four goes on a free list for the next split. The root grows
//! towards any point inserted outside it, at least doubling on each axis it
//! extends.

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;

use crate::{
    Aabb, Entity, EntityId, Point, QuadTreeConfig, SpatialIndex, SpatialResult,
    index::validate_query,
};

const NIL: u32 = u32::MAX;

#[derive(Debug)]
struct Node {
    bounds: Aabb,
    depth: u32,
    /// `NIL` for the root.
    parent: u32,
    /// First of four consecutive children, or `NIL` for a leaf.
    children: u32,
    items: SmallVec<[u32; 8]>,
}

impl Node {
    fn leaf(bounds: Aabb, depth: u32, parent: u32) -> Self {
        Self {
            bounds,
            depth,
            parent,
            children: NIL,
            items: SmallVec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children == NIL
    }

    /// Whether halving the bounds still yields four distinct, smaller boxes.
    fn divisible(&self) -> bool {
        let Aabb { min, max } = self.bounds;
        let c = self.bounds.center();
        min.x < c.x && c.x < max.x && min.y < c.y && c.y < max.y
    }

    /// Index (0..4) of the quadrant `p` falls in, matching [`Aabb::quadrants`].
    fn quadrant_of(&self, p: Point) -> u32 {
        let c = self.bounds.center();
        u32::from(p.x >= c.x) + 2 * u32::from(p.y >= c.y)
    }
}

#[derive(Clone, Copy, Debug)]
struct Slot<K> {
    entity: Entity<K>,
    /// Leaf holding this slot, `NIL` when vacant.
    node: u32,
}

/// A quadtree over entities identified by `K`.
pub struct QuadTree<K> {
    config: QuadTreeConfig,
    /// Node arena; index 0 is the root once anything has been inserted.
    nodes: Vec<Node>,
    /// First index of each vacant block of four nodes.
    free_blocks: Vec<u32>,
    slots: Vec<Slot<K>>,
    free: Vec<u32>,
    ids: HashMap<K, u32, FxBuildHasher>,
}

impl<K: EntityId> Default for QuadTree<K> {
    fn default() -> Self {
        Self::from_valid_config(QuadTreeConfig::default())
    }
}

impl<K: EntityId> QuadTree<K> {
    /// Create an empty quadtree.
    pub fn with_config(config: QuadTreeConfig) -> SpatialResult<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: QuadTreeConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            free_blocks: Vec::new(),
            slots: Vec::new(),
            free: Vec::new(),
            ids: HashMap::default(),
        }
    }

    /// Current root bounds, if a root exists.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        self.nodes.first().map(|root| root.bounds)
    }

    /// Number of nodes reachable from the root, leaves included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 4 * self.free_blocks.len()
    }

    /// Deepest leaf depth (root is 0).
    #[must_use]
    pub fn depth(&self) -> u32 {
        if self.nodes.is_empty() {
            return 0;
        }

        let mut deepest = 0;
        let mut stack: SmallVec<[u32; 64]> = SmallVec::new();
        stack.push(0);
        while let Some(node) = stack.pop() {
            let n = &self.nodes[node as usize];
            if n.is_leaf() {
                deepest = deepest.max(n.depth);
            } else {
                stack.extend(n.children..n.children + 4);
            }
        }
        deepest
    }

    /// Make sure a root exists and contains `p`.
    fn ensure_root(&mut self, p: Point) {
        if self.nodes.is_empty() {
            let bounds = self
                .config
                .bounds
                .unwrap_or_else(|| clamp_bounds(Aabb::around(p, self.config.initial_extent)));
            self.nodes.push(Node::leaf(bounds, 0, NIL));
        }

        let root = self.nodes[0].bounds;
        if root.contains(p) {
            return;
        }

        let grown = grow_towards(root, p);
        debug_assert!(grown.contains(p));
        tracing::trace!("Growing quadtree root from {root:?} to {grown:?}");
        self.rebuild(grown);
    }

    /// Replace the node tree with a single root and re-seat every entity.
    fn rebuild(&mut self, bounds: Aabb) {
        self.nodes.clear();
        self.free_blocks.clear();
        self.nodes.push(Node::leaf(bounds, 0, NIL));

        let live: Vec<u32> = self.ids.values().copied().collect();
        for slot in live {
            self.place(0, slot);
        }
    }

    /// Descend from `node` to the leaf covering the slot's position and add it.
    fn place(&mut self, mut node: u32, slot: u32) {
        let position = self.slots[slot as usize].entity.position;
        while !self.nodes[node as usize].is_leaf() {
            let n = &self.nodes[node as usize];
            node = n.children + n.quadrant_of(position);
        }

        let capacity = self.config.leaf_capacity;
        let max_depth = self.config.max_depth;
        self.slots[slot as usize].node = node;

        let leaf = &mut self.nodes[node as usize];
        leaf.items.push(slot);
        if leaf.items.len() > capacity && leaf.depth < max_depth && leaf.divisible() {
            self.split(node);
        }
    }

    /// Turn a full leaf into an interior node with four leaf children.
    fn split(&mut self, node: u32) {
        let (bounds, depth) = {
            let n = &self.nodes[node as usize];
            (n.bounds, n.depth)
        };
        let children = bounds.quadrants().map(|q| Node::leaf(q, depth + 1, node));

        let first = if let Some(first) = self.free_blocks.pop() {
            let start = first as usize;
            for (slot, child) in self.nodes[start..start + 4].iter_mut().zip(children) {
                *slot = child;
            }
            first
        } else {
            let first = self.nodes.len() as u32;
            self.nodes.extend(children);
            first
        };

        let n = &mut self.nodes[node as usize];
        n.children = first;
        let items = std::mem::take(&mut n.items);
        for slot in items {
            self.place(node, slot);
        }
    }

    /// Remove `slot` from the leaf holding it, collapsing emptied parents.
    fn detach(&mut self, slot: u32) {
        let node = self.slots[slot as usize].node;
        let items = &mut self.nodes[node as usize].items;
        if let Some(at) = items.iter().position(|&s| s == slot) {
            items.swap_remove(at);
        }
        self.slots[slot as usize].node = NIL;

        let mut parent = self.nodes[node as usize].parent;
        while parent != NIL {
            let first = self.nodes[parent as usize].children;
            let start = first as usize;
            let empty = self.nodes[start..start + 4]
                .iter()
                .all(|child| child.is_leaf() && child.items.is_empty());
            if !empty {
                break;
            }

            self.nodes[parent as usize].children = NIL;
            self.free_blocks.push(first);
            parent = self.nodes[parent as usize].parent;
        }
    }

    fn allocate(&mut self, entity: Entity<K>) -> u32 {
        let slot = Slot { entity, node: NIL };
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = slot;
            index
        } else {
            self.slots.push(slot);
            (self.slots.len() - 1) as u32
        }
    }
}

/// Grow `bounds` towards `p` by at least its own size on each axis that
/// needs it, far enough to contain `p`. Stays within the `f32` range.
fn grow_towards(bounds: Aabb, p: Point) -> Aabb {
    let grow = |min: f32, max: f32, v: f32| {
        let (min, max, v) = (f64::from(min), f64::from(max), f64::from(v));
        let span = max - min;
        if v < min {
            ((min - span).min(v), max)
        } else if v > max {
            (min, (max + span).max(v))
        } else {
            (min, max)
        }
    };
    let (min_x, max_x) = grow(bounds.min.x, bounds.max.x, p.x);
    let (min_y, max_y) = grow(bounds.min.y, bounds.max.y, p.y);

    Aabb::new(
        Point::new(to_f32(min_x), to_f32(min_y)),
        Point::new(to_f32(max_x), to_f32(max_y)),
    )
}

fn to_f32(v: f64) -> f32 {
    v.clamp(-f64::from(f32::MAX), f64::from(f32::MAX)) as f32
}

fn clamp_bounds(bounds: Aabb) -> Aabb {
    let clamp = |p: Point| {
        Point::new(
            p.x.clamp(-f32::MAX, f32::MAX),
            p.y.clamp(-f32::MAX, f32::MAX),
        )
    };
    Aabb::new(clamp(bounds.min), clamp(bounds.max))
}

impl<K: EntityId> SpatialIndex<K> for QuadTree<K> {
    fn insert(&mut self, id: K, position: Point) -> SpatialResult<()> {
        let position = position.validate()?;
        self.ensure_root(position);

        let slot = if let Some(&slot) = self.ids.get(&id) {
            let leaf = self.slots[slot as usize].node;
            self.slots[slot as usize].entity.position = position;
            if self.nodes[leaf as usize].bounds.contains(position) {
                return Ok(());
            }
            self.detach(slot);
            slot
        } else {
            let slot = self.allocate(Entity::new(id, position));
            self.ids.insert(id, slot);
            slot
        };

        self.place(0, slot);
        Ok(())
    }

    fn remove(&mut self, id: K) -> bool {
        let Some(slot) = self.ids.remove(&id) else {
            return false;
        };
        self.detach(slot);
        self.free.push(slot);
        true
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.free_blocks.clear();
        self.slots.clear();
        self.free.clear();
        self.ids.clear();
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
        if self.nodes.is_empty() {
            return Ok(());
        }

        let mut stack: SmallVec<[u32; 64]> = SmallVec::new();
        stack.push(0);
        while let Some(node) = stack.pop() {
            let n = &self.nodes[node as usize];
            if n.bounds.distance_squared_to(position) > radius_sq {
                continue;
            }
            if n.is_leaf() {
                for &slot in &n.items {
                    let entity = self.slots[slot as usize].entity;
                    if entity.position.distance_squared(position) <= radius_sq {
                        visit(entity);
                    }
                }
            } else {
                stack.extend(n.children..n.children + 4);
            }
        }
        Ok(())
    }
}
