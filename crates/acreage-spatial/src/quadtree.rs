//! Arena-backed quadtree over entity positions.
//!
//! Nodes live in a flat `Vec` and refer to their children by index; the
//! root is always index 0. A node is either a leaf holding a set of entity
//! ids or an internal node with exactly four children that tile its
//! rectangle. Children are created once, when a leaf exceeds
//! [`IndexLimits::max_entities`] below [`IndexLimits::max_depth`], and are
//! never merged back.
//!
//! The tree stores ids only. Positions come from a [`PositionLookup`] at
//! insert and query time, and leaves filter by the entity's *current*
//! position, so an entity that moved without being re-indexed is never
//! reported where it no longer is.
//!
//! Two side sets keep entities that cannot live in a leaf:
//! - `overflow`: positions outside the root rectangle. Scanned linearly by
//!   every query.
//! - `stranded`: entities whose position stopped resolving while a leaf was
//!   being redistributed. Logged and kept so they can be retried.

use crate::Rect;
use acreage_core::config::IndexLimits;
use acreage_core::id::EntityId;
use acreage_core::position::{PositionLookup, WorldPos};
use std::collections::BTreeSet;

const ROOT: usize = 0;

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf(BTreeSet<EntityId>),
    Internal([usize; 4]),
}

#[derive(Debug, Clone)]
struct QuadNode {
    bounds: Rect,
    depth: u8,
    kind: NodeKind,
}

impl QuadNode {
    fn leaf(bounds: Rect, depth: u8) -> Self {
        Self {
            bounds,
            depth,
            kind: NodeKind::Leaf(BTreeSet::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuadTree {
    nodes: Vec<QuadNode>,
    limits: IndexLimits,
    overflow: BTreeSet<EntityId>,
    stranded: BTreeSet<EntityId>,
}

impl QuadTree {
    pub fn new(bounds: Rect, limits: IndexLimits) -> Self {
        Self {
            nodes: vec![QuadNode::leaf(bounds, 0)],
            limits,
            overflow: BTreeSet::new(),
            stranded: BTreeSet::new(),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.nodes[ROOT].bounds
    }

    pub fn limits(&self) -> IndexLimits {
        self.limits
    }

    // -- Mutation --

    /// Index an entity at its current position. Returns `false` (and does
    /// nothing) if the entity has no known position.
    pub fn insert(&mut self, entity: EntityId, lookup: &dyn PositionLookup) -> bool {
        let Some(pos) = lookup.position(entity) else {
            return false;
        };
        self.stranded.remove(&entity);

        if !self.bounds().contains_pos(pos) {
            self.overflow.insert(entity);
            return true;
        }

        let leaf = self.leaf_for(pos);
        let over_capacity = match &mut self.nodes[leaf].kind {
            NodeKind::Leaf(set) => {
                set.insert(entity);
                set.len() > self.limits.max_entities
            }
            NodeKind::Internal(_) => false,
        };
        if over_capacity && self.nodes[leaf].depth < self.limits.max_depth {
            self.subdivide(leaf, lookup);
        }
        true
    }

    /// Drop an entity from every leaf and side set. The tree does not trust
    /// positions for removal, since the entity may have moved since it was
    /// indexed. Returns `true` if anything was removed.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let mut removed = self.overflow.remove(&entity) | self.stranded.remove(&entity);
        for node in &mut self.nodes {
            if let NodeKind::Leaf(set) = &mut node.kind {
                removed |= set.remove(&entity);
            }
        }
        removed
    }

    /// Drop every entity and collapse back to a single root leaf.
    pub fn clear(&mut self) {
        let bounds = self.bounds();
        self.nodes.clear();
        self.nodes.push(QuadNode::leaf(bounds, 0));
        self.overflow.clear();
        self.stranded.clear();
    }

    /// Change the root rectangle's size (keeping its origin) and re-index
    /// everything against it. Entities whose position no longer resolves
    /// stay stranded.
    pub fn resize(&mut self, width: f64, height: f64, lookup: &dyn PositionLookup) {
        let entities = self.entities();
        let stranded = std::mem::take(&mut self.stranded);
        let root = self.bounds();
        self.nodes.clear();
        self.nodes
            .push(QuadNode::leaf(Rect::new(root.x, root.y, width, height), 0));
        self.overflow.clear();

        for entity in entities.into_iter().chain(stranded) {
            if !self.insert(entity, lookup) {
                self.stranded.insert(entity);
            }
        }
    }

    /// Re-insert stranded entities whose position resolves again. Returns
    /// how many were recovered.
    pub fn retry_stranded(&mut self, lookup: &dyn PositionLookup) -> usize {
        let stranded = std::mem::take(&mut self.stranded);
        let mut recovered = 0;
        for entity in stranded {
            if self.insert(entity, lookup) {
                recovered += 1;
            } else {
                self.stranded.insert(entity);
            }
        }
        recovered
    }

    // -- Queries --

    /// Entities whose current position lies inside `rect` (half-open).
    pub fn query_rect(&self, rect: Rect, lookup: &dyn PositionLookup) -> BTreeSet<EntityId> {
        self.collect(&rect, lookup, |pos| rect.contains_pos(pos))
    }

    /// Entities within Euclidean distance `radius` of `(cx, cy)`, inclusive.
    pub fn query_radius(
        &self,
        cx: f64,
        cy: f64,
        radius: f64,
        lookup: &dyn PositionLookup,
    ) -> BTreeSet<EntityId> {
        if radius < 0.0 {
            return BTreeSet::new();
        }
        let center = WorldPos::new(cx, cy);
        self.collect(&Rect::around(cx, cy, radius), lookup, |pos| {
            pos.distance(&center) <= radius
        })
    }

    /// Walk every node whose rectangle intersects `prune`, testing leaf
    /// entities (and overflow) with `accept`.
    fn collect(
        &self,
        prune: &Rect,
        lookup: &dyn PositionLookup,
        accept: impl Fn(WorldPos) -> bool,
    ) -> BTreeSet<EntityId> {
        let mut found = BTreeSet::new();
        let mut visit = |entity: EntityId| {
            if lookup.position(entity).is_some_and(&accept) {
                found.insert(entity);
            }
        };

        let mut stack = vec![ROOT];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if !node.bounds.intersects(prune) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(set) => set.iter().copied().for_each(&mut visit),
                NodeKind::Internal(children) => stack.extend_from_slice(children),
            }
        }
        self.overflow.iter().copied().for_each(&mut visit);
        found
    }

    // -- Introspection --

    /// Every indexed entity (leaves and overflow, not stranded).
    pub fn entities(&self) -> BTreeSet<EntityId> {
        let mut all: BTreeSet<EntityId> = self.overflow.clone();
        for node in &self.nodes {
            if let NodeKind::Leaf(set) = &node.kind {
                all.extend(set.iter().copied());
            }
        }
        all
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.overflow.contains(&entity)
            || self.nodes.iter().any(|node| match &node.kind {
                NodeKind::Leaf(set) => set.contains(&entity),
                NodeKind::Internal(_) => false,
            })
    }

    pub fn len(&self) -> usize {
        self.entities().len()
    }

    pub fn is_empty(&self) -> bool {
        self.overflow.is_empty()
            && self.nodes.iter().all(|node| match &node.kind {
                NodeKind::Leaf(set) => set.is_empty(),
                NodeKind::Internal(_) => true,
            })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest node depth in the tree (0 for an unsplit root).
    pub fn depth(&self) -> u8 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    pub fn overflow(&self) -> &BTreeSet<EntityId> {
        &self.overflow
    }

    pub fn stranded(&self) -> &BTreeSet<EntityId> {
        &self.stranded
    }

    /// Rectangles of the current leaves. Mostly useful for debugging and
    /// tests.
    pub fn leaf_bounds(&self) -> Vec<Rect> {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Leaf(_)))
            .map(|n| n.bounds)
            .collect()
    }

    // -- Internals --

    fn leaf_for(&self, pos: WorldPos) -> usize {
        let mut idx = ROOT;
        while let NodeKind::Internal(children) = &self.nodes[idx].kind {
            idx = children[self.nodes[idx].bounds.quadrant_of(pos)];
        }
        idx
    }

    fn subdivide(&mut self, idx: usize, lookup: &dyn PositionLookup) {
        let NodeKind::Leaf(held) = std::mem::replace(
            &mut self.nodes[idx].kind,
            NodeKind::Leaf(BTreeSet::new()),
        ) else {
            return;
        };
        let bounds = self.nodes[idx].bounds;
        let depth = self.nodes[idx].depth + 1;

        let first = self.nodes.len();
        for quadrant in bounds.quadrants() {
            self.nodes.push(QuadNode::leaf(quadrant, depth));
        }
        let children = [first, first + 1, first + 2, first + 3];
        self.nodes[idx].kind = NodeKind::Internal(children);

        for entity in held {
            let Some(pos) = lookup.position(entity) else {
                tracing::warn!(
                    ?entity,
                    depth,
                    "entity lost its position during quadtree split; keeping it stranded"
                );
                self.stranded.insert(entity);
                continue;
            };
            let child = children[bounds.quadrant_of(pos)];
            if let NodeKind::Leaf(set) = &mut self.nodes[child].kind {
                set.insert(entity);
            }
        }

        for child in children {
            let crowded = match &self.nodes[child].kind {
                NodeKind::Leaf(set) => set.len() > self.limits.max_entities,
                NodeKind::Internal(_) => false,
            };
            if crowded && depth < self.limits.max_depth {
                self.subdivide(child, lookup);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acreage_core::position::{PositionStore, PositionTable};
    use acreage_core::test_utils::make_entities;

    fn tree(max_entities: usize, max_depth: u8) -> QuadTree {
        QuadTree::new(
            Rect::new(0.0, 0.0, 32.0, 32.0),
            IndexLimits::new(max_entities, max_depth),
        )
    }

    fn place(table: &mut PositionTable, entity: EntityId, x: f64, y: f64) {
        table.set_position(entity, WorldPos::new(x, y));
    }

    #[test]
    fn insert_without_position_is_noop() {
        let (_sm, ids) = make_entities(1);
        let table = PositionTable::new();
        let mut qt = tree(4, 4);

        assert!(!qt.insert(ids[0], &table));
        assert!(qt.is_empty());
        assert!(!qt.contains(ids[0]));
    }

    #[test]
    fn splits_past_threshold() {
        let (_sm, ids) = make_entities(5);
        let mut table = PositionTable::new();
        let mut qt = tree(4, 4);

        for (i, &id) in ids.iter().enumerate() {
            place(&mut table, id, 1.0 + i as f64 * 6.0, 1.0 + i as f64 * 6.0);
            qt.insert(id, &table);
        }

        assert_eq!(qt.node_count(), 5);
        assert_eq!(qt.depth(), 1);
        assert_eq!(qt.len(), 5);
        assert_eq!(qt.leaf_bounds().len(), 4);
    }

    #[test]
    fn max_depth_leaf_accepts_unbounded() {
        let (_sm, ids) = make_entities(20);
        let mut table = PositionTable::new();
        let mut qt = tree(2, 2);

        // All at the same spot: splitting can never separate them.
        for &id in &ids {
            place(&mut table, id, 3.0, 3.0);
            qt.insert(id, &table);
        }

        assert_eq!(qt.depth(), 2);
        assert_eq!(qt.len(), 20);
        let found = qt.query_rect(Rect::new(3.0, 3.0, 1.0, 1.0), &table);
        assert_eq!(found.len(), 20);
    }

    #[test]
    fn query_rect_half_open() {
        let (_sm, ids) = make_entities(3);
        let mut table = PositionTable::new();
        let mut qt = tree(4, 4);

        place(&mut table, ids[0], 5.0, 5.0);
        place(&mut table, ids[1], 10.0, 5.0);
        place(&mut table, ids[2], 9.99, 9.99);
        for &id in &ids {
            qt.insert(id, &table);
        }

        let found = qt.query_rect(Rect::new(5.0, 5.0, 5.0, 5.0), &table);
        assert!(found.contains(&ids[0]));
        assert!(!found.contains(&ids[1]));
        assert!(found.contains(&ids[2]));
    }

    #[test]
    fn query_radius_uses_true_distance() {
        let (_sm, ids) = make_entities(3);
        let mut table = PositionTable::new();
        let mut qt = tree(1, 6);

        place(&mut table, ids[0], 10.0, 10.0);
        // Inside the bounding square but outside the circle.
        place(&mut table, ids[1], 12.9, 12.9);
        place(&mut table, ids[2], 13.0, 10.0);
        for &id in &ids {
            qt.insert(id, &table);
        }

        let found = qt.query_radius(10.0, 10.0, 3.0, &table);
        assert_eq!(found, BTreeSet::from([ids[0], ids[2]]));
        assert_eq!(
            qt.query_radius(10.0, 10.0, 0.0, &table),
            BTreeSet::from([ids[0]])
        );
        assert!(qt.query_radius(10.0, 10.0, -1.0, &table).is_empty());
    }

    #[test]
    fn leaves_filter_by_current_position() {
        let (_sm, ids) = make_entities(1);
        let mut table = PositionTable::new();
        let mut qt = tree(4, 4);

        place(&mut table, ids[0], 2.0, 2.0);
        qt.insert(ids[0], &table);
        // Moved without re-indexing.
        place(&mut table, ids[0], 2.5, 20.0);

        assert!(qt.query_rect(Rect::new(0.0, 0.0, 4.0, 4.0), &table).is_empty());
    }

    #[test]
    fn remove_finds_entity_in_any_child() {
        let (_sm, ids) = make_entities(6);
        let mut table = PositionTable::new();
        let mut qt = tree(2, 4);

        for (i, &id) in ids.iter().enumerate() {
            place(&mut table, id, 2.0 + i as f64 * 5.0, 30.0 - i as f64 * 5.0);
            qt.insert(id, &table);
        }
        // Stale position: removal must not rely on it.
        place(&mut table, ids[3], 0.5, 0.5);

        assert!(qt.remove(ids[3]));
        assert!(!qt.contains(ids[3]));
        assert!(!qt.remove(ids[3]));
        assert_eq!(qt.len(), 5);
    }

    #[test]
    fn out_of_bounds_goes_to_overflow() {
        let (_sm, ids) = make_entities(2);
        let mut table = PositionTable::new();
        let mut qt = tree(4, 4);

        place(&mut table, ids[0], -3.0, 4.0);
        place(&mut table, ids[1], 40.0, 40.0);
        qt.insert(ids[0], &table);
        qt.insert(ids[1], &table);

        assert_eq!(qt.overflow().len(), 2);
        let found = qt.query_rect(Rect::new(-5.0, 0.0, 5.0, 5.0), &table);
        assert_eq!(found, BTreeSet::from([ids[0]]));
        assert!(qt.query_radius(40.0, 40.0, 0.5, &table).contains(&ids[1]));

        assert!(qt.remove(ids[0]));
        assert_eq!(qt.overflow().len(), 1);
    }

    #[test]
    fn stale_entity_during_split_is_stranded_not_lost() {
        let (_sm, ids) = make_entities(3);
        let mut table = PositionTable::new();
        let mut qt = tree(2, 4);

        place(&mut table, ids[0], 1.0, 1.0);
        place(&mut table, ids[1], 20.0, 20.0);
        qt.insert(ids[0], &table);
        qt.insert(ids[1], &table);
        table.clear_position(ids[0]);

        place(&mut table, ids[2], 25.0, 3.0);
        qt.insert(ids[2], &table);

        assert_eq!(qt.stranded(), &BTreeSet::from([ids[0]]));
        assert!(!qt.contains(ids[0]));

        assert_eq!(qt.retry_stranded(&table), 0);
        place(&mut table, ids[0], 1.0, 1.0);
        assert_eq!(qt.retry_stranded(&table), 1);
        assert!(qt.contains(ids[0]));
        assert!(qt.stranded().is_empty());
    }

    #[test]
    fn resize_reindexes_overflow() {
        let (_sm, ids) = make_entities(10);
        let mut table = PositionTable::new();
        let mut qt = tree(2, 5);

        for (i, &id) in ids.iter().enumerate() {
            place(&mut table, id, i as f64 * 6.0, i as f64 * 6.0);
            qt.insert(id, &table);
        }
        let outside = qt.overflow().len();
        assert!(outside > 0);

        qt.resize(128.0, 128.0, &table);

        assert_eq!(qt.bounds(), Rect::new(0.0, 0.0, 128.0, 128.0));
        assert!(qt.overflow().is_empty());
        assert_eq!(qt.len(), 10);
        let all = qt.query_rect(Rect::new(0.0, 0.0, 128.0, 128.0), &table);
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn clear_collapses_to_root() {
        let (_sm, ids) = make_entities(9);
        let mut table = PositionTable::new();
        let mut qt = tree(2, 3);
        for (i, &id) in ids.iter().enumerate() {
            place(&mut table, id, (i % 3) as f64 * 10.0, (i / 3) as f64 * 10.0);
            qt.insert(id, &table);
        }
        assert!(qt.node_count() > 1);

        qt.clear();
        assert_eq!(qt.node_count(), 1);
        assert!(qt.is_empty());
    }
}
