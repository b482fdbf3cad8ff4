//! Entity positions as seen by the grid.
//!
//! The grid does not own entity state. It consults a [`PositionLookup`] to
//! learn where an entity currently is, and writes through a
//! [`PositionStore`] when a placement call moves an entity.

use crate::id::EntityId;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

/// A floating-point world position, in tile units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f64,
    pub y: f64,
}

impl WorldPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance(&self, other: &WorldPos) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Read access to entity positions. `None` means the entity has no known
/// position, which callers treat as "not on the grid".
pub trait PositionLookup {
    fn position(&self, entity: EntityId) -> Option<WorldPos>;
}

/// Read/write access to entity positions.
pub trait PositionStore: PositionLookup {
    fn set_position(&mut self, entity: EntityId, pos: WorldPos);

    fn clear_position(&mut self, entity: EntityId);
}

/// The default position store: a dense secondary map keyed by entity.
#[derive(Debug, Clone, Default)]
pub struct PositionTable {
    positions: SecondaryMap<EntityId, WorldPos>,
}

impl PositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, WorldPos)> + '_ {
        self.positions.iter().map(|(id, pos)| (id, *pos))
    }
}

impl PositionLookup for PositionTable {
    fn position(&self, entity: EntityId) -> Option<WorldPos> {
        self.positions.get(entity).copied()
    }
}

impl PositionStore for PositionTable {
    fn set_position(&mut self, entity: EntityId, pos: WorldPos) {
        self.positions.insert(entity, pos);
    }

    fn clear_position(&mut self, entity: EntityId) {
        self.positions.remove(entity);
    }
}
