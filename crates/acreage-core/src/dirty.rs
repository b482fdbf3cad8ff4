use crate::id::TileCoord;
use crate::layer::LayerKind;
use std::collections::{BTreeMap, BTreeSet};

/// Tracks which tiles (and which of their layers) have been modified since
/// the last clean point.
///
/// Downstream processing uses this to skip unchanged tiles. Region
/// processing clears the tiles it visits; [`mark_clean`](DirtyTracker::mark_clean)
/// resets everything.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    tiles: BTreeMap<TileCoord, BTreeSet<LayerKind>>,
}

impl DirtyTracker {
    /// Create a new tracker with nothing dirty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one layer of a tile as dirty.
    pub fn mark_tile(&mut self, coord: TileCoord, layer: LayerKind) {
        self.tiles.entry(coord).or_default().insert(layer);
    }

    /// Returns `true` if anything has been marked dirty since the last clean.
    pub fn is_dirty(&self) -> bool {
        !self.tiles.is_empty()
    }

    pub fn is_tile_dirty(&self, coord: TileCoord) -> bool {
        self.tiles.contains_key(&coord)
    }

    /// The dirty layers of a tile, if any.
    pub fn dirty_layers(&self, coord: TileCoord) -> Option<&BTreeSet<LayerKind>> {
        self.tiles.get(&coord)
    }

    /// All dirty tile coordinates, in order.
    pub fn dirty_tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.tiles.keys().copied()
    }

    pub fn dirty_tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Forget a single tile's dirty state.
    pub fn clear_tile(&mut self, coord: TileCoord) {
        self.tiles.remove(&coord);
    }

    /// Reset all dirty flags.
    pub fn mark_clean(&mut self) {
        self.tiles.clear();
    }
}
