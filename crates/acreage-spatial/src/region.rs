//! Fixed-size chunks of tiles with their own private index and a
//! rate-limited processing schedule.

use crate::quadtree::QuadTree;
use crate::tile::Tile;
use crate::Rect;
use acreage_core::config::IndexLimits;
use acreage_core::id::{EntityId, RegionCoord, TileCoord};
use acreage_core::position::PositionLookup;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Region {
    coord: RegionCoord,
    size: i32,
    tiles: BTreeMap<TileCoord, Tile>,
    index: QuadTree,
    active: bool,
    update_frequency: f64,
    last_processed: Duration,
}

impl Region {
    pub fn new(coord: RegionCoord, size: i32, limits: IndexLimits, update_frequency: f64) -> Self {
        let origin = coord.origin(size);
        let bounds = Rect::new(
            f64::from(origin.x),
            f64::from(origin.y),
            f64::from(size),
            f64::from(size),
        );
        Self {
            coord,
            size,
            tiles: BTreeMap::new(),
            index: QuadTree::new(bounds, limits),
            active: false,
            update_frequency,
            last_processed: Duration::ZERO,
        }
    }

    pub fn coord(&self) -> RegionCoord {
        self.coord
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    /// World-space rectangle covered by this region.
    pub fn bounds(&self) -> Rect {
        self.index.bounds()
    }

    /// Whether `coord` falls inside this region's chunk.
    pub fn owns(&self, coord: TileCoord) -> bool {
        RegionCoord::of(coord, self.size) == self.coord
    }

    // -- Tiles --

    /// Store a tile under its own coordinate, replacing any tile already
    /// there. The tile must belong to this chunk.
    pub fn add_tile(&mut self, tile: Tile) {
        debug_assert!(
            self.owns(tile.coord()),
            "tile {:?} does not belong to region {:?}",
            tile.coord(),
            self.coord
        );
        self.tiles.insert(tile.coord(), tile);
    }

    pub fn remove_tile(&mut self, coord: TileCoord) -> Option<Tile> {
        self.tiles.remove(&coord)
    }

    pub fn get_tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    pub fn get_tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.tiles.get_mut(&coord)
    }

    /// The tile at `coord`, created empty if missing. The flag is `true` when
    /// the tile was created by this call.
    pub fn get_or_insert_tile(&mut self, coord: TileCoord) -> (&mut Tile, bool) {
        debug_assert!(self.owns(coord));
        let mut created = false;
        let tile = self.tiles.entry(coord).or_insert_with(|| {
            created = true;
            Tile::new(coord)
        });
        (tile, created)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.values()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    // -- Private index --

    pub fn index(&self) -> &QuadTree {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut QuadTree {
        &mut self.index
    }

    /// Every entity resident on any layer of any tile in this region.
    pub fn resident_entities(&self) -> BTreeSet<EntityId> {
        self.tiles
            .values()
            .flat_map(|tile| tile.entities(None))
            .collect()
    }

    /// Rebuild the private index from the tiles' residents at their current
    /// positions and clear tile dirty flags. Picks up moves that bypassed
    /// the engine.
    pub fn resync(&mut self, lookup: &dyn PositionLookup) {
        self.index.clear();
        let residents = self.resident_entities();
        for &entity in &residents {
            self.index.insert(entity, lookup);
        }
        for tile in self.tiles.values_mut() {
            tile.clear_dirty();
        }
        tracing::trace!(region = ?self.coord, residents = residents.len(), "region resynced");
    }

    // -- Scheduling --

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn update_frequency(&self) -> f64 {
        self.update_frequency
    }

    pub fn last_processed(&self) -> Duration {
        self.last_processed
    }

    /// True when active and at least one update period has passed since the
    /// last processing pass.
    pub fn needs_processing(&self, now: Duration) -> bool {
        if !self.active {
            return false;
        }
        let period = Duration::from_secs_f64(1.0 / self.update_frequency);
        now.saturating_sub(self.last_processed) >= period
    }

    pub fn mark_processed(&mut self, now: Duration) {
        self.last_processed = now;
    }
}
