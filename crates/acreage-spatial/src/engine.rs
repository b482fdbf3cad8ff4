//! The grid engine: the single entry point for spatial reads and writes.
//!
//! # Architecture
//!
//! `GridEngine` owns:
//! - Tiles, stored inside their owning [`Region`] (a region is created the
//!   first time one of its tiles is). There is no separate tile map, so a
//!   tile can only ever live in the region that covers it.
//! - A global [`QuadTree`] over every placed entity, one per [`LayerKind`],
//!   and one private tree per region.
//! - The active-region set and a TTL [`QueryCache`].
//! - Placement records: for each entity, the tile it was placed on per layer.
//! - Injected collaborators: a [`PositionStore`], a [`Notifier`] and a
//!   [`Clock`]. The notifier defaults to an [`EventBus`], which the host
//!   reaches through [`GridEngine::event_bus_mut`] to subscribe and deliver.
//!
//! # Consistency
//!
//! Every mutation goes through `place_entity` / `detach`, which update the
//! tile, the indices and the placement record together, then invalidate the
//! whole cache and publish a notification. `move_entity` is remove followed
//! by place; there is no incremental fast path.

use crate::cache::{QueryCache, QueryKey};
use crate::pathfinding::{self, PathResult};
use crate::profiling::GridStats;
use crate::quadtree::QuadTree;
use crate::region::Region;
use crate::tile::{Tile, Traversal};
use crate::Rect;
use acreage_core::clock::{Clock, MonotonicClock};
use acreage_core::config::{ConfigError, GridConfig};
use acreage_core::dirty::DirtyTracker;
use acreage_core::event::{
    EventBus, EventKind, EventPriority, GridEvent, InboundEvent, Listener, Notifier,
};
use acreage_core::id::{EntityId, RegionCoord, TileCoord};
use acreage_core::layer::{LayerKind, LayerRecord};
use acreage_core::position::{PositionLookup, PositionStore, PositionTable, WorldPos};
use slotmap::SecondaryMap;
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// GridEngine
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct GridEngine<S: PositionStore = PositionTable, N: Notifier = EventBus> {
    config: GridConfig,

    /// Nominal world size. Sizes the root rectangle of the global and layer
    /// indices; tile coordinates are not limited to it.
    width: u32,
    height: u32,

    regions: BTreeMap<RegionCoord, Region>,
    tile_count: usize,

    global_index: QuadTree,
    layer_indices: BTreeMap<LayerKind, QuadTree>,

    active: BTreeSet<RegionCoord>,
    cache: QueryCache,

    /// Tile each entity was placed on, per layer.
    placements: SecondaryMap<EntityId, BTreeMap<LayerKind, TileCoord>>,

    positions: S,
    notifier: N,
    clock: Box<dyn Clock>,

    dirty: DirtyTracker,
    stats: GridStats,
}

impl GridEngine<PositionTable, EventBus> {
    /// An engine with default settings for a `width x height` world, its own
    /// position table, an [`EventBus`] and a monotonic clock.
    pub fn new(width: u32, height: u32) -> Self {
        Self::build(
            GridConfig::with_size(width, height),
            PositionTable::new(),
            EventBus::default(),
            Box::new(MonotonicClock::new()),
        )
    }

    /// Like [`new`](GridEngine::new) but with a full configuration, which is
    /// validated first.
    pub fn from_config(config: GridConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(
            config,
            PositionTable::new(),
            EventBus::default(),
            Box::new(MonotonicClock::new()),
        ))
    }
}

impl<S: PositionStore> GridEngine<S, EventBus> {
    /// The bus grid events are buffered in until [`deliver_events`](Self::deliver_events).
    pub fn event_bus(&self) -> &EventBus {
        &self.notifier
    }

    pub fn event_bus_mut(&mut self) -> &mut EventBus {
        &mut self.notifier
    }

    /// Register a passive listener for one event kind.
    pub fn on_event(&mut self, kind: EventKind, listener: Listener) {
        self.notifier.on(kind, listener);
    }

    /// Stop buffering an event kind.
    pub fn suppress_event(&mut self, kind: EventKind) {
        self.notifier.suppress(kind);
    }

    /// Hand buffered events to their listeners and empty the buffers.
    pub fn deliver_events(&mut self) {
        self.notifier.deliver();
    }
}

impl<S: PositionStore, N: Notifier> GridEngine<S, N> {
    /// Assemble an engine from explicit collaborators.
    pub fn with_parts(
        config: GridConfig,
        positions: S,
        notifier: N,
        clock: impl Clock + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, positions, notifier, Box::new(clock)))
    }

    fn build(config: GridConfig, positions: S, notifier: N, clock: Box<dyn Clock>) -> Self {
        let bounds = Rect::new(0.0, 0.0, f64::from(config.width), f64::from(config.height));
        let layer_indices = LayerKind::ALL
            .into_iter()
            .map(|layer| (layer, QuadTree::new(bounds, config.layer_index)))
            .collect();
        Self {
            width: config.width,
            height: config.height,
            regions: BTreeMap::new(),
            tile_count: 0,
            global_index: QuadTree::new(bounds, config.global_index),
            layer_indices,
            active: BTreeSet::new(),
            cache: QueryCache::new(config.cache_ttl()),
            placements: SecondaryMap::new(),
            positions,
            notifier,
            clock,
            dirty: DirtyTracker::new(),
            stats: GridStats::default(),
            config,
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    // -----------------------------------------------------------------------
    // Tiles
    // -----------------------------------------------------------------------

    /// The tile at `(x, y)`, created (along with its region) if missing.
    /// Publishes `tile_created` on creation.
    pub fn get_or_create_tile(&mut self, x: i32, y: i32) -> &mut Tile {
        let coord = TileCoord::new(x, y);
        let Self {
            config,
            regions,
            notifier,
            tile_count,
            ..
        } = self;
        let region = region_entry(regions, config, RegionCoord::of(coord, config.region_size));
        let (tile, created) = region.get_or_insert_tile(coord);
        if created {
            *tile_count += 1;
            notifier.publish(GridEvent::TileCreated { coord }, EventPriority::Normal);
        }
        tile
    }

    /// The tile at `(x, y)` if it exists. Never creates.
    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        let coord = TileCoord::new(x, y);
        self.regions
            .get(&RegionCoord::of(coord, self.config.region_size))
            .and_then(|region| region.get_tile(coord))
    }

    /// Every tile, region by region.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.regions.values().flat_map(Region::tiles)
    }

    pub fn tile_count(&self) -> usize {
        self.tile_count
    }

    /// Replace one layer's record on a tile, creating the tile if needed.
    pub fn set_tile_layer(&mut self, x: i32, y: i32, record: LayerRecord) {
        let layer = record.kind();
        self.get_or_create_tile(x, y).set_layer(record);
        self.touch_tile(TileCoord::new(x, y), layer);
    }

    /// Merge a partial record into a tile's layer, creating the tile if needed.
    pub fn update_tile_layer(&mut self, x: i32, y: i32, partial: LayerRecord) {
        let layer = partial.kind();
        self.get_or_create_tile(x, y).update_layer(partial);
        self.touch_tile(TileCoord::new(x, y), layer);
    }

    /// Set a tile's traversal properties. Tracked as a navigation-layer change.
    pub fn set_tile_traversal(&mut self, x: i32, y: i32, traversal: Traversal) {
        self.get_or_create_tile(x, y).set_traversal(traversal);
        self.touch_tile(TileCoord::new(x, y), LayerKind::Navigation);
    }

    fn touch_tile(&mut self, coord: TileCoord, layer: LayerKind) {
        self.dirty.mark_tile(coord, layer);
        self.cache.clear();
    }

    // -----------------------------------------------------------------------
    // Regions
    // -----------------------------------------------------------------------

    pub fn region(&self, coord: RegionCoord) -> Option<&Region> {
        self.regions.get(&coord)
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.values()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn active_regions(&self) -> &BTreeSet<RegionCoord> {
        &self.active
    }

    /// Entities in a region's private index at their current positions.
    pub fn region_entities(&self, coord: RegionCoord) -> BTreeSet<EntityId> {
        self.regions
            .get(&coord)
            .map(|region| region.index().query_rect(region.bounds(), &self.positions))
            .unwrap_or_default()
    }

    /// Make exactly the regions overlapping the square around a circle of
    /// `radius` at `(center_x, center_y)` active, creating missing ones.
    /// Previously active regions outside it are deactivated.
    ///
    /// The span is capped at `max_active_reach` regions either side of the
    /// center region on each axis. A non-finite center is ignored.
    pub fn set_active_region(&mut self, center_x: f64, center_y: f64, radius: f64) {
        if !(center_x.is_finite() && center_y.is_finite()) {
            tracing::warn!(center_x, center_y, "non-finite active region center ignored");
            return;
        }
        let radius = radius.max(0.0);
        let size = f64::from(self.config.region_size);
        let reach = i64::from(self.config.max_active_reach);
        let mut clamped = false;
        let mut axis = |center: f64| {
            let mid = (center / size).floor() as i64;
            let lo = ((center - radius) / size).floor() as i64;
            let hi = ((center + radius) / size).floor() as i64;
            let capped_lo = lo.max(mid.saturating_sub(reach));
            let capped_hi = hi.min(mid.saturating_add(reach));
            clamped |= capped_lo != lo || capped_hi != hi;
            (to_region_axis(capped_lo), to_region_axis(capped_hi))
        };
        let (min_x, max_x) = axis(center_x);
        let (min_y, max_y) = axis(center_y);
        if clamped {
            tracing::warn!(
                center_x,
                center_y,
                radius,
                max_active_reach = self.config.max_active_reach,
                "active region span capped"
            );
        }

        let mut next = BTreeSet::new();
        for ry in min_y..=max_y {
            for rx in min_x..=max_x {
                next.insert(RegionCoord::new(rx, ry));
            }
        }

        for &coord in &next {
            region_entry(&mut self.regions, &self.config, coord).set_active(true);
        }
        for coord in self.active.difference(&next) {
            if let Some(region) = self.regions.get_mut(coord) {
                region.set_active(false);
            }
        }
        self.active = next;
        self.cache.clear();

        let active_count = self.active.len();
        tracing::debug!(center_x, center_y, radius, active_count, "active regions changed");
        self.notifier.publish(
            GridEvent::ActiveRegionChanged { active_count },
            EventPriority::Low,
        );
    }

    /// Resynchronise every active region that is due at `now`: rebuild its
    /// private index from resident entities, clear its tiles' dirty flags and
    /// reset its timer. Returns how many regions were processed.
    pub fn process_active_regions(&mut self, now: Duration) -> usize {
        let mut processed = 0;
        for coord in &self.active {
            let Some(region) = self.regions.get_mut(coord) else {
                continue;
            };
            if !region.needs_processing(now) {
                continue;
            }
            region.resync(&self.positions);
            for tile in region.tiles() {
                self.dirty.clear_tile(tile.coord());
            }
            region.mark_processed(now);
            processed += 1;
        }
        self.stats.regions_processed += processed as u64;
        processed
    }

    /// [`process_active_regions`](Self::process_active_regions) at the
    /// engine clock's current time.
    pub fn process_due_regions(&mut self) -> usize {
        let now = self.clock.now();
        self.process_active_regions(now)
    }

    // -----------------------------------------------------------------------
    // Entity placement
    // -----------------------------------------------------------------------

    /// Put `entity` at world position `(x, y)` on `layer`. The entity's
    /// position is written to the position store; the tile is the one
    /// containing the position (floor on both axes). A previous placement
    /// on the same layer is removed first.
    ///
    /// A non-finite position is ignored. A position past the `i32` tile
    /// range is placed on the edge tile.
    pub fn place_entity(&mut self, entity: EntityId, x: f64, y: f64, layer: LayerKind) {
        if !placeable(entity, x, y, layer) {
            return;
        }
        if let Some(previous) = self.placement(entity, layer) {
            self.detach(entity, layer, previous);
        }

        let pos = WorldPos::new(x, y);
        let tile = TileCoord::containing(x, y);
        self.positions.set_position(entity, pos);
        self.get_or_create_tile(tile.x, tile.y).add_entity(entity, layer);

        let region_coord = RegionCoord::of(tile, self.config.region_size);
        if let Some(region) = self.regions.get_mut(&region_coord) {
            let index = region.index_mut();
            index.remove(entity);
            index.insert(entity, &self.positions);
        }

        self.global_index.remove(entity);
        self.global_index.insert(entity, &self.positions);

        if let Some(entry) = self.placements.entry(entity) {
            entry.or_default().insert(layer, tile);
        }

        // The entity has one position, so every layer it sits on moves with it.
        let bounds = self.global_index.bounds();
        let limits = self.config.layer_index;
        for placed in self.placed_layers(entity) {
            let layer_index = self
                .layer_indices
                .entry(placed)
                .or_insert_with(|| QuadTree::new(bounds, limits));
            layer_index.remove(entity);
            layer_index.insert(entity, &self.positions);
        }

        self.dirty.mark_tile(tile, layer);
        self.cache.clear();
        tracing::trace!(?entity, x, y, %layer, "entity placed");
        self.notifier.publish(
            GridEvent::EntityPlaced {
                entity,
                pos,
                tile,
                layer,
            },
            EventPriority::Normal,
        );
    }

    /// Take `entity` off `layer`. A no-op if the entity has no known
    /// position. Calling it again is harmless.
    pub fn remove_entity(&mut self, entity: EntityId, layer: LayerKind) {
        let Some(pos) = self.positions.position(entity) else {
            return;
        };
        let tile = self
            .placement(entity, layer)
            .unwrap_or_else(|| TileCoord::containing(pos.x, pos.y));
        self.detach(entity, layer, tile);
    }

    /// Remove then re-place on the same layer. A non-finite destination
    /// leaves the entity where it is.
    pub fn move_entity(&mut self, entity: EntityId, new_x: f64, new_y: f64, layer: LayerKind) {
        if !placeable(entity, new_x, new_y, layer) {
            return;
        }
        self.remove_entity(entity, layer);
        self.place_entity(entity, new_x, new_y, layer);
    }

    /// Undo one layer placement. The entity stays in the global index while
    /// any other layer still holds it, and in the region index while any
    /// remaining placement is in the same region. Returns whether anything
    /// changed; only then is the cache cleared and a removal published.
    fn detach(&mut self, entity: EntityId, layer: LayerKind, tile: TileCoord) -> bool {
        let size = self.config.region_size;
        let region_coord = RegionCoord::of(tile, size);
        let mut changed = false;

        if let Some(t) = self
            .regions
            .get_mut(&region_coord)
            .and_then(|region| region.get_tile_mut(tile))
        {
            changed |= t.remove_entity(entity, layer);
        }
        if let Some(index) = self.layer_indices.get_mut(&layer) {
            changed |= index.remove(entity);
        }

        let remaining: Vec<TileCoord> = match self.placements.get_mut(entity) {
            Some(placed) => {
                changed |= placed.remove(&layer).is_some();
                placed.values().copied().collect()
            }
            None => Vec::new(),
        };
        if remaining.is_empty() {
            self.placements.remove(entity);
            changed |= self.global_index.remove(entity);
        }
        let still_in_region = remaining
            .iter()
            .any(|&other| RegionCoord::of(other, size) == region_coord);
        if !still_in_region {
            if let Some(region) = self.regions.get_mut(&region_coord) {
                changed |= region.index_mut().remove(entity);
            }
        }

        if changed {
            self.dirty.mark_tile(tile, layer);
            self.cache.clear();
            tracing::trace!(?entity, %layer, "entity removed");
            self.notifier.publish(
                GridEvent::EntityRemoved {
                    entity,
                    tile,
                    layer,
                },
                EventPriority::Normal,
            );
        }
        changed
    }

    /// The tile `entity` was placed on for `layer`.
    pub fn placement(&self, entity: EntityId, layer: LayerKind) -> Option<TileCoord> {
        self.placements
            .get(entity)
            .and_then(|placed| placed.get(&layer))
            .copied()
    }

    /// Layers `entity` is currently placed on.
    pub fn placed_layers(&self, entity: EntityId) -> Vec<LayerKind> {
        self.placements
            .get(entity)
            .map(|placed| placed.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of entities placed on at least one layer.
    pub fn entity_count(&self) -> usize {
        self.placements.len()
    }

    // -----------------------------------------------------------------------
    // Inbound events
    // -----------------------------------------------------------------------

    /// React to a notification from the entity store.
    pub fn handle_inbound(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::EntityCreated {
                entity,
                position: Some(pos),
            } => {
                let layer = self.config.default_layer;
                self.place_entity(entity, pos.x, pos.y, layer);
            }
            InboundEvent::EntityCreated { position: None, .. } => {}
            InboundEvent::EntityDestroyed { entity } => {
                let placed: Vec<(LayerKind, TileCoord)> = self
                    .placements
                    .get(entity)
                    .map(|placed| placed.iter().map(|(&l, &t)| (l, t)).collect())
                    .unwrap_or_default();
                for (layer, tile) in placed {
                    self.detach(entity, layer, tile);
                }
                self.positions.clear_position(entity);
                self.cache.clear();
            }
            InboundEvent::PositionUpdated { entity, x, y } => {
                let layers = self.placed_layers(entity);
                if layers.is_empty() {
                    tracing::trace!(?entity, "position update for unplaced entity ignored");
                    return;
                }
                for layer in layers {
                    self.move_entity(entity, x, y, layer);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Residents of one tile, on one layer or all of them. Read straight
    /// from the tile; not cached.
    pub fn entities_at_tile(&self, x: i32, y: i32, layer: Option<LayerKind>) -> BTreeSet<EntityId> {
        self.tile(x, y)
            .map(|tile| tile.entities(layer))
            .unwrap_or_default()
    }

    /// Entities within `radius` of `(cx, cy)`, optionally restricted to one
    /// layer.
    pub fn entities_in_radius(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        layer: Option<LayerKind>,
    ) -> BTreeSet<EntityId> {
        let key = QueryKey::radius(cx, cy, radius, layer);
        self.cached_query(key, |index, lookup| index.query_radius(cx, cy, radius, lookup))
    }

    /// Entities inside the half-open rectangle `[x, x + width) x [y, y + height)`,
    /// optionally restricted to one layer.
    pub fn entities_in_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        layer: Option<LayerKind>,
    ) -> BTreeSet<EntityId> {
        let key = QueryKey::rect(x, y, width, height, layer);
        let rect = Rect::new(x, y, width, height);
        self.cached_query(key, |index, lookup| index.query_rect(rect, lookup))
    }

    fn cached_query(
        &mut self,
        key: QueryKey,
        run: impl FnOnce(&QuadTree, &dyn PositionLookup) -> BTreeSet<EntityId>,
    ) -> BTreeSet<EntityId> {
        let now = self.clock.now();
        self.stats.queries += 1;
        if let Some(hit) = self.cache.get(&key, now) {
            tracing::trace!(?key, "query cache hit");
            return hit;
        }
        tracing::trace!(?key, "query cache miss");

        let started = Instant::now();
        let result = match key.layer() {
            Some(layer) => self
                .layer_indices
                .get(&layer)
                .map(|index| run(index, &self.positions))
                .unwrap_or_default(),
            None => run(&self.global_index, &self.positions),
        };
        self.stats.record_query(started.elapsed());
        self.cache.insert(key, result.clone(), now);
        result
    }

    /// Drop every cached query result.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn global_index(&self) -> &QuadTree {
        &self.global_index
    }

    pub fn layer_index(&self, layer: LayerKind) -> Option<&QuadTree> {
        self.layer_indices.get(&layer)
    }

    // -----------------------------------------------------------------------
    // Pathfinding
    // -----------------------------------------------------------------------

    /// Tiles from start (exclusive) to goal (inclusive). Empty if there is no
    /// path, the search budget ran out, or start and goal coincide.
    pub fn find_path(&mut self, start_x: i32, start_y: i32, end_x: i32, end_y: i32) -> Vec<TileCoord> {
        self.find_path_detailed(TileCoord::new(start_x, start_y), TileCoord::new(end_x, end_y))
            .path
    }

    /// [`find_path`](Self::find_path) with cost, expansion count and outcome.
    pub fn find_path_detailed(&mut self, start: TileCoord, goal: TileCoord) -> PathResult {
        let regions = &self.regions;
        let size = self.config.region_size;
        let result = pathfinding::find_path(start, goal, self.config.max_path_expansions, |coord| {
            regions
                .get(&RegionCoord::of(coord, size))
                .and_then(|region| region.get_tile(coord))
                .filter(|tile| tile.is_passable())
                .map(Tile::movement_cost)
        });

        self.stats.paths_requested += 1;
        self.stats.path_nodes_expanded += result.expanded as u64;
        if result.is_found() {
            self.stats.paths_found += 1;
        }
        result
    }

    // -----------------------------------------------------------------------
    // World size
    // -----------------------------------------------------------------------

    /// Grow the nominal world size to at least `new_width x new_height` and
    /// resize the global and layer indices to match. Never shrinks.
    pub fn expand_grid(&mut self, new_width: u32, new_height: u32) {
        self.width = self.width.max(new_width);
        self.height = self.height.max(new_height);
        let (w, h) = (f64::from(self.width), f64::from(self.height));

        self.global_index.resize(w, h, &self.positions);
        for index in self.layer_indices.values_mut() {
            index.resize(w, h, &self.positions);
        }
        self.cache.clear();

        tracing::debug!(width = self.width, height = self.height, "grid expanded");
        self.notifier.publish(
            GridEvent::GridExpanded {
                width: self.width,
                height: self.height,
            },
            EventPriority::High,
        );
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    /// Re-insert entities stranded in any index whose positions resolve
    /// again. Returns how many were recovered.
    pub fn retry_stranded(&mut self) -> usize {
        let lookup = &self.positions;
        let mut recovered = self.global_index.retry_stranded(lookup);
        for index in self.layer_indices.values_mut() {
            recovered += index.retry_stranded(lookup);
        }
        for region in self.regions.values_mut() {
            recovered += region.index_mut().retry_stranded(lookup);
        }
        if recovered > 0 {
            self.cache.clear();
        }
        recovered
    }

    pub fn positions(&self) -> &S {
        &self.positions
    }

    /// Mutable access to the position store. Clears the query cache, since
    /// any position may change through it.
    pub fn positions_mut(&mut self) -> &mut S {
        self.cache.clear();
        &mut self.positions
    }

    pub fn dirty_tracker(&self) -> &DirtyTracker {
        &self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty.mark_clean();
    }

    /// Current statistics, with structural counts filled in.
    pub fn stats(&self) -> GridStats {
        let stranded = self.global_index.stranded().len()
            + self
                .layer_indices
                .values()
                .map(|index| index.stranded().len())
                .sum::<usize>()
            + self
                .regions
                .values()
                .map(|region| region.index().stranded().len())
                .sum::<usize>();
        GridStats {
            tiles: self.tile_count,
            regions: self.regions.len(),
            active_regions: self.active.len(),
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
            stranded,
            ..self.stats.clone()
        }
    }
}

/// Checks a placement target, logging what is wrong with it. Only
/// non-finite positions are refused.
fn placeable(entity: EntityId, x: f64, y: f64, layer: LayerKind) -> bool {
    if !(x.is_finite() && y.is_finite()) {
        tracing::warn!(?entity, x, y, %layer, "non-finite placement ignored");
        return false;
    }
    if !TileCoord::in_tile_range(x, y) {
        tracing::warn!(?entity, x, y, %layer, "placement outside the tile range, using the edge tile");
    }
    true
}

fn to_region_axis(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// The region at `coord`, created inactive if missing.
fn region_entry<'a>(
    regions: &'a mut BTreeMap<RegionCoord, Region>,
    config: &GridConfig,
    coord: RegionCoord,
) -> &'a mut Region {
    regions.entry(coord).or_insert_with(|| {
        tracing::debug!(?coord, "region created");
        Region::new(
            coord,
            config.region_size,
            config.region_index,
            config.region_update_hz,
        )
    })
}

// ===========================================================================
// Tests
// ===========================================================================
