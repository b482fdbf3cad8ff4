//! Rehydrating an engine from a [`WorldSeed`].
//!
//! Everything goes through the engine's public mutation API, so the result
//! is indistinguishable from a world built call by call: tiles, regions,
//! indices, dirty tracking and notifications all follow.

use crate::schema::WorldSeed;
use acreage_core::id::EntityId;
use acreage_core::event::Notifier;
use acreage_core::position::PositionStore;
use acreage_spatial::GridEngine;
use slotmap::SlotMap;
use std::collections::BTreeMap;

/// What [`apply_seed`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedReport {
    /// Id minted for each seed entity, by name.
    pub entities: BTreeMap<String, EntityId>,
    /// Tiles touched by the seed's tile section.
    pub tiles: usize,
    /// Layer records written.
    pub layer_records: usize,
    /// Entity placements made (one per entity per layer).
    pub placements: usize,
}

/// Apply `seed` to `engine`, minting entity ids in `store`. The store keeps
/// each entity's seed name as its value. If names repeat, every entity is
/// still placed but the report maps the name to the last one.
pub fn apply_seed<S: PositionStore, N: Notifier>(
    engine: &mut GridEngine<S, N>,
    seed: &WorldSeed,
    store: &mut SlotMap<EntityId, String>,
) -> SeedReport {
    let mut report = SeedReport::default();

    for tile in &seed.tiles {
        engine.get_or_create_tile(tile.x, tile.y);
        if let Some(traversal) = tile.traversal {
            engine.set_tile_traversal(tile.x, tile.y, traversal);
        }
        for record in &tile.layers {
            engine.set_tile_layer(tile.x, tile.y, record.clone());
            report.layer_records += 1;
        }
        report.tiles += 1;
    }

    let default_layer = engine.config().default_layer;
    for entity in &seed.entities {
        let id = store.insert(entity.name.clone());
        if entity.layers.is_empty() {
            engine.place_entity(id, entity.x, entity.y, default_layer);
            report.placements += 1;
        }
        for &layer in &entity.layers {
            engine.place_entity(id, entity.x, entity.y, layer);
            report.placements += 1;
        }
        report.entities.insert(entity.name.clone(), id);
    }

    tracing::debug!(
        tiles = report.tiles,
        entities = report.entities.len(),
        placements = report.placements,
        "world seed applied"
    );
    report
}
