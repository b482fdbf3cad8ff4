//! A single grid tile: layered attribute records, resident entities per
//! layer, and the scalar properties pathfinding reads.

use acreage_core::id::{EntityId, TileCoord};
use acreage_core::layer::{AttrValue, Extras, LayerKind, LayerRecord};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};

/// Tiles with accessibility below this are impassable.
pub const MIN_ACCESSIBILITY: f64 = 0.1;

/// The scalar traversal properties of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Traversal {
    pub elevation: f64,
    /// In `[0, 1]`; 0 is impassable.
    pub accessibility: f64,
    /// Multiplier applied to the cost of stepping onto the tile. Never negative.
    pub movement_cost: f64,
}

impl Default for Traversal {
    fn default() -> Self {
        Self {
            elevation: 0.0,
            accessibility: 1.0,
            movement_cost: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tile {
    coord: TileCoord,
    layers: BTreeMap<LayerKind, LayerRecord>,
    entities: BTreeMap<LayerKind, BTreeSet<EntityId>>,
    traversal: Traversal,
    dirty_layers: BTreeSet<LayerKind>,
    /// Bumped on every modification.
    revision: u64,
    /// Flattened `extra` maps of all layers; rebuilt on demand after edits.
    attributes: OnceCell<Extras>,
}

impl Tile {
    pub fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            layers: BTreeMap::new(),
            entities: BTreeMap::new(),
            traversal: Traversal::default(),
            dirty_layers: BTreeSet::new(),
            revision: 0,
            attributes: OnceCell::new(),
        }
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    pub fn x(&self) -> i32 {
        self.coord.x
    }

    pub fn y(&self) -> i32 {
        self.coord.y
    }

    // -- Layer data --

    /// The layer's record, or an empty record of that kind if never set.
    pub fn get_layer(&self, layer: LayerKind) -> LayerRecord {
        self.layers
            .get(&layer)
            .cloned()
            .unwrap_or_else(|| LayerRecord::empty(layer))
    }

    /// Borrow the layer's record if one has been set.
    pub fn layer(&self, layer: LayerKind) -> Option<&LayerRecord> {
        self.layers.get(&layer)
    }

    /// Replace a layer's record wholesale. The layer is the record's kind.
    pub fn set_layer(&mut self, record: LayerRecord) {
        let layer = record.kind();
        self.layers.insert(layer, record);
        self.touch(layer);
    }

    /// Merge `partial` into the existing record of its kind, creating the
    /// layer if absent.
    pub fn update_layer(&mut self, partial: LayerRecord) {
        let layer = partial.kind();
        self.layers
            .entry(layer)
            .or_insert_with(|| LayerRecord::empty(layer))
            .merge(partial);
        self.touch(layer);
    }

    /// Layers that carry a record.
    pub fn populated_layers(&self) -> impl Iterator<Item = LayerKind> + '_ {
        self.layers.keys().copied()
    }

    /// Look up an `extra` attribute across all layers. When several layers
    /// define the same key, the later layer in [`LayerKind::ALL`] wins.
    pub fn attribute(&self, key: &str) -> Option<&AttrValue> {
        self.attributes
            .get_or_init(|| {
                let mut flat = Extras::new();
                for record in self.layers.values() {
                    flat.extend(record.extra().iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                flat
            })
            .get(key)
    }

    fn touch(&mut self, layer: LayerKind) {
        self.dirty_layers.insert(layer);
        self.revision += 1;
        self.attributes.take();
    }

    // -- Entities --

    pub fn add_entity(&mut self, entity: EntityId, layer: LayerKind) {
        self.entities.entry(layer).or_default().insert(entity);
        self.revision += 1;
    }

    /// Remove an entity from a layer. Removing the last entity drops the
    /// layer's set; removing an absent entity is a no-op that returns `false`.
    pub fn remove_entity(&mut self, entity: EntityId, layer: LayerKind) -> bool {
        let Some(set) = self.entities.get_mut(&layer) else {
            return false;
        };
        let removed = set.remove(&entity);
        if set.is_empty() {
            self.entities.remove(&layer);
        }
        if removed {
            self.revision += 1;
        }
        removed
    }

    /// A copy of one layer's residents, or the union over all layers.
    pub fn entities(&self, layer: Option<LayerKind>) -> BTreeSet<EntityId> {
        match layer {
            Some(layer) => self.entities.get(&layer).cloned().unwrap_or_default(),
            None => self.entities.values().flatten().copied().collect(),
        }
    }

    pub fn has_entity(&self, entity: EntityId, layer: LayerKind) -> bool {
        self.entities
            .get(&layer)
            .is_some_and(|set| set.contains(&entity))
    }

    /// Layers with at least one resident entity.
    pub fn occupied_layers(&self) -> impl Iterator<Item = LayerKind> + '_ {
        self.entities.keys().copied()
    }

    // -- Traversal --

    pub fn traversal(&self) -> Traversal {
        self.traversal
    }

    pub fn elevation(&self) -> f64 {
        self.traversal.elevation
    }

    pub fn accessibility(&self) -> f64 {
        self.traversal.accessibility
    }

    pub fn movement_cost(&self) -> f64 {
        self.traversal.movement_cost
    }

    /// Set all traversal properties. Accessibility is clamped to `[0, 1]`
    /// and movement cost to `>= 0`; NaN maps to 0.
    pub fn set_traversal(&mut self, traversal: Traversal) {
        self.traversal = Traversal {
            elevation: traversal.elevation,
            accessibility: traversal.accessibility.max(0.0).min(1.0),
            movement_cost: traversal.movement_cost.max(0.0),
        };
        self.revision += 1;
    }

    pub fn set_elevation(&mut self, elevation: f64) {
        let traversal = Traversal {
            elevation,
            ..self.traversal
        };
        self.set_traversal(traversal);
    }

    pub fn set_accessibility(&mut self, accessibility: f64) {
        let traversal = Traversal {
            accessibility,
            ..self.traversal
        };
        self.set_traversal(traversal);
    }

    pub fn set_movement_cost(&mut self, movement_cost: f64) {
        let traversal = Traversal {
            movement_cost,
            ..self.traversal
        };
        self.set_traversal(traversal);
    }

    pub fn is_passable(&self) -> bool {
        self.traversal.accessibility >= MIN_ACCESSIBILITY
    }

    // -- Change tracking --

    pub fn dirty_layers(&self) -> &BTreeSet<LayerKind> {
        &self.dirty_layers
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty_layers.is_empty()
    }

    pub fn clear_dirty(&mut self) {
        self.dirty_layers.clear();
    }

    /// Monotonic modification counter; compare against a previously seen
    /// value to tell whether the tile changed.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acreage_core::layer::{CropData, SoilData, TerrainData};
    use acreage_core::test_utils::make_entities;

    fn tile() -> Tile {
        Tile::new(TileCoord::new(4, 2))
    }

    #[test]
    fn unset_layer_is_empty_record() {
        let t = tile();
        assert_eq!(t.get_layer(LayerKind::Soil), LayerRecord::empty(LayerKind::Soil));
        assert!(t.layer(LayerKind::Soil).is_none());
        assert!(!t.is_dirty());
    }

    #[test]
    fn set_layer_round_trip() {
        let mut t = tile();
        let record = LayerRecord::Terrain(TerrainData {
            surface: Some("clay".into()),
            roughness: Some(0.3),
            ..Default::default()
        });
        t.set_layer(record.clone());

        assert_eq!(t.get_layer(LayerKind::Terrain), record);
        assert!(t.dirty_layers().contains(&LayerKind::Terrain));
        assert_eq!(t.revision(), 1);
    }

    #[test]
    fn update_layer_merges_and_creates() {
        let mut t = tile();
        t.update_layer(LayerRecord::Soil(SoilData {
            moisture: Some(0.2),
            ..Default::default()
        }));
        t.update_layer(LayerRecord::Soil(SoilData {
            ph: Some(7.1),
            ..Default::default()
        }));

        assert_eq!(
            t.get_layer(LayerKind::Soil),
            LayerRecord::Soil(SoilData {
                moisture: Some(0.2),
                ph: Some(7.1),
                ..Default::default()
            })
        );
        assert_eq!(t.revision(), 2);
    }

    #[test]
    fn attribute_cache_invalidated_by_edits() {
        let mut t = tile();
        let mut soil = SoilData::default();
        soil.extra.insert("irrigated".into(), AttrValue::Bool(false));
        t.set_layer(LayerRecord::Soil(soil));
        assert_eq!(t.attribute("irrigated"), Some(&AttrValue::Bool(false)));

        let mut patch = SoilData::default();
        patch.extra.insert("irrigated".into(), AttrValue::Bool(true));
        t.update_layer(LayerRecord::Soil(patch));
        assert_eq!(t.attribute("irrigated"), Some(&AttrValue::Bool(true)));
        assert_eq!(t.attribute("missing"), None);
    }

    #[test]
    fn later_layer_wins_attribute_conflicts() {
        let mut t = tile();
        let mut terrain = TerrainData::default();
        terrain.extra.insert("owner".into(), "county".into());
        let mut crops = CropData::default();
        crops.extra.insert("owner".into(), "farmer".into());
        t.set_layer(LayerRecord::Crops(crops));
        t.set_layer(LayerRecord::Terrain(terrain));

        assert_eq!(t.attribute("owner"), Some(&AttrValue::Text("farmer".into())));
    }

    #[test]
    fn removing_last_entity_drops_layer_set() {
        let (_sm, ids) = make_entities(2);
        let mut t = tile();
        t.add_entity(ids[0], LayerKind::Crops);
        t.add_entity(ids[1], LayerKind::Crops);

        assert!(t.remove_entity(ids[0], LayerKind::Crops));
        assert_eq!(t.occupied_layers().collect::<Vec<_>>(), vec![LayerKind::Crops]);
        assert!(t.remove_entity(ids[1], LayerKind::Crops));
        assert_eq!(t.occupied_layers().count(), 0);
        assert!(t.entities(None).is_empty());
    }

    #[test]
    fn remove_absent_entity_is_noop() {
        let (_sm, ids) = make_entities(1);
        let mut t = tile();
        assert!(!t.remove_entity(ids[0], LayerKind::Equipment));
        t.add_entity(ids[0], LayerKind::Equipment);
        assert!(!t.remove_entity(ids[0], LayerKind::Crops));
        assert!(t.has_entity(ids[0], LayerKind::Equipment));
    }

    #[test]
    fn entities_union_and_copy() {
        let (_sm, ids) = make_entities(3);
        let mut t = tile();
        t.add_entity(ids[0], LayerKind::Crops);
        t.add_entity(ids[1], LayerKind::Equipment);
        t.add_entity(ids[2], LayerKind::Equipment);

        assert_eq!(t.entities(Some(LayerKind::Crops)).len(), 1);
        assert_eq!(t.entities(Some(LayerKind::Equipment)).len(), 2);
        assert_eq!(t.entities(None).len(), 3);

        let mut copy = t.entities(None);
        copy.clear();
        assert_eq!(t.entities(None).len(), 3);
    }

    #[test]
    fn traversal_is_clamped() {
        let mut t = tile();
        assert!(t.is_passable());

        t.set_accessibility(1.7);
        assert_eq!(t.accessibility(), 1.0);
        t.set_accessibility(0.05);
        assert!(!t.is_passable());
        t.set_accessibility(f64::NAN);
        assert_eq!(t.accessibility(), 0.0);

        t.set_movement_cost(-3.0);
        assert_eq!(t.movement_cost(), 0.0);
        t.set_elevation(12.5);
        assert_eq!(t.elevation(), 12.5);
    }

    #[test]
    fn clear_dirty_keeps_revision() {
        let mut t = tile();
        t.set_layer(LayerRecord::empty(LayerKind::Navigation));
        let rev = t.revision();
        t.clear_dirty();
        assert!(!t.is_dirty());
        assert_eq!(t.revision(), rev);
    }
}
