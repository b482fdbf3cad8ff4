//! Serde data-file schema for world seeds.
//!
//! A seed describes tiles (traversal values and layer records) and named
//! entities (position and layers). Entities are referred to by name in the
//! file; ids are minted when the seed is applied.

use acreage_core::layer::{LayerKind, LayerRecord};
use acreage_spatial::tile::Traversal;
use serde::{Deserialize, Serialize};

/// Top-level seed file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSeed {
    pub tiles: Vec<TileSeed>,
    pub entities: Vec<EntitySeed>,
}

/// One tile's initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSeed {
    pub x: i32,
    pub y: i32,
    /// Left at the defaults when absent.
    #[serde(default)]
    pub traversal: Option<Traversal>,
    #[serde(default)]
    pub layers: Vec<LayerRecord>,
}

/// A named entity and where it starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySeed {
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// Layers to place the entity on. Empty means the engine's default layer.
    #[serde(default)]
    pub layers: Vec<LayerKind>,
}

impl WorldSeed {
    /// Names used by more than one entity, in file order of their second use.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = std::collections::BTreeSet::new();
        self.entities
            .iter()
            .filter(|e| !seen.insert(e.name.as_str()))
            .map(|e| e.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acreage_core::layer::SoilData;

    #[test]
    fn json_seed_with_defaults() {
        let json = r#"{
            "tiles": [
                {"x": 1, "y": 2, "layers": [{"layer": "soil", "moisture": 0.3}]},
                {"x": 3, "y": 3, "traversal": {"accessibility": 0.0}}
            ],
            "entities": [{"name": "tractor", "x": 1.5, "y": 2.5}]
        }"#;
        let seed: WorldSeed = serde_json::from_str(json).unwrap();

        assert_eq!(seed.tiles.len(), 2);
        assert_eq!(
            seed.tiles[0].layers,
            vec![LayerRecord::Soil(SoilData {
                moisture: Some(0.3),
                ..SoilData::default()
            })]
        );
        let blocked = seed.tiles[1].traversal.unwrap();
        assert_eq!(blocked.accessibility, 0.0);
        assert_eq!(blocked.movement_cost, 1.0);
        assert!(seed.entities[0].layers.is_empty());
    }

    #[test]
    fn empty_document_is_empty_seed() {
        let seed: WorldSeed = serde_json::from_str("{}").unwrap();
        assert_eq!(seed, WorldSeed::default());
    }

    #[test]
    fn duplicate_names_are_reported() {
        let entity = |name: &str| EntitySeed {
            name: name.to_string(),
            x: 0.0,
            y: 0.0,
            layers: Vec::new(),
        };
        let seed = WorldSeed {
            tiles: Vec::new(),
            entities: vec![entity("a"), entity("b"), entity("a")],
        };
        assert_eq!(seed.duplicate_names(), vec!["a"]);
    }
}
