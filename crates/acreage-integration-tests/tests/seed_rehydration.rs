//! Loading a world directory from disk and rehydrating an engine from it.

use acreage_core::id::EntityId;
use acreage_core::layer::{LayerKind, LayerRecord};
use acreage_data::{apply_seed, load_world, DataLoadError};
use acreage_spatial::GridEngine;
use slotmap::SlotMap;
use std::fs;
use std::path::{Path, PathBuf};

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "acreage_integration_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn cleanup(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}

const GRID_TOML: &str = r#"
width = 40
height = 40
region_size = 8
default_layer = "crops"
"#;

const WORLD_JSON: &str = r#"{
    "tiles": [
        {"x": 0, "y": 0, "layers": [{"layer": "terrain", "surface": "clay"}]},
        {"x": 1, "y": 0},
        {"x": 2, "y": 0, "traversal": {"accessibility": 0.0}},
        {"x": 1, "y": 1},
        {"x": 2, "y": 1},
        {"x": 3, "y": 0},
        {"x": 9, "y": 9, "layers": [
            {"layer": "soil", "moisture": 0.25, "ph": 6.8},
            {"layer": "crops", "crop": "maize", "growth_stage": 3}
        ]}
    ],
    "entities": [
        {"name": "maize_1", "x": 9.5, "y": 9.5},
        {"name": "pump", "x": 9.1, "y": 9.9, "layers": ["infrastructure"]},
        {"name": "rover", "x": 0.5, "y": 0.5, "layers": ["equipment", "navigation"]}
    ]
}"#;

#[test]
fn rehydrated_world_answers_queries() {
    let dir = make_test_dir("rehydrate");
    fs::write(dir.join("grid.toml"), GRID_TOML).unwrap();
    fs::write(dir.join("world.json"), WORLD_JSON).unwrap();

    let world = load_world(&dir).unwrap();
    let mut engine = GridEngine::from_config(world.config).unwrap();
    let mut store: SlotMap<EntityId, String> = SlotMap::with_key();
    let report = apply_seed(&mut engine, &world.seed, &mut store);

    assert_eq!(report.tiles, 7);
    assert_eq!(report.placements, 4);
    assert_eq!(engine.config().region_size, 8);

    // Default layer from the config file.
    let maize = report.entities["maize_1"];
    assert_eq!(engine.placed_layers(maize), vec![LayerKind::Crops]);

    // Both entities share tile (9, 9), which sits in region (1, 1).
    let on_tile = engine.entities_at_tile(9, 9, None);
    assert_eq!(on_tile.len(), 2);
    assert!(engine.region(acreage_core::id::RegionCoord::new(1, 1)).is_some());

    let tile = engine.tile(9, 9).unwrap();
    assert_eq!(tile.populated_layers().count(), 2);
    let LayerRecord::Soil(soil) = tile.get_layer(LayerKind::Soil) else {
        panic!("soil layer has wrong kind");
    };
    assert_eq!(soil.ph, Some(6.8));

    let near_rover = engine.entities_in_radius(0.5, 0.5, 0.5, Some(LayerKind::Navigation));
    assert!(near_rover.contains(&report.entities["rover"]));

    // (2, 0) is blocked, so the rover detours through row 1.
    let path = engine.find_path(0, 0, 3, 0);
    assert!(!path.is_empty());
    assert!(path.iter().all(|c| !(c.x == 2 && c.y == 0)));
    assert_eq!(path.last().map(|c| (c.x, c.y)), Some((3, 0)));

    cleanup(&dir);
}

#[test]
fn invalid_config_surfaces_as_error() {
    let dir = make_test_dir("invalid_config");
    fs::write(dir.join("grid.ron"), "(region_update_hz: 0.0)").unwrap();
    fs::write(dir.join("world.json"), "{}").unwrap();

    let err = load_world(&dir).unwrap_err();
    assert!(matches!(err, DataLoadError::InvalidConfig { .. }));
    assert!(err.to_string().contains("region_update_hz"));

    cleanup(&dir);
}
