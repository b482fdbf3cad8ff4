//! Construction-time configuration for the grid engine.
//!
//! Every field has a documented default and `#[serde(default)]` is applied,
//! so a config file only needs to name what it changes. Values are fixed
//! once an engine is built.

use crate::layer::LayerKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Errors from [`GridConfig::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("region_size must be positive, got {0}")]
    RegionSize(i32),
    #[error("{index} index must allow at least one entity per node")]
    IndexCapacity { index: &'static str },
    #[error("region_update_hz must be finite and positive, got {0}")]
    UpdateRate(f64),
    #[error("max_path_expansions must be at least 1")]
    PathBudget,
    #[error("world size must be at least 1x1, got {width}x{height}")]
    WorldSize { width: u32, height: u32 },
}

/// Subdivision thresholds for one quadtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexLimits {
    /// Entities a leaf may hold before it splits.
    pub max_entities: usize,
    /// Depth at which leaves stop splitting and accept any number of entities.
    pub max_depth: u8,
}

impl IndexLimits {
    pub const fn new(max_entities: usize, max_depth: u8) -> Self {
        Self {
            max_entities,
            max_depth,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Nominal world width in tiles. Sizes the global and per-layer indices;
    /// not a hard limit on tile coordinates.
    pub width: u32,
    /// Nominal world height in tiles.
    pub height: u32,
    /// Tiles per region edge.
    pub region_size: i32,
    /// How long a cached query result stays valid.
    pub cache_ttl_ms: u64,
    pub global_index: IndexLimits,
    pub layer_index: IndexLimits,
    pub region_index: IndexLimits,
    /// Node expansions after which `find_path` gives up.
    pub max_path_expansions: usize,
    /// Layer used when an inbound entity-created event places an entity.
    pub default_layer: LayerKind,
    /// Processing rate for active regions.
    pub region_update_hz: f64,
    /// Regions either side of the center region, per axis, that one
    /// `set_active_region` call may activate.
    pub max_active_reach: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            region_size: 16,
            cache_ttl_ms: 100,
            global_index: IndexLimits::new(16, 8),
            layer_index: IndexLimits::new(16, 6),
            region_index: IndexLimits::new(8, 4),
            max_path_expansions: 10_000,
            default_layer: LayerKind::Terrain,
            region_update_hz: 1.0,
            max_active_reach: 64,
        }
    }
}

impl GridConfig {
    /// Default configuration for a world of the given nominal size.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Check the values an engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::WorldSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.region_size <= 0 {
            return Err(ConfigError::RegionSize(self.region_size));
        }
        for (index, limits) in [
            ("global", self.global_index),
            ("layer", self.layer_index),
            ("region", self.region_index),
        ] {
            if limits.max_entities == 0 {
                return Err(ConfigError::IndexCapacity { index });
            }
        }
        if !self.region_update_hz.is_finite() || self.region_update_hz <= 0.0 {
            return Err(ConfigError::UpdateRate(self.region_update_hz));
        }
        if self.max_path_expansions == 0 {
            return Err(ConfigError::PathBudget);
        }
        Ok(())
    }
}
