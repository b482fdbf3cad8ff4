//! Semantic tile layers and their typed attribute records.
//!
//! Each tile carries one [`LayerRecord`] per [`LayerKind`]. Records are
//! tagged unions of per-layer structs whose fields are all optional, so a
//! record can express both a full value and a partial update. Every struct
//! also carries an `extra` map for metadata without a dedicated field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Layer kinds
// ---------------------------------------------------------------------------

/// An independent semantic channel of tile data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Terrain,
    Soil,
    Crops,
    Buildings,
    Infrastructure,
    Equipment,
    Environmental,
    Navigation,
}

impl LayerKind {
    /// All layers, in declaration order.
    pub const ALL: [LayerKind; 8] = [
        LayerKind::Terrain,
        LayerKind::Soil,
        LayerKind::Crops,
        LayerKind::Buildings,
        LayerKind::Infrastructure,
        LayerKind::Equipment,
        LayerKind::Environmental,
        LayerKind::Navigation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Terrain => "terrain",
            LayerKind::Soil => "soil",
            LayerKind::Crops => "crops",
            LayerKind::Buildings => "buildings",
            LayerKind::Infrastructure => "infrastructure",
            LayerKind::Equipment => "equipment",
            LayerKind::Environmental => "environmental",
            LayerKind::Navigation => "navigation",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Attribute values
// ---------------------------------------------------------------------------

/// A loosely typed metadata value stored in a record's `extra` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

/// Free-form metadata attached to a record.
pub type Extras = BTreeMap<String, AttrValue>;

fn patch<T>(dst: &mut Option<T>, src: Option<T>) {
    if src.is_some() {
        *dst = src;
    }
}

// ---------------------------------------------------------------------------
// Per-layer records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainData {
    pub surface: Option<String>,
    pub roughness: Option<f64>,
    pub extra: Extras,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilData {
    pub moisture: Option<f64>,
    pub nitrogen: Option<f64>,
    pub ph: Option<f64>,
    pub extra: Extras,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropData {
    pub crop: Option<String>,
    pub growth_stage: Option<u32>,
    pub health: Option<f64>,
    pub extra: Extras,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingData {
    pub building: Option<String>,
    pub blocks_movement: Option<bool>,
    pub extra: Extras,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfrastructureData {
    pub kind: Option<String>,
    pub speed_bonus: Option<f64>,
    pub extra: Extras,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentData {
    pub equipment: Option<String>,
    pub condition: Option<f64>,
    pub extra: Extras,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentalData {
    pub temperature: Option<f64>,
    pub rainfall: Option<f64>,
    pub extra: Extras,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationData {
    pub waypoint: Option<String>,
    pub restricted: Option<bool>,
    pub extra: Extras,
}

// ---------------------------------------------------------------------------
// LayerRecord
// ---------------------------------------------------------------------------

/// The attribute record stored for one layer of one tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum LayerRecord {
    Terrain(TerrainData),
    Soil(SoilData),
    Crops(CropData),
    Buildings(BuildingData),
    Infrastructure(InfrastructureData),
    Equipment(EquipmentData),
    Environmental(EnvironmentalData),
    Navigation(NavigationData),
}

impl LayerRecord {
    /// A record of the given kind with every field unset.
    pub fn empty(kind: LayerKind) -> Self {
        match kind {
            LayerKind::Terrain => LayerRecord::Terrain(TerrainData::default()),
            LayerKind::Soil => LayerRecord::Soil(SoilData::default()),
            LayerKind::Crops => LayerRecord::Crops(CropData::default()),
            LayerKind::Buildings => LayerRecord::Buildings(BuildingData::default()),
            LayerKind::Infrastructure => {
                LayerRecord::Infrastructure(InfrastructureData::default())
            }
            LayerKind::Equipment => LayerRecord::Equipment(EquipmentData::default()),
            LayerKind::Environmental => LayerRecord::Environmental(EnvironmentalData::default()),
            LayerKind::Navigation => LayerRecord::Navigation(NavigationData::default()),
        }
    }

    pub fn kind(&self) -> LayerKind {
        match self {
            LayerRecord::Terrain(_) => LayerKind::Terrain,
            LayerRecord::Soil(_) => LayerKind::Soil,
            LayerRecord::Crops(_) => LayerKind::Crops,
            LayerRecord::Buildings(_) => LayerKind::Buildings,
            LayerRecord::Infrastructure(_) => LayerKind::Infrastructure,
            LayerRecord::Equipment(_) => LayerKind::Equipment,
            LayerRecord::Environmental(_) => LayerKind::Environmental,
            LayerRecord::Navigation(_) => LayerKind::Navigation,
        }
    }

    /// Returns `true` if no field and no extra attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == LayerRecord::empty(self.kind())
    }

    /// The record's free-form metadata.
    pub fn extra(&self) -> &Extras {
        match self {
            LayerRecord::Terrain(d) => &d.extra,
            LayerRecord::Soil(d) => &d.extra,
            LayerRecord::Crops(d) => &d.extra,
            LayerRecord::Buildings(d) => &d.extra,
            LayerRecord::Infrastructure(d) => &d.extra,
            LayerRecord::Equipment(d) => &d.extra,
            LayerRecord::Environmental(d) => &d.extra,
            LayerRecord::Navigation(d) => &d.extra,
        }
    }

    /// Merge `partial` into this record: fields set in `partial` overwrite,
    /// unset fields are kept, and extras are upserted. A partial of a
    /// different kind replaces the record wholesale.
    pub fn merge(&mut self, partial: LayerRecord) {
        match (self, partial) {
            (LayerRecord::Terrain(d), LayerRecord::Terrain(p)) => {
                patch(&mut d.surface, p.surface);
                patch(&mut d.roughness, p.roughness);
                d.extra.extend(p.extra);
            }
            (LayerRecord::Soil(d), LayerRecord::Soil(p)) => {
                patch(&mut d.moisture, p.moisture);
                patch(&mut d.nitrogen, p.nitrogen);
                patch(&mut d.ph, p.ph);
                d.extra.extend(p.extra);
            }
            (LayerRecord::Crops(d), LayerRecord::Crops(p)) => {
                patch(&mut d.crop, p.crop);
                patch(&mut d.growth_stage, p.growth_stage);
                patch(&mut d.health, p.health);
                d.extra.extend(p.extra);
            }
            (LayerRecord::Buildings(d), LayerRecord::Buildings(p)) => {
                patch(&mut d.building, p.building);
                patch(&mut d.blocks_movement, p.blocks_movement);
                d.extra.extend(p.extra);
            }
            (LayerRecord::Infrastructure(d), LayerRecord::Infrastructure(p)) => {
                patch(&mut d.kind, p.kind);
                patch(&mut d.speed_bonus, p.speed_bonus);
                d.extra.extend(p.extra);
            }
            (LayerRecord::Equipment(d), LayerRecord::Equipment(p)) => {
                patch(&mut d.equipment, p.equipment);
                patch(&mut d.condition, p.condition);
                d.extra.extend(p.extra);
            }
            (LayerRecord::Environmental(d), LayerRecord::Environmental(p)) => {
                patch(&mut d.temperature, p.temperature);
                patch(&mut d.rainfall, p.rainfall);
                d.extra.extend(p.extra);
            }
            (LayerRecord::Navigation(d), LayerRecord::Navigation(p)) => {
                patch(&mut d.waypoint, p.waypoint);
                patch(&mut d.restricted, p.restricted);
                d.extra.extend(p.extra);
            }
            (this, other) => *this = other,
        }
    }
}
