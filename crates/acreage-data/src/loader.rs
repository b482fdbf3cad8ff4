//! Reading configuration and seed files.
//!
//! A world directory holds an optional `grid` config and a required `world`
//! seed, each written in exactly one of RON, TOML or JSON.

use crate::schema::WorldSeed;
use acreage_core::config::{ConfigError, GridConfig};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Base name of the optional engine configuration file in a world directory.
pub const CONFIG_FILE: &str = "grid";
/// Base name of the required seed file in a world directory.
pub const SEED_FILE: &str = "world";

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The directory has no `world.{ron,toml,json}`.
    #[error("no {stem}.ron, {stem}.toml or {stem}.json in {dir}")]
    MissingSeed { stem: &'static str, dir: PathBuf },

    /// The extension is not one of `ron`, `toml`, `json`.
    #[error("{file} is not a .ron, .toml or .json file")]
    UnsupportedFormat { file: PathBuf },

    /// More than one format exists for the same file stem.
    #[error("{stem} exists in more than one format in {dir}: {found:?}")]
    AmbiguousFile {
        stem: &'static str,
        dir: PathBuf,
        found: Vec<PathBuf>,
    },

    #[error("could not parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The configuration parsed but cannot drive an engine.
    #[error("invalid configuration in {file}: {source}")]
    InvalidConfig {
        file: PathBuf,
        #[source]
        source: ConfigError,
    },

    /// Two seed entities share a name.
    #[error("duplicate entity name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Formats
// ===========================================================================

/// The serde formats a data file may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Lookup order when a directory is searched for a file stem.
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    /// The format named by a path's extension.
    pub fn of(path: &Path) -> Result<Self, DataLoadError> {
        let ext = path.extension().and_then(|e| e.to_str());
        Self::ALL
            .into_iter()
            .find(|format| Some(format.extension()) == ext)
            .ok_or_else(|| DataLoadError::UnsupportedFormat {
                file: path.to_path_buf(),
            })
    }

    fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, String> {
        match self {
            Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Read `path` and deserialize it in the format its extension names.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = Format::of(path)?;
    let content = std::fs::read_to_string(path)?;
    format.parse(&content).map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

/// The one `{stem}.<ext>` file present in `dir`, if any.
fn locate(dir: &Path, stem: &'static str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Vec<PathBuf> = Format::ALL
        .into_iter()
        .map(|format| dir.join(format!("{stem}.{}", format.extension())))
        .filter(|path| path.is_file())
        .collect();
    if found.len() > 1 {
        return Err(DataLoadError::AmbiguousFile {
            stem,
            dir: dir.to_path_buf(),
            found,
        });
    }
    Ok(found.pop())
}

// ===========================================================================
// Loaders
// ===========================================================================

/// Read and validate an engine configuration file. Fields the file leaves
/// out take their defaults.
pub fn load_grid_config(path: &Path) -> Result<GridConfig, DataLoadError> {
    let config: GridConfig = deserialize_file(path)?;
    config
        .validate()
        .map_err(|source| DataLoadError::InvalidConfig {
            file: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(file = %path.display(), "loaded grid config");
    Ok(config)
}

/// Read a seed file and reject duplicate entity names.
pub fn load_world_seed(path: &Path) -> Result<WorldSeed, DataLoadError> {
    let seed: WorldSeed = deserialize_file(path)?;
    if let Some(name) = seed.duplicate_names().first() {
        return Err(DataLoadError::DuplicateName {
            file: path.to_path_buf(),
            name: name.to_string(),
        });
    }
    tracing::debug!(
        file = %path.display(),
        tiles = seed.tiles.len(),
        entities = seed.entities.len(),
        "loaded world seed"
    );
    Ok(seed)
}

/// A configuration and seed read from one directory.
#[derive(Debug, Clone)]
pub struct World {
    pub config: GridConfig,
    pub seed: WorldSeed,
}

/// Load a world directory: `grid.{ron,toml,json}` (optional, defaults when
/// absent) and `world.{ron,toml,json}` (required).
pub fn load_world(dir: &Path) -> Result<World, DataLoadError> {
    let config = match locate(dir, CONFIG_FILE)? {
        Some(path) => load_grid_config(&path)?,
        None => GridConfig::default(),
    };
    let seed_path = locate(dir, SEED_FILE)?.ok_or_else(|| DataLoadError::MissingSeed {
        stem: SEED_FILE,
        dir: dir.to_path_buf(),
    })?;
    let seed = load_world_seed(&seed_path)?;
    Ok(World { config, seed })
}

// ===========================================================================
// Tests
// ===========================================================================
