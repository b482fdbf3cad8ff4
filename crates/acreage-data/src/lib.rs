//! File-based configuration and world seeding for the grid engine.
//!
//! - [`loader`]: format detection (RON/TOML/JSON), file discovery,
//!   deserialization and [`load_grid_config`].
//! - [`schema`]: the on-disk shape of a world seed.
//! - [`seed`]: rehydrating a [`GridEngine`](acreage_spatial::GridEngine)
//!   from a seed through its public API.

pub mod loader;
pub mod schema;
pub mod seed;

pub use loader::{load_grid_config, load_world, load_world_seed, DataLoadError, World};
pub use schema::{EntitySeed, TileSeed, WorldSeed};
pub use seed::{apply_seed, SeedReport};
