//! Acreage Core -- shared vocabulary for the acreage spatial engine.
//!
//! This crate holds everything the spatial engine and its hosts need to agree
//! on, without any of the spatial algorithms themselves.
//!
//! # Key Types
//!
//! - [`id::EntityId`], [`id::TileCoord`], [`id::RegionCoord`] -- identities
//!   and integer coordinates.
//! - [`layer::LayerKind`] and [`layer::LayerRecord`] -- the eight semantic
//!   tile layers and their typed attribute records.
//! - [`position::PositionLookup`] / [`position::PositionStore`] -- how the
//!   grid reads and writes entity positions it does not own.
//! - [`event::Notifier`] and [`event::EventBus`] -- outbound grid
//!   notifications; [`event::InboundEvent`] for what the grid reacts to.
//! - [`clock::Clock`] -- time source for cache TTLs and region scheduling.
//! - [`config::GridConfig`] -- construction-time engine parameters.

pub mod clock;
pub mod config;
pub mod dirty;
pub mod event;
pub mod id;
pub mod layer;
pub mod position;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
