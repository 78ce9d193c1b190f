//! Configuration for the binlog syncer filter engine.
//!
//! Holds the serde types for every filter layer (block/allow list, binlog event rules,
//! online schema change detection) together with the hierarchical loader shared by the
//! services embedding the engine.

pub mod environment;
mod load;
pub mod shared;

pub use load::LoadConfigError;
