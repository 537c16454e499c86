//! Core data types for the Palimpsest narrative graph store.
//!
//! This crate holds the narrative data model (structural records, entities,
//! temporal relations, snapshots and auxiliary registries), the pure
//! merge-patch functions used on free-form state maps, store configuration
//! and tracing setup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod entity;
pub mod ids;
mod labels;
mod merge;
mod registry;
mod seed;
mod snapshot;
mod structural;
mod telemetry;

pub use config::{StoreConfig, StoreConfigBuilder};
pub use entity::{Entity, EntityType, NewEntity, NewEntityBuilder, TemporalRelation};
pub use labels::EdgeType;
pub use merge::{merge_deep, merge_shallow};
pub use registry::{
    Act, AnchorType, Chapter, CharacterAgentState, ConstraintType, MemoryEntry, SimulationLog,
    StoryAnchor, Subplot, SubplotStatus,
};
pub use seed::{
    CharacterSeed, CharacterSeedBuilder, SceneSeed, SceneSeedBuilder, StorySeed,
    StorySeedBuilder,
};
pub use snapshot::{RelationView, WorldSnapshot, WorldState};
pub use structural::{
    Branch, BranchHead, Commit, FieldChange, Root, SceneContent, SceneContentBuilder,
    SceneOrigin, SceneStatus, SceneVersion,
};
pub use telemetry::{LogFormat, init_tracing};
#[cfg(feature = "otel")]
pub use telemetry::{init_telemetry, shutdown_telemetry};
