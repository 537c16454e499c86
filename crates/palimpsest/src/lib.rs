//! Palimpsest - versioned narrative graph storage
//!
//! Palimpsest stores a story as two coupled graphs: a git-like structural
//! store of roots, branches, commits and scene versions, and a temporal
//! store of entities whose relations hold over ranges of scene sequence.
//!
//! # Features
//!
//! - **Branching history**: fork, merge (fast-forward only), revert and
//!   reset, with optimistic head versions for concurrent writers
//! - **Temporal relations**: half-open `[start, end)` intervals per
//!   (entity, relation type), including retroactive edits
//! - **World snapshots**: periodic materialized state so point-in-time
//!   reads replay a bounded window
//! - **Consistency and GC**: whole-graph invariant checks and collection of
//!   unreachable commits
//! - **Migration**: every backend speaks [`GraphRepository`], with a
//!   PostgreSQL implementation behind the `database` feature
//!
//! # Quick Start
//!
//! ```rust
//! use palimpsest::{NarrativeStore, StorySeed};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = NarrativeStore::new();
//! let root_id = store
//!     .save(
//!         StorySeed {
//!             logline: "A cartographer maps a city that keeps moving".to_string(),
//!             theme: "certainty".to_string(),
//!             ending: "the map is burned".to_string(),
//!         },
//!         vec![],
//!         vec![],
//!     )
//!     .await?;
//! assert_eq!(store.list_branches(&root_id).await?, vec!["main"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Cargo Features
//!
//! - `database` - PostgreSQL graph repository and CLI import/export
//! - `otel` - OpenTelemetry stdout span exporter
//!
//! # Architecture
//!
//! - `palimpsest_error` - Error types
//! - `palimpsest_interface` - `GraphRepository` trait and dump records
//! - `palimpsest_graph` - In-memory property graph and transactions
//! - `palimpsest_core` - Domain types, configuration, tracing setup
//! - `palimpsest_store` - `NarrativeStore`
//! - `palimpsest_database` - PostgreSQL repository
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]

pub use palimpsest_error::{
    ConfigError, ConfigErrorKind, GraphError, GraphErrorKind, PalimpsestError, PalimpsestErrorKind,
    PalimpsestResult, StoreError, StoreErrorKind,
};
#[cfg(feature = "database")]
pub use palimpsest_error::{DatabaseError, DatabaseErrorKind};

pub use palimpsest_interface::{EdgeRecord, GraphDump, GraphRepository, NodeRecord};

pub use palimpsest_graph::{
    GraphEdge, GraphNode, GraphTransaction, InMemoryGraphRepository, PropertyGraph,
};

pub use palimpsest_core::{
    Act, AnchorType, Branch, BranchHead, Chapter, CharacterAgentState, CharacterSeed,
    CharacterSeedBuilder, Commit, ConstraintType, EdgeType, Entity, EntityType, FieldChange,
    LogFormat, MemoryEntry, NewEntity, NewEntityBuilder, RelationView, Root, SceneContent,
    SceneContentBuilder, SceneOrigin, SceneSeed, SceneSeedBuilder, SceneStatus, SceneVersion,
    SimulationLog, StoreConfig, StoryAnchor, StorySeed, StorySeedBuilder, Subplot,
    SubplotStatus, TemporalRelation, WorldSnapshot, WorldState, init_tracing, merge_deep,
    merge_shallow,
};
#[cfg(feature = "otel")]
pub use palimpsest_core::{init_telemetry, shutdown_telemetry};

pub use palimpsest_store::{
    CommitOutcome, ConsistencyReport, DeletedScene, GcReport, NarrativeStore, RootSnapshot,
    SceneContext, SceneCreated, SceneSummary,
};

#[cfg(feature = "database")]
pub use palimpsest_database::PostgresGraphRepository;
