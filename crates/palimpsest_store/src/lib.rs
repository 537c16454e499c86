//! Versioned narrative graph store.
//!
//! [`NarrativeStore`] layers two coupled subgraphs on a [`PropertyGraph`]:
//!
//! - **Structural store**: roots, branches, branch heads, commits, scene
//!   origins and scene versions with commit-DAG semantics. Every content
//!   mutation creates an immutable commit and moves exactly one branch head.
//! - **Temporal relation store**: entities joined by relations valid over
//!   half-open scene-sequence intervals, with periodic world snapshots that
//!   bound point-in-time reads to a short replay.
//!
//! Consistency checks, garbage collection of unreachable commits and the
//! auxiliary registries (outline, anchors, agents, simulation logs,
//! subplots) are built on the same primitives.
//!
//! Every mutating operation runs in one [`GraphTransaction`] under the
//! store's write lock; an error rolls back every write the operation made.
//!
//! # Example
//!
//! ```
//! use palimpsest_core::{SceneContentBuilder, StorySeed};
//! use palimpsest_store::NarrativeStore;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = NarrativeStore::new();
//! let seed = StorySeed {
//!     logline: "A keeper guards a dying light".to_string(),
//!     theme: "duty".to_string(),
//!     ending: "the light goes out".to_string(),
//! };
//! let root_id = store.save(seed, vec![], vec![]).await?;
//!
//! let content = SceneContentBuilder::default()
//!     .expected_outcome("The storm arrives")
//!     .build()?;
//! let created = store
//!     .create_scene_origin(&root_id, "main", "Storm", None, content)
//!     .await?;
//! let scene = store.get_scene_origin(&created.scene_origin_id).await?;
//! assert_eq!(scene.sequence_index, 1);
//! # Ok(())
//! # }
//! ```
//!
//! [`PropertyGraph`]: palimpsest_graph::PropertyGraph
//! [`GraphTransaction`]: palimpsest_graph::GraphTransaction

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod agents;
mod anchors;
mod consistency;
mod entities;
mod gc;
mod outline;
mod queries;
mod roots;
mod scenes;
mod simulation;
mod snapshot;
mod store;
mod structural;
mod subplots;
mod temporal;

pub use consistency::ConsistencyReport;
pub use gc::GcReport;
pub use roots::{RootSnapshot, SceneSummary};
pub use scenes::SceneContext;
pub use store::NarrativeStore;
pub use structural::{CommitOutcome, DeletedScene, SceneCreated};
