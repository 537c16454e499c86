//! PostgreSQL persistence for the Palimpsest narrative graph store.
//!
//! Stores the property graph in two tables, `graph_nodes` and `graph_edges`,
//! with JSONB properties, and exposes them through
//! [`GraphRepository`](palimpsest_interface::GraphRepository) so a
//! `NarrativeStore` can be exported to or loaded from Postgres.
//!
//! # Example
//!
//! ```rust,ignore
//! use palimpsest_database::PostgresGraphRepository;
//! use palimpsest_store::NarrativeStore;
//!
//! # async fn example(store: NarrativeStore) -> Result<(), Box<dyn std::error::Error>> {
//! let repository = PostgresGraphRepository::from_env(4)?;
//! store.export_to(&repository).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod connection;
mod models;
mod repository;

pub mod schema;

pub use connection::{
    MIGRATIONS, PgPool, build_pool, database_url, establish_connection, run_migrations,
};
pub use models::{GraphEdgeRow, GraphNodeRow, NewGraphEdgeRow, NewGraphNodeRow};
pub use repository::PostgresGraphRepository;

use palimpsest_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
