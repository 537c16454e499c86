//! Embedded property graph substrate.
//!
//! An adjacency-list graph of labelled nodes and typed edges, each carrying
//! a JSON property map. Writes go through a [`GraphTransaction`], which
//! journals every change and undoes them all unless committed, so a failed
//! multi-step operation never leaves partial state behind.
//!
//! Typed records map onto nodes and edges through the [`GraphNode`] and
//! [`GraphEdge`] traits.

#![forbid(unsafe_code)]

mod graph;
mod repository;
mod transaction;
mod typed;

pub use graph::PropertyGraph;
pub use repository::InMemoryGraphRepository;
pub use transaction::GraphTransaction;
pub use typed::{GraphEdge, GraphNode};
