//! Persistence substrate traits for the Palimpsest narrative graph store.
//!
//! The narrative store layers its data model on any property-graph backend
//! that can bulk-load and dump labelled nodes and typed edges. This crate
//! defines that contract and the record types exchanged through it.

mod records;
mod repository;

pub use records::{EdgeRecord, GraphDump, NodeRecord};
pub use repository::GraphRepository;
