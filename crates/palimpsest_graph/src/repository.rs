//! In-memory implementation of GraphRepository.

use crate::{GraphTransaction, PropertyGraph};
use async_trait::async_trait;
use palimpsest_error::PalimpsestResult;
use palimpsest_interface::{EdgeRecord, GraphDump, GraphRepository, NodeRecord};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// [`GraphRepository`] backed by a shared [`PropertyGraph`].
///
/// Clones share the same graph, so a repository handed to migration tooling
/// observes and mutates the same state as the store that created it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphRepository {
    graph: Arc<RwLock<PropertyGraph>>,
}

impl InMemoryGraphRepository {
    /// Create a repository over an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository over an existing shared graph.
    pub fn from_shared(graph: Arc<RwLock<PropertyGraph>>) -> Self {
        Self { graph }
    }

    /// The shared graph handle.
    pub fn shared(&self) -> Arc<RwLock<PropertyGraph>> {
        Arc::clone(&self.graph)
    }
}

#[async_trait]
impl GraphRepository for InMemoryGraphRepository {
    #[instrument(skip(self, nodes), fields(count = nodes.len()))]
    async fn insert_nodes(&self, nodes: Vec<NodeRecord>) -> PalimpsestResult<()> {
        let mut graph = self.graph.write().await;
        let mut tx = GraphTransaction::begin(&mut graph);
        for node in nodes {
            tx.create_node(node)?;
        }
        tx.commit();
        Ok(())
    }

    #[instrument(skip(self, edges), fields(count = edges.len()))]
    async fn insert_edges(&self, edges: Vec<EdgeRecord>) -> PalimpsestResult<()> {
        let mut graph = self.graph.write().await;
        let mut tx = GraphTransaction::begin(&mut graph);
        for edge in edges {
            tx.create_edge(edge)?;
        }
        tx.commit();
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_nodes(&self, ids: &[String]) -> PalimpsestResult<()> {
        let mut graph = self.graph.write().await;
        let mut tx = GraphTransaction::begin(&mut graph);
        let removed = ids.iter().filter_map(|id| tx.delete_node(id)).count();
        debug!(removed, "Deleted nodes");
        tx.commit();
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_edges(&self, ids: &[String]) -> PalimpsestResult<()> {
        let mut graph = self.graph.write().await;
        let mut tx = GraphTransaction::begin(&mut graph);
        let removed = ids.iter().filter_map(|id| tx.delete_edge(id)).count();
        debug!(removed, "Deleted edges");
        tx.commit();
        Ok(())
    }

    /// Insert nodes and edges in one transaction.
    #[instrument(skip(self, dump), fields(nodes = dump.nodes.len(), edges = dump.edges.len()))]
    async fn load_dump(&self, dump: GraphDump) -> PalimpsestResult<()> {
        let mut graph = self.graph.write().await;
        let mut tx = GraphTransaction::begin(&mut graph);
        for node in dump.nodes {
            tx.create_node(node)?;
        }
        for edge in dump.edges {
            tx.create_edge(edge)?;
        }
        tx.commit();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn snapshot(&self) -> PalimpsestResult<GraphDump> {
        let graph = self.graph.read().await;
        Ok(graph.dump())
    }
}
