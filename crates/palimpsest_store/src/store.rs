//! The store handle and its graph access helpers.

use async_trait::async_trait;
use palimpsest_core::StoreConfig;
use palimpsest_error::PalimpsestResult;
use palimpsest_graph::{GraphTransaction, InMemoryGraphRepository, PropertyGraph};
use palimpsest_interface::{EdgeRecord, GraphDump, GraphRepository, NodeRecord};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

/// Versioned narrative graph store over an embedded property graph.
///
/// Clones share the same graph. Writers hold the write lock for the whole
/// operation, so each operation is a single atomic unit of work; readers
/// share the read lock.
#[derive(Debug, Clone, Default)]
pub struct NarrativeStore {
    graph: Arc<RwLock<PropertyGraph>>,
    config: StoreConfig,
}

impl NarrativeStore {
    /// An empty store with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            graph: Arc::default(),
            config,
        }
    }

    /// A store over an existing graph dump.
    pub fn from_dump(dump: GraphDump, config: StoreConfig) -> PalimpsestResult<Self> {
        let graph = PropertyGraph::from_dump(dump)?;
        Ok(Self {
            graph: Arc::new(RwLock::new(graph)),
            config,
        })
    }

    /// Load the full contents of another backend.
    #[instrument(skip(repository, config))]
    pub async fn from_repository<R>(repository: &R, config: StoreConfig) -> PalimpsestResult<Self>
    where
        R: GraphRepository + ?Sized,
    {
        let dump = repository.snapshot().await?;
        info!(
            nodes = dump.nodes.len(),
            edges = dump.edges.len(),
            "Loaded graph from repository"
        );
        Self::from_dump(dump, config)
    }

    /// Write the full contents of this store into another backend.
    #[instrument(skip(self, repository))]
    pub async fn export_to<R>(&self, repository: &R) -> PalimpsestResult<()>
    where
        R: GraphRepository + ?Sized,
    {
        let dump = self.graph.read().await.dump();
        info!(
            nodes = dump.nodes.len(),
            edges = dump.edges.len(),
            "Exporting graph to repository"
        );
        repository.load_dump(dump).await
    }

    /// Store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Dump every node and edge.
    pub async fn dump(&self) -> GraphDump {
        self.graph.read().await.dump()
    }

    /// Run `op` in one transaction under the write lock.
    ///
    /// An error from `op` drops the transaction, undoing every write it made.
    pub(crate) async fn write<T, F>(&self, op: F) -> PalimpsestResult<T>
    where
        F: FnOnce(&mut GraphTransaction<'_>) -> PalimpsestResult<T>,
    {
        let mut graph = self.graph.write().await;
        let mut tx = GraphTransaction::begin(&mut graph);
        let value = op(&mut tx)?;
        tx.commit();
        Ok(value)
    }

    /// Run `op` under the read lock.
    pub(crate) async fn read<T, F>(&self, op: F) -> PalimpsestResult<T>
    where
        F: FnOnce(&PropertyGraph) -> PalimpsestResult<T>,
    {
        let graph = self.graph.read().await;
        op(&graph)
    }

    fn repository(&self) -> InMemoryGraphRepository {
        InMemoryGraphRepository::from_shared(Arc::clone(&self.graph))
    }
}

#[async_trait]
impl GraphRepository for NarrativeStore {
    async fn insert_nodes(&self, nodes: Vec<NodeRecord>) -> PalimpsestResult<()> {
        self.repository().insert_nodes(nodes).await
    }

    async fn insert_edges(&self, edges: Vec<EdgeRecord>) -> PalimpsestResult<()> {
        self.repository().insert_edges(edges).await
    }

    async fn delete_nodes(&self, ids: &[String]) -> PalimpsestResult<()> {
        self.repository().delete_nodes(ids).await
    }

    async fn delete_edges(&self, ids: &[String]) -> PalimpsestResult<()> {
        self.repository().delete_edges(ids).await
    }

    async fn snapshot(&self) -> PalimpsestResult<GraphDump> {
        self.repository().snapshot().await
    }

    async fn load_dump(&self, dump: GraphDump) -> PalimpsestResult<()> {
        self.repository().load_dump(dump).await
    }
}
