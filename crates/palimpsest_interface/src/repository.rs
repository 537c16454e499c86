//! Bulk graph repository trait.

use crate::{EdgeRecord, GraphDump, NodeRecord};
use async_trait::async_trait;
use palimpsest_error::PalimpsestResult;

/// Bulk access to a property-graph backend.
///
/// Used by migration tooling to move a narrative graph between physical
/// backends. Implementations must apply each call atomically: either every
/// record in the batch is written or none is.
///
/// # Example
///
/// ```ignore
/// let dump = source.snapshot().await?;
/// target.load_dump(dump).await?;
/// ```
#[async_trait]
pub trait GraphRepository: Send + Sync {
    /// Insert nodes. Every record needs an id and a label.
    async fn insert_nodes(&self, nodes: Vec<NodeRecord>) -> PalimpsestResult<()>;

    /// Insert edges. Every record needs an id, a type and both endpoints,
    /// and both endpoints must already exist.
    async fn insert_edges(&self, edges: Vec<EdgeRecord>) -> PalimpsestResult<()>;

    /// Delete nodes and every edge attached to them. Unknown ids are ignored.
    async fn delete_nodes(&self, ids: &[String]) -> PalimpsestResult<()>;

    /// Delete edges. Unknown ids are ignored.
    async fn delete_edges(&self, ids: &[String]) -> PalimpsestResult<()>;

    /// Dump every node and edge.
    async fn snapshot(&self) -> PalimpsestResult<GraphDump>;

    /// Insert a full dump, nodes first.
    ///
    /// The default issues two batches; backends that can span both in one
    /// transaction override it so a failed edge leaves no nodes behind.
    async fn load_dump(&self, dump: GraphDump) -> PalimpsestResult<()> {
        self.insert_nodes(dump.nodes).await?;
        self.insert_edges(dump.edges).await
    }
}
