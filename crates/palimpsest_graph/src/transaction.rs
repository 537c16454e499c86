//! Journaled write transactions.

use crate::{GraphEdge, GraphNode, PropertyGraph};
use palimpsest_error::{GraphError, GraphErrorKind};
use palimpsest_interface::{EdgeRecord, NodeRecord};
use serde_json::Map;
use std::ops::Deref;
use tracing::debug;

#[derive(Debug)]
enum Undo {
    NodeCreated(String),
    NodeReplaced(NodeRecord),
    NodeDeleted(NodeRecord),
    EdgeCreated(String),
    EdgeReplaced(EdgeRecord),
    EdgeDeleted(EdgeRecord),
}

/// A unit of work against a [`PropertyGraph`].
///
/// Every write is recorded in an undo journal. Dropping the transaction
/// without calling [`commit`](Self::commit) replays the journal backwards,
/// restoring the graph to its state at [`begin`](Self::begin).
///
/// Reads see the transaction's own writes through `Deref<Target = PropertyGraph>`.
#[derive(Debug)]
pub struct GraphTransaction<'g> {
    graph: &'g mut PropertyGraph,
    journal: Vec<Undo>,
    committed: bool,
}

impl<'g> GraphTransaction<'g> {
    /// Start a transaction.
    pub fn begin(graph: &'g mut PropertyGraph) -> Self {
        Self {
            graph,
            journal: Vec::new(),
            committed: false,
        }
    }

    /// Keep every write made so far.
    pub fn commit(mut self) {
        debug!(writes = self.journal.len(), "Committing graph transaction");
        self.committed = true;
        self.journal.clear();
    }

    /// Insert a new node.
    pub fn create_node(&mut self, node: NodeRecord) -> Result<(), GraphError> {
        node.validate()?;
        if self.graph.contains_node(&node.id) {
            return Err(GraphError::new(GraphErrorKind::DuplicateNode(node.id)));
        }
        self.journal.push(Undo::NodeCreated(node.id.clone()));
        self.graph.raw_insert_node(node);
        Ok(())
    }

    /// Insert a new typed node.
    pub fn create<T: GraphNode>(&mut self, value: &T) -> Result<(), GraphError> {
        self.create_node(value.to_record()?)
    }

    /// Insert or overwrite a typed node. An existing node must share the label.
    pub fn put<T: GraphNode>(&mut self, value: &T) -> Result<(), GraphError> {
        let record = value.to_record()?;
        match self.graph.node(&record.id) {
            None => self.create_node(record),
            Some(existing) if existing.label != record.label => {
                Err(GraphError::new(GraphErrorKind::LabelMismatch {
                    id: record.id,
                    expected: record.label,
                    actual: existing.label.clone(),
                }))
            }
            Some(_) => {
                if let Some(previous) = self.graph.raw_replace_node(record) {
                    self.journal.push(Undo::NodeReplaced(previous));
                }
                Ok(())
            }
        }
    }

    /// Delete a node and every edge attached to it.
    pub fn delete_node(&mut self, id: &str) -> Option<NodeRecord> {
        if !self.graph.contains_node(id) {
            return None;
        }
        for edge_id in self.graph.attached_edge_ids(id) {
            self.delete_edge(&edge_id);
        }
        let node = self.graph.raw_remove_node(id)?;
        self.journal.push(Undo::NodeDeleted(node.clone()));
        Some(node)
    }

    /// Insert a new edge between existing nodes.
    pub fn create_edge(&mut self, edge: EdgeRecord) -> Result<(), GraphError> {
        edge.validate()?;
        if self.graph.edge(&edge.id).is_some() {
            return Err(GraphError::new(GraphErrorKind::DuplicateEdge(edge.id)));
        }
        for endpoint in [&edge.from_id, &edge.to_id] {
            if !self.graph.contains_node(endpoint) {
                return Err(GraphError::new(GraphErrorKind::NodeNotFound(
                    endpoint.clone(),
                )));
            }
        }
        self.journal.push(Undo::EdgeCreated(edge.id.clone()));
        self.graph.raw_insert_edge(edge);
        Ok(())
    }

    /// Connect two nodes with a property-less edge and return its id.
    pub fn link(&mut self, edge_type: &str, from_id: &str, to_id: &str) -> Result<String, GraphError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.create_edge(EdgeRecord::new(
            id.clone(),
            edge_type,
            from_id,
            to_id,
            Map::new(),
        ))?;
        Ok(id)
    }

    /// Insert or overwrite a typed edge.
    pub fn put_edge<T: GraphEdge>(&mut self, value: &T) -> Result<(), GraphError> {
        let record = value.to_record()?;
        match self.graph.edge(&record.id) {
            None => self.create_edge(record),
            Some(existing)
                if existing.from_id != record.from_id || existing.to_id != record.to_id =>
            {
                Err(GraphError::new(GraphErrorKind::Validation(format!(
                    "edge {} cannot change endpoints",
                    record.id
                ))))
            }
            Some(_) => {
                if let Some(previous) = self.graph.raw_remove_edge(&record.id) {
                    self.journal.push(Undo::EdgeReplaced(previous));
                }
                self.graph.raw_insert_edge(record);
                Ok(())
            }
        }
    }

    /// Delete an edge.
    pub fn delete_edge(&mut self, id: &str) -> Option<EdgeRecord> {
        let edge = self.graph.raw_remove_edge(id)?;
        self.journal.push(Undo::EdgeDeleted(edge.clone()));
        Some(edge)
    }

    fn undo(&mut self, step: Undo) {
        match step {
            Undo::NodeCreated(id) => {
                self.graph.raw_remove_node(&id);
            }
            Undo::NodeReplaced(previous) => {
                self.graph.raw_replace_node(previous);
            }
            Undo::NodeDeleted(node) => self.graph.raw_insert_node(node),
            Undo::EdgeCreated(id) => {
                self.graph.raw_remove_edge(&id);
            }
            Undo::EdgeReplaced(previous) => {
                self.graph.raw_remove_edge(&previous.id);
                self.graph.raw_insert_edge(previous);
            }
            Undo::EdgeDeleted(edge) => self.graph.raw_insert_edge(edge),
        }
    }
}

impl Deref for GraphTransaction<'_> {
    type Target = PropertyGraph;

    fn deref(&self) -> &PropertyGraph {
        &*self.graph
    }
}

impl Drop for GraphTransaction<'_> {
    fn drop(&mut self) {
        if self.committed || self.journal.is_empty() {
            return;
        }
        debug!(writes = self.journal.len(), "Rolling back graph transaction");
        while let Some(step) = self.journal.pop() {
            self.undo(step);
        }
    }
}
