//! Adjacency-list property graph.

use crate::{GraphEdge, GraphNode, GraphTransaction};
use palimpsest_error::GraphError;
use palimpsest_interface::{EdgeRecord, GraphDump, NodeRecord};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// In-memory property graph with label, edge-type and adjacency indexes.
///
/// Reads are available directly; every mutation goes through a
/// [`GraphTransaction`].
#[derive(Debug, Clone, Default)]
pub struct PropertyGraph {
    nodes: BTreeMap<String, NodeRecord>,
    edges: BTreeMap<String, EdgeRecord>,
    labels: HashMap<String, BTreeSet<String>>,
    edge_types: HashMap<String, BTreeSet<String>>,
    outgoing: HashMap<String, BTreeSet<String>>,
    incoming: HashMap<String, BTreeSet<String>>,
}

impl PropertyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a dump, validating every record.
    pub fn from_dump(dump: GraphDump) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        let mut tx = GraphTransaction::begin(&mut graph);
        for node in dump.nodes {
            tx.create_node(node)?;
        }
        for edge in dump.edges {
            tx.create_edge(edge)?;
        }
        tx.commit();
        Ok(graph)
    }

    /// Dump every node and edge, ordered by id.
    pub fn dump(&self) -> GraphDump {
        GraphDump {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Every node, ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.values()
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    /// True when a node with this id exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: &str) -> Option<&EdgeRecord> {
        self.edges.get(id)
    }

    /// Nodes carrying `label`, ordered by id.
    pub fn nodes_with_label<'a>(
        &'a self,
        label: &str,
    ) -> impl Iterator<Item = &'a NodeRecord> + use<'a> {
        self.labels
            .get(label)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.nodes.get(id))
    }

    /// Edges of `edge_type`, ordered by id.
    pub fn edges_of_type<'a>(
        &'a self,
        edge_type: &str,
    ) -> impl Iterator<Item = &'a EdgeRecord> + use<'a> {
        self.edge_types
            .get(edge_type)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.edges.get(id))
    }

    /// Outgoing edges of `edge_type` from `node_id`.
    pub fn outgoing(&self, node_id: &str, edge_type: &str) -> Vec<&EdgeRecord> {
        Self::adjacent(&self.outgoing, &self.edges, node_id, edge_type)
    }

    /// Incoming edges of `edge_type` into `node_id`.
    pub fn incoming(&self, node_id: &str, edge_type: &str) -> Vec<&EdgeRecord> {
        Self::adjacent(&self.incoming, &self.edges, node_id, edge_type)
    }

    /// Every edge touching `node_id`, in either direction.
    pub fn attached_edge_ids(&self, node_id: &str) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        if let Some(out) = self.outgoing.get(node_id) {
            ids.extend(out.iter().cloned());
        }
        if let Some(inc) = self.incoming.get(node_id) {
            ids.extend(inc.iter().cloned());
        }
        ids
    }

    fn adjacent<'a>(
        index: &HashMap<String, BTreeSet<String>>,
        edges: &'a BTreeMap<String, EdgeRecord>,
        node_id: &str,
        edge_type: &str,
    ) -> Vec<&'a EdgeRecord> {
        index
            .get(node_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| edges.get(id))
                    .filter(|edge| edge.edge_type == edge_type)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Load a typed node. Fails if the id belongs to a node of another label.
    pub fn get<T: GraphNode>(&self, id: &str) -> Result<Option<T>, GraphError> {
        self.nodes.get(id).map(T::from_record).transpose()
    }

    /// Load every node of a type, ordered by id.
    pub fn all<T: GraphNode>(&self) -> Result<Vec<T>, GraphError> {
        self.nodes_with_label(T::LABEL).map(T::from_record).collect()
    }

    /// Load a typed edge.
    pub fn get_edge<T: GraphEdge>(&self, id: &str) -> Result<Option<T>, GraphError> {
        self.edges.get(id).map(T::from_record).transpose()
    }

    /// Load every edge of a type, ordered by id.
    pub fn all_edges<T: GraphEdge>(&self) -> Result<Vec<T>, GraphError> {
        self.edges_of_type(T::TYPE).map(T::from_record).collect()
    }

    pub(crate) fn raw_insert_node(&mut self, node: NodeRecord) {
        self.labels
            .entry(node.label.clone())
            .or_default()
            .insert(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
    }

    pub(crate) fn raw_replace_node(&mut self, node: NodeRecord) -> Option<NodeRecord> {
        let previous = self.nodes.get(&node.id).cloned();
        if let Some(old) = &previous
            && old.label != node.label
            && let Some(ids) = self.labels.get_mut(&old.label)
        {
            ids.remove(&old.id);
        }
        self.raw_insert_node(node);
        previous
    }

    pub(crate) fn raw_remove_node(&mut self, id: &str) -> Option<NodeRecord> {
        let node = self.nodes.remove(id)?;
        if let Some(ids) = self.labels.get_mut(&node.label) {
            ids.remove(id);
        }
        self.outgoing.remove(id);
        self.incoming.remove(id);
        Some(node)
    }

    pub(crate) fn raw_insert_edge(&mut self, edge: EdgeRecord) {
        self.edge_types
            .entry(edge.edge_type.clone())
            .or_default()
            .insert(edge.id.clone());
        self.outgoing
            .entry(edge.from_id.clone())
            .or_default()
            .insert(edge.id.clone());
        self.incoming
            .entry(edge.to_id.clone())
            .or_default()
            .insert(edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
    }

    pub(crate) fn raw_remove_edge(&mut self, id: &str) -> Option<EdgeRecord> {
        let edge = self.edges.remove(id)?;
        if let Some(ids) = self.edge_types.get_mut(&edge.edge_type) {
            ids.remove(id);
        }
        if let Some(ids) = self.outgoing.get_mut(&edge.from_id) {
            ids.remove(id);
        }
        if let Some(ids) = self.incoming.get_mut(&edge.to_id) {
            ids.remove(id);
        }
        Some(edge)
    }
}
