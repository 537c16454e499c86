//! Node and edge records exchanged with graph backends.

use palimpsest_error::{GraphError, GraphErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A labelled node with free-form properties.
///
/// Missing fields deserialize to empty values so that [`NodeRecord::validate`]
/// can reject them with a descriptive error instead of a parse failure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Unique node identifier
    #[serde(default)]
    pub id: String,
    /// Node label (e.g. `Commit`, `Entity`)
    #[serde(default)]
    pub label: String,
    /// Node properties, excluding `id`
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl NodeRecord {
    /// Create a node record.
    pub fn new(id: impl Into<String>, label: impl Into<String>, properties: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            properties,
        }
    }

    /// Reject records without an id or label.
    #[track_caller]
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.id.trim().is_empty() {
            return Err(GraphError::new(GraphErrorKind::Validation(
                "node id is required".to_string(),
            )));
        }
        if self.label.trim().is_empty() {
            return Err(GraphError::new(GraphErrorKind::Validation(format!(
                "node label is required for {}",
                self.id
            ))));
        }
        Ok(())
    }
}

/// A typed, directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Unique edge identifier
    #[serde(default)]
    pub id: String,
    /// Edge type (e.g. `HEAD`, `TemporalRelation`)
    #[serde(default, rename = "type")]
    pub edge_type: String,
    /// Source node id
    #[serde(default)]
    pub from_id: String,
    /// Target node id
    #[serde(default)]
    pub to_id: String,
    /// Edge properties, excluding `id`
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl EdgeRecord {
    /// Create an edge record.
    pub fn new(
        id: impl Into<String>,
        edge_type: impl Into<String>,
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        properties: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            edge_type: edge_type.into(),
            from_id: from_id.into(),
            to_id: to_id.into(),
            properties,
        }
    }

    /// Reject records without an id, type or endpoints.
    #[track_caller]
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.id.trim().is_empty() {
            return Err(GraphError::new(GraphErrorKind::Validation(
                "edge id is required".to_string(),
            )));
        }
        if self.edge_type.trim().is_empty() {
            return Err(GraphError::new(GraphErrorKind::Validation(format!(
                "edge type is required for {}",
                self.id
            ))));
        }
        if self.from_id.trim().is_empty() || self.to_id.trim().is_empty() {
            return Err(GraphError::new(GraphErrorKind::Validation(format!(
                "edge endpoints are required for {}",
                self.id
            ))));
        }
        Ok(())
    }
}

/// Full contents of a graph backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphDump {
    /// All nodes
    pub nodes: Vec<NodeRecord>,
    /// All edges
    pub edges: Vec<EdgeRecord>,
}

impl GraphDump {
    /// True when the dump holds no nodes and no edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}
