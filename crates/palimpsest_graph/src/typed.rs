//! Typed views over nodes and edges.

use palimpsest_error::{GraphError, GraphErrorKind};
use palimpsest_interface::{EdgeRecord, NodeRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

fn to_properties<T: Serialize>(value: &T, kind: &str) -> Result<Map<String, Value>, GraphError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(GraphError::new(GraphErrorKind::Serialization(format!(
            "{} serialized to a non-object value: {}",
            kind, other
        )))),
        Err(e) => Err(GraphError::new(GraphErrorKind::Serialization(format!(
            "{}: {}",
            kind, e
        )))),
    }
}

fn from_properties<T: DeserializeOwned>(
    properties: Map<String, Value>,
    kind: &str,
    id: &str,
) -> Result<T, GraphError> {
    serde_json::from_value(Value::Object(properties)).map_err(|e| {
        GraphError::new(GraphErrorKind::Serialization(format!(
            "{} {}: {}",
            kind, id, e
        )))
    })
}

/// A record stored as a labelled node.
///
/// The record's serde representation becomes the node's property map, with
/// the `id` field lifted out into the node id.
pub trait GraphNode: Serialize + DeserializeOwned {
    /// Node label used for every record of this type.
    const LABEL: &'static str;

    /// Node id.
    fn node_id(&self) -> &str;

    /// Convert into a node record.
    fn to_record(&self) -> Result<NodeRecord, GraphError> {
        let mut properties = to_properties(self, Self::LABEL)?;
        properties.remove("id");
        Ok(NodeRecord::new(self.node_id(), Self::LABEL, properties))
    }

    /// Rebuild from a node record carrying this type's label.
    fn from_record(record: &NodeRecord) -> Result<Self, GraphError> {
        if record.label != Self::LABEL {
            return Err(GraphError::new(GraphErrorKind::LabelMismatch {
                id: record.id.clone(),
                expected: Self::LABEL.to_string(),
                actual: record.label.clone(),
            }));
        }
        let mut properties = record.properties.clone();
        properties.insert("id".to_string(), Value::String(record.id.clone()));
        from_properties(properties, Self::LABEL, &record.id)
    }
}

/// A record stored as a typed edge.
///
/// The serde representation must expose `id`, `from_id` and `to_id`; those
/// become the edge's identity and endpoints, everything else its properties.
pub trait GraphEdge: Serialize + DeserializeOwned {
    /// Edge type used for every record of this type.
    const TYPE: &'static str;

    /// Edge id.
    fn edge_id(&self) -> &str;

    /// Source node id.
    fn from_id(&self) -> &str;

    /// Target node id.
    fn to_id(&self) -> &str;

    /// Convert into an edge record.
    fn to_record(&self) -> Result<EdgeRecord, GraphError> {
        let mut properties = to_properties(self, Self::TYPE)?;
        for key in ["id", "from_id", "to_id"] {
            properties.remove(key);
        }
        Ok(EdgeRecord::new(
            self.edge_id(),
            Self::TYPE,
            self.from_id(),
            self.to_id(),
            properties,
        ))
    }

    /// Rebuild from an edge record of this type.
    fn from_record(record: &EdgeRecord) -> Result<Self, GraphError> {
        if record.edge_type != Self::TYPE {
            return Err(GraphError::new(GraphErrorKind::LabelMismatch {
                id: record.id.clone(),
                expected: Self::TYPE.to_string(),
                actual: record.edge_type.clone(),
            }));
        }
        let mut properties = record.properties.clone();
        properties.insert("id".to_string(), Value::String(record.id.clone()));
        properties.insert("from_id".to_string(), Value::String(record.from_id.clone()));
        properties.insert("to_id".to_string(), Value::String(record.to_id.clone()));
        from_properties(properties, Self::TYPE, &record.id)
    }
}
