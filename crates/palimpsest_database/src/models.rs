//! Row types for the graph tables.

use crate::DatabaseResult;
use crate::schema::{graph_edges, graph_nodes};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use palimpsest_error::{DatabaseError, DatabaseErrorKind};
use palimpsest_interface::{EdgeRecord, NodeRecord};
use serde_json::{Map, Value};

/// A stored node.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = graph_nodes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GraphNodeRow {
    pub id: String,
    pub label: String,
    pub properties: Value,
    pub created_at: DateTime<Utc>,
}

/// New node for insertion.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = graph_nodes)]
pub struct NewGraphNodeRow {
    pub id: String,
    pub label: String,
    pub properties: Value,
}

/// A stored edge.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = graph_edges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GraphEdgeRow {
    pub id: String,
    pub edge_type: String,
    pub from_id: String,
    pub to_id: String,
    pub properties: Value,
    pub created_at: DateTime<Utc>,
}

/// New edge for insertion.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = graph_edges)]
pub struct NewGraphEdgeRow {
    pub id: String,
    pub edge_type: String,
    pub from_id: String,
    pub to_id: String,
    pub properties: Value,
}

impl From<NodeRecord> for NewGraphNodeRow {
    fn from(node: NodeRecord) -> Self {
        Self {
            id: node.id,
            label: node.label,
            properties: Value::Object(node.properties),
        }
    }
}

impl From<EdgeRecord> for NewGraphEdgeRow {
    fn from(edge: EdgeRecord) -> Self {
        Self {
            id: edge.id,
            edge_type: edge.edge_type,
            from_id: edge.from_id,
            to_id: edge.to_id,
            properties: Value::Object(edge.properties),
        }
    }
}

#[track_caller]
fn object(owner: &str, value: Value) -> DatabaseResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(DatabaseError::new(DatabaseErrorKind::MalformedRow {
            id: owner.to_string(),
            reason: format!("properties must be a JSON object, found {}", other),
        })),
    }
}

impl TryFrom<GraphNodeRow> for NodeRecord {
    type Error = DatabaseError;

    fn try_from(row: GraphNodeRow) -> Result<Self, Self::Error> {
        let properties = object(&row.id, row.properties)?;
        Ok(NodeRecord::new(row.id, row.label, properties))
    }
}

impl TryFrom<GraphEdgeRow> for EdgeRecord {
    type Error = DatabaseError;

    fn try_from(row: GraphEdgeRow) -> Result<Self, Self::Error> {
        let properties = object(&row.id, row.properties)?;
        Ok(EdgeRecord::new(
            row.id,
            row.edge_type,
            row.from_id,
            row.to_id,
            properties,
        ))
    }
}
