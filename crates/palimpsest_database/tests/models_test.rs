//! Tests for row conversions and embedded migrations.

use chrono::Utc;
use diesel::migration::{Migration, MigrationSource};
use diesel::pg::Pg;
use palimpsest_database::{GraphEdgeRow, GraphNodeRow, MIGRATIONS, NewGraphEdgeRow, NewGraphNodeRow};
use palimpsest_error::DatabaseErrorKind;
use palimpsest_interface::{EdgeRecord, NodeRecord};
use serde_json::{Map, Value, json};

fn props(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("not an object"),
    }
}

#[test]
fn test_node_record_becomes_insertable_row() {
    let record = NodeRecord::new("mara", "Entity", props(json!({"name": "Mara"})));
    let row = NewGraphNodeRow::from(record);
    assert_eq!(row.id, "mara");
    assert_eq!(row.label, "Entity");
    assert_eq!(row.properties, json!({"name": "Mara"}));
}

#[test]
fn test_edge_record_becomes_insertable_row() {
    let record = EdgeRecord::new(
        "e1",
        "AT",
        "mara",
        "home",
        props(json!({"start_seq": 1, "end_seq": null})),
    );
    let row = NewGraphEdgeRow::from(record);
    assert_eq!(row.edge_type, "AT");
    assert_eq!(row.from_id, "mara");
    assert_eq!(row.to_id, "home");
    assert_eq!(row.properties["start_seq"], json!(1));
}

#[test]
fn test_stored_rows_convert_back_to_records() {
    let node = GraphNodeRow {
        id: "home".to_string(),
        label: "Entity".to_string(),
        properties: json!({"kind": "location"}),
        created_at: Utc::now(),
    };
    let record = NodeRecord::try_from(node).unwrap();
    assert_eq!(record.id, "home");
    assert_eq!(record.properties["kind"], json!("location"));

    let edge = GraphEdgeRow {
        id: "e1".to_string(),
        edge_type: "AT".to_string(),
        from_id: "mara".to_string(),
        to_id: "home".to_string(),
        properties: Value::Null,
        created_at: Utc::now(),
    };
    let record = EdgeRecord::try_from(edge).unwrap();
    assert_eq!(record.edge_type, "AT");
    assert!(record.properties.is_empty());
}

#[test]
fn test_non_object_properties_are_rejected() {
    let node = GraphNodeRow {
        id: "broken".to_string(),
        label: "Entity".to_string(),
        properties: json!([1, 2, 3]),
        created_at: Utc::now(),
    };
    let err = NodeRecord::try_from(node).unwrap_err();
    assert!(matches!(
        &err.kind,
        DatabaseErrorKind::MalformedRow { id, .. } if id == "broken"
    ));
    assert!(err.to_string().contains("Row 'broken' is malformed"));
}

#[test]
fn test_migrations_are_embedded() {
    let migrations = MigrationSource::<Pg>::migrations(&MIGRATIONS).unwrap();
    assert_eq!(migrations.len(), 1);
    assert!(
        migrations[0]
            .name()
            .to_string()
            .ends_with("create_graph_tables")
    );
}
