use palimpsest_error::GraphErrorKind;
use palimpsest_interface::{EdgeRecord, GraphDump, NodeRecord};
use serde_json::{Map, json};

#[test]
fn test_node_record_requires_id_and_label() {
    let missing_id = NodeRecord::new("", "Commit", Map::new());
    let err = missing_id.validate().unwrap_err();
    assert!(matches!(err.kind, GraphErrorKind::Validation(ref m) if m.contains("id")));

    let missing_label = NodeRecord::new("c-1", " ", Map::new());
    let err = missing_label.validate().unwrap_err();
    assert!(matches!(err.kind, GraphErrorKind::Validation(ref m) if m.contains("label")));

    assert!(NodeRecord::new("c-1", "Commit", Map::new()).validate().is_ok());
}

#[test]
fn test_edge_record_requires_type_and_endpoints() {
    let err = EdgeRecord::new("e-1", "", "a", "b", Map::new()).validate().unwrap_err();
    assert!(matches!(err.kind, GraphErrorKind::Validation(ref m) if m.contains("type")));

    let err = EdgeRecord::new("e-1", "HEAD", "a", "", Map::new()).validate().unwrap_err();
    assert!(matches!(err.kind, GraphErrorKind::Validation(ref m) if m.contains("endpoints")));
}

#[test]
fn test_records_parse_with_missing_fields() {
    let dump: GraphDump = serde_json::from_value(json!({
        "nodes": [{"label": "Root", "properties": {"logline": "x"}}],
        "edges": [{"id": "e", "type": "PARENT", "from_id": "a", "to_id": "b"}]
    }))
    .unwrap();

    assert!(dump.nodes[0].validate().is_err());
    assert!(dump.edges[0].validate().is_ok());
    assert_eq!(dump.edges[0].edge_type, "PARENT");
    assert!(!dump.is_empty());
}

#[test]
fn test_edge_type_serializes_as_type() {
    let edge = EdgeRecord::new("e", "HEAD", "h", "c", Map::new());
    let value = serde_json::to_value(&edge).unwrap();
    assert_eq!(value["type"], "HEAD");
    assert!(value.get("edge_type").is_none());
}
