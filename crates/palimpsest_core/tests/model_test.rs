use chrono::Utc;
use palimpsest_core::{
    BranchHead, CharacterAgentState, EntityType, MemoryEntry, RelationView, Root,
    SceneContentBuilder, Subplot, SubplotStatus, TemporalRelation, WorldState,
};
use palimpsest_error::StoreErrorKind;
use serde_json::{Map, json};
use std::str::FromStr;

fn relation(start: i64, end: Option<i64>) -> TemporalRelation {
    TemporalRelation {
        id: format!("rel-{start}"),
        from_id: "a".to_string(),
        to_id: "home".to_string(),
        root_id: "r".to_string(),
        branch_id: "main".to_string(),
        relation_type: "AT".to_string(),
        tension: 0,
        start_scene_seq: start,
        end_scene_seq: end,
        created_at: Utc::now(),
        invalidated_at: None,
    }
}

#[test]
fn test_relation_interval_is_half_open() {
    let closed = relation(1, Some(5));
    assert!(!closed.is_active_at(0));
    assert!(closed.is_active_at(1));
    assert!(closed.is_active_at(4));
    assert!(!closed.is_active_at(5));

    let open = relation(5, None);
    assert!(open.is_active_at(5));
    assert!(open.is_active_at(500));
}

#[test]
fn test_relation_overlap() {
    assert!(!relation(1, Some(5)).overlaps(&relation(5, None)));
    assert!(relation(1, Some(6)).overlaps(&relation(5, None)));
    assert!(relation(1, None).overlaps(&relation(7, None)));
    assert!(!relation(5, Some(5)).overlaps(&relation(1, None)));
}

#[test]
fn test_root_owns_scene_sequence() {
    let mut root = Root::new("logline", "theme", "ending");
    assert_eq!(root.next_scene_sequence(), 1);
    assert_eq!(root.next_scene_sequence(), 2);
    root.observe_scene_sequence(7);
    root.observe_scene_sequence(3);
    assert_eq!(root.next_scene_sequence(), 8);
}

#[test]
fn test_branch_head_version_check() {
    let mut head = BranchHead::new("r", "main", "c1");
    assert_eq!(*head.version(), 1);
    assert_eq!(head.advance("c2"), 2);
    assert!(head.check_version(None).is_ok());
    assert!(head.check_version(Some(2)).is_ok());
    let err = head.check_version(Some(1)).unwrap_err();
    assert!(matches!(
        err.kind,
        StoreErrorKind::ConcurrencyConflict { expected: 1, actual: 2, .. }
    ));
}

#[test]
fn test_scene_content_requires_expected_outcome() {
    let empty = SceneContentBuilder::default().build().unwrap();
    assert!(matches!(empty.validate().unwrap_err().kind, StoreErrorKind::Validation(_)));
}

#[test]
fn test_scene_version_diff_reports_changed_fields() {
    let first = SceneContentBuilder::default()
        .expected_outcome("arrive")
        .summary("short")
        .build()
        .unwrap()
        .into_version("s1", "c1");
    let second = SceneContentBuilder::default()
        .expected_outcome("depart")
        .summary("short")
        .build()
        .unwrap()
        .into_version("s1", "c2");

    let diff = first.diff(&second);
    assert_eq!(diff.len(), 1);
    assert_eq!(diff["expected_outcome"].from, json!("arrive"));
    assert_eq!(diff["expected_outcome"].to, json!("depart"));
}

#[test]
fn test_memory_keeps_most_important_entries() {
    let mut agent = CharacterAgentState::new("mara", "main", vec![]);
    for importance in 1..=95 {
        let mut entry = Map::new();
        entry.insert("importance".to_string(), json!(importance));
        entry.insert("text".to_string(), json!(format!("event {importance}")));
        agent.remember(MemoryEntry::from_map(entry).unwrap(), 80);
        assert!(agent.memory().len() <= 80);
    }
    let mut kept: Vec<i64> = agent.memory().iter().map(|m| m.importance.as_i64().unwrap()).collect();
    kept.sort();
    assert_eq!(kept, (16..=95).collect::<Vec<_>>());
    assert_eq!(*agent.version(), 1);
}

#[test]
fn test_memory_entry_requires_numeric_importance() {
    let mut entry = Map::new();
    entry.insert("importance".to_string(), json!("high"));
    assert!(MemoryEntry::from_map(entry).is_err());
    assert!(MemoryEntry::from_map(Map::new()).is_err());
}

#[test]
fn test_memory_entry_keeps_integer_importance() {
    let mut entry = Map::new();
    entry.insert("importance".to_string(), json!(5));
    entry.insert("text".to_string(), json!("met the ferryman"));
    let entry = MemoryEntry::from_map(entry).unwrap();
    let value = serde_json::to_value(&entry).unwrap();
    assert_eq!(value["importance"], json!(5));
    assert_eq!(value["importance"].to_string(), "5");

    let mut fractional = Map::new();
    fractional.insert("importance".to_string(), json!(2.5));
    let fractional = MemoryEntry::from_map(fractional).unwrap();
    assert_eq!(serde_json::to_value(&fractional).unwrap()["importance"], json!(2.5));
    assert!(entry.rank() > fractional.rank());
}

#[test]
fn test_beliefs_merge_deeply_and_bump_version() {
    let mut agent = CharacterAgentState::new("mara", "main", vec![json!({"goal": "flee"})]);
    let first = json!({"world": {"door": "locked", "guard": "asleep"}});
    let second = json!({"world": {"door": "open"}});
    agent.merge_beliefs(first.as_object().unwrap());
    let version = agent.merge_beliefs(second.as_object().unwrap());
    assert_eq!(version, 3);
    assert_eq!(agent.beliefs()["world"], json!({"door": "open", "guard": "asleep"}));
}

#[test]
fn test_subplot_lifecycle() {
    let mut subplot = Subplot::new("r", "main", "Debt", "money", "mara", "repay");
    assert_eq!(subplot.status, SubplotStatus::Dormant);
    let err = subplot.resolve().unwrap_err();
    assert!(matches!(err.kind, StoreErrorKind::InvalidStateTransition { .. }));
    subplot.activate().unwrap();
    assert!(subplot.activate().is_err());
    subplot.resolve().unwrap();
    assert_eq!(subplot.status, SubplotStatus::Resolved);
}

#[test]
fn test_world_state_apply_replaces_key() {
    let mut state = WorldState::from_relations(vec![RelationView {
        from_id: "a".to_string(),
        relation_type: "AT".to_string(),
        to_id: "home".to_string(),
        tension: 1,
    }]);
    state.apply(vec![RelationView {
        from_id: "a".to_string(),
        relation_type: "AT".to_string(),
        to_id: "hospital".to_string(),
        tension: 4,
    }]);
    assert_eq!(state.target("a", "AT"), Some("hospital"));
    assert_eq!(state.relations.len(), 1);
    assert_eq!(state.relations[0].tension, 4);
}

#[test]
fn test_entity_type_parses_case_insensitively() {
    assert_eq!(EntityType::from_str("character").unwrap(), EntityType::Character);
    assert_eq!(EntityType::from_str("LOCATION").unwrap(), EntityType::Location);
    assert!(EntityType::from_str("vehicle").is_err());
}
