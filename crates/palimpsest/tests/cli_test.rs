//! Tests for the palimpsest binary.

mod test_utils;

use palimpsest::{GcReport, WorldState};
use test_utils::{TempDump, palimpsest, story};

#[tokio::test]
async fn test_check_accepts_consistent_dump() {
    let (store, _root_id) = story().await;
    let file = TempDump::write(&store.dump().await);

    let output = palimpsest(&["check", file.path.to_str().unwrap()]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["head_edge_violations"], serde_json::json!([]));
}

#[tokio::test]
async fn test_check_rejects_head_without_edge() {
    let (store, _root_id) = story().await;
    let mut dump = store.dump().await;
    let before = dump.edges.len();
    dump.edges.retain(|edge| edge.edge_type != "HEAD");
    assert!(dump.edges.len() < before);
    let file = TempDump::write(&dump);

    let output = palimpsest(&["check", file.path.to_str().unwrap()]);
    assert!(!output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["head_edge_violations"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_world_state_prints_relations() {
    let (store, root_id) = story().await;
    let file = TempDump::write(&store.dump().await);

    let output = palimpsest(&[
        "world-state",
        file.path.to_str().unwrap(),
        "--root",
        &root_id,
        "--branch",
        "main",
        "--seq",
        "3",
    ]);
    assert!(output.status.success());
    let state: WorldState = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state.target("ines", "AT"), Some("vineyard"));

    let output = palimpsest(&[
        "world-state",
        file.path.to_str().unwrap(),
        "--root",
        &root_id,
        "--branch",
        "main",
        "--seq",
        "2",
    ]);
    let state: WorldState = serde_json::from_slice(&output.stdout).unwrap();
    assert!(state.relations.is_empty());
}

#[tokio::test]
async fn test_history_lists_commits_newest_first() {
    let (store, root_id) = story().await;
    let file = TempDump::write(&store.dump().await);

    let output = palimpsest(&[
        "history",
        file.path.to_str().unwrap(),
        "--root",
        &root_id,
        "--branch",
        "main",
        "--limit",
        "2",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);

    let history = store
        .get_branch_history(&root_id, "main", Some(2))
        .await
        .unwrap();
    assert!(lines[0].starts_with(&history[0].id));
    assert!(lines[1].starts_with(&history[1].id));
}

#[tokio::test]
async fn test_gc_without_orphans_leaves_dump_unchanged() {
    let (store, _root_id) = story().await;
    let dump = store.dump().await;
    let file = TempDump::write(&dump);

    let output = palimpsest(&["gc", file.path.to_str().unwrap(), "--write"]);
    assert!(output.status.success());
    let report: GcReport = serde_json::from_slice(&output.stdout).unwrap();
    assert!(report.deleted_commit_ids.is_empty());
    assert_eq!(file.read(), dump);
}

#[test]
fn test_missing_dump_file_fails() {
    let output = palimpsest(&["check", "/nonexistent/palimpsest-dump.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read"));
}
