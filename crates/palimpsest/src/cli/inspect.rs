//! Handlers for commands that operate on a dump file.

use super::dump_file::{open_store, write_dump};
use palimpsest_core::StoreConfig;
use std::path::Path;
use tracing::{info, warn};

/// Print the consistency report; fail when it is not clean.
pub async fn handle_check(
    path: &Path,
    config: StoreConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path, config)?;
    let report = store.check_consistency().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.is_clean() {
        info!("Graph is consistent");
        Ok(())
    } else {
        warn!(violations = report.violation_count(), "Graph is inconsistent");
        Err(format!("{} invariant violations", report.violation_count()).into())
    }
}

/// Collect orphan commits and optionally persist the result.
pub async fn handle_gc(
    path: &Path,
    retention_days: Option<i64>,
    write: bool,
    config: StoreConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path, config)?;
    let report = store.gc_orphan_commits(retention_days).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if write {
        write_dump(path, &store.dump().await)?;
    } else if !report.deleted_commit_ids.is_empty() {
        info!("Dry run; pass --write to persist");
    }
    Ok(())
}

/// Print the world state at `seq`.
pub async fn handle_world_state(
    path: &Path,
    root_id: &str,
    branch_id: &str,
    seq: i64,
    config: StoreConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path, config)?;
    let state = store.get_world_state(root_id, branch_id, seq).await?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

/// Print branch history, one commit per line.
pub async fn handle_history(
    path: &Path,
    root_id: &str,
    branch_id: &str,
    limit: Option<usize>,
    config: StoreConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path, config)?;
    for commit in store.get_branch_history(root_id, branch_id, limit).await? {
        println!(
            "{}  {}  {}",
            commit.id,
            commit.created_at.to_rfc3339(),
            commit.message
        );
    }
    Ok(())
}
