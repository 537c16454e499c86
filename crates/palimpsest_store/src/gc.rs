//! Garbage collection of commits no branch can reach.

use crate::NarrativeStore;
use crate::queries::{ancestry, head_commit_id};
use chrono::{DateTime, Duration, Utc};
use palimpsest_core::{BranchHead, Commit, EdgeType};
use palimpsest_error::{PalimpsestResult, StoreError};
use palimpsest_graph::GraphTransaction;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// What a garbage collection pass deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcReport {
    /// Deleted commits
    pub deleted_commit_ids: Vec<String>,
    /// Deleted scene versions included by those commits
    pub deleted_scene_version_ids: Vec<String>,
}

fn collect(
    tx: &mut GraphTransaction<'_>,
    retention_days: i64,
    now: DateTime<Utc>,
) -> PalimpsestResult<GcReport> {
    if retention_days < 0 {
        return Err(StoreError::validation("retention_days must not be negative").into());
    }
    let mut reachable = HashSet::new();
    for head in tx.all::<BranchHead>()? {
        let head_commit = head_commit_id(tx, &head)?;
        reachable.extend(ancestry(tx, &head_commit)?);
    }
    debug!(reachable = reachable.len(), "Marked reachable commits");

    // A retention window reaching past the representable past keeps everything.
    let cutoff = Duration::try_days(retention_days)
        .and_then(|retention| now.checked_sub_signed(retention))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let doomed: Vec<Commit> = tx
        .all::<Commit>()?
        .into_iter()
        .filter(|commit| !reachable.contains(&commit.id) && commit.created_at < cutoff)
        .collect();

    let mut report = GcReport::default();
    for commit in doomed {
        let versions: Vec<String> = tx
            .outgoing(&commit.id, EdgeType::Includes.as_ref())
            .iter()
            .map(|edge| edge.to_id.clone())
            .collect();
        for id in versions {
            if tx.delete_node(&id).is_some() {
                report.deleted_scene_version_ids.push(id);
            }
        }
        tx.delete_node(&commit.id);
        report.deleted_commit_ids.push(commit.id);
    }
    Ok(report)
}

impl NarrativeStore {
    /// Delete commits unreachable from every branch head and older than
    /// `retention_days` (default from configuration), with the scene
    /// versions they include.
    ///
    /// A commit reachable from any head survives regardless of age.
    #[instrument(skip(self))]
    pub async fn gc_orphan_commits(&self, retention_days: Option<i64>) -> PalimpsestResult<GcReport> {
        let retention_days = retention_days.unwrap_or(*self.config().gc_retention_days());
        self.gc_orphan_commits_as_of(retention_days, Utc::now()).await
    }

    /// Like [`gc_orphan_commits`](Self::gc_orphan_commits) with an explicit clock.
    #[instrument(skip(self))]
    pub async fn gc_orphan_commits_as_of(
        &self,
        retention_days: i64,
        now: DateTime<Utc>,
    ) -> PalimpsestResult<GcReport> {
        let report = self.write(|tx| collect(tx, retention_days, now)).await?;
        info!(
            commits = report.deleted_commit_ids.len(),
            versions = report.deleted_scene_version_ids.len(),
            "Garbage collected orphan commits"
        );
        Ok(report)
    }
}
