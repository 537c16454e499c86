//! Snapshot accelerator for point-in-time world state reads.

use crate::NarrativeStore;
use crate::queries::{find, relations_on, require, snapshots_of};
use crate::temporal::full_scan;
use chrono::Utc;
use palimpsest_core::{
    EdgeType, RelationView, SceneOrigin, SceneVersion, StoreConfig, TemporalRelation, WorldSnapshot,
    WorldState, ids,
};
use palimpsest_error::PalimpsestResult;
use palimpsest_graph::{GraphTransaction, PropertyGraph};
use tracing::{debug, info, instrument};

/// World state at `scene_seq` via the latest snapshot at or before it.
///
/// Without a snapshot this falls back to a full scan. Otherwise only the
/// relations starting in `(snapshot.scene_seq, scene_seq]` are replayed onto
/// the snapshot, in start then source order.
pub(crate) fn world_state_at(
    graph: &PropertyGraph,
    root_id: &str,
    branch_id: &str,
    scene_seq: i64,
) -> PalimpsestResult<WorldState> {
    let snapshot = snapshots_of(graph, root_id, branch_id)?
        .into_iter()
        .rev()
        .find(|snapshot| snapshot.scene_seq <= scene_seq);
    let Some(snapshot) = snapshot else {
        debug!(scene_seq, "No snapshot, scanning all relations");
        return full_scan(graph, branch_id, scene_seq, Some(root_id));
    };
    let mut state = snapshot.world_state();
    if snapshot.scene_seq == scene_seq {
        return Ok(state);
    }
    let mut changes: Vec<TemporalRelation> = relations_on(graph, branch_id, Some(root_id))?
        .into_iter()
        .filter(|relation| {
            !relation.is_empty()
                && relation.start_scene_seq > snapshot.scene_seq
                && relation.start_scene_seq <= scene_seq
        })
        .collect();
    changes.sort_by(|a, b| {
        a.start_scene_seq
            .cmp(&b.start_scene_seq)
            .then_with(|| a.from_id.cmp(&b.from_id))
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    debug!(
        from = snapshot.scene_seq,
        to = scene_seq,
        changes = changes.len(),
        "Replaying relations onto snapshot"
    );
    state.apply(changes.iter().map(RelationView::from));
    Ok(state)
}

/// Link `scene_version_id` to the snapshot for its root, branch and
/// sequence, materializing it first if it does not exist yet.
///
/// Returns `None` when `scene_seq` is not on the snapshot interval.
pub(crate) fn snapshot_if_needed(
    tx: &mut GraphTransaction<'_>,
    config: &StoreConfig,
    scene_version_id: &str,
    branch_id: &str,
    scene_seq: i64,
) -> PalimpsestResult<Option<WorldSnapshot>> {
    if !config.should_create_snapshot(scene_seq) {
        return Ok(None);
    }
    let version: SceneVersion = require(tx, scene_version_id)?;
    let scene: SceneOrigin = require(tx, &version.scene_origin_id)?;
    let id = ids::snapshot_id(&scene.root_id, branch_id, scene_seq);

    let snapshot = match find::<WorldSnapshot>(tx, &id)? {
        Some(existing) => {
            debug!(snapshot = %existing.id, "Snapshot already exists");
            existing
        }
        None => {
            let state = full_scan(tx, branch_id, scene_seq, Some(&scene.root_id))?;
            let snapshot = WorldSnapshot {
                id,
                root_id: scene.root_id.clone(),
                scene_version_id: scene_version_id.to_string(),
                branch_id: branch_id.to_string(),
                scene_seq,
                entity_states: state.states,
                relations: state.relations,
                created_at: Utc::now(),
            };
            tx.create(&snapshot)?;
            info!(snapshot = %snapshot.id, scene_seq, "Created world snapshot");
            snapshot
        }
    };
    tx.link(
        EdgeType::EstablishesState.as_ref(),
        scene_version_id,
        &snapshot.id,
    )?;
    Ok(Some(snapshot))
}

impl NarrativeStore {
    /// True iff `scene_seq` is positive and on the snapshot interval.
    pub fn should_create_snapshot(&self, scene_seq: i64) -> bool {
        self.config().should_create_snapshot(scene_seq)
    }

    /// Materialize the world state at `scene_seq` unless a snapshot for it
    /// already exists, and link the scene version to it.
    ///
    /// Repeated calls return the same snapshot and add one
    /// `ESTABLISHES_STATE` link each.
    #[instrument(skip(self))]
    pub async fn create_snapshot_if_needed(
        &self,
        scene_version_id: &str,
        branch_id: &str,
        scene_seq: i64,
    ) -> PalimpsestResult<Option<WorldSnapshot>> {
        let config = self.config();
        self.write(|tx| snapshot_if_needed(tx, config, scene_version_id, branch_id, scene_seq))
            .await
    }

    /// World state at `scene_seq`, read through the latest snapshot.
    #[instrument(skip(self))]
    pub async fn get_world_state(
        &self,
        root_id: &str,
        branch_id: &str,
        scene_seq: i64,
    ) -> PalimpsestResult<WorldState> {
        self.read(|graph| world_state_at(graph, root_id, branch_id, scene_seq))
            .await
    }

    /// Snapshots of a branch by scene sequence.
    #[instrument(skip(self))]
    pub async fn list_snapshots(
        &self,
        root_id: &str,
        branch_id: &str,
    ) -> PalimpsestResult<Vec<WorldSnapshot>> {
        self.read(|graph| snapshots_of(graph, root_id, branch_id))
            .await
    }

    /// Scene versions linked to a snapshot, one entry per link.
    #[instrument(skip(self))]
    pub async fn snapshot_scene_versions(&self, snapshot_id: &str) -> PalimpsestResult<Vec<String>> {
        self.read(|graph| {
            require::<WorldSnapshot>(graph, snapshot_id)?;
            Ok(graph
                .incoming(snapshot_id, EdgeType::EstablishesState.as_ref())
                .iter()
                .map(|edge| edge.from_id.clone())
                .collect())
        })
        .await
    }
}
