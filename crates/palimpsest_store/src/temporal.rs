//! Interval-valid relations between entities.

use crate::NarrativeStore;
use crate::queries::{invalidate_snapshots, relations_on, require, require_entity_on};
use chrono::Utc;
use palimpsest_core::{Entity, RelationView, TemporalRelation, WorldState, ids};
use palimpsest_error::{PalimpsestResult, StoreError};
use palimpsest_graph::{GraphTransaction, PropertyGraph};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Close the relation active at `scene_seq` for (from, type, branch) and
/// open a new one starting there.
///
/// When a later relation for the key already exists, the new one ends where
/// that one starts, keeping intervals disjoint. Snapshots of the branch at
/// or after `scene_seq` are deleted since they no longer reflect history.
pub(crate) fn upsert_relation(
    tx: &mut GraphTransaction<'_>,
    from_entity_id: &str,
    to_entity_id: &str,
    relation_type: &str,
    tension: i64,
    scene_seq: i64,
    branch_id: &str,
) -> PalimpsestResult<TemporalRelation> {
    if relation_type.trim().is_empty() {
        return Err(StoreError::validation("relation_type is required").into());
    }
    if scene_seq < 0 {
        return Err(StoreError::validation(format!("negative scene sequence {}", scene_seq)).into());
    }
    let from: Entity = require(tx, from_entity_id)?;
    let root_id = from.root_id;
    require_entity_on(tx, &root_id, branch_id, from_entity_id)?;
    require_entity_on(tx, &root_id, branch_id, to_entity_id)?;

    let key: Vec<TemporalRelation> = relations_on(tx, branch_id, Some(&root_id))?
        .into_iter()
        .filter(|relation| {
            relation.from_id == from_entity_id && relation.relation_type == relation_type
        })
        .collect();

    let mut active: Vec<TemporalRelation> = key
        .iter()
        .filter(|relation| relation.is_active_at(scene_seq))
        .cloned()
        .collect();
    if active.len() > 1 {
        return Err(StoreError::invariant(format!(
            "{} active {} relations from {} at scene {} on branch {}",
            active.len(),
            relation_type,
            from_entity_id,
            scene_seq,
            branch_id
        ))
        .into());
    }
    let next_start = key
        .iter()
        .filter(|relation| !relation.is_empty() && relation.start_scene_seq > scene_seq)
        .map(|relation| relation.start_scene_seq)
        .min();

    if let Some(mut previous) = active.pop() {
        previous.close_at(scene_seq);
        tx.put_edge(&previous)?;
        debug!(relation = %previous.id, "Closed active relation");
    }

    let relation = TemporalRelation {
        id: ids::new_id(),
        from_id: from_entity_id.to_string(),
        to_id: to_entity_id.to_string(),
        root_id: root_id.clone(),
        branch_id: branch_id.to_string(),
        relation_type: relation_type.to_string(),
        tension,
        start_scene_seq: scene_seq,
        end_scene_seq: next_start,
        created_at: Utc::now(),
        invalidated_at: None,
    };
    tx.put_edge(&relation)?;

    let stale = invalidate_snapshots(tx, &root_id, branch_id, Some(scene_seq))?;
    info!(
        relation = %relation.id,
        scene_seq,
        stale_snapshots = stale.len(),
        "Upserted temporal relation"
    );
    Ok(relation)
}

/// Delete a relation and hand its interval back to the relation it closed.
///
/// The predecessor on the same key, the one ending where `relation` starts,
/// is extended to `relation`'s end so that the key's history stays
/// contiguous and replay from an older snapshot sees no phantom change.
pub(crate) fn detach_relation(
    tx: &mut GraphTransaction<'_>,
    relation: &TemporalRelation,
) -> PalimpsestResult<()> {
    tx.delete_edge(&relation.id);
    if relation.is_empty() {
        return Ok(());
    }
    let predecessor = relations_on(tx, &relation.branch_id, Some(&relation.root_id))?
        .into_iter()
        .find(|candidate| {
            candidate.same_key(relation)
                && !candidate.is_empty()
                && candidate.end_scene_seq == Some(relation.start_scene_seq)
        });
    if let Some(mut predecessor) = predecessor {
        predecessor.extend_to(relation.end_scene_seq);
        tx.put_edge(&predecessor)?;
        debug!(
            relation = %predecessor.id,
            end = ?predecessor.end_scene_seq,
            "Extended predecessor relation"
        );
    }
    Ok(())
}

/// World state at `scene_seq` from a full scan of the branch's relations.
///
/// Fails with `InvariantViolation` if two relations for one key are active.
pub(crate) fn full_scan(
    graph: &PropertyGraph,
    branch_id: &str,
    scene_seq: i64,
    root_id: Option<&str>,
) -> PalimpsestResult<WorldState> {
    let active: Vec<TemporalRelation> = relations_on(graph, branch_id, root_id)?
        .into_iter()
        .filter(|relation| relation.is_active_at(scene_seq))
        .collect();
    let mut keys = HashSet::new();
    for relation in &active {
        if !keys.insert((relation.from_id.as_str(), relation.relation_type.as_str())) {
            return Err(StoreError::invariant(format!(
                "multiple active {} relations from {} at scene {} on branch {}",
                relation.relation_type, relation.from_id, scene_seq, branch_id
            ))
            .into());
        }
    }
    Ok(WorldState::from_relations(
        active.iter().map(RelationView::from),
    ))
}

impl NarrativeStore {
    /// Record that `from` relates to `to` from `scene_seq` on, closing the
    /// relation that held until then.
    #[instrument(skip(self))]
    pub async fn upsert_relation(
        &self,
        from_entity_id: &str,
        to_entity_id: &str,
        relation_type: &str,
        tension: i64,
        scene_seq: i64,
        branch_id: &str,
    ) -> PalimpsestResult<TemporalRelation> {
        self.write(|tx| {
            upsert_relation(
                tx,
                from_entity_id,
                to_entity_id,
                relation_type,
                tension,
                scene_seq,
                branch_id,
            )
        })
        .await
    }

    /// Relations active at `scene_seq` on a branch, from a full scan.
    ///
    /// With `root_id` set, only that root's relations are considered.
    #[instrument(skip(self))]
    pub async fn build_world_state(
        &self,
        branch_id: &str,
        scene_seq: i64,
        root_id: Option<&str>,
    ) -> PalimpsestResult<WorldState> {
        self.read(|graph| full_scan(graph, branch_id, scene_seq, root_id))
            .await
    }

    /// Relations from one entity active at `scene_seq`, by relation type.
    #[instrument(skip(self))]
    pub async fn query_relations_at_scene(
        &self,
        from_entity_id: &str,
        branch_id: &str,
        scene_seq: i64,
    ) -> PalimpsestResult<Vec<TemporalRelation>> {
        self.read(|graph| {
            let entity: Entity = require(graph, from_entity_id)?;
            let mut relations: Vec<TemporalRelation> =
                relations_on(graph, branch_id, Some(&entity.root_id))?
                    .into_iter()
                    .filter(|relation| {
                        relation.from_id == from_entity_id && relation.is_active_at(scene_seq)
                    })
                    .collect();
            relations.sort_by(|a, b| {
                a.relation_type
                    .cmp(&b.relation_type)
                    .then_with(|| a.to_id.cmp(&b.to_id))
            });
            Ok(relations)
        })
        .await
    }
}
