//! Entity CRUD and semantic state patches.

use crate::NarrativeStore;
use crate::queries::{
    entities_of, invalidate_snapshots, latest_scene_seq, require, require_branch,
    require_entity_on, require_visible_version, scenes_of_root,
};
use crate::snapshot::snapshot_if_needed;
use crate::temporal::{detach_relation, upsert_relation};
use palimpsest_core::{EdgeType, Entity, NewEntity, TemporalRelation, ids, merge_shallow};
use palimpsest_error::{PalimpsestResult, StoreError, StoreErrorKind};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

impl NarrativeStore {
    /// Create an entity on a branch.
    #[instrument(skip(self, new_entity), fields(name = %new_entity.name))]
    pub async fn create_entity(
        &self,
        root_id: &str,
        branch_id: &str,
        new_entity: NewEntity,
    ) -> PalimpsestResult<Entity> {
        if new_entity.name.trim().is_empty() {
            return Err(StoreError::validation("entity name is required").into());
        }
        self.write(|tx| {
            require_branch(tx, root_id, branch_id)?;
            let id = new_entity.id.unwrap_or_else(ids::new_id);
            if tx.contains_node(&id) {
                return Err(StoreError::new(StoreErrorKind::AlreadyExists(format!(
                    "node {}",
                    id
                )))
                .into());
            }
            let entity = Entity {
                id,
                root_id: root_id.to_string(),
                branch_id: branch_id.to_string(),
                entity_type: new_entity.entity_type,
                name: new_entity.name,
                tags: new_entity.tags,
                semantic_states: new_entity.semantic_states,
                arc_status: new_entity.arc_status,
                has_agent: false,
                agent_state_id: None,
            };
            tx.create(&entity)?;
            info!(entity = %entity.id, "Created entity");
            Ok(entity)
        })
        .await
    }

    /// Load an entity.
    #[instrument(skip(self))]
    pub async fn get_entity(&self, entity_id: &str) -> PalimpsestResult<Entity> {
        self.read(|graph| require(graph, entity_id)).await
    }

    /// Entities of a branch, by name.
    #[instrument(skip(self))]
    pub async fn list_entities(
        &self,
        root_id: &str,
        branch_id: &str,
    ) -> PalimpsestResult<Vec<Entity>> {
        self.read(|graph| {
            require_branch(graph, root_id, branch_id)?;
            entities_of(graph, root_id, branch_id)
        })
        .await
    }

    /// Edit an entity's name, tags or arc status. `None` leaves a field unchanged.
    #[instrument(skip(self, tags))]
    pub async fn update_entity(
        &self,
        entity_id: &str,
        name: Option<String>,
        tags: Option<Vec<String>>,
        arc_status: Option<String>,
    ) -> PalimpsestResult<Entity> {
        if name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(StoreError::validation("entity name must not be empty").into());
        }
        self.write(|tx| {
            let mut entity: Entity = require(tx, entity_id)?;
            if let Some(name) = name {
                entity.name = name;
            }
            if let Some(tags) = tags {
                entity.tags = tags;
            }
            if let Some(arc_status) = arc_status {
                entity.arc_status = arc_status;
            }
            tx.put(&entity)?;
            Ok(entity)
        })
        .await
    }

    /// Delete an entity, its temporal relations and its agent state.
    ///
    /// A relation pointing at the entity hands its interval back to the
    /// relation it closed, so the source's earlier relation holds again.
    ///
    /// Every snapshot of the entity's branch is deleted, since each may
    /// mention the removed relations.
    #[instrument(skip(self))]
    pub async fn delete_entity(&self, entity_id: &str) -> PalimpsestResult<()> {
        self.write(|tx| {
            let entity: Entity = require(tx, entity_id)?;
            let mut relations: Vec<TemporalRelation> = tx
                .all_edges::<TemporalRelation>()?
                .into_iter()
                .filter(|relation| relation.from_id == entity_id || relation.to_id == entity_id)
                .collect();
            relations.sort_by_key(|relation| relation.start_scene_seq);
            for relation in &relations {
                detach_relation(tx, relation)?;
            }
            let agents: Vec<String> = tx
                .incoming(entity_id, EdgeType::AgentOf.as_ref())
                .iter()
                .map(|edge| edge.from_id.clone())
                .chain(entity.agent_state_id.clone())
                .collect();
            for id in &agents {
                tx.delete_node(id);
            }
            let stale = invalidate_snapshots(tx, &entity.root_id, &entity.branch_id, None)?;
            tx.delete_node(entity_id);
            info!(
                relations = relations.len(),
                stale_snapshots = stale.len(),
                "Deleted entity"
            );
            Ok(())
        })
        .await
    }

    /// Shallow-merge `patch` into an entity's semantic states and return the result.
    #[instrument(skip(self, patch), fields(keys = patch.len()))]
    pub async fn apply_semantic_states_patch(
        &self,
        entity_id: &str,
        patch: Map<String, Value>,
    ) -> PalimpsestResult<Map<String, Value>> {
        self.write(|tx| {
            let mut entity: Entity = require(tx, entity_id)?;
            entity.semantic_states = merge_shallow(&entity.semantic_states, &patch);
            tx.put(&entity)?;
            debug!("Patched semantic states");
            Ok(entity.semantic_states)
        })
        .await
    }

    /// An entity's semantic states.
    #[instrument(skip(self))]
    pub async fn get_entity_semantic_states(
        &self,
        entity_id: &str,
    ) -> PalimpsestResult<Map<String, Value>> {
        self.read(|graph| Ok(require::<Entity>(graph, entity_id)?.semantic_states))
            .await
    }

    /// Upsert a relation at the root's latest scene sequence.
    ///
    /// When that sequence is on the snapshot interval, the branch-visible
    /// version of the scene at it is linked to a snapshot. Fails with
    /// `NotFound`, writing nothing, if the branch cannot see that scene.
    #[instrument(skip(self))]
    pub async fn upsert_entity_relation(
        &self,
        root_id: &str,
        branch_id: &str,
        from_entity_id: &str,
        to_entity_id: &str,
        relation_type: &str,
        tension: i64,
    ) -> PalimpsestResult<TemporalRelation> {
        let config = self.config();
        self.write(|tx| {
            require_branch(tx, root_id, branch_id)?;
            require_entity_on(tx, root_id, branch_id, from_entity_id)?;
            let scene_seq = latest_scene_seq(tx, root_id)?;
            let relation = upsert_relation(
                tx,
                from_entity_id,
                to_entity_id,
                relation_type,
                tension,
                scene_seq,
                branch_id,
            )?;
            if config.should_create_snapshot(scene_seq) {
                let scene = scenes_of_root(tx, root_id)?
                    .into_iter()
                    .find(|scene| scene.sequence_index == scene_seq)
                    .ok_or_else(|| {
                        StoreError::not_found(format!(
                            "Scene at sequence {} in root {}",
                            scene_seq, root_id
                        ))
                    })?;
                let version = require_visible_version(tx, root_id, branch_id, &scene.id)?;
                snapshot_if_needed(tx, config, &version.id, branch_id, scene_seq)?;
            }
            Ok(relation)
        })
        .await
    }
}

