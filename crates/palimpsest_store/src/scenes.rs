//! Scene reads and in-place annotations.
//!
//! Annotations edit the version a branch currently sees without creating a
//! commit or moving the head.

use crate::NarrativeStore;
use crate::queries::{
    entities_of, require, require_branch, require_scene_in, require_visible_version,
    scenes_of_root, visible_version,
};
use crate::snapshot::world_state_at;
use palimpsest_core::{
    Entity, EntityType, RelationView, SceneOrigin, SceneStatus, SceneVersion, WorldState,
};
use palimpsest_error::{PalimpsestResult, StoreError};
use palimpsest_graph::GraphTransaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Everything a writer needs to draft or check one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneContext {
    /// Owning root
    pub root_id: String,
    /// Branch the context was read on
    pub branch_id: String,
    /// What the scene is meant to achieve
    pub expected_outcome: String,
    /// Summary so far, empty when none
    pub summary: String,
    /// entity → relation type → target at the scene's sequence
    pub semantic_states: BTreeMap<String, BTreeMap<String, String>>,
    /// Entities of the branch
    pub scene_entities: Vec<Entity>,
    /// Character entities of the branch
    pub characters: Vec<Entity>,
    /// Relations active at the scene's sequence
    pub relations: Vec<RelationView>,
    /// Scene just before this one
    pub prev_scene_id: Option<String>,
    /// Scene just after this one
    pub next_scene_id: Option<String>,
}

/// Apply `edit` to the version of a scene visible on a branch.
fn annotate<F>(
    tx: &mut GraphTransaction<'_>,
    scene_origin_id: &str,
    branch_id: &str,
    edit: F,
) -> PalimpsestResult<SceneVersion>
where
    F: FnOnce(&mut SceneVersion),
{
    let scene: SceneOrigin = require(tx, scene_origin_id)?;
    let mut version = require_visible_version(tx, &scene.root_id, branch_id, scene_origin_id)?;
    edit(&mut version);
    tx.put(&version)?;
    Ok(version)
}

impl NarrativeStore {
    /// Load a scene origin.
    #[instrument(skip(self))]
    pub async fn get_scene_origin(&self, scene_origin_id: &str) -> PalimpsestResult<SceneOrigin> {
        self.read(|graph| require(graph, scene_origin_id)).await
    }

    /// Load a scene version by id.
    #[instrument(skip(self))]
    pub async fn get_scene_version(&self, scene_version_id: &str) -> PalimpsestResult<SceneVersion> {
        self.read(|graph| require(graph, scene_version_id)).await
    }

    /// The version of a scene the branch head currently sees.
    #[instrument(skip(self))]
    pub async fn get_visible_scene_version(
        &self,
        root_id: &str,
        branch_id: &str,
        scene_origin_id: &str,
    ) -> PalimpsestResult<SceneVersion> {
        self.read(|graph| require_visible_version(graph, root_id, branch_id, scene_origin_id))
            .await
    }

    /// Store rendered prose on the visible version.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn save_scene_render(
        &self,
        scene_origin_id: &str,
        branch_id: &str,
        content: &str,
    ) -> PalimpsestResult<SceneVersion> {
        self.write(|tx| {
            annotate(tx, scene_origin_id, branch_id, |version| {
                version.rendered_content = Some(content.to_string());
            })
        })
        .await
    }

    /// Record what happened in a scene and mark it committed.
    #[instrument(skip(self, actual_outcome, summary))]
    pub async fn complete_scene(
        &self,
        scene_origin_id: &str,
        branch_id: &str,
        actual_outcome: &str,
        summary: &str,
    ) -> PalimpsestResult<SceneVersion> {
        self.write(|tx| {
            let version = annotate(tx, scene_origin_id, branch_id, |version| {
                version.actual_outcome = Some(actual_outcome.to_string());
                version.summary = Some(summary.to_string());
                version.status = SceneStatus::Committed;
            })?;
            info!(version = %version.id, "Completed scene");
            Ok(version)
        })
        .await
    }

    /// Allow a scene to break world logic, with the reason why.
    #[instrument(skip(self))]
    pub async fn mark_scene_logic_exception(
        &self,
        root_id: &str,
        branch_id: &str,
        scene_origin_id: &str,
        reason: &str,
    ) -> PalimpsestResult<SceneVersion> {
        if reason.trim().is_empty() {
            return Err(StoreError::validation("logic exception reason is required").into());
        }
        self.write(|tx| {
            require_branch(tx, root_id, branch_id)?;
            annotate(tx, scene_origin_id, branch_id, |version| {
                version.logic_exception = true;
                version.logic_exception_reason = Some(reason.to_string());
            })
        })
        .await
    }

    /// True when the visible version is marked as a logic exception.
    #[instrument(skip(self))]
    pub async fn is_scene_logic_exception(
        &self,
        root_id: &str,
        branch_id: &str,
        scene_origin_id: &str,
    ) -> PalimpsestResult<bool> {
        self.read(|graph| {
            Ok(require_visible_version(graph, root_id, branch_id, scene_origin_id)?.logic_exception)
        })
        .await
    }

    /// Mark a scene for re-rendering and return the scenes touched.
    #[instrument(skip(self))]
    pub async fn apply_local_scene_fix(
        &self,
        root_id: &str,
        branch_id: &str,
        scene_origin_id: &str,
    ) -> PalimpsestResult<Vec<String>> {
        self.write(|tx| {
            require_branch(tx, root_id, branch_id)?;
            annotate(tx, scene_origin_id, branch_id, |version| version.dirty = true)?;
            Ok(vec![scene_origin_id.to_string()])
        })
        .await
    }

    /// Mark a scene for re-rendering.
    #[instrument(skip(self))]
    pub async fn mark_scene_dirty(
        &self,
        scene_origin_id: &str,
        branch_id: &str,
    ) -> PalimpsestResult<()> {
        self.write(|tx| {
            annotate(tx, scene_origin_id, branch_id, |version| version.dirty = true)?;
            Ok(())
        })
        .await
    }

    /// Mark every later scene of the root dirty on a branch.
    ///
    /// Returns the marked scenes by sequence index. Scenes the branch cannot
    /// see are skipped.
    #[instrument(skip(self))]
    pub async fn mark_future_scenes_dirty(
        &self,
        root_id: &str,
        branch_id: &str,
        scene_origin_id: &str,
    ) -> PalimpsestResult<Vec<String>> {
        self.write(|tx| {
            require_branch(tx, root_id, branch_id)?;
            let scene = require_scene_in(tx, root_id, scene_origin_id)?;
            let later: Vec<SceneOrigin> = scenes_of_root(tx, root_id)?
                .into_iter()
                .filter(|other| other.sequence_index > scene.sequence_index)
                .collect();
            let mut marked = Vec::new();
            for other in later {
                if let Some(mut version) = visible_version(tx, root_id, branch_id, &other.id)? {
                    version.dirty = true;
                    tx.put(&version)?;
                    marked.push(other.id);
                }
            }
            info!(marked = marked.len(), "Marked future scenes dirty");
            Ok(marked)
        })
        .await
    }

    /// Scenes whose visible version needs re-rendering, by id.
    #[instrument(skip(self))]
    pub async fn list_dirty_scenes(
        &self,
        root_id: &str,
        branch_id: &str,
    ) -> PalimpsestResult<Vec<String>> {
        self.read(|graph| {
            require_branch(graph, root_id, branch_id)?;
            let mut dirty = Vec::new();
            for scene in scenes_of_root(graph, root_id)? {
                if visible_version(graph, root_id, branch_id, &scene.id)?
                    .is_some_and(|version| version.dirty)
                {
                    dirty.push(scene.id);
                }
            }
            dirty.sort();
            Ok(dirty)
        })
        .await
    }

    /// Outcome, neighbours, entities and world state around a scene.
    #[instrument(skip(self))]
    pub async fn get_scene_context(
        &self,
        scene_origin_id: &str,
        branch_id: &str,
    ) -> PalimpsestResult<SceneContext> {
        self.read(|graph| {
            let scene: SceneOrigin = require(graph, scene_origin_id)?;
            let root_id = scene.root_id.as_str();
            let version = require_visible_version(graph, root_id, branch_id, scene_origin_id)?;
            let scenes = scenes_of_root(graph, root_id)?;
            let prev_scene_id = scenes
                .iter()
                .rev()
                .find(|other| other.sequence_index < scene.sequence_index)
                .map(|other| other.id.clone());
            let next_scene_id = scenes
                .iter()
                .find(|other| other.sequence_index > scene.sequence_index)
                .map(|other| other.id.clone());

            let scene_entities = entities_of(graph, root_id, branch_id)?;
            let characters = scene_entities
                .iter()
                .filter(|entity| entity.entity_type == EntityType::Character)
                .cloned()
                .collect();
            let state = world_state_at(graph, root_id, branch_id, scene.sequence_index)?;
            debug!(relations = state.relations.len(), "Built scene context");
            Ok(SceneContext {
                root_id: root_id.to_string(),
                branch_id: branch_id.to_string(),
                expected_outcome: version.expected_outcome,
                summary: version.summary.unwrap_or_default(),
                semantic_states: state.states,
                scene_entities,
                characters,
                relations: state.relations,
                prev_scene_id,
                next_scene_id,
            })
        })
        .await
    }

    /// World state at a scene's sequence index, for logic checks.
    #[instrument(skip(self))]
    pub async fn build_logic_check_world_state(
        &self,
        root_id: &str,
        branch_id: &str,
        scene_origin_id: &str,
    ) -> PalimpsestResult<WorldState> {
        self.read(|graph| {
            require_branch(graph, root_id, branch_id)?;
            let scene = require_scene_in(graph, root_id, scene_origin_id)?;
            world_state_at(graph, root_id, branch_id, scene.sequence_index)
        })
        .await
    }
}
