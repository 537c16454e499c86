//! Roots, bulk import and branch listings.

use crate::NarrativeStore;
use crate::queries::{
    attach_version, create_commit, entities_of, install_head, latest_scene_seq, require,
    require_branch, require_head, require_root, scenes_of_root, visible_version,
};
use crate::snapshot::world_state_at;
use palimpsest_core::{
    Branch, BranchHead, CharacterSeed, Commit, EdgeType, Entity, EntityType, RelationView, Root,
    SceneOrigin, SceneSeed, SceneStatus, SceneVersion, StorySeed, ids,
};
use palimpsest_error::{PalimpsestResult, StoreError, StoreErrorKind};
use palimpsest_graph::{GraphTransaction, PropertyGraph};
use palimpsest_interface::NodeRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// A scene as seen from one branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSummary {
    /// Scene identity
    pub origin: SceneOrigin,
    /// Version visible on the branch, if any
    pub version: Option<SceneVersion>,
}

/// Point-in-time view of a root on one branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootSnapshot {
    /// The root with its narrative frame
    pub root: Root,
    /// Branch the view was taken on
    pub branch_id: String,
    /// Character entities, by name
    pub characters: Vec<Entity>,
    /// Scenes by sequence index
    pub scenes: Vec<SceneSummary>,
    /// Relations active at the latest scene
    pub relations: Vec<RelationView>,
}

fn character_entity(root_id: &str, branch_id: &str, seed: CharacterSeed) -> Entity {
    let mut semantic_states = Map::new();
    semantic_states.insert("ambition".to_string(), Value::String(seed.ambition));
    semantic_states.insert("conflict".to_string(), Value::String(seed.conflict));
    semantic_states.insert("epiphany".to_string(), Value::String(seed.epiphany));
    semantic_states.insert("voice_dna".to_string(), Value::String(seed.voice_dna));
    Entity {
        id: seed.entity_id.unwrap_or_else(ids::new_id),
        root_id: root_id.to_string(),
        branch_id: branch_id.to_string(),
        entity_type: EntityType::Character,
        name: seed.name,
        tags: Vec::new(),
        semantic_states,
        arc_status: "active".to_string(),
        has_agent: false,
        agent_state_id: None,
    }
}

fn import_scene(
    tx: &mut GraphTransaction<'_>,
    root_id: &str,
    commit_id: &str,
    seed: SceneSeed,
) -> PalimpsestResult<()> {
    let scene = SceneOrigin {
        id: seed.id.unwrap_or_else(ids::new_id),
        root_id: root_id.to_string(),
        title: seed.title,
        initial_commit_id: commit_id.to_string(),
        sequence_index: seed.sequence_index,
        parent_act_id: seed.parent_act_id,
        chapter_id: None,
        is_skeleton: false,
    };
    tx.create(&scene)?;
    let version = SceneVersion {
        id: ids::scene_version_id(&scene.id),
        scene_origin_id: scene.id.clone(),
        commit_id: commit_id.to_string(),
        pov_character_id: seed.pov_character_id,
        status: SceneStatus::Draft,
        expected_outcome: seed.expected_outcome,
        conflict_type: seed.conflict_type,
        actual_outcome: seed.actual_outcome,
        summary: None,
        rendered_content: None,
        logic_exception: seed.logic_exception,
        logic_exception_reason: None,
        dirty: seed.is_dirty,
        simulation_log_id: None,
        is_simulated: false,
    };
    attach_version(tx, &version)
}

/// Nodes that belong to a root: everything carrying its `root_id`, plus
/// the versions, chapters, agents and simulation logs hanging off those.
fn root_scoped_nodes(graph: &PropertyGraph, root_id: &str) -> Vec<String> {
    let owned: Vec<&NodeRecord> = graph
        .nodes()
        .filter(|node| {
            node.id != root_id
                && node.properties.get("root_id").and_then(Value::as_str) == Some(root_id)
        })
        .collect();
    let mut doomed: BTreeSet<String> = owned.iter().map(|node| node.id.clone()).collect();
    for node in &owned {
        let dependents = match node.label.as_str() {
            "SceneOrigin" => graph.incoming(&node.id, EdgeType::OfOrigin.as_ref()),
            "Act" => graph.outgoing(&node.id, EdgeType::ContainsChapter.as_ref()),
            "Entity" => graph.incoming(&node.id, EdgeType::AgentOf.as_ref()),
            _ => Vec::new(),
        };
        for edge in dependents {
            let id = if edge.to_id == node.id { &edge.from_id } else { &edge.to_id };
            doomed.insert(id.clone());
        }
    }
    let logs: Vec<String> = graph
        .nodes_with_label("SimulationLog")
        .filter(|log| {
            log.properties
                .get("scene_version_id")
                .and_then(Value::as_str)
                .is_some_and(|version| doomed.contains(version))
        })
        .map(|log| log.id.clone())
        .collect();
    doomed.extend(logs);
    doomed.into_iter().collect()
}

impl NarrativeStore {
    /// Create a root with its default branch, an initial commit, character
    /// entities and scenes, all in one transaction. Returns the root id.
    ///
    /// Every scene needs a point-of-view character and a sequence index
    /// not used by another imported scene.
    #[instrument(skip_all, fields(characters = characters.len(), scenes = scenes.len()))]
    pub async fn save(
        &self,
        seed: StorySeed,
        characters: Vec<CharacterSeed>,
        scenes: Vec<SceneSeed>,
    ) -> PalimpsestResult<String> {
        let mut sequences = BTreeSet::new();
        for scene in &scenes {
            if scene.pov_character_id.is_none() {
                return Err(StoreError::validation(format!(
                    "scene '{}' has no pov_character_id",
                    scene.title
                ))
                .into());
            }
            if !sequences.insert(scene.sequence_index) {
                return Err(StoreError::new(StoreErrorKind::DuplicateSequence {
                    scope: "imported scenes".to_string(),
                    sequence: scene.sequence_index,
                })
                .into());
            }
        }

        let branch_id = self.config().default_branch().clone();
        self.write(|tx| {
            let mut root = Root::new(seed.logline, seed.theme, seed.ending);
            if let Some(highest) = sequences.last() {
                root.observe_scene_sequence(*highest);
            }
            tx.create(&root)?;
            tx.create(&Branch::new(root.id(), &branch_id))?;
            let commit = create_commit(tx, root.id(), &branch_id, None, "initial")?;
            install_head(tx, root.id(), &branch_id, &commit.id)?;

            for character in characters {
                tx.create(&character_entity(root.id(), &branch_id, character))?;
            }
            for scene in scenes {
                import_scene(tx, root.id(), &commit.id, scene)?;
            }
            info!(root = %root.id(), "Saved root");
            Ok(root.id().clone())
        })
        .await
    }

    /// Load a root.
    #[instrument(skip(self))]
    pub async fn get_root(&self, root_id: &str) -> PalimpsestResult<Root> {
        self.read(|graph| require_root(graph, root_id)).await
    }

    /// Roots, newest first.
    #[instrument(skip(self))]
    pub async fn list_roots(&self, limit: usize, offset: usize) -> PalimpsestResult<Vec<Root>> {
        self.read(|graph| {
            let mut roots = graph.all::<Root>()?;
            roots.sort_by(|a, b| {
                b.created_at()
                    .cmp(a.created_at())
                    .then_with(|| a.id().cmp(b.id()))
            });
            Ok(roots.into_iter().skip(offset).take(limit).collect())
        })
        .await
    }

    /// Edit a root's narrative metadata. `None` leaves a field unchanged.
    #[instrument(skip(self, logline, theme, ending))]
    pub async fn update_root_metadata(
        &self,
        root_id: &str,
        logline: Option<String>,
        theme: Option<String>,
        ending: Option<String>,
    ) -> PalimpsestResult<Root> {
        self.write(|tx| {
            let mut root = require_root(tx, root_id)?;
            root.update_metadata(logline, theme, ending);
            tx.put(&root)?;
            Ok(root)
        })
        .await
    }

    /// Delete a root that has no branches left, together with every record
    /// scoped to it. Returns the number of deleted nodes.
    #[instrument(skip(self))]
    pub async fn delete_root(&self, root_id: &str) -> PalimpsestResult<usize> {
        self.write(|tx| {
            require_root(tx, root_id)?;
            let branches = tx
                .all::<Branch>()?
                .into_iter()
                .filter(|branch| branch.root_id == root_id)
                .count();
            if branches > 0 {
                return Err(StoreError::validation(format!(
                    "root {} still has {} branches",
                    root_id, branches
                ))
                .into());
            }
            let doomed = root_scoped_nodes(tx, root_id);
            for id in &doomed {
                tx.delete_node(id);
            }
            tx.delete_node(root_id);
            info!(deleted = doomed.len() + 1, "Deleted root");
            Ok(doomed.len() + 1)
        })
        .await
    }

    /// Delete a branch and its head. Its commits stay until garbage
    /// collected, as do the entities and records living on it.
    #[instrument(skip(self))]
    pub async fn delete_branch(&self, root_id: &str, branch_id: &str) -> PalimpsestResult<()> {
        self.write(|tx| {
            let branch = require_branch(tx, root_id, branch_id)?;
            tx.delete_node(&ids::branch_head_id(root_id, branch_id));
            tx.delete_node(&branch.id);
            info!("Deleted branch");
            Ok(())
        })
        .await
    }

    /// Branch labels of a root, sorted.
    #[instrument(skip(self))]
    pub async fn list_branches(&self, root_id: &str) -> PalimpsestResult<Vec<String>> {
        self.read(|graph| {
            require_root(graph, root_id)?;
            let mut labels: Vec<String> = graph
                .all::<Branch>()?
                .into_iter()
                .filter(|branch| branch.root_id == root_id)
                .map(|branch| branch.branch_id)
                .collect();
            labels.sort();
            Ok(labels)
        })
        .await
    }

    /// Load a branch, failing with `NotFound` if the root or branch is missing.
    #[instrument(skip(self))]
    pub async fn require_branch(&self, root_id: &str, branch_id: &str) -> PalimpsestResult<Branch> {
        self.read(|graph| require_branch(graph, root_id, branch_id))
            .await
    }

    /// Load a branch head.
    #[instrument(skip(self))]
    pub async fn get_branch_head(
        &self,
        root_id: &str,
        branch_id: &str,
    ) -> PalimpsestResult<BranchHead> {
        self.read(|graph| require_head(graph, root_id, branch_id))
            .await
    }

    /// Load a commit.
    #[instrument(skip(self))]
    pub async fn get_commit(&self, commit_id: &str) -> PalimpsestResult<Commit> {
        self.read(|graph| require(graph, commit_id)).await
    }

    /// Characters, scenes and current relations of a root as seen from a branch.
    #[instrument(skip(self))]
    pub async fn get_root_snapshot(
        &self,
        root_id: &str,
        branch_id: &str,
    ) -> PalimpsestResult<RootSnapshot> {
        self.read(|graph| {
            let root = require_root(graph, root_id)?;
            require_branch(graph, root_id, branch_id)?;
            let characters = entities_of(graph, root_id, branch_id)?
                .into_iter()
                .filter(|entity| entity.entity_type == EntityType::Character)
                .collect();
            let scenes = scenes_of_root(graph, root_id)?
                .into_iter()
                .map(|origin| {
                    let version = visible_version(graph, root_id, branch_id, &origin.id)?;
                    Ok(SceneSummary { origin, version })
                })
                .collect::<PalimpsestResult<Vec<_>>>()?;
            let seq = latest_scene_seq(graph, root_id)?;
            let relations = world_state_at(graph, root_id, branch_id, seq)?.relations;
            debug!(scenes = scenes.len(), "Built root snapshot");
            Ok(RootSnapshot {
                root,
                branch_id: branch_id.to_string(),
                characters,
                scenes,
                relations,
            })
        })
        .await
    }
}
