//! Materialized world state.

use crate::TemporalRelation;
use chrono::{DateTime, Utc};
use palimpsest_graph::GraphNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One active relation as seen in a world state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationView {
    /// Source entity
    pub from_id: String,
    /// Relation type
    pub relation_type: String,
    /// Target entity
    pub to_id: String,
    /// Narrative tension
    pub tension: i64,
}

impl From<&TemporalRelation> for RelationView {
    fn from(relation: &TemporalRelation) -> Self {
        Self {
            from_id: relation.from_id.clone(),
            relation_type: relation.relation_type.clone(),
            to_id: relation.to_id.clone(),
            tension: relation.tension,
        }
    }
}

/// Which relations hold at a scene sequence.
///
/// `states` maps entity id → relation type → target entity id; `relations`
/// lists the same relations with their tension, ordered by
/// (source, relation type, target).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldState {
    /// entity → relation type → target
    pub states: BTreeMap<String, BTreeMap<String, String>>,
    /// Active relations
    pub relations: Vec<RelationView>,
}

impl WorldState {
    /// Build from a set of relations that hold at the same scene.
    ///
    /// Relations are applied in order, so a later relation for the same
    /// (source, relation type) replaces an earlier one.
    pub fn from_relations<I>(relations: I) -> Self
    where
        I: IntoIterator<Item = RelationView>,
    {
        let mut state = Self::default();
        state.apply(relations);
        state
    }

    /// Apply relation changes in order on top of the current state.
    pub fn apply<I>(&mut self, changes: I)
    where
        I: IntoIterator<Item = RelationView>,
    {
        let mut by_key: BTreeMap<(String, String), RelationView> = self
            .relations
            .drain(..)
            .map(|view| ((view.from_id.clone(), view.relation_type.clone()), view))
            .collect();
        for view in changes {
            self.states
                .entry(view.from_id.clone())
                .or_default()
                .insert(view.relation_type.clone(), view.to_id.clone());
            by_key.insert((view.from_id.clone(), view.relation_type.clone()), view);
        }
        self.relations = by_key.into_values().collect();
        self.relations.sort();
    }

    /// Target of `relation_type` from `entity_id`, if any.
    pub fn target(&self, entity_id: &str, relation_type: &str) -> Option<&str> {
        self.states
            .get(entity_id)
            .and_then(|relations| relations.get(relation_type))
            .map(String::as_str)
    }
}

/// World state materialized at one scene sequence of a branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Snapshot id, `{root}:{branch}:snapshot:{seq}`
    pub id: String,
    /// Owning root
    pub root_id: String,
    /// Scene version that first triggered the snapshot
    pub scene_version_id: String,
    /// Branch label
    pub branch_id: String,
    /// Scene sequence the state was computed at
    pub scene_seq: i64,
    /// entity → relation type → target
    pub entity_states: BTreeMap<String, BTreeMap<String, String>>,
    /// Active relations
    pub relations: Vec<RelationView>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl WorldSnapshot {
    /// The stored world state.
    pub fn world_state(&self) -> WorldState {
        WorldState {
            states: self.entity_states.clone(),
            relations: self.relations.clone(),
        }
    }
}

impl GraphNode for WorldSnapshot {
    const LABEL: &'static str = "WorldSnapshot";

    fn node_id(&self) -> &str {
        &self.id
    }
}
