//! Entities and the temporal relations between them.

use chrono::{DateTime, Utc};
use palimpsest_graph::{GraphEdge, GraphNode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of story entity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum EntityType {
    /// A person or agent
    Character,
    /// A place
    Location,
    /// A thing
    Object,
}

/// A character, location or object living on one branch of a root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity id
    pub id: String,
    /// Owning root
    pub root_id: String,
    /// Branch label the entity lives on
    pub branch_id: String,
    /// Kind of entity
    pub entity_type: EntityType,
    /// Display name
    pub name: String,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Free-form state, changed only through merge patches
    #[serde(default)]
    pub semantic_states: Map<String, Value>,
    /// Where the entity is in its arc
    pub arc_status: String,
    /// A character agent is attached
    #[serde(default)]
    pub has_agent: bool,
    /// Attached agent state id
    pub agent_state_id: Option<String>,
}

impl GraphNode for Entity {
    const LABEL: &'static str = "Entity";

    fn node_id(&self) -> &str {
        &self.id
    }
}

/// Fields supplied when creating an entity.
///
/// # Examples
///
/// ```
/// use palimpsest_core::{EntityType, NewEntityBuilder};
///
/// let new_entity = NewEntityBuilder::default()
///     .name("Harbor")
///     .entity_type(EntityType::Location)
///     .arc_status("static")
///     .build()
///     .unwrap();
/// assert!(new_entity.tags.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct NewEntity {
    /// Display name
    pub name: String,
    /// Kind of entity
    pub entity_type: EntityType,
    /// Where the entity is in its arc
    pub arc_status: String,
    /// Free-form tags
    #[builder(default)]
    #[serde(default)]
    pub tags: Vec<String>,
    /// Initial state
    #[builder(default)]
    #[serde(default)]
    pub semantic_states: Map<String, Value>,
    /// Explicit id; a random one is assigned when absent
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub id: Option<String>,
}

/// A directed, typed entity relationship valid over `[start_scene_seq, end_scene_seq)`.
///
/// An open interval (`end_scene_seq == None`) is still active. For a fixed
/// (source, relation type, branch) key the intervals never overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalRelation {
    /// Relation id
    pub id: String,
    /// Source entity
    pub from_id: String,
    /// Target entity
    pub to_id: String,
    /// Owning root
    pub root_id: String,
    /// Branch label the relation lives on
    pub branch_id: String,
    /// Relation type, e.g. `AT` or `TRUSTS`
    pub relation_type: String,
    /// Narrative tension carried by the relation
    pub tension: i64,
    /// First scene sequence where the relation holds
    pub start_scene_seq: i64,
    /// First scene sequence where it no longer holds
    pub end_scene_seq: Option<i64>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// When the interval was closed
    pub invalidated_at: Option<DateTime<Utc>>,
}

impl TemporalRelation {
    /// True when the relation holds at `scene_seq`.
    pub fn is_active_at(&self, scene_seq: i64) -> bool {
        self.start_scene_seq <= scene_seq && self.end_scene_seq.is_none_or(|end| scene_seq < end)
    }

    /// True when the interval contains no scene at all.
    pub fn is_empty(&self) -> bool {
        self.end_scene_seq
            .is_some_and(|end| end <= self.start_scene_seq)
    }

    /// True when both relations share a key.
    pub fn same_key(&self, other: &TemporalRelation) -> bool {
        self.from_id == other.from_id
            && self.relation_type == other.relation_type
            && self.branch_id == other.branch_id
            && self.root_id == other.root_id
    }

    /// True when the two intervals share at least one scene sequence.
    pub fn overlaps(&self, other: &TemporalRelation) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let before_end = |start: i64, end: Option<i64>| end.is_none_or(|end| start < end);
        before_end(self.start_scene_seq, other.end_scene_seq)
            && before_end(other.start_scene_seq, self.end_scene_seq)
    }

    /// Close the interval at `scene_seq`.
    pub fn close_at(&mut self, scene_seq: i64) {
        self.end_scene_seq = Some(scene_seq);
        self.invalidated_at = Some(Utc::now());
    }

    /// Extend the interval to `end_scene_seq`, clearing the invalidation
    /// stamp when the relation becomes open again.
    pub fn extend_to(&mut self, end_scene_seq: Option<i64>) {
        self.end_scene_seq = end_scene_seq;
        if end_scene_seq.is_none() {
            self.invalidated_at = None;
        }
    }
}

impl GraphEdge for TemporalRelation {
    const TYPE: &'static str = "TemporalRelation";

    fn edge_id(&self) -> &str {
        &self.id
    }

    fn from_id(&self) -> &str {
        &self.from_id
    }

    fn to_id(&self) -> &str {
        &self.to_id
    }
}
