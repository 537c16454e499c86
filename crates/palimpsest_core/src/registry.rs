//! Auxiliary registries: outline, anchors, agents, simulation logs, subplots.

use crate::{ids, merge_deep};
use derive_getters::Getters;
use palimpsest_error::{StoreError, StoreErrorKind};
use palimpsest_graph::GraphNode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A top-level division of a root's outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Act {
    /// Act id, `{root}:act:{seq}`
    pub id: String,
    /// Owning root
    pub root_id: String,
    /// Position, unique within the root
    pub sequence: i64,
    /// Title
    pub title: String,
    /// Narrative purpose
    pub purpose: String,
    /// Tone
    pub tone: String,
}

impl GraphNode for Act {
    const LABEL: &'static str = "Act";

    fn node_id(&self) -> &str {
        &self.id
    }
}

/// A chapter within an act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter id, `{act}:ch:{seq}`
    pub id: String,
    /// Owning act
    pub act_id: String,
    /// Position, unique within the act
    pub sequence: i64,
    /// Title
    pub title: String,
    /// What the chapter focuses on
    pub focus: String,
    /// Point-of-view character
    pub pov_character_id: Option<String>,
    /// Rendered prose
    pub rendered_content: Option<String>,
    /// Editorial review state
    pub review_status: String,
}

impl GraphNode for Chapter {
    const LABEL: &'static str = "Chapter";

    fn node_id(&self) -> &str {
        &self.id
    }
}

/// Structural role of a story anchor.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnchorType {
    /// Event that starts the story
    IncitingIncident,
    /// Turning point in the middle
    Midpoint,
    /// Peak of the conflict
    Climax,
    /// How it ends
    Resolution,
}

/// How strictly an anchor must be honored.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConstraintType {
    /// Must happen as described
    Hard,
    /// Should happen, details may shift
    Soft,
    /// May be moved or reshaped freely
    Flexible,
}

/// A milestone the story must reach, ordered by `DEPENDS_ON` edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryAnchor {
    /// Anchor id, `{root}:anchor:{seq}`
    pub id: String,
    /// Owning root
    pub root_id: String,
    /// Branch label
    pub branch_id: String,
    /// Position, unique within the root
    pub sequence: i64,
    /// Structural role
    pub anchor_type: AnchorType,
    /// What happens
    pub description: String,
    /// How strictly it applies
    pub constraint_type: ConstraintType,
    /// Conditions that must hold when it triggers
    pub required_conditions: String,
    /// Latest scene sequence it may trigger at
    pub deadline_scene: Option<i64>,
    /// Already reached
    #[serde(default)]
    pub achieved: bool,
}

impl StoryAnchor {
    /// An unachieved anchor without conditions or deadline.
    pub fn new(
        root_id: &str,
        branch_id: &str,
        sequence: i64,
        anchor_type: AnchorType,
        description: impl Into<String>,
        constraint_type: ConstraintType,
    ) -> Self {
        Self {
            id: ids::anchor_id(root_id, sequence),
            root_id: root_id.to_string(),
            branch_id: branch_id.to_string(),
            sequence,
            anchor_type,
            description: description.into(),
            constraint_type,
            required_conditions: String::new(),
            deadline_scene: None,
            achieved: false,
        }
    }
}

impl GraphNode for StoryAnchor {
    const LABEL: &'static str = "StoryAnchor";

    fn node_id(&self) -> &str {
        &self.id
    }
}

/// One remembered event, ranked by importance for eviction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Retention rank; higher survives longer. Kept as the caller's JSON
    /// number so integer ranks stay integers.
    pub importance: Number,
    /// Everything else the caller stored
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl MemoryEntry {
    /// Parse a caller-supplied entry, which must carry a numeric `importance`.
    #[track_caller]
    pub fn from_map(mut entry: Map<String, Value>) -> Result<Self, StoreError> {
        let importance = match entry.remove("importance") {
            Some(Value::Number(number)) if number.as_f64().is_some_and(f64::is_finite) => number,
            _ => return Err(StoreError::validation("memory entry requires numeric importance")),
        };
        Ok(Self {
            importance,
            content: entry,
        })
    }

    /// Importance as a float for ranking.
    pub fn rank(&self) -> f64 {
        self.importance.as_f64().unwrap_or(f64::NEG_INFINITY)
    }
}

/// Belief/desire/intention scratch state of a character agent.
///
/// `version` starts at 1 and increments on every belief or desire update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct CharacterAgentState {
    id: String,
    character_id: String,
    branch_id: String,
    beliefs: Map<String, Value>,
    desires: Vec<Value>,
    intentions: Vec<Value>,
    memory: Vec<MemoryEntry>,
    private_knowledge: Map<String, Value>,
    last_updated_scene: i64,
    version: u64,
}

impl CharacterAgentState {
    /// Fresh agent state for a character on a branch.
    pub fn new(character_id: &str, branch_id: &str, desires: Vec<Value>) -> Self {
        Self {
            id: ids::agent_id(character_id, branch_id),
            character_id: character_id.to_string(),
            branch_id: branch_id.to_string(),
            beliefs: Map::new(),
            desires,
            intentions: Vec::new(),
            memory: Vec::new(),
            private_knowledge: Map::new(),
            last_updated_scene: 0,
            version: 1,
        }
    }

    /// Deep-merge a beliefs patch and bump the version.
    pub fn merge_beliefs(&mut self, patch: &Map<String, Value>) -> u64 {
        self.beliefs = merge_deep(&self.beliefs, patch);
        self.version += 1;
        self.version
    }

    /// Replace desires and bump the version.
    pub fn replace_desires(&mut self, desires: Vec<Value>) -> u64 {
        self.desires = desires;
        self.version += 1;
        self.version
    }

    /// Append a memory, then keep only the `limit` most important entries.
    ///
    /// Ties keep insertion order, so an older entry outranks a newer one of
    /// equal importance.
    pub fn remember(&mut self, entry: MemoryEntry, limit: usize) {
        self.memory.push(entry);
        self.memory
            .sort_by(|a, b| b.rank().total_cmp(&a.rank()));
        self.memory.truncate(limit);
    }
}

impl GraphNode for CharacterAgentState {
    const LABEL: &'static str = "CharacterAgentState";

    fn node_id(&self) -> &str {
        &self.id
    }
}

/// One round of an agent simulation that produced a scene version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationLog {
    /// Log id, `sim:{scene_version}:round:{n}`
    pub id: String,
    /// Scene version the simulation produced
    pub scene_version_id: String,
    /// Round number
    pub round_number: i64,
    /// Actions each agent proposed
    #[serde(default)]
    pub agent_actions: Vec<Value>,
    /// Arbiter decision
    #[serde(default)]
    pub dm_arbitration: Value,
    /// Events that entered the narrative
    #[serde(default)]
    pub narrative_events: Vec<Value>,
    /// Sensory details for rendering
    #[serde(default)]
    pub sensory_seeds: Vec<Value>,
    /// How close the round came to the expected outcome
    pub convergence_score: f64,
    /// Dramatic intensity
    pub drama_score: f64,
    /// New information revealed
    pub info_gain: f64,
    /// Consecutive rounds without progress
    #[serde(default)]
    pub stagnation_count: i64,
}

impl SimulationLog {
    /// An empty log for one round.
    pub fn new(scene_version_id: &str, round_number: i64) -> Self {
        Self {
            id: ids::simulation_log_id(scene_version_id, round_number),
            scene_version_id: scene_version_id.to_string(),
            round_number,
            agent_actions: Vec::new(),
            dm_arbitration: Value::Null,
            narrative_events: Vec::new(),
            sensory_seeds: Vec::new(),
            convergence_score: 0.0,
            drama_score: 0.0,
            info_gain: 0.0,
            stagnation_count: 0,
        }
    }
}

impl GraphNode for SimulationLog {
    const LABEL: &'static str = "SimulationLog";

    fn node_id(&self) -> &str {
        &self.id
    }
}

/// Subplot lifecycle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubplotStatus {
    /// Introduced but not yet in play
    #[default]
    Dormant,
    /// In play
    Active,
    /// Concluded
    Resolved,
}

/// A secondary story line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subplot {
    /// Subplot id
    pub id: String,
    /// Owning root
    pub root_id: String,
    /// Branch label
    pub branch_id: String,
    /// Title
    pub title: String,
    /// Kind of subplot, e.g. `romance`
    pub subplot_type: String,
    /// Driving character
    pub protagonist_id: String,
    /// Central conflict
    pub central_conflict: String,
    /// Lifecycle state
    #[serde(default)]
    pub status: SubplotStatus,
}

impl Subplot {
    /// A dormant subplot with a fresh id.
    pub fn new(
        root_id: &str,
        branch_id: &str,
        title: impl Into<String>,
        subplot_type: impl Into<String>,
        protagonist_id: impl Into<String>,
        central_conflict: impl Into<String>,
    ) -> Self {
        Self {
            id: ids::new_id(),
            root_id: root_id.to_string(),
            branch_id: branch_id.to_string(),
            title: title.into(),
            subplot_type: subplot_type.into(),
            protagonist_id: protagonist_id.into(),
            central_conflict: central_conflict.into(),
            status: SubplotStatus::Dormant,
        }
    }

    /// Move `dormant → active`.
    #[track_caller]
    pub fn activate(&mut self) -> Result<(), StoreError> {
        self.transition(SubplotStatus::Dormant, SubplotStatus::Active)
    }

    /// Move `active → resolved`.
    #[track_caller]
    pub fn resolve(&mut self) -> Result<(), StoreError> {
        self.transition(SubplotStatus::Active, SubplotStatus::Resolved)
    }

    #[track_caller]
    fn transition(&mut self, required: SubplotStatus, next: SubplotStatus) -> Result<(), StoreError> {
        if self.status != required {
            return Err(StoreError::new(StoreErrorKind::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            }));
        }
        self.status = next;
        Ok(())
    }
}

impl GraphNode for Subplot {
    const LABEL: &'static str = "Subplot";

    fn node_id(&self) -> &str {
        &self.id
    }
}
