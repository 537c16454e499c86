//! Structural version-control records: roots, branches, commits and scenes.

use crate::ids;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use palimpsest_error::{StoreError, StoreErrorKind};
use palimpsest_graph::GraphNode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One story universe.
///
/// Owns the per-root scene sequence counter; sequence indexes are handed out
/// only through [`Root::next_scene_sequence`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Root {
    id: String,
    logline: String,
    theme: String,
    ending: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    scene_sequence: i64,
}

impl Root {
    /// Create a root with a fresh id.
    pub fn new(
        logline: impl Into<String>,
        theme: impl Into<String>,
        ending: impl Into<String>,
    ) -> Self {
        Self {
            id: ids::new_id(),
            logline: logline.into(),
            theme: theme.into(),
            ending: ending.into(),
            created_at: Utc::now(),
            scene_sequence: 0,
        }
    }

    /// Claim the next scene sequence index.
    pub fn next_scene_sequence(&mut self) -> i64 {
        self.scene_sequence += 1;
        self.scene_sequence
    }

    /// Raise the counter so future claims start after an imported index.
    pub fn observe_scene_sequence(&mut self, sequence_index: i64) {
        self.scene_sequence = self.scene_sequence.max(sequence_index);
    }

    /// Edit narrative metadata. `None` leaves a field unchanged.
    pub fn update_metadata(
        &mut self,
        logline: Option<String>,
        theme: Option<String>,
        ending: Option<String>,
    ) {
        if let Some(logline) = logline {
            self.logline = logline;
        }
        if let Some(theme) = theme {
            self.theme = theme;
        }
        if let Some(ending) = ending {
            self.ending = ending;
        }
    }
}

impl GraphNode for Root {
    const LABEL: &'static str = "Root";

    fn node_id(&self) -> &str {
        &self.id
    }
}

/// A named line of development within a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Node id, `{root}:{branch}`
    pub id: String,
    /// Owning root
    pub root_id: String,
    /// Human label, unique within the root
    pub branch_id: String,
    /// Branch this one was created or forked from
    pub parent_branch_id: Option<String>,
    /// Commit the branch started from
    pub fork_commit_id: Option<String>,
    /// Scene the branch was forked at
    pub fork_scene_origin_id: Option<String>,
}

impl Branch {
    /// A branch without provenance.
    pub fn new(root_id: &str, branch_id: &str) -> Self {
        Self {
            id: ids::branch_node_id(root_id, branch_id),
            root_id: root_id.to_string(),
            branch_id: branch_id.to_string(),
            parent_branch_id: None,
            fork_commit_id: None,
            fork_scene_origin_id: None,
        }
    }
}

impl GraphNode for Branch {
    const LABEL: &'static str = "Branch";

    fn node_id(&self) -> &str {
        &self.id
    }
}

/// The movable pointer naming a branch's current commit.
///
/// `version` starts at 1 and increments on every head move; it is the
/// optimistic-concurrency token for writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct BranchHead {
    id: String,
    root_id: String,
    branch_id: String,
    head_commit_id: String,
    version: u64,
}

impl BranchHead {
    /// A head at version 1 pointing at `commit_id`.
    pub fn new(root_id: &str, branch_id: &str, commit_id: &str) -> Self {
        Self {
            id: ids::branch_head_id(root_id, branch_id),
            root_id: root_id.to_string(),
            branch_id: branch_id.to_string(),
            head_commit_id: commit_id.to_string(),
            version: 1,
        }
    }

    /// Fail with `ConcurrencyConflict` unless `expected` is absent or current.
    #[track_caller]
    pub fn check_version(&self, expected: Option<u64>) -> Result<(), StoreError> {
        match expected {
            Some(expected) if expected != self.version => {
                Err(StoreError::new(StoreErrorKind::ConcurrencyConflict {
                    branch: self.branch_id.clone(),
                    expected,
                    actual: self.version,
                }))
            }
            _ => Ok(()),
        }
    }

    /// Point the head at `commit_id` and bump the version. Returns the new version.
    pub fn advance(&mut self, commit_id: &str) -> u64 {
        self.head_commit_id = commit_id.to_string();
        self.version += 1;
        self.version
    }
}

impl GraphNode for BranchHead {
    const LABEL: &'static str = "BranchHead";

    fn node_id(&self) -> &str {
        &self.id
    }
}

/// An immutable snapshot of one set of scene changes plus a parent link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit id
    pub id: String,
    /// Parent commit; `None` for a root commit
    pub parent_id: Option<String>,
    /// Description of the change
    pub message: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Owning root
    pub root_id: String,
    /// Branch label the commit was made on
    pub branch_id: String,
}

impl Commit {
    /// A new commit made now on `branch_id`.
    pub fn new(root_id: &str, branch_id: &str, parent_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            id: ids::commit_id(root_id, branch_id),
            parent_id,
            message: message.into(),
            created_at: Utc::now(),
            root_id: root_id.to_string(),
            branch_id: branch_id.to_string(),
        }
    }
}

impl GraphNode for Commit {
    const LABEL: &'static str = "Commit";

    fn node_id(&self) -> &str {
        &self.id
    }
}

/// Stable identity of a scene across branches and revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneOrigin {
    /// Scene id
    pub id: String,
    /// Owning root
    pub root_id: String,
    /// Scene title
    pub title: String,
    /// Commit that introduced the scene
    pub initial_commit_id: String,
    /// Position in the root's scene order, unique per root
    pub sequence_index: i64,
    /// Act the scene belongs to
    pub parent_act_id: Option<String>,
    /// Chapter the scene is linked to
    pub chapter_id: Option<String>,
    /// Placeholder scene without real content yet
    #[serde(default)]
    pub is_skeleton: bool,
}

impl GraphNode for SceneOrigin {
    const LABEL: &'static str = "SceneOrigin";

    fn node_id(&self) -> &str {
        &self.id
    }
}

/// Lifecycle of a scene version's content.
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
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SceneStatus {
    /// Planned, not yet completed
    #[default]
    Draft,
    /// Outcome and summary recorded
    Committed,
}

/// One committed revision of a scene's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneVersion {
    /// Version id
    pub id: String,
    /// Scene this version revises
    pub scene_origin_id: String,
    /// Commit that created this version
    pub commit_id: String,
    /// Point-of-view character
    pub pov_character_id: Option<String>,
    /// Content status
    #[serde(default)]
    pub status: SceneStatus,
    /// What the scene is meant to achieve
    pub expected_outcome: String,
    /// Kind of conflict driving the scene
    pub conflict_type: Option<String>,
    /// What actually happened
    pub actual_outcome: Option<String>,
    /// Short summary
    pub summary: Option<String>,
    /// Rendered prose
    pub rendered_content: Option<String>,
    /// Scene deliberately breaks world logic
    #[serde(default)]
    pub logic_exception: bool,
    /// Why the logic exception is allowed
    pub logic_exception_reason: Option<String>,
    /// Needs re-rendering
    #[serde(default)]
    pub dirty: bool,
    /// Simulation that produced this version
    pub simulation_log_id: Option<String>,
    /// Produced by simulation
    #[serde(default)]
    pub is_simulated: bool,
}

/// Fields compared by [`SceneVersion::diff`].
const DIFF_FIELDS: [&str; 9] = [
    "pov_character_id",
    "status",
    "expected_outcome",
    "conflict_type",
    "actual_outcome",
    "summary",
    "rendered_content",
    "logic_exception",
    "logic_exception_reason",
];

/// Before and after values of one changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Value in the older version
    pub from: Value,
    /// Value in the newer version
    pub to: Value,
}

impl SceneVersion {
    /// Content fields that differ between `self` and `other`.
    pub fn diff(&self, other: &SceneVersion) -> BTreeMap<String, FieldChange> {
        let before = serde_json::to_value(self).unwrap_or(Value::Null);
        let after = serde_json::to_value(other).unwrap_or(Value::Null);
        DIFF_FIELDS
            .iter()
            .filter_map(|field| {
                let from = before.get(*field).cloned().unwrap_or(Value::Null);
                let to = after.get(*field).cloned().unwrap_or(Value::Null);
                (from != to).then(|| (field.to_string(), FieldChange { from, to }))
            })
            .collect()
    }
}

impl GraphNode for SceneVersion {
    const LABEL: &'static str = "SceneVersion";

    fn node_id(&self) -> &str {
        &self.id
    }
}

/// Content submitted when creating or committing a scene.
///
/// # Examples
///
/// ```
/// use palimpsest_core::SceneContentBuilder;
///
/// let content = SceneContentBuilder::default()
///     .expected_outcome("Mara reaches the lighthouse")
///     .pov_character_id("mara")
///     .build()
///     .unwrap();
/// assert!(content.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(default, setter(into))]
pub struct SceneContent {
    #[builder(setter(into, strip_option))]
    pov_character_id: Option<String>,
    #[serde(default)]
    status: SceneStatus,
    #[serde(default)]
    expected_outcome: String,
    #[builder(setter(into, strip_option))]
    conflict_type: Option<String>,
    #[builder(setter(into, strip_option))]
    actual_outcome: Option<String>,
    #[builder(setter(into, strip_option))]
    summary: Option<String>,
    #[builder(setter(into, strip_option))]
    rendered_content: Option<String>,
}

impl SceneContent {
    /// Reject content without an expected outcome.
    #[track_caller]
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.expected_outcome.trim().is_empty() {
            return Err(StoreError::validation("expected_outcome is required"));
        }
        Ok(())
    }

    /// Materialize the content as a new version bound to `commit_id`.
    pub fn into_version(self, scene_origin_id: &str, commit_id: &str) -> SceneVersion {
        SceneVersion {
            id: ids::scene_version_id(scene_origin_id),
            scene_origin_id: scene_origin_id.to_string(),
            commit_id: commit_id.to_string(),
            pov_character_id: self.pov_character_id,
            status: self.status,
            expected_outcome: self.expected_outcome,
            conflict_type: self.conflict_type,
            actual_outcome: self.actual_outcome,
            summary: self.summary,
            rendered_content: self.rendered_content,
            logic_exception: false,
            logic_exception_reason: None,
            dirty: false,
            simulation_log_id: None,
            is_simulated: false,
        }
    }
}
