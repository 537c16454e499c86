//! Input records for bulk initial population of a root.

use serde::{Deserialize, Serialize};

/// Narrative frame of a new root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct StorySeed {
    /// One-sentence premise
    pub logline: String,
    /// Theme
    pub theme: String,
    /// Intended ending
    pub ending: String,
}

/// A character imported as a `Character` entity.
///
/// The four arc fields become the entity's `semantic_states`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct CharacterSeed {
    /// Explicit entity id; a random one is assigned when absent
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub entity_id: Option<String>,
    /// Name
    pub name: String,
    /// What the character wants
    #[builder(default)]
    #[serde(default)]
    pub ambition: String,
    /// What stands in the way
    #[builder(default)]
    #[serde(default)]
    pub conflict: String,
    /// What the character realizes
    #[builder(default)]
    #[serde(default)]
    pub epiphany: String,
    /// Voice and diction notes
    #[builder(default)]
    #[serde(default)]
    pub voice_dna: String,
}

/// A scene imported with its first version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct SceneSeed {
    /// Explicit scene id; a random one is assigned when absent
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub id: Option<String>,
    /// Title
    pub title: String,
    /// Position in the root's scene order
    pub sequence_index: i64,
    /// Act the scene belongs to
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub parent_act_id: Option<String>,
    /// Point-of-view character; required on import
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub pov_character_id: Option<String>,
    /// What the scene is meant to achieve
    pub expected_outcome: String,
    /// Kind of conflict driving the scene
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub conflict_type: Option<String>,
    /// What actually happened
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub actual_outcome: Option<String>,
    /// Scene deliberately breaks world logic
    #[builder(default)]
    #[serde(default)]
    pub logic_exception: bool,
    /// Needs rendering
    #[builder(default)]
    #[serde(default)]
    pub is_dirty: bool,
}
