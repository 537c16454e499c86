//! Edge types of the narrative graph.

/// Structural and registry edge types.
///
/// Every type except [`EdgeType::TemporalRelation`] carries no properties.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    /// BranchHead → Commit. Exactly one per head.
    Head,
    /// Commit → parent Commit.
    Parent,
    /// Commit → SceneVersion created by it.
    Includes,
    /// SceneVersion → SceneOrigin.
    OfOrigin,
    /// SceneVersion → WorldSnapshot materialized for it.
    EstablishesState,
    /// StoryAnchor → prerequisite StoryAnchor.
    DependsOn,
    /// StoryAnchor → SceneVersion that achieved it.
    TriggeredAt,
    /// CharacterAgentState → Entity.
    AgentOf,
    /// Act → Chapter.
    ContainsChapter,
    /// Chapter → SceneOrigin.
    ContainsScene,
    /// Entity → Entity, valid over a scene interval.
    #[strum(serialize = "TemporalRelation")]
    TemporalRelation,
}
