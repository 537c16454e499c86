//! Character agent state.

use crate::NarrativeStore;
use crate::queries::{find, require};
use palimpsest_core::{CharacterAgentState, EdgeType, Entity, EntityType, MemoryEntry, ids};
use palimpsest_error::{PalimpsestResult, StoreError, StoreErrorKind};
use palimpsest_graph::GraphTransaction;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

/// Load, edit and store an agent state in one step.
fn modify<F>(
    tx: &mut GraphTransaction<'_>,
    agent_id: &str,
    edit: F,
) -> PalimpsestResult<CharacterAgentState>
where
    F: FnOnce(&mut CharacterAgentState),
{
    let mut state: CharacterAgentState = require(tx, agent_id)?;
    edit(&mut state);
    tx.put(&state)?;
    Ok(state)
}

impl NarrativeStore {
    /// Attach agent state to a character entity on a branch.
    #[instrument(skip(self, desires), fields(desires = desires.len()))]
    pub async fn init_character_agent(
        &self,
        character_id: &str,
        branch_id: &str,
        desires: Vec<Value>,
    ) -> PalimpsestResult<CharacterAgentState> {
        self.write(|tx| {
            let mut entity: Entity = require(tx, character_id)?;
            if entity.entity_type != EntityType::Character {
                return Err(StoreError::validation(format!(
                    "entity {} is a {}, not a character",
                    character_id, entity.entity_type
                ))
                .into());
            }
            let id = ids::agent_id(character_id, branch_id);
            if tx.contains_node(&id) {
                return Err(StoreError::new(StoreErrorKind::AlreadyExists(format!(
                    "agent state {}",
                    id
                )))
                .into());
            }
            let state = CharacterAgentState::new(character_id, branch_id, desires);
            tx.create(&state)?;
            tx.link(EdgeType::AgentOf.as_ref(), state.id(), character_id)?;
            entity.has_agent = true;
            entity.agent_state_id = Some(state.id().clone());
            tx.put(&entity)?;
            info!(agent = %state.id(), "Initialized character agent");
            Ok(state)
        })
        .await
    }

    /// Load an agent state.
    #[instrument(skip(self))]
    pub async fn get_agent_state(&self, agent_id: &str) -> PalimpsestResult<CharacterAgentState> {
        self.read(|graph| require(graph, agent_id)).await
    }

    /// Delete an agent state and clear the agent flags on its character.
    #[instrument(skip(self))]
    pub async fn delete_agent_state(&self, agent_id: &str) -> PalimpsestResult<()> {
        self.write(|tx| {
            let state: CharacterAgentState = require(tx, agent_id)?;
            if let Some(mut entity) = find::<Entity>(tx, state.character_id())?
                && entity.agent_state_id.as_deref() == Some(agent_id)
            {
                entity.has_agent = false;
                entity.agent_state_id = None;
                tx.put(&entity)?;
            }
            tx.delete_node(agent_id);
            Ok(())
        })
        .await
    }

    /// Replace an agent's desires. Bumps the version.
    #[instrument(skip(self, desires), fields(desires = desires.len()))]
    pub async fn update_agent_desires(
        &self,
        agent_id: &str,
        desires: Vec<Value>,
    ) -> PalimpsestResult<CharacterAgentState> {
        self.write(|tx| {
            modify(tx, agent_id, |state| {
                state.replace_desires(desires);
            })
        })
        .await
    }

    /// Deep-merge a patch into an agent's beliefs. Bumps the version.
    #[instrument(skip(self, patch), fields(keys = patch.len()))]
    pub async fn update_agent_beliefs(
        &self,
        agent_id: &str,
        patch: Map<String, Value>,
    ) -> PalimpsestResult<CharacterAgentState> {
        self.write(|tx| {
            let state = modify(tx, agent_id, |state| {
                state.merge_beliefs(&patch);
            })?;
            debug!(version = state.version(), "Merged beliefs");
            Ok(state)
        })
        .await
    }

    /// Append a memory, then evict down to the configured limit by importance.
    ///
    /// The entry must carry a numeric `importance`.
    #[instrument(skip(self, entry))]
    pub async fn add_agent_memory(
        &self,
        agent_id: &str,
        entry: Map<String, Value>,
    ) -> PalimpsestResult<CharacterAgentState> {
        let entry = MemoryEntry::from_map(entry)?;
        let limit = *self.config().agent_memory_limit();
        self.write(|tx| modify(tx, agent_id, |state| state.remember(entry, limit)))
            .await
    }
}
