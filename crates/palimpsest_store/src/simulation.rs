//! Simulation logs attached to scene versions.

use crate::NarrativeStore;
use crate::queries::{find, require};
use palimpsest_core::{SceneVersion, SimulationLog};
use palimpsest_error::{PalimpsestResult, StoreError, StoreErrorKind};
use tracing::{info, instrument};

impl NarrativeStore {
    /// Store one simulation round and flag its scene version as simulated.
    #[instrument(skip(self, log), fields(log = %log.id))]
    pub async fn create_simulation_log(&self, log: SimulationLog) -> PalimpsestResult<SimulationLog> {
        self.write(|tx| {
            let mut version: SceneVersion = require(tx, &log.scene_version_id)?;
            if tx.contains_node(&log.id) {
                return Err(StoreError::new(StoreErrorKind::AlreadyExists(format!(
                    "simulation log {}",
                    log.id
                )))
                .into());
            }
            tx.create(&log)?;
            version.simulation_log_id = Some(log.id.clone());
            version.is_simulated = true;
            tx.put(&version)?;
            info!(round = log.round_number, "Created simulation log");
            Ok(log)
        })
        .await
    }

    /// Load a simulation log.
    #[instrument(skip(self))]
    pub async fn get_simulation_log(&self, log_id: &str) -> PalimpsestResult<SimulationLog> {
        self.read(|graph| require(graph, log_id)).await
    }

    /// Simulation rounds of a scene version, by round number.
    #[instrument(skip(self))]
    pub async fn list_simulation_logs(
        &self,
        scene_version_id: &str,
    ) -> PalimpsestResult<Vec<SimulationLog>> {
        self.read(|graph| {
            require::<SceneVersion>(graph, scene_version_id)?;
            let mut logs: Vec<SimulationLog> = graph
                .all::<SimulationLog>()?
                .into_iter()
                .filter(|log| log.scene_version_id == scene_version_id)
                .collect();
            logs.sort_by_key(|log| log.round_number);
            Ok(logs)
        })
        .await
    }

    /// Replace a simulation log's contents.
    #[instrument(skip(self, log), fields(log = %log.id))]
    pub async fn update_simulation_log(&self, log: SimulationLog) -> PalimpsestResult<SimulationLog> {
        self.write(|tx| {
            let stored: SimulationLog = require(tx, &log.id)?;
            if stored.scene_version_id != log.scene_version_id
                || stored.round_number != log.round_number
            {
                return Err(StoreError::validation(format!(
                    "simulation log {} cannot change scene version or round",
                    log.id
                ))
                .into());
            }
            tx.put(&log)?;
            Ok(log)
        })
        .await
    }

    /// Delete a simulation log, clearing its scene version's flags if they
    /// point at it.
    #[instrument(skip(self))]
    pub async fn delete_simulation_log(&self, log_id: &str) -> PalimpsestResult<()> {
        self.write(|tx| {
            let log: SimulationLog = require(tx, log_id)?;
            if let Some(mut version) = find::<SceneVersion>(tx, &log.scene_version_id)?
                && version.simulation_log_id.as_deref() == Some(log_id)
            {
                version.simulation_log_id = None;
                version.is_simulated = false;
                tx.put(&version)?;
            }
            tx.delete_node(log_id);
            Ok(())
        })
        .await
    }
}
