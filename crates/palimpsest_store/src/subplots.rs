//! Subplots and their lifecycle.

use crate::NarrativeStore;
use crate::queries::{require, require_branch};
use palimpsest_core::Subplot;
use palimpsest_error::{PalimpsestResult, StoreError, StoreErrorKind};
use palimpsest_graph::GraphTransaction;
use tracing::{info, instrument, warn};

fn transition<F>(tx: &mut GraphTransaction<'_>, subplot_id: &str, step: F) -> PalimpsestResult<Subplot>
where
    F: FnOnce(&mut Subplot) -> Result<(), StoreError>,
{
    let mut subplot: Subplot = require(tx, subplot_id)?;
    if let Err(e) = step(&mut subplot) {
        warn!(error = %e, "Rejected subplot transition");
        return Err(e.into());
    }
    tx.put(&subplot)?;
    info!(status = %subplot.status, "Subplot moved");
    Ok(subplot)
}

impl NarrativeStore {
    /// Store a new subplot on its branch.
    #[instrument(skip(self, subplot), fields(subplot = %subplot.id))]
    pub async fn create_subplot(&self, subplot: Subplot) -> PalimpsestResult<Subplot> {
        if subplot.title.trim().is_empty() {
            return Err(StoreError::validation("subplot title is required").into());
        }
        self.write(|tx| {
            require_branch(tx, &subplot.root_id, &subplot.branch_id)?;
            if tx.contains_node(&subplot.id) {
                return Err(StoreError::new(StoreErrorKind::AlreadyExists(format!(
                    "subplot {}",
                    subplot.id
                )))
                .into());
            }
            tx.create(&subplot)?;
            Ok(subplot)
        })
        .await
    }

    /// Load a subplot.
    #[instrument(skip(self))]
    pub async fn get_subplot(&self, subplot_id: &str) -> PalimpsestResult<Subplot> {
        self.read(|graph| require(graph, subplot_id)).await
    }

    /// Replace a subplot's descriptive fields. Status only changes through
    /// [`activate_subplot`](Self::activate_subplot) and
    /// [`resolve_subplot`](Self::resolve_subplot).
    #[instrument(skip(self, subplot), fields(subplot = %subplot.id))]
    pub async fn update_subplot(&self, subplot: Subplot) -> PalimpsestResult<Subplot> {
        self.write(|tx| {
            let stored: Subplot = require(tx, &subplot.id)?;
            let updated = Subplot {
                root_id: stored.root_id,
                branch_id: stored.branch_id,
                status: stored.status,
                ..subplot
            };
            tx.put(&updated)?;
            Ok(updated)
        })
        .await
    }

    /// Subplots of a branch, by title.
    #[instrument(skip(self))]
    pub async fn list_subplots(
        &self,
        root_id: &str,
        branch_id: &str,
    ) -> PalimpsestResult<Vec<Subplot>> {
        self.read(|graph| {
            require_branch(graph, root_id, branch_id)?;
            let mut subplots: Vec<Subplot> = graph
                .all::<Subplot>()?
                .into_iter()
                .filter(|subplot| subplot.root_id == root_id && subplot.branch_id == branch_id)
                .collect();
            subplots.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
            Ok(subplots)
        })
        .await
    }

    /// Delete a subplot.
    #[instrument(skip(self))]
    pub async fn delete_subplot(&self, subplot_id: &str) -> PalimpsestResult<()> {
        self.write(|tx| {
            require::<Subplot>(tx, subplot_id)?;
            tx.delete_node(subplot_id);
            Ok(())
        })
        .await
    }

    /// Move a dormant subplot into play.
    #[instrument(skip(self))]
    pub async fn activate_subplot(&self, subplot_id: &str) -> PalimpsestResult<Subplot> {
        self.write(|tx| transition(tx, subplot_id, Subplot::activate))
            .await
    }

    /// Conclude an active subplot.
    #[instrument(skip(self))]
    pub async fn resolve_subplot(&self, subplot_id: &str) -> PalimpsestResult<Subplot> {
        self.write(|tx| transition(tx, subplot_id, Subplot::resolve))
            .await
    }
}
