//! Story anchors and their dependency order.

use crate::NarrativeStore;
use crate::queries::{require, require_branch};
use palimpsest_core::{AnchorType, ConstraintType, EdgeType, SceneVersion, StoryAnchor};
use palimpsest_error::{PalimpsestResult, StoreError, StoreErrorKind};
use palimpsest_graph::PropertyGraph;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Anchors `anchor_id` directly depends on.
fn prerequisites(graph: &PropertyGraph, anchor_id: &str) -> Vec<String> {
    graph
        .outgoing(anchor_id, EdgeType::DependsOn.as_ref())
        .iter()
        .map(|edge| edge.to_id.clone())
        .collect()
}

/// True when `target` is reachable from `start` over DEPENDS_ON.
fn depends_transitively(graph: &PropertyGraph, start: &str, target: &str) -> bool {
    let mut seen = HashSet::new();
    let mut stack = vec![start.to_string()];
    while let Some(id) = stack.pop() {
        if id == target {
            return true;
        }
        if seen.insert(id.clone()) {
            stack.extend(prerequisites(graph, &id));
        }
    }
    false
}

fn anchors_of(
    graph: &PropertyGraph,
    root_id: &str,
    branch_id: &str,
) -> PalimpsestResult<Vec<StoryAnchor>> {
    let mut anchors: Vec<StoryAnchor> = graph
        .all::<StoryAnchor>()?
        .into_iter()
        .filter(|anchor| anchor.root_id == root_id && anchor.branch_id == branch_id)
        .collect();
    anchors.sort_by_key(|anchor| anchor.sequence);
    Ok(anchors)
}

impl NarrativeStore {
    /// Create an unachieved anchor at `sequence` within a root.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, description, required_conditions))]
    pub async fn create_anchor(
        &self,
        root_id: &str,
        branch_id: &str,
        sequence: i64,
        anchor_type: AnchorType,
        description: &str,
        constraint_type: ConstraintType,
        required_conditions: &str,
    ) -> PalimpsestResult<StoryAnchor> {
        self.write(|tx| {
            require_branch(tx, root_id, branch_id)?;
            let anchor = StoryAnchor {
                required_conditions: required_conditions.to_string(),
                ..StoryAnchor::new(
                    root_id,
                    branch_id,
                    sequence,
                    anchor_type,
                    description,
                    constraint_type,
                )
            };
            if tx.contains_node(&anchor.id) {
                return Err(StoreError::new(StoreErrorKind::DuplicateSequence {
                    scope: format!("anchors of root {}", root_id),
                    sequence,
                })
                .into());
            }
            tx.create(&anchor)?;
            info!(anchor = %anchor.id, "Created anchor");
            Ok(anchor)
        })
        .await
    }

    /// Require `depends_on_id` to be achieved before `anchor_id`.
    ///
    /// Rejects self-dependencies and dependencies that would close a cycle.
    /// Adding an existing dependency again changes nothing.
    #[instrument(skip(self))]
    pub async fn add_anchor_dependency(
        &self,
        anchor_id: &str,
        depends_on_id: &str,
    ) -> PalimpsestResult<()> {
        self.write(|tx| {
            let anchor: StoryAnchor = require(tx, anchor_id)?;
            let prerequisite: StoryAnchor = require(tx, depends_on_id)?;
            if anchor.id == prerequisite.id {
                return Err(StoreError::validation(format!(
                    "anchor {} cannot depend on itself",
                    anchor_id
                ))
                .into());
            }
            if anchor.root_id != prerequisite.root_id {
                return Err(StoreError::validation(format!(
                    "anchors {} and {} belong to different roots",
                    anchor_id, depends_on_id
                ))
                .into());
            }
            if prerequisites(tx, anchor_id).iter().any(|id| id == depends_on_id) {
                debug!("Dependency already recorded");
                return Ok(());
            }
            if depends_transitively(tx, depends_on_id, anchor_id) {
                return Err(StoreError::validation(format!(
                    "dependency {} -> {} would create a cycle",
                    anchor_id, depends_on_id
                ))
                .into());
            }
            tx.link(EdgeType::DependsOn.as_ref(), anchor_id, depends_on_id)?;
            Ok(())
        })
        .await
    }

    /// Load an anchor.
    #[instrument(skip(self))]
    pub async fn get_anchor(&self, anchor_id: &str) -> PalimpsestResult<StoryAnchor> {
        self.read(|graph| require(graph, anchor_id)).await
    }

    /// Replace an anchor's description, constraint, conditions and deadline.
    ///
    /// Identity, sequence and achievement are kept from the stored anchor.
    #[instrument(skip(self, anchor), fields(anchor = %anchor.id))]
    pub async fn update_anchor(&self, anchor: StoryAnchor) -> PalimpsestResult<StoryAnchor> {
        self.write(|tx| {
            let stored: StoryAnchor = require(tx, &anchor.id)?;
            let updated = StoryAnchor {
                root_id: stored.root_id,
                branch_id: stored.branch_id,
                sequence: stored.sequence,
                achieved: stored.achieved,
                ..anchor
            };
            tx.put(&updated)?;
            Ok(updated)
        })
        .await
    }

    /// Delete an anchor and its dependency edges.
    #[instrument(skip(self))]
    pub async fn delete_anchor(&self, anchor_id: &str) -> PalimpsestResult<()> {
        self.write(|tx| {
            require::<StoryAnchor>(tx, anchor_id)?;
            tx.delete_node(anchor_id);
            Ok(())
        })
        .await
    }

    /// Anchors of a branch by sequence.
    #[instrument(skip(self))]
    pub async fn list_anchors(
        &self,
        root_id: &str,
        branch_id: &str,
    ) -> PalimpsestResult<Vec<StoryAnchor>> {
        self.read(|graph| {
            require_branch(graph, root_id, branch_id)?;
            anchors_of(graph, root_id, branch_id)
        })
        .await
    }

    /// Mark an anchor achieved by a scene version.
    #[instrument(skip(self))]
    pub async fn mark_anchor_achieved(
        &self,
        anchor_id: &str,
        scene_version_id: &str,
    ) -> PalimpsestResult<StoryAnchor> {
        self.write(|tx| {
            let mut anchor: StoryAnchor = require(tx, anchor_id)?;
            require::<SceneVersion>(tx, scene_version_id)?;
            if anchor.achieved {
                return Err(
                    StoreError::new(StoreErrorKind::AlreadyAchieved(anchor_id.to_string())).into(),
                );
            }
            anchor.achieved = true;
            tx.put(&anchor)?;
            tx.link(EdgeType::TriggeredAt.as_ref(), anchor_id, scene_version_id)?;
            info!(version = %scene_version_id, "Anchor achieved");
            Ok(anchor)
        })
        .await
    }

    /// Lowest-sequence unachieved anchor whose prerequisites are all achieved.
    #[instrument(skip(self))]
    pub async fn get_next_unachieved_anchor(
        &self,
        root_id: &str,
        branch_id: &str,
    ) -> PalimpsestResult<Option<StoryAnchor>> {
        self.read(|graph| {
            require_branch(graph, root_id, branch_id)?;
            for anchor in anchors_of(graph, root_id, branch_id)? {
                if anchor.achieved {
                    continue;
                }
                let mut ready = true;
                for id in prerequisites(graph, &anchor.id) {
                    if !require::<StoryAnchor>(graph, &id)?.achieved {
                        ready = false;
                        break;
                    }
                }
                if ready {
                    return Ok(Some(anchor));
                }
            }
            Ok(None)
        })
        .await
    }
}
