//! Structural version control: branches, commits and scene revisions.

use crate::NarrativeStore;
use crate::queries::{
    ancestry, attach_version, branch_head_commit, create_commit, find_branch, head_commit_id,
    install_head, is_ancestor, move_head, require, require_branch, require_head, require_root,
    require_scene_in, scene_versions, version_as_of,
};
use palimpsest_core::{Branch, Commit, FieldChange, SceneContent, SceneOrigin, ids};
use palimpsest_error::{PalimpsestResult, StoreError, StoreErrorKind};
use palimpsest_graph::GraphTransaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Records created by [`NarrativeStore::create_scene_origin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneCreated {
    /// Commit that introduced the scene
    pub commit_id: String,
    /// New scene identity
    pub scene_origin_id: String,
    /// First version of the scene
    pub scene_version_id: String,
}

/// Result of a commit that moved a branch head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOutcome {
    /// New head commit
    pub commit_id: String,
    /// Scene versions the commit includes
    pub scene_version_ids: Vec<String>,
    /// Head version after the move
    pub head_version: u64,
}

/// Ids affected by [`NarrativeStore::delete_scene_origin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedScene {
    /// Commit recording the removal
    pub commit_id: String,
    /// Deleted scene
    pub scene_origin_id: String,
    /// Deleted versions of the scene
    pub scene_version_ids: Vec<String>,
}

fn validate_label(branch_id: &str) -> PalimpsestResult<()> {
    if branch_id.trim().is_empty() || branch_id.contains(':') {
        return Err(StoreError::validation(format!("invalid branch label '{}'", branch_id)).into());
    }
    Ok(())
}

/// Create a branch and its head at `commit_id`.
fn fork(
    tx: &mut GraphTransaction<'_>,
    root_id: &str,
    commit_id: &str,
    new_branch_id: &str,
    parent_branch_id: Option<&str>,
    fork_scene_origin_id: Option<&str>,
) -> PalimpsestResult<Branch> {
    validate_label(new_branch_id)?;
    if let Some(parent) = parent_branch_id {
        require_branch(tx, root_id, parent)?;
    }
    if find_branch(tx, root_id, new_branch_id)?.is_some() {
        return Err(StoreError::new(StoreErrorKind::AlreadyExists(format!(
            "Branch {} in root {}",
            new_branch_id, root_id
        )))
        .into());
    }
    let branch = Branch {
        parent_branch_id: parent_branch_id.map(str::to_string),
        fork_commit_id: Some(commit_id.to_string()),
        fork_scene_origin_id: fork_scene_origin_id.map(str::to_string),
        ..Branch::new(root_id, new_branch_id)
    };
    tx.create(&branch)?;
    install_head(tx, root_id, new_branch_id, commit_id)?;
    Ok(branch)
}

impl NarrativeStore {
    /// Create a branch starting at the parent branch's current head commit.
    ///
    /// The parent defaults to the configured default branch.
    #[instrument(skip(self))]
    pub async fn create_branch(
        &self,
        root_id: &str,
        branch_id: &str,
        parent_branch_id: Option<&str>,
    ) -> PalimpsestResult<Branch> {
        let parent = parent_branch_id.unwrap_or(self.config().default_branch());
        self.write(|tx| {
            let head_commit = branch_head_commit(tx, root_id, parent)?;
            let branch = fork(tx, root_id, &head_commit, branch_id, Some(parent), None)?;
            info!(commit = %head_commit, "Created branch");
            Ok(branch)
        })
        .await
    }

    /// Create a scene with its first version in a new commit.
    ///
    /// The scene takes the root's next sequence index.
    #[instrument(skip(self, content))]
    pub async fn create_scene_origin(
        &self,
        root_id: &str,
        branch_id: &str,
        title: &str,
        parent_act_id: Option<&str>,
        content: SceneContent,
    ) -> PalimpsestResult<SceneCreated> {
        content.validate()?;
        if title.trim().is_empty() {
            return Err(StoreError::validation("scene title is required").into());
        }
        self.write(|tx| {
            let mut head = require_head(tx, root_id, branch_id)?;
            let parent = head_commit_id(tx, &head)?;
            let mut root = require_root(tx, root_id)?;
            let sequence_index = root.next_scene_sequence();
            tx.put(&root)?;

            let commit = create_commit(
                tx,
                root_id,
                branch_id,
                Some(&parent),
                format!("create scene {}", title),
            )?;
            let scene = SceneOrigin {
                id: ids::new_id(),
                root_id: root_id.to_string(),
                title: title.to_string(),
                initial_commit_id: commit.id.clone(),
                sequence_index,
                parent_act_id: parent_act_id.map(str::to_string),
                chapter_id: None,
                is_skeleton: false,
            };
            tx.create(&scene)?;
            let version = content.into_version(&scene.id, &commit.id);
            attach_version(tx, &version)?;
            let head_version = move_head(tx, &mut head, &commit.id)?;
            info!(
                scene = %scene.id,
                sequence_index,
                head_version,
                "Created scene origin"
            );
            Ok(SceneCreated {
                commit_id: commit.id,
                scene_origin_id: scene.id,
                scene_version_id: version.id,
            })
        })
        .await
    }

    /// Commit a new version of a scene and advance the branch head.
    ///
    /// With `expected_head_version` set, fails with `ConcurrencyConflict`
    /// unless it matches the current head version; the head is left untouched.
    #[instrument(skip(self, content, message))]
    pub async fn commit_scene(
        &self,
        root_id: &str,
        branch_id: &str,
        scene_origin_id: &str,
        content: SceneContent,
        message: &str,
        expected_head_version: Option<u64>,
    ) -> PalimpsestResult<CommitOutcome> {
        content.validate()?;
        self.write(|tx| {
            let mut head = require_head(tx, root_id, branch_id)?;
            require_scene_in(tx, root_id, scene_origin_id)?;
            if let Err(e) = head.check_version(expected_head_version) {
                warn!(error = %e, "Rejected stale commit");
                return Err(e.into());
            }
            let parent = head_commit_id(tx, &head)?;
            let commit = create_commit(tx, root_id, branch_id, Some(&parent), message)?;
            let version = content.into_version(scene_origin_id, &commit.id);
            attach_version(tx, &version)?;
            let head_version = move_head(tx, &mut head, &commit.id)?;
            info!(commit = %commit.id, head_version, "Committed scene");
            Ok(CommitOutcome {
                commit_id: commit.id,
                scene_version_ids: vec![version.id],
                head_version,
            })
        })
        .await
    }

    /// Remove a scene and all of its versions, recording the removal in a
    /// new commit on the branch.
    #[instrument(skip(self))]
    pub async fn delete_scene_origin(
        &self,
        root_id: &str,
        branch_id: &str,
        scene_origin_id: &str,
        expected_head_version: Option<u64>,
    ) -> PalimpsestResult<DeletedScene> {
        self.write(|tx| {
            let mut head = require_head(tx, root_id, branch_id)?;
            let scene = require_scene_in(tx, root_id, scene_origin_id)?;
            head.check_version(expected_head_version)?;
            let parent = head_commit_id(tx, &head)?;
            let commit = create_commit(
                tx,
                root_id,
                branch_id,
                Some(&parent),
                format!("delete scene {}", scene.title),
            )?;
            let scene_version_ids: Vec<String> = scene_versions(tx, scene_origin_id)?
                .into_iter()
                .map(|version| version.id)
                .collect();
            for id in &scene_version_ids {
                tx.delete_node(id);
            }
            tx.delete_node(scene_origin_id);
            move_head(tx, &mut head, &commit.id)?;
            info!(versions = scene_version_ids.len(), "Deleted scene origin");
            Ok(DeletedScene {
                commit_id: commit.id,
                scene_origin_id: scene.id,
                scene_version_ids,
            })
        })
        .await
    }

    /// Create a branch whose head starts at an existing commit.
    #[instrument(skip(self))]
    pub async fn fork_from_commit(
        &self,
        source_commit_id: &str,
        new_branch_id: &str,
        parent_branch_id: Option<&str>,
        fork_scene_origin_id: Option<&str>,
    ) -> PalimpsestResult<Branch> {
        self.write(|tx| {
            let commit: Commit = require(tx, source_commit_id)?;
            let branch = fork(
                tx,
                &commit.root_id,
                &commit.id,
                new_branch_id,
                parent_branch_id,
                fork_scene_origin_id,
            )?;
            info!(root = %commit.root_id, "Forked branch from commit");
            Ok(branch)
        })
        .await
    }

    /// Create a branch at a scene, starting from `commit_id` or the commit
    /// that introduced the scene.
    #[instrument(skip(self))]
    pub async fn fork_from_scene(
        &self,
        source_branch_id: &str,
        scene_origin_id: &str,
        new_branch_id: &str,
        commit_id: Option<&str>,
    ) -> PalimpsestResult<Branch> {
        self.write(|tx| {
            let scene: SceneOrigin = require(tx, scene_origin_id)?;
            require_branch(tx, &scene.root_id, source_branch_id)?;
            let source_commit = commit_id.unwrap_or(&scene.initial_commit_id);
            let commit: Commit = require(tx, source_commit)?;
            if commit.root_id != scene.root_id {
                return Err(StoreError::validation(format!(
                    "commit {} belongs to another root",
                    commit.id
                ))
                .into());
            }
            let branch = fork(
                tx,
                &scene.root_id,
                &commit.id,
                new_branch_id,
                Some(source_branch_id),
                Some(scene_origin_id),
            )?;
            info!(commit = %commit.id, "Forked branch from scene");
            Ok(branch)
        })
        .await
    }

    /// Fast-forward the parent branch's head to this branch's head.
    ///
    /// The parent is the branch's recorded parent or the default branch.
    /// Fails with `NotFastForwardable` unless the parent head is an ancestor
    /// of this branch's head. Returns the parent head's version.
    #[instrument(skip(self))]
    pub async fn merge_branch(&self, root_id: &str, branch_id: &str) -> PalimpsestResult<u64> {
        let default_branch = self.config().default_branch();
        self.write(|tx| {
            let branch = require_branch(tx, root_id, branch_id)?;
            let parent_id = branch
                .parent_branch_id
                .as_deref()
                .unwrap_or(default_branch)
                .to_string();
            if parent_id == branch_id {
                return Err(StoreError::validation(format!(
                    "branch {} has no parent to merge into",
                    branch_id
                ))
                .into());
            }
            let child_commit = branch_head_commit(tx, root_id, branch_id)?;
            let mut parent_head = require_head(tx, root_id, &parent_id)?;
            let parent_commit = head_commit_id(tx, &parent_head)?;
            if parent_commit == child_commit {
                debug!("Parent head already at child head");
                return Ok(*parent_head.version());
            }
            if !is_ancestor(tx, &parent_commit, &child_commit)? {
                warn!(parent = %parent_id, "Merge is not a fast-forward");
                return Err(StoreError::new(StoreErrorKind::NotFastForwardable {
                    branch: branch_id.to_string(),
                    parent: parent_id,
                })
                .into());
            }
            let version = move_head(tx, &mut parent_head, &child_commit)?;
            info!(parent = %parent_id, commit = %child_commit, "Fast-forwarded parent branch");
            Ok(version)
        })
        .await
    }

    /// Move the branch head back to the commit preceding the branch's own
    /// commits: its fork point, or the root commit for a branch that owns
    /// its whole history. Returns the new head commit.
    #[instrument(skip(self))]
    pub async fn revert_branch(&self, root_id: &str, branch_id: &str) -> PalimpsestResult<String> {
        self.write(|tx| {
            let mut head = require_head(tx, root_id, branch_id)?;
            let head_commit = head_commit_id(tx, &head)?;
            let chain = ancestry(tx, &head_commit)?;
            let mut target = None;
            for id in &chain {
                let commit: Commit = require(tx, id)?;
                if commit.branch_id != branch_id {
                    target = Some(commit.id);
                    break;
                }
            }
            let target = target
                .or_else(|| chain.last().cloned())
                .unwrap_or_else(|| head_commit.clone());
            if target == head_commit {
                debug!("Branch has no own commits to revert");
                return Ok(target);
            }
            let version = move_head(tx, &mut head, &target)?;
            info!(commit = %target, head_version = version, "Reverted branch");
            Ok(target)
        })
        .await
    }

    /// Point the branch head at any commit of the same root.
    #[instrument(skip(self))]
    pub async fn reset_branch_head(
        &self,
        root_id: &str,
        branch_id: &str,
        commit_id: &str,
    ) -> PalimpsestResult<u64> {
        self.write(|tx| {
            let mut head = require_head(tx, root_id, branch_id)?;
            let commit: Commit = require(tx, commit_id)?;
            if commit.root_id != root_id {
                return Err(StoreError::validation(format!(
                    "commit {} belongs to another root",
                    commit_id
                ))
                .into());
            }
            let version = move_head(tx, &mut head, commit_id)?;
            info!(head_version = version, "Reset branch head");
            Ok(version)
        })
        .await
    }

    /// Commits reachable from the branch head, newest first.
    ///
    /// `limit` defaults to the configured history limit.
    #[instrument(skip(self))]
    pub async fn get_branch_history(
        &self,
        root_id: &str,
        branch_id: &str,
        limit: Option<usize>,
    ) -> PalimpsestResult<Vec<Commit>> {
        let limit = limit.unwrap_or(*self.config().history_limit());
        self.read(|graph| {
            let head_commit = branch_head_commit(graph, root_id, branch_id)?;
            ancestry(graph, &head_commit)?
                .iter()
                .take(limit)
                .map(|id| require(graph, id))
                .collect()
        })
        .await
    }

    /// Field-by-field differences between a scene as of two commits.
    #[instrument(skip(self))]
    pub async fn diff_scene_versions(
        &self,
        scene_origin_id: &str,
        from_commit_id: &str,
        to_commit_id: &str,
    ) -> PalimpsestResult<BTreeMap<String, FieldChange>> {
        self.read(|graph| {
            let resolve = |commit_id: &str| -> PalimpsestResult<_> {
                require::<Commit>(graph, commit_id)?;
                version_as_of(graph, commit_id, scene_origin_id)?.ok_or_else(|| {
                    StoreError::not_found(format!(
                        "Version of scene {} as of commit {}",
                        scene_origin_id, commit_id
                    ))
                    .into()
                })
            };
            let from = resolve(from_commit_id)?;
            let to = resolve(to_commit_id)?;
            Ok(from.diff(&to))
        })
        .await
    }
}
