//! Lookup and traversal helpers shared by the store operations.
//!
//! Each query shape the operations need is a named function here, so the
//! invariant logic never reaches into raw graph records directly.

use palimpsest_core::{
    Branch, BranchHead, Commit, EdgeType, Entity, Root, SceneOrigin, SceneVersion,
    TemporalRelation, WorldSnapshot, ids,
};
use palimpsest_error::{PalimpsestResult, StoreError};
use palimpsest_graph::{GraphNode, GraphTransaction, PropertyGraph};
use std::collections::{HashMap, HashSet};

/// Load a node of type `T`, treating a node of another label as absent.
pub(crate) fn find<T: GraphNode>(graph: &PropertyGraph, id: &str) -> PalimpsestResult<Option<T>> {
    match graph.node(id) {
        Some(record) if record.label == T::LABEL => Ok(Some(T::from_record(record)?)),
        _ => Ok(None),
    }
}

/// Load a node of type `T` or fail with `NotFound`.
#[track_caller]
pub(crate) fn require<T: GraphNode>(graph: &PropertyGraph, id: &str) -> PalimpsestResult<T> {
    match find(graph, id)? {
        Some(value) => Ok(value),
        None => Err(StoreError::not_found(format!("{} {}", T::LABEL, id)).into()),
    }
}

pub(crate) fn require_root(graph: &PropertyGraph, root_id: &str) -> PalimpsestResult<Root> {
    require(graph, root_id)
}

pub(crate) fn find_branch(
    graph: &PropertyGraph,
    root_id: &str,
    branch_id: &str,
) -> PalimpsestResult<Option<Branch>> {
    find(graph, &ids::branch_node_id(root_id, branch_id))
}

pub(crate) fn require_branch(
    graph: &PropertyGraph,
    root_id: &str,
    branch_id: &str,
) -> PalimpsestResult<Branch> {
    require_root(graph, root_id)?;
    find_branch(graph, root_id, branch_id)?.ok_or_else(|| {
        StoreError::not_found(format!("Branch {} in root {}", branch_id, root_id)).into()
    })
}

pub(crate) fn require_head(
    graph: &PropertyGraph,
    root_id: &str,
    branch_id: &str,
) -> PalimpsestResult<BranchHead> {
    require_branch(graph, root_id, branch_id)?;
    find(graph, &ids::branch_head_id(root_id, branch_id))?.ok_or_else(|| {
        StoreError::invariant(format!("Branch {} in root {} has no head", branch_id, root_id))
            .into()
    })
}

/// Commit the head points at, verified against its single HEAD edge.
pub(crate) fn head_commit_id(graph: &PropertyGraph, head: &BranchHead) -> PalimpsestResult<String> {
    let edges = graph.outgoing(head.id(), EdgeType::Head.as_ref());
    match edges.as_slice() {
        [edge] if edge.to_id == *head.head_commit_id() => Ok(edge.to_id.clone()),
        [edge] => Err(StoreError::invariant(format!(
            "Head {} points at {} but its HEAD edge targets {}",
            head.id(),
            head.head_commit_id(),
            edge.to_id
        ))
        .into()),
        other => Err(StoreError::invariant(format!(
            "Head {} has {} HEAD edges",
            head.id(),
            other.len()
        ))
        .into()),
    }
}

pub(crate) fn branch_head_commit(
    graph: &PropertyGraph,
    root_id: &str,
    branch_id: &str,
) -> PalimpsestResult<String> {
    let head = require_head(graph, root_id, branch_id)?;
    head_commit_id(graph, &head)
}

/// Create a head at version 1 together with its HEAD edge.
pub(crate) fn install_head(
    tx: &mut GraphTransaction<'_>,
    root_id: &str,
    branch_id: &str,
    commit_id: &str,
) -> PalimpsestResult<BranchHead> {
    let head = BranchHead::new(root_id, branch_id, commit_id);
    tx.create(&head)?;
    tx.link(EdgeType::Head.as_ref(), head.id(), commit_id)?;
    Ok(head)
}

/// Replace the head's single HEAD edge and bump its version.
pub(crate) fn move_head(
    tx: &mut GraphTransaction<'_>,
    head: &mut BranchHead,
    commit_id: &str,
) -> PalimpsestResult<u64> {
    let existing: Vec<String> = tx
        .outgoing(head.id(), EdgeType::Head.as_ref())
        .iter()
        .map(|edge| edge.id.clone())
        .collect();
    if existing.len() != 1 {
        return Err(StoreError::invariant(format!(
            "Head {} has {} HEAD edges",
            head.id(),
            existing.len()
        ))
        .into());
    }
    for edge_id in &existing {
        tx.delete_edge(edge_id);
    }
    tx.link(EdgeType::Head.as_ref(), head.id(), commit_id)?;
    let version = head.advance(commit_id);
    tx.put(&*head)?;
    Ok(version)
}

/// Create a commit and its PARENT edge.
pub(crate) fn create_commit(
    tx: &mut GraphTransaction<'_>,
    root_id: &str,
    branch_id: &str,
    parent_id: Option<&str>,
    message: impl Into<String>,
) -> PalimpsestResult<Commit> {
    let commit = Commit::new(root_id, branch_id, parent_id.map(str::to_string), message);
    tx.create(&commit)?;
    if let Some(parent_id) = parent_id {
        tx.link(EdgeType::Parent.as_ref(), &commit.id, parent_id)?;
    }
    Ok(commit)
}

/// Create a scene version bound to its commit and origin.
pub(crate) fn attach_version(
    tx: &mut GraphTransaction<'_>,
    version: &SceneVersion,
) -> PalimpsestResult<()> {
    tx.create(version)?;
    tx.link(EdgeType::Includes.as_ref(), &version.commit_id, &version.id)?;
    tx.link(EdgeType::OfOrigin.as_ref(), &version.id, &version.scene_origin_id)?;
    Ok(())
}

/// Commit ids from `commit_id` back to the root commit, newest first.
pub(crate) fn ancestry(graph: &PropertyGraph, commit_id: &str) -> PalimpsestResult<Vec<String>> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(commit_id.to_string());
    while let Some(id) = current {
        if !seen.insert(id.clone()) {
            return Err(StoreError::invariant(format!("PARENT cycle through commit {}", id)).into());
        }
        let parents = graph.outgoing(&id, EdgeType::Parent.as_ref());
        if parents.len() > 1 {
            return Err(StoreError::invariant(format!(
                "Commit {} has {} PARENT edges",
                id,
                parents.len()
            ))
            .into());
        }
        current = parents.first().map(|edge| edge.to_id.clone());
        chain.push(id);
    }
    Ok(chain)
}

pub(crate) fn is_ancestor(
    graph: &PropertyGraph,
    ancestor: &str,
    descendant: &str,
) -> PalimpsestResult<bool> {
    Ok(ancestry(graph, descendant)?.iter().any(|id| id == ancestor))
}

/// Every version of a scene.
pub(crate) fn scene_versions(
    graph: &PropertyGraph,
    scene_origin_id: &str,
) -> PalimpsestResult<Vec<SceneVersion>> {
    graph
        .incoming(scene_origin_id, EdgeType::OfOrigin.as_ref())
        .iter()
        .map(|edge| require(graph, &edge.from_id))
        .collect()
}

/// The version of a scene as of `commit_id`: the one included by the
/// nearest commit in its ancestry.
pub(crate) fn version_as_of(
    graph: &PropertyGraph,
    commit_id: &str,
    scene_origin_id: &str,
) -> PalimpsestResult<Option<SceneVersion>> {
    let mut by_commit: HashMap<String, SceneVersion> = scene_versions(graph, scene_origin_id)?
        .into_iter()
        .map(|version| (version.commit_id.clone(), version))
        .collect();
    if by_commit.is_empty() {
        return Ok(None);
    }
    for id in ancestry(graph, commit_id)? {
        if let Some(version) = by_commit.remove(&id) {
            return Ok(Some(version));
        }
    }
    Ok(None)
}

pub(crate) fn visible_version(
    graph: &PropertyGraph,
    root_id: &str,
    branch_id: &str,
    scene_origin_id: &str,
) -> PalimpsestResult<Option<SceneVersion>> {
    let head_commit = branch_head_commit(graph, root_id, branch_id)?;
    version_as_of(graph, &head_commit, scene_origin_id)
}

pub(crate) fn require_visible_version(
    graph: &PropertyGraph,
    root_id: &str,
    branch_id: &str,
    scene_origin_id: &str,
) -> PalimpsestResult<SceneVersion> {
    visible_version(graph, root_id, branch_id, scene_origin_id)?.ok_or_else(|| {
        StoreError::not_found(format!(
            "Version of scene {} on branch {}",
            scene_origin_id, branch_id
        ))
        .into()
    })
}

/// A scene that must belong to `root_id`.
pub(crate) fn require_scene_in(
    graph: &PropertyGraph,
    root_id: &str,
    scene_origin_id: &str,
) -> PalimpsestResult<SceneOrigin> {
    let scene: SceneOrigin = require(graph, scene_origin_id)?;
    if scene.root_id != root_id {
        return Err(StoreError::not_found(format!(
            "SceneOrigin {} in root {}",
            scene_origin_id, root_id
        ))
        .into());
    }
    Ok(scene)
}

/// Scenes of a root ordered by sequence index.
pub(crate) fn scenes_of_root(
    graph: &PropertyGraph,
    root_id: &str,
) -> PalimpsestResult<Vec<SceneOrigin>> {
    let mut scenes: Vec<SceneOrigin> = graph
        .all::<SceneOrigin>()?
        .into_iter()
        .filter(|scene| scene.root_id == root_id)
        .collect();
    scenes.sort_by_key(|scene| scene.sequence_index);
    Ok(scenes)
}

/// Highest sequence index among the root's scenes, 0 when it has none.
pub(crate) fn latest_scene_seq(graph: &PropertyGraph, root_id: &str) -> PalimpsestResult<i64> {
    Ok(scenes_of_root(graph, root_id)?
        .last()
        .map(|scene| scene.sequence_index)
        .unwrap_or(0))
}

pub(crate) fn entities_of(
    graph: &PropertyGraph,
    root_id: &str,
    branch_id: &str,
) -> PalimpsestResult<Vec<Entity>> {
    let mut entities: Vec<Entity> = graph
        .all::<Entity>()?
        .into_iter()
        .filter(|entity| entity.root_id == root_id && entity.branch_id == branch_id)
        .collect();
    entities.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    Ok(entities)
}

/// An entity that must live on `root_id`/`branch_id`.
pub(crate) fn require_entity_on(
    graph: &PropertyGraph,
    root_id: &str,
    branch_id: &str,
    entity_id: &str,
) -> PalimpsestResult<Entity> {
    let entity: Entity = require(graph, entity_id)?;
    if entity.root_id != root_id || entity.branch_id != branch_id {
        return Err(StoreError::not_found(format!(
            "Entity {} on branch {} of root {}",
            entity_id, branch_id, root_id
        ))
        .into());
    }
    Ok(entity)
}

/// Relations on a branch, optionally restricted to one root.
pub(crate) fn relations_on(
    graph: &PropertyGraph,
    branch_id: &str,
    root_id: Option<&str>,
) -> PalimpsestResult<Vec<TemporalRelation>> {
    Ok(graph
        .all_edges::<TemporalRelation>()?
        .into_iter()
        .filter(|relation| {
            relation.branch_id == branch_id && root_id.is_none_or(|root| relation.root_id == root)
        })
        .collect())
}

/// Snapshots of a branch ordered by scene sequence.
pub(crate) fn snapshots_of(
    graph: &PropertyGraph,
    root_id: &str,
    branch_id: &str,
) -> PalimpsestResult<Vec<WorldSnapshot>> {
    let mut snapshots: Vec<WorldSnapshot> = graph
        .all::<WorldSnapshot>()?
        .into_iter()
        .filter(|snapshot| snapshot.root_id == root_id && snapshot.branch_id == branch_id)
        .collect();
    snapshots.sort_by_key(|snapshot| snapshot.scene_seq);
    Ok(snapshots)
}

/// Delete the branch's snapshots at or after `from_seq`, or all of them.
pub(crate) fn invalidate_snapshots(
    tx: &mut GraphTransaction<'_>,
    root_id: &str,
    branch_id: &str,
    from_seq: Option<i64>,
) -> PalimpsestResult<Vec<String>> {
    let stale: Vec<String> = snapshots_of(tx, root_id, branch_id)?
        .into_iter()
        .filter(|snapshot| from_seq.is_none_or(|seq| snapshot.scene_seq >= seq))
        .map(|snapshot| snapshot.id)
        .collect();
    for id in &stale {
        tx.delete_node(id);
    }
    Ok(stale)
}
