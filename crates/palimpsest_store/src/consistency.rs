//! Whole-graph invariant checks.

use crate::NarrativeStore;
use palimpsest_core::{Branch, BranchHead, Commit, EdgeType, TemporalRelation, ids};
use palimpsest_error::{PalimpsestResult, StoreError};
use palimpsest_graph::PropertyGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, instrument, warn};

/// Invariant violations found by [`NarrativeStore::check_consistency`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Branches without a head node
    pub headless_branches: Vec<String>,
    /// Heads without exactly one HEAD edge
    pub head_edge_violations: Vec<String>,
    /// Heads whose HEAD edge disagrees with `head_commit_id`
    pub head_mismatches: Vec<String>,
    /// Commits whose PARENT edges disagree with `parent_id`
    pub parent_mismatches: Vec<String>,
    /// Commits lying on a PARENT cycle
    pub parent_cycles: Vec<String>,
    /// Pairs of same-key relations with overlapping intervals
    pub overlapping_relations: Vec<(String, String)>,
}

impl ConsistencyReport {
    /// True when no violation was found.
    pub fn is_clean(&self) -> bool {
        self.headless_branches.is_empty()
            && self.head_edge_violations.is_empty()
            && self.head_mismatches.is_empty()
            && self.parent_mismatches.is_empty()
            && self.parent_cycles.is_empty()
            && self.overlapping_relations.is_empty()
    }

    /// Number of violations across all checks.
    pub fn violation_count(&self) -> usize {
        self.headless_branches.len()
            + self.head_edge_violations.len()
            + self.head_mismatches.len()
            + self.parent_mismatches.len()
            + self.parent_cycles.len()
            + self.overlapping_relations.len()
    }
}

fn check_heads(graph: &PropertyGraph, report: &mut ConsistencyReport) -> PalimpsestResult<()> {
    for branch in graph.all::<Branch>()? {
        if !graph.contains_node(&ids::branch_head_id(&branch.root_id, &branch.branch_id)) {
            report.headless_branches.push(branch.id);
        }
    }
    for head in graph.all::<BranchHead>()? {
        let edges = graph.outgoing(head.id(), EdgeType::Head.as_ref());
        match edges.as_slice() {
            [edge] if edge.to_id != *head.head_commit_id() => {
                report.head_mismatches.push(head.id().clone());
            }
            [_] => {}
            _ => report.head_edge_violations.push(head.id().clone()),
        }
    }
    Ok(())
}

/// Commit → parent over PARENT edges, for commits with exactly one.
fn check_parents(
    graph: &PropertyGraph,
    report: &mut ConsistencyReport,
) -> PalimpsestResult<HashMap<String, String>> {
    let mut parent_of = HashMap::new();
    for commit in graph.all::<Commit>()? {
        let edges = graph.outgoing(&commit.id, EdgeType::Parent.as_ref());
        let consistent = match (edges.as_slice(), &commit.parent_id) {
            ([], None) => true,
            ([edge], Some(parent)) => edge.to_id == *parent,
            // The parent may have been garbage collected along with its edge.
            ([], Some(parent)) => !graph.contains_node(parent),
            _ => false,
        };
        if !consistent {
            report.parent_mismatches.push(commit.id.clone());
        }
        if let [edge] = edges.as_slice() {
            parent_of.insert(commit.id, edge.to_id.clone());
        }
    }
    Ok(parent_of)
}

fn find_cycles(parent_of: &HashMap<String, String>) -> Vec<String> {
    let mut done: HashSet<&str> = HashSet::new();
    let mut on_cycle = Vec::new();
    let mut starts: Vec<&String> = parent_of.keys().collect();
    starts.sort();
    for start in starts {
        let mut path: Vec<&str> = Vec::new();
        let mut position: HashMap<&str, usize> = HashMap::new();
        let mut current = Some(start.as_str());
        while let Some(id) = current {
            if done.contains(id) {
                break;
            }
            if let Some(&index) = position.get(id) {
                on_cycle.extend(path[index..].iter().map(|id| id.to_string()));
                break;
            }
            position.insert(id, path.len());
            path.push(id);
            current = parent_of.get(id).map(String::as_str);
        }
        done.extend(path);
    }
    on_cycle.sort();
    on_cycle
}

fn find_overlaps(graph: &PropertyGraph) -> PalimpsestResult<Vec<(String, String)>> {
    let mut by_key: BTreeMap<(String, String, String, String), Vec<TemporalRelation>> =
        BTreeMap::new();
    for relation in graph.all_edges::<TemporalRelation>()? {
        by_key
            .entry((
                relation.root_id.clone(),
                relation.branch_id.clone(),
                relation.from_id.clone(),
                relation.relation_type.clone(),
            ))
            .or_default()
            .push(relation);
    }
    let mut overlaps = Vec::new();
    for relations in by_key.values() {
        for (i, a) in relations.iter().enumerate() {
            for b in &relations[i + 1..] {
                if a.overlaps(b) {
                    overlaps.push((a.id.clone(), b.id.clone()));
                }
            }
        }
    }
    Ok(overlaps)
}

pub(crate) fn check(graph: &PropertyGraph) -> PalimpsestResult<ConsistencyReport> {
    let mut report = ConsistencyReport::default();
    check_heads(graph, &mut report)?;
    let parent_of = check_parents(graph, &mut report)?;
    report.parent_cycles = find_cycles(&parent_of);
    report.overlapping_relations = find_overlaps(graph)?;
    Ok(report)
}

impl NarrativeStore {
    /// Scan the whole graph for broken structural and temporal invariants.
    #[instrument(skip(self))]
    pub async fn check_consistency(&self) -> PalimpsestResult<ConsistencyReport> {
        let report = self.read(check).await?;
        if report.is_clean() {
            info!("Graph is consistent");
        } else {
            warn!(violations = report.violation_count(), "Graph is inconsistent");
        }
        Ok(report)
    }

    /// Fail with `InvariantViolation` unless the graph is consistent.
    #[instrument(skip(self))]
    pub async fn assert_consistent(&self) -> PalimpsestResult<()> {
        let report = self.check_consistency().await?;
        if report.is_clean() {
            return Ok(());
        }
        Err(StoreError::invariant(format!(
            "{} violations: {:?}",
            report.violation_count(),
            report
        ))
        .into())
    }
}
