//! Identifier construction.
//!
//! Records addressed by a natural key get deterministic ids so lookups do not
//! need a scan; everything else gets a random v4 uuid.

/// A fresh random id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Branch node id for a branch label within a root.
pub fn branch_node_id(root_id: &str, branch_id: &str) -> String {
    format!("{root_id}:{branch_id}")
}

/// Branch head id for a branch label within a root.
pub fn branch_head_id(root_id: &str, branch_id: &str) -> String {
    format!("{root_id}:{branch_id}:head")
}

/// Commit id, scoped to the branch that created it.
pub fn commit_id(root_id: &str, branch_id: &str) -> String {
    format!("{root_id}:{branch_id}:{}", new_id())
}

/// Scene version id, scoped to its scene origin.
pub fn scene_version_id(scene_origin_id: &str) -> String {
    format!("{scene_origin_id}:{}", new_id())
}

/// World snapshot id. One snapshot exists per (root, branch, scene sequence).
pub fn snapshot_id(root_id: &str, branch_id: &str, scene_seq: i64) -> String {
    format!("{root_id}:{branch_id}:snapshot:{scene_seq}")
}

/// Act id.
pub fn act_id(root_id: &str, sequence: i64) -> String {
    format!("{root_id}:act:{sequence}")
}

/// Chapter id.
pub fn chapter_id(act_id: &str, sequence: i64) -> String {
    format!("{act_id}:ch:{sequence}")
}

/// Story anchor id.
pub fn anchor_id(root_id: &str, sequence: i64) -> String {
    format!("{root_id}:anchor:{sequence}")
}

/// Character agent id.
pub fn agent_id(character_id: &str, branch_id: &str) -> String {
    format!("agent:{character_id}:{branch_id}")
}

/// Simulation log id for one round of a simulated scene version.
pub fn simulation_log_id(scene_version_id: &str, round_number: i64) -> String {
    format!("sim:{scene_version_id}:round:{round_number}")
}
