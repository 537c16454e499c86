//! Merge-patch functions for free-form state maps.

use serde_json::{Map, Value};

/// Shallow merge: every patch key replaces the base value, other keys are kept.
///
/// # Examples
///
/// ```
/// use palimpsest_core::merge_shallow;
/// use serde_json::json;
///
/// let base = json!({"mood": "calm", "goal": {"a": 1}});
/// let patch = json!({"goal": {"b": 2}});
/// let merged = merge_shallow(base.as_object().unwrap(), patch.as_object().unwrap());
/// assert_eq!(merged["mood"], "calm");
/// assert_eq!(merged["goal"], json!({"b": 2}));
/// ```
pub fn merge_shallow(base: &Map<String, Value>, patch: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Deep merge: nested objects present on both sides are merged recursively,
/// any other patch value replaces the base value.
///
/// # Examples
///
/// ```
/// use palimpsest_core::merge_deep;
/// use serde_json::json;
///
/// let base = json!({"world": {"door": "locked", "weather": "rain"}});
/// let patch = json!({"world": {"door": "open"}});
/// let merged = merge_deep(base.as_object().unwrap(), patch.as_object().unwrap());
/// assert_eq!(merged["world"], json!({"door": "open", "weather": "rain"}));
/// ```
pub fn merge_deep(base: &Map<String, Value>, patch: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in patch {
        let next = match (merged.get(key), value) {
            (Some(Value::Object(current)), Value::Object(nested)) => {
                Value::Object(merge_deep(current, nested))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    merged
}
