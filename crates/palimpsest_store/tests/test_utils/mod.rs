//! Shared fixtures for store tests.

#![allow(dead_code)]

use palimpsest_core::{
    EntityType, NewEntityBuilder, SceneContent, SceneContentBuilder, StoreConfig, StorySeed,
};
use palimpsest_error::{PalimpsestError, StoreErrorKind};
use palimpsest_store::NarrativeStore;

pub fn seed() -> StorySeed {
    StorySeed {
        logline: "A lighthouse keeper hides a wrecked ship".to_string(),
        theme: "guilt".to_string(),
        ending: "the keeper confesses".to_string(),
    }
}

pub fn content(expected_outcome: &str) -> SceneContent {
    SceneContentBuilder::default()
        .expected_outcome(expected_outcome)
        .pov_character_id("mara")
        .build()
        .expect("Failed to build scene content")
}

/// A store holding one empty root. Returns the store and the root id.
pub async fn store_with_root() -> (NarrativeStore, String) {
    store_with_root_and_config(StoreConfig::default()).await
}

pub async fn store_with_root_and_config(config: StoreConfig) -> (NarrativeStore, String) {
    let store = NarrativeStore::with_config(config);
    let root_id = store.save(seed(), vec![], vec![]).await.unwrap();
    (store, root_id)
}

/// Create `count` scenes on `main`, returning their origin ids in order.
pub async fn create_scenes(store: &NarrativeStore, root_id: &str, count: usize) -> Vec<String> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let created = store
            .create_scene_origin(
                root_id,
                "main",
                &format!("Scene {}", i + 1),
                None,
                content(&format!("outcome {}", i + 1)),
            )
            .await
            .unwrap();
        ids.push(created.scene_origin_id);
    }
    ids
}

/// Create an entity on `main` with a fixed id.
pub async fn entity(store: &NarrativeStore, root_id: &str, id: &str, entity_type: EntityType) {
    let new_entity = NewEntityBuilder::default()
        .id(id)
        .name(id)
        .entity_type(entity_type)
        .arc_status("active")
        .build()
        .expect("Failed to build entity");
    store.create_entity(root_id, "main", new_entity).await.unwrap();
}

pub fn kind(err: &PalimpsestError) -> &StoreErrorKind {
    err.store_kind().expect("Expected a store error")
}
