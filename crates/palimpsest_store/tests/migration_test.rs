//! Tests for moving a store between graph backends.

mod test_utils;

use palimpsest_core::{EntityType, StoreConfig};
use palimpsest_graph::InMemoryGraphRepository;
use palimpsest_interface::GraphRepository;
use palimpsest_store::NarrativeStore;
use test_utils::{create_scenes, entity, store_with_root};

#[tokio::test]
async fn test_export_then_load_preserves_the_graph() {
    let (store, root_id) = store_with_root().await;
    let scenes = create_scenes(&store, &root_id, 3).await;
    entity(&store, &root_id, "mara", EntityType::Character).await;
    entity(&store, &root_id, "home", EntityType::Location).await;
    store
        .upsert_relation("mara", "home", "AT", 1, 2, "main")
        .await
        .unwrap();
    store.create_branch(&root_id, "draft", None).await.unwrap();

    let backend = InMemoryGraphRepository::new();
    store.export_to(&backend).await.unwrap();
    let exported = backend.snapshot().await.unwrap();
    assert_eq!(exported, store.dump().await);

    let restored = NarrativeStore::from_repository(&backend, StoreConfig::default())
        .await
        .unwrap();
    assert_eq!(restored.dump().await, store.dump().await);
    assert_eq!(
        restored.list_branches(&root_id).await.unwrap(),
        vec!["draft", "main"]
    );
    let state = restored
        .get_world_state(&root_id, "main", 3)
        .await
        .unwrap();
    assert_eq!(state.target("mara", "AT"), Some("home"));
    let visible = restored
        .get_visible_scene_version(&root_id, "draft", &scenes[2])
        .await
        .unwrap();
    assert_eq!(visible.expected_outcome, "outcome 3");
    restored.assert_consistent().await.unwrap();
}

#[tokio::test]
async fn test_restored_store_is_independent() {
    let (store, root_id) = store_with_root().await;
    let backend = InMemoryGraphRepository::new();
    store.export_to(&backend).await.unwrap();
    let restored = NarrativeStore::from_repository(&backend, StoreConfig::default())
        .await
        .unwrap();

    create_scenes(&restored, &root_id, 1).await;
    let original = store.get_branch_head(&root_id, "main").await.unwrap();
    let moved = restored.get_branch_head(&root_id, "main").await.unwrap();
    assert_eq!(*moved.version(), original.version() + 1);
    assert_ne!(restored.dump().await, store.dump().await);
}

#[tokio::test]
async fn test_export_into_occupied_backend_fails_atomically() {
    let (store, _root_id) = store_with_root().await;
    let backend = InMemoryGraphRepository::new();
    store.export_to(&backend).await.unwrap();

    // The same node ids are already present.
    assert!(store.export_to(&backend).await.is_err());
    assert_eq!(backend.snapshot().await.unwrap(), store.dump().await);
}

#[tokio::test]
async fn test_store_is_a_repository() {
    let (store, _root_id) = store_with_root().await;
    let dump = GraphRepository::snapshot(&store).await.unwrap();
    assert_eq!(dump, store.dump().await);

    let empty = NarrativeStore::new();
    empty.load_dump(dump.clone()).await.unwrap();
    assert_eq!(empty.dump().await, dump);
}

#[tokio::test]
async fn test_failed_load_leaves_store_empty() {
    let (store, _root_id) = store_with_root().await;
    let mut dump = store.dump().await;
    let mut dangling = dump.edges[0].clone();
    dangling.id = "dangling".to_string();
    dangling.to_id = "nowhere".to_string();
    dump.edges.push(dangling);

    let target = NarrativeStore::new();
    assert!(target.load_dump(dump).await.is_err());
    assert!(target.dump().await.is_empty());
}
