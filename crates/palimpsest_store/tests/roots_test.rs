//! Tests for roots, entities and scene annotations.

mod test_utils;

use palimpsest_core::{
    CharacterSeedBuilder, EntityType, NewEntityBuilder, SceneSeed, SceneSeedBuilder, SceneStatus,
};
use palimpsest_error::StoreErrorKind;
use palimpsest_store::NarrativeStore;
use serde_json::{Map, Value, json};
use test_utils::{content, create_scenes, entity, kind, seed, store_with_root};

fn scene_seed(id: &str, sequence_index: i64) -> SceneSeed {
    SceneSeedBuilder::default()
        .id(id)
        .title(format!("Imported {id}"))
        .sequence_index(sequence_index)
        .pov_character_id("mara")
        .expected_outcome(format!("{id} happens"))
        .build()
        .unwrap()
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected an object, got {other}"),
    }
}

#[tokio::test]
async fn test_save_imports_characters_and_scenes() {
    let store = NarrativeStore::new();
    let characters = vec![
        CharacterSeedBuilder::default()
            .entity_id("mara")
            .name("Mara")
            .ambition("keep the light burning")
            .build()
            .unwrap(),
        CharacterSeedBuilder::default()
            .entity_id("tomas")
            .name("Tomas")
            .build()
            .unwrap(),
    ];
    let root_id = store
        .save(
            seed(),
            characters,
            vec![scene_seed("wreck", 1), scene_seed("rescue", 3)],
        )
        .await
        .unwrap();

    let snapshot = store.get_root_snapshot(&root_id, "main").await.unwrap();
    assert_eq!(snapshot.root.logline(), "A lighthouse keeper hides a wrecked ship");
    let names: Vec<&str> = snapshot.characters.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Mara", "Tomas"]);
    assert_eq!(
        snapshot.characters[0].semantic_states["ambition"],
        json!("keep the light burning")
    );
    let scenes: Vec<&str> = snapshot.scenes.iter().map(|s| s.origin.id.as_str()).collect();
    assert_eq!(scenes, vec!["wreck", "rescue"]);
    assert!(snapshot.scenes.iter().all(|s| s.version.is_some()));
    assert!(snapshot.relations.is_empty());

    // New scenes continue after the highest imported index.
    let created = store
        .create_scene_origin(&root_id, "main", "Dawn", None, content("dawn"))
        .await
        .unwrap();
    let origin = store.get_scene_origin(&created.scene_origin_id).await.unwrap();
    assert_eq!(origin.sequence_index, 4);
    assert_eq!(store.list_branches(&root_id).await.unwrap(), vec!["main"]);
    store.assert_consistent().await.unwrap();
}

#[tokio::test]
async fn test_save_rejects_bad_scenes() {
    let store = NarrativeStore::new();
    let mut headless = scene_seed("wreck", 1);
    headless.pov_character_id = None;
    let err = store.save(seed(), vec![], vec![headless]).await.unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::Validation(_)));

    let err = store
        .save(
            seed(),
            vec![],
            vec![scene_seed("wreck", 2), scene_seed("rescue", 2)],
        )
        .await
        .unwrap_err();
    assert!(matches!(
        kind(&err),
        StoreErrorKind::DuplicateSequence { sequence: 2, .. }
    ));
    assert!(store.dump().await.is_empty());
}

#[tokio::test]
async fn test_list_and_update_roots() {
    let store = NarrativeStore::new();
    for _ in 0..3 {
        store.save(seed(), vec![], vec![]).await.unwrap();
    }
    assert_eq!(store.list_roots(2, 0).await.unwrap().len(), 2);
    assert_eq!(store.list_roots(10, 2).await.unwrap().len(), 1);

    let root_id = store.list_roots(1, 0).await.unwrap()[0].id().clone();
    let root = store
        .update_root_metadata(&root_id, None, Some("forgiveness".to_string()), None)
        .await
        .unwrap();
    assert_eq!(root.theme(), "forgiveness");
    assert_eq!(root.ending(), "the keeper confesses");
    assert_eq!(store.get_root(&root_id).await.unwrap(), root);
}

#[tokio::test]
async fn test_delete_root_requires_no_branches() {
    let (store, root_id) = store_with_root().await;
    let scenes = create_scenes(&store, &root_id, 2).await;
    entity(&store, &root_id, "mara", EntityType::Character).await;
    store
        .init_character_agent("mara", "main", vec![])
        .await
        .unwrap();
    store
        .create_act(&root_id, 1, "The Storm", "", "")
        .await
        .unwrap();

    let err = store.delete_root(&root_id).await.unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::Validation(_)));

    store.delete_branch(&root_id, "main").await.unwrap();
    assert!(store.list_branches(&root_id).await.unwrap().is_empty());
    let err = store.get_branch_head(&root_id, "main").await.unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::NotFound(_)));

    let deleted = store.delete_root(&root_id).await.unwrap();
    assert!(deleted > scenes.len());
    assert!(store.dump().await.is_empty());
    let err = store.get_root(&root_id).await.unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::NotFound(_)));
}

#[tokio::test]
async fn test_entities_and_semantic_states() {
    let (store, root_id) = store_with_root().await;
    let lamp = store
        .create_entity(
            &root_id,
            "main",
            NewEntityBuilder::default()
                .name("Lamp")
                .entity_type(EntityType::Object)
                .arc_status("intact")
                .semantic_states(object(json!({"lit": true, "fuel": {"level": 3}})))
                .build()
                .unwrap(),
        )
        .await
        .unwrap();
    entity(&store, &root_id, "mara", EntityType::Character).await;

    let err = store
        .create_entity(
            &root_id,
            "main",
            NewEntityBuilder::default()
                .id("mara")
                .name("Mara again")
                .entity_type(EntityType::Character)
                .arc_status("active")
                .build()
                .unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::AlreadyExists(_)));

    let err = store
        .create_entity(
            &root_id,
            "main",
            NewEntityBuilder::default()
                .name("  ")
                .entity_type(EntityType::Location)
                .arc_status("active")
                .build()
                .unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::Validation(_)));

    let states = store
        .apply_semantic_states_patch(&lamp.id, object(json!({"fuel": {"reserve": 1}})))
        .await
        .unwrap();
    assert_eq!(
        Value::Object(states),
        json!({"lit": true, "fuel": {"reserve": 1}})
    );
    assert_eq!(
        store.get_entity_semantic_states(&lamp.id).await.unwrap()["lit"],
        json!(true)
    );

    let updated = store
        .update_entity(&lamp.id, None, Some(vec!["heirloom".to_string()]), Some("broken".to_string()))
        .await
        .unwrap();
    assert_eq!(updated.name, "Lamp");
    assert_eq!(updated.tags, vec!["heirloom"]);
    assert_eq!(updated.arc_status, "broken");

    let names: Vec<String> = store
        .list_entities(&root_id, "main")
        .await
        .unwrap()
        .into_iter()
        .map(|entity| entity.name)
        .collect();
    assert_eq!(names, vec!["Lamp", "mara"]);
}

#[tokio::test]
async fn test_scene_annotations() {
    let (store, root_id) = store_with_root().await;
    let scenes = create_scenes(&store, &root_id, 1).await;
    let head_before = store.get_branch_head(&root_id, "main").await.unwrap();

    store
        .save_scene_render(&scenes[0], "main", "The lamp guttered.")
        .await
        .unwrap();
    let completed = store
        .complete_scene(&scenes[0], "main", "the ship is hidden", "Mara hides the wreck")
        .await
        .unwrap();
    assert_eq!(completed.status, SceneStatus::Committed);
    assert_eq!(completed.rendered_content.as_deref(), Some("The lamp guttered."));
    assert_eq!(completed.actual_outcome.as_deref(), Some("the ship is hidden"));

    let err = store
        .mark_scene_logic_exception(&root_id, "main", &scenes[0], " ")
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::Validation(_)));
    assert!(
        !store
            .is_scene_logic_exception(&root_id, "main", &scenes[0])
            .await
            .unwrap()
    );
    let flagged = store
        .mark_scene_logic_exception(&root_id, "main", &scenes[0], "the tide runs backwards")
        .await
        .unwrap();
    assert_eq!(
        flagged.logic_exception_reason.as_deref(),
        Some("the tide runs backwards")
    );
    assert!(
        store
            .is_scene_logic_exception(&root_id, "main", &scenes[0])
            .await
            .unwrap()
    );

    // Annotations do not move the head.
    let head_after = store.get_branch_head(&root_id, "main").await.unwrap();
    assert_eq!(head_after, head_before);
}

#[tokio::test]
async fn test_dirty_tracking() {
    let (store, root_id) = store_with_root().await;
    let scenes = create_scenes(&store, &root_id, 4).await;

    let marked = store
        .mark_future_scenes_dirty(&root_id, "main", &scenes[1])
        .await
        .unwrap();
    assert_eq!(marked, vec![scenes[2].clone(), scenes[3].clone()]);

    let fixed = store
        .apply_local_scene_fix(&root_id, "main", &scenes[0])
        .await
        .unwrap();
    assert_eq!(fixed, vec![scenes[0].clone()]);

    let mut expected = vec![scenes[0].clone(), scenes[2].clone(), scenes[3].clone()];
    expected.sort();
    assert_eq!(store.list_dirty_scenes(&root_id, "main").await.unwrap(), expected);

    // A version committed on another branch is annotated independently.
    store.create_branch(&root_id, "draft", None).await.unwrap();
    store
        .commit_scene(&root_id, "draft", &scenes[1], content("revised"), "revise", None)
        .await
        .unwrap();
    store.mark_scene_dirty(&scenes[1], "draft").await.unwrap();
    assert!(
        !store
            .list_dirty_scenes(&root_id, "main")
            .await
            .unwrap()
            .contains(&scenes[1])
    );
    assert!(
        store
            .list_dirty_scenes(&root_id, "draft")
            .await
            .unwrap()
            .contains(&scenes[1])
    );
}

#[tokio::test]
async fn test_scene_context() {
    let (store, root_id) = store_with_root().await;
    let scenes = create_scenes(&store, &root_id, 3).await;
    entity(&store, &root_id, "mara", EntityType::Character).await;
    entity(&store, &root_id, "home", EntityType::Location).await;
    store
        .upsert_relation("mara", "home", "AT", 2, 1, "main")
        .await
        .unwrap();

    let context = store.get_scene_context(&scenes[1], "main").await.unwrap();
    assert_eq!(context.root_id, root_id);
    assert_eq!(context.expected_outcome, "outcome 2");
    assert_eq!(context.summary, "");
    assert_eq!(context.prev_scene_id.as_deref(), Some(scenes[0].as_str()));
    assert_eq!(context.next_scene_id.as_deref(), Some(scenes[2].as_str()));
    assert_eq!(context.scene_entities.len(), 2);
    assert_eq!(context.characters.len(), 1);
    assert_eq!(context.semantic_states["mara"]["AT"], "home");
    assert_eq!(context.relations[0].tension, 2);

    let first = store.get_scene_context(&scenes[0], "main").await.unwrap();
    assert!(first.prev_scene_id.is_none());

    let state = store
        .build_logic_check_world_state(&root_id, "main", &scenes[2])
        .await
        .unwrap();
    assert_eq!(state.target("mara", "AT"), Some("home"));

    let other_root = store.save(seed(), vec![], vec![]).await.unwrap();
    let err = store
        .build_logic_check_world_state(&other_root, "main", &scenes[0])
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::NotFound(_)));
}
