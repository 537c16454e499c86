//! Tests for the outline, anchor, agent, simulation and subplot registries.

mod test_utils;

use palimpsest_core::{AnchorType, ConstraintType, EntityType, SimulationLog, Subplot, SubplotStatus};
use palimpsest_error::StoreErrorKind;
use palimpsest_store::NarrativeStore;
use serde_json::{Map, Value, json};
use test_utils::{create_scenes, entity, kind, store_with_root};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected an object, got {other}"),
    }
}

async fn first_version(store: &NarrativeStore, root_id: &str) -> String {
    let scenes = create_scenes(store, root_id, 1).await;
    store
        .get_visible_scene_version(root_id, "main", &scenes[0])
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_acts_and_chapters() {
    let (store, root_id) = store_with_root().await;
    let act = store
        .create_act(&root_id, 1, "The Storm", "set the stakes", "bleak")
        .await
        .unwrap();
    assert_eq!(act.id, format!("{root_id}:act:1"));
    store
        .create_act(&root_id, 2, "The Wreck", "complicate", "tense")
        .await
        .unwrap();

    let err = store
        .create_act(&root_id, 1, "Again", "", "")
        .await
        .unwrap_err();
    assert!(matches!(
        kind(&err),
        StoreErrorKind::DuplicateSequence { sequence: 1, .. }
    ));

    let acts = store.list_acts(&root_id).await.unwrap();
    let titles: Vec<&str> = acts.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["The Storm", "The Wreck"]);

    let second = store
        .create_chapter(&act.id, 2, "Lantern", "the light", Some("mara"))
        .await
        .unwrap();
    let first = store
        .create_chapter(&act.id, 1, "Tide", "arrival", None)
        .await
        .unwrap();
    assert_eq!(first.review_status, "pending");
    assert_eq!(second.pov_character_id.as_deref(), Some("mara"));
    let err = store
        .create_chapter(&act.id, 1, "Duplicate", "", None)
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::DuplicateSequence { .. }));

    let chapters = store.list_chapters(&act.id).await.unwrap();
    let ids: Vec<&str> = chapters.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);
}

#[tokio::test]
async fn test_act_updates_keep_identity() {
    let (store, root_id) = store_with_root().await;
    let act = store
        .create_act(&root_id, 1, "The Storm", "set the stakes", "bleak")
        .await
        .unwrap();

    let renamed = store
        .update_act(palimpsest_core::Act {
            title: "The Gale".to_string(),
            ..act.clone()
        })
        .await
        .unwrap();
    assert_eq!(store.get_act(&act.id).await.unwrap(), renamed);

    let err = store
        .update_act(palimpsest_core::Act {
            sequence: 9,
            ..act
        })
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::Validation(_)));
}

#[tokio::test]
async fn test_scene_chapter_membership() {
    let (store, root_id) = store_with_root().await;
    let scenes = create_scenes(&store, &root_id, 1).await;
    let act = store
        .create_act(&root_id, 1, "The Storm", "", "")
        .await
        .unwrap();
    let first = store
        .create_chapter(&act.id, 1, "Tide", "", None)
        .await
        .unwrap();
    let second = store
        .create_chapter(&act.id, 2, "Lantern", "", None)
        .await
        .unwrap();

    let scene = store.link_scene_to_chapter(&scenes[0], &first.id).await.unwrap();
    assert_eq!(scene.chapter_id.as_deref(), Some(first.id.as_str()));
    let scene = store
        .link_scene_to_chapter(&scenes[0], &second.id)
        .await
        .unwrap();
    assert_eq!(scene.chapter_id.as_deref(), Some(second.id.as_str()));

    let err = store.delete_act(&act.id).await.unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::Validation(_)));

    store.delete_chapter(&second.id).await.unwrap();
    let scene = store.get_scene_origin(&scenes[0]).await.unwrap();
    assert!(scene.chapter_id.is_none());

    store.delete_chapter(&first.id).await.unwrap();
    store.delete_act(&act.id).await.unwrap();
    assert!(store.list_acts(&root_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_anchor_ordering_follows_dependencies() {
    let (store, root_id) = store_with_root().await;
    let version_id = first_version(&store, &root_id).await;

    let inciting = store
        .create_anchor(
            &root_id,
            "main",
            1,
            AnchorType::IncitingIncident,
            "a ship runs aground",
            ConstraintType::Hard,
            "storm",
        )
        .await
        .unwrap();
    let midpoint = store
        .create_anchor(
            &root_id,
            "main",
            2,
            AnchorType::Midpoint,
            "the keeper finds a survivor",
            ConstraintType::Soft,
            "",
        )
        .await
        .unwrap();
    let climax = store
        .create_anchor(
            &root_id,
            "main",
            3,
            AnchorType::Climax,
            "the keeper confesses",
            ConstraintType::Flexible,
            "",
        )
        .await
        .unwrap();

    // The inciting incident waits on the midpoint.
    store
        .add_anchor_dependency(&inciting.id, &midpoint.id)
        .await
        .unwrap();
    store
        .add_anchor_dependency(&inciting.id, &midpoint.id)
        .await
        .unwrap();
    store
        .add_anchor_dependency(&climax.id, &inciting.id)
        .await
        .unwrap();

    let next = store
        .get_next_unachieved_anchor(&root_id, "main")
        .await
        .unwrap();
    assert_eq!(next.map(|a| a.id), Some(midpoint.id.clone()));

    let achieved = store
        .mark_anchor_achieved(&midpoint.id, &version_id)
        .await
        .unwrap();
    assert!(achieved.achieved);
    let next = store
        .get_next_unachieved_anchor(&root_id, "main")
        .await
        .unwrap();
    assert_eq!(next.map(|a| a.id), Some(inciting.id.clone()));

    store
        .mark_anchor_achieved(&inciting.id, &version_id)
        .await
        .unwrap();
    store
        .mark_anchor_achieved(&climax.id, &version_id)
        .await
        .unwrap();
    let next = store
        .get_next_unachieved_anchor(&root_id, "main")
        .await
        .unwrap();
    assert!(next.is_none());

    let err = store
        .mark_anchor_achieved(&climax.id, &version_id)
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::AlreadyAchieved(_)));
}

#[tokio::test]
async fn test_anchor_validation() {
    let (store, root_id) = store_with_root().await;
    let first = store
        .create_anchor(
            &root_id,
            "main",
            1,
            AnchorType::IncitingIncident,
            "a ship runs aground",
            ConstraintType::Hard,
            "",
        )
        .await
        .unwrap();
    let second = store
        .create_anchor(
            &root_id,
            "main",
            2,
            AnchorType::Resolution,
            "dawn",
            ConstraintType::Soft,
            "",
        )
        .await
        .unwrap();

    let err = store
        .create_anchor(
            &root_id,
            "main",
            1,
            AnchorType::Climax,
            "again",
            ConstraintType::Hard,
            "",
        )
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::DuplicateSequence { .. }));

    let err = store
        .add_anchor_dependency(&first.id, &first.id)
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::Validation(_)));

    store
        .add_anchor_dependency(&second.id, &first.id)
        .await
        .unwrap();
    let err = store
        .add_anchor_dependency(&first.id, &second.id)
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::Validation(_)));

    let updated = store
        .update_anchor(palimpsest_core::StoryAnchor {
            description: "a quiet dawn".to_string(),
            deadline_scene: Some(40),
            sequence: 99,
            achieved: true,
            ..second.clone()
        })
        .await
        .unwrap();
    assert_eq!(updated.description, "a quiet dawn");
    assert_eq!(updated.sequence, 2);
    assert!(!updated.achieved);

    store.delete_anchor(&second.id).await.unwrap();
    let anchors = store.list_anchors(&root_id, "main").await.unwrap();
    assert_eq!(anchors.len(), 1);
    assert!(store.get_anchor(&second.id).await.is_err());
}

#[tokio::test]
async fn test_agent_lifecycle() {
    let (store, root_id) = store_with_root().await;
    entity(&store, &root_id, "mara", EntityType::Character).await;
    entity(&store, &root_id, "home", EntityType::Location).await;

    let agent = store
        .init_character_agent("mara", "main", vec![json!("keep the light")])
        .await
        .unwrap();
    assert_eq!(*agent.version(), 1);
    let mara = store.get_entity("mara").await.unwrap();
    assert!(mara.has_agent);
    assert_eq!(mara.agent_state_id.as_deref(), Some(agent.id().as_str()));

    let err = store
        .init_character_agent("mara", "main", vec![])
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::AlreadyExists(_)));
    let err = store
        .init_character_agent("home", "main", vec![])
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::Validation(_)));

    store
        .update_agent_beliefs(agent.id(), object(json!({"trust": {"tomas": 1}})))
        .await
        .unwrap();
    let state = store
        .update_agent_beliefs(agent.id(), object(json!({"trust": {"ada": 2}})))
        .await
        .unwrap();
    assert_eq!(*state.version(), 3);
    assert_eq!(
        Value::Object(state.beliefs().clone()),
        json!({"trust": {"tomas": 1, "ada": 2}})
    );

    let state = store
        .update_agent_desires(agent.id(), vec![json!("hide the wreck")])
        .await
        .unwrap();
    assert_eq!(*state.version(), 4);
    assert_eq!(state.desires(), &vec![json!("hide the wreck")]);

    store.delete_agent_state(agent.id()).await.unwrap();
    let mara = store.get_entity("mara").await.unwrap();
    assert!(!mara.has_agent);
    assert!(mara.agent_state_id.is_none());
    assert!(store.get_agent_state(agent.id()).await.is_err());
}

#[tokio::test]
async fn test_agent_memory_keeps_most_important() {
    let (store, root_id) = store_with_root().await;
    entity(&store, &root_id, "mara", EntityType::Character).await;
    let agent = store
        .init_character_agent("mara", "main", vec![])
        .await
        .unwrap();

    for importance in 1..=95 {
        store
            .add_agent_memory(
                agent.id(),
                object(json!({"importance": importance, "event": format!("event {importance}")})),
            )
            .await
            .unwrap();
    }

    let state = store.get_agent_state(agent.id()).await.unwrap();
    assert_eq!(state.memory().len(), 80);
    let mut kept: Vec<i64> = state
        .memory()
        .iter()
        .map(|entry| entry.importance.as_i64().unwrap())
        .collect();
    kept.sort();
    assert_eq!(kept, (16..=95).collect::<Vec<i64>>());
    assert_eq!(state.memory()[0].content["event"], json!("event 95"));

    let err = store
        .add_agent_memory(agent.id(), object(json!({"event": "unranked"})))
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::Validation(_)));
}

#[tokio::test]
async fn test_simulation_logs() {
    let (store, root_id) = store_with_root().await;
    let version_id = first_version(&store, &root_id).await;

    let second = store
        .create_simulation_log(SimulationLog {
            drama_score: 0.7,
            ..SimulationLog::new(&version_id, 2)
        })
        .await
        .unwrap();
    let first = store
        .create_simulation_log(SimulationLog::new(&version_id, 1))
        .await
        .unwrap();

    let version = store.get_scene_version(&version_id).await.unwrap();
    assert!(version.is_simulated);
    assert_eq!(version.simulation_log_id.as_deref(), Some(first.id.as_str()));

    let err = store
        .create_simulation_log(SimulationLog::new(&version_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::AlreadyExists(_)));

    let rounds: Vec<i64> = store
        .list_simulation_logs(&version_id)
        .await
        .unwrap()
        .iter()
        .map(|log| log.round_number)
        .collect();
    assert_eq!(rounds, vec![1, 2]);

    let updated = store
        .update_simulation_log(SimulationLog {
            convergence_score: 0.9,
            stagnation_count: 1,
            ..second.clone()
        })
        .await
        .unwrap();
    assert_eq!(
        store.get_simulation_log(&second.id).await.unwrap(),
        updated
    );
    let err = store
        .update_simulation_log(SimulationLog {
            round_number: 5,
            ..second
        })
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::Validation(_)));

    store.delete_simulation_log(&first.id).await.unwrap();
    let version = store.get_scene_version(&version_id).await.unwrap();
    assert!(!version.is_simulated);
    assert!(version.simulation_log_id.is_none());
    assert_eq!(store.list_simulation_logs(&version_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_subplot_lifecycle() {
    let (store, root_id) = store_with_root().await;
    let romance = store
        .create_subplot(Subplot::new(
            &root_id,
            "main",
            "Letters",
            "romance",
            "mara",
            "distance",
        ))
        .await
        .unwrap();
    store
        .create_subplot(Subplot::new(
            &root_id,
            "main",
            "Debts",
            "mystery",
            "tomas",
            "the ledger",
        ))
        .await
        .unwrap();
    assert_eq!(romance.status, SubplotStatus::Dormant);

    let err = store
        .create_subplot(Subplot::new(&root_id, "main", " ", "", "", ""))
        .await
        .unwrap_err();
    assert!(matches!(kind(&err), StoreErrorKind::Validation(_)));

    let err = store.resolve_subplot(&romance.id).await.unwrap_err();
    assert!(matches!(
        kind(&err),
        StoreErrorKind::InvalidStateTransition { .. }
    ));

    let active = store.activate_subplot(&romance.id).await.unwrap();
    assert_eq!(active.status, SubplotStatus::Active);
    let err = store.activate_subplot(&romance.id).await.unwrap_err();
    assert!(matches!(
        kind(&err),
        StoreErrorKind::InvalidStateTransition { .. }
    ));

    let updated = store
        .update_subplot(Subplot {
            central_conflict: "a lost letter".to_string(),
            status: SubplotStatus::Dormant,
            ..active
        })
        .await
        .unwrap();
    assert_eq!(updated.status, SubplotStatus::Active);
    assert_eq!(updated.central_conflict, "a lost letter");

    let resolved = store.resolve_subplot(&romance.id).await.unwrap();
    assert_eq!(resolved.status, SubplotStatus::Resolved);

    let titles: Vec<String> = store
        .list_subplots(&root_id, "main")
        .await
        .unwrap()
        .into_iter()
        .map(|subplot| subplot.title)
        .collect();
    assert_eq!(titles, vec!["Debts", "Letters"]);

    store.delete_subplot(&romance.id).await.unwrap();
    assert!(store.get_subplot(&romance.id).await.is_err());
}
