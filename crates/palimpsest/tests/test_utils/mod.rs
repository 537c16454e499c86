//! Shared fixtures for CLI tests.

#![allow(dead_code)]

use palimpsest::{
    EntityType, GraphDump, NarrativeStore, NewEntityBuilder, SceneContentBuilder, StorySeed,
};
use std::path::PathBuf;
use std::process::{Command, Output};

/// A dump file under the system temp dir, removed on drop.
pub struct TempDump {
    pub path: PathBuf,
}

impl TempDump {
    pub fn write(dump: &GraphDump) -> Self {
        let path = std::env::temp_dir().join(format!("palimpsest-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, serde_json::to_string(dump).unwrap()).unwrap();
        Self { path }
    }

    pub fn read(&self) -> GraphDump {
        serde_json::from_str(&std::fs::read_to_string(&self.path).unwrap()).unwrap()
    }
}

impl Drop for TempDump {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Run the binary with `args`.
pub fn palimpsest(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_palimpsest"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("DATABASE_URL")
        .output()
        .unwrap()
}

/// A story with three scenes on `main`, a draft branch and one relation.
pub async fn story() -> (NarrativeStore, String) {
    let store = NarrativeStore::new();
    let root_id = store
        .save(
            StorySeed {
                logline: "Two sisters inherit a failing vineyard".to_string(),
                theme: "inheritance".to_string(),
                ending: "the vines are sold".to_string(),
            },
            vec![],
            vec![],
        )
        .await
        .unwrap();
    for i in 1..=3 {
        let content = SceneContentBuilder::default()
            .expected_outcome(format!("harvest {}", i))
            .pov_character_id("ines")
            .build()
            .unwrap();
        store
            .create_scene_origin(&root_id, "main", &format!("Scene {}", i), None, content)
            .await
            .unwrap();
    }
    for (id, entity_type) in [("ines", EntityType::Character), ("vineyard", EntityType::Location)] {
        let entity = NewEntityBuilder::default()
            .id(id)
            .name(id)
            .entity_type(entity_type)
            .arc_status("active")
            .build()
            .unwrap();
        store.create_entity(&root_id, "main", entity).await.unwrap();
    }
    store
        .upsert_relation("ines", "vineyard", "AT", 3, 2, "main")
        .await
        .unwrap();
    store.create_branch(&root_id, "draft", None).await.unwrap();
    (store, root_id)
}
