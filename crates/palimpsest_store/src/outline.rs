//! Acts and chapters.

use crate::NarrativeStore;
use crate::queries::{find, require, require_root};
use palimpsest_core::{Act, Chapter, EdgeType, SceneOrigin, ids};
use palimpsest_error::{PalimpsestResult, StoreError, StoreErrorKind};
use palimpsest_graph::GraphTransaction;
use tracing::{info, instrument};

fn duplicate_sequence(scope: &str, sequence: i64) -> StoreError {
    StoreError::new(StoreErrorKind::DuplicateSequence {
        scope: scope.to_string(),
        sequence,
    })
}

/// Drop a scene's chapter membership, edge and field both.
fn unlink_scene(tx: &mut GraphTransaction<'_>, scene: &mut SceneOrigin) -> PalimpsestResult<()> {
    let edges: Vec<String> = tx
        .incoming(&scene.id, EdgeType::ContainsScene.as_ref())
        .iter()
        .map(|edge| edge.id.clone())
        .collect();
    for id in &edges {
        tx.delete_edge(id);
    }
    scene.chapter_id = None;
    tx.put(&*scene)?;
    Ok(())
}

impl NarrativeStore {
    /// Create an act at `sequence` within a root.
    #[instrument(skip(self, purpose, tone))]
    pub async fn create_act(
        &self,
        root_id: &str,
        sequence: i64,
        title: &str,
        purpose: &str,
        tone: &str,
    ) -> PalimpsestResult<Act> {
        self.write(|tx| {
            require_root(tx, root_id)?;
            let id = ids::act_id(root_id, sequence);
            if tx.contains_node(&id) {
                return Err(duplicate_sequence(&format!("acts of root {}", root_id), sequence).into());
            }
            let act = Act {
                id,
                root_id: root_id.to_string(),
                sequence,
                title: title.to_string(),
                purpose: purpose.to_string(),
                tone: tone.to_string(),
            };
            tx.create(&act)?;
            info!(act = %act.id, "Created act");
            Ok(act)
        })
        .await
    }

    /// Load an act.
    #[instrument(skip(self))]
    pub async fn get_act(&self, act_id: &str) -> PalimpsestResult<Act> {
        self.read(|graph| require(graph, act_id)).await
    }

    /// Replace an act's title, purpose and tone.
    #[instrument(skip(self, act), fields(act = %act.id))]
    pub async fn update_act(&self, act: Act) -> PalimpsestResult<Act> {
        self.write(|tx| {
            let stored: Act = require(tx, &act.id)?;
            if stored.root_id != act.root_id || stored.sequence != act.sequence {
                return Err(StoreError::validation(format!(
                    "act {} cannot change root or sequence",
                    act.id
                ))
                .into());
            }
            tx.put(&act)?;
            Ok(act)
        })
        .await
    }

    /// Delete an act that has no chapters left.
    #[instrument(skip(self))]
    pub async fn delete_act(&self, act_id: &str) -> PalimpsestResult<()> {
        self.write(|tx| {
            require::<Act>(tx, act_id)?;
            let chapters = tx.outgoing(act_id, EdgeType::ContainsChapter.as_ref()).len();
            if chapters > 0 {
                return Err(StoreError::validation(format!(
                    "act {} still has {} chapters",
                    act_id, chapters
                ))
                .into());
            }
            tx.delete_node(act_id);
            Ok(())
        })
        .await
    }

    /// Acts of a root by sequence.
    #[instrument(skip(self))]
    pub async fn list_acts(&self, root_id: &str) -> PalimpsestResult<Vec<Act>> {
        self.read(|graph| {
            require_root(graph, root_id)?;
            let mut acts: Vec<Act> = graph
                .all::<Act>()?
                .into_iter()
                .filter(|act| act.root_id == root_id)
                .collect();
            acts.sort_by_key(|act| act.sequence);
            Ok(acts)
        })
        .await
    }

    /// Create a chapter at `sequence` within an act. Review starts `pending`.
    #[instrument(skip(self, focus))]
    pub async fn create_chapter(
        &self,
        act_id: &str,
        sequence: i64,
        title: &str,
        focus: &str,
        pov_character_id: Option<&str>,
    ) -> PalimpsestResult<Chapter> {
        self.write(|tx| {
            require::<Act>(tx, act_id)?;
            let id = ids::chapter_id(act_id, sequence);
            if tx.contains_node(&id) {
                return Err(duplicate_sequence(&format!("chapters of act {}", act_id), sequence).into());
            }
            let chapter = Chapter {
                id,
                act_id: act_id.to_string(),
                sequence,
                title: title.to_string(),
                focus: focus.to_string(),
                pov_character_id: pov_character_id.map(str::to_string),
                rendered_content: None,
                review_status: "pending".to_string(),
            };
            tx.create(&chapter)?;
            tx.link(EdgeType::ContainsChapter.as_ref(), act_id, &chapter.id)?;
            info!(chapter = %chapter.id, "Created chapter");
            Ok(chapter)
        })
        .await
    }

    /// Load a chapter.
    #[instrument(skip(self))]
    pub async fn get_chapter(&self, chapter_id: &str) -> PalimpsestResult<Chapter> {
        self.read(|graph| require(graph, chapter_id)).await
    }

    /// Replace a chapter's editable fields.
    #[instrument(skip(self, chapter), fields(chapter = %chapter.id))]
    pub async fn update_chapter(&self, chapter: Chapter) -> PalimpsestResult<Chapter> {
        self.write(|tx| {
            let stored: Chapter = require(tx, &chapter.id)?;
            if stored.act_id != chapter.act_id || stored.sequence != chapter.sequence {
                return Err(StoreError::validation(format!(
                    "chapter {} cannot change act or sequence",
                    chapter.id
                ))
                .into());
            }
            tx.put(&chapter)?;
            Ok(chapter)
        })
        .await
    }

    /// Delete a chapter. Its scenes stay, unlinked.
    #[instrument(skip(self))]
    pub async fn delete_chapter(&self, chapter_id: &str) -> PalimpsestResult<()> {
        self.write(|tx| {
            require::<Chapter>(tx, chapter_id)?;
            let scene_ids: Vec<String> = tx
                .outgoing(chapter_id, EdgeType::ContainsScene.as_ref())
                .iter()
                .map(|edge| edge.to_id.clone())
                .collect();
            for id in &scene_ids {
                if let Some(mut scene) = find::<SceneOrigin>(tx, id)? {
                    unlink_scene(tx, &mut scene)?;
                }
            }
            tx.delete_node(chapter_id);
            info!(unlinked = scene_ids.len(), "Deleted chapter");
            Ok(())
        })
        .await
    }

    /// Chapters of an act by sequence.
    #[instrument(skip(self))]
    pub async fn list_chapters(&self, act_id: &str) -> PalimpsestResult<Vec<Chapter>> {
        self.read(|graph| {
            require::<Act>(graph, act_id)?;
            let mut chapters = graph
                .outgoing(act_id, EdgeType::ContainsChapter.as_ref())
                .iter()
                .map(|edge| require::<Chapter>(graph, &edge.to_id))
                .collect::<PalimpsestResult<Vec<_>>>()?;
            chapters.sort_by_key(|chapter| chapter.sequence);
            Ok(chapters)
        })
        .await
    }

    /// Place a scene in a chapter, replacing any previous membership.
    #[instrument(skip(self))]
    pub async fn link_scene_to_chapter(
        &self,
        scene_origin_id: &str,
        chapter_id: &str,
    ) -> PalimpsestResult<SceneOrigin> {
        self.write(|tx| {
            let mut scene: SceneOrigin = require(tx, scene_origin_id)?;
            let chapter: Chapter = require(tx, chapter_id)?;
            let act: Act = require(tx, &chapter.act_id)?;
            if act.root_id != scene.root_id {
                return Err(StoreError::validation(format!(
                    "chapter {} belongs to another root",
                    chapter_id
                ))
                .into());
            }
            unlink_scene(tx, &mut scene)?;
            tx.link(EdgeType::ContainsScene.as_ref(), chapter_id, scene_origin_id)?;
            scene.chapter_id = Some(chapter_id.to_string());
            tx.put(&scene)?;
            Ok(scene)
        })
        .await
    }
}
