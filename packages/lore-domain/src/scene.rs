use std::{cmp::Ordering, collections::BTreeMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key under [`SceneMetadata::extra`] listing the ids folded into a merged scene.
pub const MERGED_SCENE_IDS_KEY: &str = "mergedSceneIds";

/// A passage produced by ingestion, as persisted by the scene store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
	#[serde(default)]
	pub id: String,
	#[serde(default)]
	pub chapter_title: Option<String>,
	pub chapter_index: i32,
	pub start_paragraph_index: i32,
	pub end_paragraph_index: i32,
	pub text: String,
	#[serde(default)]
	pub word_count: u32,
	/// Lead-in carried over from the previous scene at ingestion time.
	#[serde(default)]
	pub prefix_context: Option<String>,
	#[serde(default)]
	pub metadata: SceneMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneMetadata {
	pub novel: Option<String>,
	pub version: Option<String>,
	pub chapter_title: Option<String>,
	pub chapter_index: Option<i32>,
	pub start_paragraph: Option<i32>,
	pub end_paragraph: Option<i32>,
	pub chunk_type: Option<String>,
	pub role: Option<String>,
	pub characters: Vec<String>,
	pub extra: BTreeMap<String, Value>,
}

/// A scene paired with its request-scoped relevance score.
///
/// The score lives beside the scene rather than on it, so rescoring and merging never touch the
/// hydrated record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredScene {
	pub scene: Scene,
	pub score: f64,
}

impl Scene {
	/// Identity used for deduplication: the id, or `{chapter}_{start}` when the id is blank.
	pub fn identity_key(&self) -> String {
		if self.id.is_empty() {
			format!("{}_{}", self.chapter_index, self.start_paragraph_index)
		} else {
			self.id.clone()
		}
	}

	pub fn cmp_document_order(&self, other: &Self) -> Ordering {
		self.chapter_index
			.cmp(&other.chapter_index)
			.then_with(|| self.start_paragraph_index.cmp(&other.start_paragraph_index))
	}
}

impl SceneMetadata {
	pub fn merged_scene_ids(&self) -> Option<Vec<String>> {
		let ids = self.extra.get(MERGED_SCENE_IDS_KEY)?.as_array()?;

		Some(ids.iter().filter_map(|id| id.as_str().map(str::to_string)).collect())
	}

	pub fn set_merged_scene_ids(&mut self, ids: Vec<String>) {
		self.extra.insert(
			MERGED_SCENE_IDS_KEY.to_string(),
			Value::Array(ids.into_iter().map(Value::String).collect()),
		);
	}
}

impl ScoredScene {
	pub fn new(scene: Scene, score: f64) -> Self {
		Self { scene, score }
	}

	/// Ids this candidate stands for: its merge provenance, or its own id.
	pub fn source_ids(&self) -> Vec<String> {
		self.scene.metadata.merged_scene_ids().unwrap_or_else(|| vec![self.scene.id.clone()])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn scene(id: &str) -> Scene {
		Scene {
			id: id.to_string(),
			chapter_title: None,
			chapter_index: 3,
			start_paragraph_index: 40,
			end_paragraph_index: 44,
			text: String::new(),
			word_count: 0,
			prefix_context: None,
			metadata: SceneMetadata::default(),
		}
	}

	#[test]
	fn identity_key_falls_back_to_position() {
		assert_eq!(scene("s-1").identity_key(), "s-1");
		assert_eq!(scene("").identity_key(), "3_40");
	}

	#[test]
	fn source_ids_prefer_merge_provenance() {
		let mut merged = scene("a");

		merged.metadata.set_merged_scene_ids(vec!["a".to_string(), "b".to_string()]);

		assert_eq!(ScoredScene::new(scene("a"), 0.1).source_ids(), vec!["a".to_string()]);
		assert_eq!(
			ScoredScene::new(merged, 0.1).source_ids(),
			vec!["a".to_string(), "b".to_string()]
		);
	}

	#[test]
	fn parses_camel_case_scene_records() {
		let raw = serde_json::json!({
			"id": "c1-s2",
			"chapterTitle": "第一章",
			"chapterIndex": 1,
			"startParagraphIndex": 10,
			"endParagraphIndex": 14,
			"text": "萧炎站在广场上。",
			"wordCount": 8,
			"score": 0.42,
			"metadata": { "novel": "斗破苍穹", "version": "v1", "characters": ["萧炎"] }
		});
		let scene: Scene = serde_json::from_value(raw).expect("parse failed");

		assert_eq!(scene.chapter_index, 1);
		assert_eq!(scene.metadata.novel.as_deref(), Some("斗破苍穹"));
		assert_eq!(scene.metadata.characters, vec!["萧炎".to_string()]);
	}
}
