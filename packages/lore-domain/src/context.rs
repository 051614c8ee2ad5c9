use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scene::SceneMetadata;

/// An immutable, citation-addressable unit of context shown to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBlock {
	/// Source scene id, or the surviving id after a merge.
	pub id: String,
	pub content: String,
	pub token_count: usize,
	/// 1-based position by descending score among the selected blocks.
	pub rank: usize,
	pub score: f64,
	pub chapter_index: i32,
	pub start_paragraph_index: i32,
	pub end_paragraph_index: i32,
	pub metadata: BTreeMap<String, Value>,
	pub source_metadata: SceneMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
	pub system_instruction: String,
	pub context_blocks: Vec<ContextBlock>,
	pub user_question: String,
	pub output_constraint: String,
}

impl Prompt {
	pub fn block_ids(&self) -> impl Iterator<Item = &str> {
		self.context_blocks.iter().map(|block| block.id.as_str())
	}
}
