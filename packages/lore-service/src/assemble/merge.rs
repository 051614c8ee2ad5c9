use lore_domain::{Scene, SceneMetadata, ScoredScene};

use crate::tokens::TokenCounter;

pub const MERGE_SEPARATOR: &str = "\n\n---\n\n";
pub const MERGED_ROLE: &str = "merged";
pub const MERGED_CHUNK_TYPE: &str = "merged_scene";

/// Largest overlap, in paragraphs, still treated as adjacent.
const MAX_OVERLAP: i32 = 5;
/// Largest skip, in paragraphs, still treated as adjacent.
const MAX_SKIP: i32 = 2;

/// Fuses same-chapter neighbours while the fused text stays within `max_chunk_length` tokens.
///
/// Output is in document order. Sources are never modified; merged candidates are new values.
pub fn merge_adjacent(
	mut candidates: Vec<ScoredScene>,
	max_chunk_length: usize,
	counter: &dyn TokenCounter,
) -> Vec<ScoredScene> {
	candidates.sort_by(|a, b| a.scene.cmp_document_order(&b.scene));

	let mut out = Vec::with_capacity(candidates.len());
	let mut current: Option<ScoredScene> = None;

	for next in candidates {
		let Some(acc) = current.take() else {
			current = Some(next);

			continue;
		};

		if is_adjacent(&acc.scene, &next.scene) {
			let text = format!("{}{MERGE_SEPARATOR}{}", acc.scene.text, next.scene.text);

			if counter.count(&text) <= max_chunk_length {
				current = Some(fuse(acc, next, text));

				continue;
			}
		}

		out.push(acc);

		current = Some(next);
	}

	out.extend(current);

	out
}

pub fn is_adjacent(acc: &Scene, next: &Scene) -> bool {
	if acc.chapter_index != next.chapter_index {
		return false;
	}

	let gap = next.start_paragraph_index - acc.end_paragraph_index;

	(-MAX_OVERLAP..=MAX_SKIP).contains(&gap)
}

fn fuse(acc: ScoredScene, next: ScoredScene, text: String) -> ScoredScene {
	let mut ids = acc.source_ids();

	ids.extend(next.source_ids());

	let mut characters = acc.scene.metadata.characters.clone();

	for name in &next.scene.metadata.characters {
		if !characters.contains(name) {
			characters.push(name.clone());
		}
	}

	let mut metadata = SceneMetadata {
		novel: acc.scene.metadata.novel.clone(),
		version: acc.scene.metadata.version.clone(),
		chapter_title: acc.scene.metadata.chapter_title.clone(),
		chapter_index: acc.scene.metadata.chapter_index,
		start_paragraph: Some(acc.scene.start_paragraph_index),
		end_paragraph: Some(next.scene.end_paragraph_index),
		chunk_type: Some(MERGED_CHUNK_TYPE.to_string()),
		role: Some(MERGED_ROLE.to_string()),
		characters,
		extra: Default::default(),
	};

	metadata.set_merged_scene_ids(ids);

	let scene = Scene {
		id: acc.scene.id,
		chapter_title: acc.scene.chapter_title,
		chapter_index: acc.scene.chapter_index,
		start_paragraph_index: acc.scene.start_paragraph_index,
		end_paragraph_index: next.scene.end_paragraph_index,
		text,
		word_count: acc.scene.word_count.saturating_add(next.scene.word_count),
		prefix_context: acc.scene.prefix_context,
		metadata,
	};

	ScoredScene::new(scene, acc.score.max(next.score))
}
