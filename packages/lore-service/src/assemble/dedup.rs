use std::collections::HashSet;

use lore_domain::ScoredScene;

use super::sort_by_score_desc;

/// Keeps the highest-scored candidate per identity key. Output is in descending score order.
pub fn dedup(mut candidates: Vec<ScoredScene>) -> Vec<ScoredScene> {
	sort_by_score_desc(&mut candidates);

	let mut seen = HashSet::new();

	candidates.retain(|candidate| seen.insert(candidate.scene.identity_key()));

	candidates
}

#[cfg(test)]
mod tests {
	use lore_domain::{Scene, SceneMetadata};

	use super::*;

	fn candidate(id: &str, chapter: i32, start: i32, score: f64) -> ScoredScene {
		ScoredScene::new(
			Scene {
				id: id.to_string(),
				chapter_title: None,
				chapter_index: chapter,
				start_paragraph_index: start,
				end_paragraph_index: start + 2,
				text: format!("text of {id}"),
				word_count: 0,
				prefix_context: None,
				metadata: SceneMetadata::default(),
			},
			score,
		)
	}

	#[test]
	fn keeps_the_highest_scored_duplicate() {
		let out = dedup(vec![
			candidate("a", 1, 0, 0.2),
			candidate("b", 1, 5, 0.5),
			candidate("a", 1, 0, 0.9),
		]);

		assert_eq!(out.len(), 2);
		assert_eq!(out[0].scene.id, "a");
		assert_eq!(out[0].score, 0.9);
		assert_eq!(out[1].scene.id, "b");
	}

	#[test]
	fn nan_scores_do_not_hide_a_better_duplicate() {
		let out = dedup(vec![
			candidate("a", 1, 0, 0.2),
			candidate("n", 2, 0, f64::NAN),
			candidate("a", 1, 0, 0.9),
		]);

		assert_eq!(out.len(), 2);
		assert_eq!(out[0].scene.id, "a");
		assert_eq!(out[0].score, 0.9);
		assert_eq!(out[1].scene.id, "n");
	}

	#[test]
	fn blank_ids_fall_back_to_position() {
		let out = dedup(vec![
			candidate("", 2, 7, 0.4),
			candidate("", 2, 7, 0.4),
			candidate("", 2, 8, 0.1),
		]);

		assert_eq!(out.len(), 2);
	}

	#[test]
	fn ties_keep_input_order() {
		let mut first = candidate("x", 1, 0, 0.5);
		let second = candidate("x", 1, 0, 0.5);

		first.scene.text = "first".to_string();

		let out = dedup(vec![first, second]);

		assert_eq!(out[0].scene.text, "first");
	}

	#[test]
	fn is_idempotent() {
		let once = dedup(vec![
			candidate("a", 1, 0, 0.3),
			candidate("b", 1, 4, 0.7),
			candidate("a", 1, 0, 0.6),
			candidate("", 3, 1, 0.6),
		]);
		let twice = dedup(once.clone());

		assert_eq!(once, twice);
	}
}
