use lore_domain::ScoredScene;

use super::sort_by_score_desc;
use crate::tokens::TokenCounter;

/// A candidate admitted by the allocator, with the token cost it was charged.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocated {
	pub candidate: ScoredScene,
	pub tokens: usize,
}

/// Greedy selection by descending score under a count cap and a total-token cap.
///
/// Candidates that do not fit are skipped whole and scanning continues, so a later, smaller
/// candidate can still be admitted.
pub fn allocate(
	mut candidates: Vec<ScoredScene>,
	max_scenes: usize,
	max_context_tokens: usize,
	counter: &dyn TokenCounter,
) -> Vec<Allocated> {
	sort_by_score_desc(&mut candidates);

	let mut selected: Vec<Allocated> = Vec::new();
	let mut running = 0_usize;

	for candidate in candidates {
		if selected.len() >= max_scenes {
			break;
		}

		let tokens = counter.count(&candidate.scene.text);

		if running + tokens <= max_context_tokens {
			running += tokens;

			selected.push(Allocated { candidate, tokens });
		} else if selected.is_empty() {
			tracing::warn!(
				scene_id = %candidate.scene.id,
				tokens,
				max_context_tokens,
				"Scene exceeds the context budget and was skipped."
			);
		}
	}

	selected
}
