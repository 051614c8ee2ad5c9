//! Repairs generated answers and enforces that citations point at shown blocks.

use std::collections::HashSet;

use crate::{Error, Result};
use lore_domain::{Answer, Citation, GeneratedAnswer, MISSING_ANSWER_TEXT};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CitationPolicy {
	/// Drop citations to unknown blocks and log them.
	#[default]
	Filter,
	/// Reject the answer on the first citation to an unknown block.
	Strict,
}
impl CitationPolicy {
	pub fn from_strict(strict: bool) -> Self {
		if strict { Self::Strict } else { Self::Filter }
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerGuard {
	policy: CitationPolicy,
}
impl AnswerGuard {
	pub fn new(policy: CitationPolicy) -> Self {
		Self { policy }
	}

	/// Repairs the answer shape, then checks every citation against `block_ids`.
	pub fn apply(&self, generated: GeneratedAnswer, block_ids: &HashSet<&str>) -> Result<Answer> {
		let answer = repair(generated);

		self.check_citations(answer, block_ids)
	}

	pub fn check_citations(&self, mut answer: Answer, block_ids: &HashSet<&str>) -> Result<Answer> {
		let mut kept = Vec::with_capacity(answer.citations.len());

		for citation in answer.citations {
			if block_ids.contains(citation.block_id.as_str()) {
				kept.push(citation);

				continue;
			}

			match self.policy {
				CitationPolicy::Filter => {
					tracing::warn!(
						block_id = %citation.block_id,
						"Dropped citation to a block that was not in the context."
					);
				},
				CitationPolicy::Strict =>
					return Err(Error::CitationIntegrity { block_id: citation.block_id }),
			}
		}

		answer.citations = kept;

		Ok(answer)
	}
}

/// Fills absent fields with safe defaults and drops citations that carry no block id.
pub fn repair(generated: GeneratedAnswer) -> Answer {
	let GeneratedAnswer { answer, citations, confidence } = generated;

	if answer.is_none() || citations.is_none() || confidence.is_none() {
		tracing::debug!(
			missing_answer = answer.is_none(),
			missing_citations = citations.is_none(),
			missing_confidence = confidence.is_none(),
			"Repaired generated answer shape."
		);
	}

	let citations = citations
		.unwrap_or_default()
		.into_iter()
		.filter_map(|citation| {
			let block_id = citation.block_id.map(|id| id.trim().to_string());
			let Some(block_id) = block_id.filter(|id| !id.is_empty()) else {
				tracing::warn!("Dropped citation without a block id.");

				return None;
			};

			Some(Citation { block_id, reason: citation.reason.unwrap_or_default() })
		})
		.collect();

	Answer {
		text: answer.unwrap_or_else(|| MISSING_ANSWER_TEXT.to_string()),
		citations,
		confidence: confidence.filter(|c| c.is_finite()).unwrap_or(0.0).clamp(0.0, 1.0),
	}
}
