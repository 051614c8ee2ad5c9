//! Context assembly: rescore, deduplicate, merge neighbours, then allocate the token budget.

pub mod budget;
pub mod dedup;
pub mod merge;
pub mod rescore;

use std::{cmp::Ordering, collections::BTreeMap, sync::Arc};

use serde::Serialize;
use serde_json::Value;

use crate::tokens::TokenCounter;
use budget::Allocated;
use lore_config::AssemblerConfig;
use lore_domain::{ContextBlock, ScoredScene};

/// Stage counts of one assembly run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
	pub retrieved: usize,
	pub deduplicated: usize,
	pub merged: usize,
	pub selected: usize,
	pub total_tokens: usize,
	pub dropped_by_budget: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssembledContext {
	/// Blocks in document order.
	pub blocks: Vec<ContextBlock>,
	pub report: AssemblyReport,
}
impl AssembledContext {
	/// Renders every block as `[{id}] {content}` on its own line.
	pub fn full_text(&self) -> String {
		let mut out = String::new();

		for block in &self.blocks {
			out.push_str(&format!("[{}] {}\n", block.id, block.content));
		}

		out
	}
}

pub struct ContextAssembler {
	cfg: AssemblerConfig,
	counter: Arc<dyn TokenCounter>,
}
impl ContextAssembler {
	pub fn new(cfg: AssemblerConfig, counter: Arc<dyn TokenCounter>) -> Self {
		Self { cfg, counter }
	}

	pub fn assemble(&self, question: &str, candidates: Vec<ScoredScene>) -> Vec<ContextBlock> {
		self.assemble_with_report(question, candidates).blocks
	}

	pub fn assemble_with_report(
		&self,
		question: &str,
		candidates: Vec<ScoredScene>,
	) -> AssembledContext {
		if candidates.is_empty() {
			return AssembledContext::default();
		}

		let counter = self.counter.as_ref();
		let retrieved = candidates.len();
		let candidates =
			if self.cfg.enable_rescore { rescore::rescore(question, candidates) } else { candidates };
		let candidates = dedup::dedup(candidates);
		let deduplicated = candidates.len();
		let candidates = if self.cfg.enable_merge {
			merge::merge_adjacent(candidates, self.cfg.max_chunk_length, counter)
		} else {
			candidates
		};
		let merged = candidates.len();
		let selected =
			budget::allocate(candidates, self.cfg.max_scenes, self.cfg.max_context_tokens, counter);
		let total_tokens = selected.iter().map(|allocated| allocated.tokens).sum();
		let report = AssemblyReport {
			retrieved,
			deduplicated,
			merged,
			selected: selected.len(),
			total_tokens,
			dropped_by_budget: merged - selected.len(),
		};

		tracing::info!(
			retrieved = report.retrieved,
			deduplicated = report.deduplicated,
			merged = report.merged,
			selected = report.selected,
			total_tokens = report.total_tokens,
			dropped_by_budget = report.dropped_by_budget,
			"Assembled context."
		);

		AssembledContext { blocks: build_blocks(selected), report }
	}
}

/// Descending score order with NaN sorted after every number.
pub(crate) fn cmp_score_desc(a: f64, b: f64) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.total_cmp(&a),
	}
}

/// Stable descending sort: equal scores keep their input order.
pub(crate) fn sort_by_score_desc(candidates: &mut [ScoredScene]) {
	candidates.sort_by(|a, b| cmp_score_desc(a.score, b.score));
}

fn build_blocks(selected: Vec<Allocated>) -> Vec<ContextBlock> {
	let mut by_score: Vec<usize> = (0..selected.len()).collect();

	by_score.sort_by(|a, b| {
		cmp_score_desc(selected[*a].candidate.score, selected[*b].candidate.score)
			.then(a.cmp(b))
	});

	let mut ranks = vec![0_usize; selected.len()];

	for (position, idx) in by_score.into_iter().enumerate() {
		ranks[idx] = position + 1;
	}

	let mut ranked: Vec<(usize, Allocated)> = ranks.into_iter().zip(selected).collect();

	ranked.sort_by(|(_, a), (_, b)| a.candidate.scene.cmp_document_order(&b.candidate.scene));

	ranked.into_iter().map(|(rank, allocated)| to_block(rank, allocated)).collect()
}

fn to_block(rank: usize, allocated: Allocated) -> ContextBlock {
	let Allocated { candidate: ScoredScene { scene, score }, tokens } = allocated;
	let meta = &scene.metadata;
	let mut metadata = BTreeMap::new();

	if let Some(novel) = meta.novel.as_ref() {
		metadata.insert("novel".to_string(), Value::from(novel.as_str()));
	}
	if let Some(version) = meta.version.as_ref() {
		metadata.insert("version".to_string(), Value::from(version.as_str()));
	}
	if let Some(title) = meta.chapter_title.as_ref().or(scene.chapter_title.as_ref()) {
		metadata.insert("chapterTitle".to_string(), Value::from(title.as_str()));
	}

	metadata.insert("chapterIndex".to_string(), Value::from(scene.chapter_index));
	metadata.insert("startParagraph".to_string(), Value::from(scene.start_paragraph_index));
	metadata.insert("endParagraph".to_string(), Value::from(scene.end_paragraph_index));

	if let Some(chunk_type) = meta.chunk_type.as_ref() {
		metadata.insert("chunkType".to_string(), Value::from(chunk_type.as_str()));
	}
	if let Some(role) = meta.role.as_ref() {
		metadata.insert("role".to_string(), Value::from(role.as_str()));
	}
	if !meta.characters.is_empty() {
		metadata.insert("characters".to_string(), Value::from(meta.characters.clone()));
	}

	for (key, value) in &meta.extra {
		metadata.insert(key.clone(), value.clone());
	}

	ContextBlock {
		id: scene.id,
		content: scene.text,
		token_count: tokens,
		rank,
		score,
		chapter_index: scene.chapter_index,
		start_paragraph_index: scene.start_paragraph_index,
		end_paragraph_index: scene.end_paragraph_index,
		metadata,
		source_metadata: scene.metadata,
	}
}
