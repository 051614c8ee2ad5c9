use std::{collections::HashSet, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::{Error, LoreService, Result, assemble::AssemblyReport, prompt};
use lore_domain::{Answer, ContextBlock, Prompt, RetrievalQuery, ScoredScene, corpus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
	pub question: String,
	/// Index fan-out. Absent or zero uses `rag.default_top_k`.
	#[serde(default)]
	pub top_k: Option<u32>,
	/// Corpus id; a configured file extension such as `.txt` is stripped.
	#[serde(default)]
	pub novel: Option<String>,
	#[serde(default)]
	pub version: Option<String>,
}
impl AskRequest {
	pub fn new(question: impl Into<String>) -> Self {
		Self { question: question.into(), top_k: None, novel: None, version: None }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreviewStats {
	pub retrieval_ms: u64,
	pub assembly_ms: u64,
	pub total_ms: u64,
	pub retrieved: usize,
	pub blocks: usize,
	pub total_tokens: usize,
	pub assembly: AssemblyReport,
}

/// Everything `ask` would send to the generator, without calling it.
#[derive(Debug, Clone, Serialize)]
pub struct RagPreview {
	pub trace_id: Uuid,
	pub retrieved: Vec<ScoredScene>,
	pub blocks: Vec<ContextBlock>,
	pub prompt: Prompt,
	pub stats: PreviewStats,
}

impl LoreService {
	pub async fn ask(&self, req: AskRequest) -> Result<Answer> {
		let trace_id = Uuid::new_v4();
		let span = tracing::info_span!("ask", %trace_id);

		self.ask_inner(req).instrument(span).await
	}

	pub async fn preview(&self, req: AskRequest) -> Result<RagPreview> {
		let trace_id = Uuid::new_v4();
		let span = tracing::info_span!("preview", %trace_id);

		async move {
			let started = Instant::now();
			let query = self.build_query(&req)?;
			let retrieved = self.retrieval.retrieve(&query).await?;
			let retrieval_ms = elapsed_ms(started);
			let assembly_started = Instant::now();
			let context = self.assembler.assemble_with_report(&query.question, retrieved.clone());
			let assembly_ms = elapsed_ms(assembly_started);
			let total_tokens = context.blocks.iter().map(|block| block.token_count).sum();
			let stats = PreviewStats {
				retrieval_ms,
				assembly_ms,
				total_ms: elapsed_ms(started),
				retrieved: retrieved.len(),
				blocks: context.blocks.len(),
				total_tokens,
				assembly: context.report,
			};
			let prompt =
				prompt::build_prompt(&self.cfg.rag, &query.question, context.blocks.clone());

			Ok(RagPreview { trace_id, retrieved, blocks: context.blocks, prompt, stats })
		}
		.instrument(span)
		.await
	}

	async fn ask_inner(&self, req: AskRequest) -> Result<Answer> {
		let started = Instant::now();
		let query = self.build_query(&req)?;
		let candidates = self.retrieval.retrieve(&query).await?;

		tracing::info!(count = candidates.len(), "Retrieved scenes.");

		let context = self.assembler.assemble_with_report(&query.question, candidates);
		let prompt = prompt::build_prompt(&self.cfg.rag, &query.question, context.blocks);
		let generated = match self.collaborators.generator.chat(&prompt).await {
			Ok(generated) => generated,
			Err(err) => {
				tracing::error!(error = %err, "Generation failed, returning the fallback answer.");

				return Ok(Answer::fallback());
			},
		};
		let block_ids: HashSet<&str> = prompt.block_ids().collect();
		let answer = self.guard.apply(generated, &block_ids)?;

		tracing::info!(
			confidence = answer.confidence,
			citations = answer.citations.len(),
			elapsed_ms = elapsed_ms(started),
			"Answered question."
		);

		Ok(answer)
	}

	/// Validates the request and applies corpus normalization and the default fan-out.
	pub fn build_query(&self, req: &AskRequest) -> Result<RetrievalQuery> {
		let question = req.question.trim();

		if question.is_empty() {
			return Err(Error::InvalidRequest {
				message: "question must not be empty.".to_string(),
			});
		}

		let rag = &self.cfg.rag;
		let top_k = req.top_k.filter(|k| *k > 0).unwrap_or(rag.default_top_k);
		let novel = req
			.novel
			.as_deref()
			.and_then(|raw| corpus::normalize_corpus_id(raw, &rag.corpus_extensions));
		let version = req.version.as_deref().map(str::trim).filter(|v| !v.is_empty());

		Ok(RetrievalQuery::new(question, top_k)
			.with_novel(novel)
			.with_version(version.map(str::to_string)))
	}
}

fn elapsed_ms(started: Instant) -> u64 {
	started.elapsed().as_millis() as u64
}
