pub mod ask;
pub mod assemble;
pub mod collaborators;
pub mod guard;
pub mod prompt;
pub mod retrieval;
pub mod tokens;

mod error;

pub use ask::{AskRequest, PreviewStats, RagPreview};
pub use assemble::{AssembledContext, AssemblyReport, ContextAssembler};
pub use collaborators::{ChatProvider, HttpEmbedder};
pub use error::{Error, Result};
pub use guard::{AnswerGuard, CitationPolicy};
pub use retrieval::RetrievalOrchestrator;
pub use tokens::{CharRatioCounter, TokenCounter, TokenizerCounter};

use std::{future::Future, pin::Pin, sync::Arc};

use lore_config::Config;
use lore_domain::{GeneratedAnswer, MetadataFilter, Prompt, Scene, VectorMatch};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Maps text to a fixed-length vector. Identical input must yield an identical vector.
pub trait Embedder
where
	Self: Send + Sync,
{
	fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>>;
}

pub trait VectorIndex
where
	Self: Send + Sync,
{
	/// Returns up to `top_k` matches in relevance order. An empty filter matches every corpus.
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		top_k: u32,
		filter: &'a MetadataFilter,
	) -> BoxFuture<'a, Result<Vec<VectorMatch>>>;
}

pub trait SceneStore
where
	Self: Send + Sync,
{
	fn load_batch<'a>(
		&'a self,
		novel: &'a str,
		version: &'a str,
	) -> BoxFuture<'a, Result<Vec<Scene>>>;
}

pub trait Generator
where
	Self: Send + Sync,
{
	fn chat<'a>(&'a self, prompt: &'a Prompt) -> BoxFuture<'a, Result<GeneratedAnswer>>;
}

#[derive(Clone)]
pub struct Collaborators {
	pub embedder: Arc<dyn Embedder>,
	pub index: Arc<dyn VectorIndex>,
	pub store: Arc<dyn SceneStore>,
	pub generator: Arc<dyn Generator>,
}

pub struct LoreService {
	pub cfg: Config,
	pub collaborators: Collaborators,
	pub retrieval: RetrievalOrchestrator,
	pub assembler: ContextAssembler,
	pub guard: AnswerGuard,
}
impl LoreService {
	/// Builds the service with networked collaborators and the configured token counter.
	pub fn from_config(cfg: Config) -> Result<Self> {
		let collaborators = Collaborators::from_config(&cfg)?;

		Self::new(cfg, collaborators)
	}

	pub fn new(cfg: Config, collaborators: Collaborators) -> Result<Self> {
		let counter = tokens::counter_from_config(&cfg.assembler)?;

		Ok(Self::with_token_counter(cfg, collaborators, counter))
	}

	pub fn with_token_counter(
		cfg: Config,
		collaborators: Collaborators,
		counter: Arc<dyn TokenCounter>,
	) -> Self {
		let retrieval = RetrievalOrchestrator::new(
			collaborators.embedder.clone(),
			collaborators.index.clone(),
			collaborators.store.clone(),
		);
		let assembler = ContextAssembler::new(cfg.assembler.clone(), counter);
		let guard = AnswerGuard::new(CitationPolicy::from_strict(cfg.rag.strict_citations));

		Self { cfg, collaborators, retrieval, assembler, guard }
	}
}
