//! Adapters binding the concrete providers and stores to the service traits.

use std::sync::Arc;

use crate::{
	BoxFuture, Collaborators, Embedder, Error, Generator, Result, SceneStore, VectorIndex,
};
use lore_config::{
	Config, EMBEDDING_PROVIDER_LOCAL_HASH, EmbeddingProviderConfig, GeneratorProviderConfig,
};
use lore_domain::{GeneratedAnswer, MetadataFilter, Prompt, Scene, VectorMatch};
use lore_providers::{embedding, generation::ChatGenerator, hashing::HashEmbedder};
use lore_storage::{
	memory::InMemoryVectorIndex,
	qdrant::QdrantIndex,
	scenes::{FsSceneStore, InMemorySceneStore},
};

/// OpenAI-compatible embedding endpoint, one question per call.
pub struct HttpEmbedder {
	cfg: EmbeddingProviderConfig,
}
impl HttpEmbedder {
	pub fn new(cfg: EmbeddingProviderConfig) -> Self {
		Self { cfg }
	}
}

pub struct ChatProvider {
	cfg: GeneratorProviderConfig,
	client: ChatGenerator,
}
impl ChatProvider {
	pub fn new(cfg: GeneratorProviderConfig) -> Result<Self> {
		let client = ChatGenerator::new(&cfg)?;

		Ok(Self { cfg, client })
	}
}

impl Collaborators {
	pub fn from_config(cfg: &Config) -> Result<Self> {
		let embedding = &cfg.providers.embedding;
		let embedder: Arc<dyn Embedder> = match embedding.provider_id.as_str() {
			EMBEDDING_PROVIDER_LOCAL_HASH =>
				Arc::new(HashEmbedder::new(embedding.dimensions as usize)),
			_ => Arc::new(HttpEmbedder::new(embedding.clone())),
		};

		Ok(Self {
			embedder,
			index: Arc::new(QdrantIndex::new(&cfg.storage.qdrant)?),
			store: Arc::new(FsSceneStore::new_from_config(&cfg.storage.scenes)),
			generator: Arc::new(ChatProvider::new(cfg.providers.generator.clone())?),
		})
	}
}

impl Embedder for HttpEmbedder {
	fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move {
			let texts = [text.to_string()];
			let mut vectors = embedding::embed(&self.cfg, &texts).await?;

			vectors.pop().ok_or_else(|| Error::Provider {
				message: "Embedding provider returned no vector.".to_string(),
			})
		})
	}
}

impl Embedder for HashEmbedder {
	fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move { Ok(HashEmbedder::embed(self, text)) })
	}
}

impl VectorIndex for QdrantIndex {
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		top_k: u32,
		filter: &'a MetadataFilter,
	) -> BoxFuture<'a, Result<Vec<VectorMatch>>> {
		Box::pin(async move { Ok(QdrantIndex::search(self, vector, top_k, filter).await?) })
	}
}

impl VectorIndex for InMemoryVectorIndex {
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		top_k: u32,
		filter: &'a MetadataFilter,
	) -> BoxFuture<'a, Result<Vec<VectorMatch>>> {
		Box::pin(async move { Ok(InMemoryVectorIndex::search(self, &vector, top_k, filter)?) })
	}
}

impl SceneStore for FsSceneStore {
	fn load_batch<'a>(
		&'a self,
		novel: &'a str,
		version: &'a str,
	) -> BoxFuture<'a, Result<Vec<Scene>>> {
		Box::pin(async move { Ok(FsSceneStore::load_batch(self, novel, version).await?) })
	}
}

impl SceneStore for InMemorySceneStore {
	fn load_batch<'a>(
		&'a self,
		novel: &'a str,
		version: &'a str,
	) -> BoxFuture<'a, Result<Vec<Scene>>> {
		Box::pin(async move { Ok(InMemorySceneStore::load_batch(self, novel, version)) })
	}
}

impl Generator for ChatProvider {
	fn chat<'a>(&'a self, prompt: &'a Prompt) -> BoxFuture<'a, Result<GeneratedAnswer>> {
		Box::pin(async move {
			self.client
				.chat(&self.cfg, prompt)
				.await
				.map_err(|err| Error::Generation { message: err.to_string() })
		})
	}
}
