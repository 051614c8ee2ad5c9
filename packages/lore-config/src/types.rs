use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub assembler: AssemblerConfig,
	pub rag: Rag,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub scenes: SceneStorage,
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneStorage {
	/// Scenes are read from `{root}/scene/{novel}/{version}/scenes.json`.
	pub root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generator: GeneratorProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	/// `openai` for an OpenAI-compatible HTTP endpoint, `local-hash` for the offline embedder.
	pub provider_id: String,
	#[serde(default)]
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	#[serde(default)]
	pub path: String,
	#[serde(default)]
	pub model: String,
	pub dimensions: u32,
	#[serde(default = "default_embedding_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	#[serde(default)]
	pub retry: GeneratorRetry,
	#[serde(default)]
	pub rate_limit: GeneratorRateLimit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorRetry {
	pub max_attempts: u32,
	pub initial_backoff_ms: u64,
	pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorRateLimit {
	pub enabled: bool,
	pub max_requests: u32,
	pub window_secs: u64,
}

/// Knobs of the context assembly pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct AssemblerConfig {
	/// Count cap on final blocks.
	#[serde(alias = "max_chunks", default = "default_max_scenes")]
	pub max_scenes: usize,
	/// Token ceiling for a single, possibly merged, block.
	#[serde(default = "default_max_chunk_length")]
	pub max_chunk_length: usize,
	/// Total token budget across all selected blocks.
	#[serde(default = "default_max_context_tokens")]
	pub max_context_tokens: usize,
	#[serde(default = "default_true")]
	pub enable_merge: bool,
	#[serde(default = "default_true")]
	pub enable_rescore: bool,
	/// Optional HuggingFace tokenizer used instead of the character-ratio estimate.
	#[serde(default)]
	pub tokenizer_repo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rag {
	#[serde(default = "default_top_k")]
	pub default_top_k: u32,
	/// Extensions stripped from corpus ids before filtering, e.g. `.txt`.
	#[serde(default = "default_corpus_extensions")]
	pub corpus_extensions: Vec<String>,
	/// Reject answers that cite unknown blocks instead of filtering the citations out.
	#[serde(default)]
	pub strict_citations: bool,
	pub system_instruction: String,
	#[serde(default)]
	pub output_constraint: String,
}

impl Default for GeneratorRetry {
	fn default() -> Self {
		Self { max_attempts: 3, initial_backoff_ms: 1_000, max_backoff_ms: 10_000 }
	}
}

impl Default for GeneratorRateLimit {
	fn default() -> Self {
		Self { enabled: true, max_requests: 3, window_secs: 60 }
	}
}

impl Default for AssemblerConfig {
	fn default() -> Self {
		Self {
			max_scenes: default_max_scenes(),
			max_chunk_length: default_max_chunk_length(),
			max_context_tokens: default_max_context_tokens(),
			enable_merge: true,
			enable_rescore: true,
			tokenizer_repo: None,
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_embedding_timeout_ms() -> u64 {
	10_000
}

fn default_max_scenes() -> usize {
	5
}

fn default_max_chunk_length() -> usize {
	900
}

fn default_max_context_tokens() -> usize {
	3_000
}

fn default_true() -> bool {
	true
}

fn default_top_k() -> u32 {
	5
}

fn default_corpus_extensions() -> Vec<String> {
	vec![".txt".to_string()]
}
