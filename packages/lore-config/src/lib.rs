mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	AssemblerConfig, Config, EmbeddingProviderConfig, GeneratorProviderConfig,
	GeneratorRateLimit, GeneratorRetry, Providers, Qdrant, Rag, SceneStorage, Service, Storage,
};

use std::{fs, path::Path};

pub const EMBEDDING_PROVIDER_HTTP: &str = "openai";
pub const EMBEDDING_PROVIDER_LOCAL_HASH: &str = "local-hash";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } => Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.scenes.root.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.scenes.root must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	let embedding_provider = cfg.providers.embedding.provider_id.as_str();

	if !matches!(embedding_provider, EMBEDDING_PROVIDER_HTTP | EMBEDDING_PROVIDER_LOCAL_HASH) {
		return Err(Error::Validation {
			message: "providers.embedding.provider_id must be one of openai or local-hash."
				.to_string(),
		});
	}
	if embedding_provider == EMBEDDING_PROVIDER_HTTP {
		for (label, value) in [
			("providers.embedding.api_base", &cfg.providers.embedding.api_base),
			("providers.embedding.api_key", &cfg.providers.embedding.api_key),
			("providers.embedding.model", &cfg.providers.embedding.model),
		] {
			if value.trim().is_empty() {
				return Err(Error::Validation { message: format!("{label} must be non-empty.") });
			}
		}
	}

	let generator = &cfg.providers.generator;

	for (label, value) in [
		("providers.generator.api_base", &generator.api_base),
		("providers.generator.api_key", &generator.api_key),
		("providers.generator.model", &generator.model),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if !generator.temperature.is_finite() || !(0.0..=2.0).contains(&generator.temperature) {
		return Err(Error::Validation {
			message: "providers.generator.temperature must be a finite number in the range 0.0-2.0."
				.to_string(),
		});
	}
	if generator.retry.max_attempts == 0 {
		return Err(Error::Validation {
			message: "providers.generator.retry.max_attempts must be greater than zero."
				.to_string(),
		});
	}
	if generator.retry.initial_backoff_ms > generator.retry.max_backoff_ms {
		return Err(Error::Validation {
			message: "providers.generator.retry.initial_backoff_ms must not exceed max_backoff_ms."
				.to_string(),
		});
	}
	if generator.rate_limit.enabled {
		if generator.rate_limit.max_requests == 0 {
			return Err(Error::Validation {
				message:
					"providers.generator.rate_limit.max_requests must be greater than zero when enabled."
						.to_string(),
			});
		}
		if generator.rate_limit.window_secs == 0 {
			return Err(Error::Validation {
				message:
					"providers.generator.rate_limit.window_secs must be greater than zero when enabled."
						.to_string(),
			});
		}
	}

	validate_assembler(&cfg.assembler)?;

	if cfg.rag.default_top_k == 0 {
		return Err(Error::Validation {
			message: "rag.default_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.rag.system_instruction.trim().is_empty() {
		return Err(Error::Validation {
			message: "rag.system_instruction must be non-empty.".to_string(),
		});
	}

	Ok(())
}

pub fn validate_assembler(cfg: &AssemblerConfig) -> Result<()> {
	for (label, value) in [
		("assembler.max_scenes", cfg.max_scenes),
		("assembler.max_chunk_length", cfg.max_chunk_length),
		("assembler.max_context_tokens", cfg.max_context_tokens),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.assembler.tokenizer_repo.as_deref().map(|repo| repo.trim().is_empty()).unwrap_or(false)
	{
		cfg.assembler.tokenizer_repo = None;
	}

	cfg.rag.corpus_extensions.retain(|ext| !ext.trim().is_empty());
}
