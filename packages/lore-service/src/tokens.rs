//! Approximate token accounting for budget decisions.

use std::sync::Arc;

use tokenizers::Tokenizer;

use crate::{Error, Result};
use lore_config::AssemblerConfig;

pub trait TokenCounter
where
	Self: Send + Sync,
{
	fn count(&self, text: &str) -> usize;
}

/// Estimates `ceil(chars × 1.5)` tokens, a deliberately pessimistic ratio for CJK-heavy text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharRatioCounter;
impl TokenCounter for CharRatioCounter {
	fn count(&self, text: &str) -> usize {
		char_ratio_estimate(text)
	}
}

pub struct TokenizerCounter {
	tokenizer: Tokenizer,
}
impl TokenizerCounter {
	pub fn new(tokenizer: Tokenizer) -> Self {
		Self { tokenizer }
	}

	pub fn from_pretrained(repo: &str) -> Result<Self> {
		let tokenizer = Tokenizer::from_pretrained(repo, None).map_err(|err| {
			Error::InvalidRequest { message: format!("failed to load tokenizer: {err}") }
		})?;

		Ok(Self::new(tokenizer))
	}
}
impl TokenCounter for TokenizerCounter {
	fn count(&self, text: &str) -> usize {
		match self.tokenizer.encode(text, false) {
			Ok(encoding) => encoding.len(),
			Err(err) => {
				tracing::error!(error = %err, "Tokenizer failed to encode text.");

				char_ratio_estimate(text)
			},
		}
	}
}

/// Picks the tokenizer-backed counter when `tokenizer_repo` is set, the char-ratio one otherwise.
pub fn counter_from_config(cfg: &AssemblerConfig) -> Result<Arc<dyn TokenCounter>> {
	match cfg.tokenizer_repo.as_deref() {
		Some(repo) => Ok(Arc::new(TokenizerCounter::from_pretrained(repo)?)),
		None => Ok(Arc::new(CharRatioCounter)),
	}
}

fn char_ratio_estimate(text: &str) -> usize {
	(text.chars().count() * 3).div_ceil(2)
}
