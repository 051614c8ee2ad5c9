use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result, rate_limit::RateLimiter};
use lore_config::{GeneratorProviderConfig, GeneratorRetry};
use lore_domain::{GeneratedAnswer, Prompt};

/// OpenAI-compatible chat client with bounded retry and an optional sliding-window limiter.
pub struct ChatGenerator {
	client: Client,
	limiter: Option<RateLimiter>,
}

impl ChatGenerator {
	pub fn new(cfg: &GeneratorProviderConfig) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { client, limiter: RateLimiter::from_config(&cfg.rate_limit) })
	}

	pub async fn chat(
		&self,
		cfg: &GeneratorProviderConfig,
		prompt: &Prompt,
	) -> Result<GeneratedAnswer> {
		let url = format!("{}{}", cfg.api_base, cfg.path);
		let body = serde_json::json!({
			"model": cfg.model,
			"temperature": cfg.temperature,
			"stream": false,
			"response_format": { "type": "json_object" },
			"messages": build_messages(prompt),
		});
		let attempts = cfg.retry.max_attempts.max(1);
		let mut last_err = None;

		for attempt in 0..attempts {
			if attempt > 0 {
				let delay = backoff_delay(&cfg.retry, attempt - 1);

				tracing::warn!(
					attempt = attempt + 1,
					delay_ms = delay.as_millis() as u64,
					"Retrying generation request."
				);
				tokio::time::sleep(delay).await;
			}
			if let Some(limiter) = self.limiter.as_ref() {
				limiter.acquire().await;
			}

			tracing::info!(model = %cfg.model, attempt = attempt + 1, "Sending generation request.");

			match self.send(cfg, &url, &body).await {
				Ok(answer) => return Ok(answer),
				Err(err) => {
					tracing::warn!(error = %err, attempt = attempt + 1, "Generation attempt failed.");

					last_err = Some(err);
				},
			}
		}

		Err(last_err.unwrap_or_else(|| Error::InvalidResponse {
			message: "Generation produced no attempts.".to_string(),
		}))
	}

	async fn send(
		&self,
		cfg: &GeneratorProviderConfig,
		url: &str,
		body: &Value,
	) -> Result<GeneratedAnswer> {
		let res = self
			.client
			.post(url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_chat_response(json)
	}
}

/// Delay before retry number `retry` (0-based): the initial backoff doubled per retry, capped.
pub fn backoff_delay(cfg: &GeneratorRetry, retry: u32) -> Duration {
	let factor = 1_u64.checked_shl(retry).unwrap_or(u64::MAX);
	let millis = cfg.initial_backoff_ms.saturating_mul(factor).min(cfg.max_backoff_ms);

	Duration::from_millis(millis)
}

pub fn build_messages(prompt: &Prompt) -> Vec<Value> {
	let mut system = prompt.system_instruction.clone();

	if !prompt.output_constraint.trim().is_empty() {
		system.push_str("\n\nIMPORTANT OUTPUT FORMAT:\n");
		system.push_str(&prompt.output_constraint);
	}

	system.push_str("\n\nYou MUST respond with valid JSON matching the schema provided.");

	let mut user = String::new();

	if !prompt.context_blocks.is_empty() {
		user.push_str("Context Information:\n");

		for block in &prompt.context_blocks {
			user.push_str("---\n");
			user.push_str(&format!("Block ID: {}\n", block.id));

			if let Some(title) = block.source_metadata.chapter_title.as_deref() {
				user.push_str(&format!("Source: {title}\n"));
			}

			user.push_str(&format!("Content: {}\n", block.content));
			user.push_str("---\n");
		}

		user.push('\n');
	}

	user.push_str(&format!("User Question: {}", prompt.user_question));
	user.push_str("\n\nPlease answer the question in the specified JSON format.");

	vec![
		serde_json::json!({ "role": "system", "content": system }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

fn parse_chat_response(json: Value) -> Result<GeneratedAnswer> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Generation response is missing message content.".to_string(),
		})?;

	tracing::debug!(content, "Raw generation content.");

	parse_answer_content(content)
}

/// Parses model output into an answer, tolerating Markdown fences and leading prose.
pub fn parse_answer_content(content: &str) -> Result<GeneratedAnswer> {
	let cleaned = content.replace("```json", "").replace("```", "");
	let trimmed = cleaned.trim();
	let start = trimmed.find('{').ok_or_else(|| Error::InvalidResponse {
		message: "Generation content contains no JSON object.".to_string(),
	})?;
	let mut stream =
		serde_json::Deserializer::from_str(&trimmed[start..]).into_iter::<GeneratedAnswer>();

	match stream.next() {
		Some(parsed) => Ok(parsed?),
		None => Err(Error::InvalidResponse {
			message: "Generation content contains no JSON object.".to_string(),
		}),
	}
}
