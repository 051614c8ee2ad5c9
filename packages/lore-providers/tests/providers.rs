use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};

use lore_config::GeneratorRetry;
use lore_domain::{ContextBlock, Prompt, SceneMetadata};
use lore_providers::{Error, generation, hashing::HashEmbedder};

fn block(id: &str, title: Option<&str>, content: &str) -> ContextBlock {
	ContextBlock {
		id: id.to_string(),
		content: content.to_string(),
		token_count: 0,
		rank: 1,
		score: 0.5,
		chapter_index: 1,
		start_paragraph_index: 0,
		end_paragraph_index: 1,
		metadata: Default::default(),
		source_metadata: SceneMetadata {
			chapter_title: title.map(str::to_string),
			..Default::default()
		},
	}
}

#[test]
fn builds_bearer_auth_header() {
	let headers =
		lore_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut headers = Map::new();

	headers.insert("X-Retries".to_string(), Value::from(3));

	let err = lore_providers::auth_headers("secret", &headers).expect_err("Expected error.");

	assert!(matches!(err, Error::InvalidConfig { .. }));
}

#[test]
fn renders_blocks_into_the_user_message() {
	let prompt = Prompt {
		system_instruction: "Answer from context.".to_string(),
		context_blocks: vec![
			block("c1-s1", Some("第一章"), "萧炎站在广场上。"),
			block("c2-s4", None, "药老醒来。"),
		],
		user_question: "萧炎在哪里？".to_string(),
		output_constraint: "{\"answer\": \"...\"}".to_string(),
	};
	let messages = generation::build_messages(&prompt);
	let system = messages[0]["content"].as_str().expect("Missing system content.");
	let user = messages[1]["content"].as_str().expect("Missing user content.");

	assert_eq!(messages[0]["role"], "system");
	assert!(system.starts_with("Answer from context.\n\nIMPORTANT OUTPUT FORMAT:\n{"));
	assert!(system.ends_with("You MUST respond with valid JSON matching the schema provided."));
	assert!(user.starts_with("Context Information:\n---\nBlock ID: c1-s1\nSource: 第一章\n"));
	assert!(user.contains("Block ID: c2-s4\nContent: 药老醒来。\n---\n"));
	assert!(user.contains("User Question: 萧炎在哪里？"));
}

#[test]
fn omits_context_header_without_blocks() {
	let prompt = Prompt {
		system_instruction: "Answer.".to_string(),
		context_blocks: Vec::new(),
		user_question: "q".to_string(),
		output_constraint: String::new(),
	};
	let messages = generation::build_messages(&prompt);
	let system = messages[0]["content"].as_str().expect("Missing system content.");
	let user = messages[1]["content"].as_str().expect("Missing user content.");

	assert!(!system.contains("IMPORTANT OUTPUT FORMAT"));
	assert!(user.starts_with("User Question: q"));
}

#[test]
fn default_retry_schedule_starts_at_one_second() {
	let retry = GeneratorRetry::default();

	assert_eq!(generation::backoff_delay(&retry, 0).as_millis(), 1_000);
	assert_eq!(generation::backoff_delay(&retry, 1).as_millis(), 2_000);
	assert_eq!(generation::backoff_delay(&retry, 2).as_millis(), 4_000);
}

#[test]
fn hash_embedder_is_deterministic_across_instances() {
	let question = "Where is 萧炎 now?";
	let first = HashEmbedder::new(128).embed(question);
	let second = HashEmbedder::new(128).embed(question);

	assert_eq!(first, second);
	assert_eq!(first.len(), 128);
}
