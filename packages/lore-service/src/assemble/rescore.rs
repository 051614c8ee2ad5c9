//! Blends the retrieval similarity with lexical and entity overlap.

use std::sync::LazyLock;

use regex::Regex;

use lore_domain::{ScoredScene, cjk};

const PRIOR_WEIGHT: f64 = 0.6;
const KEYWORD_WEIGHT: f64 = 0.2;
const ENTITY_WEIGHT: f64 = 0.2;
const HIT_WEIGHT: f64 = 0.1;
const PENALTY_FREE_CHARS: usize = 2_000;
const PENALTY_PER_CHAR: f64 = 0.0001;

static WORD_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[a-zA-Z0-9]+").ok());

/// Replaces each candidate's score with the blended score.
pub fn rescore(question: &str, candidates: Vec<ScoredScene>) -> Vec<ScoredScene> {
	let keywords = extract_keywords(question);

	tracing::debug!(keywords = ?keywords, "Extracted rescoring keywords.");

	candidates
		.into_iter()
		.map(|candidate| {
			let score = blended_score(&candidate, &keywords);

			ScoredScene { score, ..candidate }
		})
		.collect()
}

pub fn blended_score(candidate: &ScoredScene, keywords: &[String]) -> f64 {
	let text = &candidate.scene.text;
	let keyword = keyword_score(text, keywords);
	let entity = entity_score(&candidate.scene.metadata.characters, keywords);
	let penalty = length_penalty(text);
	let score = PRIOR_WEIGHT * candidate.score + KEYWORD_WEIGHT * keyword + ENTITY_WEIGHT * entity
		- penalty;

	score.max(0.0)
}

/// Lower-cased alphanumeric runs, then overlapping bigrams of every ideograph run.
///
/// A lone ideograph is kept only when the whole question is at most two characters long.
pub fn extract_keywords(question: &str) -> Vec<String> {
	let mut keywords = Vec::new();

	if let Some(re) = WORD_RE.as_ref() {
		keywords.extend(re.find_iter(question).map(|m| m.as_str().to_lowercase()));
	}

	let short_question = question.chars().count() <= 2;

	for run in han_runs(question) {
		if run.len() < 2 {
			if short_question {
				keywords.extend(run.iter().map(char::to_string));
			}

			continue;
		}

		keywords.extend(run.windows(2).map(|pair| pair.iter().collect::<String>()));
	}

	keywords
}

fn han_runs(text: &str) -> Vec<Vec<char>> {
	let mut runs = Vec::new();
	let mut run = Vec::new();

	for ch in text.chars() {
		if cjk::is_han(ch) {
			run.push(ch);
		} else if !run.is_empty() {
			runs.push(std::mem::take(&mut run));
		}
	}

	if !run.is_empty() {
		runs.push(run);
	}

	runs
}

fn keyword_score(text: &str, keywords: &[String]) -> f64 {
	if keywords.is_empty() {
		return 0.0;
	}

	let lowered = text.to_lowercase();
	let hits = keywords.iter().filter(|keyword| lowered.contains(keyword.as_str())).count();

	(hits as f64 * HIT_WEIGHT).min(1.0)
}

fn entity_score(characters: &[String], keywords: &[String]) -> f64 {
	let mut hits = 0_usize;

	for name in characters {
		let name = name.to_lowercase();

		for keyword in keywords {
			if name.contains(keyword.as_str()) || keyword.contains(name.as_str()) {
				hits += 1;
			}
		}
	}

	(hits as f64 * HIT_WEIGHT).min(1.0)
}

fn length_penalty(text: &str) -> f64 {
	let len = text.chars().count();

	len.saturating_sub(PENALTY_FREE_CHARS) as f64 * PENALTY_PER_CHAR
}

#[cfg(test)]
mod tests {
	use lore_domain::{Scene, SceneMetadata};

	use super::*;

	fn candidate(text: &str, characters: &[&str], score: f64) -> ScoredScene {
		ScoredScene::new(
			Scene {
				id: "s".to_string(),
				chapter_title: None,
				chapter_index: 1,
				start_paragraph_index: 0,
				end_paragraph_index: 1,
				text: text.to_string(),
				word_count: 0,
				prefix_context: None,
				metadata: SceneMetadata {
					characters: characters.iter().map(|c| c.to_string()).collect(),
					..Default::default()
				},
			},
			score,
		)
	}

	#[test]
	fn extracts_words_and_bigrams() {
		assert_eq!(extract_keywords("萧炎在哪里？"), vec!["萧炎", "炎在", "在哪", "哪里"]);
		assert_eq!(
			extract_keywords("Where is Xiao Yan 2?"),
			vec!["where", "is", "xiao", "yan", "2"]
		);
	}

	#[test]
	fn han_runs_split_on_punctuation_and_latin() {
		assert_eq!(
			han_runs("萧炎，在A哪里"),
			vec![vec!['萧', '炎'], vec!['在'], vec!['哪', '里']]
		);
	}

	#[test]
	fn lone_ideographs_only_survive_in_short_questions() {
		assert_eq!(extract_keywords("炎?"), vec!["炎"]);
		assert!(extract_keywords("炎 is here").iter().all(|k| k != "炎"));
	}

	#[test]
	fn keyword_hits_raise_the_score() {
		let keywords = extract_keywords("萧炎在哪里？");
		let with = blended_score(&candidate("萧炎站在广场上。", &[], 0.5), &keywords);
		let without = blended_score(&candidate("药老沉睡于戒指中。", &[], 0.5), &keywords);

		assert!(with > without);
		assert!((without - 0.3).abs() < 1e-9);
	}

	#[test]
	fn entity_overlap_is_counted_both_ways() {
		let keywords = vec!["萧炎".to_string(), "炎在".to_string()];

		assert!((entity_score(&["萧炎".to_string()], &keywords) - 0.1).abs() < 1e-9);
		assert!((entity_score(&["炎".to_string()], &keywords) - 0.2).abs() < 1e-9);
	}

	#[test]
	fn long_text_is_penalised_but_never_negative() {
		let long = "字".repeat(2_100);

		assert!((length_penalty(&long) - 0.01).abs() < 1e-9);
		assert_eq!(blended_score(&candidate(&"字".repeat(20_000), &[], 0.1), &[]), 0.0);
	}

	#[test]
	fn keyword_score_caps_at_one() {
		let keywords: Vec<String> = (0..15).map(|i| format!("k{i}")).collect();
		let text = keywords.join(" ");

		assert_eq!(keyword_score(&text, &keywords), 1.0);
	}
}
