use serde::{Deserialize, Serialize};

/// Answer text used when a generation result carries none.
pub const MISSING_ANSWER_TEXT: &str = "（未生成回答）";

/// Answer returned when generation itself fails.
pub const FALLBACK_ANSWER_TEXT: &str = "很抱歉，生成回答时出现系统错误或格式异常。";

/// A generation result as parsed from the model, before shape repair.
///
/// Every field is optional because models routinely omit or rename them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedAnswer {
	#[serde(alias = "text")]
	pub answer: Option<String>,
	pub citations: Option<Vec<GeneratedCitation>>,
	pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedCitation {
	#[serde(alias = "chunk_id", alias = "blockId", alias = "chunkId")]
	pub block_id: Option<String>,
	pub reason: Option<String>,
}

/// The final, repaired answer. Citations and confidence are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
	#[serde(rename = "answer", alias = "text")]
	pub text: String,
	pub citations: Vec<Citation>,
	pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
	pub block_id: String,
	pub reason: String,
}

impl Answer {
	pub fn fallback() -> Self {
		Self { text: FALLBACK_ANSWER_TEXT.to_string(), citations: Vec::new(), confidence: 0.0 }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accepts_legacy_field_names() {
		let raw = serde_json::json!({
			"answer": "萧炎在乌坦城。",
			"citations": [{ "chunk_id": "c1", "reason": "mentions the city" }],
			"confidence": 0.8
		});
		let parsed: GeneratedAnswer = serde_json::from_value(raw).expect("parse failed");
		let citations = parsed.citations.expect("citations missing");

		assert_eq!(citations[0].block_id.as_deref(), Some("c1"));
		assert_eq!(parsed.confidence, Some(0.8));
	}

	#[test]
	fn missing_fields_stay_absent() {
		let parsed: GeneratedAnswer =
			serde_json::from_value(serde_json::json!({})).expect("parse failed");

		assert_eq!(parsed, GeneratedAnswer::default());
	}
}
