use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Exact-match metadata filter. An empty filter matches every corpus.
pub type MetadataFilter = BTreeMap<String, String>;

pub const FILTER_NOVEL: &str = "novel";
pub const FILTER_VERSION: &str = "version";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalQuery {
	pub question: String,
	pub novel: Option<String>,
	pub version: Option<String>,
	/// Candidate fan-out requested from the index, not the final block count.
	pub top_k: u32,
}

/// One hit returned by the vector index, in index relevance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
	pub id: String,
	pub score: f64,
	pub metadata: BTreeMap<String, String>,
}

impl RetrievalQuery {
	pub fn new(question: impl Into<String>, top_k: u32) -> Self {
		Self { question: question.into(), novel: None, version: None, top_k }
	}

	pub fn with_novel(mut self, novel: Option<String>) -> Self {
		self.novel = novel;

		self
	}

	pub fn with_version(mut self, version: Option<String>) -> Self {
		self.version = version;

		self
	}

	/// Builds the index filter, omitting blank fields.
	pub fn filter(&self) -> MetadataFilter {
		let mut filter = MetadataFilter::new();

		for (key, value) in [(FILTER_NOVEL, &self.novel), (FILTER_VERSION, &self.version)] {
			if let Some(value) = value.as_deref().map(str::trim)
				&& !value.is_empty()
			{
				filter.insert(key.to_string(), value.to_string());
			}
		}

		filter
	}
}

impl VectorMatch {
	/// The `(novel, version)` pair used to route hydration, if both are present and non-blank.
	pub fn corpus(&self) -> Option<(&str, &str)> {
		let novel = self.metadata.get(FILTER_NOVEL).map(String::as_str).filter(|v| !v.is_empty())?;
		let version =
			self.metadata.get(FILTER_VERSION).map(String::as_str).filter(|v| !v.is_empty())?;

		Some((novel, version))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn filter_omits_blank_fields() {
		let query = RetrievalQuery::new("q", 5)
			.with_novel(Some("  ".to_string()))
			.with_version(Some("v2".to_string()));
		let filter = query.filter();

		assert_eq!(filter.len(), 1);
		assert_eq!(filter.get(FILTER_VERSION).map(String::as_str), Some("v2"));
	}

	#[test]
	fn corpus_requires_both_fields() {
		let mut hit = VectorMatch { id: "a".to_string(), score: 0.5, metadata: BTreeMap::new() };

		hit.metadata.insert(FILTER_NOVEL.to_string(), "n".to_string());

		assert_eq!(hit.corpus(), None);

		hit.metadata.insert(FILTER_VERSION.to_string(), "v1".to_string());

		assert_eq!(hit.corpus(), Some(("n", "v1")));
	}
}
