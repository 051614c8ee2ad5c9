//! Exact cosine-similarity index held in memory.

use std::{cmp::Ordering, collections::BTreeMap};

use crate::{Error, Result};
use lore_domain::{MetadataFilter, VectorMatch};

#[derive(Debug, Clone)]
struct IndexRecord {
	id: String,
	vector: Vec<f32>,
	metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct InMemoryVectorIndex {
	dim: usize,
	records: Vec<IndexRecord>,
}
impl InMemoryVectorIndex {
	pub fn new(dim: usize) -> Self {
		Self { dim, records: Vec::new() }
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Adds a record. Re-inserting an id replaces the previous vector and metadata.
	pub fn insert(
		&mut self,
		id: impl Into<String>,
		vector: Vec<f32>,
		metadata: BTreeMap<String, String>,
	) -> Result<()> {
		self.check_dim(&vector)?;

		let id = id.into();

		self.records.retain(|record| record.id != id);
		self.records.push(IndexRecord { id, vector, metadata });

		Ok(())
	}

	pub fn search(
		&self,
		vector: &[f32],
		top_k: u32,
		filter: &MetadataFilter,
	) -> Result<Vec<VectorMatch>> {
		self.check_dim(vector)?;

		let mut scored: Vec<(usize, f64)> = self
			.records
			.iter()
			.enumerate()
			.filter(|(_, record)| matches_filter(&record.metadata, filter))
			.map(|(idx, record)| (idx, cosine(vector, &record.vector)))
			.collect();

		scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
		scored.truncate(top_k as usize);

		Ok(scored
			.into_iter()
			.map(|(idx, score)| {
				let record = &self.records[idx];

				VectorMatch { id: record.id.clone(), score, metadata: record.metadata.clone() }
			})
			.collect())
	}

	fn check_dim(&self, vector: &[f32]) -> Result<()> {
		if vector.len() != self.dim {
			return Err(Error::InvalidArgument(format!(
				"Vector has {} dimensions, index expects {}.",
				vector.len(),
				self.dim
			)));
		}

		Ok(())
	}
}

fn matches_filter(metadata: &BTreeMap<String, String>, filter: &MetadataFilter) -> bool {
	filter.iter().all(|(key, expected)| metadata.get(key) == Some(expected))
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
	let mut dot = 0.0_f64;
	let mut norm_a = 0.0_f64;
	let mut norm_b = 0.0_f64;

	for (x, y) in a.iter().zip(b) {
		let (x, y) = (*x as f64, *y as f64);

		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a.sqrt() * norm_b.sqrt())
}
