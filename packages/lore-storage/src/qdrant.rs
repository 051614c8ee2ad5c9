use std::collections::{BTreeMap, HashMap};

use qdrant_client::qdrant::{
	Condition, Filter, PointId, Query, QueryPointsBuilder, ScoredPoint, Value,
	point_id::PointIdOptions, value::Kind,
};

use crate::{Error, Result};
use lore_domain::{MetadataFilter, VectorMatch};

/// Payload key holding the scene id; the point id is used when it is absent.
pub const SCENE_ID_KEY: &str = "scene_id";

pub struct QdrantIndex {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantIndex {
	pub fn new(cfg: &lore_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn search(
		&self,
		vector: Vec<f32>,
		top_k: u32,
		filter: &MetadataFilter,
	) -> Result<Vec<VectorMatch>> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Query vector has {} dimensions, collection expects {}.",
				vector.len(),
				self.vector_dim
			)));
		}

		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.limit(top_k as u64)
			.with_payload(true);

		if let Some(filter) = build_filter(filter) {
			search = search.filter(filter);
		}

		let response = self.client.query(search).await?;

		Ok(matches_from_points(&response.result))
	}
}

pub fn build_filter(filter: &MetadataFilter) -> Option<Filter> {
	if filter.is_empty() {
		return None;
	}

	Some(Filter::must(
		filter.iter().map(|(key, value)| Condition::matches(key.as_str(), value.clone())),
	))
}

pub fn matches_from_points(points: &[ScoredPoint]) -> Vec<VectorMatch> {
	let mut out = Vec::with_capacity(points.len());

	for point in points {
		let id = payload_string(&point.payload, SCENE_ID_KEY)
			.or_else(|| point.id.as_ref().and_then(point_id_to_string));
		let Some(id) = id else {
			tracing::warn!("Vector match missing scene id.");

			continue;
		};

		out.push(VectorMatch {
			id,
			score: point.score as f64,
			metadata: payload_metadata(&point.payload),
		});
	}

	out
}

fn point_id_to_string(point_id: &PointId) -> Option<String> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Some(id.clone()),
		Some(PointIdOptions::Num(id)) => Some(id.to_string()),
		None => None,
	}
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) if !text.is_empty() => Some(text.clone()),
		_ => None,
	}
}

fn payload_metadata(payload: &HashMap<String, Value>) -> BTreeMap<String, String> {
	payload
		.iter()
		.filter_map(|(key, value)| {
			let rendered = match &value.kind {
				Some(Kind::StringValue(text)) => text.clone(),
				Some(Kind::IntegerValue(number)) => number.to_string(),
				Some(Kind::DoubleValue(number)) => number.to_string(),
				Some(Kind::BoolValue(flag)) => flag.to_string(),
				_ => return None,
			};

			Some((key.clone(), rendered))
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn string_value(text: &str) -> Value {
		Value { kind: Some(Kind::StringValue(text.to_string())) }
	}

	fn point(id: PointIdOptions, payload: HashMap<String, Value>, score: f32) -> ScoredPoint {
		ScoredPoint {
			id: Some(PointId { point_id_options: Some(id) }),
			payload,
			score,
			..Default::default()
		}
	}

	#[test]
	fn prefers_payload_scene_id() {
		let mut payload = HashMap::new();

		payload.insert(SCENE_ID_KEY.to_string(), string_value("c1-s3"));
		payload.insert("novel".to_string(), string_value("斗破苍穹"));
		payload.insert("chapter_index".to_string(), Value { kind: Some(Kind::IntegerValue(7)) });

		let matches = matches_from_points(&[point(
			PointIdOptions::Uuid("5f0c8c7e-0000-4000-8000-000000000001".to_string()),
			payload,
			0.75,
		)]);

		assert_eq!(matches.len(), 1);
		assert_eq!(matches[0].id, "c1-s3");
		assert_eq!(matches[0].metadata.get("novel").map(String::as_str), Some("斗破苍穹"));
		assert_eq!(matches[0].metadata.get("chapter_index").map(String::as_str), Some("7"));
		assert!((matches[0].score - 0.75).abs() < 1e-6);
	}

	#[test]
	fn falls_back_to_point_id() {
		let matches = matches_from_points(&[point(PointIdOptions::Num(42), HashMap::new(), 0.1)]);

		assert_eq!(matches[0].id, "42");
	}

	#[test]
	fn points_without_any_id_are_skipped() {
		let orphan = ScoredPoint { id: None, score: 0.3, ..Default::default() };

		assert!(matches_from_points(&[orphan]).is_empty());
	}

	#[test]
	fn empty_filter_builds_nothing() {
		assert!(build_filter(&MetadataFilter::new()).is_none());

		let mut filter = MetadataFilter::new();

		filter.insert("novel".to_string(), "斗破苍穹".to_string());
		filter.insert("version".to_string(), "v1".to_string());

		assert_eq!(build_filter(&filter).map(|f| f.must.len()), Some(2));
	}
}
