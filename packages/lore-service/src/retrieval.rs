use std::{
	collections::{BTreeSet, HashMap},
	sync::Arc,
};

use tokio::task::JoinSet;

use crate::{Embedder, Error, Result, SceneStore, VectorIndex};
use lore_domain::{RetrievalQuery, Scene, ScoredScene, VectorMatch};

type CorpusKey = (String, String);

/// Turns a question into hydrated candidates, in the order the index ranked them.
pub struct RetrievalOrchestrator {
	embedder: Arc<dyn Embedder>,
	index: Arc<dyn VectorIndex>,
	store: Arc<dyn SceneStore>,
}
impl RetrievalOrchestrator {
	pub fn new(
		embedder: Arc<dyn Embedder>,
		index: Arc<dyn VectorIndex>,
		store: Arc<dyn SceneStore>,
	) -> Self {
		Self { embedder, index, store }
	}

	/// Embed, search, hydrate. Embedder, index, and store failures propagate unchanged.
	pub async fn retrieve(&self, query: &RetrievalQuery) -> Result<Vec<ScoredScene>> {
		let filter = query.filter();

		tracing::info!(
			question = %query.question,
			top_k = query.top_k,
			filter = ?filter,
			"Retrieving scenes."
		);

		let vector = self.embedder.embed(&query.question).await?;
		let matches = self.index.search(vector, query.top_k, &filter).await?;

		if matches.is_empty() {
			return Ok(Vec::new());
		}

		let hydrated = self.hydrate(&matches).await?;
		let mut out = Vec::with_capacity(matches.len());

		for hit in matches {
			let Some((novel, version)) = hit.corpus() else {
				tracing::warn!(
					scene_id = %hit.id,
					"Vector match is missing novel or version metadata."
				);

				continue;
			};
			let scene = hydrated
				.get(&(novel.to_string(), version.to_string()))
				.and_then(|scenes| scenes.get(hit.id.as_str()));
			let Some(scene) = scene else {
				tracing::warn!(
					scene_id = %hit.id,
					novel,
					version,
					"Vector match has no stored scene."
				);

				continue;
			};

			out.push(ScoredScene::new(scene.clone(), hit.score));
		}

		Ok(out)
	}

	/// Loads each `(novel, version)` group once, all groups concurrently.
	async fn hydrate(
		&self,
		matches: &[VectorMatch],
	) -> Result<HashMap<CorpusKey, HashMap<String, Scene>>> {
		let groups: BTreeSet<CorpusKey> = matches
			.iter()
			.filter_map(|hit| hit.corpus())
			.map(|(novel, version)| (novel.to_string(), version.to_string()))
			.collect();
		let mut tasks = JoinSet::new();

		for key in groups {
			let store = self.store.clone();

			tasks.spawn(async move {
				let scenes = store.load_batch(&key.0, &key.1).await;

				(key, scenes)
			});
		}

		let mut hydrated = HashMap::new();

		while let Some(joined) = tasks.join_next().await {
			let (key, scenes) = joined.map_err(|err| Error::Storage {
				message: format!("Hydration task failed: {err}"),
			})?;
			let scenes = scenes?;

			tracing::debug!(
				novel = %key.0,
				version = %key.1,
				count = scenes.len(),
				"Hydrated scene group."
			);

			let mut by_id = HashMap::with_capacity(scenes.len());

			for scene in scenes {
				by_id.entry(scene.id.clone()).or_insert(scene);
			}

			hydrated.insert(key, by_id);
		}

		Ok(hydrated)
	}
}
