use std::{
	collections::HashMap,
	path::{Path, PathBuf},
};

use crate::{Error, Result};
use lore_domain::Scene;

pub const SCENES_FILE: &str = "scenes.json";

/// Reads scene batches from `{root}/scene/{novel}/{version}/scenes.json`.
#[derive(Debug, Clone)]
pub struct FsSceneStore {
	root: PathBuf,
}
impl FsSceneStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn new_from_config(cfg: &lore_config::SceneStorage) -> Self {
		Self::new(&cfg.root)
	}

	pub fn batch_path(&self, novel: &str, version: &str) -> Result<PathBuf> {
		check_segment("novel", novel)?;
		check_segment("version", version)?;

		Ok(self.root.join("scene").join(novel).join(version).join(SCENES_FILE))
	}

	/// Loads every scene of one corpus version. A missing batch file yields no scenes.
	pub async fn load_batch(&self, novel: &str, version: &str) -> Result<Vec<Scene>> {
		let path = self.batch_path(novel, version)?;
		let raw = match tokio::fs::read(&path).await {
			Ok(raw) => raw,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				tracing::warn!(path = %path.display(), "Scene batch file not found.");

				return Ok(Vec::new());
			},
			Err(err) => return Err(err.into()),
		};
		let scenes: Vec<Scene> = serde_json::from_slice(&raw)?;

		tracing::debug!(novel, version, count = scenes.len(), "Loaded scene batch.");

		Ok(scenes)
	}

	pub async fn save_batch(&self, novel: &str, version: &str, scenes: &[Scene]) -> Result<()> {
		let path = self.batch_path(novel, version)?;

		if let Some(parent) = path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}

		tokio::fs::write(&path, serde_json::to_vec_pretty(scenes)?).await?;

		Ok(())
	}
}

fn check_segment(name: &str, value: &str) -> Result<()> {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return Err(Error::InvalidArgument(format!("{name} must not be empty.")));
	}
	if trimmed == "." || trimmed == ".." || Path::new(trimmed).components().count() != 1 {
		return Err(Error::InvalidArgument(format!("{name} must be a single path segment.")));
	}

	Ok(())
}

/// Scene batches keyed by `(novel, version)`.
#[derive(Debug, Clone, Default)]
pub struct InMemorySceneStore {
	batches: HashMap<(String, String), Vec<Scene>>,
}
impl InMemorySceneStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(
		&mut self,
		novel: impl Into<String>,
		version: impl Into<String>,
		scenes: Vec<Scene>,
	) {
		self.batches.entry((novel.into(), version.into())).or_default().extend(scenes);
	}

	pub fn load_batch(&self, novel: &str, version: &str) -> Vec<Scene> {
		self.batches.get(&(novel.to_string(), version.to_string())).cloned().unwrap_or_default()
	}
}
