use std::path::PathBuf;

use lore_domain::{Scene, SceneMetadata};
use lore_storage::{
	Error,
	scenes::{FsSceneStore, InMemorySceneStore},
};

fn temp_root(name: &str) -> PathBuf {
	let mut path = std::env::temp_dir();
	let nanos = std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.expect("Clock went backwards.")
		.as_nanos();

	path.push(format!("lore_storage_{name}_{nanos}"));

	path
}

fn scene(id: &str, chapter: i32, start: i32) -> Scene {
	Scene {
		id: id.to_string(),
		chapter_title: Some(format!("第{chapter}章")),
		chapter_index: chapter,
		start_paragraph_index: start,
		end_paragraph_index: start + 3,
		text: format!("scene {id}"),
		word_count: 8,
		prefix_context: None,
		metadata: SceneMetadata {
			novel: Some("斗破苍穹".to_string()),
			version: Some("v1".to_string()),
			..Default::default()
		},
	}
}

#[tokio::test]
async fn saves_and_loads_a_batch() {
	let root = temp_root("roundtrip");
	let store = FsSceneStore::new(&root);
	let scenes = vec![scene("c1-s1", 1, 0), scene("c1-s2", 1, 4)];

	store.save_batch("斗破苍穹", "v1", &scenes).await.expect("Failed to save batch.");

	let loaded = store.load_batch("斗破苍穹", "v1").await.expect("Failed to load batch.");

	assert_eq!(loaded, scenes);

	let _ = std::fs::remove_dir_all(root);
}

#[tokio::test]
async fn reads_camel_case_files_written_by_ingestion() {
	let root = temp_root("camel");
	let dir = root.join("scene").join("novel").join("v2");

	std::fs::create_dir_all(&dir).expect("Failed to create scene dir.");
	std::fs::write(
		dir.join("scenes.json"),
		r#"[{"id":"a","chapterIndex":2,"startParagraphIndex":5,"endParagraphIndex":9,"text":"t","metadata":{"novel":"novel","version":"v2","chunkType":"scene"}}]"#,
	)
	.expect("Failed to write scenes.");

	let loaded =
		FsSceneStore::new(&root).load_batch("novel", "v2").await.expect("Failed to load batch.");

	assert_eq!(loaded.len(), 1);
	assert_eq!(loaded[0].start_paragraph_index, 5);
	assert_eq!(loaded[0].metadata.chunk_type.as_deref(), Some("scene"));

	let _ = std::fs::remove_dir_all(root);
}

#[tokio::test]
async fn missing_batch_is_empty() {
	let store = FsSceneStore::new(temp_root("missing"));
	let loaded = store.load_batch("nobody", "v1").await.expect("Missing batch should not fail.");

	assert!(loaded.is_empty());
}

#[tokio::test]
async fn malformed_batch_is_an_error() {
	let root = temp_root("malformed");
	let dir = root.join("scene").join("novel").join("v1");

	std::fs::create_dir_all(&dir).expect("Failed to create scene dir.");
	std::fs::write(dir.join("scenes.json"), "{not json").expect("Failed to write scenes.");

	let err = FsSceneStore::new(&root).load_batch("novel", "v1").await.expect_err("Expected error.");

	assert!(matches!(err, Error::SerdeJson(_)));

	let _ = std::fs::remove_dir_all(root);
}

#[test]
fn in_memory_store_is_keyed_by_corpus_and_version() {
	let mut store = InMemorySceneStore::new();

	store.insert("斗破苍穹", "v1", vec![scene("c1-s1", 1, 0)]);
	store.insert("斗破苍穹", "v2", vec![scene("c1-s1", 1, 0), scene("c1-s2", 1, 4)]);

	assert_eq!(store.load_batch("斗破苍穹", "v1").len(), 1);
	assert_eq!(store.load_batch("斗破苍穹", "v2").len(), 2);
	assert!(store.load_batch("other", "v1").is_empty());
}
