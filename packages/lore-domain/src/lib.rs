pub mod answer;
pub mod cjk;
pub mod context;
pub mod corpus;
pub mod query;
pub mod scene;

pub use answer::{
	Answer, Citation, FALLBACK_ANSWER_TEXT, GeneratedAnswer, GeneratedCitation, MISSING_ANSWER_TEXT,
};
pub use context::{ContextBlock, Prompt};
pub use query::{MetadataFilter, RetrievalQuery, VectorMatch};
pub use scene::{MERGED_SCENE_IDS_KEY, Scene, SceneMetadata, ScoredScene};
