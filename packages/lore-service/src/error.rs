pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
	#[error("Generation error: {message}")]
	Generation { message: String },
	#[error("Answer cites unknown block {block_id}.")]
	CitationIntegrity { block_id: String },
}
impl From<lore_storage::Error> for Error {
	fn from(err: lore_storage::Error) -> Self {
		match err {
			lore_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			lore_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
			other => Self::Storage { message: other.to_string() },
		}
	}
}

impl From<lore_providers::Error> for Error {
	fn from(err: lore_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
