pub mod memory;
pub mod qdrant;
pub mod scenes;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
