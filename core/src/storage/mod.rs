//! Durable key-value storage behind the synchronization layer

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("i/o error at {path}: {source}")]
	Io {
		path: PathBuf,
		source: std::io::Error,
	},
	#[error("invalid stored value: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// The persistence medium consumed by the synchronization layer.
///
/// Deliberately minimal: opaque JSON values under string keys, with `get`
/// returning `None` when nothing was ever stored. Implementations are
/// expected to serialize concurrent `set`s of the same key (or apply
/// last-write-wins); the callers never take a lock around them.
#[async_trait]
pub trait DurableStore: Send + Sync {
	async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
	async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}
