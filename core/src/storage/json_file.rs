use super::{DurableStore, StoreError};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

/// [`DurableStore`] keeping one pretty-printed `<key>.json` file per key
/// under a data directory. A missing file reads back as `None`; the
/// directory is created on first write.
pub struct JsonFileStore {
	data_dir: PathBuf,
}

impl JsonFileStore {
	pub fn new(data_dir: impl Into<PathBuf>) -> Self {
		Self {
			data_dir: data_dir.into(),
		}
	}

	fn path_for(&self, key: &str) -> PathBuf {
		self.data_dir.join(format!("{key}.json"))
	}
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
	StoreError::Io {
		path: path.to_path_buf(),
		source,
	}
}

#[async_trait]
impl DurableStore for JsonFileStore {
	async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
		let path = self.path_for(key);

		let bytes = match fs::read(&path).await {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(io_error(&path, e)),
		};

		Ok(Some(serde_json::from_slice(&bytes)?))
	}

	async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
		let path = self.path_for(key);

		fs::create_dir_all(&self.data_dir)
			.await
			.map_err(|e| io_error(&self.data_dir, e))?;

		fs::write(&path, serde_json::to_vec_pretty(&value)?)
			.await
			.map_err(|e| io_error(&path, e))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use tempfile::tempdir;

	#[tokio::test]
	async fn missing_file_reads_as_none() {
		let dir = tempdir().unwrap();
		let store = JsonFileStore::new(dir.path());

		assert!(store.get("addresses").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn set_then_get_round_trips_through_disk() {
		let dir = tempdir().unwrap();
		let store = JsonFileStore::new(dir.path());

		let value = json!([{"id": "1", "firstName": "Ada"}]);
		store.set("addresses", value.clone()).await.unwrap();

		assert_eq!(store.get("addresses").await.unwrap(), Some(value));
		assert!(dir.path().join("addresses.json").exists());
	}

	#[tokio::test]
	async fn creates_data_dir_on_first_write() {
		let dir = tempdir().unwrap();
		let nested = dir.path().join("a").join("b");
		let store = JsonFileStore::new(&nested);

		store.set("addresses", json!([])).await.unwrap();
		assert!(nested.join("addresses.json").exists());
	}

	#[tokio::test]
	async fn corrupt_file_is_an_error() {
		let dir = tempdir().unwrap();
		tokio::fs::write(dir.path().join("addresses.json"), b"{not json")
			.await
			.unwrap();
		let store = JsonFileStore::new(dir.path());

		assert!(matches!(
			store.get("addresses").await,
			Err(StoreError::Serialization(_))
		));
	}
}
