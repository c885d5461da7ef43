use super::{DurableStore, StoreError};

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

/// Process-local [`DurableStore`]. Used by tests and by session-only runs
/// where nothing should outlive the process.
#[derive(Default)]
pub struct MemoryStore {
	values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seed a key before the system under test starts.
	pub async fn insert(&self, key: impl Into<String>, value: Value) {
		self.values.write().await.insert(key.into(), value);
	}
}

#[async_trait]
impl DurableStore for MemoryStore {
	async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
		Ok(self.values.read().await.get(key).cloned())
	}

	async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
		self.values.write().await.insert(key.to_string(), value);
		Ok(())
	}
}
