//! In-process key-value store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

use tagpilot_core::{KeyValueStore, Result};

/// Slices held in memory; lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slices: RwLock<HashMap<String, JsonValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with pre-populated slices.
    pub fn with_slices(slices: HashMap<String, JsonValue>) -> Self {
        Self {
            slices: RwLock::new(slices),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn read_slice(&self, names: &[&str]) -> Result<HashMap<String, JsonValue>> {
        let slices = self.slices.read().await;
        Ok(names
            .iter()
            .filter_map(|name| slices.get(*name).map(|v| (name.to_string(), v.clone())))
            .collect())
    }

    async fn write_slice(&self, values: HashMap<String, JsonValue>) -> Result<()> {
        self.slices.write().await.extend(values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_missing_slice_is_absent() {
        let store = MemoryStore::new();
        let values = store.read_slice(&["tagsById"]).await.unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn test_write_replaces_only_named_slices() {
        let store = MemoryStore::with_slices(HashMap::from([
            ("a".to_string(), json!({"x": 1})),
            ("b".to_string(), json!([1, 2])),
        ]));

        store
            .write_slice(HashMap::from([("a".to_string(), json!({"y": 2}))]))
            .await
            .unwrap();

        let values = store.read_slice(&["a", "b"]).await.unwrap();
        assert_eq!(values["a"], json!({"y": 2}));
        assert_eq!(values["b"], json!([1, 2]));
    }
}
