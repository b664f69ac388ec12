//! JSON file key-value store.
//!
//! The whole store is one JSON object mapping slice names to values. Writes
//! replace the file atomically (temp file, fsync, rename), so a crash leaves
//! either the old or the new document on disk.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tagpilot_db::JsonFileStore;
//!
//! let store = JsonFileStore::new("/var/lib/tagpilot/store.json");
//! store.validate().await?;
//! let repo = KvTagRepository::new(store);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use tagpilot_core::{Error, KeyValueStore, Result};

pub struct JsonFileStore {
    path: PathBuf,
    // Serializes file replacement within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check that the store file is readable and its directory writable.
    ///
    /// A missing store file is fine: it is created on first write.
    pub async fn validate(&self) -> Result<()> {
        self.read_document().await?;
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).await.map_err(|e| {
            Error::Storage(format!("create_dir_all({}): {}", dir.display(), e))
        })?;
        let probe = dir.join(".tagpilot-health-check");
        fs::write(&probe, b"ok")
            .await
            .map_err(|e| Error::Storage(format!("write({}): {}", probe.display(), e)))?;
        let _ = fs::remove_file(&probe).await;
        Ok(())
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    async fn read_document(&self) -> Result<Map<String, JsonValue>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "file_store: no store file yet");
                return Ok(Map::new());
            }
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        match serde_json::from_slice::<JsonValue>(&bytes)? {
            JsonValue::Object(map) => Ok(map),
            other => Err(Error::Storage(format!(
                "store file {} holds a JSON {} instead of an object",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    async fn write_document(&self, document: &Map<String, JsonValue>) -> Result<()> {
        let data = serde_json::to_vec_pretty(document)?;
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).await.map_err(|e| {
            warn!(parent = %dir.display(), error = %e, "file_store: create_dir_all failed");
            e
        })?;

        // Atomic write: temp file + rename
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "file_store: File::create failed");
            e
        })?;
        file.write_all(&data).await.map_err(|e| {
            warn!(error = %e, "file_store: write_all failed");
            e
        })?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %self.path.display(), error = %e, "file_store: rename failed");
            e
        })?;

        debug!(path = %self.path.display(), size = data.len(), "file_store: write");
        Ok(())
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn read_slice(&self, names: &[&str]) -> Result<HashMap<String, JsonValue>> {
        let mut document = self.read_document().await?;
        Ok(names
            .iter()
            .filter_map(|name| document.remove(*name).map(|v| (name.to_string(), v)))
            .collect())
    }

    async fn write_slice(&self, values: HashMap<String, JsonValue>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        for (name, value) in values {
            document.insert(name, value);
        }
        self.write_document(&document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"));
        assert!(store.read_slice(&["tagsById"]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read_keeps_other_slices() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/store.json"));

        store
            .write_slice(HashMap::from([
                ("tagsById".to_string(), json!({"t1": {"name": "Rust"}})),
                ("bookmarkMeta".to_string(), json!({})),
            ]))
            .await
            .unwrap();
        store
            .write_slice(HashMap::from([("bookmarkMeta".to_string(), json!({"b1": {}}))]))
            .await
            .unwrap();

        let values = store.read_slice(&["tagsById", "bookmarkMeta"]).await.unwrap();
        assert_eq!(values["tagsById"]["t1"]["name"], "Rust");
        assert_eq!(values["bookmarkMeta"], json!({"b1": {}}));
        assert!(!dir.path().join("nested/store.tmp").exists());
    }

    #[tokio::test]
    async fn test_non_object_document_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = JsonFileStore::new(&path).read_slice(&["tagsById"]).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(&path).read_slice(&["tagsById"]).await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn test_validate_creates_nothing_but_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data/store.json"));
        store.validate().await.unwrap();
        assert!(dir.path().join("data").is_dir());
        assert!(!store.path().exists());
    }
}
