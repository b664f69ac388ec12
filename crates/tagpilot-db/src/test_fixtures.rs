//! Test fixtures for repository tests.
//!
//! Provides tag and association builders, seeding helpers, and a store
//! wrapper that suspends after every read so tests can interleave callers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tagpilot_db::test_fixtures::{seed, tag, YieldingStore};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let store = YieldingStore::new(MemoryStore::new());
//!     seed(&store, vec![tag("t1", "Rust")], vec![]).await;
//!     let repo = KvTagRepository::new(store);
//!     // ...
//! }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;

use tagpilot_core::{BookmarkTags, KeyValueStore, Result, Tag, TagId};

use crate::snapshot::{self, Snapshot};

/// Timestamp from epoch milliseconds.
pub fn ts(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Tag created at the epoch.
pub fn tag(id: &str, name: &str) -> Tag {
    tag_at(id, name, 0)
}

pub fn tag_at(id: &str, name: &str, created_ms: i64) -> Tag {
    Tag::new(TagId::from(id), name, ts(created_ms))
}

/// Association updated at the epoch.
pub fn bookmark<'a>(ids: impl IntoIterator<Item = &'a str>) -> BookmarkTags {
    BookmarkTags::new(ids.into_iter().map(TagId::from), ts(0))
}

/// Write a registry and associations straight to the store.
pub async fn seed<S: KeyValueStore + ?Sized>(
    store: &S,
    tags: Vec<Tag>,
    associations: Vec<(&str, BookmarkTags)>,
) -> Result<()> {
    let mut snap = Snapshot {
        registry: tags.into_iter().collect(),
        ..Snapshot::default()
    };
    for (bookmark_id, meta) in associations {
        snap.associations.set(bookmark_id, meta);
    }
    snapshot::save(store, &snap).await
}

/// Store wrapper that yields to the scheduler after every read.
///
/// Two tasks sharing one repository then both read before either writes,
/// reproducing the uncoordinated read-modify-write interleaving.
pub struct YieldingStore<S> {
    inner: S,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl<S> YieldingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: KeyValueStore> KeyValueStore for YieldingStore<S> {
    async fn read_slice(&self, names: &[&str]) -> Result<HashMap<String, JsonValue>> {
        let values = self.inner.read_slice(names).await?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(values)
    }

    async fn write_slice(&self, values: HashMap<String, JsonValue>) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write_slice(values).await
    }
}
