//! Core traits for TagPilot.
//!
//! These traits define the seams between the engine and its collaborators:
//! the persistence layer below it and the callers above it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::{
    AliasOutcome, BatchResolution, DeleteOutcome, DuplicateGroup, MergeOutcome, RenameOutcome,
    Resolution, ResolveOptions, Result, Suggestion, Tag, TagId, TagUsage, VocabularyStats,
};

// =============================================================================
// PERSISTENCE TRAITS
// =============================================================================

/// Shared key-value store holding whole named values ("slices").
///
/// There are no partial-key updates: every write replaces the named values it
/// carries. Nothing coordinates a read with a later write, so two callers that
/// read-modify-write the same slice can lose one another's changes.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the named slices. Names with no stored value are absent from the map.
    async fn read_slice(&self, names: &[&str]) -> Result<HashMap<String, JsonValue>>;

    /// Replace each named slice with the given value.
    async fn write_slice(&self, values: HashMap<String, JsonValue>) -> Result<()>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn read_slice(&self, names: &[&str]) -> Result<HashMap<String, JsonValue>> {
        (**self).read_slice(names).await
    }

    async fn write_slice(&self, values: HashMap<String, JsonValue>) -> Result<()> {
        (**self).write_slice(values).await
    }
}

// =============================================================================
// TAG REPOSITORY TRAITS
// =============================================================================

/// Tag identity resolution and vocabulary maintenance.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Resolve a raw label to a tag identity, optionally creating it.
    async fn resolve(&self, label: &str, options: ResolveOptions) -> Result<Resolution>;

    /// Resolve labels one after another, preserving input order.
    async fn resolve_batch(
        &self,
        labels: &[String],
        options: ResolveOptions,
    ) -> Result<BatchResolution>;

    /// Ranked candidates for a label; read-only.
    async fn find_similar(&self, label: &str, max_results: usize) -> Result<Vec<Tag>>;

    /// Exact name plus similar names for autocomplete.
    async fn suggest(&self, query: &str, max_results: usize) -> Result<Suggestion>;

    /// Fold `source` into `target` and cascade to every bookmark.
    async fn merge(&self, source: &TagId, target: &TagId) -> Result<MergeOutcome>;

    /// Rename a tag; a name that already identifies another tag merges into it.
    async fn rename(&self, tag_id: &TagId, new_name: &str) -> Result<RenameOutcome>;

    /// Delete a tag and remove it from every bookmark.
    async fn delete(&self, tag_id: &TagId) -> Result<DeleteOutcome>;

    /// Add an alternate spelling to a tag.
    async fn add_alias(&self, tag_id: &TagId, alias: &str) -> Result<AliasOutcome>;

    /// Resolve labels (creating as needed) and replace the bookmark's tags.
    async fn set_bookmark_tags(&self, bookmark_id: &str, labels: &[String]) -> Result<Vec<TagId>>;

    /// Resolve labels (creating as needed) and add them to the bookmark's tags.
    async fn add_tags_to_bookmark(
        &self,
        bookmark_id: &str,
        labels: &[String],
    ) -> Result<Vec<TagId>>;

    /// Tags attached to a bookmark.
    async fn bookmark_tags(&self, bookmark_id: &str) -> Result<Vec<Tag>>;

    /// Drop a bookmark's association. Returns whether one existed.
    async fn remove_bookmark(&self, bookmark_id: &str) -> Result<bool>;

    /// Every tag with its bookmark count, most used first.
    async fn tag_usage(&self) -> Result<Vec<TagUsage>>;

    /// Vocabulary summary with the `top_n` most used tags.
    async fn stats(&self, top_n: usize) -> Result<VocabularyStats>;

    /// Groups of distinct tags sharing a normalized key.
    async fn find_duplicates(&self) -> Result<Vec<DuplicateGroup>>;

    /// Merge every duplicate group into its earliest-created tag.
    async fn repair_duplicates(&self) -> Result<Vec<MergeOutcome>>;

    /// Remove association references to tags missing from the registry.
    async fn prune_dangling(&self) -> Result<usize>;
}
