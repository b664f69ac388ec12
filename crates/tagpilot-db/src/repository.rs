//! [`TagRepository`] over any [`KeyValueStore`].

use async_trait::async_trait;

use tagpilot_core::{
    AliasOutcome, BatchResolution, DeleteOutcome, DuplicateGroup, EngineConfig, KeyValueStore,
    MergeOutcome, RenameOutcome, Resolution, ResolveOptions, Result, Suggestion, Tag, TagId,
    TagRepository, TagUsage, VocabularyStats,
};

use crate::{bookmarks, mutators, resolver, vocabulary};

/// Uncoordinated repository: every call does its own whole-slice
/// read-modify-write against the store.
///
/// Safe for one caller at a time. Concurrent creations or mutations can lose
/// updates; route shared access through `tagpilot_jobs::TagService`.
pub struct KvTagRepository<S> {
    store: S,
    max_similar: usize,
}

impl<S: KeyValueStore> KvTagRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, &EngineConfig::default())
    }

    pub fn with_config(store: S, config: &EngineConfig) -> Self {
        Self {
            store,
            max_similar: config.max_similar,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: KeyValueStore> TagRepository for KvTagRepository<S> {
    async fn resolve(&self, label: &str, options: ResolveOptions) -> Result<Resolution> {
        resolver::resolve(&self.store, label, options, self.max_similar).await
    }

    async fn resolve_batch(
        &self,
        labels: &[String],
        options: ResolveOptions,
    ) -> Result<BatchResolution> {
        resolver::resolve_batch(&self.store, labels, options, self.max_similar).await
    }

    async fn find_similar(&self, label: &str, max_results: usize) -> Result<Vec<Tag>> {
        vocabulary::find_similar(&self.store, label, max_results).await
    }

    async fn suggest(&self, query: &str, max_results: usize) -> Result<Suggestion> {
        vocabulary::suggest(&self.store, query, max_results).await
    }

    async fn merge(&self, source: &TagId, target: &TagId) -> Result<MergeOutcome> {
        mutators::merge(&self.store, source, target).await
    }

    async fn rename(&self, tag_id: &TagId, new_name: &str) -> Result<RenameOutcome> {
        mutators::rename(&self.store, tag_id, new_name).await
    }

    async fn delete(&self, tag_id: &TagId) -> Result<DeleteOutcome> {
        mutators::delete(&self.store, tag_id).await
    }

    async fn add_alias(&self, tag_id: &TagId, alias: &str) -> Result<AliasOutcome> {
        mutators::add_alias(&self.store, tag_id, alias).await
    }

    async fn set_bookmark_tags(&self, bookmark_id: &str, labels: &[String]) -> Result<Vec<TagId>> {
        bookmarks::set_bookmark_tags(&self.store, bookmark_id, labels, self.max_similar).await
    }

    async fn add_tags_to_bookmark(
        &self,
        bookmark_id: &str,
        labels: &[String],
    ) -> Result<Vec<TagId>> {
        bookmarks::add_tags_to_bookmark(&self.store, bookmark_id, labels, self.max_similar).await
    }

    async fn bookmark_tags(&self, bookmark_id: &str) -> Result<Vec<Tag>> {
        bookmarks::bookmark_tags(&self.store, bookmark_id).await
    }

    async fn remove_bookmark(&self, bookmark_id: &str) -> Result<bool> {
        bookmarks::remove_bookmark(&self.store, bookmark_id).await
    }

    async fn tag_usage(&self) -> Result<Vec<TagUsage>> {
        vocabulary::tag_usage(&self.store).await
    }

    async fn stats(&self, top_n: usize) -> Result<VocabularyStats> {
        vocabulary::stats(&self.store, top_n).await
    }

    async fn find_duplicates(&self) -> Result<Vec<DuplicateGroup>> {
        vocabulary::find_duplicates(&self.store).await
    }

    async fn repair_duplicates(&self) -> Result<Vec<MergeOutcome>> {
        mutators::repair_duplicates(&self.store).await
    }

    async fn prune_dangling(&self) -> Result<usize> {
        mutators::prune_dangling(&self.store).await
    }
}
