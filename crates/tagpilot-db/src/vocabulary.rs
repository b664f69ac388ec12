//! Read-only vocabulary queries: similarity, autocomplete, usage, and health.

use std::cmp::Reverse;

use tracing::{debug, warn};

use tagpilot_core::{
    DuplicateGroup, KeyValueStore, Result, Suggestion, Tag, TagUsage, VocabularyStats,
};
use tagpilot_search::{clean_label, TagIndex};

use crate::snapshot::{self, Snapshot};

pub async fn find_similar<S: KeyValueStore + ?Sized>(
    store: &S,
    label: &str,
    max_results: usize,
) -> Result<Vec<Tag>> {
    let cleaned = clean_label(label);
    if cleaned.is_empty() {
        return Ok(Vec::new());
    }
    let registry = snapshot::load_registry(store).await?;
    Ok(TagIndex::build(&registry).find_similar(&cleaned, max_results))
}

/// Exact display name plus similar names, excluding the exact one.
pub async fn suggest<S: KeyValueStore + ?Sized>(
    store: &S,
    query: &str,
    max_results: usize,
) -> Result<Suggestion> {
    let cleaned = clean_label(query);
    if cleaned.is_empty() {
        return Ok(Suggestion::default());
    }
    let registry = snapshot::load_registry(store).await?;
    if registry.is_empty() {
        return Ok(Suggestion::default());
    }

    let index = TagIndex::build(&registry);
    let exact = index
        .exact_lookup(&cleaned)
        .and_then(|id| index.get(id.as_str()))
        .map(|tag| tag.name.clone());
    let similar = index
        .find_similar(&cleaned, max_results)
        .into_iter()
        .map(|tag| tag.name)
        .filter(|name| Some(name) != exact.as_ref())
        .collect();

    Ok(Suggestion { exact, similar })
}

/// Every tag with its association count; most used first, then by name.
pub fn usage_of(snap: &Snapshot) -> Vec<TagUsage> {
    let counts = snap.associations.usage_counts();
    let mut usage: Vec<TagUsage> = snap
        .registry
        .iter()
        .map(|tag| TagUsage {
            count: counts.get(&tag.id).copied().unwrap_or(0),
            tag: tag.clone(),
        })
        .collect();
    usage.sort_by(|a, b| {
        Reverse(a.count)
            .cmp(&Reverse(b.count))
            .then_with(|| a.tag.name.cmp(&b.tag.name))
            .then_with(|| a.tag.id.cmp(&b.tag.id))
    });
    usage
}

pub async fn tag_usage<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<TagUsage>> {
    let snap = snapshot::load(store).await?;
    Ok(usage_of(&snap))
}

pub async fn stats<S: KeyValueStore + ?Sized>(store: &S, top_n: usize) -> Result<VocabularyStats> {
    let snap = snapshot::load(store).await?;
    let usage = usage_of(&snap);

    let tagged_bookmarks = snap
        .associations
        .iter()
        .filter(|(_, meta)| !meta.tag_ids.is_empty())
        .count();
    let referenced_tags = usage.iter().filter(|u| u.count > 0).count();
    let top_tags = usage
        .into_iter()
        .filter(|u| u.count > 0)
        .take(top_n)
        .collect();

    Ok(VocabularyStats {
        total_tags: snap.registry.len(),
        tagged_bookmarks,
        referenced_tags,
        top_tags,
    })
}

pub async fn find_duplicates<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<DuplicateGroup>> {
    let registry = snapshot::load_registry(store).await?;
    let groups = TagIndex::build(&registry).duplicate_groups();
    for group in &groups {
        warn!(
            subsystem = "db",
            component = "vocabulary",
            op = "find_duplicates",
            key = %group.key,
            tag_count = group.tag_ids.len(),
            "Duplicate tags share a key"
        );
    }
    debug!(
        subsystem = "db",
        component = "vocabulary",
        op = "find_duplicates",
        result_count = groups.len(),
        "Duplicate scan complete"
    );
    Ok(groups)
}
