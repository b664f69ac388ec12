//! Data model for the tag vocabulary and bookmark associations.
//!
//! Stored shapes use camelCase field names and millisecond timestamps so the
//! `tagsById` and `bookmarkMeta` slices stay readable by every context that
//! shares the store.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque, immutable tag identifier.
///
/// Generated ids have the form `tag_<uuidv7>`; ids written by older clients
/// (for example `tag_<millis>_<random>`) are accepted unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TagId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TagId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for TagId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// TAG
// =============================================================================

/// A deduplicated vocabulary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    /// Display form; keeps original casing and punctuation.
    pub name: String,
    /// Alternate raw spellings that resolve to this tag, in display order.
    pub aliases: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    /// A freshly created tag with no aliases.
    pub fn new(id: TagId, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            aliases: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }
}

/// Mapping from tag id to tag; the persisted `tagsById` slice.
///
/// Iterates in id order. Generated ids are UUIDv7, so this is creation order
/// and ties in similarity ranking go to the older tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagRegistry {
    tags: BTreeMap<TagId, Tag>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Tag> {
        self.tags.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Tag> {
        self.tags.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tags.contains_key(id)
    }

    /// Insert a tag keyed by its own id, returning any tag it replaced.
    pub fn insert(&mut self, tag: Tag) -> Option<Tag> {
        self.tags.insert(tag.id.clone(), tag)
    }

    pub fn remove(&mut self, id: &str) -> Option<Tag> {
        self.tags.remove(id)
    }

    /// Tags in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &TagId> {
        self.tags.keys()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<Tag> for TagRegistry {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut registry = Self::new();
        for tag in iter {
            registry.insert(tag);
        }
        registry
    }
}

// =============================================================================
// BOOKMARK ASSOCIATIONS
// =============================================================================

/// Tags attached to one bookmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkTags {
    /// Ordered set of tag ids.
    pub tag_ids: Vec<TagId>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl BookmarkTags {
    /// Build an association, dropping repeated ids while keeping first-seen order.
    pub fn new(tag_ids: impl IntoIterator<Item = TagId>, now: DateTime<Utc>) -> Self {
        let mut out: Vec<TagId> = Vec::new();
        for id in tag_ids {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        Self {
            tag_ids: out,
            updated_at: now,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tag_ids.iter().any(|t| t.as_str() == id)
    }
}

/// Mapping from bookmark id to its tags; the persisted `bookmarkMeta` slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssociationTable {
    entries: BTreeMap<String, BookmarkTags>,
}

impl AssociationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bookmark_id: &str) -> Option<&BookmarkTags> {
        self.entries.get(bookmark_id)
    }

    pub fn set(&mut self, bookmark_id: impl Into<String>, tags: BookmarkTags) {
        self.entries.insert(bookmark_id.into(), tags);
    }

    pub fn remove(&mut self, bookmark_id: &str) -> Option<BookmarkTags> {
        self.entries.remove(bookmark_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BookmarkTags)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace `source` with `target` in every association that holds it,
    /// collapsing the duplicate that appears when both were present.
    ///
    /// Returns the number of associations changed.
    pub fn replace_tag(&mut self, source: &TagId, target: &TagId, now: DateTime<Utc>) -> usize {
        let mut affected = 0;
        for meta in self.entries.values_mut() {
            if !meta.contains(source.as_str()) {
                continue;
            }
            let replaced = meta
                .tag_ids
                .drain(..)
                .map(|id| if &id == source { target.clone() } else { id })
                .collect::<Vec<_>>();
            *meta = BookmarkTags::new(replaced, now);
            affected += 1;
        }
        affected
    }

    /// Remove `id` from every association; returns the number changed.
    pub fn remove_tag(&mut self, id: &TagId, now: DateTime<Utc>) -> usize {
        let mut affected = 0;
        for meta in self.entries.values_mut() {
            if meta.contains(id.as_str()) {
                meta.tag_ids.retain(|t| t != id);
                meta.updated_at = now;
                affected += 1;
            }
        }
        affected
    }

    /// Keep only the ids `keep` accepts; returns the number of ids removed.
    pub fn retain_tags<F>(&mut self, mut keep: F, now: DateTime<Utc>) -> usize
    where
        F: FnMut(&TagId) -> bool,
    {
        let mut removed = 0;
        for meta in self.entries.values_mut() {
            let before = meta.tag_ids.len();
            meta.tag_ids.retain(|id| keep(id));
            let dropped = before - meta.tag_ids.len();
            if dropped > 0 {
                meta.updated_at = now;
                removed += dropped;
            }
        }
        removed
    }

    /// Number of associations referencing each tag id.
    pub fn usage_counts(&self) -> BTreeMap<&TagId, usize> {
        let mut counts = BTreeMap::new();
        for meta in self.entries.values() {
            for id in &meta.tag_ids {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        counts
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Options for [`crate::TagRepository::resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Create a new tag when no exact match exists.
    pub create_if_not_found: bool,
    /// Skip candidate generation on a miss.
    pub skip_similar_check: bool,
    /// Map the label through the canonical synonym table before resolving.
    pub canonicalize: bool,
}

impl ResolveOptions {
    pub fn lookup() -> Self {
        Self::default()
    }

    pub fn create() -> Self {
        Self {
            create_if_not_found: true,
            ..Self::default()
        }
    }

    pub fn with_skip_similar(mut self, skip: bool) -> Self {
        self.skip_similar_check = skip;
        self
    }

    pub fn with_canonicalize(mut self, canonicalize: bool) -> Self {
        self.canonicalize = canonicalize;
        self
    }
}

/// Outcome of resolving one label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub tag_id: Option<TagId>,
    pub is_new: bool,
    /// Ranked candidates, only populated on an exact-match miss.
    pub similar: Vec<Tag>,
}

impl Resolution {
    /// No identity and no candidates.
    pub fn rejected() -> Self {
        Self::default()
    }
}

/// Aggregate counts from [`crate::TagRepository::resolve_batch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub created: usize,
    pub reused: usize,
    pub similar_groups: usize,
}

/// A label that had similar-but-unmatched candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarGroup {
    pub label: String,
    pub similar: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResolution {
    /// Resolved ids in input order; rejected labels contribute nothing.
    pub tag_ids: Vec<TagId>,
    pub stats: BatchStats,
    pub similar_info: Vec<SimilarGroup>,
}

/// Autocomplete preview for a partially typed label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub exact: Option<String>,
    pub similar: Vec<String>,
}

// =============================================================================
// MUTATION OUTCOMES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub affected_count: usize,
    pub source_name: String,
    pub target_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RenameOutcome {
    Renamed,
    /// The new name already identified another tag; the renamed tag was merged into it.
    Merged(MergeOutcome),
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub affected_count: usize,
    pub tag_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasOutcome {
    Added,
    AlreadyPresent,
}

// =============================================================================
// VOCABULARY HEALTH
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagUsage {
    pub tag: Tag,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabularyStats {
    pub total_tags: usize,
    pub tagged_bookmarks: usize,
    /// Distinct registry tags referenced by at least one bookmark.
    pub referenced_tags: usize,
    pub top_tags: Vec<TagUsage>,
}

/// Tags that share a normalized key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub key: String,
    pub tag_ids: Vec<TagId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_tag_serializes_camel_case_millis() {
        let tag = Tag::new(TagId::from("tag_1"), "Rust", ts(1_700_000_000_000));
        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["id"], "tag_1");
        assert_eq!(json["createdAt"], 1_700_000_000_000i64);
        assert_eq!(json["updatedAt"], 1_700_000_000_000i64);
        assert_eq!(json["aliases"], serde_json::json!([]));
    }

    #[test]
    fn test_registry_iterates_in_id_order() {
        let registry: TagRegistry = vec![
            Tag::new(TagId::from("tag_b"), "B", ts(0)),
            Tag::new(TagId::from("tag_a"), "A", ts(0)),
        ]
        .into_iter()
        .collect();

        let names: Vec<_> = registry.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(registry.contains("tag_a"));
    }

    #[test]
    fn test_bookmark_tags_dedupes_in_order() {
        let meta = BookmarkTags::new(
            vec![TagId::from("b"), TagId::from("a"), TagId::from("b")],
            ts(0),
        );
        assert_eq!(meta.tag_ids, vec![TagId::from("b"), TagId::from("a")]);
    }

    #[test]
    fn test_replace_tag_collapses_duplicates() {
        let a = TagId::from("a");
        let b = TagId::from("b");
        let mut table = AssociationTable::new();
        table.set("b1", BookmarkTags::new(vec![a.clone()], ts(0)));
        table.set("b2", BookmarkTags::new(vec![a.clone(), b.clone()], ts(0)));
        table.set("b3", BookmarkTags::new(vec![TagId::from("c")], ts(0)));

        let affected = table.replace_tag(&a, &b, ts(5));

        assert_eq!(affected, 2);
        assert_eq!(table.get("b1").unwrap().tag_ids, vec![b.clone()]);
        assert_eq!(table.get("b2").unwrap().tag_ids, vec![b.clone()]);
        assert_eq!(table.get("b2").unwrap().updated_at, ts(5));
        assert_eq!(table.get("b3").unwrap().updated_at, ts(0));
    }

    #[test]
    fn test_remove_tag_bumps_only_affected() {
        let a = TagId::from("a");
        let mut table = AssociationTable::new();
        table.set("b1", BookmarkTags::new(vec![a.clone(), TagId::from("x")], ts(0)));
        table.set("b2", BookmarkTags::new(vec![TagId::from("x")], ts(0)));

        assert_eq!(table.remove_tag(&a, ts(9)), 1);
        assert_eq!(table.get("b1").unwrap().tag_ids, vec![TagId::from("x")]);
        assert_eq!(table.get("b1").unwrap().updated_at, ts(9));
        assert_eq!(table.get("b2").unwrap().updated_at, ts(0));
    }

    #[test]
    fn test_usage_counts() {
        let mut table = AssociationTable::new();
        table.set("b1", BookmarkTags::new(vec![TagId::from("a")], ts(0)));
        table.set(
            "b2",
            BookmarkTags::new(vec![TagId::from("a"), TagId::from("b")], ts(0)),
        );

        let counts = table.usage_counts();
        assert_eq!(counts.get(&TagId::from("a")), Some(&2));
        assert_eq!(counts.get(&TagId::from("b")), Some(&1));
    }

    #[test]
    fn test_retain_tags_counts_removed_ids() {
        let mut table = AssociationTable::new();
        table.set(
            "b1",
            BookmarkTags::new(vec![TagId::from("a"), TagId::from("gone")], ts(0)),
        );
        table.set("b2", BookmarkTags::new(vec![TagId::from("a")], ts(0)));

        let removed = table.retain_tags(|id| id.as_str() != "gone", ts(3));
        assert_eq!(removed, 1);
        assert_eq!(table.get("b1").unwrap().updated_at, ts(3));
        assert_eq!(table.get("b2").unwrap().updated_at, ts(0));
    }

    #[test]
    fn test_rename_outcome_serialization() {
        let json = serde_json::to_value(RenameOutcome::Unchanged).unwrap();
        assert_eq!(json["result"], "unchanged");
    }
}
