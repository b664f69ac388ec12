//! In-memory tag index: exact key resolution and ranked similarity search.
//!
//! A [`TagIndex`] is a session object. It borrows one registry snapshot, is
//! never persisted or shared, and must be rebuilt (or dropped and built anew)
//! whenever the registry may have changed. Because it borrows the snapshot it
//! cannot outlive it.
//!
//! Similarity search combines two strategies:
//!
//! - bidirectional substring containment, which works for CJK labels where
//!   character edit distance carries no meaning;
//! - Levenshtein distance for Latin/digit labels, catching typos such as
//!   `Dockr` for `Docker`.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace, warn};

use tagpilot_core::defaults::{
    EDIT_DISTANCE_MIN_LABEL_CHARS, MAX_EDIT_DISTANCE, SCORE_ALIAS_SUBSTRING, SCORE_CANONICAL,
    SCORE_NAME_SUBSTRING,
};
use tagpilot_core::{DuplicateGroup, Tag, TagId, TagRegistry};

use crate::canonical::canonical_for;
use crate::normalize::{lookup_key, LabelKeys};

/// Labels eligible for edit-distance matching, tested against the lookup key.
static LATIN_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9\s.]+$").unwrap());

/// Why a tag was offered as a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Canonical,
    Substring,
    AliasSubstring,
    EditDistance,
}

/// A scored candidate from [`TagIndex::similarity_search`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarTag {
    pub tag: Tag,
    pub score: f64,
    pub reason: MatchReason,
}

/// Two distinct tags produced the same key; the later insertion won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub key: String,
    pub overwritten: TagId,
    pub kept: TagId,
}

pub struct TagIndex<'a> {
    registry: &'a TagRegistry,
    key_to_id: HashMap<String, &'a TagId>,
    collisions: Vec<KeyCollision>,
}

impl<'a> TagIndex<'a> {
    /// Index every tag's name and aliases, both keys each.
    pub fn build(registry: &'a TagRegistry) -> Self {
        let mut index = Self {
            registry,
            key_to_id: HashMap::new(),
            collisions: Vec::new(),
        };
        index.populate();
        index
    }

    /// Discard all keys and re-index against `registry`.
    pub fn rebuild(&mut self, registry: &'a TagRegistry) {
        self.registry = registry;
        self.key_to_id.clear();
        self.collisions.clear();
        self.populate();
    }

    fn populate(&mut self) {
        let registry = self.registry;
        for tag in registry.iter() {
            let labels = std::iter::once(tag.name.as_str()).chain(tag.aliases.iter().map(String::as_str));
            for label in labels {
                let keys = LabelKeys::of(label);
                for key in keys.iter() {
                    self.insert_key(key, &tag.id);
                }
            }
        }

        if !self.collisions.is_empty() {
            warn!(
                subsystem = "search",
                component = "tag_index",
                op = "build",
                collisions = self.collisions.len(),
                "Distinct tags share normalized keys"
            );
        }
        debug!(
            subsystem = "search",
            component = "tag_index",
            op = "build",
            tag_count = registry.len(),
            key_count = self.key_to_id.len(),
            "Tag index built"
        );
    }

    fn insert_key(&mut self, key: &str, id: &'a TagId) {
        if let Some(previous) = self.key_to_id.insert(key.to_string(), id) {
            if previous != id {
                self.collisions.push(KeyCollision {
                    key: key.to_string(),
                    overwritten: previous.clone(),
                    kept: id.clone(),
                });
            }
        }
    }

    /// The snapshot this index was built from.
    pub fn registry(&self) -> &'a TagRegistry {
        self.registry
    }

    pub fn get(&self, id: &str) -> Option<&'a Tag> {
        self.registry.get(id)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.key_to_id.contains_key(key)
    }

    pub fn key_count(&self) -> usize {
        self.key_to_id.len()
    }

    /// Tag id whose name or alias shares the label's lookup key, falling back
    /// to the compact key.
    pub fn exact_lookup(&self, label: &str) -> Option<&'a TagId> {
        let keys = LabelKeys::of(label);
        if keys.lookup.is_empty() {
            return None;
        }
        self.key_to_id
            .get(&keys.lookup)
            .or_else(|| self.key_to_id.get(&keys.compact))
            .copied()
    }

    /// Tag other than `exclude` that owns the label's lookup key or, failing
    /// that, its compact key.
    pub fn exact_lookup_other(&self, label: &str, exclude: &TagId) -> Option<&'a TagId> {
        let keys = LabelKeys::of(label);
        if keys.lookup.is_empty() {
            return None;
        }
        let found = [&keys.lookup, &keys.compact]
            .into_iter()
            .filter_map(|key| self.key_to_id.get(key.as_str()).copied())
            .find(|id| *id != exclude);
        found
    }

    /// Ranked candidates for a label that has no exact match.
    ///
    /// Returns nothing when the label is already indexed: callers are expected
    /// to try [`TagIndex::exact_lookup`] first.
    pub fn similarity_search(&self, label: &str, max_results: usize) -> Vec<SimilarTag> {
        let keys = LabelKeys::of(label);
        if keys.lookup.is_empty() || max_results == 0 {
            return Vec::new();
        }
        if self.contains_key(&keys.lookup) || self.contains_key(&keys.compact) {
            return Vec::new();
        }

        if let Some(canonical) = canonical_for(label) {
            if let Some(tag) = self.exact_lookup(canonical).and_then(|id| self.get(id.as_str())) {
                debug!(
                    subsystem = "search",
                    component = "tag_index",
                    op = "similarity_search",
                    label,
                    canonical,
                    tag_id = %tag.id,
                    "Canonical synonym short-circuit"
                );
                return vec![SimilarTag {
                    tag: tag.clone(),
                    score: SCORE_CANONICAL,
                    reason: MatchReason::Canonical,
                }];
            }
        }

        let mut candidates = Vec::new();
        self.collect_substring_matches(&keys.lookup, &mut candidates);
        self.collect_edit_distance_matches(&keys.lookup, &mut candidates);

        let ranked = rank_candidates(candidates, max_results);
        debug!(
            subsystem = "search",
            component = "tag_index",
            op = "similarity_search",
            label,
            result_count = ranked.len(),
            "Similarity search complete"
        );
        ranked
    }

    /// Tags from [`TagIndex::similarity_search`], most similar first.
    pub fn find_similar(&self, label: &str, max_results: usize) -> Vec<Tag> {
        self.similarity_search(label, max_results)
            .into_iter()
            .map(|c| c.tag)
            .collect()
    }

    fn collect_substring_matches(&self, label_key: &str, out: &mut Vec<SimilarTag>) {
        for tag in self.registry.iter() {
            let name_key = lookup_key(&tag.name);
            if contains_either(&name_key, label_key) {
                trace!(tag_id = %tag.id, score = SCORE_NAME_SUBSTRING, "substring candidate");
                out.push(SimilarTag {
                    tag: tag.clone(),
                    score: SCORE_NAME_SUBSTRING,
                    reason: MatchReason::Substring,
                });
                continue;
            }

            let alias_hit = tag
                .aliases
                .iter()
                .map(|a| lookup_key(a))
                .any(|alias_key| contains_either(&alias_key, label_key));
            if alias_hit {
                trace!(tag_id = %tag.id, score = SCORE_ALIAS_SUBSTRING, "alias substring candidate");
                out.push(SimilarTag {
                    tag: tag.clone(),
                    score: SCORE_ALIAS_SUBSTRING,
                    reason: MatchReason::AliasSubstring,
                });
            }
        }
    }

    fn collect_edit_distance_matches(&self, label_key: &str, out: &mut Vec<SimilarTag>) {
        if !LATIN_LABEL.is_match(label_key) {
            return;
        }
        let label_len = label_key.chars().count();
        if label_len <= EDIT_DISTANCE_MIN_LABEL_CHARS {
            return;
        }

        for tag in self.registry.iter() {
            let name_key = lookup_key(&tag.name);
            let distance = levenshtein(label_key, &name_key);
            if distance > MAX_EDIT_DISTANCE {
                continue;
            }
            let longest = label_len.max(name_key.chars().count());
            let score = 1.0 - distance as f64 / longest as f64;
            trace!(tag_id = %tag.id, distance, score, "edit distance candidate");
            out.push(SimilarTag {
                tag: tag.clone(),
                score,
                reason: MatchReason::EditDistance,
            });
        }
    }

    /// Collisions recorded while building.
    pub fn collisions(&self) -> &[KeyCollision] {
        &self.collisions
    }

    /// Groups of distinct tags that share a key, one group per distinct set of tags.
    ///
    /// Ids within a group keep registry order; groups are ordered by key.
    pub fn duplicate_groups(&self) -> Vec<DuplicateGroup> {
        let mut by_key: BTreeMap<&str, Vec<&TagId>> = BTreeMap::new();
        for collision in &self.collisions {
            let ids = by_key.entry(collision.key.as_str()).or_default();
            for id in [&collision.overwritten, &collision.kept] {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        let mut groups: Vec<DuplicateGroup> = Vec::new();
        for (key, mut ids) in by_key {
            ids.sort();
            let tag_ids: Vec<TagId> = ids.into_iter().cloned().collect();
            if groups.iter().any(|g| g.tag_ids == tag_ids) {
                continue;
            }
            groups.push(DuplicateGroup {
                key: key.to_string(),
                tag_ids,
            });
        }
        groups
    }
}

fn contains_either(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// Keep each tag's best score, then order by score (stable on ties).
fn rank_candidates(candidates: Vec<SimilarTag>, max_results: usize) -> Vec<SimilarTag> {
    let mut best: Vec<SimilarTag> = Vec::new();
    let mut position: HashMap<TagId, usize> = HashMap::new();
    for candidate in candidates {
        match position.get(&candidate.tag.id) {
            Some(&i) => {
                if best[i].score < candidate.score {
                    best[i] = candidate;
                }
            }
            None => {
                position.insert(candidate.tag.id.clone(), best.len());
                best.push(candidate);
            }
        }
    }

    best.sort_by(|a, b| b.score.total_cmp(&a.score));
    best.truncate(max_results);
    best
}

/// Unit-cost Levenshtein distance over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
