//! Validated load and save of the `tagsById` and `bookmarkMeta` slices.
//!
//! The store holds untyped JSON. Every entry is decoded into a typed record
//! here; the rest of the crate only sees validated snapshots.
//!
//! Decoding is lenient per entry:
//! - missing `aliases` or `tagIds` become empty, non-string members are dropped;
//! - a missing `createdAt` comes from a generated id, else the Unix epoch;
//!   a missing `updatedAt` copies `createdAt`;
//! - the map key is the tag's id, whatever `id` the entry carries;
//! - entries that are not objects, or tags without a usable name, are skipped
//!   with a warning.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use tagpilot_core::defaults::{BOOKMARKS_SLICE, TAGS_SLICE};
use tagpilot_core::{
    tag_id_timestamp, AssociationTable, BookmarkTags, KeyValueStore, Result, Tag, TagId,
    TagRegistry,
};
use tagpilot_search::clean_label;

/// Both slices, read together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub registry: TagRegistry,
    pub associations: AssociationTable,
}

pub async fn load_registry<S: KeyValueStore + ?Sized>(store: &S) -> Result<TagRegistry> {
    let values = store.read_slice(&[TAGS_SLICE]).await?;
    Ok(values.get(TAGS_SLICE).map(decode_registry).unwrap_or_default())
}

pub async fn load_associations<S: KeyValueStore + ?Sized>(store: &S) -> Result<AssociationTable> {
    let values = store.read_slice(&[BOOKMARKS_SLICE]).await?;
    Ok(values
        .get(BOOKMARKS_SLICE)
        .map(decode_associations)
        .unwrap_or_default())
}

pub async fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Snapshot> {
    let values = store.read_slice(&[TAGS_SLICE, BOOKMARKS_SLICE]).await?;
    Ok(Snapshot {
        registry: values.get(TAGS_SLICE).map(decode_registry).unwrap_or_default(),
        associations: values
            .get(BOOKMARKS_SLICE)
            .map(decode_associations)
            .unwrap_or_default(),
    })
}

pub async fn save_registry<S: KeyValueStore + ?Sized>(store: &S, registry: &TagRegistry) -> Result<()> {
    let values = HashMap::from([(TAGS_SLICE.to_string(), serde_json::to_value(registry)?)]);
    store.write_slice(values).await
}

pub async fn save_associations<S: KeyValueStore + ?Sized>(
    store: &S,
    associations: &AssociationTable,
) -> Result<()> {
    let values = HashMap::from([(
        BOOKMARKS_SLICE.to_string(),
        serde_json::to_value(associations)?,
    )]);
    store.write_slice(values).await
}

/// Write both slices in a single store call.
pub async fn save<S: KeyValueStore + ?Sized>(store: &S, snapshot: &Snapshot) -> Result<()> {
    let values = HashMap::from([
        (TAGS_SLICE.to_string(), serde_json::to_value(&snapshot.registry)?),
        (
            BOOKMARKS_SLICE.to_string(),
            serde_json::to_value(&snapshot.associations)?,
        ),
    ]);
    store.write_slice(values).await
}

/// Decode the stored registry, skipping entries without a usable name.
///
/// Skipped entries are not carried anywhere: the next registry save writes
/// only the decoded tags, so invalid stored entries are erased by the first
/// mutation after they are read. A missing `createdAt` falls back to the time
/// embedded in a generated id, then the epoch; a missing `updatedAt` falls
/// back to `createdAt`.
pub fn decode_registry(value: &JsonValue) -> TagRegistry {
    let Some(entries) = value.as_object() else {
        warn!(
            subsystem = "db",
            component = "snapshot",
            slice = TAGS_SLICE,
            "Stored registry is not an object; treating as empty"
        );
        return TagRegistry::new();
    };

    let mut registry = TagRegistry::new();
    let mut skipped = 0usize;
    for (key, entry) in entries {
        match decode_tag(key, entry) {
            Some(tag) => {
                registry.insert(tag);
            }
            None => {
                skipped += 1;
                warn!(
                    subsystem = "db",
                    component = "snapshot",
                    slice = TAGS_SLICE,
                    tag_id = %key,
                    "Skipping invalid stored tag"
                );
            }
        }
    }
    debug!(
        subsystem = "db",
        component = "snapshot",
        slice = TAGS_SLICE,
        tag_count = registry.len(),
        skipped,
        "Registry decoded"
    );
    registry
}

fn decode_tag(key: &str, entry: &JsonValue) -> Option<Tag> {
    let obj = entry.as_object()?;
    let name = obj.get("name").and_then(JsonValue::as_str)?;
    if clean_label(name).is_empty() || key.is_empty() {
        return None;
    }

    let id = TagId::new(key);
    let created_at = timestamp(obj.get("createdAt"))
        .or_else(|| tag_id_timestamp(&id))
        .unwrap_or(DateTime::UNIX_EPOCH);
    Some(Tag {
        updated_at: timestamp(obj.get("updatedAt")).unwrap_or(created_at),
        created_at,
        id,
        name: name.to_string(),
        aliases: string_members(obj.get("aliases"))
            .filter(|a| !clean_label(a).is_empty())
            .collect(),
    })
}

pub fn decode_associations(value: &JsonValue) -> AssociationTable {
    let Some(entries) = value.as_object() else {
        warn!(
            subsystem = "db",
            component = "snapshot",
            slice = BOOKMARKS_SLICE,
            "Stored associations are not an object; treating as empty"
        );
        return AssociationTable::new();
    };

    let mut table = AssociationTable::new();
    let mut skipped = 0usize;
    for (bookmark_id, entry) in entries {
        let Some(obj) = entry.as_object() else {
            skipped += 1;
            warn!(
                subsystem = "db",
                component = "snapshot",
                slice = BOOKMARKS_SLICE,
                bookmark_id = %bookmark_id,
                "Skipping invalid stored association"
            );
            continue;
        };
        let ids = string_members(obj.get("tagIds")).map(TagId::new);
        table.set(
            bookmark_id.clone(),
            BookmarkTags::new(
                ids,
                timestamp(obj.get("updatedAt")).unwrap_or(DateTime::UNIX_EPOCH),
            ),
        );
    }
    debug!(
        subsystem = "db",
        component = "snapshot",
        slice = BOOKMARKS_SLICE,
        result_count = table.len(),
        skipped,
        "Associations decoded"
    );
    table
}

fn string_members(value: Option<&JsonValue>) -> impl Iterator<Item = String> + '_ {
    value
        .and_then(JsonValue::as_array)
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str().map(str::to_string))
}

fn timestamp(value: Option<&JsonValue>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_entry() {
        let registry = decode_registry(&json!({
            "tag_1": {
                "id": "tag_1",
                "name": "Rust",
                "aliases": ["rustlang"],
                "createdAt": 1_700_000_000_000i64,
                "updatedAt": 1_700_000_001_000i64
            }
        }));
        let tag = registry.get("tag_1").unwrap();
        assert_eq!(tag.name, "Rust");
        assert_eq!(tag.aliases, vec!["rustlang"]);
        assert_eq!(tag.created_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_decode_defaults_missing_fields() {
        let registry = decode_registry(&json!({ "tag_1": { "name": "Go" } }));
        let tag = registry.get("tag_1").unwrap();
        assert_eq!(tag.id.as_str(), "tag_1");
        assert!(tag.aliases.is_empty());
        assert_eq!(tag.created_at, DateTime::UNIX_EPOCH);
        assert_eq!(tag.updated_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_decode_takes_creation_time_from_generated_id() {
        let id = tagpilot_core::new_tag_id();
        let expected = tag_id_timestamp(&id).unwrap();
        let mut entries = serde_json::Map::new();
        entries.insert(id.to_string(), json!({ "name": "Zig" }));
        let registry = decode_registry(&JsonValue::Object(entries));

        let tag = registry.get(id.as_str()).unwrap();
        assert_eq!(tag.created_at, expected);
        assert_eq!(tag.updated_at, expected);
    }

    #[test]
    fn test_decode_skips_invalid_entries() {
        let registry = decode_registry(&json!({
            "tag_1": { "name": "Go" },
            "tag_2": { "name": "   " },
            "tag_3": { "aliases": ["x"] },
            "tag_4": "not an object",
            "tag_5": { "name": 42 }
        }));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("tag_1"));
    }

    #[test]
    fn test_decode_key_wins_over_embedded_id() {
        let registry = decode_registry(&json!({ "tag_1": { "id": "tag_9", "name": "Go" } }));
        assert!(registry.contains("tag_1"));
        assert!(!registry.contains("tag_9"));
    }

    #[test]
    fn test_decode_drops_non_string_aliases() {
        let registry = decode_registry(&json!({
            "tag_1": { "name": "Go", "aliases": ["golang", 7, null, ""] }
        }));
        assert_eq!(registry.get("tag_1").unwrap().aliases, vec!["golang"]);
    }

    #[test]
    fn test_decode_non_object_registry() {
        assert!(decode_registry(&json!([1, 2])).is_empty());
        assert!(decode_associations(&json!("x")).is_empty());
    }

    #[test]
    fn test_decode_associations_dedupes() {
        let table = decode_associations(&json!({
            "b1": { "tagIds": ["t1", "t2", "t1"], "updatedAt": 5 },
            "b2": {},
            "b3": 12
        }));
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get("b1").unwrap().tag_ids,
            vec![TagId::from("t1"), TagId::from("t2")]
        );
        assert!(table.get("b2").unwrap().tag_ids.is_empty());
    }

    #[test]
    fn test_encoded_registry_uses_stored_field_names() {
        let registry: TagRegistry = [Tag::new(TagId::from("t1"), "Rust", DateTime::UNIX_EPOCH)]
            .into_iter()
            .collect();
        let value = serde_json::to_value(&registry).unwrap();
        assert_eq!(value["t1"]["createdAt"], 0);
        assert_eq!(value["t1"]["aliases"], json!([]));
        assert_eq!(decode_registry(&value), registry);
    }
}
