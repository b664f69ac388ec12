//! Bookmark to tag associations.

use chrono::Utc;
use tracing::{debug, info, instrument};

use tagpilot_core::{BookmarkTags, Error, KeyValueStore, ResolveOptions, Result, Tag, TagId};
use tagpilot_search::clean_label;

use crate::{resolver, snapshot};

fn require_bookmark_id(bookmark_id: &str) -> Result<()> {
    if bookmark_id.trim().is_empty() {
        return Err(Error::InvalidInput("bookmark id is empty".to_string()));
    }
    Ok(())
}

/// Resolve labels with creation enabled; blank and rejected labels drop out.
async fn resolve_labels<S: KeyValueStore + ?Sized>(
    store: &S,
    labels: &[String],
    max_similar: usize,
) -> Result<Vec<TagId>> {
    let options = ResolveOptions::create().with_skip_similar(true);
    let mut ids: Vec<TagId> = Vec::new();
    for label in labels {
        if clean_label(label).is_empty() {
            continue;
        }
        let resolution = resolver::resolve(store, label, options, max_similar).await?;
        if let Some(id) = resolution.tag_id {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}

#[instrument(skip_all, fields(subsystem = "db", component = "bookmarks", op = "set_bookmark_tags", bookmark_id = %bookmark_id))]
pub async fn set_bookmark_tags<S: KeyValueStore + ?Sized>(
    store: &S,
    bookmark_id: &str,
    labels: &[String],
    max_similar: usize,
) -> Result<Vec<TagId>> {
    require_bookmark_id(bookmark_id)?;
    let ids = resolve_labels(store, labels, max_similar).await?;

    let mut associations = snapshot::load_associations(store).await?;
    associations.set(bookmark_id, BookmarkTags::new(ids.clone(), Utc::now()));
    snapshot::save_associations(store, &associations).await?;

    info!(tag_count = ids.len(), "Bookmark tags replaced");
    Ok(ids)
}

#[instrument(skip_all, fields(subsystem = "db", component = "bookmarks", op = "add_tags_to_bookmark", bookmark_id = %bookmark_id))]
pub async fn add_tags_to_bookmark<S: KeyValueStore + ?Sized>(
    store: &S,
    bookmark_id: &str,
    labels: &[String],
    max_similar: usize,
) -> Result<Vec<TagId>> {
    require_bookmark_id(bookmark_id)?;
    let added = resolve_labels(store, labels, max_similar).await?;

    let mut associations = snapshot::load_associations(store).await?;
    let existing = associations
        .get(bookmark_id)
        .map(|meta| meta.tag_ids.clone())
        .unwrap_or_default();
    let meta = BookmarkTags::new(existing.into_iter().chain(added), Utc::now());
    let ids = meta.tag_ids.clone();
    associations.set(bookmark_id, meta);
    snapshot::save_associations(store, &associations).await?;

    info!(tag_count = ids.len(), "Bookmark tags extended");
    Ok(ids)
}

/// Tags of a bookmark in association order; ids missing from the registry are skipped.
pub async fn bookmark_tags<S: KeyValueStore + ?Sized>(store: &S, bookmark_id: &str) -> Result<Vec<Tag>> {
    let snap = snapshot::load(store).await?;
    let Some(meta) = snap.associations.get(bookmark_id) else {
        return Ok(Vec::new());
    };
    Ok(meta
        .tag_ids
        .iter()
        .filter_map(|id| snap.registry.get(id.as_str()).cloned())
        .collect())
}

#[instrument(skip_all, fields(subsystem = "db", component = "bookmarks", op = "remove_bookmark", bookmark_id = %bookmark_id))]
pub async fn remove_bookmark<S: KeyValueStore + ?Sized>(store: &S, bookmark_id: &str) -> Result<bool> {
    let mut associations = snapshot::load_associations(store).await?;
    if associations.remove(bookmark_id).is_none() {
        debug!("No association to remove");
        return Ok(false);
    }
    snapshot::save_associations(store, &associations).await?;
    info!("Bookmark association removed");
    Ok(true)
}
