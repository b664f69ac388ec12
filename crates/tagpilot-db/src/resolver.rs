//! Label to tag identity resolution.
//!
//! Every tag creation goes through [`resolve`]: clean and bound-check the
//! label, try an exact key match, gather similar candidates on a miss, and
//! only then create. Creation is a read-modify-write of the whole registry
//! slice with no coordination; two uncoordinated callers can lose an update.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument};

use tagpilot_core::{
    new_tag_id, BatchResolution, BatchStats, KeyValueStore, Resolution, ResolveOptions, Result,
    SimilarGroup, Tag,
};
use tagpilot_search::{canonicalize, clean_label, is_length_ok, TagIndex};

use crate::snapshot;

/// Cleaned (and optionally canonicalized) label, or `None` when resolution
/// must reject it.
pub fn prepare_label(label: &str, options: ResolveOptions) -> Option<String> {
    let mut cleaned = clean_label(label);
    if options.canonicalize && !cleaned.is_empty() {
        cleaned = canonicalize(&cleaned);
    }
    is_length_ok(&cleaned).then_some(cleaned)
}

#[instrument(skip(store, options), fields(subsystem = "db", component = "resolver", op = "resolve"))]
pub async fn resolve<S: KeyValueStore + ?Sized>(
    store: &S,
    label: &str,
    options: ResolveOptions,
    max_similar: usize,
) -> Result<Resolution> {
    let Some(cleaned) = prepare_label(label, options) else {
        debug!(label, "Label rejected");
        return Ok(Resolution::rejected());
    };

    let mut registry = snapshot::load_registry(store).await?;

    let similar = {
        let index = TagIndex::build(&registry);
        if let Some(id) = index.exact_lookup(&cleaned) {
            debug!(label = %cleaned, tag_id = %id, "Exact match");
            return Ok(Resolution {
                tag_id: Some(id.clone()),
                is_new: false,
                similar: Vec::new(),
            });
        }
        if options.skip_similar_check {
            Vec::new()
        } else {
            index.find_similar(&cleaned, max_similar)
        }
    };

    if !options.create_if_not_found {
        debug!(label = %cleaned, result_count = similar.len(), "No exact match; not creating");
        return Ok(Resolution {
            tag_id: None,
            is_new: false,
            similar,
        });
    }

    let tag = Tag::new(new_tag_id(), cleaned, Utc::now());
    let tag_id = tag.id.clone();
    registry.insert(tag);
    snapshot::save_registry(store, &registry).await?;

    info!(
        tag_id = %tag_id,
        result_count = similar.len(),
        "Tag created"
    );
    Ok(Resolution {
        tag_id: Some(tag_id),
        is_new: true,
        similar,
    })
}

/// Resolve each label in order. Ids of resolved labels keep input order,
/// repeats included.
#[instrument(skip(store, labels, options), fields(subsystem = "db", component = "resolver", op = "resolve_batch", total = labels.len()))]
pub async fn resolve_batch<S: KeyValueStore + ?Sized>(
    store: &S,
    labels: &[String],
    options: ResolveOptions,
    max_similar: usize,
) -> Result<BatchResolution> {
    let start = Instant::now();
    let mut batch = BatchResolution {
        stats: BatchStats {
            total: labels.len(),
            ..BatchStats::default()
        },
        ..BatchResolution::default()
    };

    for label in labels {
        let resolution = resolve(store, label, options, max_similar).await?;
        if let Some(id) = resolution.tag_id {
            if resolution.is_new {
                batch.stats.created += 1;
            } else {
                batch.stats.reused += 1;
            }
            batch.tag_ids.push(id);
        }
        if !resolution.similar.is_empty() {
            batch.similar_info.push(SimilarGroup {
                label: label.clone(),
                similar: resolution.similar.into_iter().map(|t| t.name).collect(),
            });
        }
    }
    batch.stats.similar_groups = batch.similar_info.len();

    debug!(
        created = batch.stats.created,
        reused = batch.stats.reused,
        similar_groups = batch.stats.similar_groups,
        duration_ms = start.elapsed().as_millis() as u64,
        "Batch resolved"
    );
    Ok(batch)
}
