//! Registry mutators: merge, rename, delete, alias, and vocabulary repair.
//!
//! Each operation is split in two. `apply_*` functions mutate an in-memory
//! [`Snapshot`] and are synchronous; the async wrappers load the snapshot,
//! apply, and persist every changed slice in a single store write.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use tagpilot_core::{
    AliasOutcome, DeleteOutcome, Error, KeyValueStore, MergeOutcome, RenameOutcome, Result, TagId,
    TagRegistry,
};
use tagpilot_search::{clean_label, lookup_key, TagIndex};

use crate::snapshot::{self, Snapshot};

// =============================================================================
// IN-MEMORY OPERATIONS
// =============================================================================

/// Fold `source` into `target`: union aliases, repoint associations, drop `source`.
pub fn apply_merge(
    snap: &mut Snapshot,
    source: &TagId,
    target: &TagId,
    now: DateTime<Utc>,
) -> Result<MergeOutcome> {
    if source == target {
        return Err(Error::InvalidInput(format!(
            "cannot merge tag {source} into itself"
        )));
    }
    let source_tag = snap
        .registry
        .get(source.as_str())
        .cloned()
        .ok_or_else(|| Error::TagNotFound(source.clone()))?;
    let target_tag = snap
        .registry
        .get_mut(target.as_str())
        .ok_or_else(|| Error::TagNotFound(target.clone()))?;

    for alias in source_tag.aliases {
        if !target_tag.aliases.contains(&alias) {
            target_tag.aliases.push(alias);
        }
    }
    target_tag.updated_at = now;
    let target_name = target_tag.name.clone();

    let affected_count = snap.associations.replace_tag(source, target, now);
    snap.registry.remove(source.as_str());

    Ok(MergeOutcome {
        affected_count,
        source_name: source_tag.name,
        target_name,
    })
}

/// Rename in place, or merge into the tag the new name already identifies.
pub fn apply_rename(
    snap: &mut Snapshot,
    tag_id: &TagId,
    new_name: &str,
    now: DateTime<Utc>,
) -> Result<RenameOutcome> {
    let cleaned = clean_label(new_name);
    if cleaned.is_empty() {
        return Err(Error::InvalidInput("tag name is empty".to_string()));
    }
    if !snap.registry.contains(tag_id.as_str()) {
        return Err(Error::TagNotFound(tag_id.clone()));
    }

    let other = TagIndex::build(&snap.registry)
        .exact_lookup_other(&cleaned, tag_id)
        .cloned();
    if let Some(other) = other {
        debug!(tag_id = %tag_id, target_id = %other, "Rename target exists; merging");
        return apply_merge(snap, tag_id, &other, now).map(RenameOutcome::Merged);
    }

    let tag = snap
        .registry
        .get_mut(tag_id.as_str())
        .ok_or_else(|| Error::TagNotFound(tag_id.clone()))?;
    if tag.name == cleaned {
        return Ok(RenameOutcome::Unchanged);
    }
    tag.name = cleaned;
    tag.updated_at = now;
    Ok(RenameOutcome::Renamed)
}

/// Remove a tag and every reference to it.
pub fn apply_delete(snap: &mut Snapshot, tag_id: &TagId, now: DateTime<Utc>) -> Result<DeleteOutcome> {
    let tag = snap
        .registry
        .remove(tag_id.as_str())
        .ok_or_else(|| Error::TagNotFound(tag_id.clone()))?;
    let affected_count = snap.associations.remove_tag(tag_id, now);
    Ok(DeleteOutcome {
        affected_count,
        tag_name: tag.name,
    })
}

/// Attach an alias unless its lookup key is already the tag's.
pub fn apply_add_alias(
    registry: &mut TagRegistry,
    tag_id: &TagId,
    alias: &str,
    now: DateTime<Utc>,
) -> Result<AliasOutcome> {
    let cleaned = clean_label(alias);
    if cleaned.is_empty() {
        return Err(Error::InvalidInput("alias is empty".to_string()));
    }
    let tag = registry
        .get(tag_id.as_str())
        .ok_or_else(|| Error::TagNotFound(tag_id.clone()))?;

    let key = lookup_key(&cleaned);
    let already_present = lookup_key(&tag.name) == key
        || tag.aliases.iter().any(|a| lookup_key(a) == key);
    if already_present {
        return Ok(AliasOutcome::AlreadyPresent);
    }

    let owner = TagIndex::build(registry)
        .exact_lookup_other(&cleaned, tag_id)
        .cloned();
    if let Some(existing) = owner {
        return Err(Error::AliasConflict {
            alias: cleaned,
            existing,
        });
    }

    let tag = registry
        .get_mut(tag_id.as_str())
        .ok_or_else(|| Error::TagNotFound(tag_id.clone()))?;
    tag.aliases.push(cleaned);
    tag.updated_at = now;
    Ok(AliasOutcome::Added)
}

/// Merge every group of key-sharing tags into its earliest-created member.
///
/// Groups are recomputed after each merge, since a merged alias set can
/// expose further collisions.
pub fn apply_repair_duplicates(snap: &mut Snapshot, now: DateTime<Utc>) -> Result<Vec<MergeOutcome>> {
    let mut outcomes = Vec::new();
    loop {
        let Some(group) = TagIndex::build(&snap.registry)
            .duplicate_groups()
            .into_iter()
            .next()
        else {
            break;
        };

        let target = group
            .tag_ids
            .iter()
            .filter_map(|id| snap.registry.get(id.as_str()))
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .map(|t| t.id.clone());
        let Some(target) = target else {
            break;
        };

        for source in group.tag_ids.iter().filter(|id| **id != target) {
            if snap.registry.contains(source.as_str()) {
                outcomes.push(apply_merge(snap, source, &target, now)?);
            }
        }
    }
    Ok(outcomes)
}

/// Drop association references to tags the registry does not hold.
pub fn apply_prune_dangling(snap: &mut Snapshot, now: DateTime<Utc>) -> usize {
    let registry = &snap.registry;
    snap.associations
        .retain_tags(|id| registry.contains(id.as_str()), now)
}

// =============================================================================
// PERSISTED OPERATIONS
// =============================================================================

#[instrument(skip_all, fields(subsystem = "db", component = "mutators", op = "merge", source_id = %source, target_id = %target))]
pub async fn merge<S: KeyValueStore + ?Sized>(
    store: &S,
    source: &TagId,
    target: &TagId,
) -> Result<MergeOutcome> {
    let mut snap = snapshot::load(store).await?;
    let outcome = apply_merge(&mut snap, source, target, Utc::now())?;
    snapshot::save(store, &snap).await?;

    info!(
        affected_count = outcome.affected_count,
        source_name = %outcome.source_name,
        target_name = %outcome.target_name,
        "Tags merged"
    );
    Ok(outcome)
}

#[instrument(skip_all, fields(subsystem = "db", component = "mutators", op = "rename", tag_id = %tag_id))]
pub async fn rename<S: KeyValueStore + ?Sized>(
    store: &S,
    tag_id: &TagId,
    new_name: &str,
) -> Result<RenameOutcome> {
    let mut snap = snapshot::load(store).await?;
    let outcome = apply_rename(&mut snap, tag_id, new_name, Utc::now())?;

    match &outcome {
        RenameOutcome::Renamed => {
            snapshot::save_registry(store, &snap.registry).await?;
            info!(label = %clean_label(new_name), "Tag renamed");
        }
        RenameOutcome::Merged(merge) => {
            snapshot::save(store, &snap).await?;
            info!(
                affected_count = merge.affected_count,
                target_name = %merge.target_name,
                "Tag renamed into existing tag"
            );
        }
        RenameOutcome::Unchanged => debug!("Rename is a no-op"),
    }
    Ok(outcome)
}

#[instrument(skip_all, fields(subsystem = "db", component = "mutators", op = "delete", tag_id = %tag_id))]
pub async fn delete<S: KeyValueStore + ?Sized>(store: &S, tag_id: &TagId) -> Result<DeleteOutcome> {
    let mut snap = snapshot::load(store).await?;
    let outcome = apply_delete(&mut snap, tag_id, Utc::now())?;
    snapshot::save(store, &snap).await?;

    info!(
        affected_count = outcome.affected_count,
        tag_name = %outcome.tag_name,
        "Tag deleted"
    );
    Ok(outcome)
}

#[instrument(skip_all, fields(subsystem = "db", component = "mutators", op = "add_alias", tag_id = %tag_id))]
pub async fn add_alias<S: KeyValueStore + ?Sized>(
    store: &S,
    tag_id: &TagId,
    alias: &str,
) -> Result<AliasOutcome> {
    let mut registry = snapshot::load_registry(store).await?;
    let outcome = apply_add_alias(&mut registry, tag_id, alias, Utc::now())?;
    if outcome == AliasOutcome::Added {
        snapshot::save_registry(store, &registry).await?;
        info!(label = %clean_label(alias), "Alias added");
    }
    Ok(outcome)
}

#[instrument(skip_all, fields(subsystem = "db", component = "mutators", op = "repair_duplicates"))]
pub async fn repair_duplicates<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<MergeOutcome>> {
    let mut snap = snapshot::load(store).await?;
    let outcomes = apply_repair_duplicates(&mut snap, Utc::now())?;
    if outcomes.is_empty() {
        debug!("No duplicate tags");
        return Ok(outcomes);
    }
    snapshot::save(store, &snap).await?;

    for outcome in &outcomes {
        warn!(
            source_name = %outcome.source_name,
            target_name = %outcome.target_name,
            affected_count = outcome.affected_count,
            "Duplicate tag merged"
        );
    }
    info!(result_count = outcomes.len(), "Duplicates repaired");
    Ok(outcomes)
}

#[instrument(skip_all, fields(subsystem = "db", component = "mutators", op = "prune_dangling"))]
pub async fn prune_dangling<S: KeyValueStore + ?Sized>(store: &S) -> Result<usize> {
    let mut snap = snapshot::load(store).await?;
    let removed = apply_prune_dangling(&mut snap, Utc::now());
    if removed > 0 {
        snapshot::save_associations(store, &snap.associations).await?;
        info!(result_count = removed, "Dangling references pruned");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{bookmark, tag, tag_at, ts};

    fn snapshot_of(tags: Vec<tagpilot_core::Tag>) -> Snapshot {
        Snapshot {
            registry: tags.into_iter().collect(),
            associations: Default::default(),
        }
    }

    #[test]
    fn test_merge_unions_aliases_without_repeats() {
        let mut snap = snapshot_of(vec![
            tag("a", "JS").with_aliases(["js", "ecmascript"]),
            tag("b", "JavaScript").with_aliases(["js"]),
        ]);
        let outcome = apply_merge(&mut snap, &"a".into(), &"b".into(), ts(10)).unwrap();

        assert_eq!(outcome.source_name, "JS");
        assert_eq!(outcome.target_name, "JavaScript");
        let target = snap.registry.get("b").unwrap();
        assert_eq!(target.aliases, vec!["js", "ecmascript"]);
        assert_eq!(target.updated_at, ts(10));
        assert!(!snap.registry.contains("a"));
    }

    #[test]
    fn test_merge_into_self_is_invalid() {
        let mut snap = snapshot_of(vec![tag("a", "Rust")]);
        let err = apply_merge(&mut snap, &"a".into(), &"a".into(), ts(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(snap.registry.contains("a"));
    }

    #[test]
    fn test_merge_missing_tags() {
        let mut snap = snapshot_of(vec![tag("a", "Rust")]);
        let err = apply_merge(&mut snap, &"a".into(), &"zz".into(), ts(1)).unwrap_err();
        assert_eq!(err.to_string(), "tag not found: zz");
        let err = apply_merge(&mut snap, &"zz".into(), &"a".into(), ts(1)).unwrap_err();
        assert!(matches!(err, Error::TagNotFound(id) if id.as_str() == "zz"));
    }

    #[test]
    fn test_rename_checks_empty_name_first() {
        let mut snap = snapshot_of(vec![]);
        let err = apply_rename(&mut snap, &"missing".into(), " \u{200B}", ts(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_rename_same_name_is_unchanged() {
        let mut snap = snapshot_of(vec![tag("a", "Rust")]);
        let outcome = apply_rename(&mut snap, &"a".into(), "  Rust ", ts(5)).unwrap();
        assert_eq!(outcome, RenameOutcome::Unchanged);
        assert_eq!(snap.registry.get("a").unwrap().updated_at, ts(0));
    }

    #[test]
    fn test_rename_case_change_is_renamed() {
        let mut snap = snapshot_of(vec![tag("a", "rust")]);
        let outcome = apply_rename(&mut snap, &"a".into(), "Rust", ts(5)).unwrap();
        assert_eq!(outcome, RenameOutcome::Renamed);
        let tag = snap.registry.get("a").unwrap();
        assert_eq!(tag.name, "Rust");
        assert_eq!(tag.updated_at, ts(5));
    }

    #[test]
    fn test_rename_onto_own_alias_is_renamed() {
        let mut snap = snapshot_of(vec![tag("a", "Kubernetes").with_aliases(["K8s"])]);
        let outcome = apply_rename(&mut snap, &"a".into(), "K8s", ts(5)).unwrap();
        assert_eq!(outcome, RenameOutcome::Renamed);
    }

    #[test]
    fn test_rename_onto_other_tag_merges() {
        let mut snap = snapshot_of(vec![tag("a", "ReactJS"), tag("b", "React")]);
        snap.associations.set("b1", bookmark(["a"]));

        let outcome = apply_rename(&mut snap, &"a".into(), "react", ts(5)).unwrap();
        match outcome {
            RenameOutcome::Merged(merge) => {
                assert_eq!(merge.affected_count, 1);
                assert_eq!(merge.target_name, "React");
            }
            other => panic!("expected merge, got {other:?}"),
        }
        assert!(!snap.registry.contains("a"));
        assert_eq!(
            snap.associations.get("b1").unwrap().tag_ids,
            vec![TagId::from("b")]
        );
    }

    #[test]
    fn test_rename_merges_on_compact_key_past_own_alias() {
        // "dock er" is a's alias; its compact key belongs to b.
        let mut snap = snapshot_of(vec![
            tag("a", "Foo").with_aliases(["dock er"]),
            tag("b", "Docker"),
        ]);

        let outcome = apply_rename(&mut snap, &"a".into(), "Dock Er", ts(5)).unwrap();
        match outcome {
            RenameOutcome::Merged(merge) => assert_eq!(merge.target_name, "Docker"),
            other => panic!("expected merge, got {other:?}"),
        }
        assert!(!snap.registry.contains("a"));
    }

    #[test]
    fn test_delete_reports_name_and_affected() {
        let mut snap = snapshot_of(vec![tag("a", "Rust"), tag("b", "Go")]);
        snap.associations.set("b1", bookmark(["a", "b"]));
        snap.associations.set("b2", bookmark(["b"]));

        let outcome = apply_delete(&mut snap, &"a".into(), ts(3)).unwrap();
        assert_eq!(outcome.tag_name, "Rust");
        assert_eq!(outcome.affected_count, 1);
        assert!(apply_delete(&mut snap, &"a".into(), ts(3)).is_err());
    }

    #[test]
    fn test_add_alias_compares_lookup_keys() {
        let mut registry: TagRegistry =
            [tag("a", "Machine Learning").with_aliases(["ML"])].into_iter().collect();

        let id = TagId::from("a");
        assert_eq!(
            apply_add_alias(&mut registry, &id, "machine-learning", ts(1)).unwrap(),
            AliasOutcome::AlreadyPresent
        );
        assert_eq!(
            apply_add_alias(&mut registry, &id, " ml ", ts(1)).unwrap(),
            AliasOutcome::AlreadyPresent
        );
        assert_eq!(
            apply_add_alias(&mut registry, &id, "机器学习", ts(2)).unwrap(),
            AliasOutcome::Added
        );
        let tag = registry.get("a").unwrap();
        assert_eq!(tag.aliases, vec!["ML", "机器学习"]);
        assert_eq!(tag.updated_at, ts(2));
    }

    #[test]
    fn test_add_alias_conflict_with_other_tag() {
        let mut registry: TagRegistry = [tag("a", "Go"), tag("b", "Golang")].into_iter().collect();
        let err = apply_add_alias(&mut registry, &"a".into(), "golang", ts(1)).unwrap_err();
        match err {
            Error::AliasConflict { alias, existing } => {
                assert_eq!(alias, "golang");
                assert_eq!(existing.as_str(), "b");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_add_alias_rejects_blank() {
        let mut registry: TagRegistry = [tag("a", "Go")].into_iter().collect();
        assert!(matches!(
            apply_add_alias(&mut registry, &"a".into(), "   ", ts(1)),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            apply_add_alias(&mut registry, &"zz".into(), "x1", ts(1)),
            Err(Error::TagNotFound(_))
        ));
    }

    #[test]
    fn test_repair_merges_into_earliest() {
        let mut snap = snapshot_of(vec![
            tag_at("z_first", "Node.js", 1),
            tag_at("a_second", "nodejs", 2),
            tag_at("m_third", "NODEJS", 3),
            tag("k", "Rust"),
        ]);
        snap.associations.set("b1", bookmark(["a_second", "m_third"]));

        let outcomes = apply_repair_duplicates(&mut snap, ts(9)).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.target_name == "Node.js"));
        assert_eq!(snap.registry.len(), 2);
        assert_eq!(
            snap.associations.get("b1").unwrap().tag_ids,
            vec![TagId::from("z_first")]
        );
        assert!(apply_repair_duplicates(&mut snap, ts(9)).unwrap().is_empty());
    }

    #[test]
    fn test_prune_dangling() {
        let mut snap = snapshot_of(vec![tag("a", "Rust")]);
        snap.associations.set("b1", bookmark(["a", "ghost"]));
        snap.associations.set("b2", bookmark(["ghost", "ghost2"]));

        assert_eq!(apply_prune_dangling(&mut snap, ts(4)), 3);
        assert_eq!(
            snap.associations.get("b1").unwrap().tag_ids,
            vec![TagId::from("a")]
        );
        assert!(snap.associations.get("b2").unwrap().tag_ids.is_empty());
        assert_eq!(apply_prune_dangling(&mut snap, ts(5)), 0);
    }
}
