//! Uncoordinated concurrent creation against one shared store.
//!
//! Both callers read the registry before either writes, so the second write
//! replaces the first: both report a new tag but only one survives.

use std::sync::Arc;

use tagpilot_db::test_fixtures::YieldingStore;
use tagpilot_db::{snapshot, KvTagRepository, MemoryStore, ResolveOptions, TagRepository};

#[tokio::test]
async fn test_concurrent_creation_loses_an_update() {
    let store = Arc::new(YieldingStore::new(MemoryStore::new()));
    let repo = KvTagRepository::new(Arc::clone(&store));

    let (first, second) = tokio::join!(
        repo.resolve("Rust", ResolveOptions::create()),
        repo.resolve("Rust", ResolveOptions::create()),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert!(first.is_new);
    assert!(second.is_new);
    assert_ne!(first.tag_id, second.tag_id);

    let registry = snapshot::load_registry(store.inner()).await.unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(store.writes(), 2);
}

#[tokio::test]
async fn test_lost_tag_leaves_dangling_reference_until_pruned() {
    let store = Arc::new(YieldingStore::new(MemoryStore::new()));
    let repo = KvTagRepository::new(Arc::clone(&store));

    let (first, second) = tokio::join!(
        repo.resolve("Rust", ResolveOptions::create()),
        repo.resolve("Rust", ResolveOptions::create()),
    );
    let ids = [first.unwrap().tag_id.unwrap(), second.unwrap().tag_id.unwrap()];

    // A caller that kept both ids attaches them to a bookmark.
    let mut associations = snapshot::load_associations(store.inner()).await.unwrap();
    associations.set(
        "b1",
        tagpilot_db::BookmarkTags::new(ids.iter().cloned(), chrono::Utc::now()),
    );
    snapshot::save_associations(store.inner(), &associations)
        .await
        .unwrap();

    assert_eq!(repo.bookmark_tags("b1").await.unwrap().len(), 1);
    assert_eq!(repo.prune_dangling().await.unwrap(), 1);
    assert_eq!(repo.prune_dangling().await.unwrap(), 0);
}

#[tokio::test]
async fn test_sequential_creation_is_consistent() {
    let store = Arc::new(YieldingStore::new(MemoryStore::new()));
    let repo = KvTagRepository::new(Arc::clone(&store));

    let first = repo.resolve("Rust", ResolveOptions::create()).await.unwrap();
    let second = repo.resolve("Rust", ResolveOptions::create()).await.unwrap();

    assert!(first.is_new);
    assert!(!second.is_new);
    assert_eq!(first.tag_id, second.tag_id);
    assert!(store.reads() >= 2);
}
