//! Bookmark associations, vocabulary stats, and duplicate repair, persisted
//! through the JSON file store.

use tagpilot_db::test_fixtures::{bookmark, seed, tag, tag_at};
use tagpilot_db::{Error, JsonFileStore, KvTagRepository, MemoryStore, TagId, TagRepository};
use tempfile::TempDir;

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn file_repo(dir: &TempDir) -> KvTagRepository<JsonFileStore> {
    KvTagRepository::new(JsonFileStore::new(dir.path().join("store.json")))
}

// ========== ASSOCIATIONS ==========

#[tokio::test]
async fn test_set_bookmark_tags_resolves_and_dedupes() {
    let dir = tempfile::tempdir().unwrap();
    let repo = file_repo(&dir);

    let ids = repo
        .set_bookmark_tags("b1", &labels(&["Rust", " ", "rust", "Tokio", "云"]))
        .await
        .unwrap();
    assert_eq!(ids.len(), 2);

    let names: Vec<_> = repo
        .bookmark_tags("b1")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["Rust", "Tokio"]);
}

#[tokio::test]
async fn test_set_bookmark_tags_overwrites() {
    let repo = KvTagRepository::new(MemoryStore::new());
    repo.set_bookmark_tags("b1", &labels(&["Rust", "Tokio"])).await.unwrap();
    let ids = repo.set_bookmark_tags("b1", &labels(&["Go"])).await.unwrap();

    let tags = repo.bookmark_tags("b1").await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].id, ids[0]);
}

#[tokio::test]
async fn test_add_tags_unions_with_existing() {
    let repo = KvTagRepository::new(MemoryStore::new());
    let first = repo.set_bookmark_tags("b1", &labels(&["Rust"])).await.unwrap();
    let all = repo
        .add_tags_to_bookmark("b1", &labels(&["RUST", "Axum"]))
        .await
        .unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(all[0], first[0]);
}

#[tokio::test]
async fn test_blank_bookmark_id_is_invalid() {
    let repo = KvTagRepository::new(MemoryStore::new());
    assert!(matches!(
        repo.set_bookmark_tags("  ", &labels(&["Rust"])).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        repo.add_tags_to_bookmark("", &labels(&["Rust"])).await,
        Err(Error::InvalidInput(_))
    ));
    // Nothing was created for the rejected call.
    assert_eq!(repo.stats(10).await.unwrap().total_tags, 0);
}

#[tokio::test]
async fn test_remove_bookmark() {
    let repo = KvTagRepository::new(MemoryStore::new());
    repo.set_bookmark_tags("b1", &labels(&["Rust"])).await.unwrap();

    assert!(repo.remove_bookmark("b1").await.unwrap());
    assert!(!repo.remove_bookmark("b1").await.unwrap());
    assert!(repo.bookmark_tags("b1").await.unwrap().is_empty());
    // The tag itself stays in the vocabulary.
    assert_eq!(repo.stats(10).await.unwrap().total_tags, 1);
}

// ========== STATS ==========

#[tokio::test]
async fn test_usage_and_stats() {
    let store = MemoryStore::new();
    seed(
        &store,
        vec![tag("a", "Rust"), tag("b", "Go"), tag("c", "Zig"), tag("d", "Ada")],
        vec![
            ("b1", bookmark(["a", "b"])),
            ("b2", bookmark(["a", "c"])),
            ("b3", bookmark(["b"])),
            ("b4", bookmark([])),
        ],
    )
    .await
    .unwrap();
    let repo = KvTagRepository::new(store);

    let usage = repo.tag_usage().await.unwrap();
    let ranked: Vec<_> = usage.iter().map(|u| (u.tag.name.as_str(), u.count)).collect();
    assert_eq!(ranked, vec![("Go", 2), ("Rust", 2), ("Zig", 1), ("Ada", 0)]);

    let stats = repo.stats(2).await.unwrap();
    assert_eq!(stats.total_tags, 4);
    assert_eq!(stats.tagged_bookmarks, 3);
    assert_eq!(stats.referenced_tags, 3);
    assert_eq!(stats.top_tags.len(), 2);
    assert_eq!(stats.top_tags[0].tag.name, "Go");
}

// ========== HEALTH ==========

#[tokio::test]
async fn test_find_and_repair_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let repo = file_repo(&dir);
    seed(
        repo.store(),
        vec![
            tag_at("t_late", "nodejs", 200),
            tag_at("t_early", "Node.js", 100),
            tag_at("t_other", "Deno", 50),
        ],
        vec![("b1", bookmark(["t_late"])), ("b2", bookmark(["t_early", "t_late"]))],
    )
    .await
    .unwrap();

    let groups = repo.find_duplicates().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, "nodejs");

    let outcomes = repo.repair_duplicates().await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].source_name, "nodejs");
    assert_eq!(outcomes[0].target_name, "Node.js");
    assert_eq!(outcomes[0].affected_count, 2);

    assert!(repo.find_duplicates().await.unwrap().is_empty());
    for bookmark_id in ["b1", "b2"] {
        let tags = repo.bookmark_tags(bookmark_id).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].id, TagId::from("t_early"));
    }
}

#[tokio::test]
async fn test_state_survives_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let created = {
        let repo = file_repo(&dir);
        repo.set_bookmark_tags("b1", &labels(&["Kubernetes"])).await.unwrap()
    };

    let reopened = file_repo(&dir);
    let tags = reopened.bookmark_tags("b1").await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].id, created[0]);
    assert_eq!(tags[0].name, "Kubernetes");
}

#[tokio::test]
async fn test_legacy_entries_load_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("store.json"),
        r#"{
            "tagsById": {
                "tag_1700000000000_abc123xyz": { "name": "Rust" },
                "tag_broken": { "aliases": ["no name"] }
            },
            "bookmarkMeta": {
                "42": { "tagIds": ["tag_1700000000000_abc123xyz", "tag_broken"] }
            }
        }"#,
    )
    .unwrap();
    let repo = file_repo(&dir);

    assert_eq!(repo.stats(10).await.unwrap().total_tags, 1);
    assert_eq!(repo.bookmark_tags("42").await.unwrap().len(), 1);
    assert_eq!(repo.prune_dangling().await.unwrap(), 1);
}
