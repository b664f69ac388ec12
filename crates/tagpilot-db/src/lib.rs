//! # tagpilot-db
//!
//! Persistence and repository layer for the TagPilot tag identity engine.
//!
//! This crate provides:
//! - Key-value stores: in-memory and atomic JSON file
//! - Validated snapshots of the `tagsById` and `bookmarkMeta` slices
//! - The resolver, the single entry point for tag creation
//! - Registry mutators (merge, rename, delete, alias) with bookmark cascades
//! - Vocabulary queries and repair (usage, stats, duplicates, dangling ids)
//! - [`KvTagRepository`], tying it together behind the `TagRepository` trait
//!
//! ## Example
//!
//! ```rust,ignore
//! use tagpilot_db::{JsonFileStore, KvTagRepository, ResolveOptions, TagRepository};
//!
//! let repo = KvTagRepository::new(JsonFileStore::new("tagpilot-store.json"));
//!
//! let created = repo.resolve("Kubernetes", ResolveOptions::create()).await?;
//! assert!(created.is_new);
//!
//! let again = repo.resolve("k8s", ResolveOptions::lookup()).await?;
//! println!("similar: {:?}", again.similar);
//! ```

pub mod bookmarks;
pub mod file_store;
pub mod memory_store;
pub mod mutators;
pub mod repository;
pub mod resolver;
pub mod snapshot;
pub mod vocabulary;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use them
pub mod test_fixtures;

// Re-export core types
pub use tagpilot_core::*;

pub use file_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use repository::KvTagRepository;
pub use snapshot::Snapshot;
