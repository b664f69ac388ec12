//! # tagpilot-jobs
//!
//! Single-writer tag service for TagPilot.
//!
//! This crate provides:
//! - A service task that owns the repository and handles one request at a time
//! - A bounded request queue with per-request reply channels
//! - Request and lifecycle notifications via broadcast channels
//! - Graceful shutdown that drains requests queued before it
//!
//! ## Example
//!
//! ```ignore
//! use tagpilot_jobs::{EngineConfig, ResolveOptions, TagRepository, TagService};
//!
//! let handle = TagService::open(EngineConfig::from_env()).start();
//!
//! // Clones share the same writer
//! let other = handle.clone();
//! let (a, b) = tokio::join!(
//!     handle.resolve("Rust", ResolveOptions::create()),
//!     other.resolve("rust", ResolveOptions::create()),
//! );
//! assert_eq!(a?.tag_id, b?.tag_id);
//!
//! // Listen for events
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! // Graceful shutdown
//! handle.shutdown().await?;
//! ```

pub mod service;

// Re-export core types
pub use tagpilot_core::*;

pub use service::{ServiceEvent, TagService, TagServiceHandle};
