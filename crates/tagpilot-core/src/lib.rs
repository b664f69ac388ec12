//! # tagpilot-core
//!
//! Core types, traits, and abstractions for the TagPilot tag identity engine.
//!
//! This crate provides the data model (tags, the tag registry, bookmark
//! associations), operation outcomes, the error type, and the trait seams
//! other TagPilot crates implement: [`KeyValueStore`] below the engine and
//! [`TagRepository`] above it.

pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{new_tag_id, tag_id_timestamp};
