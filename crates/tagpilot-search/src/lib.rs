//! # tagpilot-search
//!
//! Label matching for the TagPilot tag identity engine.
//!
//! This crate provides:
//! - Two-tier label normalization (lookup key and compact key)
//! - A static canonical synonym table with suffix compaction
//! - The session [`TagIndex`]: exact lookup and ranked similarity search
//! - Unicode script detection and label profiling for diagnostics
//!
//! Everything here is synchronous and pure over a borrowed registry snapshot;
//! persistence lives in `tagpilot-db`.
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use tagpilot_search::{TagIndex, Tag, TagId, TagRegistry};
//!
//! let registry: TagRegistry = [
//!     Tag::new(TagId::from("t1"), "DockerCompose", Utc::now()),
//!     Tag::new(TagId::from("t2"), "Dockr", Utc::now()),
//! ]
//! .into_iter()
//! .collect();
//!
//! let index = TagIndex::build(&registry);
//! assert!(index.exact_lookup("dockercompose").is_some());
//!
//! let similar = index.find_similar("docker", 5);
//! assert_eq!(similar[0].name, "DockerCompose");
//! ```

pub mod canonical;
pub mod index;
pub mod normalize;
pub mod profile;
pub mod script_detection;

// Re-export core types
pub use tagpilot_core::*;

pub use canonical::{canonical_for, canonicalize, compact_label};
pub use index::{KeyCollision, MatchReason, SimilarTag, TagIndex};
pub use normalize::{clean_label, compact_key, is_length_ok, lookup_key, LabelKeys};
pub use profile::{inspect_label, LabelProfile};
pub use script_detection::{detect_script, LabelScript, ScriptDetection};
