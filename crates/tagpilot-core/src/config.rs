//! Engine configuration loaded from the environment.

use std::path::PathBuf;

use tracing::warn;

use crate::defaults;

/// Runtime settings shared by the service and the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// JSON file backing the key-value store.
    pub store_path: PathBuf,
    /// Candidates returned by resolution on an exact-match miss.
    pub max_similar: usize,
    /// Request queue capacity of the tag service.
    pub queue_capacity: usize,
    /// Tags listed by vocabulary stats.
    pub top_tags: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(defaults::STORE_PATH),
            max_similar: defaults::MAX_SIMILAR,
            queue_capacity: defaults::QUEUE_CAPACITY,
            top_tags: defaults::TOP_TAGS,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `TAGPILOT_STORE_PATH` | `tagpilot-store.json` | JSON store file |
    /// | `TAGPILOT_MAX_SIMILAR` | `5` | Candidates per unresolved label |
    /// | `TAGPILOT_QUEUE_CAPACITY` | `64` | Tag service queue capacity |
    /// | `TAGPILOT_TOP_TAGS` | `10` | Tags listed by stats |
    pub fn from_env() -> Self {
        let base = Self::default();

        let store_path = std::env::var("TAGPILOT_STORE_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(base.store_path);

        Self {
            store_path,
            max_similar: env_usize("TAGPILOT_MAX_SIMILAR", base.max_similar),
            queue_capacity: env_usize("TAGPILOT_QUEUE_CAPACITY", base.queue_capacity).max(1),
            top_tags: env_usize("TAGPILOT_TOP_TAGS", base.top_tags),
        }
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    pub fn with_max_similar(mut self, max: usize) -> Self {
        self.max_similar = max;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_top_tags(mut self, top: usize) -> Self {
        self.top_tags = top;
        self
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(v) => v,
            Err(_) => {
                warn!(
                    subsystem = "core",
                    component = "config",
                    variable = name,
                    value = %raw,
                    default,
                    "Ignoring unparsable environment value"
                );
                default
            }
        },
        Err(_) => default,
    }
}
