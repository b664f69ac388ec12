//! Test fixtures for tag matching tests.
//!
//! A small bilingual vocabulary as a bookmark manager would accumulate it.

use chrono::{TimeZone, Utc};
use tagpilot_search::{Tag, TagId, TagRegistry};

/// Tag names keyed by id, in registry order.
pub const VOCABULARY: &[(&str, &str, &[&str])] = &[
    ("tag_01", "AI", &["A.I."]),
    ("tag_02", "Node.js", &[]),
    ("tag_03", "C++", &[]),
    ("tag_04", "C#", &[]),
    ("tag_05", "DockerCompose", &[]),
    ("tag_06", "Dockr", &[]),
    ("tag_07", "机器学习", &["机器学习算法"]),
    ("tag_08", "Kubernetes", &["K8s"]),
    ("tag_09", "前端开发", &[]),
];

pub fn vocabulary() -> TagRegistry {
    VOCABULARY
        .iter()
        .enumerate()
        .map(|(i, (id, name, aliases))| {
            Tag::new(TagId::from(*id), *name, ts(i as i64 * 1_000))
                .with_aliases(aliases.iter().copied())
        })
        .collect()
}

pub fn ts(ms: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}
