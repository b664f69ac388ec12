//! Static synonym table collapsing known variant spellings to one display label.
//!
//! Keys are lower-cased and may be in any script, so `人工智能`, `ai` and `a.i.`
//! all map to `AI`. The table is read-only.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::normalize::lookup_key;

static CANONICAL_ENTRIES: &[(&str, &str)] = &[
    // AI/ML
    ("人工智能", "AI"),
    ("ai", "AI"),
    ("a.i.", "AI"),
    ("机器学习", "ML"),
    ("machine learning", "ML"),
    ("ml", "ML"),
    ("深度学习", "DL"),
    ("deep learning", "DL"),
    ("dl", "DL"),
    ("llm", "LLM"),
    ("大语言模型", "LLM"),
    ("大模型", "LLM"),
    // Languages and frameworks
    ("node", "Node.js"),
    ("nodejs", "Node.js"),
    ("node.js", "Node.js"),
    ("js", "JavaScript"),
    ("javascript", "JavaScript"),
    ("ts", "TypeScript"),
    ("typescript", "TypeScript"),
    ("py", "Python"),
    ("python", "Python"),
    ("golang", "Go"),
    ("reactjs", "React"),
    ("react.js", "React"),
    ("vuejs", "Vue"),
    ("vue.js", "Vue"),
    ("angularjs", "Angular"),
    ("angular.js", "Angular"),
    // Tools and platforms
    ("github repository", "GitHub"),
    ("github repo", "GitHub"),
    ("bilibili", "bilibili"),
    ("b站", "bilibili"),
    ("stackoverflow", "StackOverflow"),
    ("medium", "Medium"),
    ("dev.to", "Dev.to"),
];

static CANONICAL_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| CANONICAL_ENTRIES.iter().copied().collect());

/// Generic suffixes dropped by [`compact_label`], checked in this order.
pub const TAG_SUFFIXES: &[&str] = &[
    "工具箱",
    "工具集",
    "工具",
    "支持",
    "开源版本",
    "版本",
    "云端部署",
    "部署",
];

/// Remove whitespace and strip the first matching generic suffix.
///
/// A suffix is only stripped when the label is more than two characters
/// longer than it, so the remaining stem has at least three characters.
///
/// ```
/// use tagpilot_search::canonical::compact_label;
///
/// assert_eq!(compact_label("Docker 部署"), "Docker");
/// assert_eq!(compact_label("图片处理工具箱"), "图片处理");
/// assert_eq!(compact_label("AI工具"), "AI工具");
/// ```
pub fn compact_label(label: &str) -> String {
    let compacted: String = label.chars().filter(|c| !c.is_whitespace()).collect();
    let len = compacted.chars().count();
    for suffix in TAG_SUFFIXES {
        let suffix_len = suffix.chars().count();
        if compacted.ends_with(suffix) && len > suffix_len + 2 {
            return compacted[..compacted.len() - suffix.len()].to_string();
        }
    }
    compacted
}

fn table_get(key: &str) -> Option<&'static str> {
    CANONICAL_MAP.get(key).copied()
}

/// Canonical display label for a raw label, if the table knows it.
///
/// Looked up twice: by the label's lower-cased lookup key, then by its
/// compacted form (lower-cased first, then as written).
pub fn canonical_for(label: &str) -> Option<&'static str> {
    let lower = lookup_key(label);
    if let Some(hit) = table_get(&lower) {
        return Some(hit);
    }
    let compacted = compact_label(label);
    table_get(&compacted.to_lowercase()).or_else(|| table_get(&compacted))
}

/// Canonical label when known, otherwise the compacted label.
///
/// ```
/// use tagpilot_search::canonical::canonicalize;
///
/// assert_eq!(canonicalize("人工智能"), "AI");
/// assert_eq!(canonicalize("reactjs"), "React");
/// assert_eq!(canonicalize("Rust"), "Rust");
/// ```
pub fn canonicalize(label: &str) -> String {
    match canonical_for(label) {
        Some(canonical) => canonical.to_string(),
        None => compact_label(label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_script_synonyms_share_canonical() {
        assert_eq!(canonical_for("人工智能"), Some("AI"));
        assert_eq!(canonical_for("ai"), Some("AI"));
        assert_eq!(canonical_for("AI"), Some("AI"));
        assert_eq!(canonical_for("A.I."), Some("AI"));
        assert_eq!(canonical_for("大模型"), Some("LLM"));
    }

    #[test]
    fn test_lookup_key_form_hits_multiword_entries() {
        assert_eq!(canonical_for("Machine-Learning"), Some("ML"));
        assert_eq!(canonical_for("GitHub Repo"), Some("GitHub"));
    }

    #[test]
    fn test_compacted_form_hits_after_suffix_strip() {
        assert_eq!(canonical_for("人工智能工具"), Some("AI"));
        assert_eq!(canonical_for("Node JS"), Some("Node.js"));
    }

    #[test]
    fn test_unknown_label_has_no_canonical() {
        assert_eq!(canonical_for("Kubernetes"), None);
        assert_eq!(canonical_for(""), None);
    }

    #[test]
    fn test_compact_label_requires_long_stem() {
        assert_eq!(compact_label("云端部署"), "云端部署");
        assert_eq!(compact_label("开源版本"), "开源版本");
        assert_eq!(compact_label("前端工具箱"), "前端工具箱");
        assert_eq!(compact_label("前端开发工具箱"), "前端开发");
    }

    #[test]
    fn test_compact_label_strips_only_first_matching_suffix() {
        assert_eq!(compact_label("服务器云端部署"), "服务器");
        assert_eq!(compact_label("数据库支持版本"), "数据库支持");
    }

    #[test]
    fn test_canonicalize_falls_back_to_compacted() {
        assert_eq!(canonicalize("Rust 工具集"), "Rust");
        assert_eq!(canonicalize("Web Assembly"), "WebAssembly");
    }

    #[test]
    fn test_table_keys_are_lower_case() {
        for (key, _) in CANONICAL_ENTRIES {
            assert_eq!(*key, key.to_lowercase());
        }
    }
}
