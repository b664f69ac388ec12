//! Two-tier label normalization.
//!
//! A tag's display name is kept as typed apart from invisible characters.
//! Matching goes through two keys:
//!
//! - the **lookup key** folds case and separators but keeps semantic
//!   punctuation, so `C++`, `C#` and `Node.js` stay distinct;
//! - the **compact key** additionally drops dots and spaces, so `Node.js`,
//!   `node js` and `NodeJS` collide.

use tagpilot_core::defaults::{
    CJK_DOMINANT_RATIO, LABEL_MAX_CHARS, LABEL_MAX_CHARS_CJK, LABEL_MIN_CHARS,
};

/// Control characters (C0 and DEL) removed from every label.
fn is_control(ch: char) -> bool {
    matches!(ch, '\u{0000}'..='\u{001F}' | '\u{007F}')
}

/// Zero-width and bidi direction controls removed from every label.
fn is_invisible(ch: char) -> bool {
    matches!(
        ch,
        '\u{200B}'..='\u{200F}' | '\u{FEFF}' | '\u{2060}' | '\u{202A}'..='\u{202E}'
    )
}

fn is_key_separator(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '-' | '_' | '/')
}

/// Display form: strip control and zero-width characters, then trim.
///
/// ```
/// use tagpilot_search::normalize::clean_label;
///
/// assert_eq!(clean_label("  C++  "), "C++");
/// assert_eq!(clean_label("Node\u{200B}.js"), "Node.js");
/// ```
pub fn clean_label(raw: &str) -> String {
    raw.chars()
        .filter(|&c| !is_control(c) && !is_invisible(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Lookup key: display form with separator runs collapsed to one space, lower-cased.
///
/// ```
/// use tagpilot_search::normalize::lookup_key;
///
/// assert_eq!(lookup_key("Node.js"), "node.js");
/// assert_eq!(lookup_key("machine_learning / ops"), "machine learning ops");
/// assert_eq!(lookup_key("深度学习  "), "深度学习");
/// ```
pub fn lookup_key(raw: &str) -> String {
    let cleaned = clean_label(raw);
    let mut key = String::with_capacity(cleaned.len());
    let mut in_separator = false;
    for ch in cleaned.chars() {
        if is_key_separator(ch) {
            if !in_separator {
                key.push(' ');
                in_separator = true;
            }
        } else {
            key.push(ch);
            in_separator = false;
        }
    }
    key.to_lowercase()
}

/// Compact key: lookup key without dots or whitespace.
///
/// ```
/// use tagpilot_search::normalize::compact_key;
///
/// assert_eq!(compact_key("Node.js"), "nodejs");
/// assert_eq!(compact_key("Mermaid Live Editor"), "mermaidliveeditor");
/// assert_eq!(compact_key("v1.6.0"), "v160");
/// ```
pub fn compact_key(raw: &str) -> String {
    lookup_key(raw)
        .chars()
        .filter(|&c| c != '.' && !c.is_whitespace())
        .collect()
}

/// Both lookup keys of a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelKeys {
    pub lookup: String,
    pub compact: String,
}

impl LabelKeys {
    pub fn of(raw: &str) -> Self {
        let lookup = lookup_key(raw);
        let compact = lookup
            .chars()
            .filter(|&c| c != '.' && !c.is_whitespace())
            .collect();
        Self { lookup, compact }
    }

    /// Both keys, skipping empty ones and the compact key when it equals the lookup key.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let compact = (self.compact != self.lookup).then_some(self.compact.as_str());
        std::iter::once(self.lookup.as_str())
            .chain(compact)
            .filter(|k| !k.is_empty())
    }
}

/// Whether a character is a CJK Unified Ideograph (U+4E00–U+9FFF).
pub fn is_cjk_ideograph(ch: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&ch)
}

/// At least half of the characters are CJK Unified Ideographs.
pub fn is_cjk_dominant(s: &str) -> bool {
    let total = s.chars().count();
    if total == 0 {
        return false;
    }
    let cjk = s.chars().filter(|&c| is_cjk_ideograph(c)).count();
    cjk as f64 / total as f64 >= CJK_DOMINANT_RATIO
}

/// Length bounds after cleaning: 2–10 characters for CJK-dominant labels, 2–24 otherwise.
pub fn is_length_ok(raw: &str) -> bool {
    let cleaned = clean_label(raw);
    let len = cleaned.chars().count();
    if len == 0 {
        return false;
    }
    let max = if is_cjk_dominant(&cleaned) {
        LABEL_MAX_CHARS_CJK
    } else {
        LABEL_MAX_CHARS
    };
    (LABEL_MIN_CHARS..=max).contains(&len)
}
