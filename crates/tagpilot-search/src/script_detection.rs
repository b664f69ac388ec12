//! Unicode script detection for labels.
//!
//! One O(n) pass classifies a label's characters into broad script groups.
//! Confidence is the share of classified characters that belong to the
//! primary script. Whitespace and ASCII punctuation are not counted.

use std::collections::HashMap;

use serde::Serialize;
use unicode_script::{Script, UnicodeScript};

/// Detected script category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelScript {
    /// Latin alphabet, including ASCII digits
    Latin,
    /// Han, Hiragana, Katakana, Hangul
    Cjk,
    /// Any other single script (Cyrillic, Arabic, ...)
    Other,
    /// Two or more scripts each covering at least 20% of the label
    Mixed,
    /// Nothing classifiable
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScriptDetection {
    pub primary: LabelScript,
    pub confidence: f32,
}

fn map_unicode_script(ch: char) -> LabelScript {
    if ch.is_ascii_digit() {
        return LabelScript::Latin;
    }
    match ch.script() {
        Script::Latin => LabelScript::Latin,
        Script::Han | Script::Hiragana | Script::Katakana | Script::Hangul => LabelScript::Cjk,
        Script::Common | Script::Inherited | Script::Unknown => LabelScript::Unknown,
        _ => LabelScript::Other,
    }
}

/// Detect the script(s) used in a label.
///
/// ```
/// use tagpilot_search::script_detection::{detect_script, LabelScript};
///
/// assert_eq!(detect_script("Kubernetes").primary, LabelScript::Latin);
/// assert_eq!(detect_script("云原生").primary, LabelScript::Cjk);
/// ```
pub fn detect_script(label: &str) -> ScriptDetection {
    let mut counts: HashMap<LabelScript, usize> = HashMap::new();
    let mut total = 0usize;

    for ch in label.chars() {
        if ch.is_whitespace() || ch.is_ascii_punctuation() {
            continue;
        }
        let script = map_unicode_script(ch);
        if script == LabelScript::Unknown {
            continue;
        }
        *counts.entry(script).or_insert(0) += 1;
        total += 1;
    }

    if total == 0 {
        return ScriptDetection {
            primary: LabelScript::Unknown,
            confidence: 0.0,
        };
    }

    let (primary, primary_count) = counts
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(script, count)| (*script, *count))
        .unwrap_or((LabelScript::Unknown, 0));

    let mixed_threshold = (total as f32 * 0.20).ceil() as usize;
    let significant = counts.values().filter(|c| **c >= mixed_threshold).count();

    ScriptDetection {
        primary: if significant > 1 {
            LabelScript::Mixed
        } else {
            primary
        },
        confidence: primary_count as f32 / total as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_latin_with_digits() {
        let result = detect_script("Web3 v2");
        assert_eq!(result.primary, LabelScript::Latin);
        assert!(result.confidence > 0.99);
    }

    #[test]
    fn test_detect_japanese_kana_as_cjk() {
        assert_eq!(detect_script("ひらがな").primary, LabelScript::Cjk);
        assert_eq!(detect_script("カタカナ").primary, LabelScript::Cjk);
    }

    #[test]
    fn test_detect_mixed() {
        let result = detect_script("AI工具");
        assert_eq!(result.primary, LabelScript::Mixed);
        assert!((result.confidence - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_detect_other_script() {
        assert_eq!(detect_script("Привет").primary, LabelScript::Other);
    }

    #[test]
    fn test_detect_punctuation_only() {
        let result = detect_script("++ ..");
        assert_eq!(result.primary, LabelScript::Unknown);
        assert_eq!(result.confidence, 0.0);
    }
}
