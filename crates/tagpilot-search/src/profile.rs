//! Diagnostic view of how a raw label is seen by the engine.

use serde::Serialize;

use crate::canonical::canonical_for;
use crate::normalize::{clean_label, is_cjk_dominant, is_length_ok, LabelKeys};
use crate::script_detection::{detect_script, ScriptDetection};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelProfile {
    pub display: String,
    pub lookup_key: String,
    pub compact_key: String,
    pub cjk_dominant: bool,
    /// Whether resolution would accept the label at all.
    pub length_ok: bool,
    pub script: ScriptDetection,
    pub canonical: Option<String>,
}

/// Profile a raw label. Pure; touches no registry.
///
/// ```
/// use tagpilot_search::profile::inspect_label;
///
/// let profile = inspect_label(" Node.js ");
/// assert_eq!(profile.display, "Node.js");
/// assert_eq!(profile.compact_key, "nodejs");
/// assert_eq!(profile.canonical.as_deref(), Some("Node.js"));
/// ```
pub fn inspect_label(raw: &str) -> LabelProfile {
    let display = clean_label(raw);
    let keys = LabelKeys::of(&display);
    LabelProfile {
        cjk_dominant: is_cjk_dominant(&display),
        length_ok: is_length_ok(&display),
        script: detect_script(&display),
        canonical: canonical_for(&display).map(str::to_string),
        lookup_key: keys.lookup,
        compact_key: keys.compact,
        display,
    }
}
