//! Centralized default constants for TagPilot.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic numbers.

// =============================================================================
// STORE SLICES
// =============================================================================

/// Store slice holding the tag registry (tag id to tag).
pub const TAGS_SLICE: &str = "tagsById";

/// Store slice holding bookmark-tag associations (bookmark id to tag ids).
pub const BOOKMARKS_SLICE: &str = "bookmarkMeta";

/// Default JSON file backing the store for the CLI.
pub const STORE_PATH: &str = "tagpilot-store.json";

// =============================================================================
// LABEL BOUNDS
// =============================================================================

/// Minimum characters in an accepted label (any script).
pub const LABEL_MIN_CHARS: usize = 2;

/// Maximum characters in an accepted CJK-dominant label.
pub const LABEL_MAX_CHARS_CJK: usize = 10;

/// Maximum characters in an accepted label that is not CJK-dominant.
pub const LABEL_MAX_CHARS: usize = 24;

/// Share of CJK ideographs at which a label counts as CJK-dominant.
pub const CJK_DOMINANT_RATIO: f64 = 0.5;

// =============================================================================
// SIMILARITY
// =============================================================================

/// Candidates returned by resolution on an exact-match miss.
pub const MAX_SIMILAR: usize = 5;

/// Score for a label contained in (or containing) a tag name.
pub const SCORE_NAME_SUBSTRING: f64 = 0.9;

/// Score for a label contained in (or containing) a tag alias.
pub const SCORE_ALIAS_SUBSTRING: f64 = 0.8;

/// Score for a canonical-table short-circuit hit.
pub const SCORE_CANONICAL: f64 = 1.0;

/// Largest edit distance that still yields a candidate.
pub const MAX_EDIT_DISTANCE: usize = 2;

/// Labels must be longer than this many characters for edit-distance matching.
pub const EDIT_DISTANCE_MIN_LABEL_CHARS: usize = 3;

// =============================================================================
// SERVICE
// =============================================================================

/// Request queue capacity of the single-writer tag service.
pub const QUEUE_CAPACITY: usize = 64;

/// Broadcast capacity for tag service lifecycle and request events.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Tags listed by vocabulary stats.
pub const TOP_TAGS: usize = 10;
