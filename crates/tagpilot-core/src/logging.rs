//! Structured logging schema and field name constants for TagPilot.
//!
//! All crates use these field names for consistent structured logging.
//! `tracing` macros take field names as identifiers, so the constants document
//! the schema; call sites spell the same names inline.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Store failure the caller cannot recover from |
//! | WARN  | Skipped invalid stored entries, duplicate tags detected |
//! | INFO  | Completed mutations (create, merge, rename, delete), service lifecycle |
//! | DEBUG | Decision points (exact hit, canonical short-circuit, rejected label) |
//! | TRACE | Per-candidate scoring |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "core", "search", "db", "jobs", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "resolver", "mutators", "tag_index", "file_store", "tag_service"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "resolve", "merge", "rename", "delete", "similarity_search"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Tag id being operated on.
pub const TAG_ID: &str = "tag_id";

/// Source tag id of a merge.
pub const SOURCE_ID: &str = "source_id";

/// Target tag id of a merge.
pub const TARGET_ID: &str = "target_id";

/// Raw or cleaned label text.
pub const LABEL: &str = "label";

/// Bookmark id being operated on.
pub const BOOKMARK_ID: &str = "bookmark_id";

/// Store slice name.
pub const SLICE: &str = "slice";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of candidates or entries returned.
pub const RESULT_COUNT: &str = "result_count";

/// Number of bookmark associations changed by a mutation.
pub const AFFECTED_COUNT: &str = "affected_count";

/// Number of tags in the registry snapshot.
pub const TAG_COUNT: &str = "tag_count";

/// Number of stored entries skipped during validation.
pub const SKIPPED: &str = "skipped";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
