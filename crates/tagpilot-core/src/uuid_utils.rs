//! Tag id generation on top of time-ordered UUIDv7 values.
//!
//! UUIDv7 embeds a millisecond Unix timestamp in its first 48 bits, so the
//! hyphenated form sorts lexicographically by creation time. Tag ids inherit
//! that ordering, which keeps registry iteration order equal to creation order.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::models::TagId;

/// Prefix of every generated tag id.
pub const TAG_ID_PREFIX: &str = "tag_";

/// Generate a new UUIDv7 identifier.
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Generate a fresh, never-reused tag id.
///
/// # Example
///
/// ```
/// use tagpilot_core::uuid_utils::new_tag_id;
///
/// let a = new_tag_id();
/// let b = new_tag_id();
/// assert_ne!(a, b);
/// assert!(a.as_str().starts_with("tag_"));
/// ```
pub fn new_tag_id() -> TagId {
    TagId::new(format!("{}{}", TAG_ID_PREFIX, new_v7().as_hyphenated()))
}

/// Extract the creation timestamp embedded in a generated tag id.
///
/// Returns `None` for ids that were not produced by [`new_tag_id`].
pub fn tag_id_timestamp(id: &TagId) -> Option<DateTime<Utc>> {
    let raw = id.as_str().strip_prefix(TAG_ID_PREFIX)?;
    let uuid = Uuid::parse_str(raw).ok()?;
    if uuid.get_version_num() != 7 {
        return None;
    }
    let bytes = uuid.as_bytes();
    let millis = ((bytes[0] as u64) << 40)
        | ((bytes[1] as u64) << 32)
        | ((bytes[2] as u64) << 24)
        | ((bytes[3] as u64) << 16)
        | ((bytes[4] as u64) << 8)
        | (bytes[5] as u64);
    Utc.timestamp_millis_opt(millis as i64).single()
}
