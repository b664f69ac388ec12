//! Error types for TagPilot.

use thiserror::Error;

use crate::models::TagId;

/// Result type alias using TagPilot's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for TagPilot operations.
///
/// The `Display` output is the reason string shown to users, so UI layers can
/// render a failed mutation directly.
#[derive(Error, Debug)]
pub enum Error {
    /// Input cleaned to empty or was otherwise unusable for a mutation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Tag id absent from the registry
    #[error("tag not found: {0}")]
    TagNotFound(TagId),

    /// Alias key already belongs to a different tag
    #[error("alias \"{alias}\" already identifies tag {existing}")]
    AliasConflict { alias: String, existing: TagId },

    /// Key-value store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
