//! Error types for message parsing, searching and schema lookups

use thiserror::Error;

/// Result type alias for HL7 operations
pub type Result<T> = std::result::Result<T, Hl7Error>;

/// Errors reported by the text-model operations.
///
/// None of these are fatal: delimiter and schema problems fall back to
/// defaults and are recorded as warnings, search outcomes are plain values.
#[derive(Error, Debug)]
pub enum Hl7Error {
    #[error("Malformed delimiter header: {0}")]
    MalformedDelimiterHeader(String),

    #[error("HL7 version {detected} is not supported, using v{fallback}")]
    UnsupportedSchemaVersion { detected: String, fallback: String },

    #[error("No field matching '{0}' found in the message")]
    NoFieldMatch(String),

    #[error("No search defined; run find first")]
    NoSearchDefined,

    #[error("Line does not look like a valid segment: {0}")]
    InvalidSegmentSyntax(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Hl7Error {
    /// Create a new schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Whether the operation carried on with a default after this error
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Hl7Error::MalformedDelimiterHeader(_) | Hl7Error::UnsupportedSchemaVersion { .. }
        )
    }
}
