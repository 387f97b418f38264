//! Error types for the vssx-core library.

use thiserror::Error;

/// Main error type for the vssx library.
#[derive(Error, Debug)]
pub enum VssxError {
    /// The input could not be turned into a document.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// A pattern registry could not be built.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while constructing a [`crate::Document`].
///
/// These are the only failures that surface to the caller of an extraction;
/// everything that goes wrong for a single field ends up inside its result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The input is empty or whitespace only.
    #[error("document is empty")]
    Empty,

    /// The input contains NUL bytes and is not decoded text.
    #[error("document is not text (NUL byte at offset {0})")]
    Binary(usize),

    /// The input exceeds the configured size bound.
    #[error("document is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// Errors raised while building a pattern registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// A regex pattern failed to compile.
    #[error("invalid pattern for {field}: {pattern} ({reason})")]
    InvalidRegex {
        field: String,
        pattern: String,
        reason: String,
    },

    /// Two field specs share a name.
    #[error("field registered twice: {0}")]
    DuplicateField(String),

    /// An override or lookup names a field that does not exist.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A field name given to an override is not one of the field types.
    #[error("unknown field type: {0}")]
    UnknownFieldType(String),
}

/// Errors raised inside a single field's pipeline.
///
/// The orchestrator converts every one of these into a FAILED result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The requested field is not in the registry.
    #[error("field not registered: {0}")]
    UnknownField(String),

    /// No strategy located a candidate.
    #[error("no candidate found for {0}")]
    NoCandidate(String),
}

/// Result type for the vssx library.
pub type Result<T> = std::result::Result<T, VssxError>;
