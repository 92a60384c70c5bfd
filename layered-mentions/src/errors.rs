//! Error types for annotation assembly.

use layered_context::ContextError;
use layered_schema::SchemaError;
use thiserror::Error;

/// Errors that abort processing of a document.
#[derive(Debug, Error)]
pub enum MentionsError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A concept the domain depends on is missing or malformed.
    #[error("terminology error for {concept}: {reason}")]
    Terminology { concept: String, reason: String },

    #[error("context configuration error: {0}")]
    Context(#[from] ContextError),

    /// Error reading a domain file.
    #[error("failed to load domain: {path}: {message}")]
    Load { path: String, message: String },

    /// Error parsing RON domain text.
    #[error("failed to parse domain: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The caller raised the cancellation flag.
    #[error("processing cancelled")]
    Cancelled,
}

impl MentionsError {
    /// Schema, terminology and configuration problems, as opposed to cancellation.
    pub fn is_model_error(&self) -> bool {
        !matches!(self, MentionsError::Cancelled)
    }
}

/// Result type for annotation assembly.
pub type MentionsResult<T> = Result<T, MentionsError>;
