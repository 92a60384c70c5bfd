//! Error types for context configuration.
//!
//! Scope resolution itself never fails: a missing cue, terminator or default
//! is an ordinary branch. Only loading and validating configuration can error.

use thiserror::Error;

/// Errors that can occur while loading or validating a [`crate::ContextConfig`].
#[derive(Debug, Error)]
pub enum ContextError {
    /// Error reading a configuration file.
    #[error("failed to load context config: {path}: {message}")]
    Load { path: String, message: String },

    /// Error parsing RON configuration text.
    #[error("failed to parse context config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// A rule that can never reach a target.
    #[error("invalid rule for {modifier_type}: {message}")]
    InvalidRule {
        modifier_type: String,
        message: String,
    },
}

/// Result type for context operations.
pub type ContextResult<T> = Result<T, ContextError>;
