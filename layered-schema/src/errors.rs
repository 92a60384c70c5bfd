//! Error types for schema compilation and loading.

use thiserror::Error;

/// Errors raised while compiling or loading a schema.
///
/// Once a schema compiles, queries and evaluation never fail.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A category references a parent or filler class that is not declared.
    #[error("unknown category {name} referenced by {referenced_by}")]
    UnknownCategory { name: String, referenced_by: String },

    /// A restriction or property references an undeclared property.
    #[error("unknown property {name} referenced by {referenced_by}")]
    UnknownProperty { name: String, referenced_by: String },

    /// A category or property is declared twice.
    #[error("duplicate definition of {0}")]
    Duplicate(String),

    /// Parent links form a cycle.
    #[error("inheritance cycle through {0}")]
    InheritanceCycle(String),

    /// A concept the pipeline cannot run without is absent.
    #[error("missing required concept {0}")]
    MissingConcept(String),

    /// Error reading a schema file.
    #[error("failed to load schema: {path}: {message}")]
    Load { path: String, message: String },

    /// Error parsing RON schema text.
    #[error("failed to parse schema: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
