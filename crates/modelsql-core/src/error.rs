//! Error types for model descriptors and registries.

use thiserror::Error;

/// Errors raised while building, registering or resolving model descriptors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A relationship points at a model that is not registered.
    #[error("relationship '{model}.{field}' targets unknown model '{target}'")]
    UnresolvedRelationship {
        /// Model declaring the relationship.
        model: String,
        /// Relationship field name.
        field: String,
        /// Target as written in the descriptor.
        target: String,
    },

    /// A relationship target matches more than one registered model.
    #[error(
        "relationship '{model}.{field}' target '{target}' is ambiguous, candidates: {}",
        candidates.join(", ")
    )]
    AmbiguousRelationship {
        /// Model declaring the relationship.
        model: String,
        /// Relationship field name.
        field: String,
        /// Target as written in the descriptor.
        target: String,
        /// Names of every matching model.
        candidates: Vec<String>,
    },

    /// The same model name was registered twice.
    #[error("model '{0}' is already registered")]
    DuplicateModel(String),

    /// Two fields of one model share a name.
    #[error("model '{model}' declares field '{field}' more than once")]
    DuplicateField {
        /// Model name.
        model: String,
        /// Field name.
        field: String,
    },

    /// A field declaration is inconsistent.
    #[error("invalid field '{model}.{field}': {reason}")]
    InvalidField {
        /// Model name.
        model: String,
        /// Field name.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// No registered model has this name.
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    /// Dialect identifier not recognized.
    #[error("unknown SQL dialect '{0}' (expected mysql, postgresql, oracle or h2)")]
    UnknownDialect(String),

    /// Declarative model document could not be parsed.
    #[error("invalid model document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
