//! Error types for lookups, query sets and accessor patching.

use modelsql_core::ModelError;
use thiserror::Error;

/// Why a lookup token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The token matches no recognized grammar.
    #[error("invalid lookup token '{0}'")]
    Grammar(String),

    /// The operator suffix is not one of the known lookups.
    #[error("unknown lookup operator '{operator}' in '{token}'")]
    UnknownOperator {
        /// Suffix as written.
        operator: String,
        /// Whole token.
        token: String,
    },

    /// The value does not fit the operator.
    #[error("invalid value in '{token}': {reason}")]
    InvalidValue {
        /// Whole token.
        token: String,
        /// What is wrong with the value.
        reason: String,
    },

    /// The final path segment names no field of the model.
    #[error("model '{model}' has no field '{field}'")]
    UnknownField {
        /// Model being filtered.
        model: String,
        /// Segment as written.
        field: String,
    },

    /// A path segment names no relationship reachable from the model.
    #[error("cannot navigate from '{model}' through '{segment}'")]
    UnresolvedRelationship {
        /// Model the hop starts from.
        model: String,
        /// Segment as written.
        segment: String,
    },

    /// A path segment matches several relationships.
    #[error(
        "navigation from '{model}' through '{segment}' is ambiguous, candidates: {}",
        candidates.join(", ")
    )]
    AmbiguousRelationship {
        /// Model the hop starts from.
        model: String,
        /// Segment as written.
        segment: String,
        /// Every matching relationship.
        candidates: Vec<String>,
    },
}

/// Errors raised by query sets and the accessor patcher.
#[derive(Debug, Error)]
pub enum OrmError {
    /// A single lookup failed.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Model resolution failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Reading or writing a source file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more lookup tokens of a query set were rejected.
    #[error("{} lookup token(s) rejected: {}", .0.len(), format_errors(.0))]
    RejectedLookups(Vec<LookupError>),
}

fn format_errors(errors: &[LookupError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_lookups_display() {
        let err = OrmError::RejectedLookups(vec![
            LookupError::Grammar("nome###Thiago".to_string()),
            LookupError::UnknownOperator {
                operator: "like".to_string(),
                token: "nome__like=x".to_string(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "2 lookup token(s) rejected: invalid lookup token 'nome###Thiago'; \
             unknown lookup operator 'like' in 'nome__like=x'"
        );
    }
}
