//! Error and diagnostic types for schema synthesis and runs.

use modelsql_core::model::{ColumnKind, ReferentialAction};
use modelsql_core::{Dialect, ModelError};
use modelsql_orm::OrmError;

/// Boxed error returned by a [`StatementExecutor`](crate::executor::StatementExecutor).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during schema synthesis and execution.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A model or relationship could not be resolved.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The executor rejected a statement.
    #[error("Failed to execute '{sql}': {source}")]
    Execution {
        /// Statement text.
        sql: String,
        /// Executor error.
        source: BoxError,
    },

    /// Accessor generation or patching failed.
    #[error(transparent)]
    Accessor(#[from] OrmError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The run finished with errors.
    #[error("Schema run failed:\n{}", .0.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n"))]
    Failed(Vec<SchemaError>),
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// A non-fatal condition met while synthesizing.
///
/// Diagnostics never block a statement; they record what was left out or
/// changed so callers can surface it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Diagnostic {
    /// The column kind has no representation in the dialect.
    #[error("{dialect} cannot represent {kind:?} column '{table}.{column}'; column omitted")]
    DialectUnsupported {
        /// Table being created.
        table: String,
        /// Omitted column.
        column: String,
        /// Field kind.
        kind: ColumnKind,
        /// Target dialect.
        dialect: Dialect,
    },

    /// A statement was already recorded in this run.
    #[error("duplicate statement for '{key}' suppressed")]
    DuplicateSuppressed {
        /// Table or model the statement belongs to.
        key: String,
        /// Statement text.
        sql: String,
    },

    /// A referential action the dialect rejects was left out.
    #[error("{dialect} does not support {clause} {} on '{constraint}'; clause omitted", .action.as_sql())]
    ActionSuppressed {
        /// Constraint name.
        constraint: String,
        /// `ON DELETE` or `ON UPDATE`.
        clause: &'static str,
        /// Requested action.
        action: ReferentialAction,
        /// Target dialect.
        dialect: Dialect,
    },

    /// A table option the dialect cannot express was ignored.
    #[error("{dialect} has no {option} table option; ignored for '{table}'")]
    OptionIgnored {
        /// Table being created.
        table: String,
        /// Option name.
        option: &'static str,
        /// Target dialect.
        dialect: Dialect,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_lists_every_error() {
        let err = SchemaError::Failed(vec![
            SchemaError::Model(ModelError::UnknownModel("Writer".to_string())),
            SchemaError::Execution {
                sql: "DROP TABLE tags".to_string(),
                source: "table is locked".into(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Schema run failed:\n  - unknown model 'Writer'\n  - Failed to execute 'DROP TABLE tags': table is locked"
        );
    }

    #[test]
    fn test_diagnostic_messages() {
        let diagnostic = Diagnostic::ActionSuppressed {
            constraint: "fk_posts_author_id_authors".to_string(),
            clause: "ON UPDATE",
            action: ReferentialAction::Cascade,
            dialect: Dialect::Oracle,
        };
        assert_eq!(
            diagnostic.to_string(),
            "oracle does not support ON UPDATE CASCADE on 'fk_posts_author_id_authors'; clause omitted"
        );
    }
}
