//! The ordered DDL produced by one synthesis run.

use serde::Serialize;

/// One DDL statement and the table or model it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    /// Table or model name the statement is keyed under.
    pub key: String,
    /// Statement text without a trailing semicolon.
    pub sql: String,
}

impl Statement {
    /// Creates a statement.
    #[must_use]
    pub fn new(key: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            sql: sql.into(),
        }
    }
}

/// A timestamp column the database cannot maintain by itself.
///
/// The persistence layer is expected to set these columns when inserting
/// and/or updating rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoNowColumn {
    /// Table holding the column.
    pub table: String,
    /// Column name.
    pub column: String,
    /// Set to the current time on insert.
    pub on_insert: bool,
    /// Set to the current time on every update.
    pub on_update: bool,
}

/// Statements grouped by phase, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DdlPlan {
    /// `DROP TABLE` statements, association tables first.
    pub drops: Vec<Statement>,
    /// `CREATE TABLE` statements (and their `COMMENT ON` companions).
    pub create_tables: Vec<Statement>,
    /// `CREATE TABLE` statements for association tables.
    pub association_tables: Vec<Statement>,
    /// `ALTER TABLE .. ADD CONSTRAINT .. FOREIGN KEY` statements.
    pub foreign_keys: Vec<Statement>,
    /// `CREATE INDEX` statements.
    pub indexes: Vec<Statement>,
    /// Auto-now columns left to the persistence layer.
    pub auto_now: Vec<AutoNowColumn>,
}

impl DdlPlan {
    /// Iterates over every statement in execution order.
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.drops
            .iter()
            .chain(&self.create_tables)
            .chain(&self.association_tables)
            .chain(&self.foreign_keys)
            .chain(&self.indexes)
    }

    /// Returns the number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements().count()
    }

    /// Returns true when the plan holds no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements().next().is_none()
    }

    /// Renders the plan as a SQL script, one statement per line.
    #[must_use]
    pub fn to_script(&self) -> String {
        self.statements()
            .map(|statement| format!("{};\n", statement.sql))
            .collect()
    }
}
