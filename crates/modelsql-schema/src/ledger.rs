//! Run-scoped record of every synthesized statement.
//!
//! The ledger guarantees each statement is emitted once per run and keeps
//! the phases apart so the plan can be executed tables first, foreign keys
//! after. It is owned by exactly one run and reset at the start of the next.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::error::{Diagnostic, SchemaError};
use crate::plan::{AutoNowColumn, DdlPlan, Statement};

/// Statements, bookkeeping and diagnostics of one synthesis run.
#[derive(Debug, Default)]
pub struct SynthesisLedger {
    drops: IndexMap<String, String>,
    tables: IndexMap<String, Vec<String>>,
    association_tables: IndexMap<String, String>,
    foreign_keys: IndexMap<String, Vec<String>>,
    indexes: IndexMap<String, Vec<String>>,
    generated_tables: IndexSet<String>,
    auto_now: Vec<AutoNowColumn>,
    diagnostics: Vec<Diagnostic>,
    errors: Vec<SchemaError>,
}

impl SynthesisLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything recorded so far.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns whether `table` was already created in this run.
    #[must_use]
    pub fn has_table(&self, table: &str) -> bool {
        self.generated_tables.contains(table)
    }

    /// Records the `CREATE TABLE` of a model table.
    ///
    /// Returns `false` (and records a diagnostic) if the table was already
    /// created in this run.
    pub fn record_table(&mut self, table: &str, sql: String) -> bool {
        if !self.generated_tables.insert(table.to_string()) {
            self.suppress(table, sql);
            return false;
        }
        debug!(table = %table, "Recorded table");
        self.tables.entry(table.to_string()).or_default().push(sql);
        true
    }

    /// Appends a companion statement (e.g. `COMMENT ON`) to a created table.
    pub fn record_table_extra(&mut self, table: &str, sql: String) -> bool {
        let statements = self.tables.entry(table.to_string()).or_default();
        if statements.contains(&sql) {
            self.suppress(table, sql);
            return false;
        }
        statements.push(sql);
        true
    }

    /// Records the `CREATE TABLE` of an association table.
    pub fn record_association(&mut self, table: &str, sql: String) -> bool {
        if !self.generated_tables.insert(table.to_string()) {
            self.suppress(table, sql);
            return false;
        }
        debug!(table = %table, "Recorded association table");
        self.association_tables.insert(table.to_string(), sql);
        true
    }

    /// Records a foreign key keyed by the name of the model declaring it.
    pub fn record_foreign_key(&mut self, key: &str, sql: String) -> bool {
        let statements = self.foreign_keys.entry(key.to_string()).or_default();
        if statements.contains(&sql) {
            self.suppress(key, sql);
            return false;
        }
        statements.push(sql);
        true
    }

    /// Records an index keyed by model or association table.
    pub fn record_index(&mut self, key: &str, sql: String) -> bool {
        let statements = self.indexes.entry(key.to_string()).or_default();
        if statements.contains(&sql) {
            self.suppress(key, sql);
            return false;
        }
        statements.push(sql);
        true
    }

    /// Records a `DROP TABLE`.
    pub fn record_drop(&mut self, table: &str, sql: String) -> bool {
        if self.drops.contains_key(table) {
            self.suppress(table, sql);
            return false;
        }
        self.drops.insert(table.to_string(), sql);
        true
    }

    /// Records a timestamp column the database will not maintain.
    pub fn record_auto_now(&mut self, column: AutoNowColumn) {
        if !self.auto_now.contains(&column) {
            debug!(table = %column.table, column = %column.column, "Auto-now column left to caller");
            self.auto_now.push(column);
        }
    }

    /// Records a non-fatal diagnostic.
    pub fn diagnose(&mut self, diagnostic: Diagnostic) {
        warn!(diagnostic = %diagnostic, "Schema diagnostic");
        self.diagnostics.push(diagnostic);
    }

    /// Records an error that fails the run.
    pub fn fail(&mut self, error: SchemaError) {
        warn!(error = %error, "Schema error");
        self.errors.push(error);
    }

    fn suppress(&mut self, key: &str, sql: String) {
        debug!(key = %key, "Duplicate statement suppressed");
        self.diagnostics.push(Diagnostic::DuplicateSuppressed {
            key: key.to_string(),
            sql,
        });
    }

    /// Model table statements keyed by table.
    #[must_use]
    pub const fn tables(&self) -> &IndexMap<String, Vec<String>> {
        &self.tables
    }

    /// Association table statements keyed by table.
    #[must_use]
    pub const fn association_tables(&self) -> &IndexMap<String, String> {
        &self.association_tables
    }

    /// Foreign keys keyed by model or association table.
    #[must_use]
    pub const fn foreign_keys(&self) -> &IndexMap<String, Vec<String>> {
        &self.foreign_keys
    }

    /// Indexes keyed by model or association table.
    #[must_use]
    pub const fn indexes(&self) -> &IndexMap<String, Vec<String>> {
        &self.indexes
    }

    /// Every table created in this run, in creation order.
    #[must_use]
    pub const fn generated_tables(&self) -> &IndexSet<String> {
        &self.generated_tables
    }

    /// Auto-now bookkeeping.
    #[must_use]
    pub fn auto_now(&self) -> &[AutoNowColumn] {
        &self.auto_now
    }

    /// Diagnostics recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Errors recorded so far.
    #[must_use]
    pub fn errors(&self) -> &[SchemaError] {
        &self.errors
    }

    /// Moves the recorded diagnostics out.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Moves the recorded errors out.
    pub fn take_errors(&mut self) -> Vec<SchemaError> {
        std::mem::take(&mut self.errors)
    }

    /// Builds the plan from everything recorded so far.
    #[must_use]
    pub fn plan(&self) -> DdlPlan {
        DdlPlan {
            drops: self
                .drops
                .iter()
                .map(|(table, sql)| Statement::new(table, sql))
                .collect(),
            create_tables: flatten(&self.tables),
            association_tables: self
                .association_tables
                .iter()
                .map(|(table, sql)| Statement::new(table, sql))
                .collect(),
            foreign_keys: flatten(&self.foreign_keys),
            indexes: flatten(&self.indexes),
            auto_now: self.auto_now.clone(),
        }
    }
}

fn flatten(map: &IndexMap<String, Vec<String>>) -> Vec<Statement> {
    map.iter()
        .flat_map(|(key, statements)| statements.iter().map(move |sql| Statement::new(key, sql)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_recorded_once() {
        let mut ledger = SynthesisLedger::new();
        assert!(ledger.record_table("posts", "CREATE TABLE posts ()".to_string()));
        assert!(!ledger.record_table("posts", "CREATE TABLE posts ()".to_string()));
        assert!(!ledger.record_association("posts", "CREATE TABLE posts ()".to_string()));

        assert_eq!(ledger.tables()["posts"].len(), 1);
        assert_eq!(ledger.generated_tables().len(), 1);
        assert_eq!(ledger.diagnostics().len(), 2);
        assert!(matches!(
            &ledger.diagnostics()[0],
            Diagnostic::DuplicateSuppressed { key, .. } if key == "posts"
        ));
    }

    #[test]
    fn test_plan_keeps_phases_apart() {
        let mut ledger = SynthesisLedger::new();
        ledger.record_foreign_key("posts", "ALTER TABLE posts ADD CONSTRAINT fk".to_string());
        ledger.record_table("authors", "CREATE TABLE authors ()".to_string());
        ledger.record_table("posts", "CREATE TABLE posts ()".to_string());
        ledger.record_table_extra("posts", "COMMENT ON TABLE posts IS 'x'".to_string());
        ledger.record_index("posts", "CREATE INDEX idx ON posts (a)".to_string());
        ledger.record_index("posts", "CREATE INDEX idx ON posts (a)".to_string());

        let plan = ledger.plan();
        let keys: Vec<&str> = plan.create_tables.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["authors", "posts", "posts"]);
        assert_eq!(plan.foreign_keys.len(), 1);
        assert_eq!(plan.indexes.len(), 1);
        assert_eq!(plan.statements().next().unwrap().sql, "CREATE TABLE authors ()");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut ledger = SynthesisLedger::new();
        ledger.record_table("posts", "CREATE TABLE posts ()".to_string());
        ledger.fail(SchemaError::Failed(Vec::new()));
        ledger.reset();
        assert!(!ledger.has_table("posts"));
        assert!(ledger.errors().is_empty());
        assert!(ledger.plan().is_empty());
    }
}
