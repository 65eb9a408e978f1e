//! Schema runs: synthesize, then execute.
//!
//! A [`SchemaRun`] owns the ledger. Every run (`sync`, `recreate`,
//! `drop_tables`) starts from an empty ledger, synthesizes its statements,
//! and hands them to the executor in plan order. A failing statement does
//! not stop the run; it is collected and the run is reported failed.

use std::path::PathBuf;

use modelsql_core::model::ModelRegistry;
use modelsql_core::Settings;
use modelsql_orm::accessors::{AccessorSynthesizer, SourcePatcher};
use tracing::{debug, info, warn};

use crate::error::{Diagnostic, Result, SchemaError};
use crate::executor::StatementExecutor;
use crate::ledger::SynthesisLedger;
use crate::plan::DdlPlan;
use crate::synthesizer::SchemaSynthesizer;

/// Outcome of one run.
#[derive(Debug)]
pub struct RunReport {
    /// Statements synthesized by the run.
    pub plan: DdlPlan,
    /// Non-fatal diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    /// Errors that make the run fail.
    pub errors: Vec<SchemaError>,
    /// Number of accessor methods written by the patcher.
    pub accessors_written: usize,
}

impl RunReport {
    /// Returns true if any error was recorded.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Converts a failed report into [`SchemaError::Failed`].
    ///
    /// # Errors
    ///
    /// Returns every collected error when the run failed.
    pub fn into_result(self) -> Result<Self> {
        if self.errors.is_empty() {
            Ok(self)
        } else {
            Err(SchemaError::Failed(self.errors))
        }
    }
}

struct AccessorHook<'a> {
    source_root: PathBuf,
    patcher: Box<dyn SourcePatcher + 'a>,
}

#[derive(Clone, Copy)]
enum RunKind {
    Sync,
    Recreate,
    Drop,
}

/// Synthesizes the schema of a registry and executes it.
///
/// # Example
///
/// ```
/// use modelsql_core::model::{FieldDescriptor, ModelDescriptor, ModelRegistry};
/// use modelsql_core::Settings;
/// use modelsql_schema::executor::RecordingExecutor;
/// use modelsql_schema::runner::SchemaRun;
///
/// let mut registry = ModelRegistry::new();
/// registry
///     .add(ModelDescriptor::new("Tag").field(FieldDescriptor::short_text("label", 40)))
///     .unwrap();
///
/// let settings = Settings::default();
/// let mut run = SchemaRun::new(&settings, &registry, RecordingExecutor::new());
/// let report = run.sync().into_result().unwrap();
/// assert_eq!(report.plan.len(), 1);
/// assert_eq!(run.executor().statements().len(), 1);
/// ```
pub struct SchemaRun<'a, E> {
    settings: &'a Settings,
    registry: &'a ModelRegistry,
    executor: E,
    ledger: SynthesisLedger,
    accessors: Option<AccessorHook<'a>>,
}

impl<'a, E: StatementExecutor> SchemaRun<'a, E> {
    /// Creates a run over `registry` executing through `executor`.
    pub fn new(settings: &'a Settings, registry: &'a ModelRegistry, executor: E) -> Self {
        Self {
            settings,
            registry,
            executor,
            ledger: SynthesisLedger::new(),
            accessors: None,
        }
    }

    /// Generates relationship accessors under `source_root` after each
    /// successful `sync` or `recreate`.
    #[must_use]
    pub fn with_accessors(
        mut self,
        source_root: impl Into<PathBuf>,
        patcher: impl SourcePatcher + 'a,
    ) -> Self {
        self.accessors = Some(AccessorHook {
            source_root: source_root.into(),
            patcher: Box::new(patcher),
        });
        self
    }

    /// Returns the executor.
    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Consumes the run and returns its executor.
    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Returns the ledger of the last run.
    #[must_use]
    pub const fn ledger(&self) -> &SynthesisLedger {
        &self.ledger
    }

    /// Creates every table, association table, foreign key and index.
    pub fn sync(&mut self) -> RunReport {
        self.run(RunKind::Sync)
    }

    /// Drops every table, then creates the schema again.
    pub fn recreate(&mut self) -> RunReport {
        self.run(RunKind::Recreate)
    }

    /// Drops every table.
    pub fn drop_tables(&mut self) -> RunReport {
        self.run(RunKind::Drop)
    }

    fn run(&mut self, kind: RunKind) -> RunReport {
        self.ledger.reset();
        {
            let mut synthesizer = SchemaSynthesizer::new(self.settings, self.registry, &mut self.ledger);
            if matches!(kind, RunKind::Recreate | RunKind::Drop) {
                synthesizer.synthesize_drop_tables();
            }
            if matches!(kind, RunKind::Sync | RunKind::Recreate) {
                synthesizer.synthesize_all();
            }
        }

        let plan = self.ledger.plan();
        let mut errors = self.ledger.take_errors();
        let diagnostics = self.ledger.take_diagnostics();

        let mut executed = 0;
        for statement in plan.statements() {
            debug!(key = %statement.key, sql = %statement.sql, "Executing SQL");
            match self.executor.execute(&statement.sql) {
                Ok(()) => executed += 1,
                Err(source) => {
                    warn!(key = %statement.key, error = %source, "Statement failed");
                    errors.push(SchemaError::Execution {
                        sql: statement.sql.clone(),
                        source,
                    });
                }
            }
        }
        info!(
            executed,
            failed = errors.len(),
            diagnostics = diagnostics.len(),
            "Schema run finished"
        );

        let mut accessors_written = 0;
        if !matches!(kind, RunKind::Drop) && errors.is_empty() {
            match self.write_accessors() {
                Ok(written) => accessors_written = written,
                Err(err) => errors.push(err),
            }
        }

        RunReport {
            plan,
            diagnostics,
            errors,
            accessors_written,
        }
    }

    fn write_accessors(&mut self) -> Result<usize> {
        let Some(hook) = self.accessors.as_mut() else {
            return Ok(0);
        };

        let (pairs, unresolved) =
            AccessorSynthesizer::new(self.registry, &hook.source_root).synthesize_all();
        if !unresolved.is_empty() {
            debug!(count = unresolved.len(), "Skipping accessors of unresolved relationships");
        }

        let mut written = 0;
        for pair in &pairs {
            written += hook.patcher.apply(pair)?;
        }
        info!(written, "Accessors written");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::executor::RecordingExecutor;
    use modelsql_core::model::{FieldDescriptor, ModelDescriptor, RelationshipDescriptor};
    use modelsql_core::Dialect;
    use pretty_assertions::assert_eq;

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        registry
            .add(
                ModelDescriptor::new("Article")
                    .relation(RelationshipDescriptor::many_to_one("author", "Author"))
                    .relation(RelationshipDescriptor::many_to_many("tags", "Tag")),
            )
            .unwrap();
        registry
            .add(ModelDescriptor::new("Author").field(FieldDescriptor::short_text("name", 80)))
            .unwrap();
        registry
            .add(ModelDescriptor::new("Tag").field(FieldDescriptor::short_text("label", 40)))
            .unwrap();
        registry
    }

    struct FailingExecutor {
        fail_on: &'static str,
        seen: Vec<String>,
    }

    impl StatementExecutor for FailingExecutor {
        fn execute(&mut self, sql: &str) -> std::result::Result<(), BoxError> {
            self.seen.push(sql.to_string());
            if sql.contains(self.fail_on) {
                return Err(format!("cannot run {}", self.fail_on).into());
            }
            Ok(())
        }
    }

    #[test]
    fn test_sync_runs_every_phase_in_order() {
        let registry = registry();
        let settings = Settings::new(Dialect::PostgreSql);
        let mut run = SchemaRun::new(&settings, &registry, RecordingExecutor::new());
        let report = run.sync();
        assert!(!report.is_failed());

        let keys: Vec<&str> = report.plan.statements().map(|s| s.key.as_str()).collect();
        assert_eq!(
            keys,
            [
                "authors",
                "articles",
                "tags",
                "articles_tags",
                "Article",
                "Article",
                "Article",
                "articles_tags",
                "articles_tags",
            ]
        );
        assert_eq!(run.executor().statements().len(), 9);
    }

    #[test]
    fn test_recreate_drops_first() {
        let registry = registry();
        let settings = Settings::default();
        let mut run = SchemaRun::new(&settings, &registry, RecordingExecutor::new());
        run.recreate();

        let statements = run.into_executor().into_statements();
        assert_eq!(
            statements[..4],
            [
                "DROP TABLE IF EXISTS articles_tags",
                "DROP TABLE IF EXISTS tags",
                "DROP TABLE IF EXISTS articles",
                "DROP TABLE IF EXISTS authors",
            ]
        );
        assert!(statements[4].starts_with("CREATE TABLE authors"));
    }

    #[test]
    fn test_failure_keeps_running_independent_statements() {
        let registry = registry();
        let settings = Settings::default();
        let executor = FailingExecutor {
            fail_on: "CREATE TABLE tags",
            seen: Vec::new(),
        };
        let mut run = SchemaRun::new(&settings, &registry, executor);
        let report = run.sync();

        assert_eq!(run.executor().seen.len(), report.plan.len());
        assert!(matches!(
            report.into_result(),
            Err(SchemaError::Failed(errors))
                if errors.len() == 1 && matches!(&errors[0], SchemaError::Execution { .. })
        ));
    }

    #[test]
    fn test_unresolved_target_fails_run() {
        let mut registry = ModelRegistry::new();
        registry
            .add(
                ModelDescriptor::new("Post")
                    .field(FieldDescriptor::short_text("title", 100))
                    .relation(RelationshipDescriptor::many_to_one("author", "Writer")),
            )
            .unwrap();
        let settings = Settings::default();
        let mut run = SchemaRun::new(&settings, &registry, RecordingExecutor::new());
        let report = run.sync();

        assert_eq!(
            report.plan.create_tables[0].sql,
            "CREATE TABLE posts (\n    id INT NOT NULL PRIMARY KEY AUTO_INCREMENT,\n    title VARCHAR(100) NOT NULL\n)"
        );
        assert!(report.plan.foreign_keys.is_empty());
        assert_eq!(report.errors.len(), 1);

        let second = run.sync();
        assert_eq!(second.errors.len(), 1);
        assert_eq!(second.plan.create_tables.len(), 1);
    }

    #[test]
    fn test_sync_writes_accessors() {
        let registry = registry();
        let settings = Settings::default();
        let dir = tempfile::tempdir().unwrap();
        let mut run = SchemaRun::new(&settings, &registry, RecordingExecutor::new())
            .with_accessors(dir.path(), modelsql_orm::AppendPatcher);

        assert_eq!(run.sync().accessors_written, 4);
        assert_eq!(run.sync().accessors_written, 0);
        assert!(dir.path().join("author.rs").exists());
        assert!(dir.path().join("tag.rs").exists());
    }
}
