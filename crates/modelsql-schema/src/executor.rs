//! Statement execution seam.
//!
//! Connection handling lives outside this crate; a run only needs something
//! that accepts one SQL statement at a time.

use tracing::debug;

use crate::error::BoxError;

/// Executes DDL statements against a database.
pub trait StatementExecutor {
    /// Executes one statement.
    ///
    /// # Errors
    ///
    /// Returns whatever error the underlying database reports.
    fn execute(&mut self, sql: &str) -> Result<(), BoxError>;
}

impl<E: StatementExecutor + ?Sized> StatementExecutor for &mut E {
    fn execute(&mut self, sql: &str) -> Result<(), BoxError> {
        (**self).execute(sql)
    }
}

/// Collects statements instead of running them (dry runs and tests).
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    statements: Vec<String>,
}

impl RecordingExecutor {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements received so far.
    #[must_use]
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Consumes the recorder and returns its statements.
    #[must_use]
    pub fn into_statements(self) -> Vec<String> {
        self.statements
    }
}

impl StatementExecutor for RecordingExecutor {
    fn execute(&mut self, sql: &str) -> Result<(), BoxError> {
        debug!(sql = %sql, "Recording SQL");
        self.statements.push(sql.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<E: StatementExecutor>(mut executor: E, sql: &str) {
        executor.execute(sql).unwrap();
    }

    #[test]
    fn test_recording_executor() {
        let mut executor = RecordingExecutor::new();
        executor.execute("CREATE TABLE tags (id INT)").unwrap();
        run(&mut executor, "DROP TABLE tags");
        assert_eq!(
            executor.into_statements(),
            ["CREATE TABLE tags (id INT)", "DROP TABLE tags"]
        );
    }
}
