//! Dialect-aware DDL synthesis for modelsql models.
//!
//! `modelsql-schema` turns a [`ModelRegistry`](modelsql_core::model::ModelRegistry)
//! into the statements that create (or drop) its tables:
//! - Tables are created without constraints, one per model
//! - Many-to-many relationships without a through-model get an
//!   association table with a unique pair constraint and two indexes
//! - Foreign keys are added afterwards with `ALTER TABLE`, so creation
//!   order never matters to the database
//!
//! # Architecture
//!
//! - **Synthesizer** - Renders `CREATE TABLE`, foreign keys, association
//!   tables, indexes and drops for one dialect
//! - **Ledger** - Keeps every statement once per run, grouped by phase
//! - **Plan** - The ordered statements of a run, printable as a script
//! - **Runner** - Executes a plan and collects diagnostics and errors
//!
//! # Example
//!
//! ```rust
//! use modelsql_core::model::{FieldDescriptor, ModelDescriptor, ModelRegistry, RelationshipDescriptor};
//! use modelsql_core::{Dialect, Settings};
//! use modelsql_schema::prelude::*;
//!
//! let mut registry = ModelRegistry::new();
//! registry
//!     .add(
//!         ModelDescriptor::new("Article")
//!             .field(FieldDescriptor::short_text("title", 200))
//!             .relation(RelationshipDescriptor::many_to_many("tags", "Tag")),
//!     )
//!     .unwrap();
//! registry
//!     .add(ModelDescriptor::new("Tag").field(FieldDescriptor::short_text("label", 40)))
//!     .unwrap();
//!
//! let settings = Settings::new(Dialect::PostgreSql);
//! let mut run = SchemaRun::new(&settings, &registry, RecordingExecutor::new());
//! let report = run.sync().into_result().unwrap();
//!
//! assert_eq!(report.plan.association_tables[0].key, "articles_tags");
//! assert_eq!(report.plan.foreign_keys.len(), 2);
//! assert_eq!(report.plan.indexes.len(), 2);
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the DDL of a model document
//! modelsql --models models.json sqlall
//!
//! # Drop and create every table (printed, not executed)
//! modelsql --models models.json --dialect postgresql recreate
//!
//! # Write relationship accessors into src/models
//! modelsql --models models.json accessors --source-root src/models --write
//! ```

pub mod error;
pub mod executor;
pub mod ledger;
pub mod plan;
pub mod runner;
pub mod synthesizer;

pub use error::{Diagnostic, Result, SchemaError};
pub use executor::{RecordingExecutor, StatementExecutor};
pub use ledger::SynthesisLedger;
pub use plan::{AutoNowColumn, DdlPlan, Statement};
pub use runner::{RunReport, SchemaRun};
pub use synthesizer::SchemaSynthesizer;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Diagnostic, Result, SchemaError};
    pub use crate::executor::{RecordingExecutor, StatementExecutor};
    pub use crate::plan::DdlPlan;
    pub use crate::runner::{RunReport, SchemaRun};
    pub use crate::synthesizer::SchemaSynthesizer;
}
