//! DDL synthesis from model descriptors.
//!
//! The synthesizer walks models in dependency order and records every
//! statement in a [`SynthesisLedger`]. Tables are created without foreign
//! keys; constraints are added afterwards with `ALTER TABLE` so that the
//! creation order never matters to the database.
//!
//! ```
//! use modelsql_core::model::{FieldDescriptor, ModelDescriptor, ModelRegistry, RelationshipDescriptor};
//! use modelsql_core::Settings;
//! use modelsql_schema::ledger::SynthesisLedger;
//! use modelsql_schema::synthesizer::SchemaSynthesizer;
//!
//! let mut registry = ModelRegistry::new();
//! registry
//!     .add(ModelDescriptor::new("Author").field(FieldDescriptor::short_text("name", 80)))
//!     .unwrap();
//! registry
//!     .add(ModelDescriptor::new("Post").relation(RelationshipDescriptor::many_to_one("author", "Author")))
//!     .unwrap();
//!
//! let settings = Settings::default();
//! let mut ledger = SynthesisLedger::new();
//! SchemaSynthesizer::new(&settings, &registry, &mut ledger).synthesize_all();
//!
//! let plan = ledger.plan();
//! assert_eq!(plan.create_tables.len(), 2);
//! assert_eq!(
//!     plan.foreign_keys[0].sql,
//!     "ALTER TABLE posts ADD CONSTRAINT fk_posts_author_id_authors FOREIGN KEY (author_id) \
//!      REFERENCES authors (id) ON DELETE CASCADE ON UPDATE CASCADE"
//! );
//! ```

use modelsql_core::model::{
    ColumnKind, Field, FieldDescriptor, JoinTable, ModelDescriptor, ModelRegistry,
    ReferentialAction, RelationKind, RelationshipDescriptor,
};
use modelsql_core::{ModelError, Settings};
use tracing::{debug, info};

use crate::error::{Diagnostic, Result};
use crate::ledger::SynthesisLedger;
use crate::plan::AutoNowColumn;

const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

/// Turns model descriptors into DDL recorded in a ledger.
#[derive(Debug)]
pub struct SchemaSynthesizer<'a> {
    settings: &'a Settings,
    registry: &'a ModelRegistry,
    ledger: &'a mut SynthesisLedger,
}

impl<'a> SchemaSynthesizer<'a> {
    /// Creates a synthesizer recording into `ledger`.
    pub fn new(
        settings: &'a Settings,
        registry: &'a ModelRegistry,
        ledger: &'a mut SynthesisLedger,
    ) -> Self {
        Self {
            settings,
            registry,
            ledger,
        }
    }

    /// Returns the ledger being recorded into.
    #[must_use]
    pub fn ledger(&self) -> &SynthesisLedger {
        self.ledger
    }

    /// Synthesizes every registered model in dependency order.
    pub fn synthesize_all(&mut self) {
        let registry = self.registry;
        for model in registry.dependency_order() {
            self.synthesize_model(model);
        }
        info!(
            tables = self.ledger.generated_tables().len(),
            errors = self.ledger.errors().len(),
            "Synthesized schema"
        );
    }

    /// Synthesizes one model: its table, foreign keys and association tables.
    ///
    /// Fields whose relationship target cannot be resolved are skipped and
    /// recorded as errors; everything else is still emitted.
    pub fn synthesize_model(&mut self, model: &ModelDescriptor) {
        let repeated = self.ledger.has_table(&model.table_name());
        self.synthesize_create_table(model);
        if repeated {
            debug!(model = %model.name(), "Model already synthesized in this run");
            return;
        }
        debug!(model = %model.name(), "Synthesizing model");

        for rel in model.relations() {
            if rel.is_many_to_many() {
                if let Err(err) = self.synthesize_many_to_many(model, rel) {
                    self.ledger.fail(err);
                }
            } else if self.registry.referenced_table(model, rel).is_ok() {
                if let Err(err) = self.synthesize_foreign_key(model, rel) {
                    self.ledger.fail(err);
                }
            }
        }
    }

    fn synthesize_many_to_many(
        &mut self,
        model: &ModelDescriptor,
        rel: &RelationshipDescriptor,
    ) -> Result<()> {
        let join = self.registry.association_for(model, rel)?;
        let shared = self.ledger.has_table(&join.table);
        if self.synthesize_association_table(model, rel)?.is_none() || shared {
            return Ok(());
        }
        self.synthesize_association_foreign_keys(model, rel)?;
        self.synthesize_index(&join.table, &join.owner_column);
        self.synthesize_index(&join.table, &join.target_column);
        Ok(())
    }

    /// Builds and records the `CREATE TABLE` statement of `model`.
    ///
    /// Many-to-many fields contribute no column. A second call for the same
    /// table in one run returns the statement again without recording it.
    pub fn synthesize_create_table(&mut self, model: &ModelDescriptor) -> String {
        let settings = self.settings;
        let table = model.table_name();
        if let Some(existing) = self.ledger.tables().get(&table).and_then(|s| s.first()).cloned() {
            self.ledger.record_table(&table, existing.clone());
            return existing;
        }
        let dialect = settings.dialect();
        let indent = settings.indent();

        let mut clauses = vec![format!(
            "{indent}{}",
            dialect.primary_key_clause(settings.auto_increment())
        )];
        let mut comments = Vec::new();

        for field in model.fields() {
            let (descriptor, column, unique) = match field {
                Field::Column(column) => (column, column.column_name(), false),
                Field::Relation(rel) if rel.is_many_to_many() => continue,
                Field::Relation(rel) => {
                    if let Err(err) = self.registry.referenced_table(model, rel) {
                        self.ledger.fail(err.into());
                        continue;
                    }
                    (
                        rel.field(),
                        rel.local_column(),
                        rel.kind() == RelationKind::OneToOne,
                    )
                }
            };

            if let Some(clause) = self.column_clause(&table, &column, descriptor, unique) {
                clauses.push(format!("{indent}{clause}"));
                if let Some(comment) = descriptor.comment_text() {
                    if !dialect.inline_column_comments() {
                        comments.push(format!(
                            "COMMENT ON COLUMN {table}.{column} IS {}",
                            dialect.quote_literal(comment)
                        ));
                    }
                }
            }
        }

        let mut sql = format!("CREATE TABLE {table} (\n{}\n)", clauses.join(",\n"));
        if let Some(comment) = self.table_options(model, &table, &mut sql) {
            comments.push(format!(
                "COMMENT ON TABLE {table} IS {}",
                dialect.quote_literal(&comment)
            ));
        }

        if self.ledger.record_table(&table, sql.clone()) {
            for comment in comments {
                self.ledger.record_table_extra(&table, comment);
            }
        }
        sql
    }

    /// Appends inline table options and returns a comment that has to go
    /// into a separate statement.
    fn table_options(
        &mut self,
        model: &ModelDescriptor,
        table: &str,
        sql: &mut String,
    ) -> Option<String> {
        let settings = self.settings;
        let dialect = settings.dialect();
        let options = model.options();
        let engine = non_empty(options.engine.as_deref().or(settings.default_engine()));
        let charset = non_empty(options.charset.as_deref().or(settings.default_charset()));
        let comment = non_empty(options.comment.as_deref());

        if dialect.inline_table_options() {
            if let Some(engine) = engine {
                sql.push_str(&format!(" ENGINE={engine}"));
            }
            if let Some(charset) = charset {
                sql.push_str(&format!(" DEFAULT CHARSET={charset}"));
            }
            if let Some(comment) = comment {
                sql.push_str(&format!(" COMMENT={}", dialect.quote_literal(comment)));
            }
            return None;
        }

        for (option, value) in [("ENGINE", engine), ("DEFAULT CHARSET", charset)] {
            if value.is_some() {
                self.ledger.diagnose(Diagnostic::OptionIgnored {
                    table: table.to_string(),
                    option,
                    dialect,
                });
            }
        }
        comment.map(str::to_string)
    }

    /// Renders one column clause.
    ///
    /// Returns `None` (and records [`Diagnostic::DialectUnsupported`]) when
    /// the dialect has no template for the field kind.
    pub fn column_clause(
        &mut self,
        table: &str,
        column: &str,
        field: &FieldDescriptor,
        force_unique: bool,
    ) -> Option<String> {
        let dialect = self.settings.dialect();
        let Some(template) = dialect.column_template(field.kind()) else {
            self.ledger.diagnose(Diagnostic::DialectUnsupported {
                table: table.to_string(),
                column: column.to_string(),
                kind: field.kind(),
                dialect,
            });
            return None;
        };

        let mut clause = template
            .replace("{name}", column)
            .replace("{length}", &field.length().to_string())
            .replace("{precision}", &field.precision().to_string())
            .replace("{scale}", &field.scale().to_string());

        let mut nullable_default = false;
        if field.is_auto_now_add() || field.is_auto_now() {
            clause.push_str(&self.auto_now_clause(table, column, field));
        } else if let Some(default) = self.default_clause(field) {
            nullable_default = field.defaults_to_null() && field.kind() != ColumnKind::Boolean;
            clause.push_str(&default);
        }

        if field.is_required() && !nullable_default {
            clause.push_str(" NOT NULL");
        }
        if field.is_unique() || force_unique {
            clause.push_str(" UNIQUE");
        }
        if let Some(comment) = field.comment_text() {
            if dialect.inline_column_comments() {
                clause.push_str(&format!(" COMMENT {}", dialect.quote_literal(comment)));
            }
        }
        Some(clause)
    }

    fn default_clause(&self, field: &FieldDescriptor) -> Option<String> {
        let raw = field.default_value()?.trim();
        if raw.is_empty() {
            return None;
        }

        if field.kind() == ColumnKind::Boolean {
            let truthy = matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
            let literal = match (self.settings.dialect().boolean_default_literals(), truthy) {
                (true, true) => "TRUE",
                (true, false) => "FALSE",
                (false, true) => "1",
                (false, false) => "0",
            };
            return Some(format!(" DEFAULT {literal}"));
        }
        if field.defaults_to_null() {
            return Some(" DEFAULT NULL".to_string());
        }
        Some(format!(" DEFAULT {}", self.settings.dialect().quote_literal(raw)))
    }

    fn auto_now_clause(&mut self, table: &str, column: &str, field: &FieldDescriptor) -> String {
        let dialect = self.settings.dialect();
        let inline = field.kind() == ColumnKind::DateTime && self.settings.inline_auto_now();

        if !inline {
            self.ledger.record_auto_now(AutoNowColumn {
                table: table.to_string(),
                column: column.to_string(),
                on_insert: true,
                on_update: field.is_auto_now(),
            });
            return String::new();
        }

        let mut clause = format!(" DEFAULT {CURRENT_TIMESTAMP}");
        if field.is_auto_now() {
            if dialect.on_update_current_timestamp() {
                clause.push_str(&format!(" ON UPDATE {CURRENT_TIMESTAMP}"));
            } else {
                self.ledger.record_auto_now(AutoNowColumn {
                    table: table.to_string(),
                    column: column.to_string(),
                    on_insert: false,
                    on_update: true,
                });
            }
        }
        clause
    }

    /// Builds and records the foreign key of a one-to-one or many-to-one
    /// relationship.
    ///
    /// # Errors
    ///
    /// Fails when the target cannot be resolved, or for a many-to-many
    /// relationship, which has no local column.
    pub fn synthesize_foreign_key(
        &mut self,
        model: &ModelDescriptor,
        rel: &RelationshipDescriptor,
    ) -> Result<String> {
        if rel.is_many_to_many() {
            return Err(ModelError::InvalidField {
                model: model.name().to_string(),
                field: rel.name().to_string(),
                reason: "many-to-many relationships have no foreign key column".to_string(),
            }
            .into());
        }

        let table = model.table_name();
        let column = rel.local_column();
        let referenced_table = self.registry.referenced_table(model, rel)?;
        let constraint = rel.constraint_name_override().map_or_else(
            || format!("fk_{table}_{column}_{referenced_table}"),
            str::to_string,
        );

        let sql = self.foreign_key_sql(
            &table,
            &constraint,
            &column,
            &referenced_table,
            &rel.referenced_column(),
            rel,
        );
        self.ledger.record_foreign_key(model.name(), sql.clone());
        Ok(sql)
    }

    fn foreign_key_sql(
        &mut self,
        table: &str,
        constraint: &str,
        column: &str,
        referenced_table: &str,
        referenced_column: &str,
        rel: &RelationshipDescriptor,
    ) -> String {
        let dialect = self.settings.dialect();
        let mut sql = format!(
            "ALTER TABLE {table} ADD CONSTRAINT {constraint} FOREIGN KEY ({column}) \
             REFERENCES {referenced_table} ({referenced_column})"
        );

        let delete = rel.delete_action();
        let update = rel.update_action();
        let clauses = [
            ("ON DELETE", delete, dialect.supports_on_delete(delete)),
            ("ON UPDATE", update, dialect.supports_on_update(update)),
        ];
        for (clause, action, supported) in clauses {
            if supported {
                sql.push_str(&format!(" {clause} {}", action.as_sql()));
            } else if action == ReferentialAction::NoAction {
                debug!(constraint = %constraint, clause, "Omitting default NO ACTION clause");
            } else {
                self.ledger.diagnose(Diagnostic::ActionSuppressed {
                    constraint: constraint.to_string(),
                    clause,
                    action,
                    dialect,
                });
            }
        }
        sql
    }

    /// Builds and records the association table of a many-to-many
    /// relationship.
    ///
    /// Returns `Ok(None)` when a through-model owns the join table.
    ///
    /// # Errors
    ///
    /// Fails when the target or through-model cannot be resolved.
    pub fn synthesize_association_table(
        &mut self,
        model: &ModelDescriptor,
        rel: &RelationshipDescriptor,
    ) -> Result<Option<String>> {
        let join = self.join_table(model, rel)?;
        if join.through {
            debug!(model = %model.name(), field = %rel.name(), "Join table owned by through-model");
            return Ok(None);
        }

        let settings = self.settings;
        let dialect = settings.dialect();
        let indent = settings.indent();
        let JoinTable {
            table,
            owner_column,
            target_column,
            ..
        } = &join;
        let column_type = dialect
            .column_template(ColumnKind::Relationship)
            .unwrap_or("{name} INT");

        let clauses = [
            dialect
                .primary_key_clause(settings.auto_increment())
                .to_string(),
            format!("{} NOT NULL", column_type.replace("{name}", owner_column)),
            format!("{} NOT NULL", column_type.replace("{name}", target_column)),
            format!("CONSTRAINT unq_{table} UNIQUE ({owner_column}, {target_column})"),
        ];
        let mut sql = format!(
            "CREATE TABLE {table} (\n{}\n)",
            clauses
                .iter()
                .map(|clause| format!("{indent}{clause}"))
                .collect::<Vec<_>>()
                .join(",\n")
        );
        if dialect.inline_table_options() {
            let options = model.options();
            let engine = non_empty(options.engine.as_deref().or(settings.default_engine()));
            let charset = non_empty(options.charset.as_deref().or(settings.default_charset()));
            if let Some(engine) = engine {
                sql.push_str(&format!(" ENGINE={engine}"));
            }
            if let Some(charset) = charset {
                sql.push_str(&format!(" DEFAULT CHARSET={charset}"));
            }
        }

        self.ledger.record_association(table, sql.clone());
        Ok(Some(sql))
    }

    /// Builds and records the two foreign keys of a synthesized association
    /// table under the owning model. Returns nothing for through-models.
    ///
    /// # Errors
    ///
    /// Fails when the target or through-model cannot be resolved.
    pub fn synthesize_association_foreign_keys(
        &mut self,
        model: &ModelDescriptor,
        rel: &RelationshipDescriptor,
    ) -> Result<Vec<String>> {
        let join = self.join_table(model, rel)?;
        if join.through {
            return Ok(Vec::new());
        }
        let target = self.registry.resolve_target(model, rel)?;

        let sides = [
            (&join.owner_column, model.table_name()),
            (&join.target_column, target.table_name()),
        ];
        let mut statements = Vec::with_capacity(sides.len());
        for (column, referenced_table) in sides {
            let constraint = format!("fk_{}_{column}_{referenced_table}", join.table);
            let sql = self.foreign_key_sql(
                &join.table,
                &constraint,
                column,
                &referenced_table,
                "id",
                rel,
            );
            self.ledger.record_foreign_key(model.name(), sql.clone());
            statements.push(sql);
        }
        Ok(statements)
    }

    /// Builds and records `CREATE INDEX idx_<table>_<column>`.
    pub fn synthesize_index(&mut self, table: &str, column: &str) -> String {
        let sql = format!("CREATE INDEX idx_{table}_{column} ON {table} ({column})");
        self.ledger.record_index(table, sql.clone());
        sql
    }

    /// Records `DROP TABLE` statements for every registered model.
    ///
    /// Association tables are dropped first, then model tables in reverse
    /// dependency order.
    pub fn synthesize_drop_tables(&mut self) {
        let dialect = self.settings.dialect();
        let registry = self.registry;

        for model in registry.iter() {
            for rel in model.relations().filter(|rel| rel.is_many_to_many()) {
                match self.join_table(model, rel) {
                    Ok(join) if join.through => {}
                    Ok(join) => {
                        self.ledger
                            .record_drop(&join.table, dialect.drop_table(&join.table));
                    }
                    Err(err) => self.ledger.fail(err),
                }
            }
        }

        for model in registry.dependency_order().into_iter().rev() {
            let table = model.table_name();
            self.ledger.record_drop(&table, dialect.drop_table(&table));
        }
    }

    fn join_table(&self, model: &ModelDescriptor, rel: &RelationshipDescriptor) -> Result<JoinTable> {
        Ok(self.registry.association_for(model, rel)?)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
