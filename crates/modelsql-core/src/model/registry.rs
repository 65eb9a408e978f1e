//! The set of models known to one run.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::debug;

use super::descriptor::{Model, ModelDescriptor};
use super::relation::{RelationKind, RelationshipDescriptor};
use crate::error::{ModelError, Result};
use crate::naming::{association_table_name, to_column_name};
use crate::settings::Settings;

/// Physical join table behind a many-to-many relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTable {
    /// Join table name.
    pub table: String,
    /// Column pointing at the declaring model.
    pub owner_column: String,
    /// Column pointing at the target model.
    pub target_column: String,
    /// Whether the table belongs to an explicit through-model.
    pub through: bool,
}

impl JoinTable {
    /// Synthesized association table between two models.
    ///
    /// Columns are `<owner>_id` and `<target>_id`, or `from_<x>_id` and
    /// `to_<x>_id` when both sides are the same model.
    #[must_use]
    pub fn synthesized(
        owner_name: &str,
        owner_table: &str,
        target_name: &str,
        target_table: &str,
    ) -> Self {
        let owner_snake = to_column_name(owner_name);
        let target_snake = to_column_name(target_name);
        let (owner_column, target_column) = if owner_snake == target_snake {
            (format!("from_{owner_snake}_id"), format!("to_{target_snake}_id"))
        } else {
            (format!("{owner_snake}_id"), format!("{target_snake}_id"))
        };

        Self {
            table: association_table_name(owner_table, target_table),
            owner_column,
            target_column,
            through: false,
        }
    }
}

/// A declarative model document: optional settings plus model descriptors.
///
/// ```
/// use modelsql_core::model::ModelDocument;
///
/// let doc = ModelDocument::from_json(
///     r#"{"settings": {"dialect": "h2"}, "models": [{"name": "Tag", "fields": []}]}"#,
/// )
/// .unwrap();
/// assert_eq!(doc.models.len(), 1);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelDocument {
    /// Settings embedded in the document.
    #[serde(default)]
    pub settings: Option<Settings>,
    /// Model descriptors in registration order.
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}

impl ModelDocument {
    /// Parses a JSON model document.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Json`] when the text is not a valid document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Registers every model of the document.
    ///
    /// # Errors
    ///
    /// Returns the first registration error.
    pub fn into_registry(self) -> Result<ModelRegistry> {
        let mut registry = ModelRegistry::new();
        for model in self.models {
            registry.add(model)?;
        }
        Ok(registry)
    }
}

/// Model descriptors in registration order.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model type.
    ///
    /// # Errors
    ///
    /// See [`ModelRegistry::add`].
    pub fn register<M: Model>(&mut self) -> Result<()> {
        self.add(M::descriptor())
    }

    /// Registers a descriptor after validating its fields.
    ///
    /// Relationship targets are resolved lazily, so models may be added in
    /// any order.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateModel`], [`ModelError::DuplicateField`]
    /// or [`ModelError::InvalidField`].
    pub fn add(&mut self, descriptor: ModelDescriptor) -> Result<()> {
        if self.get(descriptor.name()).is_some() {
            return Err(ModelError::DuplicateModel(descriptor.name().to_string()));
        }

        let mut seen = HashSet::new();
        for field in descriptor.fields() {
            let column = to_column_name(field.name());
            if column == "id" || !seen.insert(column) {
                return Err(ModelError::DuplicateField {
                    model: descriptor.name().to_string(),
                    field: field.name().to_string(),
                });
            }
            field.check().map_err(|reason| ModelError::InvalidField {
                model: descriptor.name().to_string(),
                field: field.name().to_string(),
                reason,
            })?;
        }

        debug!(
            model = %descriptor.name(),
            table = %descriptor.table_name(),
            fields = descriptor.fields().len(),
            "Registered model"
        );
        self.models.push(descriptor);
        Ok(())
    }

    /// Parses a JSON model document and registers its models.
    ///
    /// # Errors
    ///
    /// Returns a parse or registration error.
    pub fn from_json(json: &str) -> Result<Self> {
        ModelDocument::from_json(json)?.into_registry()
    }

    /// Looks up a model by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|model| model.name() == name)
    }

    /// Looks up a model by its table name.
    #[must_use]
    pub fn get_by_table(&self, table: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|model| model.table_name() == table)
    }

    /// Iterates over the models in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter()
    }

    /// Returns the number of registered models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns whether no model is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Resolves the target model of `rel`, declared on `owner`.
    ///
    /// An exact name match wins. Otherwise every model whose name matches
    /// case-insensitively, whose table name equals the target, or whose
    /// snake_case name equals the target's is a candidate.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnresolvedRelationship`] when nothing matches and
    /// [`ModelError::AmbiguousRelationship`] when several models do.
    pub fn resolve_target(
        &self,
        owner: &ModelDescriptor,
        rel: &RelationshipDescriptor,
    ) -> Result<&ModelDescriptor> {
        self.resolve_named(owner, rel, rel.target())
    }

    /// Resolves the through-model of a many-to-many relationship.
    ///
    /// # Errors
    ///
    /// Same as [`ModelRegistry::resolve_target`].
    pub fn resolve_through(
        &self,
        owner: &ModelDescriptor,
        rel: &RelationshipDescriptor,
    ) -> Result<Option<&ModelDescriptor>> {
        rel.through_model()
            .map(|through| self.resolve_named(owner, rel, through))
            .transpose()
    }

    fn resolve_named(
        &self,
        owner: &ModelDescriptor,
        rel: &RelationshipDescriptor,
        target: &str,
    ) -> Result<&ModelDescriptor> {
        if let Some(model) = self.get(target) {
            return Ok(model);
        }

        let snake = to_column_name(target);
        let candidates: Vec<&ModelDescriptor> = self
            .models
            .iter()
            .filter(|model| {
                model.name().eq_ignore_ascii_case(target)
                    || model.table_name() == target
                    || to_column_name(model.name()) == snake
            })
            .collect();

        match candidates.as_slice() {
            [model] => Ok(model),
            [] => Err(ModelError::UnresolvedRelationship {
                model: owner.name().to_string(),
                field: rel.name().to_string(),
                target: target.to_string(),
            }),
            many => Err(ModelError::AmbiguousRelationship {
                model: owner.name().to_string(),
                field: rel.name().to_string(),
                target: target.to_string(),
                candidates: many.iter().map(|m| m.name().to_string()).collect(),
            }),
        }
    }

    /// Table referenced by a one-to-one or many-to-one relationship.
    ///
    /// # Errors
    ///
    /// Fails when the target cannot be resolved.
    pub fn referenced_table(
        &self,
        owner: &ModelDescriptor,
        rel: &RelationshipDescriptor,
    ) -> Result<String> {
        if let Some(table) = rel.referenced_table_override() {
            return Ok(to_column_name(table));
        }
        Ok(self.resolve_target(owner, rel)?.table_name())
    }

    /// Models ordered so relationship targets come before the models
    /// pointing at them. A cycle is broken at its first back edge, leaving
    /// those models in visiting order.
    #[must_use]
    pub fn dependency_order(&self) -> Vec<&ModelDescriptor> {
        let mut done = vec![false; self.models.len()];
        let mut visiting = vec![false; self.models.len()];
        let mut order = Vec::with_capacity(self.models.len());

        for index in 0..self.models.len() {
            self.visit(index, &mut done, &mut visiting, &mut order);
        }
        order
    }

    fn visit<'a>(
        &'a self,
        index: usize,
        done: &mut [bool],
        visiting: &mut [bool],
        order: &mut Vec<&'a ModelDescriptor>,
    ) {
        if done[index] || visiting[index] {
            return;
        }
        visiting[index] = true;

        let model = &self.models[index];
        for rel in model.relations().filter(|rel| !rel.is_many_to_many()) {
            let Ok(target) = self.resolve_target(model, rel) else {
                continue;
            };
            if let Some(target_index) = self.position(target.name()) {
                if target_index != index {
                    self.visit(target_index, done, visiting, order);
                }
            }
        }

        visiting[index] = false;
        done[index] = true;
        order.push(model);
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|model| model.name() == name)
    }

    /// Relationships on other models that resolve to `target`.
    #[must_use]
    pub fn reverse_relations(
        &self,
        target: &str,
    ) -> Vec<(&ModelDescriptor, &RelationshipDescriptor)> {
        self.models
            .iter()
            .flat_map(|model| model.relations().map(move |rel| (model, rel)))
            .filter(|(model, rel)| {
                self.resolve_target(model, rel)
                    .is_ok_and(|resolved| resolved.name() == target)
            })
            .collect()
    }

    /// Join table behind the many-to-many relationship `rel` of `owner`.
    ///
    /// Without a through-model the table is `<owner table>_<target table>`
    /// with `<owner>_id` and `<target>_id` columns, or `from_<x>_id` and
    /// `to_<x>_id` when the relationship points back at its owner. A
    /// through-model contributes its own table and its relationship columns
    /// towards each side.
    ///
    /// # Errors
    ///
    /// Fails when the target or through-model cannot be resolved, or when the
    /// through-model lacks a relationship towards either side.
    pub fn association_for(
        &self,
        owner: &ModelDescriptor,
        rel: &RelationshipDescriptor,
    ) -> Result<JoinTable> {
        let target = self.resolve_target(owner, rel)?;

        if let Some(through) = self.resolve_through(owner, rel)? {
            return self.through_join_table(owner, rel, target, through);
        }

        Ok(JoinTable::synthesized(
            owner.name(),
            &owner.table_name(),
            target.name(),
            &target.table_name(),
        ))
    }

    fn through_join_table(
        &self,
        owner: &ModelDescriptor,
        rel: &RelationshipDescriptor,
        target: &ModelDescriptor,
        through: &ModelDescriptor,
    ) -> Result<JoinTable> {
        let links: Vec<(&RelationshipDescriptor, &str)> = through
            .relations()
            .filter(|link| link.kind() != RelationKind::ManyToMany)
            .filter_map(|link| {
                self.resolve_target(through, link)
                    .ok()
                    .map(|resolved| (link, resolved.name()))
            })
            .collect();

        let owner_link = links.iter().find(|(_, name)| *name == owner.name());
        let target_link = links
            .iter()
            .filter(|(_, name)| *name == target.name())
            .find(|(link, _)| owner_link.map_or(true, |(o, _)| o.name() != link.name()));

        match (owner_link, target_link) {
            (Some((owner_link, _)), Some((target_link, _))) => Ok(JoinTable {
                table: through.table_name(),
                owner_column: owner_link.local_column(),
                target_column: target_link.local_column(),
                through: true,
            }),
            _ => Err(ModelError::InvalidField {
                model: owner.name().to_string(),
                field: rel.name().to_string(),
                reason: format!(
                    "through-model '{}' needs relationships to both '{}' and '{}'",
                    through.name(),
                    owner.name(),
                    target.name()
                ),
            }),
        }
    }
}
