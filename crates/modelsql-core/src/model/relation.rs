//! Relationship field descriptors for foreign keys and many-to-many links.

use serde::{Deserialize, Serialize};

use super::field::FieldDescriptor;
use crate::naming::to_column_name;

/// Cardinality of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Unique reference to one row of the target.
    OneToOne,
    /// Plain foreign key.
    ManyToOne,
    /// Link through a join table.
    ManyToMany,
}

/// Behavior of a foreign key when the referenced row is deleted or updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    /// Reject the change at the end of the statement.
    NoAction,
    /// Reject the change immediately.
    Restrict,
    /// Set the referencing column to NULL.
    SetNull,
    /// Propagate the change to referencing rows.
    #[default]
    Cascade,
    /// Set the referencing column to its default.
    SetDefault,
}

impl ReferentialAction {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::SetNull => "SET NULL",
            Self::Cascade => "CASCADE",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// A field referencing another model.
///
/// # Example
///
/// ```
/// use modelsql_core::model::{ReferentialAction, RelationshipDescriptor};
///
/// let author = RelationshipDescriptor::many_to_one("author", "Author")
///     .on_delete(ReferentialAction::SetNull)
///     .null();
/// assert_eq!(author.local_column(), "author_id");
/// assert_eq!(author.referenced_column(), "id");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    #[serde(flatten)]
    field: FieldDescriptor,
    relation: RelationKind,
    target: String,
    #[serde(default)]
    through: Option<String>,
    #[serde(default)]
    db_column: Option<String>,
    #[serde(default)]
    to_table: Option<String>,
    #[serde(default)]
    to_field: Option<String>,
    #[serde(default)]
    on_delete: ReferentialAction,
    #[serde(default)]
    on_update: ReferentialAction,
    #[serde(default)]
    constraint_name: Option<String>,
    #[serde(default)]
    related_name: Option<String>,
}

impl RelationshipDescriptor {
    /// Creates a relationship of `relation` kind named `name` targeting `target`.
    #[must_use]
    pub fn new(name: impl Into<String>, relation: RelationKind, target: impl Into<String>) -> Self {
        Self {
            field: FieldDescriptor::integer(name).into_relationship(),
            relation,
            target: target.into(),
            through: None,
            db_column: None,
            to_table: None,
            to_field: None,
            on_delete: ReferentialAction::default(),
            on_update: ReferentialAction::default(),
            constraint_name: None,
            related_name: None,
        }
    }

    /// Creates a one-to-one relationship.
    #[must_use]
    pub fn one_to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, RelationKind::OneToOne, target)
    }

    /// Creates a many-to-one (foreign key) relationship.
    #[must_use]
    pub fn many_to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, RelationKind::ManyToOne, target)
    }

    /// Creates a many-to-many relationship.
    #[must_use]
    pub fn many_to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, RelationKind::ManyToMany, target)
    }

    /// Delegates the join table to an explicit through-model.
    #[must_use]
    pub fn through(mut self, model: impl Into<String>) -> Self {
        self.through = Some(model.into());
        self
    }

    /// Overrides the local column name (`<field>_id` by default).
    #[must_use]
    pub fn db_column(mut self, column: impl Into<String>) -> Self {
        self.db_column = Some(column.into());
        self
    }

    /// Overrides the referenced table (the target's table by default).
    #[must_use]
    pub fn to_table(mut self, table: impl Into<String>) -> Self {
        self.to_table = Some(table.into());
        self
    }

    /// Overrides the referenced column (`id` by default).
    #[must_use]
    pub fn to_field(mut self, column: impl Into<String>) -> Self {
        self.to_field = Some(column.into());
        self
    }

    /// Sets the `ON DELETE` behavior.
    #[must_use]
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }

    /// Sets the `ON UPDATE` behavior.
    #[must_use]
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = action;
        self
    }

    /// Overrides the foreign key constraint name.
    #[must_use]
    pub fn constraint_name(mut self, name: impl Into<String>) -> Self {
        self.constraint_name = Some(name.into());
        self
    }

    /// Names the reverse navigation from the target back to this model.
    #[must_use]
    pub fn related_name(mut self, name: impl Into<String>) -> Self {
        self.related_name = Some(name.into());
        self
    }

    /// Makes the local column nullable.
    #[must_use]
    pub fn null(mut self) -> Self {
        self.field = self.field.null();
        self
    }

    /// Sets whether the local column is `NOT NULL`.
    #[must_use]
    pub fn required(mut self, value: bool) -> Self {
        self.field = self.field.required(value);
        self
    }

    /// Sets the unique option on the local column.
    #[must_use]
    pub fn unique(mut self, value: bool) -> Self {
        self.field = self.field.unique(value);
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn comment(mut self, value: impl Into<String>) -> Self {
        self.field = self.field.comment(value);
        self
    }

    /// Returns the underlying field descriptor.
    #[must_use]
    pub const fn field(&self) -> &FieldDescriptor {
        &self.field
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.field.name()
    }

    /// Returns the relationship kind.
    #[must_use]
    pub const fn kind(&self) -> RelationKind {
        self.relation
    }

    /// Returns whether this is a many-to-many relationship.
    #[must_use]
    pub const fn is_many_to_many(&self) -> bool {
        matches!(self.relation, RelationKind::ManyToMany)
    }

    /// Returns the target model name as declared.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the through-model name, if any.
    #[must_use]
    pub fn through_model(&self) -> Option<&str> {
        self.through.as_deref()
    }

    /// Local column holding the foreign key.
    #[must_use]
    pub fn local_column(&self) -> String {
        match &self.db_column {
            Some(column) => to_column_name(column),
            None => format!("{}_id", self.field.column_name()),
        }
    }

    /// Referenced table override, if any.
    #[must_use]
    pub fn referenced_table_override(&self) -> Option<&str> {
        self.to_table.as_deref()
    }

    /// Referenced column.
    #[must_use]
    pub fn referenced_column(&self) -> String {
        self.to_field
            .as_deref()
            .map_or_else(|| "id".to_string(), to_column_name)
    }

    /// Returns the `ON DELETE` behavior.
    #[must_use]
    pub const fn delete_action(&self) -> ReferentialAction {
        self.on_delete
    }

    /// Returns the `ON UPDATE` behavior.
    #[must_use]
    pub const fn update_action(&self) -> ReferentialAction {
        self.on_update
    }

    /// Returns the constraint name override, if any.
    #[must_use]
    pub fn constraint_name_override(&self) -> Option<&str> {
        self.constraint_name.as_deref()
    }

    /// Returns the reverse navigation name override, if any.
    #[must_use]
    pub fn related_name_override(&self) -> Option<&str> {
        self.related_name.as_deref()
    }

    /// Name used to navigate from the target back to `owner_model`.
    #[must_use]
    pub fn reverse_name(&self, owner_model: &str) -> String {
        self.related_name
            .as_deref()
            .map_or_else(|| to_column_name(owner_model), to_column_name)
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        if self.field.kind() != super::ColumnKind::Relationship {
            return Err("relationship descriptor must use the relationship kind".to_string());
        }
        if self.target.trim().is_empty() {
            return Err("relationship target is empty".to_string());
        }
        if self.through.is_some() && !self.is_many_to_many() {
            return Err("only many-to-many relationships accept a through-model".to_string());
        }
        if self.field.name().trim().is_empty() {
            return Err("field name is empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnKind;

    #[test]
    fn test_action_sql() {
        assert_eq!(ReferentialAction::Cascade.as_sql(), "CASCADE");
        assert_eq!(ReferentialAction::Restrict.as_sql(), "RESTRICT");
        assert_eq!(ReferentialAction::SetNull.as_sql(), "SET NULL");
        assert_eq!(ReferentialAction::NoAction.as_sql(), "NO ACTION");
        assert_eq!(ReferentialAction::SetDefault.as_sql(), "SET DEFAULT");
    }

    #[test]
    fn test_column_overrides() {
        let rel = RelationshipDescriptor::many_to_one("owner", "Person")
            .db_column("ownerRef")
            .to_field("personCode");
        assert_eq!(rel.local_column(), "owner_ref");
        assert_eq!(rel.referenced_column(), "person_code");
        assert_eq!(rel.field().kind(), ColumnKind::Relationship);
    }

    #[test]
    fn test_reverse_name() {
        let rel = RelationshipDescriptor::many_to_one("author", "Author");
        assert_eq!(rel.reverse_name("BlogPost"), "blog_post");
        let rel = rel.related_name("writings");
        assert_eq!(rel.reverse_name("BlogPost"), "writings");
    }

    #[test]
    fn test_through_requires_many_to_many() {
        let rel = RelationshipDescriptor::many_to_one("author", "Author").through("Authorship");
        assert!(rel.check().is_err());
        let rel = RelationshipDescriptor::many_to_many("authors", "Author").through("Authorship");
        assert!(rel.check().is_ok());
    }

    #[test]
    fn test_deserialize() {
        let rel: RelationshipDescriptor = serde_json::from_str(
            r#"{"name": "author", "kind": "relationship", "relation": "many_to_one",
                "target": "Author", "on_delete": "set_null", "required": false}"#,
        )
        .unwrap();
        assert_eq!(rel.kind(), RelationKind::ManyToOne);
        assert_eq!(rel.delete_action(), ReferentialAction::SetNull);
        assert_eq!(rel.update_action(), ReferentialAction::Cascade);
        assert!(!rel.field().is_required());
    }
}
