//! Model descriptors.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::field::{ColumnKind, FieldDescriptor};
use super::relation::RelationshipDescriptor;
use crate::naming::to_table_name;

/// One declared field: a plain column or a relationship.
///
/// In a document, an entry with a `target` or `relation` key is a
/// relationship and may leave out `"kind": "relationship"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Field {
    /// Reference to another model.
    Relation(RelationshipDescriptor),
    /// Plain column.
    Column(FieldDescriptor),
}

impl Field {
    /// Returns the declared field name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Relation(rel) => rel.name(),
            Self::Column(field) => field.name(),
        }
    }

    /// Returns the relationship, if this field is one.
    #[must_use]
    pub const fn as_relation(&self) -> Option<&RelationshipDescriptor> {
        match self {
            Self::Relation(rel) => Some(rel),
            Self::Column(_) => None,
        }
    }

    /// Returns the plain column, if this field is one.
    #[must_use]
    pub const fn as_column(&self) -> Option<&FieldDescriptor> {
        match self {
            Self::Column(field) => Some(field),
            Self::Relation(_) => None,
        }
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        match self {
            Self::Relation(rel) => rel.check(),
            Self::Column(field) if field.kind() == ColumnKind::Relationship => {
                Err("relationship fields need a relation kind and a target".to_string())
            }
            Self::Column(field) => field.check(),
        }
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = Value::deserialize(deserializer)?;
        let is_relation = value
            .as_object()
            .is_some_and(|entry| entry.contains_key("target") || entry.contains_key("relation"));

        if !is_relation {
            return FieldDescriptor::deserialize(value)
                .map(Self::Column)
                .map_err(D::Error::custom);
        }
        if let Some(entry) = value.as_object_mut() {
            entry
                .entry("kind")
                .or_insert_with(|| Value::from("relationship"));
        }
        RelationshipDescriptor::deserialize(value)
            .map(Self::Relation)
            .map_err(D::Error::custom)
    }
}

impl From<FieldDescriptor> for Field {
    fn from(field: FieldDescriptor) -> Self {
        Self::Column(field)
    }
}

impl From<RelationshipDescriptor> for Field {
    fn from(rel: RelationshipDescriptor) -> Self {
        Self::Relation(rel)
    }
}

/// Table-level storage options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Storage engine, e.g. `InnoDB`.
    pub engine: Option<String>,
    /// Default character set, e.g. `utf8mb4`.
    pub charset: Option<String>,
    /// Table comment.
    pub comment: Option<String>,
}

/// Everything the synthesizers need to know about one model type.
///
/// # Example
///
/// ```
/// use modelsql_core::model::{FieldDescriptor, ModelDescriptor, RelationshipDescriptor};
///
/// let post = ModelDescriptor::new("BlogPost")
///     .field(FieldDescriptor::short_text("title", 200))
///     .relation(RelationshipDescriptor::many_to_one("author", "Author"));
/// assert_eq!(post.table_name(), "blog_posts");
/// assert_eq!(post.relations().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    name: String,
    #[serde(default, rename = "table")]
    table_override: Option<String>,
    #[serde(default)]
    fields: Vec<Field>,
    #[serde(default)]
    options: EngineOptions,
}

impl ModelDescriptor {
    /// Creates an empty descriptor for the model type `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_override: None,
            fields: Vec::new(),
            options: EngineOptions::default(),
        }
    }

    /// Overrides the derived table name.
    #[must_use]
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table_override = Some(name.into());
        self
    }

    /// Appends a plain column.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(Field::Column(field));
        self
    }

    /// Appends a relationship.
    #[must_use]
    pub fn relation(mut self, rel: RelationshipDescriptor) -> Self {
        self.fields.push(Field::Relation(rel));
        self
    }

    /// Sets the storage engine.
    #[must_use]
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.options.engine = Some(engine.into());
        self
    }

    /// Sets the default charset.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.options.charset = Some(charset.into());
        self
    }

    /// Sets the table comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.options.comment = Some(comment.into());
        self
    }

    /// Returns the model type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the table name, derived or overridden.
    #[must_use]
    pub fn table_name(&self) -> String {
        to_table_name(&self.name, self.table_override.as_deref())
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Iterates over plain columns.
    pub fn columns(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter_map(Field::as_column)
    }

    /// Iterates over relationships.
    pub fn relations(&self) -> impl Iterator<Item = &RelationshipDescriptor> {
        self.fields.iter().filter_map(Field::as_relation)
    }

    /// Looks up a field by declared name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Looks up a relationship by declared name.
    #[must_use]
    pub fn get_relation(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.relations().find(|rel| rel.name() == name)
    }

    /// Returns the storage options.
    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }
}

/// A type that describes its own table layout.
///
/// ```
/// use modelsql_core::model::{FieldDescriptor, Model, ModelDescriptor};
///
/// struct Tag;
///
/// impl Model for Tag {
///     fn descriptor() -> ModelDescriptor {
///         ModelDescriptor::new("Tag").field(FieldDescriptor::short_text("label", 40).unique(true))
///     }
/// }
///
/// assert_eq!(Tag::descriptor().table_name(), "tags");
/// ```
pub trait Model {
    /// Builds the descriptor for this model.
    fn descriptor() -> ModelDescriptor;
}
