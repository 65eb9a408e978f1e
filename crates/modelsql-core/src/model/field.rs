//! Column field descriptors.

use serde::{Deserialize, Serialize};

use crate::naming::to_column_name;

/// Raw default value meaning "default to SQL NULL".
pub const NULL_SENTINEL: &str = "NULL";

/// Storage kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Unbounded text.
    Text,
    /// Length-limited text.
    ShortText,
    /// Integer.
    Integer,
    /// Fixed-point decimal with precision and scale.
    Decimal,
    /// Floating point.
    Float,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    DateTime,
    /// Reference to another model.
    Relationship,
}

impl ColumnKind {
    /// Whether the kind holds a date and/or time.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::DateTime)
    }
}

const fn default_true() -> bool {
    true
}

/// A declared model field.
///
/// # Example
///
/// ```
/// use modelsql_core::model::FieldDescriptor;
///
/// let field = FieldDescriptor::short_text("firstName", 120)
///     .unique(true)
///     .comment("Given name");
/// assert_eq!(field.column_name(), "first_name");
/// assert!(field.is_required());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    name: String,
    kind: ColumnKind,
    #[serde(default)]
    length: u32,
    #[serde(default)]
    precision: u8,
    #[serde(default)]
    scale: u8,
    #[serde(default = "default_true")]
    required: bool,
    #[serde(default)]
    unique: bool,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    auto_now_add: bool,
    #[serde(default)]
    auto_now: bool,
}

impl FieldDescriptor {
    /// Creates a field of the given kind with default options.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            length: 0,
            precision: 0,
            scale: 0,
            required: true,
            unique: false,
            default: None,
            comment: None,
            auto_now_add: false,
            auto_now: false,
        }
    }

    /// Unbounded text field.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    /// Text field limited to `length` characters.
    #[must_use]
    pub fn short_text(name: impl Into<String>, length: u32) -> Self {
        let mut field = Self::new(name, ColumnKind::ShortText);
        field.length = length;
        field
    }

    /// Integer field.
    #[must_use]
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Integer)
    }

    /// Decimal field with `precision` total digits and `scale` fractional digits.
    #[must_use]
    pub fn decimal(name: impl Into<String>, precision: u8, scale: u8) -> Self {
        let mut field = Self::new(name, ColumnKind::Decimal);
        field.precision = precision;
        field.scale = scale;
        field
    }

    /// Floating point field.
    #[must_use]
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Float)
    }

    /// Boolean field.
    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Boolean)
    }

    /// Date field.
    #[must_use]
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Date)
    }

    /// Time field.
    #[must_use]
    pub fn time(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Time)
    }

    /// Date-time field.
    #[must_use]
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::DateTime)
    }

    /// Sets whether the column is `NOT NULL`.
    #[must_use]
    pub fn required(mut self, value: bool) -> Self {
        self.required = value;
        self
    }

    /// Makes the column nullable.
    #[must_use]
    pub fn null(self) -> Self {
        self.required(false)
    }

    /// Sets the unique option.
    #[must_use]
    pub fn unique(mut self, value: bool) -> Self {
        self.unique = value;
        self
    }

    /// Sets the raw default value. Use [`NULL_SENTINEL`] for a NULL default.
    #[must_use]
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn comment(mut self, value: impl Into<String>) -> Self {
        self.comment = Some(value.into());
        self
    }

    /// Fills the column with the current time on insert.
    #[must_use]
    pub fn auto_now_add(mut self) -> Self {
        self.auto_now_add = true;
        self
    }

    /// Refreshes the column with the current time on every update.
    #[must_use]
    pub fn auto_now(mut self) -> Self {
        self.auto_now = true;
        self
    }

    /// Sets the maximum length.
    #[must_use]
    pub fn max_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub(crate) fn into_relationship(mut self) -> Self {
        self.kind = ColumnKind::Relationship;
        self
    }

    /// Returns the declared field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the snake_case column name.
    #[must_use]
    pub fn column_name(&self) -> String {
        to_column_name(&self.name)
    }

    /// Returns the column kind.
    #[must_use]
    pub const fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Returns the maximum length.
    #[must_use]
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Returns the decimal precision.
    #[must_use]
    pub const fn precision(&self) -> u8 {
        self.precision
    }

    /// Returns the decimal scale.
    #[must_use]
    pub const fn scale(&self) -> u8 {
        self.scale
    }

    /// Returns whether the column is `NOT NULL`.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns whether the column is unique.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns the raw default value, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Returns whether the default is the NULL sentinel.
    #[must_use]
    pub fn defaults_to_null(&self) -> bool {
        self.default
            .as_deref()
            .is_some_and(|value| value.trim().eq_ignore_ascii_case(NULL_SENTINEL))
    }

    /// Returns the comment, if any.
    #[must_use]
    pub fn comment_text(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.is_empty())
    }

    /// Returns whether the column is set on insert.
    #[must_use]
    pub const fn is_auto_now_add(&self) -> bool {
        self.auto_now_add
    }

    /// Returns whether the column is refreshed on update.
    #[must_use]
    pub const fn is_auto_now(&self) -> bool {
        self.auto_now
    }

    /// Checks the declaration for inconsistencies.
    pub(crate) fn check(&self) -> Result<(), String> {
        match self.kind {
            ColumnKind::ShortText if self.length == 0 => {
                return Err("short text fields need a length greater than zero".to_string());
            }
            ColumnKind::Decimal if self.precision == 0 => {
                return Err("decimal fields need a precision greater than zero".to_string());
            }
            ColumnKind::Decimal if self.scale > self.precision => {
                return Err(format!(
                    "decimal scale {} exceeds precision {}",
                    self.scale, self.precision
                ));
            }
            _ => {}
        }

        if (self.auto_now_add || self.auto_now) && !self.kind.is_temporal() {
            return Err("auto-now options only apply to date and time fields".to_string());
        }

        if self.name.trim().is_empty() {
            return Err("field name is empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let field = FieldDescriptor::integer("idade");
        assert_eq!(field.kind(), ColumnKind::Integer);
        assert!(field.is_required());
        assert!(!field.is_unique());
        assert_eq!(field.default_value(), None);
    }

    #[test]
    fn test_null_sentinel_is_case_insensitive() {
        assert!(FieldDescriptor::text("bio").default("null").defaults_to_null());
        assert!(FieldDescriptor::text("bio").default(" NULL ").defaults_to_null());
        assert!(!FieldDescriptor::text("bio").default("nullable").defaults_to_null());
    }

    #[test]
    fn test_check_rejects_inconsistent_fields() {
        assert!(FieldDescriptor::short_text("nome", 0).check().is_err());
        assert!(FieldDescriptor::decimal("preco", 4, 6).check().is_err());
        assert!(FieldDescriptor::integer("idade").auto_now().check().is_err());
        assert!(FieldDescriptor::datetime("criado").auto_now_add().check().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let field: FieldDescriptor =
            serde_json::from_str(r#"{"name": "nome", "kind": "short_text", "length": 50}"#)
                .unwrap();
        assert_eq!(field, FieldDescriptor::short_text("nome", 50));
    }
}
