//! Immutable configuration shared by synthesis and translation.

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;

/// Configuration threaded into the schema synthesizer and lookup translator.
///
/// Built once (from defaults, a model document or CLI flags) and passed by
/// reference afterwards; nothing mutates it during a run.
///
/// # Example
///
/// ```
/// use modelsql_core::{Dialect, Settings};
///
/// let settings = Settings::new(Dialect::PostgreSql)
///     .with_indent("  ")
///     .with_auto_increment(false);
/// assert_eq!(settings.dialect(), Dialect::PostgreSql);
/// assert!(!settings.auto_increment());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    dialect: Dialect,
    indent: String,
    auto_increment: bool,
    default_engine: Option<String>,
    default_charset: Option<String>,
    inline_auto_now: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            indent: "    ".to_string(),
            auto_increment: true,
            default_engine: None,
            default_charset: None,
            inline_auto_now: true,
        }
    }
}

impl Settings {
    /// Creates settings for `dialect` with default options.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Sets the dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Sets the column indentation used inside `CREATE TABLE`.
    #[must_use]
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Enables or disables auto-increment surrogate keys.
    #[must_use]
    pub fn with_auto_increment(mut self, enabled: bool) -> Self {
        self.auto_increment = enabled;
        self
    }

    /// Sets the storage engine used when a model does not name one.
    #[must_use]
    pub fn with_default_engine(mut self, engine: impl Into<String>) -> Self {
        self.default_engine = Some(engine.into());
        self
    }

    /// Sets the charset used when a model does not name one.
    #[must_use]
    pub fn with_default_charset(mut self, charset: impl Into<String>) -> Self {
        self.default_charset = Some(charset.into());
        self
    }

    /// Chooses between inline `CURRENT_TIMESTAMP` defaults and recording
    /// auto-now columns for the application.
    ///
    /// Older MySQL releases only allow one such `TIMESTAMP` column per table.
    #[must_use]
    pub fn with_inline_auto_now(mut self, enabled: bool) -> Self {
        self.inline_auto_now = enabled;
        self
    }

    /// Returns the dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns the column indentation string.
    #[must_use]
    pub fn indent(&self) -> &str {
        &self.indent
    }

    /// Returns whether surrogate keys auto-increment.
    #[must_use]
    pub const fn auto_increment(&self) -> bool {
        self.auto_increment
    }

    /// Returns the default storage engine.
    #[must_use]
    pub fn default_engine(&self) -> Option<&str> {
        self.default_engine.as_deref()
    }

    /// Returns the default charset.
    #[must_use]
    pub fn default_charset(&self) -> Option<&str> {
        self.default_charset.as_deref()
    }

    /// Whether auto-now timestamps are written as inline column defaults.
    #[must_use]
    pub const fn inline_auto_now(&self) -> bool {
        self.inline_auto_now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.dialect(), Dialect::MySql);
        assert_eq!(settings.indent(), "    ");
        assert!(settings.auto_increment());
        assert!(settings.inline_auto_now());
        assert_eq!(settings.default_engine(), None);
    }

    #[test]
    fn test_inline_auto_now_override() {
        let settings = Settings::new(Dialect::MySql).with_inline_auto_now(false);
        assert!(!settings.inline_auto_now());
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: Settings =
            serde_json::from_str(r#"{"dialect": "postgresql", "default_engine": "InnoDB"}"#)
                .unwrap();
        assert_eq!(settings.dialect(), Dialect::PostgreSql);
        assert_eq!(settings.default_engine(), Some("InnoDB"));
        assert!(settings.auto_increment());
    }
}
