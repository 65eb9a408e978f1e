//! SQL dialects and their capabilities.
//!
//! Each dialect knows how to spell column types, the surrogate primary key,
//! referential actions, date-part extraction and a handful of syntax
//! variations. Column types come from a `(ColumnKind, Dialect)` template table;
//! a missing entry means the kind cannot be represented in that dialect.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::{ColumnKind, ReferentialAction};

/// Target SQL engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL / MariaDB with InnoDB.
    #[default]
    MySql,
    /// PostgreSQL.
    PostgreSql,
    /// Oracle Database.
    Oracle,
    /// H2 embedded database.
    H2,
}

/// Date and time components usable in lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatePart {
    /// Calendar year.
    Year,
    /// Month of year.
    Month,
    /// Day of month.
    Day,
    /// Day of week.
    Weekday,
    /// Hour of day.
    Hour,
    /// Minute of hour.
    Minute,
    /// Second of minute.
    Second,
}

impl DatePart {
    fn keyword(self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Day => "DAY",
            Self::Weekday => "DOW",
            Self::Hour => "HOUR",
            Self::Minute => "MINUTE",
            Self::Second => "SECOND",
        }
    }
}

impl Dialect {
    /// All supported dialects.
    pub const ALL: [Self; 4] = [Self::MySql, Self::PostgreSql, Self::Oracle, Self::H2];

    /// Returns the dialect identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
            Self::Oracle => "oracle",
            Self::H2 => "h2",
        }
    }

    /// Column clause template for a field kind.
    ///
    /// Templates use `{name}`, `{length}`, `{precision}` and `{scale}`
    /// placeholders. `None` means the kind has no representation here.
    #[must_use]
    pub const fn column_template(self, kind: ColumnKind) -> Option<&'static str> {
        use ColumnKind as K;

        let template = match (kind, self) {
            (K::Text, Self::MySql) => "{name} TEXT",
            (K::Text, Self::PostgreSql) => "{name} TEXT",
            (K::Text, Self::Oracle | Self::H2) => "{name} CLOB",

            (K::ShortText, Self::Oracle) => "{name} VARCHAR2({length})",
            (K::ShortText, _) => "{name} VARCHAR({length})",

            (K::Integer | K::Relationship, Self::MySql | Self::H2) => "{name} INT",
            (K::Integer | K::Relationship, Self::PostgreSql) => "{name} INTEGER",
            (K::Integer | K::Relationship, Self::Oracle) => "{name} NUMBER(10)",

            (K::Decimal, Self::MySql | Self::H2) => "{name} DECIMAL({precision},{scale})",
            (K::Decimal, Self::PostgreSql) => "{name} NUMERIC({precision},{scale})",
            (K::Decimal, Self::Oracle) => "{name} NUMBER({precision},{scale})",

            (K::Float, Self::MySql | Self::H2) => "{name} DOUBLE",
            (K::Float, Self::PostgreSql) => "{name} DOUBLE PRECISION",
            (K::Float, Self::Oracle) => "{name} BINARY_DOUBLE",

            (K::Boolean, Self::MySql) => "{name} TINYINT(1)",
            (K::Boolean, Self::PostgreSql | Self::H2) => "{name} BOOLEAN",
            (K::Boolean, Self::Oracle) => "{name} NUMBER(1)",

            (K::Date, _) => "{name} DATE",

            (K::Time, Self::Oracle) => return None,
            (K::Time, _) => "{name} TIME",

            (K::DateTime, Self::MySql) => "{name} DATETIME",
            (K::DateTime, _) => "{name} TIMESTAMP",
        };
        Some(template)
    }

    /// Surrogate `id` primary key column clause.
    #[must_use]
    pub const fn primary_key_clause(self, auto_increment: bool) -> &'static str {
        match (self, auto_increment) {
            (Self::MySql, true) => "id INT NOT NULL PRIMARY KEY AUTO_INCREMENT",
            (Self::MySql, false) => "id INT NOT NULL PRIMARY KEY",
            (Self::PostgreSql, true) => "id SERIAL PRIMARY KEY",
            (Self::PostgreSql, false) => "id INTEGER PRIMARY KEY",
            (Self::Oracle, true) => "id NUMBER(10) GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY",
            (Self::Oracle, false) => "id NUMBER(10) PRIMARY KEY",
            (Self::H2, true) => "id INT AUTO_INCREMENT PRIMARY KEY",
            (Self::H2, false) => "id INT PRIMARY KEY",
        }
    }

    /// Whether boolean defaults are written as `TRUE`/`FALSE` instead of `1`/`0`.
    #[must_use]
    pub const fn boolean_default_literals(self) -> bool {
        matches!(self, Self::PostgreSql)
    }

    /// Whether `TRUE`/`FALSE` can appear in predicates.
    #[must_use]
    pub const fn boolean_predicate_literals(self) -> bool {
        !matches!(self, Self::Oracle)
    }

    /// Whether `COMMENT '...'` may follow a column definition.
    #[must_use]
    pub const fn inline_column_comments(self) -> bool {
        matches!(self, Self::MySql | Self::H2)
    }

    /// Whether `ENGINE=`, `DEFAULT CHARSET=` and `COMMENT=` table options exist.
    #[must_use]
    pub const fn inline_table_options(self) -> bool {
        matches!(self, Self::MySql)
    }

    /// Whether a backslash inside a string literal starts an escape sequence.
    #[must_use]
    pub const fn backslash_escapes(self) -> bool {
        matches!(self, Self::MySql)
    }

    /// Renders `value` as a single-quoted string literal.
    ///
    /// Quotes are always doubled. Backslashes are doubled where the dialect
    /// reads them as escapes, so the literal holds `value` verbatim.
    #[must_use]
    pub fn quote_literal(self, value: &str) -> String {
        let mut quoted = String::with_capacity(value.len() + 2);
        quoted.push('\'');
        for c in value.chars() {
            match c {
                '\'' => quoted.push_str("''"),
                '\\' if self.backslash_escapes() => quoted.push_str("\\\\"),
                _ => quoted.push(c),
            }
        }
        quoted.push('\'');
        quoted
    }

    /// Whether `ON UPDATE CURRENT_TIMESTAMP` is available on timestamp columns.
    #[must_use]
    pub const fn on_update_current_timestamp(self) -> bool {
        matches!(self, Self::MySql | Self::H2)
    }

    /// Whether `action` may appear in an `ON DELETE` clause.
    #[must_use]
    pub const fn supports_on_delete(self, action: ReferentialAction) -> bool {
        match self {
            Self::Oracle => matches!(
                action,
                ReferentialAction::Cascade | ReferentialAction::SetNull
            ),
            Self::MySql => !matches!(action, ReferentialAction::SetDefault),
            Self::PostgreSql | Self::H2 => true,
        }
    }

    /// Whether `action` may appear in an `ON UPDATE` clause.
    #[must_use]
    pub const fn supports_on_update(self, action: ReferentialAction) -> bool {
        match self {
            Self::Oracle => false,
            Self::MySql => !matches!(action, ReferentialAction::SetDefault),
            Self::PostgreSql | Self::H2 => true,
        }
    }

    /// Keyword placed between a joined table and its alias.
    #[must_use]
    pub const fn table_alias_keyword(self) -> &'static str {
        match self {
            Self::Oracle => " ",
            _ => " AS ",
        }
    }

    /// Whether `LIKE` needs an explicit `ESCAPE '\'` clause.
    #[must_use]
    pub const fn like_needs_escape_clause(self) -> bool {
        matches!(self, Self::Oracle)
    }

    /// Expression extracting `part` from `column`.
    #[must_use]
    pub fn extract(self, part: DatePart, column: &str) -> String {
        match (self, part) {
            (Self::MySql, DatePart::Weekday) => format!("DAYOFWEEK({column})"),
            (Self::MySql, _) => format!("{}({column})", part.keyword()),
            (Self::H2, DatePart::Weekday) => format!("DAY_OF_WEEK({column})"),
            (Self::Oracle, DatePart::Weekday) => format!("TO_CHAR({column}, 'D')"),
            (Self::PostgreSql | Self::Oracle | Self::H2, _) => {
                format!("EXTRACT({} FROM {column})", part.keyword())
            }
        }
    }

    /// `DROP TABLE` statement for `table`.
    #[must_use]
    pub fn drop_table(self, table: &str) -> String {
        match self {
            Self::MySql => format!("DROP TABLE IF EXISTS {table}"),
            Self::PostgreSql | Self::H2 => format!("DROP TABLE IF EXISTS {table} CASCADE"),
            Self::Oracle => format!("DROP TABLE {table} CASCADE CONSTRAINTS"),
        }
    }

    /// Row-limiting suffix for a `SELECT`.
    #[must_use]
    pub fn limit_clause(self, limit: Option<u64>, offset: Option<u64>) -> String {
        match self {
            Self::Oracle => {
                let mut sql = String::new();
                if let Some(offset) = offset {
                    sql.push_str(&format!(" OFFSET {offset} ROWS"));
                }
                if let Some(limit) = limit {
                    sql.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
                }
                sql
            }
            _ => {
                let mut sql = String::new();
                if let Some(limit) = limit {
                    sql.push_str(&format!(" LIMIT {limit}"));
                }
                if let Some(offset) = offset {
                    sql.push_str(&format!(" OFFSET {offset}"));
                }
                sql
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgresql" | "postgres" => Ok(Self::PostgreSql),
            "oracle" => Ok(Self::Oracle),
            "h2" => Ok(Self::H2),
            _ => Err(ModelError::UnknownDialect(s.to_string())),
        }
    }
}
