//! Lookup operators.

use std::fmt;

use modelsql_core::DatePart;

/// Comparison selected by a token's `__suffix` or shorthand operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LookupOperator {
    /// `=` (the default).
    #[default]
    Exact,
    /// Case-insensitive `=`.
    IExact,
    /// `LIKE '%v%'`.
    Contains,
    /// Case-insensitive `LIKE '%v%'`.
    IContains,
    /// `LIKE 'v%'`.
    StartsWith,
    /// Case-insensitive `LIKE 'v%'`.
    IStartsWith,
    /// `LIKE '%v'`.
    EndsWith,
    /// Case-insensitive `LIKE '%v'`.
    IEndsWith,
    /// `IN (..)`.
    In,
    /// `BETWEEN x AND y`.
    Range,
    /// `>`.
    Gt,
    /// `>=`.
    Gte,
    /// `<`.
    Lt,
    /// `<=`.
    Lte,
    /// `IS NULL` / `IS NOT NULL`.
    IsNull,
    /// Date part equality.
    Part(DatePart),
}

impl LookupOperator {
    /// Parses a `__suffix`.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let op = match suffix {
            "exact" => Self::Exact,
            "iexact" => Self::IExact,
            "contains" => Self::Contains,
            "icontains" => Self::IContains,
            "startswith" => Self::StartsWith,
            "istartswith" => Self::IStartsWith,
            "endswith" => Self::EndsWith,
            "iendswith" => Self::IEndsWith,
            "in" => Self::In,
            "range" => Self::Range,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "isnull" => Self::IsNull,
            "year" => Self::Part(DatePart::Year),
            "month" => Self::Part(DatePart::Month),
            "day" => Self::Part(DatePart::Day),
            "weekday" => Self::Part(DatePart::Weekday),
            "hour" => Self::Part(DatePart::Hour),
            "minute" => Self::Part(DatePart::Minute),
            "second" => Self::Part(DatePart::Second),
            _ => return None,
        };
        Some(op)
    }

    /// Maps a shorthand comparison written in place of `=`.
    #[must_use]
    pub fn from_shorthand(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Lte),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Gte),
            _ => None,
        }
    }

    /// Returns the suffix spelling.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::IExact => "iexact",
            Self::Contains => "contains",
            Self::IContains => "icontains",
            Self::StartsWith => "startswith",
            Self::IStartsWith => "istartswith",
            Self::EndsWith => "endswith",
            Self::IEndsWith => "iendswith",
            Self::In => "in",
            Self::Range => "range",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::IsNull => "isnull",
            Self::Part(DatePart::Year) => "year",
            Self::Part(DatePart::Month) => "month",
            Self::Part(DatePart::Day) => "day",
            Self::Part(DatePart::Weekday) => "weekday",
            Self::Part(DatePart::Hour) => "hour",
            Self::Part(DatePart::Minute) => "minute",
            Self::Part(DatePart::Second) => "second",
        }
    }

    /// Whether both sides are wrapped in `LOWER(..)`.
    #[must_use]
    pub const fn is_case_insensitive(self) -> bool {
        matches!(
            self,
            Self::IExact | Self::IContains | Self::IStartsWith | Self::IEndsWith
        )
    }

    /// Wildcards placed before and after a `LIKE` pattern, if this is a
    /// pattern lookup.
    #[must_use]
    pub const fn like_wildcards(self) -> Option<(bool, bool)> {
        match self {
            Self::Contains | Self::IContains => Some((true, true)),
            Self::StartsWith | Self::IStartsWith => Some((false, true)),
            Self::EndsWith | Self::IEndsWith => Some((true, false)),
            _ => None,
        }
    }

    /// Comparison symbol for the ordering lookups.
    #[must_use]
    pub const fn comparison(self) -> Option<&'static str> {
        match self {
            Self::Gt => Some(">"),
            Self::Gte => Some(">="),
            Self::Lt => Some("<"),
            Self::Lte => Some("<="),
            _ => None,
        }
    }
}

impl fmt::Display for LookupOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_round_trip() {
        for suffix in ["exact", "icontains", "in", "range", "isnull", "weekday", "second"] {
            assert_eq!(LookupOperator::from_suffix(suffix).unwrap().suffix(), suffix);
        }
        assert_eq!(LookupOperator::from_suffix("like"), None);
        assert_eq!(LookupOperator::from_suffix("EXACT"), None);
    }

    #[test]
    fn test_shorthand() {
        assert_eq!(LookupOperator::from_shorthand("<"), Some(LookupOperator::Lt));
        assert_eq!(LookupOperator::from_shorthand("<="), Some(LookupOperator::Lte));
        assert_eq!(LookupOperator::from_shorthand(">"), Some(LookupOperator::Gt));
        assert_eq!(LookupOperator::from_shorthand(">="), Some(LookupOperator::Gte));
        assert_eq!(LookupOperator::from_shorthand("="), None);
    }

    #[test]
    fn test_wildcards() {
        assert_eq!(LookupOperator::IStartsWith.like_wildcards(), Some((false, true)));
        assert_eq!(LookupOperator::EndsWith.like_wildcards(), Some((true, false)));
        assert_eq!(LookupOperator::Exact.like_wildcards(), None);
        assert!(LookupOperator::IExact.is_case_insensitive());
        assert!(!LookupOperator::Contains.is_case_insensitive());
    }
}
