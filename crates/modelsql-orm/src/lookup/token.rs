//! Parsing of single lookup tokens.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::operator::LookupOperator;
use crate::error::LookupError;

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)^\s*(?P<path>[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*(?P<op><=|>=|<|>|=)(?P<value>.*)$",
    )
    .expect("lookup token regex is valid")
});

/// Boolean connector between predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connector {
    /// `AND`.
    And,
    /// `OR`.
    Or,
}

impl Connector {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("and") {
            Some(Self::And)
        } else if token.eq_ignore_ascii_case("or") {
            Some(Self::Or)
        } else {
            None
        }
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Parsed form of one filter token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupExpression {
    /// Navigation path, at least one segment, `pk` already rewritten to `id`.
    pub path: Vec<String>,
    /// Selected operator.
    pub operator: LookupOperator,
    /// Value text with `\=`, `\<` and `\>` unescaped.
    pub raw_value: String,
}

/// A token after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A bare `AND` / `OR`.
    Connector(Connector),
    /// A field comparison.
    Expression(LookupExpression),
}

/// Parses one token.
///
/// Returns `Ok(None)` for empty and `null` tokens, which contribute nothing.
///
/// # Errors
///
/// Returns [`LookupError::Grammar`] for text that is neither a connector
/// nor `path[__suffix](=|<|<=|>|>=)value`, or that combines a shorthand
/// operator with a suffix, and [`LookupError::UnknownOperator`] for an
/// unrecognized suffix.
pub fn parse_token(token: &str) -> Result<Option<Token>, LookupError> {
    let trimmed = token.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    if let Some(connector) = Connector::parse(trimmed) {
        return Ok(Some(Token::Connector(connector)));
    }

    let captures = TOKEN_REGEX
        .captures(token)
        .ok_or_else(|| LookupError::Grammar(token.to_string()))?;
    let path = &captures["path"];
    let symbol = &captures["op"];
    let value = unescape(&captures["value"]);

    let mut segments: Vec<String> = path.split('.').map(str::to_string).collect();
    let last = segments.pop().unwrap_or_default();

    let (field, suffix) = match last.rsplit_once("__") {
        Some((field, suffix)) => (field.to_string(), Some(suffix)),
        None => (last.clone(), None),
    };
    if field.is_empty() {
        return Err(LookupError::Grammar(token.to_string()));
    }

    let operator = match (suffix, LookupOperator::from_shorthand(symbol)) {
        (Some(_), Some(_)) => return Err(LookupError::Grammar(token.to_string())),
        (Some(suffix), None) => {
            LookupOperator::from_suffix(suffix).ok_or_else(|| LookupError::UnknownOperator {
                operator: suffix.to_string(),
                token: token.to_string(),
            })?
        }
        (None, Some(shorthand)) => shorthand,
        (None, None) => LookupOperator::Exact,
    };

    segments.push(field);
    let path = segments
        .into_iter()
        .map(|segment| {
            if segment == "pk" {
                "id".to_string()
            } else {
                segment
            }
        })
        .collect();

    Ok(Some(Token::Expression(LookupExpression {
        path,
        operator,
        raw_value: value,
    })))
}

fn unescape(value: &str) -> String {
    value
        .replace("\\=", "=")
        .replace("\\<", "<")
        .replace("\\>", ">")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expression(token: &str) -> LookupExpression {
        match parse_token(token) {
            Ok(Some(Token::Expression(expr))) => expr,
            other => panic!("expected expression for {token:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_default_operator_is_exact() {
        let expr = expression("nome=Thiago");
        assert_eq!(expr.path, ["nome"]);
        assert_eq!(expr.operator, LookupOperator::Exact);
        assert_eq!(expr.raw_value, "Thiago");
    }

    #[test]
    fn test_suffix_and_path() {
        let expr = expression("author.company.name__icontains=acme");
        assert_eq!(expr.path, ["author", "company", "name"]);
        assert_eq!(expr.operator, LookupOperator::IContains);
    }

    #[test]
    fn test_shorthand_operators() {
        assert_eq!(expression("idade>=18").operator, LookupOperator::Gte);
        assert_eq!(expression("idade<=18").operator, LookupOperator::Lte);
        assert_eq!(expression("idade<18").operator, LookupOperator::Lt);
        assert_eq!(expression("idade>18").operator, LookupOperator::Gt);
        assert_eq!(expression("idade>=18").raw_value, "18");
    }

    #[test]
    fn test_pk_becomes_id() {
        assert_eq!(expression("pk=3").path, ["id"]);
        assert_eq!(expression("author.pk__in=[1,2]").path, ["author", "id"]);
    }

    #[test]
    fn test_split_at_first_operator() {
        let expr = expression("formula=a=b");
        assert_eq!(expr.raw_value, "a=b");
        let expr = expression("expr=x\\<y");
        assert_eq!(expr.raw_value, "x<y");
    }

    #[test]
    fn test_connectors_and_no_ops() {
        assert_eq!(parse_token("and"), Ok(Some(Token::Connector(Connector::And))));
        assert_eq!(parse_token(" OR "), Ok(Some(Token::Connector(Connector::Or))));
        assert_eq!(parse_token(""), Ok(None));
        assert_eq!(parse_token("   "), Ok(None));
        assert_eq!(parse_token("NULL"), Ok(None));
    }

    #[test]
    fn test_rejections() {
        assert_eq!(
            parse_token("nome###Thiago"),
            Err(LookupError::Grammar("nome###Thiago".to_string()))
        );
        assert_eq!(
            parse_token("idade__gte>=18"),
            Err(LookupError::Grammar("idade__gte>=18".to_string()))
        );
        assert!(matches!(
            parse_token("nome__like=x"),
            Err(LookupError::UnknownOperator { operator, .. }) if operator == "like"
        ));
        assert!(matches!(parse_token("__gt=1"), Err(LookupError::Grammar(_))));
        assert!(matches!(parse_token("1abc=1"), Err(LookupError::Grammar(_))));
    }
}
