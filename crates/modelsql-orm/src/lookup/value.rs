//! Rendering of lookup values as SQL literals.

use std::sync::LazyLock;

use modelsql_core::Dialect;
use regex::Regex;

static NUMERIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("numeric regex is valid"));

static INTEGER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("integer regex is valid"));

/// Whether `value` is an integer or decimal literal.
#[must_use]
pub fn is_numeric(value: &str) -> bool {
    NUMERIC_REGEX.is_match(value)
}

/// Whether `value` is an integer literal.
#[must_use]
pub fn is_integer(value: &str) -> bool {
    INTEGER_REGEX.is_match(value)
}

/// Removes one pair of matching surrounding quotes.
///
/// Returns the inner text and whether quotes were removed.
#[must_use]
pub fn strip_quotes(value: &str) -> (&str, bool) {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'\'' || first == b'"') && bytes[bytes.len() - 1] == first {
            return (&value[1..value.len() - 1], true);
        }
    }
    (value, false)
}

/// Renders a scalar value.
///
/// Numbers and `true`/`false` stay unquoted unless the input was quoted;
/// everything else becomes a single-quoted literal.
#[must_use]
pub fn render_scalar(raw: &str, dialect: Dialect) -> String {
    let trimmed = raw.trim();
    let (inner, quoted) = strip_quotes(trimmed);
    if quoted {
        return dialect.quote_literal(inner);
    }
    if is_numeric(inner) {
        return inner.to_string();
    }
    if inner.eq_ignore_ascii_case("true") || inner.eq_ignore_ascii_case("false") {
        let value = inner.eq_ignore_ascii_case("true");
        return render_bool(value, dialect);
    }
    dialect.quote_literal(inner)
}

fn render_bool(value: bool, dialect: Dialect) -> String {
    match (dialect.boolean_predicate_literals(), value) {
        (true, true) => "true".to_string(),
        (true, false) => "false".to_string(),
        (false, true) => "1".to_string(),
        (false, false) => "0".to_string(),
    }
}

/// Text of a value with surrounding quotes removed.
#[must_use]
pub fn unquoted(raw: &str) -> &str {
    strip_quotes(raw.trim()).0
}

/// Builds a `LIKE` pattern literal for `dialect`.
///
/// `\`, `%` and `_` in the value are escaped with a backslash before the
/// wildcards are added, so the value always matches literally. The pattern
/// is then quoted like any other literal of the dialect.
#[must_use]
pub fn like_pattern(raw: &str, leading: bool, trailing: bool, dialect: Dialect) -> String {
    let value = unquoted(raw);
    let mut pattern = String::with_capacity(value.len() + 2);
    if leading {
        pattern.push('%');
    }
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    if trailing {
        pattern.push('%');
    }
    dialect.quote_literal(&pattern)
}

/// Splits a bracketed list `[a,b]` or `(a,b)` into trimmed elements.
///
/// Returns `None` when the value is not bracketed.
#[must_use]
pub fn parse_list(raw: &str) -> Option<Vec<&str>> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .or_else(|| {
            trimmed
                .strip_prefix('(')
                .and_then(|rest| rest.strip_suffix(')'))
        })?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    Some(inner.split(',').map(str::trim).collect())
}

/// Renders list elements, unquoted only when every element is numeric.
#[must_use]
pub fn render_list(elements: &[&str], dialect: Dialect) -> String {
    let all_numeric = elements.iter().all(|element| is_numeric(element));
    elements
        .iter()
        .map(|element| {
            if all_numeric {
                (*element).to_string()
            } else {
                dialect.quote_literal(unquoted(element))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_scalar() {
        assert_eq!(render_scalar("18", Dialect::MySql), "18");
        assert_eq!(render_scalar("-2.50", Dialect::MySql), "-2.50");
        assert_eq!(render_scalar("Thiago", Dialect::MySql), "'Thiago'");
        assert_eq!(render_scalar("'18'", Dialect::MySql), "'18'");
        assert_eq!(render_scalar("\"O'Brien\"", Dialect::MySql), "'O''Brien'");
        assert_eq!(render_scalar("TRUE", Dialect::PostgreSql), "true");
        assert_eq!(render_scalar("false", Dialect::Oracle), "0");
        assert_eq!(render_scalar("1e5", Dialect::MySql), "'1e5'");
    }

    #[test]
    fn test_render_scalar_keeps_backslashes_inside_literal() {
        assert_eq!(
            render_scalar(r"x\' OR 1=1 -- ", Dialect::MySql),
            r"'x\\'' OR 1=1 --'"
        );
        assert_eq!(render_scalar(r"a\b", Dialect::PostgreSql), r"'a\b'");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%", true, true, Dialect::PostgreSql), r"'%50\%%'");
        assert_eq!(like_pattern("a_b", false, true, Dialect::H2), r"'a\_b%'");
        assert_eq!(
            like_pattern("'Thiago'", false, true, Dialect::MySql),
            "'Thiago%'"
        );
    }

    #[test]
    fn test_like_pattern_escapes_backslash() {
        assert_eq!(like_pattern(r"50\", true, true, Dialect::PostgreSql), r"'%50\\%'");
        assert_eq!(like_pattern(r"50\", true, true, Dialect::Oracle), r"'%50\\%'");
        assert_eq!(like_pattern(r"50\", true, true, Dialect::MySql), r"'%50\\\\%'");
        assert_eq!(like_pattern("50%", true, true, Dialect::MySql), r"'%50\\%%'");
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("[1,2,3]"), Some(vec!["1", "2", "3"]));
        assert_eq!(parse_list("( a , b )"), Some(vec!["a", "b"]));
        assert_eq!(parse_list("[]"), Some(vec![]));
        assert_eq!(parse_list("1,2"), None);
    }

    #[test]
    fn test_render_list() {
        assert_eq!(render_list(&["1", "2", "3"], Dialect::MySql), "1, 2, 3");
        assert_eq!(render_list(&["1", "two"], Dialect::MySql), "'1', 'two'");
        assert_eq!(render_list(&["'a'", "b"], Dialect::MySql), "'a', 'b'");
        assert_eq!(render_list(&[r"a\", "b"], Dialect::MySql), r"'a\\', 'b'");
    }
}
