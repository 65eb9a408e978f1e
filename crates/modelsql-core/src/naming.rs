//! Identifier style conversions.
//!
//! Models and fields are declared with Rust-style identifiers (`OrderItem`,
//! `firstName`, `first_name`) while the database side uses lowercase
//! snake_case names. Every conversion here is pure and total.

/// Splits an identifier into lowercase words.
///
/// A new word starts at every lowercase/digit to uppercase transition and at
/// every `_`, `-` or whitespace separator. Runs of uppercase letters stay in
/// one word, so `HTTPServer` is a single word.
fn split_words(identifier: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower_or_digit = false;

    for ch in identifier.trim().chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower_or_digit = false;
            continue;
        }

        if ch.is_uppercase() && previous_lower_or_digit && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }

        previous_lower_or_digit = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Converts a class or attribute identifier to a snake_case column name.
///
/// ```
/// use modelsql_core::naming::to_column_name;
///
/// assert_eq!(to_column_name("firstName"), "first_name");
/// assert_eq!(to_column_name("first_name"), "first_name");
/// ```
#[must_use]
pub fn to_column_name(identifier: &str) -> String {
    split_words(identifier).join("_")
}

/// Derives the table name for a model type.
///
/// Without an override the snake_case type name is pluralized by appending
/// `s` to its final word (`OrderItem` becomes `order_items`). A non-blank
/// override replaces the derived name but is still snake-cased.
#[must_use]
pub fn to_table_name(type_name: &str, table_override: Option<&str>) -> String {
    if let Some(name) = table_override.filter(|name| !name.trim().is_empty()) {
        return to_column_name(name);
    }

    let snake = to_column_name(type_name);
    if snake.is_empty() {
        return snake;
    }
    format!("{snake}s")
}

/// Converts a snake_case name to an UpperCamelCase type name.
#[must_use]
pub fn to_class_name(identifier: &str) -> String {
    split_words(identifier)
        .iter()
        .map(|word| capitalize(word))
        .collect()
}

/// Converts a snake_case name to a lowerCamelCase attribute name.
#[must_use]
pub fn to_attribute_name(identifier: &str) -> String {
    let words = split_words(identifier);
    let mut result = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            result.push_str(word);
        } else {
            result.push_str(&capitalize(word));
        }
    }
    result
}

/// Name of the synthesized join table between two model tables.
#[must_use]
pub fn association_table_name(owner_table: &str, target_table: &str) -> String {
    format!("{owner_table}_{target_table}")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_name_from_camel_case() {
        assert_eq!(to_column_name("dataNascimento"), "data_nascimento");
        assert_eq!(to_column_name("OrderItem"), "order_item");
        assert_eq!(to_column_name("address2Line"), "address2_line");
        assert_eq!(to_column_name("HTTPServer"), "httpserver");
        assert_eq!(to_column_name("nome"), "nome");
    }

    #[test]
    fn test_column_name_is_idempotent() {
        for input in [
            "firstName",
            "OrderItem",
            "order_item",
            "already_snake_case",
            "withTrailing_",
            "__leading",
            "Mixed_caseValue",
            "ABC",
            "x1Y2z3",
            "",
        ] {
            let once = to_column_name(input);
            assert_eq!(to_column_name(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_table_name_pluralizes_last_word() {
        assert_eq!(to_table_name("User", None), "users");
        assert_eq!(to_table_name("OrderItem", None), "order_items");
        assert_eq!(to_table_name("Pessoa", None), "pessoas");
    }

    #[test]
    fn test_table_name_override_is_snake_cased() {
        assert_eq!(to_table_name("BlogPost", Some("tblPosts")), "tbl_posts");
        assert_eq!(to_table_name("BlogPost", Some("legacy_posts")), "legacy_posts");
        assert_eq!(to_table_name("BlogPost", Some("   ")), "blog_posts");
    }

    #[test]
    fn test_class_and_attribute_names() {
        assert_eq!(to_class_name("order_item"), "OrderItem");
        assert_eq!(to_attribute_name("order_item"), "orderItem");
        assert_eq!(to_class_name("OrderItem"), "OrderItem");
    }

    #[test]
    fn test_association_table_name() {
        assert_eq!(association_table_name("articles", "tags"), "articles_tags");
    }
}
