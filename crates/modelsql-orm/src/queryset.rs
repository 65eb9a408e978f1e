//! Chainable query sets rendered from lookup tokens.
//!
//! A query set only collects tokens; SQL text is produced on demand by
//! [`QuerySet::to_select_sql`], [`QuerySet::to_count_sql`] and
//! [`QuerySet::to_delete_sql`]. All filter and exclude groups are translated
//! as one batch so relationship joins are shared between them.

use modelsql_core::model::{Field, ModelDescriptor};
use modelsql_core::Dialect;
use tracing::debug;

use crate::context::ModelContext;
use crate::error::{OrmError, Result};
use crate::lookup::{where_clause, GroupedTranslation, RejectedLookup};

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field to order by, as written
    pub field: String,
    /// Order direction
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Parses a `-`-prefixed (descending) or plain (ascending) field name.
    #[must_use]
    pub fn parse(ordering: &str) -> Self {
        let ordering = ordering.trim();
        match ordering.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                direction: OrderDirection::Desc,
            },
            None => Self {
                field: ordering.to_string(),
                direction: OrderDirection::Asc,
            },
        }
    }

    fn to_sql(&self, column: &str) -> String {
        match self.direction {
            OrderDirection::Asc => format!("{column} ASC"),
            OrderDirection::Desc => format!("{column} DESC"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Filter,
    Exclude,
}

/// A lazy, chainable query over one model.
///
/// # Example
///
/// ```
/// use modelsql_core::model::{FieldDescriptor, ModelDescriptor, ModelRegistry};
/// use modelsql_core::Settings;
/// use modelsql_orm::ModelContext;
///
/// let mut registry = ModelRegistry::new();
/// registry
///     .add(
///         ModelDescriptor::new("Pessoa")
///             .field(FieldDescriptor::short_text("nome", 80))
///             .field(FieldDescriptor::integer("idade")),
///     )
///     .unwrap();
/// let ctx = ModelContext::new(Settings::default(), registry);
///
/// let sql = ctx
///     .objects("Pessoa")
///     .unwrap()
///     .filter(["idade__gte=18"])
///     .order_by("-idade")
///     .limit(10)
///     .to_select_sql()
///     .unwrap();
/// assert_eq!(
///     sql,
///     "SELECT id, nome, idade FROM pessoas WHERE idade >= 18 ORDER BY idade DESC LIMIT 10"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct QuerySet<'c> {
    ctx: &'c ModelContext,
    model: ModelDescriptor,
    groups: Vec<(GroupKind, Vec<String>)>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    distinct: bool,
}

impl<'c> QuerySet<'c> {
    /// Creates an unfiltered query set over `model`.
    #[must_use]
    pub fn new(ctx: &'c ModelContext, model: ModelDescriptor) -> Self {
        Self {
            ctx,
            model,
            groups: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
        }
    }

    /// Returns the model being queried.
    #[must_use]
    pub const fn model(&self) -> &ModelDescriptor {
        &self.model
    }

    /// Adds a group of lookup tokens that rows must match.
    #[must_use]
    pub fn filter<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .push((GroupKind::Filter, tokens.into_iter().map(Into::into).collect()));
        self
    }

    /// Adds a group of lookup tokens that rows must not match.
    #[must_use]
    pub fn exclude<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .push((GroupKind::Exclude, tokens.into_iter().map(Into::into).collect()));
        self
    }

    /// Adds an ordering; prefix the field with `-` for descending order.
    ///
    /// The field may be a dotted path through relationships, such as
    /// `-author.name`.
    #[must_use]
    pub fn order_by(mut self, ordering: &str) -> Self {
        self.order_by.push(OrderBy::parse(ordering));
        self
    }

    /// Limits the number of rows.
    #[must_use]
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Skips the first `n` rows.
    #[must_use]
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Selects distinct rows only.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Tokens and order fields that do not translate.
    #[must_use]
    pub fn rejected(&self) -> Vec<RejectedLookup> {
        self.translate(true).rejected
    }

    /// Builds the `SELECT` statement.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::RejectedLookups`] if any token was rejected.
    pub fn to_select_sql(&self) -> Result<String> {
        let translation = self.checked_translation(true)?;
        let table = self.model.table_name();
        let qualify = !translation.joins.is_empty();

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        let columns: Vec<String> = self
            .column_names()
            .iter()
            .map(|column| qualified(&table, column, qualify))
            .collect();
        sql.push_str(&columns.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&table);
        self.push_joins_and_where(&mut sql, &translation);

        if !self.order_by.is_empty() {
            let order: Vec<String> = self
                .order_by
                .iter()
                .zip(&translation.columns)
                .map(|(o, column)| o.to_sql(column))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        sql.push_str(
            &self
                .ctx
                .settings()
                .dialect()
                .limit_clause(self.limit, self.offset),
        );
        debug!(sql = %sql, "Built select");
        Ok(sql)
    }

    /// Builds the `SELECT COUNT` statement.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::RejectedLookups`] if any token was rejected.
    pub fn to_count_sql(&self) -> Result<String> {
        let translation = self.checked_translation(false)?;
        let table = self.model.table_name();

        let mut sql = if self.distinct && !translation.joins.is_empty() {
            format!("SELECT COUNT(DISTINCT {table}.id) FROM {table}")
        } else {
            format!("SELECT COUNT(*) FROM {table}")
        };
        self.push_joins_and_where(&mut sql, &translation);
        debug!(sql = %sql, "Built count");
        Ok(sql)
    }

    /// Builds the `DELETE` statement.
    ///
    /// Filters crossing relationships use the multi-table
    /// `DELETE posts FROM posts INNER JOIN ..` form on MySQL, which rejects
    /// subqueries over the table being deleted, and an `id IN (SELECT ..)`
    /// subquery elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::RejectedLookups`] if any token was rejected.
    pub fn to_delete_sql(&self) -> Result<String> {
        let translation = self.checked_translation(false)?;
        let table = self.model.table_name();

        let sql = if translation.joins.is_empty() {
            let mut sql = format!("DELETE FROM {table}");
            self.push_joins_and_where(&mut sql, &translation);
            sql
        } else if self.ctx.settings().dialect() == Dialect::MySql {
            let mut sql = format!("DELETE {table} FROM {table}");
            self.push_joins_and_where(&mut sql, &translation);
            sql
        } else {
            let mut subquery = format!("SELECT {table}.id FROM {table}");
            self.push_joins_and_where(&mut subquery, &translation);
            format!("DELETE FROM {table} WHERE id IN ({subquery})")
        };
        debug!(sql = %sql, "Built delete");
        Ok(sql)
    }

    fn translate(&self, with_ordering: bool) -> GroupedTranslation {
        let translator = self.ctx.translator_for(&self.model);
        let groups = self.groups.iter().map(|(_, tokens)| tokens);
        if with_ordering {
            translator.translate_query(groups, self.order_by.iter().map(|o| o.field.as_str()))
        } else {
            translator.translate_groups(groups)
        }
    }

    fn checked_translation(&self, with_ordering: bool) -> Result<GroupedTranslation> {
        let translation = self.translate(with_ordering);
        if translation.rejected.is_empty() {
            Ok(translation)
        } else {
            Err(OrmError::RejectedLookups(
                translation.rejected.into_iter().map(|r| r.error).collect(),
            ))
        }
    }

    fn push_joins_and_where(&self, sql: &mut String, translation: &GroupedTranslation) {
        for join in &translation.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        let conditions: Vec<String> = self
            .groups
            .iter()
            .zip(&translation.groups)
            .filter_map(|((kind, _), parts)| {
                let clause = where_clause(parts);
                if clause.is_empty() {
                    return None;
                }
                Some(match kind {
                    GroupKind::Exclude => format!("NOT ({clause})"),
                    GroupKind::Filter if parts.iter().any(|p| p == "OR") => format!("({clause})"),
                    GroupKind::Filter => clause,
                })
            })
            .collect();

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
    }

    fn column_names(&self) -> Vec<String> {
        let mut columns = vec!["id".to_string()];
        for field in self.model.fields() {
            match field {
                Field::Column(column) => columns.push(column.column_name()),
                Field::Relation(rel) if !rel.is_many_to_many() => columns.push(rel.local_column()),
                Field::Relation(_) => {}
            }
        }
        columns
    }
}

fn qualified(table: &str, column: &str, qualify: bool) -> String {
    if qualify {
        format!("{table}.{column}")
    } else {
        column.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelsql_core::model::{FieldDescriptor, ModelRegistry, RelationshipDescriptor};
    use modelsql_core::{Dialect, Settings};
    use pretty_assertions::assert_eq;

    fn context(dialect: Dialect) -> ModelContext {
        let mut registry = ModelRegistry::new();
        registry
            .add(ModelDescriptor::new("Author").field(FieldDescriptor::short_text("name", 80)))
            .unwrap();
        registry
            .add(
                ModelDescriptor::new("Post")
                    .field(FieldDescriptor::short_text("title", 200))
                    .field(FieldDescriptor::boolean("published"))
                    .relation(RelationshipDescriptor::many_to_one("author", "Author")),
            )
            .unwrap();
        ModelContext::new(Settings::new(dialect), registry)
    }

    #[test]
    fn test_order_by_parse() {
        assert_eq!(OrderBy::parse("-criado").direction, OrderDirection::Desc);
        assert_eq!(OrderBy::parse("criado").field, "criado");
    }

    #[test]
    fn test_select_without_filters() {
        let ctx = context(Dialect::MySql);
        let sql = ctx.objects("Post").unwrap().to_select_sql().unwrap();
        assert_eq!(sql, "SELECT id, title, published, author_id FROM posts");
    }

    #[test]
    fn test_filter_and_exclude() {
        let ctx = context(Dialect::MySql);
        let qs = ctx
            .objects("Post")
            .unwrap()
            .filter(["published=true"])
            .exclude(["title__icontains=draft", "or", "title=x"]);
        assert_eq!(
            qs.to_select_sql().unwrap(),
            "SELECT id, title, published, author_id FROM posts \
             WHERE published = true AND NOT (LOWER(title) LIKE LOWER('%draft%') OR title = 'x')"
        );
        assert_eq!(
            qs.to_count_sql().unwrap(),
            "SELECT COUNT(*) FROM posts \
             WHERE published = true AND NOT (LOWER(title) LIKE LOWER('%draft%') OR title = 'x')"
        );
    }

    #[test]
    fn test_join_qualifies_base_columns() {
        let ctx = context(Dialect::PostgreSql);
        let qs = ctx
            .objects("Post")
            .unwrap()
            .filter(["author.name__startswith=Ana", "published=true"])
            .order_by("-title");
        assert_eq!(
            qs.to_select_sql().unwrap(),
            "SELECT posts.id, posts.title, posts.published, posts.author_id FROM posts \
             INNER JOIN authors AS author ON author.id = posts.author_id \
             WHERE author.name LIKE 'Ana%' AND posts.published = true \
             ORDER BY posts.title DESC"
        );
        assert_eq!(
            qs.to_delete_sql().unwrap(),
            "DELETE FROM posts WHERE id IN (SELECT posts.id FROM posts \
             INNER JOIN authors AS author ON author.id = posts.author_id \
             WHERE author.name LIKE 'Ana%' AND posts.published = true)"
        );
    }

    #[test]
    fn test_mysql_delete_across_join() {
        let ctx = context(Dialect::MySql);
        let sql = ctx
            .objects("Post")
            .unwrap()
            .filter(["author.name=Ana"])
            .to_delete_sql()
            .unwrap();
        assert_eq!(
            sql,
            "DELETE posts FROM posts \
             INNER JOIN authors AS author ON author.id = posts.author_id \
             WHERE author.name = 'Ana'"
        );
    }

    #[test]
    fn test_order_by_related_path() {
        let ctx = context(Dialect::MySql);
        let sql = ctx
            .objects("Post")
            .unwrap()
            .order_by("author.name")
            .order_by("-id")
            .to_select_sql()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT posts.id, posts.title, posts.published, posts.author_id FROM posts \
             LEFT OUTER JOIN authors AS author ON author.id = posts.author_id \
             ORDER BY author.name ASC, posts.id DESC"
        );

        let qs = ctx
            .objects("Post")
            .unwrap()
            .filter(["author.name__startswith=A"])
            .order_by("-author.name");
        assert_eq!(
            qs.to_select_sql().unwrap(),
            "SELECT posts.id, posts.title, posts.published, posts.author_id FROM posts \
             INNER JOIN authors AS author ON author.id = posts.author_id \
             WHERE author.name LIKE 'A%' ORDER BY author.name DESC"
        );
        assert_eq!(
            qs.to_count_sql().unwrap(),
            "SELECT COUNT(*) FROM posts \
             INNER JOIN authors AS author ON author.id = posts.author_id \
             WHERE author.name LIKE 'A%'"
        );
    }

    #[test]
    fn test_unknown_order_field_is_rejected() {
        let ctx = context(Dialect::MySql);
        let qs = ctx.objects("Post").unwrap().order_by("author.rating");
        assert_eq!(qs.rejected().len(), 1);
        assert_eq!(qs.rejected()[0].token, "author.rating");
        assert!(matches!(
            qs.to_select_sql(),
            Err(OrmError::RejectedLookups(errors)) if errors.len() == 1
        ));
        assert_eq!(qs.to_count_sql().unwrap(), "SELECT COUNT(*) FROM posts");
    }

    #[test]
    fn test_oracle_limit_and_alias() {
        let ctx = context(Dialect::Oracle);
        let sql = ctx
            .objects("Post")
            .unwrap()
            .filter(["author.id=3"])
            .limit(5)
            .offset(10)
            .to_select_sql()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT posts.id, posts.title, posts.published, posts.author_id FROM posts \
             INNER JOIN authors author ON author.id = posts.author_id \
             WHERE author.id = 3 OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"
        );
    }

    #[test]
    fn test_rejected_tokens_fail_rendering() {
        let ctx = context(Dialect::MySql);
        let qs = ctx
            .objects("Post")
            .unwrap()
            .filter(["title###x", "rating__gt=3"]);
        assert_eq!(qs.rejected().len(), 2);
        assert!(matches!(
            qs.to_select_sql(),
            Err(OrmError::RejectedLookups(errors)) if errors.len() == 2
        ));
    }

    #[test]
    fn test_plain_delete() {
        let ctx = context(Dialect::H2);
        let sql = ctx
            .objects("Post")
            .unwrap()
            .filter(["author_id__in=[1,2]"])
            .to_delete_sql()
            .unwrap();
        assert_eq!(sql, "DELETE FROM posts WHERE author_id IN (1, 2)");
    }
}
