//! Translation of lookup token batches into `JOIN` and `WHERE` fragments.

use std::collections::HashSet;

use indexmap::IndexMap;
use modelsql_core::model::{
    Field, JoinTable, ModelDescriptor, ModelRegistry, RelationKind, RelationshipDescriptor,
};
use modelsql_core::naming::{to_column_name, to_table_name};
use modelsql_core::{DatePart, Dialect, ModelError, Settings};
use tracing::{debug, warn};

use super::operator::LookupOperator;
use super::token::{parse_token, Connector, LookupExpression, Token};
use super::value::{
    is_integer, like_pattern, parse_list, render_list, render_scalar, strip_quotes, unquoted,
};
use crate::error::LookupError;

/// A token that could not be translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLookup {
    /// Token as given.
    pub token: String,
    /// Why it was rejected.
    pub error: LookupError,
}

/// Result of translating one batch of tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    /// `INNER JOIN` clauses, one per distinct relationship hop.
    pub joins: Vec<String>,
    /// Predicates and connectors in token order.
    pub where_parts: Vec<String>,
    /// Tokens that contributed nothing.
    pub rejected: Vec<RejectedLookup>,
}

impl Translation {
    /// Joins the parts into one condition; see [`where_clause`].
    #[must_use]
    pub fn where_clause(&self) -> String {
        where_clause(&self.where_parts)
    }

    /// Errors of the rejected tokens.
    #[must_use]
    pub fn errors(&self) -> Vec<LookupError> {
        self.rejected.iter().map(|r| r.error.clone()).collect()
    }
}

/// Result of translating several token groups sharing one set of joins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedTranslation {
    /// Join clauses shared by every group.
    pub joins: Vec<String>,
    /// Predicates and connectors of each group.
    pub groups: Vec<Vec<String>>,
    /// Qualified expressions of the column paths that resolved, in order.
    pub columns: Vec<String>,
    /// Tokens that contributed nothing, across all groups.
    pub rejected: Vec<RejectedLookup>,
}

/// Assembles predicate and connector parts into one condition.
///
/// Adjacent predicates without a connector are joined by `AND`; connectors
/// with no predicate on either side are dropped, and of several consecutive
/// connectors the last one wins.
#[must_use]
pub fn where_clause(parts: &[String]) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut pending: Option<&str> = None;

    for part in parts {
        if is_connector(part) {
            if !out.is_empty() {
                pending = Some(part.as_str());
            }
            continue;
        }
        if !out.is_empty() {
            out.push(pending.take().unwrap_or("AND"));
        }
        out.push(part.as_str());
    }
    out.join(" ")
}

fn is_connector(part: &str) -> bool {
    part == Connector::And.as_sql() || part == Connector::Or.as_sql()
}

/// Translates lookup tokens against an optional base model.
///
/// # Example
///
/// ```
/// use modelsql_core::Settings;
/// use modelsql_orm::lookup::LookupTranslator;
///
/// let settings = Settings::default();
/// let translator = LookupTranslator::new(&settings);
/// assert_eq!(translator.translate_where("idade__gte=18"), "idade >= 18");
/// assert_eq!(
///     translator.translate_where("nome__istartswith=Thiago"),
///     "LOWER(nome) LIKE LOWER('Thiago%')"
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LookupTranslator<'a> {
    settings: &'a Settings,
    registry: Option<&'a ModelRegistry>,
    model: Option<&'a ModelDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Qualifier {
    Base,
    Alias(String),
}

#[derive(Debug, Clone)]
struct Hop<'a> {
    qualifier: Qualifier,
    model: Option<&'a ModelDescriptor>,
    sql: Vec<String>,
}

/// Join aliases claimed so far and the join keyword of new hops.
#[derive(Debug, Clone)]
struct JoinScope {
    taken: HashSet<String>,
    keyword: &'static str,
}

impl JoinScope {
    /// Claims `base`, or `base_2`, `base_3`, ... when it is already in use.
    fn claim(&mut self, base: &str) -> String {
        let mut alias = base.to_string();
        let mut n = 2;
        while !self.taken.insert(alias.clone()) {
            alias = format!("{base}_{n}");
            n += 1;
        }
        alias
    }
}

/// A resolved path and the hops it added.
struct Resolved<'a> {
    column: ColumnRef,
    hops: Vec<(Vec<String>, Hop<'a>)>,
    taken: HashSet<String>,
}

#[derive(Debug, Clone)]
struct ColumnRef {
    qualifier: Qualifier,
    column: String,
}

#[derive(Debug, Clone)]
enum Comparison {
    IsNull { negated: bool },
    Equals(String),
    IEquals(String),
    Like { pattern: String, lower: bool },
    In(String),
    Between(String, String),
    Compare(&'static str, String),
    Part(DatePart, String),
}

impl Comparison {
    fn to_sql(&self, column: &str, dialect: Dialect) -> String {
        match self {
            Self::IsNull { negated: false } => format!("{column} IS NULL"),
            Self::IsNull { negated: true } => format!("{column} IS NOT NULL"),
            Self::Equals(value) => format!("{column} = {value}"),
            Self::IEquals(value) => format!("LOWER({column}) = LOWER({value})"),
            Self::Like { pattern, lower } => {
                let mut sql = if *lower {
                    format!("LOWER({column}) LIKE LOWER({pattern})")
                } else {
                    format!("{column} LIKE {pattern}")
                };
                if dialect.like_needs_escape_clause() {
                    sql.push_str(" ESCAPE '\\'");
                }
                sql
            }
            Self::In(list) => format!("{column} IN ({list})"),
            Self::Between(low, high) => format!("{column} BETWEEN {low} AND {high}"),
            Self::Compare(symbol, value) => format!("{column} {symbol} {value}"),
            Self::Part(part, value) => format!("{} = {value}", dialect.extract(*part, column)),
        }
    }
}

enum Part {
    Connector(Connector),
    Predicate(ColumnRef, Comparison),
}

#[derive(Default)]
struct Batch<'a> {
    hops: IndexMap<Vec<String>, Hop<'a>>,
    aliases: HashSet<String>,
    joins: Vec<String>,
    groups: Vec<Vec<Part>>,
    columns: Vec<ColumnRef>,
    rejected: Vec<RejectedLookup>,
}

impl<'a> Batch<'a> {
    fn commit(&mut self, resolved: Resolved<'a>) -> ColumnRef {
        for (path, hop) in resolved.hops {
            debug!(path = %path.join("."), "Adding lookup join");
            self.joins.extend(hop.sql.iter().cloned());
            self.hops.insert(path, hop);
        }
        self.aliases = resolved.taken;
        resolved.column
    }
}

const INNER_JOIN: &str = "INNER JOIN";
const LEFT_JOIN: &str = "LEFT OUTER JOIN";

impl<'a> LookupTranslator<'a> {
    /// Creates a translator without a base model.
    ///
    /// Paths then follow naming conventions only.
    #[must_use]
    pub const fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            registry: None,
            model: None,
        }
    }

    /// Resolves relationship targets and reverse hops through `registry`.
    #[must_use]
    pub fn with_registry(mut self, registry: &'a ModelRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the model being filtered.
    #[must_use]
    pub fn for_model(mut self, model: &'a ModelDescriptor) -> Self {
        self.model = Some(model);
        self
    }

    /// Translates one token and returns its condition text.
    ///
    /// Rejected tokens yield an empty string.
    #[must_use]
    pub fn translate_where(&self, token: &str) -> String {
        self.translate_many([token]).where_clause()
    }

    /// Translates a batch of tokens.
    ///
    /// Each relationship hop is joined once per batch, keyed by its path
    /// segments; later tokens reuse joins emitted for earlier ones. Every
    /// join gets an alias unused elsewhere in the batch, derived from the
    /// path with a numeric suffix on clashes.
    pub fn translate_many<I, S>(&self, tokens: I) -> Translation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<S> = tokens.into_iter().collect();
        let mut grouped = self.translate_groups([tokens]);
        Translation {
            joins: grouped.joins,
            where_parts: grouped.groups.pop().unwrap_or_default(),
            rejected: grouped.rejected,
        }
    }

    /// Translates several token groups sharing one set of joins.
    pub fn translate_groups<G, I, S>(&self, groups: G) -> GroupedTranslation
    where
        G: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.translate_query(groups, std::iter::empty::<&str>())
    }

    /// Translates token groups plus dotted column paths such as
    /// `author.name`, as used by `ORDER BY`.
    ///
    /// Column paths reuse the joins of the groups. Hops only a column path
    /// needs are joined with `LEFT OUTER JOIN` so they never drop rows.
    /// Paths that do not resolve are rejected like tokens.
    pub fn translate_query<G, I, S, C, P>(&self, groups: G, columns: C) -> GroupedTranslation
    where
        G: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        C: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut batch = Batch::default();
        if let Some(model) = self.model {
            batch.aliases.insert(model.table_name());
        }
        for group in groups {
            let mut parts = Vec::new();
            for token in group {
                self.translate_token(&mut batch, token.as_ref(), &mut parts);
            }
            batch.groups.push(parts);
        }
        for column in columns {
            self.translate_column(&mut batch, column.as_ref());
        }
        self.finish(batch)
    }

    fn translate_column(&self, batch: &mut Batch<'a>, column: &str) {
        let path: Vec<String> = column
            .split('.')
            .map(|segment| match segment.trim() {
                "pk" => "id".to_string(),
                segment => segment.to_string(),
            })
            .collect();
        let resolved = if path.iter().any(String::is_empty) {
            Err(LookupError::Grammar(column.to_string()))
        } else {
            self.resolve_path(batch, &path, column, LEFT_JOIN)
        };
        match resolved {
            Ok(resolved) => {
                let column = batch.commit(resolved);
                batch.columns.push(column);
            }
            Err(error) => {
                warn!(column = %column, error = %error, "Rejected column path");
                batch.rejected.push(RejectedLookup {
                    token: column.to_string(),
                    error,
                });
            }
        }
    }

    fn translate_token(&self, batch: &mut Batch<'a>, token: &str, parts: &mut Vec<Part>) {
        match self.parse_and_resolve(batch, token) {
            Ok(None) => {}
            Ok(Some(part)) => parts.push(part),
            Err(error) => {
                warn!(token = %token, error = %error, "Rejected lookup token");
                batch.rejected.push(RejectedLookup {
                    token: token.to_string(),
                    error,
                });
            }
        }
    }

    fn parse_and_resolve(
        &self,
        batch: &mut Batch<'a>,
        token: &str,
    ) -> Result<Option<Part>, LookupError> {
        let expr = match parse_token(token)? {
            None => return Ok(None),
            Some(Token::Connector(connector)) => return Ok(Some(Part::Connector(connector))),
            Some(Token::Expression(expr)) => expr,
        };

        let comparison = self.comparison(&expr, token)?;
        let resolved = self.resolve_path(batch, &expr.path, token, INNER_JOIN)?;
        let column = batch.commit(resolved);
        Ok(Some(Part::Predicate(column, comparison)))
    }

    fn comparison(&self, expr: &LookupExpression, token: &str) -> Result<Comparison, LookupError> {
        let dialect = self.settings.dialect();
        let raw = expr.raw_value.as_str();
        let invalid = |reason: &str| LookupError::InvalidValue {
            token: token.to_string(),
            reason: reason.to_string(),
        };

        let comparison = match expr.operator {
            LookupOperator::Exact => {
                let (inner, quoted) = strip_quotes(raw.trim());
                if !quoted && inner.eq_ignore_ascii_case("null") {
                    Comparison::IsNull { negated: false }
                } else {
                    Comparison::Equals(render_scalar(raw, dialect))
                }
            }
            LookupOperator::IExact => Comparison::IEquals(dialect.quote_literal(unquoted(raw))),
            op @ (LookupOperator::Contains
            | LookupOperator::IContains
            | LookupOperator::StartsWith
            | LookupOperator::IStartsWith
            | LookupOperator::EndsWith
            | LookupOperator::IEndsWith) => {
                let (leading, trailing) = op.like_wildcards().unwrap_or((true, true));
                Comparison::Like {
                    pattern: like_pattern(raw, leading, trailing, dialect),
                    lower: op.is_case_insensitive(),
                }
            }
            LookupOperator::In => {
                let elements =
                    parse_list(raw).ok_or_else(|| invalid("expected a bracketed list"))?;
                if elements.is_empty() || elements.iter().any(|e| e.is_empty()) {
                    return Err(invalid("list is empty or has an empty element"));
                }
                Comparison::In(render_list(&elements, dialect))
            }
            LookupOperator::Range => {
                let elements = parse_list(raw)
                    .unwrap_or_else(|| raw.split(',').map(str::trim).collect::<Vec<_>>());
                match elements.as_slice() {
                    [low, high] if !low.is_empty() && !high.is_empty() => Comparison::Between(
                        render_scalar(low, dialect),
                        render_scalar(high, dialect),
                    ),
                    _ => return Err(invalid("range needs exactly two values")),
                }
            }
            op @ (LookupOperator::Gt
            | LookupOperator::Gte
            | LookupOperator::Lt
            | LookupOperator::Lte) => {
                let symbol = op.comparison().unwrap_or("=");
                Comparison::Compare(symbol, render_scalar(raw, dialect))
            }
            LookupOperator::IsNull => Comparison::IsNull {
                negated: unquoted(raw).eq_ignore_ascii_case("false"),
            },
            LookupOperator::Part(part) => {
                let value = unquoted(raw).trim();
                if !is_integer(value) {
                    return Err(invalid("date part lookups need an integer"));
                }
                Comparison::Part(part, value.to_string())
            }
        };
        Ok(comparison)
    }

    fn resolve_path(
        &self,
        batch: &Batch<'a>,
        path: &[String],
        token: &str,
        keyword: &'static str,
    ) -> Result<Resolved<'a>, LookupError> {
        let (terminal, segments) = path
            .split_last()
            .ok_or_else(|| LookupError::Grammar(token.to_string()))?;

        let mut scope = JoinScope {
            taken: batch.aliases.clone(),
            keyword,
        };
        let mut hops: Vec<(Vec<String>, Hop<'a>)> = Vec::new();
        let mut current = Hop {
            qualifier: Qualifier::Base,
            model: self.model,
            sql: Vec::new(),
        };

        for (i, segment) in segments.iter().enumerate() {
            let key = &path[..=i];
            let known = batch
                .hops
                .get(key)
                .or_else(|| hops.iter().find(|(k, _)| k == key).map(|(_, hop)| hop))
                .cloned();
            current = match known {
                Some(hop) => hop,
                None => {
                    let alias = scope.claim(&key.join("__"));
                    let hop = self.join_hop(&current, segment, &alias, &mut scope)?;
                    hops.push((key.to_vec(), hop.clone()));
                    hop
                }
            };
        }

        let column = self.resolve_column(current.model, terminal)?;
        Ok(Resolved {
            column: ColumnRef {
                qualifier: current.qualifier,
                column,
            },
            hops,
            taken: scope.taken,
        })
    }

    fn resolve_column(
        &self,
        model: Option<&ModelDescriptor>,
        segment: &str,
    ) -> Result<String, LookupError> {
        if segment == "id" {
            return Ok("id".to_string());
        }
        let Some(model) = model else {
            return Ok(to_column_name(segment));
        };

        let snake = to_column_name(segment);
        let found = model.fields().iter().find_map(|field| match field {
            Field::Column(column) if column.name() == segment || column.column_name() == snake => {
                Some(column.column_name())
            }
            Field::Relation(rel)
                if !rel.is_many_to_many()
                    && (rel.name() == segment
                        || to_column_name(rel.name()) == snake
                        || rel.local_column() == snake) =>
            {
                Some(rel.local_column())
            }
            _ => None,
        });

        found.ok_or_else(|| LookupError::UnknownField {
            model: model.name().to_string(),
            field: segment.to_string(),
        })
    }

    fn qualify(&self, qualifier: &Qualifier, column: &str) -> String {
        match qualifier {
            Qualifier::Alias(alias) => format!("{alias}.{column}"),
            Qualifier::Base => match self.model {
                Some(model) => format!("{}.{column}", model.table_name()),
                None => column.to_string(),
            },
        }
    }

    fn join(&self, scope: &JoinScope, table: &str, alias: &str, on: &str) -> String {
        format!(
            "{} {table}{}{alias} ON {on}",
            scope.keyword,
            self.settings.dialect().table_alias_keyword()
        )
    }

    fn join_hop(
        &self,
        from: &Hop<'a>,
        segment: &str,
        alias: &str,
        scope: &mut JoinScope,
    ) -> Result<Hop<'a>, LookupError> {
        let Some(model) = from.model else {
            return Ok(self.convention_hop(&from.qualifier, segment, alias, scope));
        };

        if let Some(rel) = model
            .relations()
            .find(|rel| rel.name() == segment || to_column_name(rel.name()) == to_column_name(segment))
        {
            return self.forward_hop(model, rel, &from.qualifier, alias, scope);
        }

        let Some(registry) = self.registry else {
            return Err(LookupError::UnresolvedRelationship {
                model: model.name().to_string(),
                segment: segment.to_string(),
            });
        };

        let wanted = to_column_name(segment);
        let candidates: Vec<(&'a ModelDescriptor, &'a RelationshipDescriptor)> = registry
            .reverse_relations(model.name())
            .into_iter()
            .filter(|(owner, rel)| rel.reverse_name(owner.name()) == wanted)
            .collect();

        match candidates.as_slice() {
            [(owner, rel)] => {
                self.reverse_hop(registry, *owner, *rel, &from.qualifier, alias, scope)
            }
            [] => Err(LookupError::UnresolvedRelationship {
                model: model.name().to_string(),
                segment: segment.to_string(),
            }),
            many => Err(LookupError::AmbiguousRelationship {
                model: model.name().to_string(),
                segment: segment.to_string(),
                candidates: many
                    .iter()
                    .map(|(owner, rel)| format!("{}.{}", owner.name(), rel.name()))
                    .collect(),
            }),
        }
    }

    fn convention_hop(
        &self,
        from: &Qualifier,
        segment: &str,
        alias: &str,
        scope: &JoinScope,
    ) -> Hop<'a> {
        let table = to_table_name(segment, None);
        let local = format!("{}_id", to_column_name(segment));
        let on = format!("{alias}.id = {}", self.qualify(from, &local));
        Hop {
            qualifier: Qualifier::Alias(alias.to_string()),
            model: None,
            sql: vec![self.join(scope, &table, alias, &on)],
        }
    }

    fn forward_hop(
        &self,
        model: &'a ModelDescriptor,
        rel: &'a RelationshipDescriptor,
        from: &Qualifier,
        alias: &str,
        scope: &mut JoinScope,
    ) -> Result<Hop<'a>, LookupError> {
        // Without a registry the target table follows naming conventions.
        let target = match self.registry {
            Some(registry) => Some(
                registry
                    .resolve_target(model, rel)
                    .map_err(|err| hop_error(err, model, rel.name()))?,
            ),
            None => None,
        };
        let target_table = target.map_or_else(|| to_table_name(rel.target(), None), |t| t.table_name());

        let sql = match rel.kind() {
            RelationKind::OneToOne | RelationKind::ManyToOne => {
                let table = rel
                    .referenced_table_override()
                    .map_or(target_table, to_column_name);
                let on = format!(
                    "{alias}.{} = {}",
                    rel.referenced_column(),
                    self.qualify(from, &rel.local_column())
                );
                vec![self.join(scope, &table, alias, &on)]
            }
            RelationKind::ManyToMany => {
                let join_table = match self.registry {
                    Some(registry) => registry
                        .association_for(model, rel)
                        .map_err(|err| hop_error(err, model, rel.name()))?,
                    None => JoinTable::synthesized(
                        model.name(),
                        &model.table_name(),
                        rel.target(),
                        &target_table,
                    ),
                };
                let link = scope.claim(&format!("{alias}__link"));
                vec![
                    self.join(
                        scope,
                        &join_table.table,
                        &link,
                        &format!(
                            "{link}.{} = {}",
                            join_table.owner_column,
                            self.qualify(from, "id")
                        ),
                    ),
                    self.join(
                        scope,
                        &target_table,
                        alias,
                        &format!("{alias}.id = {link}.{}", join_table.target_column),
                    ),
                ]
            }
        };

        Ok(Hop {
            qualifier: Qualifier::Alias(alias.to_string()),
            model: target,
            sql,
        })
    }

    fn reverse_hop(
        &self,
        registry: &'a ModelRegistry,
        owner: &'a ModelDescriptor,
        rel: &'a RelationshipDescriptor,
        from: &Qualifier,
        alias: &str,
        scope: &mut JoinScope,
    ) -> Result<Hop<'a>, LookupError> {
        let owner_table = owner.table_name();
        let sql = match rel.kind() {
            RelationKind::OneToOne | RelationKind::ManyToOne => {
                let on = format!(
                    "{alias}.{} = {}",
                    rel.local_column(),
                    self.qualify(from, &rel.referenced_column())
                );
                vec![self.join(scope, &owner_table, alias, &on)]
            }
            RelationKind::ManyToMany => {
                let join_table = registry
                    .association_for(owner, rel)
                    .map_err(|err| hop_error(err, owner, rel.name()))?;
                let link = scope.claim(&format!("{alias}__link"));
                vec![
                    self.join(
                        scope,
                        &join_table.table,
                        &link,
                        &format!(
                            "{link}.{} = {}",
                            join_table.target_column,
                            self.qualify(from, "id")
                        ),
                    ),
                    self.join(
                        scope,
                        &owner_table,
                        alias,
                        &format!("{alias}.id = {link}.{}", join_table.owner_column),
                    ),
                ]
            }
        };

        Ok(Hop {
            qualifier: Qualifier::Alias(alias.to_string()),
            model: Some(owner),
            sql,
        })
    }

    fn finish(&self, batch: Batch<'a>) -> GroupedTranslation {
        let dialect = self.settings.dialect();
        let qualify_base = !batch.joins.is_empty() && self.model.is_some();
        let render = |column: ColumnRef| match column.qualifier {
            Qualifier::Base if !qualify_base => column.column,
            qualifier => self.qualify(&qualifier, &column.column),
        };

        let groups = batch
            .groups
            .into_iter()
            .map(|parts| {
                parts
                    .into_iter()
                    .map(|part| match part {
                        Part::Connector(connector) => connector.as_sql().to_string(),
                        Part::Predicate(column, comparison) => {
                            comparison.to_sql(&render(column), dialect)
                        }
                    })
                    .collect()
            })
            .collect();

        GroupedTranslation {
            joins: batch.joins,
            groups,
            columns: batch.columns.into_iter().map(render).collect(),
            rejected: batch.rejected,
        }
    }
}

fn hop_error(err: ModelError, model: &ModelDescriptor, segment: &str) -> LookupError {
    match err {
        ModelError::AmbiguousRelationship { candidates, .. } => LookupError::AmbiguousRelationship {
            model: model.name().to_string(),
            segment: segment.to_string(),
            candidates,
        },
        _ => LookupError::UnresolvedRelationship {
            model: model.name().to_string(),
            segment: segment.to_string(),
        },
    }
}
