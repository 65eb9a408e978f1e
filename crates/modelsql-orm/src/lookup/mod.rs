//! Lookup token translation.
//!
//! A lookup token is a compact filter such as `nome__istartswith=Thiago`,
//! `idade>=18` or `author.company.name__icontains=acme`. Tokens are parsed
//! one at a time, resolved against an optional base model and rendered into
//! `INNER JOIN` clauses plus `WHERE` predicates. A token that cannot be
//! translated contributes nothing and is reported in
//! [`Translation::rejected`].

mod operator;
mod token;
mod translator;
mod value;

pub use operator::LookupOperator;
pub use token::{parse_token, Connector, LookupExpression, Token};
pub use translator::{
    where_clause, GroupedTranslation, LookupTranslator, RejectedLookup, Translation,
};
