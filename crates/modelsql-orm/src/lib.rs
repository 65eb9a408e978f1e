//! # modelsql-orm
//!
//! Query-side half of modelsql.
//!
//! This crate provides:
//! - [`lookup`]: the lookup token translator (`nome__istartswith=Thiago`
//!   becomes `nome LIKE 'Thiago%'`), including relationship joins
//! - [`QuerySet`] for lazy, chainable queries rendered through the translator
//! - [`ModelQuery`], which gives every model an `objects` constructor
//! - [`accessors`]: generation of relationship navigation methods
//!
//! ## Quick Start
//!
//! ```rust
//! use modelsql_core::model::{FieldDescriptor, ModelDescriptor, ModelRegistry, RelationshipDescriptor};
//! use modelsql_core::Settings;
//! use modelsql_orm::ModelContext;
//!
//! let mut registry = ModelRegistry::new();
//! registry
//!     .add(ModelDescriptor::new("Author").field(FieldDescriptor::short_text("name", 80)))
//!     .unwrap();
//! registry
//!     .add(
//!         ModelDescriptor::new("Post")
//!             .field(FieldDescriptor::short_text("title", 200))
//!             .relation(RelationshipDescriptor::many_to_one("author", "Author")),
//!     )
//!     .unwrap();
//! let ctx = ModelContext::new(Settings::default(), registry);
//!
//! let sql = ctx
//!     .objects("Post")
//!     .unwrap()
//!     .filter(["author.name__istartswith=ann"])
//!     .to_count_sql()
//!     .unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT COUNT(*) FROM posts INNER JOIN authors AS author ON author.id = posts.author_id \
//!      WHERE LOWER(author.name) LIKE LOWER('ann%')"
//! );
//! ```

pub mod accessors;
pub mod context;
pub mod error;
pub mod lookup;
pub mod model;
pub mod queryset;

pub use accessors::{AccessorPair, AccessorSynthesizer, AppendPatcher, GeneratedAccessor, SourcePatcher};
pub use context::ModelContext;
pub use error::{LookupError, OrmError, Result};
pub use lookup::{LookupTranslator, Translation};
pub use model::ModelQuery;
pub use queryset::{OrderBy, OrderDirection, QuerySet};

/// Everything generated accessor code needs in scope.
pub mod prelude {
    pub use crate::{ModelContext, ModelQuery, QuerySet};
}
