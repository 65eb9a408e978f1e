//! # modelsql-core
//!
//! Shared building blocks for the modelsql schema synthesizer and lookup
//! translator:
//!
//! - [`naming`]: identifier to column and table name conversions
//! - [`model`]: field, relationship and model descriptors plus the registry
//! - [`dialect`]: per-dialect column templates and syntax capabilities
//! - [`settings`]: the immutable configuration threaded through every run
//!
//! ## Example
//!
//! ```rust
//! use modelsql_core::model::{FieldDescriptor, ModelDescriptor, ModelRegistry, RelationshipDescriptor};
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
//!
//! let order: Vec<_> = registry.dependency_order().iter().map(|m| m.table_name()).collect();
//! assert_eq!(order, ["authors", "posts"]);
//! ```

pub mod dialect;
pub mod error;
pub mod model;
pub mod naming;
pub mod settings;

pub use dialect::{DatePart, Dialect};
pub use error::{ModelError, Result};
pub use settings::Settings;
