//! Model, field and relationship descriptors.
//!
//! Descriptors are built once per model type, either through the builder
//! API behind [`Model::descriptor`] or by deserializing a [`ModelDocument`],
//! and never change afterwards.

mod descriptor;
mod field;
mod registry;
mod relation;

pub use descriptor::{EngineOptions, Field, Model, ModelDescriptor};
pub use field::{ColumnKind, FieldDescriptor, NULL_SENTINEL};
pub use registry::{JoinTable, ModelDocument, ModelRegistry};
pub use relation::{ReferentialAction, RelationKind, RelationshipDescriptor};
