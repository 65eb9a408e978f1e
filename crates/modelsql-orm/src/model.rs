//! Query entry point for model types.

use modelsql_core::model::Model;

use crate::context::ModelContext;
use crate::queryset::QuerySet;

/// Gives every [`Model`] an `objects` query set constructor.
///
/// ```
/// use modelsql_core::model::{FieldDescriptor, Model, ModelDescriptor};
/// use modelsql_orm::{ModelContext, ModelQuery};
///
/// struct Tag;
///
/// impl Model for Tag {
///     fn descriptor() -> ModelDescriptor {
///         ModelDescriptor::new("Tag").field(FieldDescriptor::short_text("label", 40))
///     }
/// }
///
/// let ctx = ModelContext::default();
/// let sql = Tag::objects(&ctx).filter(["label=rust"]).to_count_sql().unwrap();
/// assert_eq!(sql, "SELECT COUNT(*) FROM tags WHERE label = 'rust'");
/// ```
pub trait ModelQuery: Model {
    /// Returns an unfiltered query set over this model.
    ///
    /// The registered descriptor wins over [`Model::descriptor`] when the
    /// context knows a model of the same name.
    fn objects(ctx: &ModelContext) -> QuerySet<'_> {
        let descriptor = Self::descriptor();
        let descriptor = ctx
            .registry()
            .get(descriptor.name())
            .cloned()
            .unwrap_or(descriptor);
        QuerySet::new(ctx, descriptor)
    }
}

impl<M: Model> ModelQuery for M {}
