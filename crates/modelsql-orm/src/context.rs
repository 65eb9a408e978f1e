//! Settings and registry shared by query sets and accessors.

use modelsql_core::model::{ModelDescriptor, ModelRegistry};
use modelsql_core::{ModelError, Settings};

use crate::lookup::LookupTranslator;
use crate::queryset::QuerySet;

/// Immutable query context: one dialect configuration plus the known models.
#[derive(Debug, Clone, Default)]
pub struct ModelContext {
    settings: Settings,
    registry: ModelRegistry,
}

impl ModelContext {
    /// Creates a context.
    #[must_use]
    pub fn new(settings: Settings, registry: ModelRegistry) -> Self {
        Self { settings, registry }
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the model registry.
    #[must_use]
    pub const fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Translator resolving paths through this context's registry.
    #[must_use]
    pub fn translator(&self) -> LookupTranslator<'_> {
        LookupTranslator::new(&self.settings).with_registry(&self.registry)
    }

    /// Translator filtering `model`.
    #[must_use]
    pub fn translator_for<'a>(&'a self, model: &'a ModelDescriptor) -> LookupTranslator<'a> {
        self.translator().for_model(model)
    }

    /// Query set over the registered model `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownModel`] when no model has that name.
    pub fn objects(&self, name: &str) -> Result<QuerySet<'_>, ModelError> {
        let model = self
            .registry
            .get(name)
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))?;
        Ok(QuerySet::new(self, model.clone()))
    }
}
