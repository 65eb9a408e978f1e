//! Relationship accessor synthesis.
//!
//! For every relationship field two accessor methods are generated, one on
//! each side. Each accessor returns a [`QuerySet`](crate::QuerySet) built
//! from lookup tokens, so navigation goes through the same translator as
//! hand-written filters.
//!
//! Generated text is handed to a [`SourcePatcher`]. The bundled
//! [`AppendPatcher`] appends an accessor to `<source root>/<model>.rs`
//! unless the file already contains its signature line.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use modelsql_core::model::{ModelDescriptor, ModelRegistry, RelationKind, RelationshipDescriptor};
use modelsql_core::naming::to_column_name;
use modelsql_core::ModelError;
use tracing::{debug, info};

use crate::error::Result;

/// One generated accessor method and the `impl` block holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAccessor {
    /// Type the method is implemented on.
    pub model: String,
    /// Method name.
    pub method: String,
    /// First line of the method, used to detect an existing accessor.
    pub signature: String,
    /// Full `impl` block.
    pub text: String,
}

/// Accessors for both ends of one relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorPair {
    /// Accessor on the declaring model.
    pub owner: GeneratedAccessor,
    /// Accessor on the target model.
    pub target: GeneratedAccessor,
    /// Source file of the declaring model.
    pub owner_file_path: PathBuf,
    /// Source file of the target model.
    pub target_file_path: PathBuf,
}

/// Source file holding a model: `<root>/<snake model name>.rs`.
#[must_use]
pub fn source_file_path(root: &Path, model_name: &str) -> PathBuf {
    root.join(format!("{}.rs", to_column_name(model_name)))
}

/// Generates accessor pairs for relationships of registered models.
#[derive(Debug, Clone)]
pub struct AccessorSynthesizer<'a> {
    registry: &'a ModelRegistry,
    source_root: PathBuf,
}

impl<'a> AccessorSynthesizer<'a> {
    /// Creates a synthesizer writing paths under `source_root`.
    #[must_use]
    pub fn new(registry: &'a ModelRegistry, source_root: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            source_root: source_root.into(),
        }
    }

    /// Generates the accessors of one relationship declared on `owner`.
    ///
    /// # Errors
    ///
    /// Fails when the relationship target cannot be resolved.
    pub fn synthesize(
        &self,
        owner: &ModelDescriptor,
        rel: &RelationshipDescriptor,
    ) -> std::result::Result<AccessorPair, ModelError> {
        let target = self.registry.resolve_target(owner, rel)?;
        let owner_snake = to_column_name(owner.name());
        let field = to_column_name(rel.name());

        let (owner_method, owner_filter) = match rel.kind() {
            RelationKind::OneToOne | RelationKind::ManyToOne => (
                field.clone(),
                format!(
                    "format!(\"{}={{}}\", self.{})",
                    rel.referenced_column(),
                    rel.local_column()
                ),
            ),
            RelationKind::ManyToMany => (
                field.clone(),
                format!(
                    "format!(\"{}.id={{}}\", self.id)",
                    rel.reverse_name(owner.name())
                ),
            ),
        };

        let target_method = match (rel.related_name_override(), rel.kind()) {
            (Some(name), _) => to_column_name(name),
            (None, RelationKind::OneToOne) => owner_snake,
            (None, RelationKind::ManyToOne | RelationKind::ManyToMany) => {
                format!("{owner_snake}_set")
            }
        };
        let target_filter = match rel.kind() {
            RelationKind::OneToOne | RelationKind::ManyToOne => format!(
                "format!(\"{}={{}}\", self.{})",
                rel.local_column(),
                rel.referenced_column()
            ),
            RelationKind::ManyToMany => format!("format!(\"{field}.id={{}}\", self.id)"),
        };

        let pair = AccessorPair {
            owner: render_accessor(owner.name(), &owner_method, target.name(), &owner_filter),
            target: render_accessor(target.name(), &target_method, owner.name(), &target_filter),
            owner_file_path: source_file_path(&self.source_root, owner.name()),
            target_file_path: source_file_path(&self.source_root, target.name()),
        };
        debug!(
            owner = %pair.owner.model,
            owner_method = %pair.owner.method,
            target = %pair.target.model,
            target_method = %pair.target.method,
            "Synthesized accessors"
        );
        Ok(pair)
    }

    /// Generates accessors for every relationship of every registered model.
    ///
    /// Relationships whose target cannot be resolved are skipped and their
    /// errors returned alongside the successful pairs.
    #[must_use]
    pub fn synthesize_all(&self) -> (Vec<AccessorPair>, Vec<ModelError>) {
        let mut pairs = Vec::new();
        let mut errors = Vec::new();
        for model in self.registry.iter() {
            for rel in model.relations() {
                match self.synthesize(model, rel) {
                    Ok(pair) => pairs.push(pair),
                    Err(err) => errors.push(err),
                }
            }
        }
        (pairs, errors)
    }
}

fn render_accessor(model: &str, method: &str, queried: &str, filter: &str) -> GeneratedAccessor {
    let signature = format!("    pub fn {method}<'c>(&self, ctx: &'c ModelContext) -> QuerySet<'c> {{");
    let text = format!(
        "impl {model} {{\n\
         {signature}\n\
         \x20       {queried}::objects(ctx).filter([{filter}])\n\
         \x20   }}\n\
         }}\n"
    );
    GeneratedAccessor {
        model: model.to_string(),
        method: method.to_string(),
        signature,
        text,
    }
}

/// External collaborator that splices generated accessors into source files.
pub trait SourcePatcher {
    /// Adds `accessor` to the file at `path`.
    ///
    /// Returns `false` when the file already holds the accessor.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or written.
    fn patch(&mut self, path: &Path, accessor: &GeneratedAccessor) -> Result<bool>;

    /// Applies both accessors of a pair and returns how many were written.
    ///
    /// # Errors
    ///
    /// Returns the first patch error.
    fn apply(&mut self, pair: &AccessorPair) -> Result<usize> {
        let mut written = 0;
        if self.patch(&pair.owner_file_path, &pair.owner)? {
            written += 1;
        }
        if self.patch(&pair.target_file_path, &pair.target)? {
            written += 1;
        }
        Ok(written)
    }
}

/// Appends accessor blocks to the end of existing (or new) files.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendPatcher;

impl SourcePatcher for AppendPatcher {
    fn patch(&mut self, path: &Path, accessor: &GeneratedAccessor) -> Result<bool> {
        let existing = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err.into()),
        };

        let signature = accessor.signature.trim();
        if existing.lines().any(|line| line.trim() == signature) {
            debug!(path = %path.display(), method = %accessor.method, "Accessor already present");
            return Ok(false);
        }

        let mut content = existing;
        if !content.is_empty() {
            if !content.ends_with('\n') {
                content.push('\n');
            }
            content.push('\n');
        }
        content.push_str(&accessor.text);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!(path = %path.display(), model = %accessor.model, method = %accessor.method, "Appended accessor");
        Ok(true)
    }
}
