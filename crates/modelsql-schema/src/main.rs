//! modelsql CLI
//!
//! Command-line tool printing the DDL of a model document and generating
//! relationship accessors.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use modelsql_core::model::{ModelDocument, ModelRegistry};
use modelsql_core::{Dialect, Settings};
use modelsql_orm::accessors::{AccessorSynthesizer, AppendPatcher, SourcePatcher};
use modelsql_schema::prelude::*;

/// Dialect-aware DDL from declarative model documents.
#[derive(Parser)]
#[command(name = "modelsql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON model document.
    #[arg(short, long, default_value = "models.json")]
    models: PathBuf,

    /// SQL dialect (overrides the document settings).
    #[arg(short, long, env = "MODELSQL_DIALECT")]
    dialect: Option<Dialect>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every CREATE TABLE, foreign key and index.
    Sqlall {
        /// Print the plan as JSON instead of a SQL script.
        #[arg(long)]
        json: bool,
    },

    /// Print the DROP TABLE statements.
    Droptables,

    /// Print drops followed by the full schema.
    Recreate,

    /// Generate relationship accessor methods.
    Accessors {
        /// Directory holding one source file per model.
        #[arg(short, long, default_value = "src/models")]
        source_root: PathBuf,

        /// Append missing accessors to the source files instead of printing them.
        #[arg(long)]
        write: bool,
    },
}

fn load(path: &Path, dialect: Option<Dialect>) -> anyhow::Result<(Settings, ModelRegistry)> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read model document {}", path.display()))?;
    let doc = ModelDocument::from_json(&json)?;

    let mut settings = doc.settings.clone().unwrap_or_default();
    if let Some(dialect) = dialect {
        settings = settings.with_dialect(dialect);
    }
    let registry = doc.into_registry()?;
    info!(
        models = registry.len(),
        dialect = %settings.dialect(),
        "Loaded model document"
    );
    Ok((settings, registry))
}

fn print_plan(report: RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report.plan)?);
    } else {
        print!("{}", report.plan.to_script());
    }
    for column in &report.plan.auto_now {
        info!(
            table = %column.table,
            column = %column.column,
            on_insert = column.on_insert,
            on_update = column.on_update,
            "Timestamp column must be set by the application"
        );
    }
    report.into_result()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let (settings, registry) = load(&cli.models, cli.dialect)?;
    let mut run = SchemaRun::new(&settings, &registry, RecordingExecutor::new());

    match cli.command {
        Commands::Sqlall { json } => print_plan(run.sync(), json)?,

        Commands::Droptables => print_plan(run.drop_tables(), false)?,

        Commands::Recreate => print_plan(run.recreate(), false)?,

        Commands::Accessors { source_root, write } => {
            let (pairs, errors) = AccessorSynthesizer::new(&registry, source_root).synthesize_all();
            let mut patcher = AppendPatcher;
            let mut written = 0;

            for pair in &pairs {
                if write {
                    written += patcher.apply(pair)?;
                } else {
                    for (path, accessor) in [
                        (&pair.owner_file_path, &pair.owner),
                        (&pair.target_file_path, &pair.target),
                    ] {
                        println!("// {}", path.display());
                        println!("{}\n", accessor.text);
                    }
                }
            }
            if write {
                info!("Wrote {} accessors", written);
            }
            if !errors.is_empty() {
                return Err(SchemaError::Failed(errors.into_iter().map(Into::into).collect()).into());
            }
        }
    }

    Ok(())
}
