//! schemadoc command line
//!
//! - `doc`: write Markdown documentation for a database
//! - `diff`: compare the database with existing documentation
//! - `lint`: check the schema against documentation rules
//! - `out`: dump the analyzed schema as a JSON document

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use schemadoc::config::{Overrides, Settings};
use schemadoc::datasource::analyze;
use schemadoc::lint::lint;
use schemadoc::output::{diff_docs, write_docs};
use schemadoc::render::Markdown;
use schemadoc::schema::Schema;
use schemadoc::transform::modify_schema;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "schemadoc", version, about = "Document database schemas as Markdown")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Source {
    /// Data source (postgres://..., json://...); overrides the config file
    dsn: Option<String>,

    /// Config file (defaults to .schemadoc.yml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct Layout {
    /// Pad Markdown table cells to a uniform width
    #[arg(short = 'j', long = "adjust-table")]
    adjust: bool,

    /// Sort tables, columns and relations by name
    #[arg(long)]
    sort: bool,

    /// ER diagram image format to link
    #[arg(short = 't', long)]
    er_format: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Write documentation
    Doc {
        #[command(flatten)]
        source: Source,

        /// Output directory
        doc_path: Option<String>,

        #[command(flatten)]
        layout: Layout,

        /// Overwrite existing documents
        #[arg(short, long)]
        force: bool,
    },
    /// Show how the documentation differs from the database
    Diff {
        #[command(flatten)]
        source: Source,

        /// Documentation directory
        doc_path: Option<String>,

        #[command(flatten)]
        layout: Layout,
    },
    /// Check documentation rules
    Lint {
        #[command(flatten)]
        source: Source,
    },
    /// Print the analyzed schema as JSON
    Out {
        #[command(flatten)]
        source: Source,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sort tables, columns and relations by name
        #[arg(long)]
        sort: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }
    let env: HashMap<String, String> = std::env::vars().collect();

    match Cli::parse().command {
        Command::Doc {
            source,
            doc_path,
            layout,
            force,
        } => {
            let overrides = layout.overrides(source.dsn.clone(), doc_path);
            let (settings, schema) = load(&source, &env, &overrides).await?;
            let renderer = Markdown::new(&settings);
            for path in write_docs(&schema, &settings, &renderer, force)? {
                println!("{}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Diff {
            source,
            doc_path,
            layout,
        } => {
            let overrides = layout.overrides(source.dsn.clone(), doc_path);
            let (settings, schema) = load(&source, &env, &overrides).await?;
            let diff = diff_docs(&schema, &settings, &Markdown::new(&settings))?;
            if diff.is_empty() {
                info!("Documentation is up to date");
                return Ok(ExitCode::SUCCESS);
            }
            print!("{}", diff);
            Ok(ExitCode::FAILURE)
        }
        Command::Lint { source } => {
            let overrides = Overrides {
                dsn: source.dsn.clone(),
                ..Default::default()
            };
            let (settings, schema) = load(&source, &env, &overrides).await?;
            let violations = lint(&schema, &settings);
            for v in &violations {
                debug!("Rule {} failed", v.rule_name);
                println!("{}", v.message);
            }
            if violations.is_empty() {
                Ok(ExitCode::SUCCESS)
            } else {
                println!("\n{} detected", violations.len());
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Out {
            source,
            output,
            sort,
        } => {
            let overrides = Overrides {
                dsn: source.dsn.clone(),
                sort,
                ..Default::default()
            };
            let (_, schema) = load(&source, &env, &overrides).await?;
            let json = serde_json::to_string_pretty(&schema.to_document())?;
            match output {
                Some(path) => std::fs::write(&path, json + "\n")
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{}", json),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

impl Layout {
    fn overrides(&self, dsn: Option<String>, doc_path: Option<String>) -> Overrides {
        Overrides {
            dsn,
            doc_path,
            adjust: self.adjust,
            sort: self.sort,
            er_format: self.er_format.clone(),
        }
    }
}

/// Load settings, analyze every data source and apply the configuration
async fn load(
    source: &Source,
    env: &HashMap<String, String>,
    overrides: &Overrides,
) -> anyhow::Result<(Settings, Schema)> {
    let settings = Settings::load(source.config.as_deref(), env, overrides)?;
    let mut schema = analyze(&settings.dsn).await?;
    modify_schema(&mut schema, &settings)?;
    Ok((settings, schema))
}

/// Initialize tracing subscriber
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .init();
}
