//! `tailor` command-line front end.

mod commands;
mod config;
mod error;

use clap::{Parser, Subcommand};
use commands::{Context, ValidationReport};
use config::CliConfig;
use error::CliError;
use rootcause::prelude::Report;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tailor_workflow::{NodeKind, Workflow};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build, check and lay out website personalization workflows.
#[derive(Parser)]
#[command(name = "tailor", version, about, long_about = None)]
struct Cli {
    /// Configuration file, overridden by TAILOR_* environment variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the node templates in the catalog
    Catalog {
        /// Only list templates of this kind
        #[arg(long, value_parser = commands::parse_kind)]
        kind: Option<NodeKind>,
    },
    /// Import a generated draft and print the workflow
    Import {
        /// Draft JSON file
        draft: PathBuf,
        /// Lay the imported nodes out on the grid
        #[arg(long)]
        layout: bool,
    },
    /// Lay out a workflow file and print it
    Layout {
        /// Workflow JSON file
        workflow: PathBuf,
    },
    /// Check a workflow file for structural and config problems
    Validate {
        /// Workflow JSON file
        workflow: PathBuf,
    },
    /// Generate a workflow from a prompt
    Generate {
        /// What the workflow should do
        prompt: String,
        /// Name of the new workflow
        #[arg(long, default_value = "Generated workflow")]
        name: String,
        /// Lay the generated nodes out on the grid
        #[arg(long)]
        layout: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(report) => {
            eprintln!("error: {report}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> tailor_core::Result<ExitCode, CliError> {
    let config = CliConfig::load(cli.config.as_deref())
        .map_err(|e| Report::new(e).context(CliError::Config))?;
    tracing::debug!(?config, "Loaded configuration");
    let ctx = Context::new(config)?;

    match cli.command {
        Command::Catalog { kind } => {
            print(&commands::catalog_listing(ctx.catalog(), kind))?;
        }
        Command::Import { draft, layout } => {
            let workflow = commands::import_draft(&ctx, &draft, layout).await?;
            print(&commands::render(&workflow)?)?;
        }
        Command::Layout { workflow } => {
            let workflow: Workflow = commands::read_json(&workflow)?;
            let workflow = commands::layout_workflow(&ctx, workflow).await?;
            print(&commands::render(&workflow)?)?;
        }
        Command::Validate { workflow } => {
            let workflow: Workflow = commands::read_json(&workflow)?;
            let report = ValidationReport::check(&workflow, ctx.catalog());
            print(&report.to_string())?;
            if !report.is_valid() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Generate {
            prompt,
            name,
            layout,
        } => {
            let workflow = commands::generate(&ctx, &name, &prompt, layout).await?;
            print(&commands::render(&workflow)?)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print(text: &str) -> tailor_core::Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| {
            if text.ends_with('\n') {
                Ok(())
            } else {
                stdout.write_all(b"\n")
            }
        })
        .map_err(|e| CliError::WriteFailed {
            reason: e.to_string(),
        })?;
    Ok(())
}
