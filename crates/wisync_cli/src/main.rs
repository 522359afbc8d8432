//! wisync CLI
//!
//! Command-line access to a work item store through the sync adapter.
//!
//! # Commands
//!
//! - `show` - Wrap a work item and print its snapshot
//! - `describe` - Dump field metadata as JSON
//! - `load` - Bulk wrap work items
//! - `set` - Edit fields and commit
//! - `project` - Resolve a team project

mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::CliConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wisync_adapter::{JsonFileStore, SyncAdapter};

/// Work item sync tools.
#[derive(Parser)]
#[command(name = "wisync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON store document
    #[arg(global = true, short, long)]
    store: Option<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wrap a work item and print its snapshot
    Show {
        /// Work item id
        id: u32,

        /// Load this historical revision instead of the latest
        #[arg(short, long)]
        revision: Option<u32>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Dump field metadata as indented JSON
    Describe {
        /// Work item id
        id: u32,

        /// Only describe this field
        #[arg(long)]
        field: Option<String>,
    },

    /// Bulk wrap work items and print a summary
    Load {
        /// Comma-separated ids (default: every work item)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<u32>,
    },

    /// Edit fields on a work item and commit them
    Set {
        /// Work item id
        id: u32,

        /// FIELD=VALUE assignments
        #[arg(required = true)]
        assignments: Vec<String>,
    },

    /// Resolve a team project (default: the configured project)
    Project {
        /// Project name
        name: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("wisync CLI v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let path = cli.store.ok_or("Store path required (--store)")?;
    let store = JsonFileStore::open(&path)?;
    tracing::debug!(path = %path.display(), records = store.ids().len(), "opened store");
    if !config.team_project.collection.is_empty() {
        tracing::debug!(
            collection = %config.team_project.collection,
            "using team project collection"
        );
    }
    let adapter = SyncAdapter::new(config.adapter.clone(), store);

    match cli.command {
        Commands::Show {
            id,
            revision,
            format,
        } => {
            commands::show::run(&adapter, id, revision, &format)?;
        }
        Commands::Describe { id, field } => {
            commands::describe::run(&adapter, id, field.as_deref())?;
        }
        Commands::Load { ids } => {
            commands::load::run(&adapter, &ids)?;
        }
        Commands::Set { id, assignments } => {
            commands::set::run(&adapter, id, &assignments)?;
        }
        Commands::Project { name } => {
            let name = name
                .or_else(|| Some(config.team_project.project.clone()).filter(|p| !p.is_empty()))
                .ok_or("Project name required (argument or team_project.project in config)")?;
            commands::project::run(&adapter, &name)?;
        }
        Commands::Version => {}
    }

    Ok(())
}
