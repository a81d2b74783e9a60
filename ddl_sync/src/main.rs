use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::Level;

use ddl_sync::utils::{init_logging, read_schema_source};
use ddl_sync::{config, compare, render_script, sync_statements, ActionKind, ActionSet, Config};

#[derive(Parser)]
#[command(name = "ddl_sync")]
#[command(author, version, about = "Generate the migration between two MySQL schema dumps")]
struct Cli {
    /// Current schema: a .sql file or a directory of .sql files
    source: PathBuf,

    /// Target schema: a .sql file or a directory of .sql files
    destination: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Allowed actions (create, drop, add, remove, modify), comma separated
    #[arg(long, value_delimiter = ',')]
    allow: Option<Vec<ActionKind>>,

    /// Keep `db.` qualifiers on table names
    #[arg(long)]
    keep_schema_qualifier: bool,

    /// Compare AUTO_INCREMENT table options
    #[arg(long)]
    keep_auto_increment: bool,

    /// Keep IF NOT EXISTS from the destination CREATE statements
    #[arg(long)]
    keep_if_not_exists: bool,

    /// Do not add IF NOT EXISTS to created tables
    #[arg(long)]
    no_force_if_not_exists: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Script)]
    format: OutputFormat,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Statements joined into one SQL script
    Script,
    /// Statements as a JSON array
    Json,
    /// Per-table differences as JSON
    Diff,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_from_file(&path.to_string_lossy())
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let level = cli.verbose.then_some(Level::DEBUG);
    init_logging(&config.logging, level).context("Failed to initialize logging")?;

    let sync = &mut config.sync;
    if let Some(actions) = &cli.allow {
        sync.allowed_actions = ActionSet::only(actions);
    }
    if cli.keep_schema_qualifier {
        sync.strip_schema_qualifier = false;
    }
    if cli.keep_auto_increment {
        sync.ignore_auto_increment = false;
    }
    if cli.keep_if_not_exists {
        sync.strip_if_not_exists_from_source = false;
    }
    if cli.no_force_if_not_exists {
        sync.force_if_not_exists_on_create = false;
    }

    let source = read_schema_source(&cli.source)
        .with_context(|| format!("Failed to read source schema {}", cli.source.display()))?;
    let destination = read_schema_source(&cli.destination).with_context(|| {
        format!("Failed to read destination schema {}", cli.destination.display())
    })?;

    let rendered = match cli.format {
        OutputFormat::Script => {
            let script = render_script(&sync_statements(&source, &destination, &config.sync)?);
            match &cli.output {
                Some(_) => format!(
                    "-- Generated by ddl_sync at {}\n{}",
                    chrono::Utc::now().to_rfc3339(),
                    script
                ),
                None => script,
            }
        }
        OutputFormat::Json => {
            let statements = sync_statements(&source, &destination, &config.sync)?;
            serde_json::to_string_pretty(&statements)?
        }
        OutputFormat::Diff => {
            let diff = compare(&source, &destination, &config.sync)?;
            serde_json::to_string_pretty(&diff)?
        }
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, format!("{}\n", rendered))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Migration written");
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
