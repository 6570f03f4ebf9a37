use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use scoreboard_core::config::{Config, FeedConfig};
use scoreboard_core::db::SqliteStore;
use scoreboard_core::pipeline;
use scoreboard_core::schema::{ServiceRow, Snapshot, TeamRow};
use scoreboard_core::transform::{parse_snapshot, transform};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SCOREBOARD_LOG";

#[derive(Parser)]
#[command(name = "scoreboard-etl")]
#[command(about = "Append CTF scoreboard snapshots to a relational store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the feed once and append teams and services (the default)
    Run {
        /// Append into this SQLite file instead of PostgreSQL
        #[arg(long)]
        sqlite: Option<PathBuf>,
    },
    /// Transform a snapshot file and print the rows without touching a store
    Transform {
        /// Snapshot JSON file
        #[arg(long)]
        input: PathBuf,
    },
    /// Export JSON Schemas to the ./schemas directory
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for the snapshot and row types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    // Before tracing, so SCOREBOARD_LOG may come from the file too.
    load_dotenv()?;
    init_tracing();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run { sqlite: None }) {
        Commands::Run { sqlite } => run(sqlite),
        Commands::Transform { input } => {
            println!("{}", transform_file(&input)?);
            Ok(())
        }
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => {
                schema_export(&out_dir)?;
                println!("Exported schemas to {}", out_dir.display());
                Ok(())
            }
        },
    }
}

/// Loads `./.env` (or the nearest one in a parent directory) into the
/// process environment. Variables already set are never overridden; a
/// missing file is fine, an unreadable or malformed one is not.
fn load_dotenv() -> Result<()> {
    tolerate_missing(dotenvy::dotenv())
}

fn tolerate_missing<T>(loaded: std::result::Result<T, dotenvy::Error>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err).context("loading .env"),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(sqlite: Option<PathBuf>) -> Result<()> {
    let summary = match sqlite {
        Some(path) => {
            let feed = FeedConfig::from_env().context("loading configuration")?;
            pipeline::run_with(&feed.url, || SqliteStore::open(&path))
                .with_context(|| format!("ingesting into {}", path.display()))?
        }
        None => {
            let config = Config::from_env().context("loading configuration")?;
            pipeline::run(&config).context("ingesting into postgres")?
        }
    };

    tracing::info!(
        tick = summary.tick,
        teams = summary.teams,
        services = summary.services,
        "run complete"
    );
    Ok(())
}

fn transform_file(input: &Path) -> Result<String> {
    let body = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let snapshot =
        parse_snapshot(&body).with_context(|| format!("parsing {}", input.display()))?;
    let rows = transform(&snapshot, pipeline::capture_timestamp())?;
    Ok(serde_json::to_string_pretty(&rows)?)
}

fn schema_export(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)?;

    let snapshot_schema = schema_for!(Snapshot);
    let snapshot_json = serde_json::to_string_pretty(&snapshot_schema)?;
    fs::write(out_dir.join("Snapshot.schema.json"), snapshot_json)?;

    let team_schema = schema_for!(TeamRow);
    let team_json = serde_json::to_string_pretty(&team_schema)?;
    fs::write(out_dir.join("TeamRow.schema.json"), team_json)?;

    let service_schema = schema_for!(ServiceRow);
    let service_json = serde_json::to_string_pretty(&service_schema)?;
    fs::write(out_dir.join("ServiceRow.schema.json"), service_json)?;

    Ok(())
}
