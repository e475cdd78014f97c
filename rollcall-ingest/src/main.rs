//! rollcall-ingest - batch importer for parliament voting data
//!
//! Loads raw exports (CSV catalogs, JSON bundles, gzip archives),
//! reconciles them into the rollcall database, and recomputes
//! attendance figures. Imports are idempotent and safe to re-run.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rollcall_common::config;
use rollcall_common::overrides::Overrides;
use rollcall_ingest::reconcile::{run_import, ImportInputs};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rollcall-ingest", version, about = "Parliament voting data importer")]
struct Cli {
    /// Data folder holding the database and override table
    #[arg(long, env = config::DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import source files into the database
    Import {
        /// Member identity CSV (meps.csv)
        #[arg(long)]
        members: Option<PathBuf>,
        /// Source-provided attendance CSV (meps_attendance.csv)
        #[arg(long)]
        attendance: Option<PathBuf>,
        /// Vote catalog CSV (votes_catalog.csv)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Per-member ballot CSV (mep_notable_votes.csv)
        #[arg(long)]
        notable: Option<PathBuf>,
        /// JSON ballot bundle, gzip-compressed when the name ends in .gz;
        /// may be given multiple times
        #[arg(long = "bundle")]
        bundles: Vec<PathBuf>,
    },
    /// Recompute attendance from stored ballots (180-day window)
    Backfill,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    info!("Starting rollcall-ingest");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let data_dir = config::resolve_data_dir(cli.data_dir.as_deref());
    config::ensure_data_dir(&data_dir)?;
    let db_path = config::database_path(&data_dir);
    info!("Database: {}", db_path.display());

    let pool = rollcall_common::db::init_database(&db_path).await?;

    match cli.command {
        Command::Import {
            members,
            attendance,
            catalog,
            notable,
            bundles,
        } => {
            let overrides = Overrides::load(&config::overrides_path(&data_dir))?;
            if !overrides.is_empty() {
                info!("Loaded {} member overrides", overrides.len());
            }
            let inputs = ImportInputs {
                members,
                attendance,
                catalog,
                notable_csv: notable,
                bundles,
            };
            run_import(&pool, &overrides, &inputs).await?;
        }
        Command::Backfill => {
            rollcall_ingest::attendance::backfill(&pool).await?;
        }
    }

    Ok(())
}
