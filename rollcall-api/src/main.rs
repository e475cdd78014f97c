//! rollcall-api - read-only HTTP query service
//!
//! Serves vote search, CSV export, and attendance leaderboards over the
//! database that rollcall-ingest maintains.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rollcall_common::config;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rollcall_api::{build_router, AppState};

#[derive(Parser)]
#[command(name = "rollcall-api", version, about = "Parliament voting data query service")]
struct Cli {
    /// Data folder holding the database
    #[arg(long, env = config::DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Listen address
    #[arg(long, default_value = "127.0.0.1:5740")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    info!("Starting rollcall-api");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let data_dir = config::resolve_data_dir(cli.data_dir.as_deref());
    let db_path = config::database_path(&data_dir);
    info!("Database: {}", db_path.display());

    let pool = rollcall_api::db::connect_readonly(&db_path).await?;
    info!("Database connection established (read-only)");

    let app = build_router(AppState::new(pool));

    let listener = tokio::net::TcpListener::bind(&cli.bind).await?;
    info!("Listening on http://{}", cli.bind);
    info!("Health check: http://{}/health", cli.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
