//! fraudboard CLI - fraud monitoring dashboard
//!
//! - `serve`: run the HTTP dashboard
//! - `snapshot`: print the current headline metrics

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "fraudboard",
    author,
    version,
    about = "Fraud detection dashboard over recent scored transactions",
    long_about = "Serve or print fraud metrics read from PostgreSQL (NEON_DATABASE_URL). \
                  Query results are cached per query for FRAUDBOARD_CACHE_TTL_SECS (default 600)."
)]
struct Cli {
    /// Debug logging (RUST_LOG still wins when set)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the `telemetry` feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP dashboard
    Serve(commands::serve::ServeArgs),
    /// Print headline metrics, alert and merchant ranking once
    Snapshot(commands::snapshot::SnapshotArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })?;
    fraudboard_core::config::load_dotenv();

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::run_serve(args).await,
        Commands::Snapshot(args) => commands::snapshot::run_snapshot(args).await,
    };

    tracing_setup::shutdown_otel();
    result
}
