//! HTTP server command for the fraud dashboard

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fraudboard_core::Settings;
use fraudboard_server::{run_server, AppState, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', default_value = "127.0.0.1:8501")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Serve a JSON fixture instead of querying the database
    #[arg(long, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Seconds a query result stays cached (overrides FRAUDBOARD_CACHE_TTL_SECS)
    #[arg(long, value_name = "SECS")]
    pub cache_ttl: Option<u64>,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut settings = Settings::from_env().context("Invalid fraudboard settings")?;
    if let Some(secs) = args.cache_ttl {
        settings.cache_ttl = Duration::from_secs(secs);
    }

    let dashboard = super::build_dashboard(args.fixture.as_deref(), &settings)?;
    tracing::info!(
        source = dashboard.source_name(),
        cache_ttl_secs = settings.cache_ttl.as_secs(),
        "Starting fraud dashboard on {}",
        args.bind
    );

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
    };

    // Blocks until shutdown
    run_server(AppState::new(dashboard), config)
        .await
        .context("Server error")?;

    Ok(())
}
