//! Subcommand implementations

pub mod serve;
pub mod snapshot;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use fraudboard_core::{ConnectionProvider, Dashboard, FixtureSource, PgStatsSource, Settings, StatsSource};

/// Dashboard over the fixture at `fixture`, or over PostgreSQL when `None`.
///
/// Building the PostgreSQL variant never connects; the first query does.
pub fn build_dashboard(fixture: Option<&Path>, settings: &Settings) -> Result<Dashboard> {
    let source: Arc<dyn StatsSource> = match fixture {
        Some(path) => Arc::new(
            FixtureSource::from_path(path)
                .with_context(|| format!("Failed to load fixture {}", path.display()))?
                .anchored_to_latest(),
        ),
        None => {
            let provider = Arc::new(ConnectionProvider::from_env(settings.clone()));
            Arc::new(PgStatsSource::new(provider).with_query_timeout(settings.query_timeout))
        }
    };

    Ok(Dashboard::new(source, settings.cache_ttl))
}
