//! Lazily created, process-wide PostgreSQL pool.
//!
//! The pool is built on the first `get_connection` call and reused for the
//! lifetime of the provider. Creation opens one connection first and fails
//! with the driver's error if that attempt fails; there are no retries. A
//! failed attempt is not remembered, so the next call tries again.

use std::io;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgConnection, PgPool};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::{Settings, UrlSource};
use crate::error::{DashboardError, Result};

/// Owns the single pool handed out to every query.
#[derive(Debug)]
pub struct ConnectionProvider {
    url: UrlSource,
    settings: Settings,
    pool: OnceCell<PgPool>,
}

impl ConnectionProvider {
    /// Provider that reads `NEON_DATABASE_URL` on first use.
    pub fn from_env(settings: Settings) -> Self {
        Self::new(UrlSource::default(), settings)
    }

    pub fn new(url: UrlSource, settings: Settings) -> Self {
        Self {
            url,
            settings,
            pool: OnceCell::new(),
        }
    }

    /// Return the shared pool, creating it on first call.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the connection string is absent or malformed
    /// - `Connection` if the database cannot be reached
    pub async fn get_connection(&self) -> Result<PgPool> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool.clone());
        }

        // Concurrent first calls each check reachability, so they all fail
        // within one `connect_timeout`; only one pool is ever stored.
        let options = self
            .url
            .resolve()
            .inspect_err(|e| warn!("Database pool unavailable: {}", e))?;
        self.check_reachable(&options)
            .await
            .inspect_err(|e| warn!("Database pool unavailable: {}", e))?;

        let pool = self
            .pool
            .get_or_init(|| async {
                info!(
                    max_connections = self.settings.max_connections,
                    "Database pool created"
                );
                PgPoolOptions::new()
                    .max_connections(self.settings.max_connections)
                    .acquire_timeout(self.settings.connect_timeout)
                    .connect_lazy_with(options)
            })
            .await;

        Ok(pool.clone())
    }

    /// Open and close a single connection, bounded by `connect_timeout`.
    ///
    /// Does not retry, and keeps the driver's error as the source.
    async fn check_reachable(&self, options: &PgConnectOptions) -> Result<()> {
        let timeout = self.settings.connect_timeout;
        let conn = tokio::time::timeout(timeout, PgConnection::connect_with(options))
            .await
            .map_err(|_| DashboardError::Connection {
                source: sqlx::Error::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no response within {}s", timeout.as_secs()),
                )),
            })?
            .map_err(classify_connect_error)?;

        if let Err(e) = conn.close().await {
            warn!("Closing the initial connection failed: {}", e);
        }
        Ok(())
    }

    /// Whether a pool has been created yet.
    pub fn is_initialized(&self) -> bool {
        self.pool.initialized()
    }
}

/// Option parsing failures are configuration problems; everything else
/// raised while connecting means the server could not be reached.
fn classify_connect_error(err: sqlx::Error) -> DashboardError {
    match err {
        sqlx::Error::Configuration(reason) => DashboardError::config(reason.to_string()),
        source => DashboardError::Connection { source },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::time::Duration;

    #[tokio::test]
    async fn missing_url_fails_without_caching() {
        let provider = ConnectionProvider::new(
            UrlSource::Env("FRAUDBOARD_TEST_NEVER_SET_URL"),
            Settings::default(),
        );

        let err = provider.get_connection().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!provider.is_initialized());

        let err = provider.get_connection().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn unreachable_host_is_a_connection_error() {
        let settings = Settings {
            connect_timeout: Duration::from_secs(1),
            ..Settings::default()
        };
        // Port 1 on loopback refuses immediately.
        let provider = ConnectionProvider::new(
            UrlSource::Fixed("postgres://user:pw@127.0.0.1:1/fraud".to_string()),
            settings,
        );

        let started = std::time::Instant::now();
        let err = provider.get_connection().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(
            err.to_string().to_lowercase().contains("refused"),
            "driver cause missing: {err}"
        );
        assert!(!provider.is_initialized());
    }

    #[test]
    fn configuration_errors_are_classified() {
        let err = classify_connect_error(sqlx::Error::Configuration("bad sslmode".into()));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = classify_connect_error(sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    // Integration tests require a real database
    // Run with: NEON_DATABASE_URL=postgres://... cargo test -p fraudboard-core -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_is_memoized() {
        let provider = ConnectionProvider::from_env(Settings::default());
        let first = provider.get_connection().await.expect("pool creation failed");
        let second = provider.get_connection().await.expect("second call failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&first)
            .await
            .expect("query failed");
        assert_eq!(result.0, 1);
        assert!(provider.is_initialized());
        assert_eq!(first.size(), second.size());
    }
}
