//! Process configuration: `.env` loading and environment-backed settings.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;
use tracing::{debug, info};

use crate::error::{DashboardError, Result};

/// Connection string variable, read on first database access.
pub const DATABASE_URL_VAR: &str = "NEON_DATABASE_URL";

pub const CACHE_TTL_VAR: &str = "FRAUDBOARD_CACHE_TTL_SECS";
pub const MAX_CONNECTIONS_VAR: &str = "FRAUDBOARD_MAX_CONNECTIONS";
pub const CONNECT_TIMEOUT_VAR: &str = "FRAUDBOARD_CONNECT_TIMEOUT_SECS";
pub const QUERY_TIMEOUT_VAR: &str = "FRAUDBOARD_QUERY_TIMEOUT_SECS";

/// Default time-to-live for every query cache.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Kept low: one dashboard process, three queries.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Load environment variables from .env files.
///
/// Priority order (highest to lowest):
/// 1. Variables already set in the environment
/// 2. Current directory .env
/// 3. ~/.fraudboard/.env
///
/// dotenvy never overwrites a variable that is already set.
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded .env from current directory: {}", path.display());
        loaded_from.push(path.display().to_string());
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(()) => {
                    debug!("Loaded .env from {}", env_file.display());
                    loaded_from.push(env_file.display().to_string());
                }
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env files found, using process environment only");
    } else {
        info!("Loaded configuration from: {}", loaded_from.join(", "));
    }
}

/// Get the fraudboard config directory path (~/.fraudboard)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".fraudboard"))
}

/// Where the connection string comes from.
#[derive(Debug, Clone)]
pub enum UrlSource {
    /// Read the named environment variable at connect time
    Env(&'static str),
    /// Use a literal value (tests, CLI overrides)
    Fixed(String),
}

impl Default for UrlSource {
    fn default() -> Self {
        Self::Env(DATABASE_URL_VAR)
    }
}

impl UrlSource {
    /// Resolve and validate the connection string.
    ///
    /// # Errors
    ///
    /// `Configuration` if the value is absent, empty, not a postgres URL,
    /// or rejected by the driver's option parser.
    pub fn resolve(&self) -> Result<PgConnectOptions> {
        let (raw, origin) = match self {
            Self::Env(var) => {
                let value = std::env::var(var)
                    .map_err(|_| DashboardError::config(format!("{var} is not set")))?;
                (value, *var)
            }
            Self::Fixed(value) => (value.clone(), "database URL"),
        };

        parse_database_url(raw.trim()).map_err(|reason| {
            DashboardError::config(format!("{origin} is invalid: {reason}"))
        })
    }
}

fn parse_database_url(raw: &str) -> std::result::Result<PgConnectOptions, String> {
    if raw.is_empty() {
        return Err("value is empty".to_string());
    }
    if !(raw.starts_with("postgres://") || raw.starts_with("postgresql://")) {
        return Err("expected a postgres:// or postgresql:// URL".to_string());
    }
    PgConnectOptions::from_str(raw).map_err(|e| e.to_string())
}

/// Tuning knobs for the pool and the query layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cache_ttl: Duration,
    pub max_connections: u32,
    pub connect_timeout: Duration,
    /// No timeout when `None`; the driver's own behaviour applies.
    pub query_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            query_timeout: None,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup, unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(secs) = parse_var::<u64, _>(&lookup, CACHE_TTL_VAR)? {
            settings.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(max) = parse_var::<u32, _>(&lookup, MAX_CONNECTIONS_VAR)? {
            if max == 0 {
                return Err(DashboardError::config(format!(
                    "{MAX_CONNECTIONS_VAR} must be at least 1"
                )));
            }
            settings.max_connections = max;
        }
        if let Some(secs) = parse_positive_secs(&lookup, CONNECT_TIMEOUT_VAR)? {
            settings.connect_timeout = secs;
        }
        settings.query_timeout = parse_positive_secs(&lookup, QUERY_TIMEOUT_VAR)?;

        Ok(settings)
    }
}

/// A zero timeout would fail every attempt, so it is rejected.
fn parse_positive_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_var::<u64, _>(lookup, key)? {
        Some(0) => Err(DashboardError::config(format!(
            "{key} must be at least 1 second"
        ))),
        secs => Ok(secs.map(Duration::from_secs)),
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| DashboardError::config(format!("{key}={raw:?}: {e}"))),
    }
}
