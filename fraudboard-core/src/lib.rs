//! fraudboard-core: cached retrieval of fraud metrics.
//!
//! - [`connection`]: lazily created, process-wide PostgreSQL pool
//! - [`source`]: the three dashboard queries (PostgreSQL or JSON fixture)
//! - [`dashboard`]: per-query TTL caching in front of a source
//! - [`summary`]: pure derivations rendered by the dashboard

pub mod cache;
pub mod config;
pub mod connection;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod source;
pub mod summary;

pub use config::Settings;
pub use connection::ConnectionProvider;
pub use dashboard::Dashboard;
pub use error::{DashboardError, ErrorKind, Result};
pub use models::{DailyStat, MerchantStat, Transaction};
pub use source::{FixtureSource, PgStatsSource, StatsSource};
