//! Data sources behind the query layer.
//!
//! Every source answers the same three read-only questions, so the cached
//! query layer and everything that renders its output stay unaware of where
//! the rows come from.

pub mod fixture;
pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DailyStat, MerchantStat, Transaction};

pub use fixture::FixtureSource;
pub use postgres::PgStatsSource;

/// Rows returned by the daily stats query.
pub const DAILY_STATS_LIMIT: usize = 7;

/// Rows returned by the merchant ranking query.
pub const MERCHANT_STATS_LIMIT: usize = 10;

#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Short label for logs and the page footer
    fn name(&self) -> &str;

    /// Transactions from the last 24 hours, newest first.
    async fn recent_transactions(&self) -> Result<Vec<Transaction>>;

    /// Up to seven daily aggregates, newest first.
    async fn daily_stats(&self) -> Result<Vec<DailyStat>>;

    /// Top ten merchants by fraud rate, then volume.
    async fn merchant_stats(&self) -> Result<Vec<MerchantStat>>;
}
