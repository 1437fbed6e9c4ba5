//! PostgreSQL source - the three dashboard queries
//!
//! Queries run against tables maintained by the scoring pipeline:
//! - `recent_transactions`: scored transactions, read over the last 24h
//! - `daily_stats`: one aggregate row per day

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use tracing::{debug, instrument};

use super::StatsSource;
use crate::connection::ConnectionProvider;
use crate::error::{DashboardError, Result};
use crate::models::{DailyStat, MerchantStat, Transaction};

pub const RECENT_TRANSACTIONS_SQL: &str = "SELECT * FROM recent_transactions \
     WHERE trans_date_trans_time >= NOW() - INTERVAL '24 hours' \
     ORDER BY trans_date_trans_time DESC";

pub const DAILY_STATS_SQL: &str = "SELECT * FROM daily_stats ORDER BY date DESC LIMIT 7";

pub const MERCHANT_STATS_SQL: &str = r#"
    SELECT
        merchant,
        COUNT(*) AS total_transactions,
        SUM(CASE WHEN is_fraud THEN 1 ELSE 0 END) AS fraud_transactions,
        ROUND((SUM(CASE WHEN is_fraud THEN 1 ELSE 0 END)::decimal / COUNT(*)) * 100, 2) AS fraud_rate
    FROM recent_transactions
    GROUP BY merchant
    ORDER BY fraud_rate DESC, total_transactions DESC
    LIMIT 10
"#;

/// Source backed by the shared connection pool.
pub struct PgStatsSource {
    provider: Arc<ConnectionProvider>,
    query_timeout: Option<Duration>,
}

impl PgStatsSource {
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        Self {
            provider,
            query_timeout: None,
        }
    }

    /// Fail queries that run longer than `timeout`.
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Run `sql`, decoding every row with `decode`.
    ///
    /// The pool comes from the provider, so configuration and connection
    /// errors surface here on the first call.
    async fn fetch<T>(
        &self,
        query: &'static str,
        sql: &'static str,
        decode: fn(&PgRow) -> std::result::Result<T, sqlx::Error>,
    ) -> Result<Vec<T>> {
        let pool = self.provider.get_connection().await?;
        let rows = self.with_timeout(query, run(&pool, sql)).await?;
        let rows = rows.map_err(|e| DashboardError::retrieval(query, e))?;

        let items = rows
            .iter()
            .map(decode)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DashboardError::retrieval(query, e))?;

        debug!(query, rows = items.len(), "query complete");
        Ok(items)
    }

    async fn with_timeout<F: Future>(&self, query: &'static str, fut: F) -> Result<F::Output> {
        match self.query_timeout {
            None => Ok(fut.await),
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| DashboardError::Timeout {
                    query,
                    seconds: limit.as_secs(),
                }),
        }
    }
}

async fn run(pool: &PgPool, sql: &'static str) -> std::result::Result<Vec<PgRow>, sqlx::Error> {
    sqlx::query(sql).fetch_all(pool).await
}

#[async_trait]
impl StatsSource for PgStatsSource {
    fn name(&self) -> &str {
        "postgres"
    }

    #[instrument(skip(self))]
    async fn recent_transactions(&self) -> Result<Vec<Transaction>> {
        self.fetch(
            "recent transactions",
            RECENT_TRANSACTIONS_SQL,
            Transaction::from_row,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn daily_stats(&self) -> Result<Vec<DailyStat>> {
        self.fetch("daily stats", DAILY_STATS_SQL, DailyStat::from_row)
            .await
    }

    #[instrument(skip(self))]
    async fn merchant_stats(&self) -> Result<Vec<MerchantStat>> {
        self.fetch("merchant stats", MERCHANT_STATS_SQL, MerchantStat::from_row)
            .await
    }
}
