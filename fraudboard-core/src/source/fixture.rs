//! In-memory source loaded from a JSON fixture.
//!
//! Used for the offline demo and for tests. Answers the three dashboard
//! questions with the same ordering, limits and rounding as the SQL.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{StatsSource, DAILY_STATS_LIMIT, MERCHANT_STATS_LIMIT};
use crate::error::{DashboardError, Result};
use crate::models::{DailyStat, MerchantStat, Transaction};

/// On-disk layout of a fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub daily_stats: Vec<DailyStat>,
}

#[derive(Debug, Clone)]
pub struct FixtureSource {
    fixture: Fixture,
    /// Fixed clock; `None` means "now" at query time
    now: Option<NaiveDateTime>,
}

impl FixtureSource {
    pub fn new(fixture: Fixture) -> Self {
        Self { fixture, now: None }
    }

    /// Load a fixture file.
    ///
    /// # Errors
    ///
    /// `Fixture` if the file cannot be read or is not valid fixture JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DashboardError::fixture(path, e.to_string()))?;
        let fixture: Fixture = serde_json::from_str(&raw)
            .map_err(|e| DashboardError::fixture(path, e.to_string()))?;
        tracing::info!(
            path = %path.display(),
            transactions = fixture.transactions.len(),
            days = fixture.daily_stats.len(),
            "Fixture loaded"
        );
        Ok(Self::new(fixture))
    }

    /// Evaluate the 24h window against a fixed instant instead of the clock.
    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    /// Anchor the 24h window at the newest transaction in the fixture, so a
    /// recorded fixture keeps showing data after the day it was captured.
    pub fn anchored_to_latest(self) -> Self {
        match self.fixture.transactions.iter().map(|tx| tx.trans_date_trans_time).max() {
            Some(latest) => self.at(latest),
            None => self,
        }
    }

    fn window(&self) -> impl Iterator<Item = &Transaction> {
        let cutoff = self.now.unwrap_or_else(|| Utc::now().naive_utc()) - Duration::hours(24);
        self.fixture
            .transactions
            .iter()
            .filter(move |tx| tx.trans_date_trans_time >= cutoff)
    }
}

/// Group transactions by merchant and rank them the way the SQL does.
pub fn rank_merchants<'a, I>(transactions: I, limit: usize) -> Vec<MerchantStat>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut counts: HashMap<&str, (i64, i64)> = HashMap::new();
    for tx in transactions {
        let entry = counts.entry(tx.merchant.as_str()).or_default();
        entry.0 += 1;
        if tx.is_fraud {
            entry.1 += 1;
        }
    }

    let mut stats: Vec<MerchantStat> = counts
        .into_iter()
        .map(|(merchant, (total, fraud))| MerchantStat::from_counts(merchant, total, fraud))
        .collect();
    // Name as a last resort so ties are deterministic.
    stats.sort_by(|a, b| MerchantStat::risk_order(a, b).then_with(|| a.merchant.cmp(&b.merchant)));
    stats.truncate(limit);
    stats
}

#[async_trait]
impl StatsSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn recent_transactions(&self) -> Result<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self.window().cloned().collect();
        rows.sort_by(|a, b| b.trans_date_trans_time.cmp(&a.trans_date_trans_time));
        Ok(rows)
    }

    async fn daily_stats(&self) -> Result<Vec<DailyStat>> {
        let mut rows = self.fixture.daily_stats.clone();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows.truncate(DAILY_STATS_LIMIT);
        Ok(rows)
    }

    // The SQL groups the whole table, not just the 24h window.
    async fn merchant_stats(&self) -> Result<Vec<MerchantStat>> {
        Ok(rank_merchants(&self.fixture.transactions, MERCHANT_STATS_LIMIT))
    }
}
