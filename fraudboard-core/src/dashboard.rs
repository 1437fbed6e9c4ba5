//! Cached query layer.
//!
//! Each of the three queries has its own [`TtlCache`]; a hit never touches
//! the source.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::TtlCache;
use crate::error::Result;
use crate::models::{DailyStat, MerchantStat, Transaction};
use crate::source::StatsSource;

pub struct Dashboard {
    source: Arc<dyn StatsSource>,
    transactions: TtlCache<Vec<Transaction>>,
    daily: TtlCache<Vec<DailyStat>>,
    merchants: TtlCache<Vec<MerchantStat>>,
}

impl Dashboard {
    pub fn new(source: Arc<dyn StatsSource>, ttl: Duration) -> Self {
        Self {
            source,
            transactions: TtlCache::new("recent_transactions", ttl),
            daily: TtlCache::new("daily_stats", ttl),
            merchants: TtlCache::new("merchant_stats", ttl),
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn ttl(&self) -> Duration {
        self.transactions.ttl()
    }

    /// Transactions from the last 24 hours, newest first.
    pub async fn recent_transactions(&self) -> Result<Arc<Vec<Transaction>>> {
        self.transactions
            .get_or_refresh(|| self.source.recent_transactions())
            .await
    }

    /// The seven most recent daily aggregates, newest first. May be empty.
    pub async fn daily_stats(&self) -> Result<Arc<Vec<DailyStat>>> {
        self.daily.get_or_refresh(|| self.source.daily_stats()).await
    }

    /// Top ten merchants by fraud rate, then volume.
    pub async fn merchant_stats(&self) -> Result<Arc<Vec<MerchantStat>>> {
        self.merchants
            .get_or_refresh(|| self.source.merchant_stats())
            .await
    }

    /// Drop every cached result; the next read of each query hits the source.
    pub async fn invalidate_all(&self) {
        self.transactions.invalidate().await;
        self.daily.invalidate().await;
        self.merchants.invalidate().await;
        info!(source = self.source.name(), "Query caches cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DashboardError, ErrorKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that counts calls per query and can be told to fail.
    #[derive(Default)]
    struct CountingSource {
        transactions: AtomicUsize,
        daily: AtomicUsize,
        merchants: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl StatsSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        async fn recent_transactions(&self) -> Result<Vec<Transaction>> {
            self.transactions.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DashboardError::retrieval(
                    "recent transactions",
                    sqlx::Error::Protocol("relation \"recent_transactions\" does not exist".into()),
                ));
            }
            Ok(vec![])
        }

        async fn daily_stats(&self) -> Result<Vec<DailyStat>> {
            self.daily.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }

        async fn merchant_stats(&self) -> Result<Vec<MerchantStat>> {
            self.merchants.fetch_add(1, Ordering::SeqCst);
            Ok(vec![MerchantStat::from_counts("kiosk", 2, 1)])
        }
    }

    const TTL: Duration = Duration::from_secs(600);

    #[tokio::test(start_paused = true)]
    async fn second_call_within_ttl_skips_the_source() {
        let source = Arc::new(CountingSource::default());
        let dashboard = Dashboard::new(source.clone(), TTL);

        let first = dashboard.merchant_stats().await.unwrap();
        tokio::time::advance(Duration::from_secs(599)).await;
        let second = dashboard.merchant_stats().await.unwrap();

        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.merchants.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn call_after_ttl_requeries() {
        let source = Arc::new(CountingSource::default());
        let dashboard = Dashboard::new(source.clone(), TTL);

        dashboard.daily_stats().await.unwrap();
        tokio::time::advance(Duration::from_secs(601)).await;
        dashboard.daily_stats().await.unwrap();

        assert_eq!(source.daily.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn caches_are_independent() {
        let source = Arc::new(CountingSource::default());
        let dashboard = Dashboard::new(source.clone(), TTL);

        dashboard.daily_stats().await.unwrap();
        dashboard.daily_stats().await.unwrap();
        dashboard.merchant_stats().await.unwrap();

        assert_eq!(source.daily.load(Ordering::SeqCst), 1);
        assert_eq!(source.merchants.load(Ordering::SeqCst), 1);
        assert_eq!(source.transactions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn errors_propagate_and_are_not_cached() {
        let source = Arc::new(CountingSource {
            fail: true,
            ..CountingSource::default()
        });
        let dashboard = Dashboard::new(source.clone(), TTL);

        let err = dashboard.recent_transactions().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataRetrieval);
        assert!(err.to_string().contains("recent transactions"));

        dashboard.recent_transactions().await.unwrap_err();
        assert_eq!(source.transactions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_all_clears_every_query() {
        let source = Arc::new(CountingSource::default());
        let dashboard = Dashboard::new(source.clone(), TTL);

        dashboard.recent_transactions().await.unwrap();
        dashboard.daily_stats().await.unwrap();
        dashboard.merchant_stats().await.unwrap();
        dashboard.invalidate_all().await;
        dashboard.recent_transactions().await.unwrap();
        dashboard.daily_stats().await.unwrap();
        dashboard.merchant_stats().await.unwrap();

        assert_eq!(source.transactions.load(Ordering::SeqCst), 2);
        assert_eq!(source.daily.load(Ordering::SeqCst), 2);
        assert_eq!(source.merchants.load(Ordering::SeqCst), 2);
    }
}
