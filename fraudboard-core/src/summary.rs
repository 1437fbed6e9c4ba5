//! Pure derivations rendered by the dashboard.
//!
//! Nothing here performs I/O: every function takes rows the query layer
//! already returned.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DailyStat, MerchantStat, Transaction};

/// Shown wherever a metric has no underlying row.
pub const NO_DATA: &str = "No data available";

/// Headline metrics for the most recent day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsPanel {
    pub date: NaiveDate,
    pub total_transactions: i64,
    pub fraud_count: i64,
    pub fraud_rate: f64,
    pub total_amount: f64,
}

/// A labelled, already formatted metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "panel", rename_all = "snake_case")]
pub enum Headline {
    /// `daily_stats` returned no rows
    NoData,
    Latest(MetricsPanel),
}

impl MetricsPanel {
    /// Panel for the first (most recent) row, or `NoData` when there is none.
    pub fn from_daily(stats: &[DailyStat]) -> Headline {
        match stats.first() {
            None => Headline::NoData,
            Some(day) => Headline::Latest(Self {
                date: day.date,
                total_transactions: day.total_transactions,
                fraud_count: day.fraud_count,
                fraud_rate: day.fraud_rate,
                total_amount: day.total_amount,
            }),
        }
    }

    pub fn metrics(&self) -> [Metric; 4] {
        [
            Metric {
                label: "Transactions (24h)",
                value: self.total_transactions.to_string(),
            },
            Metric {
                label: "Fraudes détectées",
                value: self.fraud_count.to_string(),
            },
            Metric {
                label: "Taux de fraude",
                value: format!("{:.2}%", self.fraud_rate),
            },
            Metric {
                label: "Montant total",
                value: format_currency(self.total_amount),
            },
        ]
    }
}

impl Headline {
    /// One line per metric, or a single "no data" line.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::NoData => vec![NO_DATA.to_string()],
            Self::Latest(panel) => panel.metrics().iter().map(Metric::to_string).collect(),
        }
    }
}

/// Format as US dollars with thousands separators: `$54,321.00`.
/// Non-finite amounts render as [`NO_DATA`].
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return NO_DATA.to_string();
    }
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

/// Mean of the daily `fraud_rate` column over the retrieved days.
///
/// A proxy metric: it averages daily percentages, not the per-transaction
/// `fraud_probability` scores.
pub fn average_fraud_probability(stats: &[DailyStat]) -> Option<f64> {
    if stats.is_empty() {
        return None;
    }
    let sum: f64 = stats.iter().map(|d| d.fraud_rate).sum();
    Some(sum / stats.len() as f64)
}

/// Client-side filter over already fetched transactions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    #[serde(default)]
    pub min_amount: f64,
    #[serde(default)]
    pub fraud_only: bool,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        tx.amt >= self.min_amount && (!self.fraud_only || tx.is_fraud)
    }

    pub fn apply<'a>(&self, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        transactions.iter().filter(|tx| self.matches(tx)).collect()
    }
}

/// Banner shown when the recent window contains fraud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FraudAlert {
    pub count: usize,
}

impl FraudAlert {
    pub fn detect(transactions: &[Transaction]) -> Option<Self> {
        let count = transactions.iter().filter(|tx| tx.is_fraud).count();
        (count > 0).then_some(Self { count })
    }

    pub fn message(&self) -> String {
        if self.count == 1 {
            "🚨 1 transaction frauduleuse détectée dans les dernières 24h".to_string()
        } else {
            format!(
                "🚨 {} transactions frauduleuses détectées dans les dernières 24h",
                self.count
            )
        }
    }
}

/// One point of the daily fraud-rate line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub fraud_rate: f64,
    pub total_transactions: i64,
}

/// Daily series in chronological order (the query returns newest first).
pub fn daily_trend(stats: &[DailyStat]) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = stats
        .iter()
        .map(|d| TrendPoint {
            date: d.date,
            fraud_rate: d.fraud_rate,
            total_transactions: d.total_transactions,
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

/// A horizontal bar, `width_pct` relative to the largest value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub width_pct: f64,
}

pub fn merchant_bars(stats: &[MerchantStat]) -> Vec<Bar> {
    let max = stats.iter().map(|s| s.fraud_rate).fold(0.0_f64, f64::max);
    stats
        .iter()
        .map(|s| Bar {
            label: s.merchant.clone(),
            value: s.fraud_rate,
            width_pct: if max > 0.0 { s.fraud_rate / max * 100.0 } else { 0.0 },
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

pub const HISTOGRAM_BINS: usize = 10;

/// Equal-width histogram of `fraud_probability` over [0, 1].
/// Scores outside the range are clamped; 1.0 lands in the last bin.
pub fn probability_histogram(transactions: &[Transaction], bins: usize) -> Vec<Bucket> {
    let bins = bins.max(1);
    let width = 1.0 / bins as f64;
    let mut buckets: Vec<Bucket> = (0..bins)
        .map(|i| Bucket {
            lower: i as f64 * width,
            upper: (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for tx in transactions {
        let p = tx.fraud_probability;
        if p.is_nan() {
            continue;
        }
        let idx = ((p.clamp(0.0, 1.0) / width) as usize).min(bins - 1);
        buckets[idx].count += 1;
    }
    buckets
}

/// Everything the summary view needs, assembled from the three queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub headline: Headline,
    pub average_fraud_probability: Option<f64>,
    pub alert: Option<FraudAlert>,
    pub daily_trend: Vec<TrendPoint>,
    pub merchant_bars: Vec<Bar>,
    pub probability_histogram: Vec<Bucket>,
}

impl Summary {
    pub fn build(
        daily: &[DailyStat],
        transactions: &[Transaction],
        merchants: &[MerchantStat],
    ) -> Self {
        Self {
            headline: MetricsPanel::from_daily(daily),
            average_fraud_probability: average_fraud_probability(daily),
            alert: FraudAlert::detect(transactions),
            daily_trend: daily_trend(daily),
            merchant_bars: merchant_bars(merchants),
            probability_histogram: probability_histogram(transactions, HISTOGRAM_BINS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn day(d: u32, total: i64, fraud: i64, rate: f64, amount: f64) -> DailyStat {
        DailyStat {
            date: NaiveDate::from_ymd_opt(2024, 3, d).unwrap(),
            total_transactions: total,
            fraud_count: fraud,
            fraud_rate: rate,
            total_amount: amount,
        }
    }

    fn tx(amt: f64, is_fraud: bool, p: f64) -> Transaction {
        Transaction {
            trans_date_trans_time: NaiveDateTime::default(),
            merchant: "m".into(),
            amt,
            city: Some("Paris".into()),
            is_fraud,
            fraud_probability: p,
        }
    }

    #[test]
    fn headline_for_latest_day() {
        let stats = vec![
            day(7, 1000, 12, 1.20, 54321.00),
            day(6, 900, 9, 1.00, 40000.00),
            day(5, 800, 8, 1.00, 30000.00),
            day(4, 700, 7, 1.00, 20000.00),
            day(3, 600, 6, 1.00, 10000.00),
            day(2, 500, 5, 1.00, 9000.00),
            day(1, 400, 4, 1.00, 8000.00),
        ];

        let headline = MetricsPanel::from_daily(&stats);
        assert_eq!(
            headline.lines(),
            vec![
                "Transactions (24h): 1000",
                "Fraudes détectées: 12",
                "Taux de fraude: 1.20%",
                "Montant total: $54,321.00",
            ]
        );
    }

    #[test]
    fn empty_daily_stats_reports_no_data() {
        let headline = MetricsPanel::from_daily(&[]);
        assert_eq!(headline, Headline::NoData);
        assert_eq!(headline.lines(), vec![NO_DATA.to_string()]);
        assert_eq!(average_fraud_probability(&[]), None);
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.5), "$999.50");
        assert_eq!(format_currency(1000.0), "$1,000.00");
        assert_eq!(format_currency(54321.0), "$54,321.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-2500.0), "-$2,500.00");
        assert_eq!(format_currency(-0.001), "$0.00");
    }

    #[test]
    fn non_finite_amounts_have_no_currency_value() {
        assert_eq!(format_currency(f64::NAN), NO_DATA);
        assert_eq!(format_currency(f64::INFINITY), NO_DATA);
        assert_eq!(format_currency(f64::NEG_INFINITY), NO_DATA);
    }

    #[test]
    fn average_is_mean_of_daily_rates() {
        let stats = vec![day(2, 10, 1, 1.5, 0.0), day(1, 10, 0, 0.5, 0.0)];
        assert_eq!(average_fraud_probability(&stats), Some(1.0));
    }

    #[test]
    fn filter_by_amount_and_fraud() {
        let txs = vec![tx(5.0, false, 0.1), tx(50.0, true, 0.9), tx(500.0, false, 0.2)];

        assert_eq!(TransactionFilter::default().apply(&txs).len(), 3);

        let big = TransactionFilter {
            min_amount: 50.0,
            fraud_only: false,
        };
        assert_eq!(big.apply(&txs).len(), 2);

        let fraud = TransactionFilter {
            min_amount: 0.0,
            fraud_only: true,
        };
        let hits = fraud.apply(&txs);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].is_fraud);

        let none = TransactionFilter {
            min_amount: 100.0,
            fraud_only: true,
        };
        assert!(none.apply(&txs).is_empty());
    }

    #[test]
    fn alert_shown_only_with_fraud() {
        let clean = vec![tx(5.0, false, 0.1), tx(6.0, false, 0.2)];
        assert_eq!(FraudAlert::detect(&clean), None);

        let dirty = vec![tx(5.0, false, 0.1), tx(6.0, true, 0.95)];
        let alert = FraudAlert::detect(&dirty).expect("alert expected");
        assert_eq!(alert.count, 1);
        assert!(alert.message().contains("1 transaction frauduleuse"));

        assert_eq!(FraudAlert::detect(&[]), None);
    }

    #[test]
    fn trend_is_chronological() {
        let stats = vec![day(3, 1, 0, 0.0, 0.0), day(1, 1, 0, 0.0, 0.0), day(2, 1, 0, 0.0, 0.0)];
        let days: Vec<u32> = daily_trend(&stats)
            .iter()
            .map(|p| chrono::Datelike::day(&p.date))
            .collect();
        assert_eq!(days, [1, 2, 3]);
    }

    #[test]
    fn bars_scale_to_the_largest_rate() {
        let bars = merchant_bars(&[
            MerchantStat::from_counts("a", 2, 1),
            MerchantStat::from_counts("b", 4, 1),
            MerchantStat::from_counts("c", 4, 0),
        ]);
        assert_eq!(bars[0].width_pct, 100.0);
        assert_eq!(bars[1].width_pct, 50.0);
        assert_eq!(bars[2].width_pct, 0.0);

        let flat = merchant_bars(&[MerchantStat::from_counts("c", 4, 0)]);
        assert_eq!(flat[0].width_pct, 0.0);
    }

    #[test]
    fn histogram_edges() {
        let txs = vec![
            tx(1.0, false, 0.0),
            tx(1.0, false, 0.05),
            tx(1.0, false, 0.55),
            tx(1.0, true, 1.0),
            tx(1.0, true, 1.7),
            tx(1.0, false, -0.2),
            tx(1.0, false, f64::NAN),
        ];
        let buckets = probability_histogram(&txs, HISTOGRAM_BINS);

        assert_eq!(buckets.len(), 10);
        assert_eq!(buckets[0].count, 3);
        assert_eq!(buckets[5].count, 1);
        assert_eq!(buckets[9].count, 2);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 6);
    }

    #[test]
    fn summary_serializes_no_data() {
        let summary = Summary::build(&[], &[], &[]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["headline"]["status"], "no_data");
        assert!(json["alert"].is_null());
        assert!(json["average_fraud_probability"].is_null());
    }
}
