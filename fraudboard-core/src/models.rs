//! Read projections of the externally maintained fraud tables.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::Row;

/// One scored transaction from `recent_transactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub trans_date_trans_time: NaiveDateTime,
    pub merchant: String,
    pub amt: f64,
    #[serde(default)]
    pub city: Option<String>,
    pub is_fraud: bool,
    pub fraud_probability: f64,
}

/// One row of `daily_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub total_transactions: i64,
    pub fraud_count: i64,
    /// Percentage, 0–100
    pub fraud_rate: f64,
    pub total_amount: f64,
}

/// Per-merchant aggregate over the recent window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantStat {
    pub merchant: String,
    pub total_transactions: i64,
    pub fraud_transactions: i64,
    /// Percentage rounded to 2 decimals
    pub fraud_rate: f64,
}

impl MerchantStat {
    /// Build a stat from raw counts, computing the rounded rate.
    pub fn from_counts(merchant: impl Into<String>, total: i64, fraud: i64) -> Self {
        Self {
            merchant: merchant.into(),
            total_transactions: total,
            fraud_transactions: fraud,
            fraud_rate: fraud_rate_pct(fraud, total),
        }
    }

    /// Ordering used by the merchant ranking: highest fraud rate first,
    /// then highest volume.
    pub fn risk_order(a: &Self, b: &Self) -> Ordering {
        b.fraud_rate
            .total_cmp(&a.fraud_rate)
            .then_with(|| b.total_transactions.cmp(&a.total_transactions))
    }

    /// `0 <= fraud_transactions <= total_transactions` and rate in range.
    pub fn is_consistent(&self) -> bool {
        self.fraud_transactions >= 0
            && self.fraud_transactions <= self.total_transactions
            && (0.0..=100.0).contains(&self.fraud_rate)
    }
}

/// `round(fraud / total * 100, 2)`, computed in decimal like the SQL does.
/// Zero when `total` is zero.
pub fn fraud_rate_pct(fraud: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = (Decimal::from(fraud) / Decimal::from(total)) * Decimal::ONE_HUNDRED;
    // Through the decimal string so 33.33 comes back as the f64 literal 33.33.
    rate.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_string()
        .parse()
        .unwrap_or(0.0)
}

impl Transaction {
    pub(crate) fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            trans_date_trans_time: get_timestamp(row, "trans_date_trans_time")?,
            merchant: row.try_get("merchant")?,
            amt: get_f64(row, "amt")?,
            city: row.try_get("city")?,
            is_fraud: row.try_get("is_fraud")?,
            fraud_probability: get_f64(row, "fraud_probability")?,
        })
    }
}

impl DailyStat {
    pub(crate) fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            date: row.try_get("date")?,
            total_transactions: get_i64(row, "total_transactions")?,
            fraud_count: get_i64(row, "fraud_count")?,
            fraud_rate: get_f64(row, "fraud_rate")?,
            total_amount: get_f64(row, "total_amount")?,
        })
    }
}

impl MerchantStat {
    pub(crate) fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            merchant: row.try_get("merchant")?,
            total_transactions: get_i64(row, "total_transactions")?,
            fraud_transactions: get_i64(row, "fraud_transactions")?,
            fraud_rate: get_f64(row, "fraud_rate")?,
        })
    }
}

// The upstream tables are maintained elsewhere, so numeric columns may be
// float8, float4 or numeric and counts may be int4 or int8.

fn get_f64(row: &PgRow, column: &str) -> Result<f64, sqlx::Error> {
    if let Ok(v) = row.try_get::<f64, _>(column) {
        return Ok(v);
    }
    if let Ok(v) = row.try_get::<f32, _>(column) {
        return Ok(f64::from(v));
    }
    let v: Decimal = row.try_get(column)?;
    v.to_f64().ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("numeric {v} does not fit in f64").into(),
    })
}

fn get_i64(row: &PgRow, column: &str) -> Result<i64, sqlx::Error> {
    if let Ok(v) = row.try_get::<i64, _>(column) {
        return Ok(v);
    }
    if let Ok(v) = row.try_get::<i32, _>(column) {
        return Ok(i64::from(v));
    }
    let v: Decimal = row.try_get(column)?;
    v.to_i64().ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("numeric {v} is not an integer count").into(),
    })
}

fn get_timestamp(row: &PgRow, column: &str) -> Result<NaiveDateTime, sqlx::Error> {
    if let Ok(v) = row.try_get::<NaiveDateTime, _>(column) {
        return Ok(v);
    }
    let v: DateTime<Utc> = row.try_get(column)?;
    Ok(v.naive_utc())
}
