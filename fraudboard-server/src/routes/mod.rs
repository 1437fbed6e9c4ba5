//! Route handlers organized by surface

pub mod api;
pub mod health;
pub mod page;

use fraudboard_core::summary::TransactionFilter;
use serde::Deserialize;

/// `?min_amount=..&fraud_only=..` as sent by the filter form.
///
/// Both fields arrive as raw strings: a cleared number input sends an empty
/// value, and an unchecked checkbox is absent. `fraud_only` accepts `true`,
/// `on` or `1`; anything unparseable falls back to "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub min_amount: Option<String>,
    pub fraud_only: Option<String>,
}

impl From<FilterParams> for TransactionFilter {
    fn from(params: FilterParams) -> Self {
        let fraud_only = params
            .fraud_only
            .as_deref()
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "on" | "1"))
            .unwrap_or(false);
        Self {
            min_amount: params
                .min_amount
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
                .max(0.0),
            fraud_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkbox_values() {
        for (raw, expected) in [("true", true), ("on", true), ("1", true), ("false", false), ("", false)] {
            let filter = TransactionFilter::from(FilterParams {
                min_amount: None,
                fraud_only: Some(raw.to_string()),
            });
            assert_eq!(filter.fraud_only, expected, "{raw:?}");
        }
        assert!(!TransactionFilter::from(FilterParams::default()).fraud_only);
    }

    #[test]
    fn amount_parsing() {
        for (raw, expected) in [("25.5", 25.5), (" 10 ", 10.0), ("", 0.0), ("-5", 0.0), ("NaN", 0.0), ("abc", 0.0)] {
            let filter = TransactionFilter::from(FilterParams {
                min_amount: Some(raw.to_string()),
                fraud_only: None,
            });
            assert_eq!(filter.min_amount, expected, "{raw:?}");
        }
    }
}
