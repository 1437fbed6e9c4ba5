//! HTML rendering for the dashboard page.
//!
//! Each section renders from its own query result. A failed section shows a
//! warning in place and the rest of the page still renders. Configuration
//! errors are reported once, at the top of the page.

use std::fmt::Write;
use std::sync::Arc;

use fraudboard_core::summary::{
    average_fraud_probability, daily_trend, merchant_bars, probability_histogram, FraudAlert,
    Headline, MetricsPanel, TransactionFilter, HISTOGRAM_BINS, NO_DATA,
};
use fraudboard_core::{DailyStat, DashboardError, ErrorKind, MerchantStat, Transaction};

pub const PAGE_TITLE: &str = "Fraud Detection Dashboard";

/// Rows shown in the transactions table.
const TABLE_ROWS: usize = 100;

pub type Section<T> = Result<Arc<Vec<T>>, DashboardError>;

/// Everything one render needs.
pub struct PageInput {
    pub source: String,
    pub filter: TransactionFilter,
    pub daily: Section<DailyStat>,
    pub transactions: Section<Transaction>,
    pub merchants: Section<MerchantStat>,
}

pub fn page(input: &PageInput) -> String {
    let mut html = String::with_capacity(16 * 1024);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{PAGE_TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>🕵️ {PAGE_TITLE}</h1>\n"
    );

    if let Some(err) = configuration_error(input) {
        let _ = write!(
            html,
            "<div class=\"error\">Configuration de la base de données invalide : {}</div>\n",
            escape(&err.to_string())
        );
    }

    html.push_str(&metrics_section(&input.daily));
    html.push_str(&alert_section(&input.transactions));
    html.push_str(&filter_form(&input.filter));
    html.push_str(&trend_section(&input.daily));
    html.push_str(&merchant_section(&input.merchants));
    html.push_str(&histogram_section(&input.transactions));
    html.push_str(&transactions_section(&input.transactions, &input.filter));

    let _ = write!(
        html,
        "<footer>Source : {}</footer>\n</body>\n</html>\n",
        escape(&input.source)
    );
    html
}

fn configuration_error(input: &PageInput) -> Option<&DashboardError> {
    [
        input.daily.as_ref().err(),
        input.transactions.as_ref().err(),
        input.merchants.as_ref().err(),
    ]
    .into_iter()
    .flatten()
    .find(|e| e.kind() == ErrorKind::Configuration)
}

/// In-place warning for a failed section; empty for configuration errors,
/// which the page reports once.
fn warning(title: &str, err: &DashboardError) -> String {
    if err.kind() == ErrorKind::Configuration {
        return String::new();
    }
    format!(
        "<section><h2>{}</h2><div class=\"warning\">⚠️ {}</div></section>\n",
        escape(title),
        escape(&err.to_string())
    )
}

fn metrics_section(daily: &Section<DailyStat>) -> String {
    let stats = match daily {
        Ok(stats) => stats,
        Err(e) => return warning("Métriques", e),
    };

    let mut html = String::from("<section class=\"metrics\">\n");
    match MetricsPanel::from_daily(stats) {
        Headline::NoData => {
            let _ = write!(html, "<div class=\"info\">{NO_DATA}</div>\n");
        }
        Headline::Latest(panel) => {
            for metric in panel.metrics() {
                let _ = write!(
                    html,
                    "<div class=\"metric\"><span class=\"label\">{}</span>\
                     <span class=\"value\">{}</span></div>\n",
                    escape(metric.label),
                    escape(&metric.value)
                );
            }
        }
    }
    if let Some(avg) = average_fraud_probability(stats) {
        let _ = write!(
            html,
            "<div class=\"metric\"><span class=\"label\">Probabilité moyenne de fraude</span>\
             <span class=\"value\">{avg:.2}%</span></div>\n"
        );
    }
    html.push_str("</section>\n");
    html
}

fn alert_section(transactions: &Section<Transaction>) -> String {
    match transactions {
        Ok(rows) => match FraudAlert::detect(rows) {
            Some(alert) => format!("<div class=\"alert\">{}</div>\n", escape(&alert.message())),
            None => String::new(),
        },
        // The transactions table reports the failure.
        Err(_) => String::new(),
    }
}

fn filter_form(filter: &TransactionFilter) -> String {
    format!(
        "<form class=\"filters\" method=\"get\" action=\"/\">\n\
         <label>Montant minimum <input type=\"number\" step=\"0.01\" min=\"0\" \
         name=\"min_amount\" value=\"{:.2}\"></label>\n\
         <label><input type=\"checkbox\" name=\"fraud_only\" value=\"true\"{}> \
         Fraudes uniquement</label>\n\
         <button type=\"submit\">Filtrer</button>\n</form>\n",
        filter.min_amount,
        if filter.fraud_only { " checked" } else { "" }
    )
}

fn trend_section(daily: &Section<DailyStat>) -> String {
    let title = "Évolution du taux de fraude (7 jours)";
    let stats = match daily {
        Ok(stats) => stats,
        Err(e) => return warning(title, e),
    };

    let mut html = format!("<section><h2>{title}</h2>\n");
    let points = daily_trend(stats);
    if points.is_empty() {
        let _ = write!(html, "<div class=\"info\">{NO_DATA}</div>\n");
    } else {
        let max = points.iter().map(|p| p.fraud_rate).fold(0.0_f64, f64::max);
        html.push_str("<table class=\"chart\">\n");
        for p in &points {
            let width = if max > 0.0 { p.fraud_rate / max * 100.0 } else { 0.0 };
            let _ = write!(
                html,
                "<tr><td>{}</td><td><div class=\"bar\" style=\"width:{width:.1}%\"></div></td>\
                 <td>{:.2}%</td></tr>\n",
                p.date, p.fraud_rate
            );
        }
        html.push_str("</table>\n");
    }
    html.push_str("</section>\n");
    html
}

fn merchant_section(merchants: &Section<MerchantStat>) -> String {
    let title = "Marchands les plus à risque";
    let stats = match merchants {
        Ok(stats) => stats,
        Err(e) => return warning(title, e),
    };

    let mut html = format!("<section><h2>{title}</h2>\n");
    if stats.is_empty() {
        let _ = write!(html, "<div class=\"info\">{NO_DATA}</div>\n");
    } else {
        html.push_str("<table class=\"chart\">\n");
        for (bar, stat) in merchant_bars(stats).iter().zip(stats.iter()) {
            let _ = write!(
                html,
                "<tr><td>{}</td><td><div class=\"bar risk\" style=\"width:{:.1}%\"></div></td>\
                 <td>{:.2}% ({}/{})</td></tr>\n",
                escape(&bar.label),
                bar.width_pct,
                bar.value,
                stat.fraud_transactions,
                stat.total_transactions
            );
        }
        html.push_str("</table>\n");
    }
    html.push_str("</section>\n");
    html
}

fn histogram_section(transactions: &Section<Transaction>) -> String {
    let rows = match transactions {
        Ok(rows) if !rows.is_empty() => rows,
        _ => return String::new(),
    };

    let buckets = probability_histogram(rows, HISTOGRAM_BINS);
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    let mut html =
        String::from("<section><h2>Distribution des probabilités de fraude</h2>\n<table class=\"chart\">\n");
    for b in &buckets {
        let width = if max > 0 {
            b.count as f64 / max as f64 * 100.0
        } else {
            0.0
        };
        let _ = write!(
            html,
            "<tr><td>{:.1}–{:.1}</td><td><div class=\"bar\" style=\"width:{width:.1}%\"></div></td>\
             <td>{}</td></tr>\n",
            b.lower, b.upper, b.count
        );
    }
    html.push_str("</table>\n</section>\n");
    html
}

fn transactions_section(transactions: &Section<Transaction>, filter: &TransactionFilter) -> String {
    let title = "Transactions récentes";
    let rows = match transactions {
        Ok(rows) => rows,
        Err(e) => return warning(title, e),
    };

    let shown = filter.apply(rows);
    let mut html = format!(
        "<section><h2>{title}</h2>\n<p>{} sur {} transactions</p>\n",
        shown.len(),
        rows.len()
    );
    if shown.is_empty() {
        html.push_str("<div class=\"info\">Aucune transaction ne correspond aux filtres</div>\n");
    } else {
        html.push_str(
            "<table class=\"transactions\">\n<tr><th>Date</th><th>Marchand</th><th>Montant</th>\
             <th>Ville</th><th>Fraude</th><th>Probabilité</th></tr>\n",
        );
        for tx in shown.iter().take(TABLE_ROWS) {
            let _ = write!(
                html,
                "<tr{}><td>{}</td><td>{}</td><td>{:.2}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>\n",
                if tx.is_fraud { " class=\"fraud\"" } else { "" },
                tx.trans_date_trans_time.format("%Y-%m-%d %H:%M:%S"),
                escape(&tx.merchant),
                tx.amt,
                escape(tx.city.as_deref().unwrap_or("")),
                if tx.is_fraud { "oui" } else { "non" },
                tx.fraud_probability
            );
        }
        html.push_str("</table>\n");
    }
    html.push_str("</section>\n");
    html
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;margin:2rem;max-width:1200px}\
.metrics{display:flex;gap:2rem;flex-wrap:wrap}\
.metric{display:flex;flex-direction:column}.metric .label{color:#666;font-size:.9rem}\
.metric .value{font-size:1.8rem;font-weight:600}\
.alert,.error{background:#fdecea;color:#b71c1c;padding:1rem;margin:1rem 0;border-radius:4px}\
.warning{background:#fff8e1;color:#8d6e00;padding:1rem;border-radius:4px}\
.info{background:#e3f2fd;padding:1rem;border-radius:4px}\
.chart td:nth-child(2){width:60%}.bar{background:#1f77b4;height:1rem}.bar.risk{background:#d62728}\
table{border-collapse:collapse}td,th{padding:.25rem .5rem;text-align:left}\
tr.fraud{background:#fdecea}footer{margin-top:2rem;color:#999;font-size:.8rem}";
