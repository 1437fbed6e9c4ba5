//! Print the current dashboard metrics once and exit

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fraudboard_core::summary::{Summary, NO_DATA};
use fraudboard_core::{ErrorKind, Settings};

/// Arguments for the snapshot command
#[derive(Parser, Debug)]
pub struct SnapshotArgs {
    /// Print the full summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Read a JSON fixture instead of querying the database
    #[arg(long, value_name = "PATH")]
    pub fixture: Option<PathBuf>,
}

pub async fn run_snapshot(args: SnapshotArgs) -> Result<()> {
    let settings = Settings::from_env().context("Invalid fraudboard settings")?;
    let dashboard = super::build_dashboard(args.fixture.as_deref(), &settings)?;

    let (daily, transactions, merchants) = tokio::join!(
        dashboard.daily_stats(),
        dashboard.recent_transactions(),
        dashboard.merchant_stats(),
    );

    let (daily, transactions, merchants) = match (daily, transactions, merchants) {
        (Ok(d), Ok(t), Ok(m)) => (d, t, m),
        (d, t, m) => {
            let err = [d.err(), t.err(), m.err()]
                .into_iter()
                .flatten()
                .next()
                .context("retrieval failed without an error")?;
            let hint = match err.kind() {
                ErrorKind::Configuration => " (set NEON_DATABASE_URL or pass --fixture)",
                _ => "",
            };
            anyhow::bail!("{err}{hint}");
        }
    };

    let summary = Summary::build(&daily, &transactions, &merchants);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for line in summary.headline.lines() {
        println!("{line}");
    }
    match summary.average_fraud_probability {
        Some(avg) => println!("Probabilité moyenne de fraude: {avg:.2}%"),
        None => println!("Probabilité moyenne de fraude: {NO_DATA}"),
    }
    if let Some(alert) = &summary.alert {
        println!("{}", alert.message());
    }
    if !merchants.is_empty() {
        println!();
        println!("Marchands les plus à risque:");
        for m in merchants.iter() {
            println!(
                "  {:<40} {:>6.2}%  ({}/{})",
                m.merchant, m.fraud_rate, m.fraud_transactions, m.total_transactions
            );
        }
    }

    Ok(())
}
