use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use etf_explorer::cache::EtfCache;
use etf_explorer::export;
use etf_explorer::models::{Config, EnrichedRecord};
use etf_explorer::pipeline::Pipeline;

/// Fetch the US ETF screener table, normalize and enrich it, and
/// optionally export it.
#[derive(Parser)]
#[command(name = "etf-explorer", version)]
struct Args {
    /// Write the full table as CSV to this path (a timestamped name is
    /// generated when the flag is given without a value)
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    csv: Option<PathBuf>,

    /// Write the full table as an Excel workbook to this path
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    xlsx: Option<PathBuf>,

    /// Print at most this many rows to stdout
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("etf_explorer=info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let pipeline = Pipeline::from_config(&config)?;
    let cache = EtfCache::new(Duration::from_secs(config.cache_ttl_secs));

    let records = cache.get_or_refresh(&pipeline).await;
    if records.is_empty() {
        // Recoverable state, not a failure: the dashboard shows the same.
        println!("No data available.");
        return Ok(());
    }

    print_summary(&records, args.limit);

    if let Some(path) = args.csv {
        let path = resolve_path(path, "csv");
        std::fs::write(&path, export::to_csv(&records)?)?;
        info!("wrote {} rows to {}", records.len(), path.display());
    }
    if let Some(path) = args.xlsx {
        let path = resolve_path(path, "xlsx");
        std::fs::write(&path, export::to_xlsx(&records)?)?;
        info!("wrote {} rows to {}", records.len(), path.display());
    }

    Ok(())
}

fn print_summary(records: &[EnrichedRecord], limit: usize) {
    println!("{} ETFs loaded", records.len());
    for record in records.iter().take(limit) {
        let r = &record.record;
        println!(
            "{:<8} {:<12} {:>14} {:>10} {:>8}  {}",
            r.ticker,
            truncate(&r.issuer, 12),
            r.aum_display(),
            r.price_display(),
            r.expense_ratio_display(),
            record.actively_managed_display(),
        );
    }
    if records.len() > limit {
        println!("... and {} more", records.len() - limit);
    }
}

fn resolve_path(path: PathBuf, extension: &str) -> PathBuf {
    if path.as_os_str().is_empty() {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        PathBuf::from(format!("etf_data_{timestamp}.{extension}"))
    } else {
        path
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let cut: String = value.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
