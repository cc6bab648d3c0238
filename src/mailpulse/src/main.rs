//! MailPulse, a multi-region email campaign analytics engine.
//!
//! Loads a campaign snapshot, runs one aggregation pass, and prints the
//! metrics result as JSON on stdout.

use chrono::Utc;
use clap::Parser;
use mailpulse_analytics::{MetricsEngine, ThresholdStore};
use mailpulse_core::types::{Campaign, CampaignSnapshot, ViewMode};
use mailpulse_core::AppConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "mailpulse")]
#[command(about = "Multi-region email campaign analytics engine")]
#[command(version)]
struct Cli {
    /// Path to a snapshot JSON file: a region-to-campaigns map, a full
    /// snapshot object, or (with --region) a bare campaign array
    #[arg(long, env = "MAILPULSE__SNAPSHOT")]
    snapshot: PathBuf,

    /// Aggregate a single region instead of the overview
    #[arg(long, env = "MAILPULSE__REGION")]
    region: Option<String>,

    /// Only consider campaigns sent in the last N days
    #[arg(long)]
    days: Option<i64>,

    /// Pretty-print the JSON result
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing; the result goes to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailpulse=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let store = Arc::new(ThresholdStore::new(config.thresholds.clone()));
    let engine = MetricsEngine::new(store, &config.memo);

    let raw = std::fs::read_to_string(&cli.snapshot)?;
    let mut snapshot = load_snapshot(&raw, cli.region.as_deref())?;

    let now = Utc::now();
    if let Some(days) = cli.days {
        for campaigns in snapshot.regions.values_mut() {
            campaigns.retain(|c| c.sent_within(now, days));
        }
    }

    info!(
        regions = snapshot.regions.len(),
        campaigns = snapshot.total_campaigns(),
        mode = cli.region.as_deref().unwrap_or("overview"),
        "Snapshot loaded"
    );

    let mode = match cli.region {
        Some(code) => ViewMode::Region(code),
        None => ViewMode::Overview,
    };
    let result = engine.compute(&snapshot, &mode, now);

    let output = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");

    Ok(())
}

/// Parse the snapshot file. A bare campaign array is accepted when a
/// region was named on the command line.
fn load_snapshot(raw: &str, region: Option<&str>) -> anyhow::Result<CampaignSnapshot> {
    if let Some(code) = region {
        if let Ok(campaigns) = serde_json::from_str::<Vec<Campaign>>(raw) {
            let regions = std::iter::once((code.to_string(), campaigns)).collect();
            return Ok(CampaignSnapshot::new(0, regions));
        }
    }
    Ok(CampaignSnapshot::from_json(raw)?)
}
