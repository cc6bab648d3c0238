//! Threshold evaluation over ranked region stats: severity-ordered alert
//! list plus the inactivity list.

use mailpulse_core::ThresholdConfig;
use serde::{Deserialize, Serialize};

use crate::overview::RegionStat;

/// Regions quiet for longer than this land on the inactivity list.
pub const INACTIVITY_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Bounce,
    Unsubscribe,
    LowActivity,
    LowEngagement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub region: String,
    pub kind: AlertKind,
    /// Observed rate as a fraction, or the 30-day campaign count for
    /// `LowActivity`. Messages carry the display formatting.
    pub value: f64,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InactiveRegion {
    pub region: String,
    pub days_since_last_campaign: i64,
}

/// Evaluate every region stat against the thresholds. All comparisons are
/// strict: a value exactly at a threshold never triggers. The result is a
/// stable partition with every high-severity alert before the mediums,
/// region order preserved within each group.
pub fn evaluate_alerts(stats: &[RegionStat], thresholds: &ThresholdConfig) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for stat in stats {
        if stat.bounce_rate > thresholds.bounce_rate / 100.0 {
            alerts.push(Alert {
                region: stat.region.clone(),
                kind: AlertKind::Bounce,
                value: stat.bounce_rate,
                severity: Severity::High,
                message: format!(
                    "Bounce rate {:.1}% exceeds {:.1}%",
                    stat.bounce_rate * 100.0,
                    thresholds.bounce_rate
                ),
            });
        }

        if stat.unsub_rate > thresholds.unsub_rate / 100.0 {
            alerts.push(Alert {
                region: stat.region.clone(),
                kind: AlertKind::Unsubscribe,
                value: stat.unsub_rate,
                severity: Severity::High,
                message: format!(
                    "Unsubscribe rate {:.1}% exceeds {:.1}%",
                    stat.unsub_rate * 100.0,
                    thresholds.unsub_rate
                ),
            });
        }

        if (stat.recent_campaigns as f64) < thresholds.low_activity_campaigns {
            alerts.push(Alert {
                region: stat.region.clone(),
                kind: AlertKind::LowActivity,
                value: stat.recent_campaigns as f64,
                severity: Severity::Medium,
                message: format!(
                    "Only {} campaigns in the last 30 days (expected at least {})",
                    stat.recent_campaigns, thresholds.low_activity_campaigns
                ),
            });
        }

        let open_low = stat.avg_open_rate < thresholds.low_open_rate / 100.0;
        let click_low = stat.avg_click_rate < thresholds.low_click_rate / 100.0;
        if open_low || click_low {
            // open rate takes precedence when both trigger
            let (value, message) = if open_low {
                (
                    stat.avg_open_rate,
                    format!(
                        "Average open rate {:.1}% below {:.1}%",
                        stat.avg_open_rate * 100.0,
                        thresholds.low_open_rate
                    ),
                )
            } else {
                (
                    stat.avg_click_rate,
                    format!(
                        "Average click rate {:.1}% below {:.1}%",
                        stat.avg_click_rate * 100.0,
                        thresholds.low_click_rate
                    ),
                )
            };
            alerts.push(Alert {
                region: stat.region.clone(),
                kind: AlertKind::LowEngagement,
                value,
                severity: Severity::Medium,
                message,
            });
        }
    }

    // stable sort: highs first, relative order within groups preserved
    alerts.sort_by_key(|a| match a.severity {
        Severity::High => 0u8,
        Severity::Medium => 1,
    });
    alerts
}

/// Regions whose last campaign is older than the inactivity window,
/// quietest first.
pub fn inactive_regions(stats: &[RegionStat]) -> Vec<InactiveRegion> {
    let mut inactive: Vec<InactiveRegion> = stats
        .iter()
        .filter_map(|s| {
            s.days_since_last_campaign
                .filter(|days| *days > INACTIVITY_DAYS)
                .map(|days| InactiveRegion {
                    region: s.region.clone(),
                    days_since_last_campaign: days,
                })
        })
        .collect();
    inactive.sort_by(|a, b| b.days_since_last_campaign.cmp(&a.days_since_last_campaign));
    inactive
}
