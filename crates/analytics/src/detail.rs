//! Single-region aggregation: summary statistics, top performer, and the
//! needs-review campaign selection.

use chrono::{DateTime, Utc};
use mailpulse_core::{Campaign, ThresholdConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::guard;

/// Fixed issue checks, independent of the configurable thresholds.
const ISSUE_BOUNCE_RATE: f64 = 0.05;
const ISSUE_UNSUB_RATE: f64 = 0.01;

/// Outcome of the needs-review selection. `InsufficientData` (no campaign
/// with enough volume to judge) and `AllClear` (every judged campaign
/// passed) are distinct terminal states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    InsufficientData,
    AllClear,
    NeedsReview(Campaign),
}

/// Summary of one region's campaigns for the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDetail {
    pub campaign_count: usize,
    pub total_sent: u64,
    pub total_bounces: u64,
    pub total_unsubscribes: u64,
    pub avg_open_rate: f64,
    pub avg_click_rate: f64,
    pub delivery_rate: f64,
    pub bounce_rate: f64,
    pub unsub_rate: f64,
    pub last_campaign_at: Option<DateTime<Utc>>,
    pub days_since_last_campaign: Option<i64>,
    /// Highest open rate among campaigns with reliable volume.
    pub top_performer: Option<Campaign>,
    pub review: ReviewOutcome,
    pub issues: Vec<String>,
}

/// Reduce one region's campaigns into a detail summary. Returns `None`
/// for an empty array; the caller renders that as "no data".
pub fn aggregate_region_detail(
    campaigns: &[Campaign],
    thresholds: &ThresholdConfig,
    now: DateTime<Utc>,
) -> Option<RegionDetail> {
    if campaigns.is_empty() {
        debug!("No campaigns for region detail");
        return None;
    }

    let total_sent: u64 = campaigns.iter().map(|c| c.emails_sent).sum();
    let total_bounces: u64 = campaigns.iter().map(|c| c.bounces).sum();
    let total_unsubscribes: u64 = campaigns.iter().map(|c| c.unsubscribed).sum();

    let avg_open_rate = mean(campaigns.iter().map(|c| c.open_rate));
    let avg_click_rate = mean(campaigns.iter().map(|c| c.click_rate));

    let delivery_rate = if total_sent > 0 {
        total_sent.saturating_sub(total_bounces) as f64 / total_sent as f64
    } else {
        0.0
    };
    let bounce_rate = if total_sent > 0 {
        total_bounces as f64 / total_sent as f64
    } else {
        0.0
    };
    let unsub_rate = if total_sent > 0 {
        total_unsubscribes as f64 / total_sent as f64
    } else {
        0.0
    };

    let last_campaign_at = campaigns.iter().filter_map(|c| c.send_time).max();
    let days_since_last_campaign = last_campaign_at.map(|t| (now - t).num_days());

    // Campaign-to-campaign comparisons only consider reliable volume.
    let eligible: Vec<&Campaign> = campaigns
        .iter()
        .filter(|c| guard::campaign_has_reliable_volume(c.emails_sent))
        .collect();

    let top_performer = eligible
        .iter()
        .fold(None::<&&Campaign>, |best, c| match best {
            Some(b) if c.open_rate <= b.open_rate => Some(b),
            _ => Some(c),
        })
        .map(|c| (*c).clone());

    let review = select_needs_review(&eligible, thresholds);

    let mut issues = Vec::new();
    if bounce_rate > ISSUE_BOUNCE_RATE {
        issues.push(format!(
            "High bounce rate: {:.1}% (above {:.0}%)",
            bounce_rate * 100.0,
            ISSUE_BOUNCE_RATE * 100.0
        ));
    }
    if unsub_rate > ISSUE_UNSUB_RATE {
        issues.push(format!(
            "High unsubscribe rate: {:.1}% (above {:.0}%)",
            unsub_rate * 100.0,
            ISSUE_UNSUB_RATE * 100.0
        ));
    }

    Some(RegionDetail {
        campaign_count: campaigns.len(),
        total_sent,
        total_bounces,
        total_unsubscribes,
        avg_open_rate,
        avg_click_rate,
        delivery_rate,
        bounce_rate,
        unsub_rate,
        last_campaign_at,
        days_since_last_campaign,
        top_performer,
        review,
        issues,
    })
}

/// Among eligible campaigns, find those under any review threshold and
/// pick the one with the lowest composite score (worst first).
fn select_needs_review(eligible: &[&Campaign], thresholds: &ThresholdConfig) -> ReviewOutcome {
    if eligible.is_empty() {
        return ReviewOutcome::InsufficientData;
    }

    let open_floor = thresholds.review_open_rate / 100.0;
    let click_floor = thresholds.review_click_rate / 100.0;
    let delivery_floor = thresholds.review_delivery_rate / 100.0;

    let worst = eligible
        .iter()
        .filter(|c| {
            c.open_rate < open_floor
                || c.click_rate < click_floor
                || c.delivery_rate() < delivery_floor
        })
        .fold(None::<&&Campaign>, |worst, c| match worst {
            Some(w) if c.composite_score() >= w.composite_score() => Some(w),
            _ => Some(c),
        });

    match worst {
        Some(c) => ReviewOutcome::NeedsReview((*c).clone()),
        None => ReviewOutcome::AllClear,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}
