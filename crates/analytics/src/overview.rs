//! Overview-mode aggregation: one RegionStat per region with data,
//! ranked by composite score, plus the cross-region top campaign.

use chrono::{DateTime, Utc};
use mailpulse_core::types::{Campaign, CampaignSnapshot};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::guard;

/// Trailing window for the "recent campaigns" count.
pub const RECENCY_WINDOW_DAYS: i64 = 30;

/// Derived aggregate for one region, recomputed on every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStat {
    pub region: String,
    pub campaign_count: usize,
    /// Campaigns sent in the last 30 days.
    pub recent_campaigns: usize,
    pub total_sent: u64,
    pub total_bounces: u64,
    pub total_unsubscribes: u64,
    /// Unweighted mean of per-campaign open rates.
    pub avg_open_rate: f64,
    pub avg_click_rate: f64,
    pub delivery_rate: f64,
    pub bounce_rate: f64,
    pub unsub_rate: f64,
    /// `0.4 * avg_open + 0.3 * avg_click + 0.3 * delivery`.
    pub score: f64,
    /// Highest open rate in the region, first occurrence on ties.
    pub best_campaign: Option<Campaign>,
    pub last_campaign_at: Option<DateTime<Utc>>,
    pub days_since_last_campaign: Option<i64>,
    /// Volume guard result; unreliable stats rank but never headline.
    pub reliable: bool,
}

/// The single best campaign across every region, with its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCampaign {
    pub region: String,
    pub campaign: Campaign,
}

/// Snapshot-wide counts and flattened rate averages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewTotals {
    pub total_campaigns: usize,
    pub total_sent: u64,
    /// Mean open rate over all campaigns flattened, unweighted by region.
    pub avg_open_rate: f64,
    pub avg_click_rate: f64,
}

/// Reduce every region with data into a RegionStat and rank the result
/// descending by score. Regions with no campaigns are skipped, not scored
/// as zero. Ties break on lexical region code.
pub fn aggregate_regions(snapshot: &CampaignSnapshot, now: DateTime<Utc>) -> Vec<RegionStat> {
    let mut stats: Vec<RegionStat> = Vec::new();
    for code in snapshot.region_codes() {
        let campaigns = snapshot.region(code);
        if campaigns.is_empty() {
            debug!(region = %code, "Region has no campaigns, skipping");
            continue;
        }
        stats.push(region_stat(code, campaigns, now));
    }
    stats.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.region.cmp(&b.region))
    });
    stats
}

fn region_stat(region: &str, campaigns: &[Campaign], now: DateTime<Utc>) -> RegionStat {
    let campaign_count = campaigns.len();
    let recent_campaigns = campaigns
        .iter()
        .filter(|c| c.sent_within(now, RECENCY_WINDOW_DAYS))
        .count();
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

    let best_campaign = campaigns
        .iter()
        .fold(None::<&Campaign>, |best, c| match best {
            Some(b) if c.open_rate <= b.open_rate => Some(b),
            _ => Some(c),
        })
        .cloned();

    let last_campaign_at = campaigns.iter().filter_map(|c| c.send_time).max();
    let days_since_last_campaign = last_campaign_at.map(|t| (now - t).num_days());

    RegionStat {
        region: region.to_string(),
        campaign_count,
        recent_campaigns,
        total_sent,
        total_bounces,
        total_unsubscribes,
        avg_open_rate,
        avg_click_rate,
        delivery_rate,
        bounce_rate,
        unsub_rate,
        score: 0.4 * avg_open_rate + 0.3 * avg_click_rate + 0.3 * delivery_rate,
        best_campaign,
        last_campaign_at,
        days_since_last_campaign,
        reliable: guard::region_has_reliable_volume(total_sent, campaign_count),
    }
}

/// Highest-scored stat that passes the volume guard. `stats` must already
/// be ranked.
pub fn best_region(stats: &[RegionStat]) -> Option<&RegionStat> {
    stats.iter().find(|s| s.reliable)
}

/// Lowest-scored guard-passing stat, reported only when more than one
/// region has data.
pub fn worst_region(stats: &[RegionStat]) -> Option<&RegionStat> {
    if stats.len() < 2 {
        return None;
    }
    stats.iter().rev().find(|s| s.reliable)
}

/// Linear scan for the campaign with the highest open rate anywhere;
/// first occurrence wins ties. The scan is unconditional, but the winner
/// is only surfaced when it clears the overview volume floor.
pub fn top_campaign(snapshot: &CampaignSnapshot) -> Option<TopCampaign> {
    let mut best: Option<(&str, &Campaign)> = None;
    for code in snapshot.region_codes() {
        for campaign in snapshot.region(code) {
            let replace = match best {
                None => true,
                Some((_, current)) => campaign.open_rate > current.open_rate,
            };
            if replace {
                best = Some((code, campaign));
            }
        }
    }
    best.filter(|(_, c)| guard::campaign_meets_overview_volume(c.emails_sent))
        .map(|(region, campaign)| TopCampaign {
            region: region.to_string(),
            campaign: campaign.clone(),
        })
}

/// Counts and flattened averages across every campaign in the snapshot.
pub fn overall_totals(snapshot: &CampaignSnapshot) -> OverviewTotals {
    let all: Vec<&Campaign> = snapshot
        .region_codes()
        .into_iter()
        .flat_map(|code| snapshot.region(code))
        .collect();

    OverviewTotals {
        total_campaigns: all.len(),
        total_sent: all.iter().map(|c| c.emails_sent).sum(),
        avg_open_rate: mean(all.iter().map(|c| c.open_rate)),
        avg_click_rate: mean(all.iter().map(|c| c.click_rate)),
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
