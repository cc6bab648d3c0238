//! Memoized facade over the aggregators. One `compute` call per input
//! change; identical inputs resolve from the memo cache.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mailpulse_core::config::MemoConfig;
use mailpulse_core::types::{CampaignSnapshot, ViewMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::alerts::{self, Alert, InactiveRegion};
use crate::detail::{self, RegionDetail};
use crate::overview::{self, RegionStat, TopCampaign};
use crate::thresholds::ThresholdStore;

/// Everything the overview dashboard renders from one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewMetrics {
    /// Ranked descending by composite score.
    pub regions: Vec<RegionStat>,
    pub best_region: Option<String>,
    pub worst_region: Option<String>,
    pub top_campaign: Option<TopCampaign>,
    pub total_campaigns: usize,
    pub total_sent: u64,
    pub avg_open_rate: f64,
    pub avg_click_rate: f64,
    pub alerts: Vec<Alert>,
    pub inactive_regions: Vec<InactiveRegion>,
}

/// Result of one aggregation pass, shaped by the requested view mode.
/// `Detail(None)` is the single-region "no data" state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsResult {
    Overview(OverviewMetrics),
    Detail(Option<RegionDetail>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    data_version: u64,
    threshold_version: u64,
    mode: ViewMode,
}

/// The engine: owns the threshold store handle and a bounded memo cache
/// keyed on `(data version, threshold version, view mode)`. Threshold
/// values are read fresh on every uncached pass.
pub struct MetricsEngine {
    thresholds: Arc<ThresholdStore>,
    memo: DashMap<MemoKey, MetricsResult>,
    max_entries: usize,
}

impl MetricsEngine {
    pub fn new(thresholds: Arc<ThresholdStore>, memo: &MemoConfig) -> Self {
        Self {
            thresholds,
            memo: DashMap::with_capacity(memo.max_entries),
            max_entries: memo.max_entries,
        }
    }

    pub fn thresholds(&self) -> &ThresholdStore {
        &self.thresholds
    }

    /// Run (or replay) one aggregation pass for the given view mode.
    pub fn compute(
        &self,
        snapshot: &CampaignSnapshot,
        mode: &ViewMode,
        now: DateTime<Utc>,
    ) -> MetricsResult {
        let key = MemoKey {
            data_version: snapshot.version,
            threshold_version: self.thresholds.version(),
            mode: mode.clone(),
        };

        if let Some(cached) = self.memo.get(&key) {
            metrics::counter!("mailpulse.engine.memo_hits").increment(1);
            return cached.clone();
        }
        metrics::counter!("mailpulse.engine.memo_misses").increment(1);

        let result = match mode {
            ViewMode::Overview => MetricsResult::Overview(self.overview(snapshot, now)),
            ViewMode::Region(code) => {
                MetricsResult::Detail(self.region_detail(snapshot, code, now))
            }
        };

        // bounded cache: skip the insert when full rather than evict
        if self.memo.len() < self.max_entries || self.memo.contains_key(&key) {
            self.memo.insert(key, result.clone());
        }
        result
    }

    /// Overview pass: ranked stats, best/worst, top campaign, totals,
    /// alerts, inactivity.
    pub fn overview(&self, snapshot: &CampaignSnapshot, now: DateTime<Utc>) -> OverviewMetrics {
        let thresholds = self.thresholds.snapshot();
        let stats = overview::aggregate_regions(snapshot, now);
        let totals = overview::overall_totals(snapshot);
        let alerts = alerts::evaluate_alerts(&stats, &thresholds);
        let inactive = alerts::inactive_regions(&stats);

        debug!(
            regions = stats.len(),
            campaigns = totals.total_campaigns,
            alerts = alerts.len(),
            "Overview pass complete"
        );

        OverviewMetrics {
            best_region: overview::best_region(&stats).map(|s| s.region.clone()),
            worst_region: overview::worst_region(&stats).map(|s| s.region.clone()),
            top_campaign: overview::top_campaign(snapshot),
            total_campaigns: totals.total_campaigns,
            total_sent: totals.total_sent,
            avg_open_rate: totals.avg_open_rate,
            avg_click_rate: totals.avg_click_rate,
            alerts,
            inactive_regions: inactive,
            regions: stats,
        }
    }

    /// Single-region pass; `None` when the region has no campaigns.
    pub fn region_detail(
        &self,
        snapshot: &CampaignSnapshot,
        region: &str,
        now: DateTime<Utc>,
    ) -> Option<RegionDetail> {
        let thresholds = self.thresholds.snapshot();
        detail::aggregate_region_detail(snapshot.region(region), &thresholds, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailpulse_core::types::Campaign;
    use mailpulse_core::ThresholdConfig;
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        "2026-08-01T00:00:00Z".parse().unwrap()
    }

    fn engine() -> MetricsEngine {
        MetricsEngine::new(
            Arc::new(ThresholdStore::with_defaults()),
            &MemoConfig::default(),
        )
    }

    fn tw_us_snapshot() -> CampaignSnapshot {
        let tw = Campaign {
            id: "tw-1".into(),
            emails_sent: 200,
            bounces: 10,
            opens: 60,
            clicks: 10,
            open_rate: 0.3,
            click_rate: 0.05,
            send_time: Some(now() - chrono::Duration::days(2)),
            ..Default::default()
        };
        let mut regions = HashMap::new();
        regions.insert("TW".to_string(), vec![tw]);
        regions.insert("US".to_string(), vec![]);
        CampaignSnapshot::new(7, regions)
    }

    #[test]
    fn test_overview_end_to_end_tw_only() {
        let result = engine().compute(&tw_us_snapshot(), &ViewMode::Overview, now());
        let MetricsResult::Overview(overview) = result else {
            panic!("expected overview result");
        };
        assert_eq!(overview.regions.len(), 1);
        assert_eq!(overview.regions[0].region, "TW");
        assert_eq!(overview.best_region.as_deref(), Some("TW"));
        assert!(overview.worst_region.is_none());
        assert_eq!(overview.total_campaigns, 1);
        assert_eq!(overview.total_sent, 200);
        assert_eq!(overview.top_campaign.as_ref().unwrap().region, "TW");
    }

    #[test]
    fn test_detail_mode_none_for_empty_region() {
        let result = engine().compute(
            &tw_us_snapshot(),
            &ViewMode::Region("US".into()),
            now(),
        );
        assert_eq!(result, MetricsResult::Detail(None));
    }

    #[test]
    fn test_identical_inputs_give_deep_equal_results() {
        let eng = engine();
        let snap = tw_us_snapshot();
        let a = eng.compute(&snap, &ViewMode::Overview, now());
        let b = eng.compute(&snap, &ViewMode::Overview, now());
        assert_eq!(a, b);
    }

    #[test]
    fn test_threshold_mutation_invalidates_memo() {
        let store = Arc::new(ThresholdStore::with_defaults());
        let eng = MetricsEngine::new(store.clone(), &MemoConfig::default());

        let quiet = Campaign {
            id: "q".into(),
            emails_sent: 100,
            bounces: 5,
            open_rate: 0.3,
            click_rate: 0.05,
            send_time: Some(now() - chrono::Duration::days(2)),
            ..Default::default()
        };
        let mut second = quiet.clone();
        second.id = "q2".into();
        let mut regions = HashMap::new();
        regions.insert("TW".to_string(), vec![quiet, second]);
        let snap = CampaignSnapshot::new(3, regions);

        let MetricsResult::Overview(overview) =
            eng.compute(&snap, &ViewMode::Overview, now())
        else {
            panic!("expected overview result");
        };
        // 5% bounce rate sits exactly on the default threshold: quiet
        assert!(overview.alerts.is_empty());

        store.set("bounce_rate", 2.0);
        let MetricsResult::Overview(overview) =
            eng.compute(&snap, &ViewMode::Overview, now())
        else {
            panic!("expected overview result");
        };
        assert_eq!(overview.alerts.len(), 1);
        assert_eq!(overview.alerts[0].kind, crate::alerts::AlertKind::Bounce);
    }

    #[test]
    fn test_memo_capacity_skips_insert_when_full() {
        let store = Arc::new(ThresholdStore::with_defaults());
        let eng = MetricsEngine::new(store, &MemoConfig { max_entries: 1 });
        let snap_a = tw_us_snapshot();
        let mut snap_b = tw_us_snapshot();
        snap_b.version = 8;

        eng.compute(&snap_a, &ViewMode::Overview, now());
        // second key cannot enter the full cache, but still computes
        let result = eng.compute(&snap_b, &ViewMode::Overview, now());
        assert!(matches!(result, MetricsResult::Overview(_)));
        assert_eq!(eng.memo.len(), 1);
    }

    #[test]
    fn test_detail_reads_fresh_thresholds() {
        let store = Arc::new(ThresholdStore::with_defaults());
        let eng = MetricsEngine::new(store.clone(), &MemoConfig::default());
        let snap = tw_us_snapshot();

        let MetricsResult::Detail(Some(detail)) =
            eng.compute(&snap, &ViewMode::Region("TW".into()), now())
        else {
            panic!("expected detail result");
        };
        // open rate 0.3 clears the default 20% review floor
        assert_eq!(detail.review, crate::detail::ReviewOutcome::AllClear);

        store.set("review_open_rate", 40.0);
        let MetricsResult::Detail(Some(detail)) =
            eng.compute(&snap, &ViewMode::Region("TW".into()), now())
        else {
            panic!("expected detail result");
        };
        assert!(matches!(
            detail.review,
            crate::detail::ReviewOutcome::NeedsReview(_)
        ));
    }

    #[test]
    fn test_threshold_defaults_match_documented_values() {
        let t = ThresholdConfig::default();
        assert_eq!(
            (t.bounce_rate, t.unsub_rate, t.low_activity_campaigns),
            (5.0, 1.0, 2.0)
        );
    }
}
