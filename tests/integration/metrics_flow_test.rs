//! Integration test for the full snapshot-to-metrics flow: overview
//! aggregation, alerting, and the single-region detail view.

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use mailpulse_analytics::{
        AlertKind, MetricsEngine, MetricsResult, ReviewOutcome, Severity, ThresholdStore,
    };
    use mailpulse_core::config::MemoConfig;
    use mailpulse_core::types::{Campaign, CampaignSnapshot, ViewMode};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        "2026-08-01T00:00:00Z".parse().unwrap()
    }

    /// Construct a sample campaign with sane engagement numbers.
    fn sample_campaign(id: &str, sent: u64, open_rate: f64, days_ago: i64) -> Campaign {
        Campaign {
            id: id.to_string(),
            title: format!("Campaign {id}"),
            subject_line: format!("Subject {id}"),
            send_time: Some(now() - Duration::days(days_ago)),
            emails_sent: sent,
            opens: (sent as f64 * open_rate) as u64,
            clicks: sent / 20,
            bounces: sent / 100,
            unsubscribed: sent / 500,
            open_rate,
            click_rate: 0.04,
            ..Default::default()
        }
    }

    fn sample_snapshot() -> CampaignSnapshot {
        let mut regions = HashMap::new();
        regions.insert(
            "US".to_string(),
            vec![
                sample_campaign("us-1", 2000, 0.32, 3),
                sample_campaign("us-2", 1500, 0.28, 10),
                sample_campaign("us-3", 1800, 0.35, 20),
            ],
        );
        regions.insert(
            "EU".to_string(),
            vec![
                sample_campaign("eu-1", 900, 0.22, 40),
                sample_campaign("eu-2", 700, 0.21, 55),
            ],
        );
        regions.insert("APAC".to_string(), vec![]);
        CampaignSnapshot::new(1, regions)
    }

    fn engine_with_defaults() -> MetricsEngine {
        MetricsEngine::new(
            Arc::new(ThresholdStore::with_defaults()),
            &MemoConfig::default(),
        )
    }

    #[test]
    fn test_overview_flow() {
        let engine = engine_with_defaults();
        let result = engine.compute(&sample_snapshot(), &ViewMode::Overview, now());
        let MetricsResult::Overview(overview) = result else {
            panic!("expected overview result");
        };

        // APAC has no campaigns and is excluded outright
        assert_eq!(overview.regions.len(), 2);
        assert_eq!(overview.regions[0].region, "US");
        assert_eq!(overview.best_region.as_deref(), Some("US"));
        assert_eq!(overview.worst_region.as_deref(), Some("EU"));
        assert_eq!(overview.total_campaigns, 5);

        // the highest open rate belongs to us-3 and clears the 100-send gate
        assert_eq!(overview.top_campaign.unwrap().campaign.id, "us-3");

        // EU sent nothing in the last 30 days: low activity, plus it has
        // been quiet for 40 days
        assert!(overview
            .alerts
            .iter()
            .any(|a| a.kind == AlertKind::LowActivity && a.region == "EU"));
        assert_eq!(overview.inactive_regions.len(), 1);
        assert_eq!(overview.inactive_regions[0].region, "EU");
        assert_eq!(overview.inactive_regions[0].days_since_last_campaign, 40);
    }

    #[test]
    fn test_alert_severity_ordering() {
        let mut snapshot = sample_snapshot();
        // push US bounce rate over the 5% threshold
        for c in snapshot.regions.get_mut("US").unwrap() {
            c.bounces = c.emails_sent / 10;
        }
        let engine = engine_with_defaults();
        let MetricsResult::Overview(overview) =
            engine.compute(&snapshot, &ViewMode::Overview, now())
        else {
            panic!("expected overview result");
        };

        assert!(overview.alerts.len() >= 2);
        let first_medium = overview
            .alerts
            .iter()
            .position(|a| a.severity == Severity::Medium);
        let last_high = overview
            .alerts
            .iter()
            .rposition(|a| a.severity == Severity::High);
        if let (Some(m), Some(h)) = (first_medium, last_high) {
            assert!(h < m, "high severity alerts must come first");
        }
    }

    #[test]
    fn test_region_detail_flow() {
        let engine = engine_with_defaults();
        let result = engine.compute(
            &sample_snapshot(),
            &ViewMode::Region("US".into()),
            now(),
        );
        let MetricsResult::Detail(Some(detail)) = result else {
            panic!("expected detail result");
        };

        assert_eq!(detail.campaign_count, 3);
        assert_eq!(detail.total_sent, 5300);
        assert_eq!(detail.top_performer.unwrap().id, "us-3");
        // all open rates clear the 20% review floor
        assert_eq!(detail.review, ReviewOutcome::AllClear);
        assert_eq!(detail.days_since_last_campaign, Some(3));
    }

    #[test]
    fn test_missing_region_detail_is_no_data() {
        let engine = engine_with_defaults();
        let result = engine.compute(
            &sample_snapshot(),
            &ViewMode::Region("MARS".into()),
            now(),
        );
        assert_eq!(result, MetricsResult::Detail(None));
    }

    #[test]
    fn test_threshold_edits_flow_into_next_pass() {
        let store = Arc::new(ThresholdStore::with_defaults());
        let engine = MetricsEngine::new(store.clone(), &MemoConfig::default());
        let snapshot = sample_snapshot();

        let MetricsResult::Detail(Some(before)) =
            engine.compute(&snapshot, &ViewMode::Region("EU".into()), now())
        else {
            panic!("expected detail result");
        };
        assert_eq!(before.review, ReviewOutcome::AllClear);

        // raising the review floor makes eu-2 (21% open) the worst offender
        store.set("review_open_rate", 25.0);
        let MetricsResult::Detail(Some(after)) =
            engine.compute(&snapshot, &ViewMode::Region("EU".into()), now())
        else {
            panic!("expected detail result");
        };
        let ReviewOutcome::NeedsReview(campaign) = after.review else {
            panic!("expected a needs-review campaign");
        };
        assert_eq!(campaign.id, "eu-2");

        store.reset();
        let MetricsResult::Detail(Some(reset)) =
            engine.compute(&snapshot, &ViewMode::Region("EU".into()), now())
        else {
            panic!("expected detail result");
        };
        assert_eq!(reset.review, ReviewOutcome::AllClear);
    }

    #[test]
    fn test_snapshot_json_round_trip_through_engine() {
        let raw = r#"{
            "TW": [{
                "id": "tw-1",
                "title": "Launch",
                "send_time": "2026-07-30T08:00:00+00:00",
                "emails_sent": 200,
                "opens": 60,
                "clicks": 10,
                "bounces": 10,
                "open_rate": 0.3,
                "click_rate": 0.05
            }],
            "US": []
        }"#;
        let snapshot = CampaignSnapshot::from_json(raw).unwrap();
        let engine = engine_with_defaults();
        let MetricsResult::Overview(overview) =
            engine.compute(&snapshot, &ViewMode::Overview, now())
        else {
            panic!("expected overview result");
        };
        assert_eq!(overview.regions.len(), 1);
        assert_eq!(overview.best_region.as_deref(), Some("TW"));
        assert!(overview.worst_region.is_none());
    }
}
