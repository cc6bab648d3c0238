//! Metrics aggregation and alerting for the MailPulse dashboard.
//!
//! Reduces per-region campaign arrays into ranked region summaries,
//! best/worst identification, threshold-driven alerts, and single-region
//! detail views. Pure synchronous computation; the only shared state is
//! the threshold store, which is read-only during a pass.

pub mod alerts;
pub mod detail;
pub mod engine;
pub mod guard;
pub mod overview;
pub mod thresholds;

pub use alerts::{Alert, AlertKind, InactiveRegion, Severity};
pub use detail::{RegionDetail, ReviewOutcome};
pub use engine::{MetricsEngine, MetricsResult, OverviewMetrics};
pub use overview::{RegionStat, TopCampaign};
pub use thresholds::ThresholdStore;
