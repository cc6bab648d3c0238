//! Mutable store for alert and review thresholds.
//!
//! The engine reads a fresh snapshot on every aggregation pass; mutations
//! happen externally between passes. A version counter bumps on every
//! successful mutation so callers can memoize on it.

use mailpulse_core::ThresholdConfig;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

pub struct ThresholdStore {
    initial: ThresholdConfig,
    values: RwLock<ThresholdConfig>,
    version: AtomicU64,
}

impl ThresholdStore {
    /// Create a store seeded with the given values. `reset` returns to them.
    pub fn new(initial: ThresholdConfig) -> Self {
        Self {
            values: RwLock::new(initial.clone()),
            initial,
            version: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ThresholdConfig::default())
    }

    /// Current values, cloned. One snapshot is taken per aggregation pass.
    pub fn snapshot(&self) -> ThresholdConfig {
        self.values.read().clone()
    }

    /// Monotonic counter, bumped on every set/reset.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Read one value by its snake_case field name.
    pub fn get(&self, key: &str) -> Option<f64> {
        let values = self.values.read();
        Some(match key {
            "bounce_rate" => values.bounce_rate,
            "unsub_rate" => values.unsub_rate,
            "low_activity_campaigns" => values.low_activity_campaigns,
            "low_open_rate" => values.low_open_rate,
            "low_click_rate" => values.low_click_rate,
            "review_open_rate" => values.review_open_rate,
            "review_click_rate" => values.review_click_rate,
            "review_delivery_rate" => values.review_delivery_rate,
            _ => return None,
        })
    }

    /// Set one value by name. Returns false (and leaves the version
    /// untouched) for unrecognized keys.
    pub fn set(&self, key: &str, value: f64) -> bool {
        {
            let mut values = self.values.write();
            let slot = match key {
                "bounce_rate" => &mut values.bounce_rate,
                "unsub_rate" => &mut values.unsub_rate,
                "low_activity_campaigns" => &mut values.low_activity_campaigns,
                "low_open_rate" => &mut values.low_open_rate,
                "low_click_rate" => &mut values.low_click_rate,
                "review_open_rate" => &mut values.review_open_rate,
                "review_click_rate" => &mut values.review_click_rate,
                "review_delivery_rate" => &mut values.review_delivery_rate,
                _ => return false,
            };
            *slot = value;
        }
        self.version.fetch_add(1, Ordering::AcqRel);
        info!(key, value, "Threshold updated");
        true
    }

    /// Restore the values the store was created with.
    pub fn reset(&self) {
        *self.values.write() = self.initial.clone();
        self.version.fetch_add(1, Ordering::AcqRel);
        info!("Thresholds reset to defaults");
    }
}

impl Default for ThresholdStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}
