use serde::{Deserialize, Serialize};

/// Root application configuration. Loaded from environment variables
/// with the prefix `MAILPULSE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub memo: MemoConfig,
}

/// Alert and review thresholds. Percentage-like values are stored as
/// whole numbers (`bounce_rate = 5` means 5%) and divided by 100 at the
/// comparison site; `low_activity_campaigns` is a plain count.
///
/// Two independent families: `bounce_rate`/`unsub_rate`/
/// `low_activity_campaigns`/`low_open_rate`/`low_click_rate` drive
/// overview alerting, `review_*` drive the single-region needs-review
/// selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_bounce_rate")]
    pub bounce_rate: f64,
    #[serde(default = "default_unsub_rate")]
    pub unsub_rate: f64,
    #[serde(default = "default_low_activity_campaigns")]
    pub low_activity_campaigns: f64,
    #[serde(default = "default_low_open_rate")]
    pub low_open_rate: f64,
    #[serde(default = "default_low_click_rate")]
    pub low_click_rate: f64,
    #[serde(default = "default_review_open_rate")]
    pub review_open_rate: f64,
    #[serde(default = "default_review_click_rate")]
    pub review_click_rate: f64,
    #[serde(default = "default_review_delivery_rate")]
    pub review_delivery_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoConfig {
    #[serde(default = "default_memo_max_entries")]
    pub max_entries: usize,
}

// Default functions
fn default_bounce_rate() -> f64 {
    5.0
}
fn default_unsub_rate() -> f64 {
    1.0
}
fn default_low_activity_campaigns() -> f64 {
    2.0
}
fn default_low_open_rate() -> f64 {
    15.0
}
fn default_low_click_rate() -> f64 {
    1.0
}
fn default_review_open_rate() -> f64 {
    20.0
}
fn default_review_click_rate() -> f64 {
    2.0
}
fn default_review_delivery_rate() -> f64 {
    95.0
}
fn default_memo_max_entries() -> usize {
    64
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            bounce_rate: default_bounce_rate(),
            unsub_rate: default_unsub_rate(),
            low_activity_campaigns: default_low_activity_campaigns(),
            low_open_rate: default_low_open_rate(),
            low_click_rate: default_low_click_rate(),
            review_open_rate: default_review_open_rate(),
            review_click_rate: default_review_click_rate(),
            review_delivery_rate: default_review_delivery_rate(),
        }
    }
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            max_entries: default_memo_max_entries(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            memo: MemoConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("MAILPULSE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
