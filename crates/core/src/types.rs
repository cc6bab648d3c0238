//! Shared domain types for the MailPulse metrics engine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{PulseError, PulseResult};

/// A single sent campaign as supplied by the data service.
///
/// Field names follow the provider payload. Counts and rates that are
/// missing, null, or malformed deserialize to zero; the engine never
/// rejects a campaign record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subject_line: String,
    #[serde(default, deserialize_with = "lenient::instant")]
    pub send_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub emails_sent: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub opens: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub unique_opens: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub clicks: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub unique_clicks: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub bounces: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub unsubscribed: u64,
    #[serde(default, deserialize_with = "lenient::rate")]
    pub open_rate: f64,
    #[serde(default, deserialize_with = "lenient::rate")]
    pub click_rate: f64,
    #[serde(default)]
    pub audience_id: Option<String>,
    #[serde(default)]
    pub audience_name: Option<String>,
    #[serde(default)]
    pub archive_url: Option<String>,
    #[serde(default)]
    pub report_url: Option<String>,
}

impl Campaign {
    /// Fraction of sent emails that were delivered. A campaign with no
    /// sends delivered everything it was asked to, so this is 1.0 when
    /// `emails_sent` is zero.
    pub fn delivery_rate(&self) -> f64 {
        if self.emails_sent == 0 {
            return 1.0;
        }
        self.emails_sent.saturating_sub(self.bounces) as f64 / self.emails_sent as f64
    }

    /// Weighted blend used to compare campaigns:
    /// `0.4 * open_rate + 0.3 * click_rate + 0.3 * delivery_rate`.
    pub fn composite_score(&self) -> f64 {
        0.4 * self.open_rate + 0.3 * self.click_rate + 0.3 * self.delivery_rate()
    }

    /// Whether this campaign was sent within the trailing `days`-day window.
    /// Campaigns without a send time never count as recent.
    pub fn sent_within(&self, now: DateTime<Utc>, days: i64) -> bool {
        self.send_time
            .map(|t| t >= now - Duration::days(days))
            .unwrap_or(false)
    }
}

/// One snapshot of campaign data across regions, the unit the engine
/// aggregates over. `version` is an identity key supplied by the caller
/// (bumped whenever the underlying data changes) and drives memoization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    #[serde(default)]
    pub version: u64,
    pub regions: HashMap<String, Vec<Campaign>>,
}

impl CampaignSnapshot {
    pub fn new(version: u64, regions: HashMap<String, Vec<Campaign>>) -> Self {
        Self { version, regions }
    }

    /// Parse a snapshot from JSON. Accepts either the full snapshot object
    /// or a bare region-to-campaigns map (which gets version 0).
    pub fn from_json(input: &str) -> PulseResult<Self> {
        if let Ok(snapshot) = serde_json::from_str::<CampaignSnapshot>(input) {
            return Ok(snapshot);
        }
        let regions: HashMap<String, Vec<Campaign>> = serde_json::from_str(input)
            .map_err(|e| PulseError::Snapshot(format!("unrecognized snapshot shape: {e}")))?;
        Ok(Self::new(0, regions))
    }

    /// Campaigns for one region; an absent region reads as empty.
    pub fn region(&self, code: &str) -> &[Campaign] {
        self.regions.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Region codes in lexical order, for deterministic passes.
    pub fn region_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.regions.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn total_campaigns(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }
}

/// Which aggregation the presentation layer is asking for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Overview,
    Region(String),
}

/// Deserializers that fold missing, null, or malformed values to zero
/// instead of failing the whole snapshot.
mod lenient {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(v.as_u64()
            .or_else(|| v.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0))
    }

    pub fn rate<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(v.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0))
    }

    pub fn instant<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(v.as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc)))
    }
}
