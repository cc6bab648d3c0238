pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, ThresholdConfig};
pub use error::{PulseError, PulseResult};
pub use types::{Campaign, CampaignSnapshot, ViewMode};
