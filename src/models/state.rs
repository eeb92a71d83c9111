use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a completed scrape leaves behind for the next run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeState {
    /// High-water mark of the last successful scrape (epoch ms).
    #[serde(default)]
    pub most_recent_transaction_date: i64,

    /// Balance display string read during the last scrape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_balance: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
}

impl ScrapeState {
    /// Prior watermark to seed the next extractor with, if any.
    pub fn prior_watermark(&self) -> Option<i64> {
        (self.most_recent_transaction_date > 0).then_some(self.most_recent_transaction_date)
    }
}
