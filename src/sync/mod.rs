pub mod pcmc;
mod service;

pub use pcmc::PcMastercardSource;
pub use service::{ScrapeOutcome, ScrapeService};

use anyhow::Result;

use crate::models::Transaction;

/// Everything a scrape hands back to the host for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeResult {
    pub transactions: Vec<Transaction>,
    /// Epoch ms of the newest transaction seen, to seed the next run.
    pub high_water_mark: i64,
    /// Opaque balance display string read from the site.
    pub remaining_balance: String,
}

/// A site-specific scraper the host runner can drive.
///
/// Sources own their session and watermark; the host only runs them and
/// persists what they return.
#[async_trait::async_trait]
pub trait ScrapeSource: Send {
    /// Human-readable name for this source.
    fn name(&self) -> &str;

    /// Sign in and collect every transaction newer than the configured
    /// cutoff. Any failure aborts the whole scrape.
    async fn scrape(&mut self) -> Result<ScrapeResult>;
}
