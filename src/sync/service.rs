use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::models::{ScrapeState, Transaction};
use crate::storage::Storage;

use super::{ScrapeResult, ScrapeSource};

/// Outcome of a completed scrape, after persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOutcome {
    pub transactions: Vec<Transaction>,
    pub state: ScrapeState,
}

/// Runs scrape sources and persists what they return.
pub struct ScrapeService {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
}

impl ScrapeService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Watermark to seed the next source with.
    ///
    /// The later of the configured cutoff and the mark saved by the last
    /// successful run, so a cutoff in the config file only ever moves the
    /// starting point forward.
    pub async fn prior_watermark(&self, configured: Option<i64>) -> Result<Option<i64>> {
        let configured = configured.filter(|v| *v > 0);
        let persisted = self
            .storage
            .load_state()
            .await?
            .and_then(|state| state.prior_watermark());
        Ok(configured.max(persisted))
    }

    /// Run `source` to completion, then append its transactions to the
    /// ledger and save the new state. Nothing is written if the scrape fails.
    pub async fn run(&self, source: &mut dyn ScrapeSource) -> Result<ScrapeOutcome> {
        let name = source.name().to_string();
        let ScrapeResult {
            transactions,
            high_water_mark,
            remaining_balance,
        } = source
            .scrape()
            .await
            .with_context(|| format!("Scrape failed for {name}"))?;

        let saved_mark = self
            .storage
            .load_state()
            .await?
            .map_or(0, |state| state.most_recent_transaction_date);
        // Never move the saved mark backwards.
        let high_water_mark = high_water_mark.max(saved_mark);

        self.storage
            .append_transactions(&transactions)
            .await
            .context("Failed to append scraped transactions")?;

        let state = ScrapeState {
            most_recent_transaction_date: high_water_mark,
            remaining_balance: Some(remaining_balance),
            last_run_at: Some(self.clock.now()),
        };
        self.storage
            .save_state(&state)
            .await
            .context("Failed to save scrape state")?;

        info!(
            source = %name,
            transactions = transactions.len(),
            most_recent_transaction_date = high_water_mark,
            "Scrape complete"
        );

        Ok(ScrapeOutcome {
            transactions,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStorage;

    struct StaticSource {
        result: Option<ScrapeResult>,
    }

    #[async_trait::async_trait]
    impl ScrapeSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn scrape(&mut self) -> Result<ScrapeResult> {
            self.result
                .take()
                .ok_or_else(|| anyhow::anyhow!("login form not found"))
        }
    }

    #[tokio::test]
    async fn successful_scrape_persists_state_and_ledger() -> Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        let service = ScrapeService::new(storage.clone()).with_clock(Arc::new(FixedClock::new(now)));

        let mut source = StaticSource {
            result: Some(ScrapeResult {
                transactions: vec![Transaction::new(5, "1.00", "\"A\"")],
                high_water_mark: 5,
                remaining_balance: "$12.00".to_string(),
            }),
        };
        let outcome = service.run(&mut source).await?;

        let expected_state = ScrapeState {
            most_recent_transaction_date: 5,
            remaining_balance: Some("$12.00".to_string()),
            last_run_at: Some(now),
        };
        assert_eq!(outcome.state, expected_state);
        assert_eq!(storage.load_state().await?, Some(expected_state));
        assert_eq!(storage.get_transactions().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn failed_scrape_writes_nothing() -> Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        let service = ScrapeService::new(storage.clone());

        let mut source = StaticSource { result: None };
        let err = service.run(&mut source).await.unwrap_err();

        assert!(err.to_string().contains("Scrape failed for static"));
        assert_eq!(storage.load_state().await?, None);
        assert!(storage.get_transactions().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn later_of_configured_and_saved_watermark_wins() -> Result<()> {
        let storage = Arc::new(MemoryStorage::with_state(ScrapeState {
            most_recent_transaction_date: 100,
            ..ScrapeState::default()
        }));
        let service = ScrapeService::new(storage);

        assert_eq!(service.prior_watermark(Some(250)).await?, Some(250));
        assert_eq!(service.prior_watermark(Some(50)).await?, Some(100));
        assert_eq!(service.prior_watermark(None).await?, Some(100));
        assert_eq!(service.prior_watermark(Some(0)).await?, Some(100));
        Ok(())
    }

    #[tokio::test]
    async fn configured_cutoff_without_state_is_used() -> Result<()> {
        let service = ScrapeService::new(Arc::new(MemoryStorage::new()));
        assert_eq!(service.prior_watermark(Some(250)).await?, Some(250));
        Ok(())
    }

    #[tokio::test]
    async fn saved_mark_never_moves_backwards() -> Result<()> {
        let storage = Arc::new(MemoryStorage::with_state(ScrapeState {
            most_recent_transaction_date: 100,
            ..ScrapeState::default()
        }));
        let service = ScrapeService::new(storage.clone());

        let mut source = StaticSource {
            result: Some(ScrapeResult {
                transactions: Vec::new(),
                high_water_mark: 40,
                remaining_balance: "$0.00".to_string(),
            }),
        };
        let outcome = service.run(&mut source).await?;

        assert_eq!(outcome.state.most_recent_transaction_date, 100);
        let saved = storage.load_state().await?.expect("state saved");
        assert_eq!(saved.most_recent_transaction_date, 100);
        Ok(())
    }

    #[tokio::test]
    async fn no_state_means_no_lower_bound() -> Result<()> {
        let service = ScrapeService::new(Arc::new(MemoryStorage::new()));
        assert_eq!(service.prior_watermark(None).await?, None);
        Ok(())
    }
}
