//! In-memory storage implementation for testing.

use anyhow::Result;
use tokio::sync::Mutex;

use crate::models::{ScrapeState, Transaction};

use super::Storage;

/// In-memory storage for testing purposes.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<Option<ScrapeState>>,
    transactions: Mutex<Vec<Transaction>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ScrapeState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            transactions: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn load_state(&self) -> Result<Option<ScrapeState>> {
        Ok(self.state.lock().await.clone())
    }

    async fn save_state(&self, state: &ScrapeState) -> Result<()> {
        *self.state.lock().await = Some(state.clone());
        Ok(())
    }

    async fn get_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.lock().await.clone())
    }

    async fn append_transactions(&self, txns: &[Transaction]) -> Result<()> {
        self.transactions.lock().await.extend_from_slice(txns);
        Ok(())
    }
}
