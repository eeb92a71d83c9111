mod json_file;
mod memory;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;

use anyhow::Result;

use crate::models::{ScrapeState, Transaction};

/// Storage trait for persisting scrape state and the transaction ledger.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    // State
    async fn load_state(&self) -> Result<Option<ScrapeState>>;
    async fn save_state(&self, state: &ScrapeState) -> Result<()>;

    // Transactions
    async fn get_transactions(&self) -> Result<Vec<Transaction>>;
    async fn append_transactions(&self, txns: &[Transaction]) -> Result<()>;
}
