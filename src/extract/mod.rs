//! Incremental transaction extraction.
//!
//! Everything here is a pure function of row snapshots and the watermark
//! pair; fetching the rows is left to a [`CycleRowSource`].

mod date;

pub use date::{clean_date_text, DateParser, DEFAULT_TIMEZONE};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::models::{RawRow, RowLayout, Transaction, Watermark};

/// Balance placeholder reported before any scrape has read one.
pub const UNKNOWN_BALANCE: &str = "undefined";

/// Output of one statement cycle pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleExtraction {
    pub transactions: Vec<Transaction>,
    pub high_water_mark: i64,
}

/// Supplies the row snapshot for a statement cycle.
///
/// Implementations typically select the cycle in a live page and wait for
/// it to load, so calls are made one at a time and in order.
#[async_trait]
pub trait CycleRowSource: Send {
    async fn fetch_rows(&mut self, cycle: &str) -> Result<Vec<RawRow>>;
}

/// Turns raw table rows into transactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowParser {
    layout: RowLayout,
    dates: DateParser,
}

impl RowParser {
    pub fn new(layout: RowLayout, dates: DateParser) -> Self {
        Self { layout, dates }
    }

    /// Filter and normalize one cycle's rows against the watermark pair.
    ///
    /// Rows whose date cell doesn't parse are skipped. Rows at or before
    /// `configured_cutoff` are discarded. Every other row is emitted and
    /// raises the mark when its date is `>=` the current one.
    pub fn extract_from_cycle(
        &self,
        rows: &[RawRow],
        configured_cutoff: i64,
        current_high_water_mark: i64,
    ) -> CycleExtraction {
        let mut mark = Watermark::resume(configured_cutoff, current_high_water_mark);
        let mut transactions = Vec::new();

        for row in rows {
            // Spacer rows carry no cells at all.
            if row.is_empty() {
                continue;
            }

            let Some(epoch) = row
                .cell(self.layout.date)
                .and_then(|cell| self.dates.parse(cell))
            else {
                continue;
            };

            if mark.is_seen(epoch) {
                debug!("Discarding transaction from {epoch} as it is too old to process");
                continue;
            }

            let (Some(merchant), Some(amount)) =
                (row.cell(self.layout.merchant), row.cell(self.layout.amount))
            else {
                debug!(cells = row.len(), "Skipping dated row without merchant/amount cells");
                continue;
            };

            debug!("Processing transaction from {epoch}");
            mark.observe(epoch);
            transactions.push(Transaction::from_cells(epoch, amount, merchant));
        }

        CycleExtraction {
            transactions,
            high_water_mark: mark.high_water_mark(),
        }
    }
}

/// Stateful extractor threading the watermark across statement cycles.
#[derive(Debug, Clone)]
pub struct IncrementalExtractor {
    parser: RowParser,
    watermark: Watermark,
    remaining_balance: String,
}

impl IncrementalExtractor {
    pub fn new(parser: RowParser, prior_watermark: Option<i64>) -> Self {
        Self {
            parser,
            watermark: Watermark::new(prior_watermark),
            remaining_balance: UNKNOWN_BALANCE.to_string(),
        }
    }

    pub fn configured_cutoff(&self) -> i64 {
        self.watermark.configured_cutoff()
    }

    /// Latest transaction date seen, after the most recent scrape.
    pub fn high_water_mark(&self) -> i64 {
        self.watermark.high_water_mark()
    }

    pub fn remaining_balance(&self) -> &str {
        &self.remaining_balance
    }

    pub fn set_remaining_balance(&mut self, balance: impl Into<String>) {
        self.remaining_balance = balance.into();
    }

    /// Extract one cycle and carry its mark forward.
    pub fn extract_cycle(&mut self, rows: &[RawRow]) -> Vec<Transaction> {
        let CycleExtraction {
            transactions,
            high_water_mark,
        } = self.parser.extract_from_cycle(
            rows,
            self.watermark.configured_cutoff(),
            self.watermark.high_water_mark(),
        );
        self.watermark.observe(high_water_mark);
        transactions
    }

    /// Walk every statement cycle in order and collect new transactions.
    ///
    /// Empty cycle ids are the page's "no selection" placeholder and are
    /// skipped without a fetch. A fetch failure aborts the scrape and leaves
    /// the watermark where it was before the call.
    pub async fn run_full_scrape<S>(
        &mut self,
        cycle_ids: &[String],
        rows: &mut S,
    ) -> Result<Vec<Transaction>>
    where
        S: CycleRowSource + ?Sized,
    {
        let mut pending = self.clone();
        let mut transactions = Vec::new();

        for cycle in cycle_ids {
            if cycle.is_empty() {
                debug!("Nothing to process with {cycle:?}, moving along");
                continue;
            }

            debug!(cycle = %cycle, "Now processing statement");
            let cycle_rows = rows
                .fetch_rows(cycle)
                .await
                .with_context(|| format!("Failed to read statement cycle {cycle}"))?;
            transactions.extend(pending.extract_cycle(&cycle_rows));
        }

        self.watermark = pending.watermark;
        Ok(transactions)
    }
}
