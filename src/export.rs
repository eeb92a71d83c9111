//! Writing scraped transactions for downstream tools.

use std::io::Write;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::Transaction;

pub const CSV_HEADER: &str = "date,amount,merchant";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

/// Write transactions as CSV.
///
/// Merchants already carry their own quotes and are written verbatim.
/// Amounts with thousands separators are quoted.
pub fn write_csv<W: Write>(out: &mut W, transactions: &[Transaction]) -> Result<()> {
    writeln!(out, "{CSV_HEADER}").context("Failed to write CSV header")?;
    for tx in transactions {
        let amount = if tx.amount.contains(',') {
            format!("\"{}\"", tx.amount)
        } else {
            tx.amount.clone()
        };
        writeln!(out, "{},{},{}", tx.date, amount, tx.merchant)
            .context("Failed to write CSV row")?;
    }
    Ok(())
}

pub fn write_json<W: Write>(out: &mut W, transactions: &[Transaction]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, transactions).context("Failed to write JSON")?;
    writeln!(out).context("Failed to write JSON")?;
    Ok(())
}

pub fn write_transactions<W: Write>(
    out: &mut W,
    format: ExportFormat,
    transactions: &[Transaction],
) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(out, transactions),
        ExportFormat::Json => write_json(out, transactions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Transaction> {
        vec![
            Transaction::from_cells(1_704_085_200_000, "-5.00", "A"),
            Transaction::from_cells(1_704_430_800_000, "10.00", " Store, Inc. "),
        ]
    }

    #[test]
    fn csv_rows_keep_quoted_merchants() -> Result<()> {
        let mut out = Vec::new();
        write_csv(&mut out, &sample())?;
        assert_eq!(
            String::from_utf8(out)?,
            "date,amount,merchant\n\
             1704085200000,(5.00),\"A\"\n\
             1704430800000,10.00,\"Store, Inc.\"\n"
        );
        Ok(())
    }

    #[test]
    fn csv_quotes_grouped_amounts() -> Result<()> {
        let mut out = Vec::new();
        write_csv(&mut out, &[Transaction::from_cells(1, "-1,200.00", "Airline")])?;
        assert_eq!(
            String::from_utf8(out)?,
            "date,amount,merchant\n1,\"(1,200.00)\",\"Airline\"\n"
        );
        Ok(())
    }

    #[test]
    fn empty_csv_is_just_the_header() -> Result<()> {
        let mut out = Vec::new();
        write_transactions(&mut out, ExportFormat::Csv, &[])?;
        assert_eq!(String::from_utf8(out)?, "date,amount,merchant\n");
        Ok(())
    }

    #[test]
    fn json_is_an_array_of_transactions() -> Result<()> {
        let mut out = Vec::new();
        write_transactions(&mut out, ExportFormat::Json, &sample())?;
        let parsed: Vec<Transaction> = serde_json::from_slice(&out)?;
        assert_eq!(parsed, sample());
        Ok(())
    }
}
