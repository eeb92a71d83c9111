use serde::{Deserialize, Serialize};

/// A normalized statement transaction.
///
/// `amount` uses the credit-formatting convention: credits (refunds,
/// payments) are rendered as `(12.34)` rather than `-12.34`. `merchant`
/// carries its own surrounding double quotes so rows can be written to CSV
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Epoch milliseconds (UTC).
    pub date: i64,
    pub amount: String,
    pub merchant: String,
}

impl Transaction {
    pub fn new(date: i64, amount: impl Into<String>, merchant: impl Into<String>) -> Self {
        Self {
            date,
            amount: amount.into(),
            merchant: merchant.into(),
        }
    }

    /// Build a transaction from raw cell text, applying amount and merchant
    /// normalization.
    pub fn from_cells(date: i64, raw_amount: &str, raw_merchant: &str) -> Self {
        Self {
            date,
            amount: format_amount(raw_amount),
            merchant: format_merchant(raw_merchant),
        }
    }
}

/// Trim the debit/credit cell and parenthesize credits.
///
/// A lone `-` has nothing to wrap and passes through as-is.
pub fn format_amount(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.strip_prefix('-') {
        Some(credit) if !credit.is_empty() => format!("({credit})"),
        _ => trimmed.to_string(),
    }
}

/// Trim the merchant cell and wrap it in double quotes.
pub fn format_merchant(raw: &str) -> String {
    format!("\"{}\"", raw.trim())
}
