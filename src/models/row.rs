use serde::{Deserialize, Serialize};

/// Cell texts of one statement table row, in DOM order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(Vec<String>);

impl RawRow {
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for RawRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Column positions of the cells the extractor reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLayout {
    pub date: usize,
    pub merchant: usize,
    pub amount: usize,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self {
            date: 1,
            merchant: 2,
            amount: 3,
        }
    }
}
