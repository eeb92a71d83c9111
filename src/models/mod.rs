mod row;
mod state;
mod transaction;
mod watermark;

pub use row::{RawRow, RowLayout};
pub use state::ScrapeState;
pub use transaction::Transaction;
pub use watermark::Watermark;
