//! Statement date cell parsing.
//!
//! The statement table renders dates like `Jan 5, 2024` with `&nbsp;`
//! padding. Cells are cleaned, then tried against a short list of shapes and
//! interpreted as wall-clock time in the cardholder's timezone.

use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// Default timezone statement dates are rendered in.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Toronto;

const DATETIME_FORMATS: &[&str] = &[
    "%b %d %Y %H:%M:%S",
    "%b %d %Y %H:%M",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%m/%d/%Y",
    "%Y-%m-%d",
];

/// Parses statement date cells into epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParser {
    timezone: Tz,
}

impl Default for DateParser {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

impl DateParser {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Parse a raw date cell. Returns `None` for anything that isn't a date,
    /// which is how header and separator rows are told apart from data.
    pub fn parse(&self, raw: &str) -> Option<i64> {
        let cleaned = clean_date_text(raw);
        if cleaned.is_empty() {
            return None;
        }

        let naive = parse_naive(&cleaned)?;
        // A wall-clock time skipped by a DST transition rolls forward one hour.
        self.timezone
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| {
                self.timezone
                    .from_local_datetime(&(naive + Duration::hours(1)))
                    .earliest()
            })
            .map(|local| local.timestamp_millis())
    }
}

/// Strip thousands commas and turn `&nbsp;` (entity or character) into
/// plain whitespace, then collapse whitespace runs.
pub fn clean_date_text(raw: &str) -> String {
    raw.replace("&nbsp;", " ")
        .replace('\u{a0}', " ")
        .replace(',', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
