use serde::{Deserialize, Serialize};

/// The two-watermark pair driving incremental scrapes.
///
/// `configured_cutoff` is fixed for the lifetime of a scrape: rows at or
/// before it were emitted by an earlier run. `high_water_mark` starts at the
/// cutoff and only moves forward as newer rows are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Watermark {
    configured_cutoff: i64,
    high_water_mark: i64,
}

impl Watermark {
    /// Seed from the previous run's mark. `None` means no lower bound.
    pub fn new(prior: Option<i64>) -> Self {
        let cutoff = prior.unwrap_or(0);
        Self {
            configured_cutoff: cutoff,
            high_water_mark: cutoff,
        }
    }

    /// Pick up a scrape part-way through: the cutoff stays fixed while the
    /// mark has already been moved by earlier cycles.
    pub fn resume(configured_cutoff: i64, high_water_mark: i64) -> Self {
        Self {
            configured_cutoff,
            high_water_mark,
        }
    }

    pub fn configured_cutoff(&self) -> i64 {
        self.configured_cutoff
    }

    pub fn high_water_mark(&self) -> i64 {
        self.high_water_mark
    }

    /// Whether a row dated `epoch_ms` was already seen by a previous run.
    pub fn is_seen(&self, epoch_ms: i64) -> bool {
        epoch_ms <= self.configured_cutoff
    }

    /// Raise the mark to `epoch_ms` when it is at or beyond the current mark.
    ///
    /// Ties count as an update so the last row seen at the maximum timestamp
    /// is the one recorded.
    pub fn observe(&mut self, epoch_ms: i64) {
        if epoch_ms >= self.high_water_mark {
            self.high_water_mark = epoch_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_no_lower_bound() {
        let mark = Watermark::new(None);
        assert_eq!(mark.configured_cutoff(), 0);
        assert_eq!(mark.high_water_mark(), 0);
    }

    #[test]
    fn cutoff_is_inclusive() {
        let mark = Watermark::new(Some(100));
        assert!(mark.is_seen(99));
        assert!(mark.is_seen(100));
        assert!(!mark.is_seen(101));
    }

    #[test]
    fn observe_never_lowers_the_mark() {
        let mut mark = Watermark::new(Some(100));
        mark.observe(300);
        mark.observe(200);
        assert_eq!(mark.high_water_mark(), 300);
        assert_eq!(mark.configured_cutoff(), 100);
    }
}
