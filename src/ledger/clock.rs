//! Injectable time source.

use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Supplies the current instant to the ledger.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The current calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a settable date, at noon UTC.
#[derive(Debug)]
pub struct FixedClock {
    today: RwLock<NaiveDate>,
}

impl FixedClock {
    /// Creates a clock reading `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: RwLock::new(today),
        }
    }

    /// Moves the clock to `today`.
    pub fn set(&self, today: NaiveDate) {
        let mut guard = self.today.write().unwrap_or_else(|e| e.into_inner());
        *guard = today;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let today = *self.today.read().unwrap_or_else(|e| e.into_inner());
        today.and_time(NaiveTime::MIN).and_utc() + chrono::Duration::hours(12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_can_be_moved() {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());

        clock.set(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    }
}
