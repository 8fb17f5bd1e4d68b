//! Wall-clock access for budget periods.

use std::sync::RwLock;

use chrono::{FixedOffset, Local, NaiveDate, Utc};
use database::BudgetPeriod;

/// Source of "today", so period logic never reads the system time directly.
pub trait Clock: Send + Sync {
    /// The current calendar date in the bot's reference time zone.
    fn today(&self) -> NaiveDate;

    /// The budget period containing today.
    fn current_period(&self) -> BudgetPeriod {
        BudgetPeriod::containing(self.today())
    }
}

/// The system clock, read in the local time zone or a fixed UTC offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    offset: Option<FixedOffset>,
}

impl SystemClock {
    /// Use the machine's local time zone.
    pub fn local() -> Self {
        Self { offset: None }
    }

    /// Use a fixed offset from UTC.
    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
        }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        match self.offset {
            Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
            None => Local::now().date_naive(),
        }
    }
}

/// A clock that stays on a set date until moved.
#[derive(Debug)]
pub struct FixedClock {
    today: RwLock<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: RwLock::new(today),
        }
    }

    /// A clock on the first day of `period`.
    pub fn at_period(period: BudgetPeriod) -> Self {
        Self::new(first_day(period))
    }

    pub fn set(&self, today: NaiveDate) {
        *self.today.write().unwrap_or_else(|e| e.into_inner()) = today;
    }

    /// Move to the first day of `period`.
    pub fn set_period(&self, period: BudgetPeriod) {
        self.set(first_day(period));
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.read().unwrap_or_else(|e| e.into_inner())
    }
}

fn first_day(period: BudgetPeriod) -> NaiveDate {
    // Every BudgetPeriod holds a valid month, so day 1 always exists.
    NaiveDate::from_ymd_opt(period.year(), period.month(), 1).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_moves() {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        assert_eq!(clock.current_period().to_string(), "2024-05");

        clock.set(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(clock.current_period().to_string(), "2024-06");

        clock.set_period(BudgetPeriod::new(2025, 1).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_offset_clock_is_near_utc_date() {
        let clock = SystemClock::with_offset(FixedOffset::east_opt(0).unwrap());
        let utc_today = Utc::now().date_naive();
        let diff = (clock.today() - utc_today).num_days().abs();
        // Allows for the test straddling midnight.
        assert!(diff <= 1);
    }
}
