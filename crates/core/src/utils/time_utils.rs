use std::sync::RwLock;

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use chrono_tz::Tz;

/// Default timezone used to derive "today" from the wall clock.
pub const DEFAULT_TZ: Tz = chrono_tz::UTC;

/// Source of the current calendar date.
///
/// Every date comparison in the engine goes through a `Clock` so that
/// evaluations can be replayed against a fixed "today".
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Converts a UTC instant to a calendar date in the given timezone.
pub fn local_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Wall-clock backed [`Clock`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(DEFAULT_TZ)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        local_date_from_utc(Utc::now(), self.tz)
    }
}

/// A settable [`Clock`] for tests and replays.
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

    pub fn set(&self, date: NaiveDate) {
        if let Ok(mut today) = self.today.write() {
            *today = date;
        }
    }

    pub fn advance_days(&self, days: u64) {
        let next = add_days(self.today(), days);
        self.set(next);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        match self.today.read() {
            Ok(today) => *today,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Subtracts calendar days, saturating at the earliest representable date.
pub fn sub_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days))
        .unwrap_or(NaiveDate::MIN)
}

/// Adds calendar days, saturating at the latest representable date.
pub fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX)
}

/// Subtracts calendar months, clamping the day to the target month's length
/// (Mar 31 minus one month is Feb 28/29).
pub fn sub_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// Signed number of days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sub_months_clamps_to_month_end() {
        assert_eq!(sub_months(date(2025, 3, 31), 1), date(2025, 2, 28));
        assert_eq!(sub_months(date(2024, 3, 31), 1), date(2024, 2, 29));
        assert_eq!(sub_months(date(2025, 1, 15), 12), date(2024, 1, 15));
    }

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::new(date(2025, 1, 31));
        clock.advance_days(1);
        assert_eq!(clock.today(), date(2025, 2, 1));
        clock.set(date(2025, 6, 1));
        assert_eq!(clock.today(), date(2025, 6, 1));
    }

    #[test]
    fn test_days_between_is_signed() {
        assert_eq!(days_between(date(2025, 1, 1), date(2025, 1, 8)), 7);
        assert_eq!(days_between(date(2025, 1, 8), date(2025, 1, 1)), -7);
    }
}
