use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};

/// Working-day arithmetic over an injected holiday set. Saturdays, Sundays
/// and configured holidays are non-working; everything else is a business
/// day. Pure and infallible; the leaf dependency for all span math.
#[derive(Debug, Clone, Default)]
pub struct BusinessCalendar {
    holidays: HashSet<NaiveDate>,
}

impl BusinessCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        !self.holidays.contains(&date)
    }

    /// Working days in `[start, end]`, inclusive on both ends. Empty when
    /// `end < start`.
    pub fn business_days_inclusive(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = NaiveDate> + '_ {
        start
            .iter_days()
            .take_while(move |d| *d <= end)
            .filter(|d| self.is_working_day(*d))
    }

    pub fn count_business_days_inclusive(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        self.business_days_inclusive(start, end).count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekends_are_not_working_days() {
        let cal = BusinessCalendar::default();
        assert!(cal.is_working_day(d(2026, 3, 2))); // Monday
        assert!(!cal.is_working_day(d(2026, 3, 7))); // Saturday
        assert!(!cal.is_working_day(d(2026, 3, 8))); // Sunday
    }

    #[test]
    fn holidays_are_excluded() {
        let cal = BusinessCalendar::new([d(2026, 3, 4)]);
        assert!(!cal.is_working_day(d(2026, 3, 4)));
        assert_eq!(cal.count_business_days_inclusive(d(2026, 3, 2), d(2026, 3, 6)), 4);
    }

    #[test]
    fn count_spans_a_weekend() {
        let cal = BusinessCalendar::default();
        // Thu 5th .. Mon 9th: Thu, Fri, Mon.
        assert_eq!(cal.count_business_days_inclusive(d(2026, 3, 5), d(2026, 3, 9)), 3);
    }

    #[test]
    fn reversed_range_counts_zero() {
        let cal = BusinessCalendar::default();
        assert_eq!(cal.count_business_days_inclusive(d(2026, 3, 9), d(2026, 3, 5)), 0);
    }

    #[test]
    fn single_day_range() {
        let cal = BusinessCalendar::default();
        assert_eq!(cal.count_business_days_inclusive(d(2026, 3, 3), d(2026, 3, 3)), 1);
        assert_eq!(cal.count_business_days_inclusive(d(2026, 3, 7), d(2026, 3, 7)), 0);
    }
}
