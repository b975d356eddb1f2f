use chrono::NaiveDate;

use crate::calendar::BusinessCalendar;
use crate::models::LeaveUnit;

/// Default doctor's-note threshold: a note is mandatory above 2 consecutive
/// business days.
pub const DEFAULT_DOCTOR_NOTE_THRESHOLD_DAYS: u32 = 2;

/// Whether a medical attachment is mandatory for the span. Half-day requests
/// never need one; a full-day request does once its business-day count
/// exceeds the threshold.
pub fn requires_doctor_note(
    calendar: &BusinessCalendar,
    start: NaiveDate,
    end: NaiveDate,
    unit: LeaveUnit,
    threshold_days: u32,
) -> bool {
    if unit == LeaveUnit::HalfDay {
        return false;
    }
    calendar.count_business_days_inclusive(start, end) > threshold_days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn two_business_days_need_no_note() {
        let cal = BusinessCalendar::default();
        assert!(!requires_doctor_note(
            &cal,
            d(2026, 3, 2),
            d(2026, 3, 3),
            LeaveUnit::FullDay,
            DEFAULT_DOCTOR_NOTE_THRESHOLD_DAYS,
        ));
    }

    #[test]
    fn three_business_days_need_a_note() {
        let cal = BusinessCalendar::default();
        assert!(requires_doctor_note(
            &cal,
            d(2026, 3, 2),
            d(2026, 3, 4),
            LeaveUnit::FullDay,
            DEFAULT_DOCTOR_NOTE_THRESHOLD_DAYS,
        ));
    }

    #[test]
    fn weekend_in_the_middle_does_not_count() {
        let cal = BusinessCalendar::default();
        // Thu 5th .. Mon 9th is 3 calendar-spanned business days: Thu, Fri, Mon.
        assert!(requires_doctor_note(
            &cal,
            d(2026, 3, 5),
            d(2026, 3, 9),
            LeaveUnit::FullDay,
            DEFAULT_DOCTOR_NOTE_THRESHOLD_DAYS,
        ));
        // Fri 6th .. Mon 9th is only Fri + Mon.
        assert!(!requires_doctor_note(
            &cal,
            d(2026, 3, 6),
            d(2026, 3, 9),
            LeaveUnit::FullDay,
            DEFAULT_DOCTOR_NOTE_THRESHOLD_DAYS,
        ));
    }

    #[test]
    fn half_day_never_needs_a_note() {
        let cal = BusinessCalendar::default();
        assert!(!requires_doctor_note(
            &cal,
            d(2026, 3, 2),
            d(2026, 3, 2),
            LeaveUnit::HalfDay,
            0,
        ));
    }
}
