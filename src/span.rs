use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::calendar::BusinessCalendar;
use crate::error::{LeaveError, LeaveResult};
use crate::models::LeaveUnit;

/// 0.5 of a day, the only fractional unit the ledger deals in.
pub fn half_day() -> Decimal {
    Decimal::new(5, 1)
}

/// The single source of truth for how many units a request costs.
///
/// Recomputed at submit, edit, resubmit and approve; client-supplied counts
/// are never trusted. A half-day request must name exactly one date and is
/// worth 0.5 on a working day, 0 otherwise. A full-day request is worth the
/// business-day count of its inclusive span.
pub fn compute_units(
    calendar: &BusinessCalendar,
    start: NaiveDate,
    end: NaiveDate,
    unit: LeaveUnit,
) -> LeaveResult<Decimal> {
    if end < start {
        return Err(LeaveError::InvalidSpan);
    }

    match unit {
        LeaveUnit::HalfDay => {
            if start != end {
                return Err(LeaveError::InvalidHalfDay);
            }
            if calendar.is_working_day(start) {
                Ok(half_day())
            } else {
                Ok(Decimal::ZERO)
            }
        }
        LeaveUnit::FullDay => Ok(Decimal::from(
            calendar.count_business_days_inclusive(start, end),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn full_day_counts_business_days() {
        let cal = BusinessCalendar::default();
        // Mon 2nd .. Wed 4th of March 2026.
        let units = compute_units(&cal, d(2026, 3, 2), d(2026, 3, 4), LeaveUnit::FullDay).unwrap();
        assert_eq!(units, dec!(3));
    }

    #[test]
    fn full_day_over_a_weekend_only() {
        let cal = BusinessCalendar::default();
        let units = compute_units(&cal, d(2026, 3, 7), d(2026, 3, 8), LeaveUnit::FullDay).unwrap();
        assert_eq!(units, dec!(0));
    }

    #[test]
    fn half_day_on_a_working_day() {
        let cal = BusinessCalendar::default();
        let units = compute_units(&cal, d(2026, 3, 3), d(2026, 3, 3), LeaveUnit::HalfDay).unwrap();
        assert_eq!(units, dec!(0.5));
    }

    #[test]
    fn half_day_on_a_weekend_is_zero() {
        let cal = BusinessCalendar::default();
        let units = compute_units(&cal, d(2026, 3, 7), d(2026, 3, 7), LeaveUnit::HalfDay).unwrap();
        assert_eq!(units, dec!(0));
    }

    #[test]
    fn half_day_must_be_a_single_date() {
        let cal = BusinessCalendar::default();
        let err =
            compute_units(&cal, d(2026, 3, 3), d(2026, 3, 4), LeaveUnit::HalfDay).unwrap_err();
        assert!(matches!(err, LeaveError::InvalidHalfDay));
    }

    #[test]
    fn reversed_span_is_invalid() {
        let cal = BusinessCalendar::default();
        let err =
            compute_units(&cal, d(2026, 3, 4), d(2026, 3, 3), LeaveUnit::FullDay).unwrap_err();
        assert!(matches!(err, LeaveError::InvalidSpan));
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let cal = BusinessCalendar::default();
        let a = compute_units(&cal, d(2026, 3, 2), d(2026, 3, 13), LeaveUnit::FullDay).unwrap();
        let b = compute_units(&cal, d(2026, 3, 2), d(2026, 3, 13), LeaveUnit::FullDay).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, dec!(10));
    }
}
