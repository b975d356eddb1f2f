use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{LeaveError, LeaveResult};
use crate::store::LeaveStore;

/// Inclusive-inclusive range intersection: two spans overlap when each
/// starts on or before the other ends. Sharing a single boundary date
/// counts as an overlap.
pub fn spans_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// Reject a span that intersects any other Approved or Submitted request for
/// the same employee. On edit/resubmit the request itself is excluded by id.
pub async fn ensure_no_overlap(
    store: &dyn LeaveStore,
    employee_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    exclude_request_id: Option<Uuid>,
) -> LeaveResult<()> {
    if store
        .has_active_overlap(employee_id, start, end, exclude_request_id)
        .await?
    {
        return Err(LeaveError::OverlappingRequest);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    #[test]
    fn shared_boundary_date_overlaps() {
        assert!(spans_overlap(d(1, 1), d(1, 5), d(1, 5), d(1, 10)));
        assert!(spans_overlap(d(1, 5), d(1, 10), d(1, 1), d(1, 5)));
    }

    #[test]
    fn adjacent_spans_do_not_overlap() {
        assert!(!spans_overlap(d(1, 1), d(1, 4), d(1, 5), d(1, 10)));
    }

    #[test]
    fn containment_overlaps() {
        assert!(spans_overlap(d(1, 1), d(1, 31), d(1, 10), d(1, 12)));
        assert!(spans_overlap(d(1, 10), d(1, 12), d(1, 1), d(1, 31)));
    }
}
