use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LeaveError, LeaveResult};

/// Lifecycle state of a leave request. Draft is rarely persisted; Approved
/// and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "leave_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Draft,
    Submitted,
    Returned,
    Approved,
    Cancelled,
}

impl LeaveStatus {
    /// The single transition table shared by every use case. Anything not
    /// listed here is illegal, no matter which endpoint attempts it.
    pub fn can_become(self, to: LeaveStatus) -> bool {
        use LeaveStatus::*;
        matches!(
            (self, to),
            (Draft, Submitted)
                | (Draft, Cancelled)
                | (Submitted, Approved)
                | (Submitted, Returned)
                | (Submitted, Cancelled)
                | (Returned, Submitted)
                | (Returned, Cancelled)
        )
    }

    pub fn ensure_can_become(self, to: LeaveStatus) -> LeaveResult<()> {
        if self.can_become(to) {
            Ok(())
        } else {
            Err(LeaveError::InvalidTransition { from: self, to })
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Cancelled)
    }
}

impl std::fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LeaveStatus::Draft => "draft",
            LeaveStatus::Submitted => "submitted",
            LeaveStatus::Returned => "returned",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Granularity of a request: one or more full business days, or half of a
/// single date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "leave_unit", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveUnit {
    FullDay,
    HalfDay,
}

/// Audit action recorded on each lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "leave_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveAction {
    Created,
    Submitted,
    Returned,
    Approved,
    Cancelled,
}

/// One pending or historical time-off request.
///
/// `days_requested` is a snapshot; it is recomputed from the span at every
/// transition and never trusted from client input. `manager_id` is the
/// manager-of-record captured at submission time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub unit: LeaveUnit,
    pub days_requested: Decimal,
    pub status: LeaveStatus,
    pub manager_id: Option<Uuid>,
    pub employee_comment: Option<String>,
    pub manager_comment: Option<String>,
    pub doctor_note_attachment_id: Option<Uuid>,
    pub has_doctor_note: bool,
    pub submitted_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    pub fn year(&self) -> i32 {
        use chrono::Datelike;
        self.start_date.year()
    }

    /// True when the caller is the manager-of-record snapshot or the
    /// employee's current manager.
    pub fn is_managed_by(&self, manager_id: Uuid, current_manager: Option<Uuid>) -> bool {
        self.manager_id == Some(manager_id) || current_manager == Some(manager_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_matches_lifecycle() {
        use LeaveStatus::*;
        assert!(Submitted.can_become(Approved));
        assert!(Submitted.can_become(Returned));
        assert!(Submitted.can_become(Cancelled));
        assert!(Returned.can_become(Submitted));
        assert!(Returned.can_become(Cancelled));

        assert!(!Approved.can_become(Cancelled));
        assert!(!Approved.can_become(Submitted));
        assert!(!Cancelled.can_become(Submitted));
        assert!(!Returned.can_become(Approved));
    }

    #[test]
    fn illegal_transition_is_a_state_error() {
        let err = LeaveStatus::Approved
            .ensure_can_become(LeaveStatus::Cancelled)
            .unwrap_err();
        assert!(matches!(err, LeaveError::InvalidTransition { .. }));
    }

    #[test]
    fn terminal_states() {
        assert!(LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Cancelled.is_terminal());
        assert!(!LeaveStatus::Returned.is_terminal());
    }
}
