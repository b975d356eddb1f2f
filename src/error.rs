use rust_decimal::Decimal;

use crate::models::LeaveStatus;

/// Error taxonomy for the leave core. Validation and state errors are
/// client-correctable, ledger errors are business-rule failures, and
/// `Conflict` is the only retryable variant.
#[derive(Debug, thiserror::Error)]
pub enum LeaveError {
    #[error("end date must be on or after start date")]
    InvalidSpan,

    #[error("cross-year spans are not supported; submit separate requests per year")]
    CrossYearSpan,

    #[error("half-day leave can only be requested for a single date")]
    InvalidHalfDay,

    #[error("requested period has no working days")]
    NoWorkingDays,

    #[error("doctor's note is required for requests over {threshold} consecutive business days")]
    MissingDoctorNote { threshold: u32 },

    #[error("a comment is required when returning a request")]
    CommentRequired,

    #[error("invalid leave type")]
    InvalidLeaveType,

    #[error("employee not found")]
    EmployeeNotFound,

    #[error("request overlaps an existing approved or submitted leave")]
    OverlappingRequest,

    #[error("leave request not found")]
    RequestNotFound,

    #[error("you can only act on your own leave requests")]
    NotOwner,

    #[error("you are not the manager for this request")]
    NotManagerOfRecord,

    #[error("cannot move a {from} request to {to}")]
    InvalidTransition { from: LeaveStatus, to: LeaveStatus },

    #[error("only requests returned for correction can be edited (current status: {status})")]
    NotEditable { status: LeaveStatus },

    #[error("approved requests cannot be cancelled")]
    ApprovedNotCancellable,

    #[error("leave balance not provisioned for {year}; contact an administrator")]
    BalanceNotProvisioned { year: i32 },

    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        available: Decimal,
        requested: Decimal,
    },

    #[error("not enough pending units reserved: pending {pending}, requested {requested}")]
    InsufficientPending {
        pending: Decimal,
        requested: Decimal,
    },

    #[error("approval exceeds entitlement: entitled {entitled}, used after approval {used_after}")]
    EntitlementExceeded {
        entitled: Decimal,
        used_after: Decimal,
    },

    #[error("a concurrent update occurred; please retry")]
    Conflict,

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

/// Coarse classification mirroring how an API layer would map errors to
/// transport codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    State,
    Ledger,
    Conflict,
    Internal,
}

impl LeaveError {
    pub fn kind(&self) -> ErrorKind {
        use LeaveError::*;
        match self {
            InvalidSpan | CrossYearSpan | InvalidHalfDay | NoWorkingDays
            | MissingDoctorNote { .. } | CommentRequired | InvalidLeaveType
            | OverlappingRequest => ErrorKind::Validation,
            EmployeeNotFound | RequestNotFound => ErrorKind::NotFound,
            NotOwner | NotManagerOfRecord => ErrorKind::Forbidden,
            InvalidTransition { .. } | NotEditable { .. } | ApprovedNotCancellable => {
                ErrorKind::State
            }
            BalanceNotProvisioned { .. }
            | InsufficientBalance { .. }
            | InsufficientPending { .. }
            | EntitlementExceeded { .. } => ErrorKind::Ledger,
            Conflict => ErrorKind::Conflict,
            Database(_) | Internal(_) => ErrorKind::Internal,
        }
    }

    /// True for transient failures the caller may safely retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LeaveError::Conflict)
    }
}

impl From<sqlx::Error> for LeaveError {
    fn from(e: sqlx::Error) -> Self {
        // Serialization failures and deadlocks surface as retryable conflicts
        // so the losing side of a ledger race can re-run the use case.
        if let Some(db) = e.as_database_error() {
            if let Some(code) = db.code() {
                if code == "40001" || code == "40P01" {
                    return LeaveError::Conflict;
                }
            }
        }
        LeaveError::Database(e)
    }
}

pub type LeaveResult<T> = Result<T, LeaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_the_only_retryable_kind() {
        assert!(LeaveError::Conflict.is_retryable());
        assert!(!LeaveError::InvalidSpan.is_retryable());
        assert!(!LeaveError::BalanceNotProvisioned { year: 2026 }.is_retryable());
    }

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(LeaveError::InvalidHalfDay.kind(), ErrorKind::Validation);
        assert_eq!(LeaveError::NotOwner.kind(), ErrorKind::Forbidden);
        assert_eq!(
            LeaveError::InsufficientPending {
                pending: Decimal::ZERO,
                requested: Decimal::ONE,
            }
            .kind(),
            ErrorKind::Ledger
        );
    }
}
