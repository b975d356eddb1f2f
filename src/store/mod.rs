pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::LeaveResult;
use crate::models::{
    BalanceKey, Employee, LeaveApprovalEvent, LeaveBalance, LeaveRequest, LeaveStatus, LeaveType,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Ledger mutation applied inside a transition's transaction. The balance
/// row named by the key is the serialization point: implementations must
/// lock it (or equivalent) so two concurrent effects against the same row
/// cannot both observe a stale availability.
#[derive(Debug, Clone)]
pub enum LedgerEffect {
    /// pending += units, with availability check.
    Reserve { key: BalanceKey, units: Decimal },
    /// pending -= units, used += units, validated (approve).
    Consume { key: BalanceKey, units: Decimal },
    /// pending -= units, floored at zero (return/cancel).
    Release { key: BalanceKey, units: Decimal },
}

impl LedgerEffect {
    pub fn key(&self) -> &BalanceKey {
        match self {
            LedgerEffect::Reserve { key, .. }
            | LedgerEffect::Consume { key, .. }
            | LedgerEffect::Release { key, .. } => key,
        }
    }
}

/// Whether the transition creates the request row or rewrites an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    Insert,
    Update,
}

/// One atomic lifecycle transition: the ledger effect (if any), the new
/// request snapshot, and the audit event are applied as a single unit or not
/// at all. Edits while Returned carry no ledger effect and no event.
#[derive(Debug, Clone)]
pub struct TransitionCommit {
    pub kind: CommitKind,
    pub request: LeaveRequest,
    pub ledger: Option<LedgerEffect>,
    pub event: Option<LeaveApprovalEvent>,
}

/// Storage port for the leave core. `PgStore` is the system of record;
/// `MemoryStore` backs the test suite with identical semantics.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn find_employee(&self, id: Uuid) -> LeaveResult<Option<Employee>>;

    async fn leave_type_exists(&self, id: Uuid) -> LeaveResult<bool>;

    async fn active_leave_types(&self) -> LeaveResult<Vec<LeaveType>>;

    async fn find_request(&self, id: Uuid) -> LeaveResult<Option<LeaveRequest>>;

    /// True when any *other* Approved or Submitted request for the employee
    /// intersects `[start, end]` (inclusive on both ends).
    async fn has_active_overlap(
        &self,
        employee_id: Uuid,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
        exclude_request_id: Option<Uuid>,
    ) -> LeaveResult<bool>;

    async fn find_balance(&self, key: &BalanceKey) -> LeaveResult<Option<LeaveBalance>>;

    async fn balances_for_year(&self, employee_id: Uuid, year: i32)
        -> LeaveResult<Vec<LeaveBalance>>;

    /// Apply one transition atomically. No partial ledger mutation may be
    /// observable outside this call, and a failed guard aborts the whole
    /// unit. The request snapshot is persisted in full; a later
    /// `find_request` must return exactly what was committed.
    async fn commit_transition(&self, commit: TransitionCommit) -> LeaveResult<()>;

    /// Insert a fresh ledger row unless one already exists for its key.
    /// Returns true when a row was created. Never touches existing rows;
    /// this is the provisioner's only write path.
    async fn insert_balance_if_absent(&self, balance: LeaveBalance) -> LeaveResult<bool>;

    async fn active_employee_ids(&self) -> LeaveResult<Vec<Uuid>>;

    async fn requests_for_employee(&self, employee_id: Uuid) -> LeaveResult<Vec<LeaveRequest>>;

    async fn requests_for_manager(
        &self,
        manager_id: Uuid,
        status: Option<LeaveStatus>,
    ) -> LeaveResult<Vec<LeaveRequest>>;

    async fn status_counts(&self, employee_id: Uuid) -> LeaveResult<Vec<(LeaveStatus, i64)>>;

    async fn events_for_request(&self, request_id: Uuid)
        -> LeaveResult<Vec<LeaveApprovalEvent>>;
}
