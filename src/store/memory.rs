use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{LeaveError, LeaveResult};
use crate::models::{
    BalanceKey, Employee, LeaveApprovalEvent, LeaveBalance, LeaveRequest, LeaveStatus, LeaveType,
};
use crate::overlap::spans_overlap;

use super::{CommitKind, LeaveStore, LedgerEffect, TransitionCommit};

#[derive(Default)]
struct Inner {
    employees: HashMap<Uuid, Employee>,
    leave_types: HashMap<Uuid, LeaveType>,
    requests: HashMap<Uuid, LeaveRequest>,
    balances: HashMap<(Uuid, Option<Uuid>, i32), LeaveBalance>,
    events: Vec<LeaveApprovalEvent>,
}

/// In-process store with the same transition semantics as `PgStore`: every
/// commit applies the ledger effect, the request snapshot and the audit
/// event under one lock, all-or-nothing. Used by the test suite and by
/// embedded callers that do not need durability.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked mid-write;
        // recover the data rather than cascading the panic.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_employee(&self, employee: Employee) {
        self.lock().employees.insert(employee.id, employee);
    }

    pub fn add_leave_type(&self, leave_type: LeaveType) {
        self.lock().leave_types.insert(leave_type.id, leave_type);
    }

    pub fn seed_balance(&self, balance: LeaveBalance) {
        let key = (balance.employee_id, balance.leave_type_id, balance.year);
        self.lock().balances.insert(key, balance);
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn find_employee(&self, id: Uuid) -> LeaveResult<Option<Employee>> {
        Ok(self.lock().employees.get(&id).cloned())
    }

    async fn leave_type_exists(&self, id: Uuid) -> LeaveResult<bool> {
        Ok(self
            .lock()
            .leave_types
            .get(&id)
            .is_some_and(|t| t.is_active))
    }

    async fn active_leave_types(&self) -> LeaveResult<Vec<LeaveType>> {
        let mut types: Vec<LeaveType> = self
            .lock()
            .leave_types
            .values()
            .filter(|t| t.is_active)
            .cloned()
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn find_request(&self, id: Uuid) -> LeaveResult<Option<LeaveRequest>> {
        Ok(self.lock().requests.get(&id).cloned())
    }

    async fn has_active_overlap(
        &self,
        employee_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude_request_id: Option<Uuid>,
    ) -> LeaveResult<bool> {
        let inner = self.lock();
        Ok(inner.requests.values().any(|r| {
            r.employee_id == employee_id
                && matches!(r.status, LeaveStatus::Approved | LeaveStatus::Submitted)
                && Some(r.id) != exclude_request_id
                && spans_overlap(r.start_date, r.end_date, start, end)
        }))
    }

    async fn find_balance(&self, key: &BalanceKey) -> LeaveResult<Option<LeaveBalance>> {
        Ok(self
            .lock()
            .balances
            .get(&(key.employee_id, key.leave_type_id, key.year))
            .cloned())
    }

    async fn balances_for_year(
        &self,
        employee_id: Uuid,
        year: i32,
    ) -> LeaveResult<Vec<LeaveBalance>> {
        Ok(self
            .lock()
            .balances
            .values()
            .filter(|b| b.employee_id == employee_id && b.year == year)
            .cloned()
            .collect())
    }

    async fn commit_transition(&self, commit: TransitionCommit) -> LeaveResult<()> {
        let mut inner = self.lock();

        // Run the ledger effect on a copy first so a guard failure leaves
        // nothing half-applied.
        let updated_balance = match &commit.ledger {
            Some(effect) => {
                let key = effect.key();
                let map_key = (key.employee_id, key.leave_type_id, key.year);
                let mut balance = inner
                    .balances
                    .get(&map_key)
                    .cloned()
                    .ok_or(LeaveError::BalanceNotProvisioned { year: key.year })?;

                match effect {
                    LedgerEffect::Reserve { units, .. } => balance.reserve(*units)?,
                    LedgerEffect::Consume { units, .. } => balance.consume(*units)?,
                    LedgerEffect::Release { units, .. } => balance.release(*units),
                }
                Some((map_key, balance))
            }
            None => None,
        };

        if commit.kind == CommitKind::Update && !inner.requests.contains_key(&commit.request.id) {
            return Err(LeaveError::RequestNotFound);
        }

        if let Some((map_key, balance)) = updated_balance {
            inner.balances.insert(map_key, balance);
        }
        inner.requests.insert(commit.request.id, commit.request);
        if let Some(event) = commit.event {
            inner.events.push(event);
        }

        Ok(())
    }

    async fn insert_balance_if_absent(&self, balance: LeaveBalance) -> LeaveResult<bool> {
        let mut inner = self.lock();
        let key = (balance.employee_id, balance.leave_type_id, balance.year);
        if inner.balances.contains_key(&key) {
            return Ok(false);
        }
        inner.balances.insert(key, balance);
        Ok(true)
    }

    async fn active_employee_ids(&self) -> LeaveResult<Vec<Uuid>> {
        Ok(self
            .lock()
            .employees
            .values()
            .filter(|e| e.is_active)
            .map(|e| e.id)
            .collect())
    }

    async fn requests_for_employee(&self, employee_id: Uuid) -> LeaveResult<Vec<LeaveRequest>> {
        let mut rows: Vec<LeaveRequest> = self
            .lock()
            .requests
            .values()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }

    async fn requests_for_manager(
        &self,
        manager_id: Uuid,
        status: Option<LeaveStatus>,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        let mut rows: Vec<LeaveRequest> = self
            .lock()
            .requests
            .values()
            .filter(|r| r.manager_id == Some(manager_id))
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }

    async fn status_counts(&self, employee_id: Uuid) -> LeaveResult<Vec<(LeaveStatus, i64)>> {
        let inner = self.lock();
        let mut counts: HashMap<LeaveStatus, i64> = HashMap::new();
        for r in inner.requests.values() {
            if r.employee_id == employee_id {
                *counts.entry(r.status).or_default() += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }

    async fn events_for_request(
        &self,
        request_id: Uuid,
    ) -> LeaveResult<Vec<LeaveApprovalEvent>> {
        Ok(self
            .lock()
            .events
            .iter()
            .filter(|e| e.leave_request_id == request_id)
            .cloned()
            .collect())
    }
}
