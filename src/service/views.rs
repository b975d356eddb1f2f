//! Derived read models: balance snapshots, request lists, status counts,
//! and request detail views. All are rebuildable from the ledger and
//! request tables and cached with a short TTL.

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::keys;
use crate::error::LeaveResult;
use crate::models::{LeaveApprovalEvent, LeaveRequest, LeaveStatus, LeaveType};

use super::LeaveService;

/// Aggregated view over an employee's ledger rows for one year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub employee_id: Uuid,
    pub year: i32,
    pub leave_type_id: Option<Uuid>,
    pub entitled_days: Decimal,
    pub used_days: Decimal,
    pub pending_days: Decimal,
    pub available_days: Decimal,
}

/// Per-status request counts for an employee's dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveCounts {
    pub submitted: i64,
    pub returned: i64,
    pub approved: i64,
    pub cancelled: i64,
}

/// Full detail view of one request, with its audit trail and a fetchable
/// doctor's-note URL when an attachment is on file.
#[derive(Debug, Clone)]
pub struct RequestDetails {
    pub request: LeaveRequest,
    pub events: Vec<LeaveApprovalEvent>,
    pub doctor_note_url: Option<String>,
}

impl LeaveService {
    /// Aggregate the employee's ledger rows for a year. The all-types
    /// aggregate is cached; per-type filters read through.
    pub async fn balance_snapshot(
        &self,
        employee_id: Uuid,
        leave_type_id: Option<Uuid>,
        year: Option<i32>,
    ) -> LeaveResult<BalanceSnapshot> {
        let year = year.unwrap_or_else(|| Utc::now().date_naive().year());

        let cache_key = keys::balance(employee_id, year);
        if leave_type_id.is_none() {
            if let Some(hit) = self.cache.get_json::<BalanceSnapshot>(&cache_key).await {
                return Ok(hit);
            }
        }

        let rows = self.store.balances_for_year(employee_id, year).await?;
        let mut snapshot = BalanceSnapshot {
            employee_id,
            year,
            leave_type_id,
            entitled_days: Decimal::ZERO,
            used_days: Decimal::ZERO,
            pending_days: Decimal::ZERO,
            available_days: Decimal::ZERO,
        };
        for row in rows
            .iter()
            .filter(|b| leave_type_id.is_none() || b.leave_type_id == leave_type_id)
        {
            snapshot.entitled_days += row.entitled_days;
            snapshot.used_days += row.used_days;
            snapshot.pending_days += row.pending_days;
        }
        snapshot.available_days =
            snapshot.entitled_days - snapshot.used_days - snapshot.pending_days;

        if leave_type_id.is_none() {
            self.cache.put_json(cache_key, &snapshot).await;
        }
        Ok(snapshot)
    }

    /// Dashboard counts of the employee's requests by status.
    pub async fn my_counts(&self, employee_id: Uuid) -> LeaveResult<LeaveCounts> {
        let cache_key = keys::my_counts(employee_id);
        if let Some(hit) = self.cache.get_json::<LeaveCounts>(&cache_key).await {
            return Ok(hit);
        }

        let mut counts = LeaveCounts::default();
        for (status, n) in self.store.status_counts(employee_id).await? {
            match status {
                LeaveStatus::Submitted => counts.submitted = n,
                LeaveStatus::Returned => counts.returned = n,
                LeaveStatus::Approved => counts.approved = n,
                LeaveStatus::Cancelled => counts.cancelled = n,
                LeaveStatus::Draft => {}
            }
        }

        self.cache.put_json(cache_key, &counts).await;
        Ok(counts)
    }

    /// The employee's own requests, newest first.
    pub async fn my_requests(&self, employee_id: Uuid) -> LeaveResult<Vec<LeaveRequest>> {
        let cache_key = keys::my_list(employee_id);
        if let Some(hit) = self.cache.get_json::<Vec<LeaveRequest>>(&cache_key).await {
            return Ok(hit);
        }

        let requests = self.store.requests_for_employee(employee_id).await?;
        self.cache.put_json(cache_key, &requests).await;
        Ok(requests)
    }

    /// Requests where the manager is the manager-of-record snapshot,
    /// optionally filtered by status. Requests submitted before an employee
    /// was reassigned stay on the old manager's list; the current manager
    /// can still act on them through the detail/approve paths.
    pub async fn team_requests(
        &self,
        manager_id: Uuid,
        status: Option<LeaveStatus>,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        let status_str = status.map(|s| s.to_string());
        let cache_key = keys::team_list(manager_id, status_str.as_deref());
        if let Some(hit) = self.cache.get_json::<Vec<LeaveRequest>>(&cache_key).await {
            return Ok(hit);
        }

        let requests = self.store.requests_for_manager(manager_id, status).await?;
        self.cache.put_json(cache_key, &requests).await;
        Ok(requests)
    }

    /// Detail view for the request's owner.
    pub async fn my_request_details(
        &self,
        employee_id: Uuid,
        request_id: Uuid,
    ) -> LeaveResult<RequestDetails> {
        let request = self.get_owned_request(request_id, employee_id).await?;
        self.request_details(request).await
    }

    /// Detail view for the request's manager.
    pub async fn team_request_details(
        &self,
        manager_id: Uuid,
        request_id: Uuid,
    ) -> LeaveResult<RequestDetails> {
        let (request, _) = self.get_managed_request(request_id, manager_id).await?;
        self.request_details(request).await
    }

    async fn request_details(&self, request: LeaveRequest) -> LeaveResult<RequestDetails> {
        let events = self.store.events_for_request(request.id).await?;
        let doctor_note_url = match request.doctor_note_attachment_id {
            Some(id) => self.attachments.url(id).await?,
            None => None,
        };
        Ok(RequestDetails {
            request,
            events,
            doctor_note_url,
        })
    }

    /// Leave types open for new requests. Changes rarely; cached under a
    /// global key.
    pub async fn active_leave_types(&self) -> LeaveResult<Vec<LeaveType>> {
        let cache_key = keys::active_leave_types();
        if let Some(hit) = self.cache.get_json::<Vec<LeaveType>>(&cache_key).await {
            return Ok(hit);
        }

        let types = self.store.active_leave_types().await?;
        self.cache.put_json(cache_key, &types).await;
        Ok(types)
    }
}
