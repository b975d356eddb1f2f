pub mod employee;
pub mod manager;
pub mod views;

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::cache::{keys, ViewCache};
use crate::calendar::BusinessCalendar;
use crate::config::LeaveRules;
use crate::error::{LeaveError, LeaveResult};
use crate::files::AttachmentStore;
use crate::models::{Employee, LeaveRequest, LeaveUnit};
use crate::notify::{LeaveNotice, NotificationSender};
use crate::policy;
use crate::span;
use crate::store::LeaveStore;

pub use views::{BalanceSnapshot, LeaveCounts, RequestDetails};

/// The leave-request state machine: sequences the calendar/span/note/overlap
/// guards, hands the ledger effect plus status change plus audit row to the
/// store as one atomic commit, then invalidates derived read caches and
/// fires notifications best-effort.
pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
    calendar: BusinessCalendar,
    rules: LeaveRules,
    cache: ViewCache,
    notifier: Arc<dyn NotificationSender>,
    attachments: Arc<dyn AttachmentStore>,
}

/// Submit a new request for the calling employee.
#[derive(Debug, Clone)]
pub struct SubmitLeave {
    pub employee_id: Uuid,
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub unit: LeaveUnit,
    pub doctor_note_attachment_id: Option<Uuid>,
    pub comment: Option<String>,
}

/// Rework a request that was returned for correction. Only legal while the
/// request is Returned and only for its owner.
#[derive(Debug, Clone)]
pub struct EditLeave {
    pub employee_id: Uuid,
    pub request_id: Uuid,
    pub leave_type_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub unit: LeaveUnit,
    pub doctor_note_attachment_id: Option<Uuid>,
    pub comment: Option<String>,
}

/// Send a corrected request back through approval.
#[derive(Debug, Clone)]
pub struct ResubmitLeave {
    pub employee_id: Uuid,
    pub request_id: Uuid,
    pub doctor_note_attachment_id: Option<Uuid>,
    pub comment: Option<String>,
}

/// What the caller gets back from submit/edit/resubmit.
#[derive(Debug, Clone)]
pub struct LeaveReceipt {
    pub request_id: Uuid,
    pub units: Decimal,
    pub requires_doctor_note: bool,
}

impl LeaveService {
    pub fn new(
        store: Arc<dyn LeaveStore>,
        calendar: BusinessCalendar,
        rules: LeaveRules,
        cache: ViewCache,
        notifier: Arc<dyn NotificationSender>,
        attachments: Arc<dyn AttachmentStore>,
    ) -> Self {
        Self {
            store,
            calendar,
            rules,
            cache,
            notifier,
            attachments,
        }
    }

    // ---- shared guards -------------------------------------------------

    /// Balances are kept per year; reject reversed and cross-year spans
    /// before anything else looks at the dates.
    fn validate_span_dates(start: NaiveDate, end: NaiveDate) -> LeaveResult<()> {
        if end < start {
            return Err(LeaveError::InvalidSpan);
        }
        if start.year() != end.year() {
            return Err(LeaveError::CrossYearSpan);
        }
        Ok(())
    }

    /// Recompute the unit cost of a span and reject spans worth nothing.
    fn checked_units(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        unit: LeaveUnit,
    ) -> LeaveResult<Decimal> {
        let units = span::compute_units(&self.calendar, start, end, unit)?;
        if units <= Decimal::ZERO {
            return Err(LeaveError::NoWorkingDays);
        }
        Ok(units)
    }

    /// Apply the doctor's-note policy; returns whether a note is required.
    fn ensure_note_satisfied(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        unit: LeaveUnit,
        attachment_id: Option<Uuid>,
    ) -> LeaveResult<bool> {
        let threshold = self.rules.doctor_note_threshold_days;
        let required = policy::requires_doctor_note(&self.calendar, start, end, unit, threshold);
        if required && attachment_id.is_none() {
            return Err(LeaveError::MissingDoctorNote { threshold });
        }
        Ok(required)
    }

    async fn get_request(&self, id: Uuid) -> LeaveResult<LeaveRequest> {
        self.store
            .find_request(id)
            .await?
            .ok_or(LeaveError::RequestNotFound)
    }

    async fn get_employee(&self, id: Uuid) -> LeaveResult<Employee> {
        self.store
            .find_employee(id)
            .await?
            .ok_or(LeaveError::EmployeeNotFound)
    }

    async fn get_owned_request(
        &self,
        request_id: Uuid,
        employee_id: Uuid,
    ) -> LeaveResult<LeaveRequest> {
        let request = self.get_request(request_id).await?;
        if request.employee_id != employee_id {
            return Err(LeaveError::NotOwner);
        }
        Ok(request)
    }

    /// Load a request for a manager action. The caller must be the
    /// manager-of-record snapshot or the employee's current manager.
    async fn get_managed_request(
        &self,
        request_id: Uuid,
        manager_id: Uuid,
    ) -> LeaveResult<(LeaveRequest, Employee)> {
        let request = self.get_request(request_id).await?;
        let employee = self.get_employee(request.employee_id).await?;
        if !request.is_managed_by(manager_id, employee.manager_id) {
            return Err(LeaveError::NotManagerOfRecord);
        }
        Ok((request, employee))
    }

    // ---- post-commit plumbing -----------------------------------------

    /// Best-effort invalidation of the employee's derived views. Runs after
    /// the transaction committed; a stale cache is tolerable, a failed
    /// transition is not, so nothing here can fail the caller.
    async fn bust_employee_views(&self, employee_id: Uuid, year: i32) {
        self.cache.remove(&keys::balance(employee_id, year)).await;
        self.cache.invalidate_prefix(keys::my_tag(employee_id));
    }

    fn bust_manager_views(&self, manager_id: Option<Uuid>) {
        if let Some(id) = manager_id {
            self.cache.invalidate_prefix(keys::team_tag(id));
        }
    }

    /// Fire-and-forget notification dispatch.
    fn notify_later(&self, notice: LeaveNotice) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.send(notice).await {
                tracing::warn!(error = %e, "leave notification failed");
            }
        });
    }
}
