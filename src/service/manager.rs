//! Manager-initiated transitions: approve, return for correction, and
//! administrative cancel.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::error::{LeaveError, LeaveResult};
use crate::models::{BalanceKey, LeaveAction, LeaveApprovalEvent, LeaveStatus};
use crate::notify::LeaveNotice;
use crate::overlap;
use crate::store::{CommitKind, LedgerEffect, TransitionCommit};

use super::LeaveService;

impl LeaveService {
    /// Approve a submitted request, moving its units from pending to used.
    ///
    /// The unit cost is recomputed from the span at approval time and the
    /// stored snapshot refreshed with it, so a calendar change between
    /// submission and approval cannot consume a stale figure. Returns the
    /// units consumed.
    pub async fn approve(&self, manager_id: Uuid, request_id: Uuid) -> LeaveResult<Decimal> {
        let (mut request, employee) = self.get_managed_request(request_id, manager_id).await?;
        request.status.ensure_can_become(LeaveStatus::Approved)?;

        let units = self.checked_units(request.start_date, request.end_date, request.unit)?;
        overlap::ensure_no_overlap(
            self.store.as_ref(),
            request.employee_id,
            request.start_date,
            request.end_date,
            Some(request.id),
        )
        .await?;

        let year = request.year();
        let key = BalanceKey {
            employee_id: request.employee_id,
            leave_type_id: Some(request.leave_type_id),
            year,
        };
        let employee_id = request.employee_id;
        let start = request.start_date;
        let end = request.end_date;

        request.days_requested = units;
        request.status = LeaveStatus::Approved;
        request.finalized_at = Some(Utc::now());

        let event = LeaveApprovalEvent::record(
            request.id,
            LeaveAction::Approved,
            manager_id,
            None,
        );

        self.store
            .commit_transition(TransitionCommit {
                kind: CommitKind::Update,
                request,
                ledger: Some(LedgerEffect::Consume { key, units }),
                event: Some(event),
            })
            .await?;

        self.bust_employee_views(employee_id, year).await;
        self.bust_manager_views(Some(manager_id));

        self.notify_later(LeaveNotice {
            to_email: employee.email.clone(),
            subject: "Your leave request has been approved".to_string(),
            body: format!(
                "Hi {}, your leave from {start} to {end} has been approved.",
                employee.display_name()
            ),
        });

        info!(%request_id, manager = %manager_id, %units, "leave request approved");
        Ok(units)
    }

    /// Send a submitted request back to the employee for correction. The
    /// comment is mandatory so the employee knows what to fix; the pending
    /// reservation is released.
    pub async fn return_for_correction(
        &self,
        manager_id: Uuid,
        request_id: Uuid,
        comment: String,
    ) -> LeaveResult<()> {
        let comment = comment.trim().to_string();
        if comment.is_empty() {
            return Err(LeaveError::CommentRequired);
        }

        let (mut request, employee) = self.get_managed_request(request_id, manager_id).await?;
        request.status.ensure_can_become(LeaveStatus::Returned)?;

        let year = request.year();
        let employee_id = request.employee_id;
        let ledger = LedgerEffect::Release {
            key: BalanceKey {
                employee_id,
                leave_type_id: Some(request.leave_type_id),
                year,
            },
            units: request.days_requested,
        };

        request.status = LeaveStatus::Returned;
        request.manager_comment = Some(comment.clone());

        let event = LeaveApprovalEvent::record(
            request.id,
            LeaveAction::Returned,
            manager_id,
            Some(comment.clone()),
        );

        self.store
            .commit_transition(TransitionCommit {
                kind: CommitKind::Update,
                request,
                ledger: Some(ledger),
                event: Some(event),
            })
            .await?;

        self.bust_employee_views(employee_id, year).await;
        self.bust_manager_views(Some(manager_id));

        self.notify_later(LeaveNotice {
            to_email: employee.email.clone(),
            subject: "Your leave request needs correction".to_string(),
            body: format!(
                "Hi {}, your leave request was returned with the note: {comment}",
                employee.display_name()
            ),
        });

        info!(%request_id, manager = %manager_id, "leave request returned for correction");
        Ok(())
    }

    /// Cancel a team member's submitted or returned request. Mirrors the
    /// employee-side cancel, including idempotence on already-cancelled
    /// requests and refusal to touch approved ones.
    pub async fn cancel_for_employee(
        &self,
        manager_id: Uuid,
        request_id: Uuid,
    ) -> LeaveResult<()> {
        let (mut request, employee) = self.get_managed_request(request_id, manager_id).await?;

        if request.status == LeaveStatus::Cancelled {
            return Ok(());
        }
        if request.status == LeaveStatus::Approved {
            return Err(LeaveError::ApprovedNotCancellable);
        }
        request.status.ensure_can_become(LeaveStatus::Cancelled)?;

        let ledger = (request.status == LeaveStatus::Submitted).then(|| LedgerEffect::Release {
            key: BalanceKey {
                employee_id: request.employee_id,
                leave_type_id: Some(request.leave_type_id),
                year: request.year(),
            },
            units: request.days_requested,
        });

        let year = request.year();
        let employee_id = request.employee_id;
        let start = request.start_date;
        let end = request.end_date;
        request.status = LeaveStatus::Cancelled;
        request.manager_comment = Some("Cancelled by manager.".to_string());
        request.finalized_at = Some(Utc::now());

        let event = LeaveApprovalEvent::record(
            request.id,
            LeaveAction::Cancelled,
            manager_id,
            Some("Cancelled by manager.".to_string()),
        );

        self.store
            .commit_transition(TransitionCommit {
                kind: CommitKind::Update,
                request,
                ledger,
                event: Some(event),
            })
            .await?;

        self.bust_employee_views(employee_id, year).await;
        self.bust_manager_views(Some(manager_id));

        self.notify_later(LeaveNotice {
            to_email: employee.email.clone(),
            subject: "Your leave request was cancelled".to_string(),
            body: format!(
                "Hi {}, your leave request from {start} to {end} was cancelled by your manager.",
                employee.display_name()
            ),
        });

        info!(%request_id, manager = %manager_id, "leave request cancelled by manager");
        Ok(())
    }
}
