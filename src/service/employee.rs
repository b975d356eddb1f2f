//! Employee-initiated transitions: submit, edit while returned, resubmit,
//! and cancel.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{LeaveError, LeaveResult};
use crate::models::{BalanceKey, LeaveAction, LeaveApprovalEvent, LeaveRequest, LeaveStatus};
use crate::overlap;
use crate::store::{CommitKind, LedgerEffect, TransitionCommit};

use super::{EditLeave, LeaveReceipt, LeaveService, ResubmitLeave, SubmitLeave};

impl LeaveService {
    /// Create a request and reserve its units in one transaction. The
    /// request lands directly in Submitted with the employee's current
    /// manager captured as manager-of-record.
    pub async fn submit(&self, cmd: SubmitLeave) -> LeaveResult<LeaveReceipt> {
        Self::validate_span_dates(cmd.start_date, cmd.end_date)?;

        let employee = self.get_employee(cmd.employee_id).await?;
        if !self.store.leave_type_exists(cmd.leave_type_id).await? {
            return Err(LeaveError::InvalidLeaveType);
        }

        let units = self.checked_units(cmd.start_date, cmd.end_date, cmd.unit)?;
        let requires_note = self.ensure_note_satisfied(
            cmd.start_date,
            cmd.end_date,
            cmd.unit,
            cmd.doctor_note_attachment_id,
        )?;
        overlap::ensure_no_overlap(
            self.store.as_ref(),
            cmd.employee_id,
            cmd.start_date,
            cmd.end_date,
            None,
        )
        .await?;

        let request = LeaveRequest {
            id: Uuid::new_v4(),
            employee_id: cmd.employee_id,
            leave_type_id: cmd.leave_type_id,
            start_date: cmd.start_date,
            end_date: cmd.end_date,
            unit: cmd.unit,
            days_requested: units,
            status: LeaveStatus::Submitted,
            manager_id: employee.manager_id,
            employee_comment: cmd.comment.clone(),
            manager_comment: None,
            doctor_note_attachment_id: cmd.doctor_note_attachment_id,
            has_doctor_note: cmd.doctor_note_attachment_id.is_some(),
            submitted_at: Utc::now(),
            finalized_at: None,
        };
        let year = request.year();
        let key = BalanceKey {
            employee_id: cmd.employee_id,
            leave_type_id: Some(cmd.leave_type_id),
            year,
        };
        let event = LeaveApprovalEvent::record(
            request.id,
            LeaveAction::Submitted,
            cmd.employee_id,
            cmd.comment,
        );

        let request_id = request.id;
        self.store
            .commit_transition(TransitionCommit {
                kind: CommitKind::Insert,
                request,
                ledger: Some(LedgerEffect::Reserve { key, units }),
                event: Some(event),
            })
            .await?;

        self.bust_employee_views(cmd.employee_id, year).await;
        self.bust_manager_views(employee.manager_id);

        // Best-effort from here on: the transition is already committed.
        if let Some(manager_id) = employee.manager_id {
            if let Ok(Some(manager)) = self.store.find_employee(manager_id).await {
                self.notify_later(crate::notify::LeaveNotice {
                    to_email: manager.email,
                    subject: "New leave request awaiting review".to_string(),
                    body: format!(
                        "{} requested leave from {} to {} ({units} days).",
                        employee.display_name(),
                        cmd.start_date,
                        cmd.end_date
                    ),
                });
            }
        }

        info!(%request_id, employee = %cmd.employee_id, %units, "leave request submitted");
        Ok(LeaveReceipt {
            request_id,
            units,
            requires_doctor_note: requires_note,
        })
    }

    /// Rework a request that was returned for correction. The status stays
    /// Returned, nothing is reserved, and no audit event is appended; the
    /// reservation happens on resubmit.
    pub async fn edit(&self, cmd: EditLeave) -> LeaveResult<LeaveReceipt> {
        Self::validate_span_dates(cmd.start_date, cmd.end_date)?;

        let mut request = self.get_owned_request(cmd.request_id, cmd.employee_id).await?;
        if request.status != LeaveStatus::Returned {
            return Err(LeaveError::NotEditable {
                status: request.status,
            });
        }
        if !self.store.leave_type_exists(cmd.leave_type_id).await? {
            return Err(LeaveError::InvalidLeaveType);
        }

        let units = self.checked_units(cmd.start_date, cmd.end_date, cmd.unit)?;
        let requires_note = self.ensure_note_satisfied(
            cmd.start_date,
            cmd.end_date,
            cmd.unit,
            cmd.doctor_note_attachment_id
                .or(request.doctor_note_attachment_id),
        )?;
        overlap::ensure_no_overlap(
            self.store.as_ref(),
            cmd.employee_id,
            cmd.start_date,
            cmd.end_date,
            Some(request.id),
        )
        .await?;

        request.leave_type_id = cmd.leave_type_id;
        request.start_date = cmd.start_date;
        request.end_date = cmd.end_date;
        request.unit = cmd.unit;
        request.days_requested = units;
        if let Some(attachment) = cmd.doctor_note_attachment_id {
            request.doctor_note_attachment_id = Some(attachment);
        }
        request.has_doctor_note = request.doctor_note_attachment_id.is_some();
        if cmd.comment.is_some() {
            request.employee_comment = cmd.comment;
        }

        let request_id = request.id;
        self.store
            .commit_transition(TransitionCommit {
                kind: CommitKind::Update,
                request,
                ledger: None,
                event: None,
            })
            .await?;

        // The balance was never touched, but cached request lists are stale.
        self.cache
            .invalidate_prefix(crate::cache::keys::my_tag(cmd.employee_id));

        info!(%request_id, employee = %cmd.employee_id, %units, "returned leave request edited");
        Ok(LeaveReceipt {
            request_id,
            units,
            requires_doctor_note: requires_note,
        })
    }

    /// Send a corrected request back through approval, reserving its units
    /// again. Guards are re-run in full: the span, note policy, overlap set,
    /// and balance may all have changed since the original submission.
    pub async fn resubmit(&self, cmd: ResubmitLeave) -> LeaveResult<LeaveReceipt> {
        let mut request = self.get_owned_request(cmd.request_id, cmd.employee_id).await?;
        if request.status != LeaveStatus::Returned {
            return Err(LeaveError::InvalidTransition {
                from: request.status,
                to: LeaveStatus::Submitted,
            });
        }

        Self::validate_span_dates(request.start_date, request.end_date)?;
        let units = self.checked_units(request.start_date, request.end_date, request.unit)?;
        // A note supplied here overrides the one on file; either satisfies
        // the policy.
        let attachment = cmd
            .doctor_note_attachment_id
            .or(request.doctor_note_attachment_id);
        let requires_note = self.ensure_note_satisfied(
            request.start_date,
            request.end_date,
            request.unit,
            attachment,
        )?;
        overlap::ensure_no_overlap(
            self.store.as_ref(),
            cmd.employee_id,
            request.start_date,
            request.end_date,
            Some(request.id),
        )
        .await?;

        request.status.ensure_can_become(LeaveStatus::Submitted)?;
        request.status = LeaveStatus::Submitted;
        request.days_requested = units;
        request.doctor_note_attachment_id = attachment;
        request.has_doctor_note = attachment.is_some();
        if cmd.comment.is_some() {
            request.employee_comment = cmd.comment.clone();
        }
        request.submitted_at = Utc::now();

        let year = request.year();
        let key = BalanceKey {
            employee_id: cmd.employee_id,
            leave_type_id: Some(request.leave_type_id),
            year,
        };
        let manager_id = request.manager_id;
        let event = LeaveApprovalEvent::record(
            request.id,
            LeaveAction::Submitted,
            cmd.employee_id,
            Some(
                cmd.comment
                    .unwrap_or_else(|| "Resubmitted by employee".to_string()),
            ),
        );

        let request_id = request.id;
        self.store
            .commit_transition(TransitionCommit {
                kind: CommitKind::Update,
                request,
                ledger: Some(LedgerEffect::Reserve { key, units }),
                event: Some(event),
            })
            .await?;

        self.bust_employee_views(cmd.employee_id, year).await;
        self.bust_manager_views(manager_id);

        info!(%request_id, employee = %cmd.employee_id, %units, "leave request resubmitted");
        Ok(LeaveReceipt {
            request_id,
            units,
            requires_doctor_note: requires_note,
        })
    }

    /// Cancel the caller's own request. Idempotent on already-cancelled
    /// requests; approved requests are immutable and need an administrative
    /// correction instead.
    pub async fn cancel_own(&self, employee_id: Uuid, request_id: Uuid) -> LeaveResult<()> {
        let mut request = self.get_owned_request(request_id, employee_id).await?;

        if request.status == LeaveStatus::Cancelled {
            return Ok(());
        }
        if request.status == LeaveStatus::Approved {
            return Err(LeaveError::ApprovedNotCancellable);
        }
        request.status.ensure_can_become(LeaveStatus::Cancelled)?;

        // Only a Submitted request holds a reservation; Returned requests
        // already had theirs released.
        let ledger = (request.status == LeaveStatus::Submitted).then(|| LedgerEffect::Release {
            key: BalanceKey {
                employee_id,
                leave_type_id: Some(request.leave_type_id),
                year: request.year(),
            },
            units: request.days_requested,
        });

        let year = request.year();
        let manager_id = request.manager_id;
        request.status = LeaveStatus::Cancelled;
        request.finalized_at = Some(Utc::now());

        let event = LeaveApprovalEvent::record(
            request.id,
            LeaveAction::Cancelled,
            employee_id,
            Some("Cancelled by employee".to_string()),
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
        self.bust_manager_views(manager_id);

        info!(%request_id, employee = %employee_id, "leave request cancelled by employee");
        Ok(())
    }
}
