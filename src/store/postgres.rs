use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{LeaveError, LeaveResult};
use crate::models::{
    BalanceKey, Employee, LeaveApprovalEvent, LeaveBalance, LeaveRequest, LeaveStatus, LeaveType,
};

use super::{CommitKind, LeaveStore, LedgerEffect, TransitionCommit};

const REQUEST_COLUMNS: &str = r#"
    id, employee_id, leave_type_id, start_date, end_date, unit,
    days_requested, status, manager_id, employee_comment, manager_comment,
    doctor_note_attachment_id, has_doctor_note, submitted_at, finalized_at
"#;

/// Postgres-backed system of record. The ledger row is serialized with
/// `SELECT ... FOR UPDATE` inside each transition's transaction, so the
/// read-check-write sequence on one (employee, leave-type, year) bucket
/// cannot interleave; serialization failures map to the retryable
/// `Conflict` error in `From<sqlx::Error>`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_balance(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        key: &BalanceKey,
    ) -> LeaveResult<Option<LeaveBalance>> {
        let row = sqlx::query_as::<_, LeaveBalance>(
            r#"
            SELECT id, employee_id, leave_type_id, year,
                   entitled_days, used_days, pending_days
            FROM leave_balances
            WHERE employee_id = $1
              AND leave_type_id IS NOT DISTINCT FROM $2
              AND year = $3
            FOR UPDATE
            "#,
        )
        .bind(key.employee_id)
        .bind(key.leave_type_id)
        .bind(key.year)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row)
    }

    async fn write_balance(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        balance: &LeaveBalance,
    ) -> LeaveResult<()> {
        sqlx::query(
            r#"
            UPDATE leave_balances
            SET used_days = $1, pending_days = $2
            WHERE id = $3
            "#,
        )
        .bind(balance.used_days)
        .bind(balance.pending_days)
        .bind(balance.id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn write_request(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        kind: CommitKind,
        r: &LeaveRequest,
    ) -> LeaveResult<()> {
        match kind {
            CommitKind::Insert => {
                sqlx::query(
                    r#"
                    INSERT INTO leave_requests (
                        id, employee_id, leave_type_id, start_date, end_date, unit,
                        days_requested, status, manager_id, employee_comment,
                        manager_comment, doctor_note_attachment_id, has_doctor_note,
                        submitted_at, finalized_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                    "#,
                )
                .bind(r.id)
                .bind(r.employee_id)
                .bind(r.leave_type_id)
                .bind(r.start_date)
                .bind(r.end_date)
                .bind(r.unit)
                .bind(r.days_requested)
                .bind(r.status)
                .bind(r.manager_id)
                .bind(&r.employee_comment)
                .bind(&r.manager_comment)
                .bind(r.doctor_note_attachment_id)
                .bind(r.has_doctor_note)
                .bind(r.submitted_at)
                .bind(r.finalized_at)
                .execute(&mut **tx)
                .await?;
            }
            CommitKind::Update => {
                let result = sqlx::query(
                    r#"
                    UPDATE leave_requests
                    SET leave_type_id = $2, start_date = $3, end_date = $4, unit = $5,
                        days_requested = $6, status = $7, employee_comment = $8,
                        manager_comment = $9, doctor_note_attachment_id = $10,
                        has_doctor_note = $11, submitted_at = $12, finalized_at = $13
                    WHERE id = $1
                    "#,
                )
                .bind(r.id)
                .bind(r.leave_type_id)
                .bind(r.start_date)
                .bind(r.end_date)
                .bind(r.unit)
                .bind(r.days_requested)
                .bind(r.status)
                .bind(&r.employee_comment)
                .bind(&r.manager_comment)
                .bind(r.doctor_note_attachment_id)
                .bind(r.has_doctor_note)
                .bind(r.submitted_at)
                .bind(r.finalized_at)
                .execute(&mut **tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(LeaveError::RequestNotFound);
                }
            }
        }

        Ok(())
    }

    async fn append_event(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        ev: &LeaveApprovalEvent,
    ) -> LeaveResult<()> {
        sqlx::query(
            r#"
            INSERT INTO leave_approval_events
                (id, leave_request_id, action, actor_employee_id, note, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(ev.id)
        .bind(ev.leave_request_id)
        .bind(ev.action)
        .bind(ev.actor_employee_id)
        .bind(&ev.note)
        .bind(ev.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl LeaveStore for PgStore {
    async fn find_employee(&self, id: Uuid) -> LeaveResult<Option<Employee>> {
        let row = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, first_name, last_name, email, manager_id, is_active
            FROM employees
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn leave_type_exists(&self, id: Uuid) -> LeaveResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM leave_types WHERE id = $1 AND is_active)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn active_leave_types(&self) -> LeaveResult<Vec<LeaveType>> {
        let rows = sqlx::query_as::<_, LeaveType>(
            r#"
            SELECT id, name, annual_entitlement, is_active
            FROM leave_types
            WHERE is_active
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_request(&self, id: Uuid) -> LeaveResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = $1");
        let row = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn has_active_overlap(
        &self,
        employee_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude_request_id: Option<Uuid>,
    ) -> LeaveResult<bool> {
        let overlaps: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM leave_requests
                WHERE employee_id = $1
                  AND status IN ('approved', 'submitted')
                  AND start_date <= $3
                  AND $2 <= end_date
                  AND ($4::uuid IS NULL OR id <> $4)
            )
            "#,
        )
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .bind(exclude_request_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(overlaps)
    }

    async fn find_balance(&self, key: &BalanceKey) -> LeaveResult<Option<LeaveBalance>> {
        let row = sqlx::query_as::<_, LeaveBalance>(
            r#"
            SELECT id, employee_id, leave_type_id, year,
                   entitled_days, used_days, pending_days
            FROM leave_balances
            WHERE employee_id = $1
              AND leave_type_id IS NOT DISTINCT FROM $2
              AND year = $3
            "#,
        )
        .bind(key.employee_id)
        .bind(key.leave_type_id)
        .bind(key.year)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn balances_for_year(
        &self,
        employee_id: Uuid,
        year: i32,
    ) -> LeaveResult<Vec<LeaveBalance>> {
        let rows = sqlx::query_as::<_, LeaveBalance>(
            r#"
            SELECT id, employee_id, leave_type_id, year,
                   entitled_days, used_days, pending_days
            FROM leave_balances
            WHERE employee_id = $1 AND year = $2
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn commit_transition(&self, commit: TransitionCommit) -> LeaveResult<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(effect) = &commit.ledger {
            let key = effect.key();
            let mut balance = Self::lock_balance(&mut tx, key)
                .await?
                .ok_or(LeaveError::BalanceNotProvisioned { year: key.year })?;

            match effect {
                LedgerEffect::Reserve { units, .. } => balance.reserve(*units)?,
                LedgerEffect::Consume { units, .. } => balance.consume(*units)?,
                LedgerEffect::Release { units, .. } => balance.release(*units),
            }

            Self::write_balance(&mut tx, &balance).await?;
        }

        Self::write_request(&mut tx, commit.kind, &commit.request).await?;

        if let Some(event) = &commit.event {
            Self::append_event(&mut tx, event).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert_balance_if_absent(&self, balance: LeaveBalance) -> LeaveResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_balances
                (id, employee_id, leave_type_id, year, entitled_days, used_days, pending_days)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (employee_id, leave_type_id, year) DO NOTHING
            "#,
        )
        .bind(balance.id)
        .bind(balance.employee_id)
        .bind(balance.leave_type_id)
        .bind(balance.year)
        .bind(balance.entitled_days)
        .bind(balance.used_days)
        .bind(balance.pending_days)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn active_employee_ids(&self) -> LeaveResult<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM employees WHERE is_active")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn requests_for_employee(&self, employee_id: Uuid) -> LeaveResult<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests \
             WHERE employee_id = $1 ORDER BY submitted_at DESC"
        );
        let rows = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn requests_for_manager(
        &self,
        manager_id: Uuid,
        status: Option<LeaveStatus>,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        let mut sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE manager_id = $1"
        );
        if status.is_some() {
            sql.push_str(" AND status = $2");
        }
        sql.push_str(" ORDER BY submitted_at DESC");

        let mut query = sqlx::query_as::<_, LeaveRequest>(&sql).bind(manager_id);
        if let Some(status) = status {
            query = query.bind(status);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn status_counts(&self, employee_id: Uuid) -> LeaveResult<Vec<(LeaveStatus, i64)>> {
        let rows: Vec<(LeaveStatus, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*) AS count
            FROM leave_requests
            WHERE employee_id = $1
            GROUP BY status
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn events_for_request(
        &self,
        request_id: Uuid,
    ) -> LeaveResult<Vec<LeaveApprovalEvent>> {
        let rows = sqlx::query_as::<_, LeaveApprovalEvent>(
            r#"
            SELECT id, leave_request_id, action, actor_employee_id, note, created_at
            FROM leave_approval_events
            WHERE leave_request_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
