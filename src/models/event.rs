use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LeaveAction;

/// Immutable audit-trail entry: one row per lifecycle transition, append-only,
/// never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveApprovalEvent {
    pub id: Uuid,
    pub leave_request_id: Uuid,
    pub action: LeaveAction,
    pub actor_employee_id: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LeaveApprovalEvent {
    pub fn record(
        leave_request_id: Uuid,
        action: LeaveAction,
        actor_employee_id: Uuid,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            leave_request_id,
            action,
            actor_employee_id,
            note,
            created_at: Utc::now(),
        }
    }
}
