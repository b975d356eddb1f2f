use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of the employee record the leave core needs: identity, the
/// current manager for authorization fallback, and contact details for
/// notifications.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub manager_id: Option<Uuid>,
    pub is_active: bool,
}

impl Employee {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
