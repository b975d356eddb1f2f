use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A leave category (annual, sick, ...) with its yearly allowance. The
/// provisioner creates one ledger row per active type per employee per year.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveType {
    pub id: Uuid,
    pub name: String,
    pub annual_entitlement: Decimal,
    pub is_active: bool,
}
