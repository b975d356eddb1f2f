//! Yearly entitlement provisioning. Ledger rows are only ever created here
//! (and seeded in tests); the lifecycle transactions refuse to run against
//! an unprovisioned year rather than inventing a row mid-request.

use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::error::LeaveResult;
use crate::models::LeaveBalance;
use crate::store::LeaveStore;

/// Which buckets to create and how many days each grants.
#[derive(Debug, Clone, Default)]
pub struct EntitlementPlan {
    entries: Vec<(Option<Uuid>, Decimal)>,
}

impl EntitlementPlan {
    /// One bucket per active leave type, using each type's own allowance.
    pub fn from_leave_types(types: &[crate::models::LeaveType]) -> Self {
        Self {
            entries: types
                .iter()
                .filter(|t| t.is_active)
                .map(|t| (Some(t.id), t.annual_entitlement))
                .collect(),
        }
    }

    pub fn with_bucket(mut self, leave_type_id: Option<Uuid>, entitled_days: Decimal) -> Self {
        self.entries.push((leave_type_id, entitled_days));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of one provisioning run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvisionSummary {
    pub created: usize,
    pub skipped: usize,
}

/// Create the year's ledger rows for every active employee. Idempotent:
/// rows that already exist are left untouched and counted as skipped, so
/// re-running after a partial failure finishes the job without resetting
/// anyone's balance.
pub async fn provision_year(
    store: &dyn LeaveStore,
    year: i32,
    plan: &EntitlementPlan,
) -> LeaveResult<ProvisionSummary> {
    let employees = store.active_employee_ids().await?;
    let mut summary = ProvisionSummary::default();

    for employee_id in employees {
        for (leave_type_id, entitled_days) in &plan.entries {
            let row = LeaveBalance::provisioned(employee_id, *leave_type_id, year, *entitled_days);
            if store.insert_balance_if_absent(row).await? {
                summary.created += 1;
            } else {
                summary.skipped += 1;
            }
        }
    }

    info!(
        year,
        created = summary.created,
        skipped = summary.skipped,
        "entitlement provisioning finished"
    );
    Ok(summary)
}
