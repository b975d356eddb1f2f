use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LeaveError, LeaveResult};

/// Identity of one ledger row: (employee, leave-type-or-null, year). A null
/// leave type tracks a single aggregate bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BalanceKey {
    pub employee_id: Uuid,
    pub leave_type_id: Option<Uuid>,
    pub year: i32,
}

impl BalanceKey {
    pub fn new(employee_id: Uuid, leave_type_id: Option<Uuid>, year: i32) -> Self {
        Self {
            employee_id,
            leave_type_id,
            year,
        }
    }
}

/// One ledger row of entitled/used/pending days. Mutated exclusively through
/// the operations below, which preserve `entitled >= used + pending` and keep
/// both counters non-negative.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveBalance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type_id: Option<Uuid>,
    pub year: i32,
    pub entitled_days: Decimal,
    pub used_days: Decimal,
    pub pending_days: Decimal,
}

impl LeaveBalance {
    /// A fresh row with nothing used or reserved, as created by the
    /// provisioner.
    pub fn provisioned(
        employee_id: Uuid,
        leave_type_id: Option<Uuid>,
        year: i32,
        entitled_days: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id,
            leave_type_id,
            year,
            entitled_days,
            used_days: Decimal::ZERO,
            pending_days: Decimal::ZERO,
        }
    }

    pub fn key(&self) -> BalanceKey {
        BalanceKey::new(self.employee_id, self.leave_type_id, self.year)
    }

    pub fn available(&self) -> Decimal {
        self.entitled_days - self.used_days - self.pending_days
    }

    /// Reserve `units` against the allowance (pending += units). Fails when
    /// the remaining availability does not cover the request.
    pub fn reserve(&mut self, units: Decimal) -> LeaveResult<()> {
        if units <= Decimal::ZERO {
            return Err(LeaveError::NoWorkingDays);
        }
        let available = self.available();
        if available < units {
            return Err(LeaveError::InsufficientBalance {
                available,
                requested: units,
            });
        }
        self.pending_days += units;
        Ok(())
    }

    /// Pure validation that an approval of `units` is possible: enough must
    /// be reserved, and consuming it must not exceed the entitlement.
    pub fn ensure_can_approve(&self, units: Decimal) -> LeaveResult<()> {
        if units <= Decimal::ZERO {
            return Err(LeaveError::NoWorkingDays);
        }
        if self.pending_days < units {
            return Err(LeaveError::InsufficientPending {
                pending: self.pending_days,
                requested: units,
            });
        }
        let used_after = self.used_days + units;
        if used_after > self.entitled_days {
            return Err(LeaveError::EntitlementExceeded {
                entitled: self.entitled_days,
                used_after,
            });
        }
        Ok(())
    }

    /// Move `units` from pending to used. Validated; runs under the same
    /// transaction as the status change.
    pub fn consume(&mut self, units: Decimal) -> LeaveResult<()> {
        self.ensure_can_approve(units)?;
        self.pending_days -= units;
        self.used_days += units;
        Ok(())
    }

    /// Release a pending reservation, floored at zero to absorb drift from
    /// any prior partial corrections. Never fails.
    pub fn release(&mut self, units: Decimal) {
        self.pending_days = (self.pending_days - units).max(Decimal::ZERO);
    }

    /// The ledger invariant checked by tests after every mutation.
    pub fn holds_invariant(&self) -> bool {
        self.used_days >= Decimal::ZERO
            && self.pending_days >= Decimal::ZERO
            && self.entitled_days >= self.used_days + self.pending_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bucket(entitled: Decimal) -> LeaveBalance {
        LeaveBalance::provisioned(Uuid::new_v4(), Some(Uuid::new_v4()), 2026, entitled)
    }

    #[test]
    fn reserve_then_consume_keeps_invariant() {
        let mut b = bucket(dec!(10));
        b.reserve(dec!(3)).unwrap();
        assert_eq!(b.pending_days, dec!(3));
        assert!(b.holds_invariant());

        b.consume(dec!(3)).unwrap();
        assert_eq!(b.pending_days, dec!(0));
        assert_eq!(b.used_days, dec!(3));
        assert_eq!(b.available(), dec!(7));
        assert!(b.holds_invariant());
    }

    #[test]
    fn reserve_rejects_more_than_available() {
        let mut b = bucket(dec!(10));
        b.used_days = dec!(3);
        let err = b.reserve(dec!(8)).unwrap_err();
        match err {
            LeaveError::InsufficientBalance {
                available,
                requested,
            } => {
                assert_eq!(available, dec!(7));
                assert_eq!(requested, dec!(8));
            }
            other => panic!("unexpected error: {other}"),
        }
        // Failed reservation leaves the row untouched.
        assert_eq!(b.pending_days, dec!(0));
        assert!(b.holds_invariant());
    }

    #[test]
    fn half_day_reservation() {
        let mut b = bucket(dec!(1));
        b.reserve(dec!(0.5)).unwrap();
        b.reserve(dec!(0.5)).unwrap();
        assert_eq!(b.available(), dec!(0));
        assert!(b.reserve(dec!(0.5)).is_err());
    }

    #[test]
    fn approve_needs_a_reservation() {
        let b = bucket(dec!(10));
        assert!(matches!(
            b.ensure_can_approve(dec!(1)),
            Err(LeaveError::InsufficientPending { .. })
        ));
    }

    #[test]
    fn approve_cannot_exceed_entitlement() {
        let mut b = bucket(dec!(5));
        b.used_days = dec!(4);
        // Pending drifted above what entitlement still covers.
        b.pending_days = dec!(1);
        assert!(b.ensure_can_approve(dec!(1)).is_ok());
        b.used_days = dec!(5);
        assert!(matches!(
            b.ensure_can_approve(dec!(1)),
            Err(LeaveError::EntitlementExceeded { .. })
        ));
    }

    #[test]
    fn release_floors_at_zero() {
        let mut b = bucket(dec!(10));
        b.reserve(dec!(2)).unwrap();
        b.release(dec!(5));
        assert_eq!(b.pending_days, dec!(0));
        assert!(b.holds_invariant());
    }
}
