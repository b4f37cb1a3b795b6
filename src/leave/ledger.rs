//! The leave balance ledger.
//!
//! Balances are read by anyone but changed only by [`debit`], which the
//! approval engine calls in the same transaction that finalizes a request.

use rust_decimal::Decimal;

use crate::error::{HrError, HrResult};
use crate::models::LeaveBalance;
use crate::store::Tx;

/// Looks up a balance row, failing with `BalanceNotFound` if absent.
///
/// # Example
///
/// ```
/// use hr_backoffice::leave::ledger;
/// use hr_backoffice::models::LeaveBalance;
/// use hr_backoffice::store::Store;
/// use rust_decimal::Decimal;
///
/// let store = Store::open_in_memory()?;
/// store.write(|tx| {
///     tx.insert_balance(&LeaveBalance::allot("EMP001", "casual", 2026, Decimal::new(12, 0)))
/// })?;
///
/// let balance = store.read(|tx| ledger::get(tx, "EMP001", "casual", 2026))?;
/// assert_eq!(balance.remaining, Decimal::new(12, 0));
///
/// let missing = store.read(|tx| ledger::get(tx, "EMP001", "sick", 2026));
/// assert_eq!(missing.unwrap_err().code(), "BALANCE_NOT_FOUND");
/// # Ok::<(), hr_backoffice::error::HrError>(())
/// ```
pub fn get(tx: &Tx<'_>, emp_id: &str, leave_type: &str, year: i32) -> HrResult<LeaveBalance> {
    tx.balance(emp_id, leave_type, year)?
        .ok_or_else(|| HrError::BalanceNotFound {
            emp_id: emp_id.to_string(),
            leave_type: leave_type.to_string(),
            year,
        })
}

/// Fails with `InsufficientBalance` unless `balance` covers `days`.
pub fn ensure_covers(balance: &LeaveBalance, days: Decimal) -> HrResult<()> {
    if balance.remaining < days {
        return Err(HrError::InsufficientBalance {
            emp_id: balance.emp_id.clone(),
            leave_type: balance.leave_type.clone(),
            requested: days,
            remaining: balance.remaining,
        });
    }
    Ok(())
}

/// Charges `days` against a balance: `used += days`, `remaining -= days`.
///
/// Fails with `InsufficientBalance` rather than letting `remaining` go
/// negative, which rolls back the enclosing transaction.
pub(crate) fn debit(
    tx: &Tx<'_>,
    emp_id: &str,
    leave_type: &str,
    year: i32,
    days: Decimal,
) -> HrResult<LeaveBalance> {
    if days <= Decimal::ZERO {
        return Err(HrError::internal(format!("non-positive debit of {} days", days)));
    }
    let mut balance = get(tx, emp_id, leave_type, year)?;
    ensure_covers(&balance, days)?;

    balance.used += days;
    balance.remaining -= days;
    if !balance.is_consistent() {
        return Err(HrError::internal(format!(
            "balance {}/{}/{} inconsistent after debit",
            emp_id, leave_type, year
        )));
    }
    if tx.update_balance_usage(&balance)? != 1 {
        return Err(HrError::internal("balance row vanished during debit"));
    }
    Ok(balance)
}
