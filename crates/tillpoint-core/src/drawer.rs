//! # Cash Drawer Ledger Rules
//!
//! Pure rules for the append-only cash drawer ledger. The persistence layer
//! calls [`apply_operation`] while holding a write transaction; the client
//! calls the same function to validate a form before any network call.
//!
//! ## The Balance Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Drawer Ledger Invariants                         │
//! │                                                                     │
//! │  entry n:   previous_balance ──┐                                    │
//! │                                ├── balance = previous ± amount      │
//! │             amount ────────────┘                                    │
//! │                                                                     │
//! │  entry n+1: previous_balance == entry n's balance   (no gaps)       │
//! │                                                                     │
//! │  Sign convention:                                                   │
//! │    increase:  add, sale, initialization                             │
//! │    decrease:  remove, expense, close                                │
//! │    absolute:  count (sets balance to the counted amount)            │
//! │                                                                     │
//! │  Period:  initialization ─── add/remove/sale/expense/count ─── close│
//! │           exactly one period open at a time                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `close` pulls the entire remaining balance (end-of-day cash removal), so
//! a freshly closed drawer always sits at zero and the next initialization
//! deposits the opening float.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{DrawerOperation, DrawerTransaction};
use crate::MIN_CASH_OPERATION_CENTS;

// =============================================================================
// Applying an Operation
// =============================================================================

/// The outcome of applying one operation to the chain head.
///
/// `amount` is the normalized magnitude that must be persisted (for `close`
/// it is derived from the previous balance, whatever the caller sent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedOperation {
    pub amount: Money,
    pub balance: Money,
}

/// Validates an operation against the drawer state and computes the new
/// balance.
///
/// ## Arguments
/// * `open` - whether a drawer period is currently open
/// * `previous` - the chain head balance (zero for an empty ledger)
/// * `operation` - the ledger entry kind
/// * `amount` - the submitted magnitude; required for everything but `close`
///
/// ## Rules
/// - `initialization` requires a closed drawer; everything else requires an
///   open one
/// - `add`/`remove` amounts must be at least one cent; this is the
///   validation the operation form runs before any network call
/// - `remove`/`expense` may not overdraw the drawer
/// - `count` sets the balance to the counted amount
/// - `close` ignores any submitted amount and removes the full balance
pub fn apply_operation(
    open: bool,
    previous: Money,
    operation: DrawerOperation,
    amount: Option<Money>,
) -> CoreResult<AppliedOperation> {
    match operation {
        DrawerOperation::Initialization => {
            if open {
                return Err(CoreError::DrawerAlreadyOpen);
            }
        }
        _ => {
            if !open {
                return Err(CoreError::DrawerClosed);
            }
        }
    }

    let require_amount = |op: DrawerOperation| -> CoreResult<Money> {
        amount.ok_or_else(|| CoreError::AmountRequired {
            operation: op.as_str().to_string(),
        })
    };

    match operation {
        DrawerOperation::Add | DrawerOperation::Remove => {
            let amount = require_amount(operation)?;
            if amount.cents() < MIN_CASH_OPERATION_CENTS {
                return Err(CoreError::Validation(
                    crate::error::ValidationError::InvalidAmount {
                        field: "amount".to_string(),
                    },
                ));
            }
            if operation == DrawerOperation::Remove && amount > previous {
                return Err(CoreError::InsufficientFunds {
                    available: previous.cents(),
                    requested: amount.cents(),
                });
            }
            let balance = if operation == DrawerOperation::Add {
                previous + amount
            } else {
                previous - amount
            };
            Ok(AppliedOperation { amount, balance })
        }

        DrawerOperation::Sale => {
            let amount = require_amount(operation)?;
            if amount.is_negative() {
                return Err(CoreError::Validation(
                    crate::error::ValidationError::InvalidAmount {
                        field: "amount".to_string(),
                    },
                ));
            }
            Ok(AppliedOperation {
                amount,
                balance: previous + amount,
            })
        }

        DrawerOperation::Expense => {
            let amount = require_amount(operation)?;
            if !amount.is_positive() {
                return Err(CoreError::Validation(
                    crate::error::ValidationError::InvalidAmount {
                        field: "amount".to_string(),
                    },
                ));
            }
            if amount > previous {
                return Err(CoreError::InsufficientFunds {
                    available: previous.cents(),
                    requested: amount.cents(),
                });
            }
            Ok(AppliedOperation {
                amount,
                balance: previous - amount,
            })
        }

        DrawerOperation::Count => {
            let counted = require_amount(operation)?;
            if counted.is_negative() {
                return Err(CoreError::Validation(
                    crate::error::ValidationError::InvalidAmount {
                        field: "amount".to_string(),
                    },
                ));
            }
            Ok(AppliedOperation {
                amount: counted,
                balance: counted,
            })
        }

        DrawerOperation::Initialization => {
            let float = require_amount(operation)?;
            if float.is_negative() {
                return Err(CoreError::Validation(
                    crate::error::ValidationError::InvalidAmount {
                        field: "amount".to_string(),
                    },
                ));
            }
            Ok(AppliedOperation {
                amount: float,
                balance: previous + float,
            })
        }

        DrawerOperation::Close => Ok(AppliedOperation {
            amount: previous,
            balance: Money::zero(),
        }),
    }
}

/// Whether the ledger is in an open period, given the newest entry's
/// operation. An empty ledger is closed.
#[inline]
pub fn is_open(last_operation: Option<DrawerOperation>) -> bool {
    match last_operation {
        None | Some(DrawerOperation::Close) => false,
        Some(_) => true,
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Expected-vs-actual summary for the current drawer period.
///
/// `expected` is what the drawer should hold given the recorded movements:
/// opening float + manual adds + cash sales − manual removals − cash
/// expenses. `difference` is nonzero only after a `count` correction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Reconciliation {
    pub opening_cents: i64,
    pub added_cents: i64,
    pub cash_sales_cents: i64,
    pub removed_cents: i64,
    pub cash_expenses_cents: i64,
    pub expected_cents: i64,
    pub current_cents: i64,
    pub difference_cents: i64,
}

/// Computes the reconciliation summary for one drawer period.
///
/// ## Arguments
/// * `period` - the period's entries in chronological order, starting at
///   its `initialization`
///
/// The current balance is read off the newest entry, so a `count`
/// correction shows up as a nonzero `difference_cents` rather than being
/// silently absorbed.
pub fn reconcile(period: &[DrawerTransaction]) -> Reconciliation {
    let mut opening = 0i64;
    let mut added = 0i64;
    let mut sales = 0i64;
    let mut removed = 0i64;
    let mut expenses = 0i64;

    for entry in period {
        match entry.operation {
            DrawerOperation::Initialization => opening += entry.amount_cents,
            DrawerOperation::Add => added += entry.amount_cents,
            DrawerOperation::Sale => sales += entry.amount_cents,
            DrawerOperation::Remove => removed += entry.amount_cents,
            DrawerOperation::Expense => expenses += entry.amount_cents,
            // Counts and closes restate the balance; they are not movements.
            DrawerOperation::Count | DrawerOperation::Close => {}
        }
    }

    let expected = opening + added + sales - removed - expenses;
    let current = period.last().map(|e| e.balance_cents).unwrap_or(0);

    Reconciliation {
        opening_cents: opening,
        added_cents: added,
        cash_sales_cents: sales,
        removed_cents: removed,
        cash_expenses_cents: expenses,
        expected_cents: expected,
        current_cents: current,
        difference_cents: current - expected,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(operation: DrawerOperation, amount: i64, previous: i64, balance: i64) -> DrawerTransaction {
        DrawerTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            date: Utc::now(),
            operation,
            amount_cents: amount,
            previous_balance_cents: previous,
            balance_cents: balance,
            notes: None,
            reference_id: None,
        }
    }

    #[test]
    fn add_increases_balance_by_exact_amount() {
        // Spec scenario: add $50.00 with reason "till top-up"
        let applied = apply_operation(
            true,
            Money::from_cents(10_000),
            DrawerOperation::Add,
            Some(Money::from_cents(5_000)),
        )
        .unwrap();
        assert_eq!(applied.amount.cents(), 5_000);
        assert_eq!(applied.balance.cents(), 15_000);
    }

    #[test]
    fn add_and_remove_reject_non_positive_amounts() {
        for amount in [0, -100] {
            let err = apply_operation(
                true,
                Money::from_cents(1_000),
                DrawerOperation::Add,
                Some(Money::from_cents(amount)),
            )
            .unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }
        let err = apply_operation(true, Money::zero(), DrawerOperation::Remove, None).unwrap_err();
        assert!(matches!(err, CoreError::AmountRequired { .. }));
    }

    #[test]
    fn remove_cannot_overdraw() {
        let err = apply_operation(
            true,
            Money::from_cents(5_000),
            DrawerOperation::Remove,
            Some(Money::from_cents(8_000)),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientFunds {
                available: 5_000,
                requested: 8_000
            }
        ));
    }

    #[test]
    fn operations_require_open_drawer() {
        let err = apply_operation(
            false,
            Money::zero(),
            DrawerOperation::Add,
            Some(Money::from_cents(100)),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::DrawerClosed));
    }

    #[test]
    fn initialization_requires_closed_drawer() {
        let err = apply_operation(
            true,
            Money::from_cents(100),
            DrawerOperation::Initialization,
            Some(Money::from_cents(5_000)),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::DrawerAlreadyOpen));

        let applied = apply_operation(
            false,
            Money::zero(),
            DrawerOperation::Initialization,
            Some(Money::from_cents(5_000)),
        )
        .unwrap();
        assert_eq!(applied.balance.cents(), 5_000);
    }

    #[test]
    fn close_pulls_the_full_balance() {
        let applied =
            apply_operation(true, Money::from_cents(12_345), DrawerOperation::Close, None).unwrap();
        assert_eq!(applied.amount.cents(), 12_345);
        assert_eq!(applied.balance.cents(), 0);
    }

    #[test]
    fn count_sets_the_balance() {
        let applied = apply_operation(
            true,
            Money::from_cents(10_000),
            DrawerOperation::Count,
            Some(Money::from_cents(9_900)),
        )
        .unwrap();
        assert_eq!(applied.balance.cents(), 9_900);
    }

    #[test]
    fn open_state_from_last_operation() {
        assert!(!is_open(None));
        assert!(!is_open(Some(DrawerOperation::Close)));
        assert!(is_open(Some(DrawerOperation::Initialization)));
        assert!(is_open(Some(DrawerOperation::Sale)));
    }

    #[test]
    fn reconcile_balanced_period_has_zero_difference() {
        let period = vec![
            entry(DrawerOperation::Initialization, 10_000, 0, 10_000),
            entry(DrawerOperation::Sale, 23_000, 10_000, 33_000),
            entry(DrawerOperation::Expense, 3_000, 33_000, 30_000),
            entry(DrawerOperation::Add, 5_000, 30_000, 35_000),
        ];
        let summary = reconcile(&period);
        assert_eq!(summary.opening_cents, 10_000);
        assert_eq!(summary.cash_sales_cents, 23_000);
        assert_eq!(summary.cash_expenses_cents, 3_000);
        assert_eq!(summary.expected_cents, 35_000);
        assert_eq!(summary.current_cents, 35_000);
        assert_eq!(summary.difference_cents, 0);
    }

    #[test]
    fn reconcile_surfaces_count_corrections() {
        let period = vec![
            entry(DrawerOperation::Initialization, 10_000, 0, 10_000),
            entry(DrawerOperation::Sale, 5_000, 10_000, 15_000),
            // Physical count found 14,900: 100 cents short.
            entry(DrawerOperation::Count, 14_900, 15_000, 14_900),
        ];
        let summary = reconcile(&period);
        assert_eq!(summary.expected_cents, 15_000);
        assert_eq!(summary.current_cents, 14_900);
        assert_eq!(summary.difference_cents, -100);
    }
}
