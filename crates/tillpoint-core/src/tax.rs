//! # Tax Rules
//!
//! Pure derivation rules for tax records: amount computation, the
//! paid-amount to payment-status mapping, and payment capping.
//!
//! The tax form applies these rules for responsiveness; the server applies
//! the same functions on receipt, so a client-derived value never persists
//! without re-validation.
//!
//! ## The Three-Way Status Rule
//! ```text
//! paid == 0               → Pending
//! 0 < paid < tax_amount   → PartiallyPaid
//! paid >= tax_amount      → Paid
//! (Exempt is only ever set explicitly, never derived)
//! ```

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::TaxPaymentStatus;

// =============================================================================
// Amount Computation
// =============================================================================

/// Computes the tax owed from a taxable base and a rate in basis points.
///
/// `taxable × rate / 10000`, rounded half up in integer math. The form
/// recomputes this whenever either input changes; the field stays
/// independently editable for manual assessments.
#[inline]
pub fn tax_amount(taxable: Money, rate_bps: u32) -> Money {
    taxable.percent_bps(rate_bps)
}

// =============================================================================
// Status Derivation
// =============================================================================

/// Derives the payment status from amounts.
///
/// Deterministic for every input, including the boundaries
/// `paid == tax_amount` (Paid) and `paid == 0` (Pending).
pub fn derive_payment_status(paid: Money, tax_amount: Money) -> TaxPaymentStatus {
    if paid.cents() <= 0 {
        TaxPaymentStatus::Pending
    } else if paid < tax_amount {
        TaxPaymentStatus::PartiallyPaid
    } else {
        TaxPaymentStatus::Paid
    }
}

/// Fields forced by an explicit status edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEffects {
    pub paid_amount: Money,
    pub payment_date: Option<DateTime<Utc>>,
}

/// Applies an explicit payment-status edit.
///
/// ## Rules
/// - `Paid` forces `paid = tax_amount` and defaults the payment date to
///   `now` when unset
/// - `Pending` and `Exempt` zero the paid amount and clear the date
/// - `PartiallyPaid` keeps the current paid amount, clamped below the tax
///   amount so the choice stays consistent with the three-way rule
pub fn apply_status_change(
    status: TaxPaymentStatus,
    tax_amount: Money,
    current_paid: Money,
    current_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> StatusEffects {
    match status {
        TaxPaymentStatus::Paid => StatusEffects {
            paid_amount: tax_amount,
            payment_date: Some(current_date.unwrap_or(now)),
        },
        TaxPaymentStatus::Pending | TaxPaymentStatus::Exempt => StatusEffects {
            paid_amount: Money::zero(),
            payment_date: None,
        },
        TaxPaymentStatus::PartiallyPaid => StatusEffects {
            paid_amount: current_paid.clamp_range(
                Money::zero(),
                tax_amount.saturating_sub_zero(Money::from_cents(1)),
            ),
            payment_date: current_date,
        },
    }
}

// =============================================================================
// Payment Validation
// =============================================================================

/// Validates a payment against a record's remaining balance.
///
/// Rejected locally, before any network call, whenever the amount is not
/// positive or exceeds `tax_amount − paid`.
pub fn validate_payment(amount: Money, tax_amount: Money, paid: Money) -> CoreResult<()> {
    if !amount.is_positive() {
        return Err(CoreError::Validation(
            crate::error::ValidationError::InvalidAmount {
                field: "payment amount".to_string(),
            },
        ));
    }
    let remaining = tax_amount.saturating_sub_zero(paid);
    if amount > remaining {
        return Err(CoreError::PaymentExceedsRemaining {
            remaining: remaining.cents(),
            requested: amount.cents(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_auto_compute_scenario() {
        // taxable 10000.00 at 15% → 1500.00
        assert_eq!(
            tax_amount(Money::from_cents(1_000_000), 1500).cents(),
            150_000
        );
    }

    #[test]
    fn three_way_status_rule_with_boundaries() {
        let tax = Money::from_cents(150_000);

        assert_eq!(
            derive_payment_status(Money::zero(), tax),
            TaxPaymentStatus::Pending
        );
        assert_eq!(
            derive_payment_status(Money::from_cents(1), tax),
            TaxPaymentStatus::PartiallyPaid
        );
        assert_eq!(
            derive_payment_status(Money::from_cents(149_999), tax),
            TaxPaymentStatus::PartiallyPaid
        );
        // Boundary: paid == tax_amount
        assert_eq!(derive_payment_status(tax, tax), TaxPaymentStatus::Paid);
        // Overpaid still reads as Paid.
        assert_eq!(
            derive_payment_status(Money::from_cents(200_000), tax),
            TaxPaymentStatus::Paid
        );
    }

    #[test]
    fn status_paid_forces_amounts_and_date() {
        let now = Utc::now();
        let effects = apply_status_change(
            TaxPaymentStatus::Paid,
            Money::from_cents(150_000),
            Money::from_cents(50_000),
            None,
            now,
        );
        assert_eq!(effects.paid_amount.cents(), 150_000);
        assert_eq!(effects.payment_date, Some(now));

        // An existing date is preserved.
        let earlier = now - chrono::Duration::days(3);
        let effects = apply_status_change(
            TaxPaymentStatus::Paid,
            Money::from_cents(150_000),
            Money::zero(),
            Some(earlier),
            now,
        );
        assert_eq!(effects.payment_date, Some(earlier));
    }

    #[test]
    fn status_pending_and_exempt_reset() {
        let now = Utc::now();
        for status in [TaxPaymentStatus::Pending, TaxPaymentStatus::Exempt] {
            let effects = apply_status_change(
                status,
                Money::from_cents(150_000),
                Money::from_cents(50_000),
                Some(now),
                now,
            );
            assert!(effects.paid_amount.is_zero());
            assert_eq!(effects.payment_date, None);
        }
    }

    #[test]
    fn payment_capped_at_remaining() {
        let tax = Money::from_cents(150_000);
        let paid = Money::from_cents(100_000);

        assert!(validate_payment(Money::from_cents(50_000), tax, paid).is_ok());

        let err = validate_payment(Money::from_cents(50_001), tax, paid).unwrap_err();
        assert!(matches!(
            err,
            CoreError::PaymentExceedsRemaining {
                remaining: 50_000,
                requested: 50_001
            }
        ));

        assert!(validate_payment(Money::zero(), tax, paid).is_err());
        assert!(validate_payment(Money::from_cents(-5), tax, paid).is_err());
    }
}
