//! # Money Module
//!
//! Monetary values as integer cents. No floating point, anywhere.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In the browser: 0.1 + 0.2 = 0.30000000000000004                    │
//! │                                                                     │
//! │  A drawer ledger that must satisfy                                  │
//! │     balance == previous_balance ± amount                            │
//! │  cannot tolerate that. Integer cents make the invariant exact:      │
//! │     5000 + 120000 is 125000, every time, on every machine.          │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database, the API, and all calculations use cents. Only the UI
//! converts to a decimal string for display.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: reconciliation differences and corrections can be
///   negative even though ledger magnitudes never are
/// - **Single-field tuple struct**: zero-cost wrapper over i64
/// - **serde transparent**: serializes as a bare integer on the wire
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is strictly positive.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies by a quantity (line totals).
    ///
    /// ## Example
    /// ```rust
    /// use tillpoint_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(10000); // $100.00
    /// assert_eq!(unit_price.times(2).cents(), 20000);
    /// ```
    #[inline]
    pub const fn times(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a basis-point rate with half-up rounding.
    ///
    /// ## Basis Points
    /// 1 bps = 0.01%, so 1500 bps = 15%. Integer math throughout:
    /// `(cents * bps + 5000) / 10000`, computed in i128 so large taxable
    /// amounts cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use tillpoint_core::money::Money;
    ///
    /// // 1,000,000 cents at 15% = 150,000 cents (spec scenario: a tax
    /// // record with taxable 10000.00 at 15% auto-computes 1500.00)
    /// let taxable = Money::from_cents(1_000_000);
    /// assert_eq!(taxable.percent_bps(1500).cents(), 150_000);
    /// ```
    pub fn percent_bps(&self, bps: u32) -> Money {
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money(cents as i64)
    }

    /// Subtracts, flooring at zero. Used for `total = max(0, subtotal - discount)`.
    #[inline]
    pub const fn saturating_sub_zero(&self, other: Money) -> Money {
        let diff = self.0 - other.0;
        if diff < 0 {
            Money(0)
        } else {
            Money(diff)
        }
    }

    /// Clamps to the inclusive range [lo, hi].
    pub fn clamp_range(&self, lo: Money, hi: Money) -> Money {
        Money(self.0.clamp(lo.0, hi.0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly decimal rendering ("$12.34"). UI display formatting is the
/// front end's job; this exists for logs and test assertions.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cents_roundtrip() {
        let m = Money::from_cents(1099);
        assert_eq!(m.cents(), 1099);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(400);

        assert_eq!((a + b).cents(), 1400);
        assert_eq!((a - b).cents(), 600);
        assert_eq!((-a).cents(), -1000);
        assert_eq!(a.times(3).cents(), 3000);
    }

    #[test]
    fn percent_bps_exact() {
        // 15% of 1,000,000 cents
        assert_eq!(Money::from_cents(1_000_000).percent_bps(1500).cents(), 150_000);
        // 10% of 1000 cents
        assert_eq!(Money::from_cents(1000).percent_bps(1000).cents(), 100);
    }

    #[test]
    fn percent_bps_rounds_half_up() {
        // 8.25% of $10.00 = 82.5 cents, rounds to 83
        assert_eq!(Money::from_cents(1000).percent_bps(825).cents(), 83);
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        let subtotal = Money::from_cents(500);
        let discount = Money::from_cents(800);
        assert_eq!(subtotal.saturating_sub_zero(discount), Money::zero());
        assert_eq!(
            Money::from_cents(800).saturating_sub_zero(Money::from_cents(500)).cents(),
            300
        );
    }

    #[test]
    fn sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
        assert_eq!(Money::from_cents(-550).abs().cents(), 550);
    }
}
