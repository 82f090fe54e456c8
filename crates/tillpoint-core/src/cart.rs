//! # POS Cart
//!
//! Pure cart math for the checkout screen.
//!
//! ## Cart Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Checkout Math                               │
//! │                                                                     │
//! │  subtotal = Σ unit_price × quantity                                 │
//! │  discount = flat amount, clamped to 0 ..= subtotal                  │
//! │  total    = max(0, subtotal − discount)                             │
//! │  change   = cash_received − total   (requires cash ≥ total)         │
//! │                                                                     │
//! │  Lines are unique per item id; adding the same item again raises    │
//! │  its quantity. Setting a quantity to 0 removes the line, so the     │
//! │  subtotal depends only on the final {id → quantity} map, never on   │
//! │  the order operations happened in.                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart holds frozen price snapshots: a price edit in inventory does
//! not change a line already in the cart.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line in the cart: a frozen item snapshot plus a quantity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    /// Inventory item id (UUID).
    pub item_id: String,

    /// SKU at time of adding (frozen).
    pub sku: String,

    /// Item name at time of adding (frozen).
    pub name: String,

    /// Price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Quantity, always >= 1 while the line exists.
    pub quantity: i64,
}

impl CartLine {
    /// unit price × quantity.
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The checkout cart.
///
/// ## Invariants
/// - Lines are unique by `item_id`
/// - Quantities are 1 ..= [`MAX_LINE_QUANTITY`]
/// - At most [`MAX_CART_LINES`] lines
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds an item or raises the quantity of its existing line.
    pub fn add_item(
        &mut self,
        item_id: &str,
        sku: &str,
        name: &str,
        unit_price_cents: i64,
        quantity: i64,
    ) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(CoreError::Validation(
                crate::error::ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                },
            ));
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item_id) {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge { max: MAX_CART_LINES });
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        self.lines.push(CartLine {
            item_id: item_id.to_string(),
            sku: sku.to_string(),
            name: name.to_string(),
            unit_price_cents,
            quantity,
        });
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, item_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_line(item_id);
        }
        if quantity < 0 {
            return Err(CoreError::Validation(
                crate::error::ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                },
            ));
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        match self.lines.iter_mut().find(|l| l.item_id == item_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::LineNotInCart(item_id.to_string())),
        }
    }

    /// Removes a line by item id.
    pub fn remove_line(&mut self, item_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.item_id != item_id);
        if self.lines.len() == before {
            Err(CoreError::LineNotInCart(item_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Checks whether the cart holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of line totals, before discount.
    pub fn subtotal_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.line_total_cents()).sum()
    }

    /// Computes subtotal / clamped discount / total for a flat discount.
    pub fn totals(&self, discount: Money) -> CartTotals {
        let subtotal = Money::from_cents(self.subtotal_cents());
        let discount = discount.clamp_range(Money::zero(), subtotal);
        CartTotals {
            subtotal_cents: subtotal.cents(),
            discount_cents: discount.cents(),
            total_cents: subtotal.saturating_sub_zero(discount).cents(),
        }
    }
}

/// Totals summary returned alongside the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

// =============================================================================
// Change Calculation
// =============================================================================

/// Computes change due for a cash tender.
///
/// Rejects locally (before any network call) when the cash received does
/// not cover the total; otherwise `change = cash − total`, exact in cents.
pub fn change_due(total: Money, cash_received: Money) -> CoreResult<Money> {
    if cash_received < total {
        return Err(CoreError::InsufficientCash {
            total: total.cents(),
            tendered: cash_received.cents(),
        });
    }
    Ok(cash_received - total)
}

// =============================================================================
// Unit Tests
// =============================================================================
