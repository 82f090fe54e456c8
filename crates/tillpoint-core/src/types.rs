//! # Domain Types
//!
//! Core domain types used throughout Tillpoint.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                               │
//! │                                                                     │
//! │  ┌───────────────────┐  ┌────────────────┐  ┌───────────────────┐  │
//! │  │ DrawerTransaction │  │    Expense     │  │    TaxRecord      │  │
//! │  │ ───────────────── │  │ ────────────── │  │ ───────────────── │  │
//! │  │ operation         │  │ category       │  │ tax_type          │  │
//! │  │ amount_cents      │  │ amount_cents   │  │ taxable/tax cents │  │
//! │  │ previous/balance  │  │ payment_method │  │ payment_status    │  │
//! │  └───────────────────┘  └────────────────┘  └───────────────────┘  │
//! │                                                                     │
//! │  ┌───────────────────┐  ┌────────────────┐  ┌───────────────────┐  │
//! │  │  InventoryItem    │  │  Sale + lines  │  │  BusinessProfile  │  │
//! │  └───────────────────┘  └────────────────┘  └───────────────────┘  │
//! │                                                                     │
//! │  Closed enums: DrawerOperation, PaymentMethod, TaxType,             │
//! │                TaxPaymentStatus, StockStatus                        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity carries a UUID v4 `id`; money fields are integer cents;
//! enum tags serialize as snake_case strings in JSON and in SQLite.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Drawer Operation
// =============================================================================

/// One ledger entry's kind. A closed tag set.
///
/// ## Who Creates What
/// ```text
/// Manually triggered from the cash drawer UI:
///     add, remove, count, close, initialization
/// System-generated by other subsystems:
///     sale     ← POS checkout (cash tenders)
///     expense  ← cash expenses and cash tax payments
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DrawerOperation {
    /// Manual cash deposit (till top-up).
    Add,
    /// Manual cash removal.
    Remove,
    /// Physical cash count; sets the balance to the counted amount.
    Count,
    /// Cash tender from a completed sale.
    Sale,
    /// Cash expense (including cash tax payments).
    Expense,
    /// Opens a drawer period with the opening float.
    Initialization,
    /// Terminates the drawer period, pulling the remaining cash.
    Close,
}

impl DrawerOperation {
    /// Returns every tag, in a stable order. Used by validators and tests.
    pub const ALL: [DrawerOperation; 7] = [
        DrawerOperation::Add,
        DrawerOperation::Remove,
        DrawerOperation::Count,
        DrawerOperation::Sale,
        DrawerOperation::Expense,
        DrawerOperation::Initialization,
        DrawerOperation::Close,
    ];

    /// The wire tag for this operation ("add", "close", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawerOperation::Add => "add",
            DrawerOperation::Remove => "remove",
            DrawerOperation::Count => "count",
            DrawerOperation::Sale => "sale",
            DrawerOperation::Expense => "expense",
            DrawerOperation::Initialization => "initialization",
            DrawerOperation::Close => "close",
        }
    }

    /// True for the operations a user can submit from the cash drawer form.
    pub fn is_manual(&self) -> bool {
        matches!(
            self,
            DrawerOperation::Add
                | DrawerOperation::Remove
                | DrawerOperation::Count
                | DrawerOperation::Initialization
                | DrawerOperation::Close
        )
    }
}

// =============================================================================
// Drawer Transaction
// =============================================================================

/// One entry in the append-only cash drawer ledger.
///
/// Created only by the backend; read-only everywhere else. The sign of the
/// change is implied by `operation`, never stored: `amount_cents` is always
/// a non-negative magnitude.
///
/// ## Invariants
/// - `balance_cents == previous_balance_cents ± amount_cents` per the
///   operation sign convention (count excepted: it sets the balance)
/// - `previous_balance_cents` equals the prior entry's `balance_cents`
///   (chain continuity, no gaps)
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DrawerTransaction {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Timestamp of the operation.
    #[ts(as = "String")]
    pub date: DateTime<Utc>,

    /// The kind of ledger entry.
    pub operation: DrawerOperation,

    /// Non-negative magnitude of the change, in cents.
    pub amount_cents: i64,

    /// Balance snapshot before the operation.
    pub previous_balance_cents: i64,

    /// Balance snapshot after the operation.
    pub balance_cents: i64,

    /// Free-text reason/notes, optional.
    pub notes: Option<String>,

    /// Id of the originating sale, expense, or tax record for
    /// system-generated entries.
    pub reference_id: Option<String>,
}

impl DrawerTransaction {
    /// The amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// The post-operation balance as Money.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How an expense, tax payment, or sale was paid.
///
/// Only `Cash` touches the drawer ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    BankTransfer,
    Check,
    Other,
}

impl PaymentMethod {
    /// True when this method moves physical cash through the drawer.
    #[inline]
    pub fn affects_drawer(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

// =============================================================================
// Expense
// =============================================================================

/// A recorded business expense.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Expense {
    pub id: String,

    /// Category name (dynamic list; new names create categories).
    pub category: String,

    /// Amount in cents, always > 0.
    pub amount_cents: i64,

    pub payment_method: PaymentMethod,

    /// Day the expense occurred (defaults to today in the form).
    #[ts(as = "String")]
    pub expense_date: NaiveDate,

    pub description: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// An expense category. Kept as its own entity so the form dropdown can be
/// refreshed independently of the expense list.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenseCategory {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Tax Record
// =============================================================================

/// The kind of tax a record covers. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TaxType {
    SalesTax,
    IncomeTax,
    PropertyTax,
    PayrollTax,
    ValueAdded,
    Other,
}

/// Payment state of a tax record.
///
/// Derived from `paid_amount_cents` vs `tax_amount_cents` by
/// [`crate::tax::derive_payment_status`]; `Exempt` is only ever set
/// explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TaxPaymentStatus {
    Paid,
    Pending,
    PartiallyPaid,
    Exempt,
}

/// A tax liability record with its payment state.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TaxRecord {
    pub id: String,

    pub tax_type: TaxType,

    /// Base amount the tax applies to, in cents.
    pub taxable_amount_cents: i64,

    /// Rate in basis points (1500 = 15%).
    pub tax_rate_bps: i64,

    /// Tax owed in cents. Auto-computed from taxable × rate whenever either
    /// changes, but independently editable (manual assessments).
    pub tax_amount_cents: i64,

    pub payment_status: TaxPaymentStatus,

    /// Cents paid so far, 0 ..= tax_amount_cents.
    pub paid_amount_cents: i64,

    #[ts(as = "Option<String>")]
    pub payment_date: Option<DateTime<Utc>>,

    pub payment_method: Option<PaymentMethod>,

    /// Tax period covered; both endpoints required.
    #[ts(as = "String")]
    pub period_start: NaiveDate,
    #[ts(as = "String")]
    pub period_end: NaiveDate,

    /// External reference (assessment number, filing id).
    pub reference: Option<String>,

    pub description: Option<String>,

    /// True when the record was typed in rather than derived from sales.
    pub is_manual_entry: bool,

    /// True once the assessment is final and amounts stop auto-updating.
    pub is_final_assessment: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl TaxRecord {
    /// Cents still owed on this record.
    #[inline]
    pub fn remaining_cents(&self) -> i64 {
        (self.tax_amount_cents - self.paid_amount_cents).max(0)
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// Stock availability, derived from stock vs reorder level.
///
/// The backend computes this; clients only display it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

/// Derives the stock status from a stock count and reorder level.
///
/// ```text
/// stock <= 0             → OutOfStock
/// stock <= reorder_level → LowStock
/// otherwise              → InStock
/// ```
pub fn derive_stock_status(stock: i64, reorder_level: i64) -> StockStatus {
    if stock <= 0 {
        StockStatus::OutOfStock
    } else if stock <= reorder_level {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}

/// An inventory item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryItem {
    pub id: String,

    pub name: String,

    /// Stock Keeping Unit; unique, required.
    pub sku: String,

    /// Hierarchical classification: each level's options are filtered by
    /// the parent selection in the UI.
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub subcategory2: Option<String>,

    pub brand: Option<String>,
    pub supplier: Option<String>,

    /// Vehicle fitment facet (parts retail).
    pub vehicle: Option<String>,

    /// Retail price in cents.
    pub price_cents: i64,

    /// Purchase (cost) price in cents.
    pub purchase_price_cents: Option<i64>,

    pub stock: i64,

    /// Stock level at or below which the item counts as low stock.
    pub reorder_level: i64,

    pub location: Option<String>,

    /// Unit of measure ("pc", "l", "kg").
    pub unit: Option<String>,

    /// Comma-separated free-form tags.
    pub tags: Option<String>,

    pub image_url: Option<String>,

    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// The derived availability status.
    #[inline]
    pub fn stock_status(&self) -> StockStatus {
        derive_stock_status(self.stock, self.reorder_level)
    }

    /// Retail value of the stock on hand.
    #[inline]
    pub fn stock_value(&self) -> Money {
        Money::from_cents(self.price_cents).times(self.stock.max(0))
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed POS sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,

    /// Allocated by the backend at completion; unique.
    pub receipt_number: String,

    pub customer_name: Option<String>,

    pub subtotal_cents: i64,

    /// Flat discount amount, 0 ..= subtotal.
    pub discount_cents: i64,

    pub total_cents: i64,

    pub payment_method: PaymentMethod,

    /// For cash: amount the customer handed over.
    pub cash_received_cents: Option<i64>,

    /// For cash: change returned.
    pub change_cents: Option<i64>,

    /// Set by the best-effort mark-printed call after the print dialog.
    pub printed: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line item in a sale.
///
/// Snapshot pattern: product data is frozen at the time of sale so history
/// survives later edits to the inventory item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub item_id: String,
    /// SKU at time of sale (frozen).
    pub sku_snapshot: String,
    /// Item name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
}

// =============================================================================
// Business Profile (settings)
// =============================================================================

/// The single business profile row backing `GET/PUT /settings`.
///
/// Includes the POS receipt header/footer the front end renders around the
/// line items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BusinessProfile {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub receipt_header: Option<String>,
    pub receipt_footer: Option<String>,
    pub logo_url: Option<String>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawer_operation_tags() {
        assert_eq!(DrawerOperation::Add.as_str(), "add");
        assert_eq!(DrawerOperation::Initialization.as_str(), "initialization");
        assert_eq!(DrawerOperation::ALL.len(), 7);
    }

    #[test]
    fn manual_vs_system_operations() {
        assert!(DrawerOperation::Add.is_manual());
        assert!(DrawerOperation::Close.is_manual());
        assert!(!DrawerOperation::Sale.is_manual());
        assert!(!DrawerOperation::Expense.is_manual());
    }

    #[test]
    fn only_cash_affects_drawer() {
        assert!(PaymentMethod::Cash.affects_drawer());
        assert!(!PaymentMethod::CreditCard.affects_drawer());
        assert!(!PaymentMethod::BankTransfer.affects_drawer());
    }

    #[test]
    fn stock_status_derivation() {
        assert_eq!(derive_stock_status(0, 5), StockStatus::OutOfStock);
        assert_eq!(derive_stock_status(-2, 5), StockStatus::OutOfStock);
        assert_eq!(derive_stock_status(3, 5), StockStatus::LowStock);
        assert_eq!(derive_stock_status(5, 5), StockStatus::LowStock);
        assert_eq!(derive_stock_status(6, 5), StockStatus::InStock);
    }

    #[test]
    fn tax_record_remaining_never_negative() {
        let record = TaxRecord {
            id: "t1".into(),
            tax_type: TaxType::SalesTax,
            taxable_amount_cents: 100_000,
            tax_rate_bps: 1500,
            tax_amount_cents: 15_000,
            payment_status: TaxPaymentStatus::Paid,
            paid_amount_cents: 20_000,
            payment_date: None,
            payment_method: None,
            period_start: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            reference: None,
            description: None,
            is_manual_entry: false,
            is_final_assessment: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(record.remaining_cents(), 0);
    }
}
