//! # Error Types
//!
//! Domain-specific error types for tillpoint-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Error Types                                │
//! │                                                                     │
//! │  tillpoint-core errors (this file)                                  │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  tillpoint-db errors (separate crate)                               │
//! │  └── DbError          - Database operation failures                 │
//! │                                                                     │
//! │  apps/server errors                                                 │
//! │  └── ApiError         - What the front end sees (JSON body)         │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. `thiserror` derive macros, never manual Display impls
//! 2. Errors carry context (amounts, SKUs, ids) in their variants
//! 3. Every variant's message is fit to show a user verbatim

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// Raised by the pure rule functions (drawer, cart, tax) and re-raised by
/// the server when it re-validates a request. Mutating flows stop before
/// any persistence happens when one of these fires.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An operation other than `initialization` was attempted while no
    /// drawer period is open.
    #[error("Cash drawer is closed; initialize it first")]
    DrawerClosed,

    /// `initialization` was attempted while a drawer period is already open.
    #[error("Cash drawer is already open; close it first")]
    DrawerAlreadyOpen,

    /// A removal, cash expense, or cash tax payment would overdraw the
    /// drawer.
    ///
    /// ## When This Occurs
    /// ```text
    /// remove 8000 cents
    ///      │
    ///      ▼
    /// balance is 5000 cents
    ///      │
    ///      ▼
    /// InsufficientFunds { available: 5000, requested: 8000 }
    /// ```
    #[error("Insufficient cash in drawer: {available} cents available, {requested} requested")]
    InsufficientFunds { available: i64, requested: i64 },

    /// The operation requires an amount and none was supplied.
    #[error("Operation '{operation}' requires an amount")]
    AmountRequired { operation: String },

    /// Tendered cash does not cover the sale total.
    #[error("Cash received ({tendered} cents) is less than the total ({total} cents)")]
    InsufficientCash { total: i64, tendered: i64 },

    /// A tax payment exceeds what is still owed on the record.
    #[error("Payment of {requested} cents exceeds the remaining balance of {remaining} cents")]
    PaymentExceedsRemaining { remaining: i64, requested: i64 },

    /// Referenced cart line does not exist.
    #[error("Item {0} is not in the cart")]
    LineNotInCart(String),

    /// Cart has exceeded the maximum allowed number of lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Not enough stock to complete a sale.
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These fire before business logic runs and always before any network or
/// database call. The client shows them inline next to the offending field.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Amount did not parse as a finite positive number.
    #[error("{field} must be a positive amount")]
    InvalidAmount { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (bad UUID, malformed date, unknown enum tag).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A date range is missing an endpoint or runs backwards.
    #[error("Date range is invalid: {reason}")]
    InvalidDateRange { reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
