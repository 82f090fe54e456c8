//! # tillpoint-core: Pure Business Logic for Tillpoint
//!
//! This crate is the heart of Tillpoint, a point-of-sale and small-business
//! back-office system. It contains every business rule as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Tillpoint Architecture                         │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                  Web Front End (React)                        │ │
//! │  │   Checkout UI ── Cash Drawer UI ── Expenses ── Dashboards     │ │
//! │  └─────────────────────────────┬─────────────────────────────────┘ │
//! │                                │ HTTP / JSON                       │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐ │
//! │  │                   apps/server (axum routes)                   │ │
//! │  └─────────────────────────────┬─────────────────────────────────┘ │
//! │                                │                                   │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐ │
//! │  │              ★ tillpoint-core (THIS CRATE) ★                  │ │
//! │  │                                                               │ │
//! │  │  ┌────────┐ ┌────────┐ ┌──────┐ ┌─────┐ ┌─────┐ ┌─────────┐ │ │
//! │  │  │ money  │ │ drawer │ │ cart │ │ tax │ │ csv │ │validate │ │ │
//! │  │  └────────┘ └────────┘ └──────┘ └─────┘ └─────┘ └─────────┘ │ │
//! │  │                                                               │ │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │ │
//! │  └─────────────────────────────┬─────────────────────────────────┘ │
//! │                                │                                   │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐ │
//! │  │                tillpoint-db (SQLite, sqlx)                    │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (DrawerTransaction, Expense, TaxRecord, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`drawer`] - Cash drawer ledger rules (balance chain, state machine)
//! - [`cart`] - POS cart math (subtotal, discount, change)
//! - [`tax`] - Tax amount computation and payment-status derivation
//! - [`csv`] - RFC-4180 CSV export used by every list view
//! - [`validation`] - Input validation run before any I/O happens
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output, always
//! 2. **Integer Money**: all monetary values are cents (i64)
//! 3. **Explicit Errors**: typed errors, never strings or panics
//! 4. **Client/server symmetry**: the rules the UI applies before a network
//!    call are the exact functions the server re-applies on receipt

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod csv;
pub mod drawer;
pub mod error;
pub mod money;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Smallest amount accepted for a manual `add`/`remove` drawer operation.
///
/// The operation form rejects anything below one cent before any network
/// call is made; the server re-validates with the same constant.
pub const MIN_CASH_OPERATION_CENTS: i64 = 1;

/// Default number of drawer transactions returned by the history endpoint.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Reason recorded for a `close` operation when the user supplies none.
pub const END_OF_DAY_REASON: &str = "End of day close";

/// Maximum distinct lines allowed in a single cart.
///
/// Prevents runaway carts and keeps transaction sizes reasonable.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in a cart.
///
/// Catches obvious typos (1000 instead of 10) at the edge.
pub const MAX_LINE_QUANTITY: i64 = 999;
