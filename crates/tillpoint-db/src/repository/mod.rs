//! # Repository Module
//!
//! Database repository implementations for Tillpoint.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  HTTP Handler                                                          │
//! │       │                                                                 │
//! │       │  db.drawer().append(op, amount, notes)                         │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  DrawerRepository                                                      │
//! │  ├── append(&self, operation, amount, notes)                           │
//! │  ├── balance(&self)                                                    │
//! │  ├── history(&self, limit)                                             │
//! │  └── reconciliation(&self)                                             │
//! │       │                                                                 │
//! │       │  SQL Query (in a transaction for ledger writes)                │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place                                        │
//! │  • Cross-entity transactions (cash expense → drawer entry) live here   │
//! │  • Easy to test with an in-memory database                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`drawer::DrawerRepository`] - Cash drawer ledger (append-only chain)
//! - [`expense::ExpenseRepository`] - Expense CRUD + categories
//! - [`tax::TaxRepository`] - Tax records and payments
//! - [`inventory::InventoryRepository`] - Inventory CRUD, filtering, facets
//! - [`sale::SaleRepository`] - POS sale completion
//! - [`dashboard::DashboardRepository`] - Read-only aggregations
//! - [`settings::SettingsRepository`] - Business profile (single row)

pub mod dashboard;
pub mod drawer;
pub mod expense;
pub mod inventory;
pub mod sale;
pub mod settings;
pub mod tax;
