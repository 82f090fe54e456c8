//! # Route Modules
//!
//! One module per resource, mirroring the front end's feature pages.
//!
//! ## Route Map
//! ```text
//! /cash-drawer/...    → drawer.rs     balance, history, status, operation
//! /expenses/...       → expenses.rs   CRUD, categories, export
//! /tax-records/...    → tax.rs        CRUD, payment posting
//! /inventory/...      → inventory.rs  CRUD, stock, facets, export
//! /pos/...            → pos.rs        sale completion, mark-printed
//! /dashboard/...      → dashboard.rs  read-only aggregations
//! /settings           → settings.rs   business profile
//! /health             → (here)        liveness + db check
//! ```

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use tillpoint_core::csv::CsvDocument;
use tillpoint_db::Database;

pub mod dashboard;
pub mod drawer;
pub mod expenses;
pub mod inventory;
pub mod pos;
pub mod settings;
pub mod tax;

/// Builds the full application router.
pub fn router(db: Database) -> Router {
    Router::new()
        .merge(drawer::routes())
        .merge(expenses::routes())
        .merge(tax::routes())
        .merge(inventory::routes())
        .merge(pos::routes())
        .merge(dashboard::routes())
        .merge(settings::routes())
        .route("/health", get(health))
        .with_state(db)
}

/// Liveness endpoint: process up + database answering.
async fn health(State(db): State<Database>) -> Json<serde_json::Value> {
    let database = if db.health_check().await { "up" } else { "down" };
    Json(json!({ "status": "ok", "database": database }))
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Renders cents as a plain decimal string for CSV cells ("50.00").
pub(crate) fn cents_to_decimal(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, (cents / 100).abs(), (cents % 100).abs())
}

/// Wraps a rendered CSV document as a file-download response.
pub(crate) fn csv_response(filename: &str, doc: &CsvDocument) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        doc.to_bytes(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_rendering() {
        assert_eq!(cents_to_decimal(5_000), "50.00");
        assert_eq!(cents_to_decimal(5), "0.05");
        assert_eq!(cents_to_decimal(-1_234), "-12.34");
        assert_eq!(cents_to_decimal(0), "0.00");
    }
}
