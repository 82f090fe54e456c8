//! # Cash Drawer Routes
//!
//! The cash drawer page's backend: balance, history, status,
//! reconciliation, manual operations, and CSV export.
//!
//! The operation handler re-runs the same validation the form ran locally;
//! a request that slips past the client still cannot reach the ledger with
//! a bad amount.

use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use tillpoint_core::csv::CsvDocument;
use tillpoint_core::validation::validate_amount_cents;
use tillpoint_core::{DrawerOperation, DrawerTransaction, Money, DEFAULT_HISTORY_LIMIT, END_OF_DAY_REASON};
use tillpoint_db::Database;

use crate::error::ApiError;
use crate::routes::{cents_to_decimal, csv_response};

pub fn routes() -> Router<Database> {
    Router::new()
        .route("/cash-drawer/balance", get(balance))
        .route("/cash-drawer/history", get(history))
        .route("/cash-drawer/history/export", get(export_history))
        .route("/cash-drawer/status", get(status))
        .route("/cash-drawer/reconciliation", get(reconciliation))
        .route("/cash-drawer/operation", post(submit_operation))
}

async fn balance(State(db): State<Database>) -> Result<Json<serde_json::Value>, ApiError> {
    let balance = db.drawer().balance().await?;
    Ok(Json(json!({ "balanceCents": balance })))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<u32>,
}

async fn history(
    State(db): State<Database>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<DrawerTransaction>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(db.drawer().history(limit).await?))
}

async fn status(
    State(db): State<Database>,
) -> Result<Json<tillpoint_db::repository::drawer::DrawerStatus>, ApiError> {
    Ok(Json(db.drawer().status().await?))
}

async fn reconciliation(
    State(db): State<Database>,
) -> Result<Json<tillpoint_core::drawer::Reconciliation>, ApiError> {
    Ok(Json(db.drawer().reconciliation().await?))
}

/// A manual drawer operation submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationRequest {
    #[serde(rename = "type")]
    operation: DrawerOperation,
    amount_cents: Option<i64>,
    reason: Option<String>,
}

async fn submit_operation(
    State(db): State<Database>,
    Json(request): Json<OperationRequest>,
) -> Result<Json<DrawerTransaction>, ApiError> {
    if !request.operation.is_manual() {
        return Err(ApiError::bad_request(format!(
            "Operation '{}' is system-generated and cannot be submitted",
            request.operation.as_str()
        )));
    }

    // Server-side re-run of the form's amount validation.
    let amount = match request.operation {
        DrawerOperation::Add | DrawerOperation::Remove => {
            let cents = request.amount_cents.ok_or_else(|| {
                ApiError::validation("amountCents is required for this operation")
            })?;
            Some(validate_amount_cents("amountCents", cents)?)
        }
        DrawerOperation::Close => None,
        _ => request.amount_cents.map(Money::from_cents),
    };

    let notes = match request.operation {
        DrawerOperation::Close => Some(
            request
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| END_OF_DAY_REASON.to_string()),
        ),
        _ => request.reason,
    };

    let entry = db.drawer().append(request.operation, amount, notes).await?;

    info!(
        operation = request.operation.as_str(),
        balance_cents = entry.balance_cents,
        "Drawer operation recorded"
    );
    Ok(Json(entry))
}

async fn export_history(State(db): State<Database>) -> Result<Response, ApiError> {
    let entries = db.drawer().all_entries().await?;

    let mut doc = CsvDocument::new([
        "Date", "Operation", "Amount", "Previous Balance", "Balance", "Notes",
    ]);
    for entry in &entries {
        doc.push_row([
            entry.date.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.operation.as_str().to_string(),
            cents_to_decimal(entry.amount_cents),
            cents_to_decimal(entry.previous_balance_cents),
            cents_to_decimal(entry.balance_cents),
            entry.notes.clone().unwrap_or_default(),
        ]);
    }
    doc.push_summary([
        "".to_string(),
        "Entries".to_string(),
        doc.row_count().to_string(),
        "".to_string(),
        "Current Balance".to_string(),
        cents_to_decimal(entries.last().map(|e| e.balance_cents).unwrap_or(0)),
    ]);

    Ok(csv_response("cash-drawer-history.csv", &doc))
}
