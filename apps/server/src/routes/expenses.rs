//! # Expense Routes
//!
//! Expense CRUD, the dynamic category list, and CSV export.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, put};
use axum::{Json, Router};
use tracing::info;

use tillpoint_core::csv::CsvDocument;
use tillpoint_core::validation::{require_text, validate_amount_cents, MAX_NAME_LEN};
use tillpoint_core::{Expense, ExpenseCategory};
use tillpoint_db::repository::expense::{ExpenseFilter, ExpenseInput};
use tillpoint_db::Database;

use crate::error::ApiError;
use crate::routes::{cents_to_decimal, csv_response};

pub fn routes() -> Router<Database> {
    Router::new()
        .route("/expenses", get(list).post(create))
        .route("/expenses/categories", get(categories))
        .route("/expenses/export", get(export))
        .route("/expenses/:id", put(update).delete(delete_expense))
}

/// Field validation shared by create and update.
fn validate(input: &ExpenseInput) -> Result<(), ApiError> {
    require_text("category", &input.category, MAX_NAME_LEN)?;
    validate_amount_cents("amountCents", input.amount_cents)?;
    Ok(())
}

async fn list(
    State(db): State<Database>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    Ok(Json(db.expenses().list(filter).await?))
}

async fn create(
    State(db): State<Database>,
    Json(input): Json<ExpenseInput>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    validate(&input)?;
    let expense = db.expenses().create(input).await?;
    info!(id = %expense.id, category = %expense.category, "Expense created");
    Ok((StatusCode::CREATED, Json(expense)))
}

async fn update(
    State(db): State<Database>,
    Path(id): Path<String>,
    Json(input): Json<ExpenseInput>,
) -> Result<Json<Expense>, ApiError> {
    validate(&input)?;
    Ok(Json(db.expenses().update(&id, input).await?))
}

async fn delete_expense(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    db.expenses().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn categories(
    State(db): State<Database>,
) -> Result<Json<Vec<ExpenseCategory>>, ApiError> {
    Ok(Json(db.expenses().categories().await?))
}

async fn export(
    State(db): State<Database>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Response, ApiError> {
    let expenses = db.expenses().list(filter).await?;

    let mut doc = CsvDocument::new(["Date", "Category", "Amount", "Payment Method", "Description"]);
    let mut total = 0i64;
    for expense in &expenses {
        total += expense.amount_cents;
        doc.push_row([
            expense.expense_date.to_string(),
            expense.category.clone(),
            cents_to_decimal(expense.amount_cents),
            format!("{:?}", expense.payment_method),
            expense.description.clone().unwrap_or_default(),
        ]);
    }
    doc.push_summary([
        "".to_string(),
        "Total".to_string(),
        cents_to_decimal(total),
        "".to_string(),
        "".to_string(),
    ]);

    Ok(csv_response("expenses.csv", &doc))
}
