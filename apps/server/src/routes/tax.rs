//! # Tax Record Routes
//!
//! Tax record CRUD plus the payment-posting endpoint. Amount derivation
//! (auto-computed tax, status from paid amount) lives in the repository;
//! here we only gate malformed fields before they reach it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use tillpoint_core::validation::{
    validate_amount_cents, validate_date_range, validate_rate_bps,
};
use tillpoint_core::{PaymentMethod, TaxRecord};
use tillpoint_db::repository::tax::TaxRecordInput;
use tillpoint_db::Database;

use crate::error::ApiError;

pub fn routes() -> Router<Database> {
    Router::new()
        .route("/tax-records", get(list).post(create))
        .route("/tax-records/:id", put(update).delete(delete_record))
        .route("/tax-records/:id/payment", post(record_payment))
}

fn validate(input: &TaxRecordInput) -> Result<(), ApiError> {
    validate_amount_cents("taxableAmountCents", input.taxable_amount_cents)?;
    validate_rate_bps("taxRateBps", input.tax_rate_bps)?;
    validate_date_range(input.period_start, input.period_end)?;
    if let Some(tax) = input.tax_amount_cents {
        validate_amount_cents("taxAmountCents", tax)?;
    }
    Ok(())
}

async fn list(State(db): State<Database>) -> Result<Json<Vec<TaxRecord>>, ApiError> {
    Ok(Json(db.taxes().list().await?))
}

async fn create(
    State(db): State<Database>,
    Json(input): Json<TaxRecordInput>,
) -> Result<(StatusCode, Json<TaxRecord>), ApiError> {
    validate(&input)?;
    let record = db.taxes().create(input).await?;
    info!(id = %record.id, tax_type = ?record.tax_type, "Tax record created");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update(
    State(db): State<Database>,
    Path(id): Path<String>,
    Json(input): Json<TaxRecordInput>,
) -> Result<Json<TaxRecord>, ApiError> {
    validate(&input)?;
    Ok(Json(db.taxes().update(&id, input).await?))
}

async fn delete_record(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    db.taxes().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRequest {
    amount_cents: i64,
    payment_method: PaymentMethod,
}

async fn record_payment(
    State(db): State<Database>,
    Path(id): Path<String>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<TaxRecord>, ApiError> {
    let amount = validate_amount_cents("amountCents", request.amount_cents)?;
    let record = db
        .taxes()
        .record_payment(&id, amount, request.payment_method)
        .await?;
    info!(
        id = %id,
        amount_cents = amount.cents(),
        status = ?record.payment_status,
        "Tax payment recorded"
    );
    Ok(Json(record))
}
