//! # POS Routes
//!
//! Checkout completion, receipt bookkeeping, and the sell-screen item feed.
//!
//! The whole checkout is one repository call inside one transaction, so a
//! failed stock check or short cash tender leaves nothing behind.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use tillpoint_core::validation::validate_amount_cents;
use tillpoint_core::{InventoryItem, Sale};
use tillpoint_db::repository::inventory::InventoryFilter;
use tillpoint_db::repository::sale::{CompletedSale, SaleInput};
use tillpoint_db::Database;

use crate::error::ApiError;

pub fn routes() -> Router<Database> {
    Router::new()
        .route("/pos/sale", post(complete_sale))
        .route("/pos/sale/:id", get(get_sale))
        .route("/pos/sale/:id/mark-printed", post(mark_printed))
        .route("/pos/sales", get(recent_sales))
        .route("/pos/inventory", get(sellable_inventory))
}

async fn complete_sale(
    State(db): State<Database>,
    Json(input): Json<SaleInput>,
) -> Result<(StatusCode, Json<CompletedSale>), ApiError> {
    if input.discount_cents < 0 {
        return Err(ApiError::validation("discountCents cannot be negative"));
    }
    if let Some(cash) = input.cash_received_cents {
        validate_amount_cents("cashReceivedCents", cash)?;
    }

    let sale = db.sales().complete_sale(input).await?;
    info!(
        receipt = %sale.sale.receipt_number,
        total_cents = sale.sale.total_cents,
        lines = sale.lines.len(),
        "Sale completed"
    );
    Ok((StatusCode::CREATED, Json(sale)))
}

async fn get_sale(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<CompletedSale>, ApiError> {
    Ok(Json(db.sales().get(&id).await?))
}

/// Best-effort receipt flag; the front end fires this after the print
/// dialog and ignores the outcome.
async fn mark_printed(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    db.sales().mark_printed(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<u32>,
}

async fn recent_sales(
    State(db): State<Database>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Sale>>, ApiError> {
    Ok(Json(db.sales().list(query.limit.unwrap_or(50)).await?))
}

#[derive(Debug, Deserialize)]
struct SellableQuery {
    search: Option<String>,
    category: Option<String>,
}

/// Items offered on the sell screen: matching the search, with stock on
/// hand.
async fn sellable_inventory(
    State(db): State<Database>,
    Query(query): Query<SellableQuery>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let page = db
        .inventory()
        .list(InventoryFilter {
            search: query.search,
            category: query.category,
            ..Default::default()
        })
        .await?;
    let sellable = page.items.into_iter().filter(|i| i.stock > 0).collect();
    Ok(Json(sellable))
}
