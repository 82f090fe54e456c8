//! # Inventory Routes
//!
//! Inventory CRUD, server-driven filtered listing, stock adjustments,
//! facet lookups for the filter dropdowns, and CSV export.
//!
//! ## Stale-Response Guard
//! The list endpoint echoes back the client's `generation` token unchanged.
//! A client that fires a request per keystroke stamps each request with a
//! counter and drops any response whose echoed token is older than the
//! latest stamp, so a slow early response can never overwrite a newer one.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use tillpoint_core::csv::CsvDocument;
use tillpoint_core::validation::{require_text, validate_amount_cents, MAX_NAME_LEN};
use tillpoint_core::{InventoryItem, StockStatus};
use tillpoint_db::repository::inventory::{InventoryFilter, InventoryInput, InventoryStats};
use tillpoint_db::Database;

use crate::error::ApiError;
use crate::routes::{cents_to_decimal, csv_response};

pub fn routes() -> Router<Database> {
    Router::new()
        .route("/inventory", get(list).post(create))
        .route("/inventory/export", get(export))
        .route("/inventory/categories", get(categories))
        .route("/inventory/subcategories", get(subcategories))
        .route("/inventory/subcategories2", get(subcategories2))
        .route("/inventory/brands", get(brands))
        .route("/inventory/vehicles", get(vehicles))
        .route("/inventory/suppliers", get(suppliers))
        .route("/inventory/:id", put(update).delete(delete_item))
        .route("/inventory/:id/stock", post(update_stock))
}

fn validate(input: &InventoryInput) -> Result<(), ApiError> {
    require_text("name", &input.name, MAX_NAME_LEN)?;
    require_text("sku", &input.sku, MAX_NAME_LEN)?;
    validate_amount_cents("priceCents", input.price_cents)?;
    if let Some(purchase) = input.purchase_price_cents {
        validate_amount_cents("purchasePriceCents", purchase)?;
    }
    Ok(())
}

// =============================================================================
// Listing
// =============================================================================

/// Query parameters for the list endpoint. Spelled out flat because axum's
/// query deserializer does not support `serde(flatten)`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    search: Option<String>,
    category: Option<String>,
    subcategory: Option<String>,
    subcategory2: Option<String>,
    brand: Option<String>,
    vehicle: Option<String>,
    supplier: Option<String>,
    status: Option<StockStatus>,
    /// Opaque request-ordering token, echoed back untouched.
    generation: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    items: Vec<InventoryItem>,
    stats: InventoryStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation: Option<u64>,
}

async fn list(
    State(db): State<Database>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let filter = InventoryFilter {
        search: query.search,
        category: query.category,
        subcategory: query.subcategory,
        subcategory2: query.subcategory2,
        brand: query.brand,
        vehicle: query.vehicle,
        supplier: query.supplier,
        status: query.status,
    };
    let page = db.inventory().list(filter).await?;
    Ok(Json(ListResponse {
        items: page.items,
        stats: page.stats,
        generation: query.generation,
    }))
}

// =============================================================================
// CRUD
// =============================================================================

async fn create(
    State(db): State<Database>,
    Json(input): Json<InventoryInput>,
) -> Result<(StatusCode, Json<InventoryItem>), ApiError> {
    validate(&input)?;
    let item = db.inventory().create(input).await?;
    info!(id = %item.id, sku = %item.sku, "Inventory item created");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update(
    State(db): State<Database>,
    Path(id): Path<String>,
    Json(input): Json<InventoryInput>,
) -> Result<Json<InventoryItem>, ApiError> {
    validate(&input)?;
    Ok(Json(db.inventory().update(&id, input).await?))
}

async fn delete_item(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    db.inventory().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stock update: either a relative `delta` or an absolute `set`.
#[derive(Debug, Deserialize)]
struct StockRequest {
    delta: Option<i64>,
    set: Option<i64>,
}

async fn update_stock(
    State(db): State<Database>,
    Path(id): Path<String>,
    Json(request): Json<StockRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    let item = match (request.delta, request.set) {
        (Some(delta), None) => db.inventory().adjust_stock(&id, delta).await?,
        (None, Some(stock)) => db.inventory().set_stock(&id, stock).await?,
        _ => {
            return Err(ApiError::bad_request(
                "Provide exactly one of 'delta' or 'set'",
            ))
        }
    };
    Ok(Json(item))
}

// =============================================================================
// Facets
// =============================================================================

async fn categories(State(db): State<Database>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(db.inventory().categories().await?))
}

#[derive(Debug, Deserialize)]
struct SubcategoryQuery {
    category: Option<String>,
}

async fn subcategories(
    State(db): State<Database>,
    Query(query): Query<SubcategoryQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(
        db.inventory().subcategories(query.category.as_deref()).await?,
    ))
}

#[derive(Debug, Deserialize)]
struct Subcategory2Query {
    subcategory: Option<String>,
}

async fn subcategories2(
    State(db): State<Database>,
    Query(query): Query<Subcategory2Query>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(
        db.inventory()
            .subcategories2(query.subcategory.as_deref())
            .await?,
    ))
}

async fn brands(State(db): State<Database>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(db.inventory().brands().await?))
}

async fn vehicles(State(db): State<Database>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(db.inventory().vehicles().await?))
}

async fn suppliers(State(db): State<Database>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(db.inventory().suppliers().await?))
}

// =============================================================================
// Export
// =============================================================================

async fn export(State(db): State<Database>) -> Result<Response, ApiError> {
    let page = db.inventory().list(InventoryFilter::default()).await?;

    let mut doc = CsvDocument::new([
        "SKU", "Name", "Category", "Brand", "Price", "Purchase Price", "Stock",
        "Reorder Level", "Status", "Stock Value",
    ]);
    for item in &page.items {
        doc.push_row([
            item.sku.clone(),
            item.name.clone(),
            item.category.clone().unwrap_or_default(),
            item.brand.clone().unwrap_or_default(),
            cents_to_decimal(item.price_cents),
            item.purchase_price_cents
                .map(cents_to_decimal)
                .unwrap_or_default(),
            item.stock.to_string(),
            item.reorder_level.to_string(),
            format!("{:?}", item.stock_status()),
            cents_to_decimal(item.stock_value().cents()),
        ]);
    }
    doc.push_summary([
        "".to_string(),
        "Total Items".to_string(),
        page.stats.total_items.to_string(),
        "".to_string(),
        "".to_string(),
        "".to_string(),
        "".to_string(),
        "".to_string(),
        "Total Value".to_string(),
        cents_to_decimal(page.stats.total_stock_value_cents),
    ]);

    Ok(csv_response("inventory.csv", &doc))
}
