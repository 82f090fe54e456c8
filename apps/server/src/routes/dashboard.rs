//! # Dashboard Routes
//!
//! Read-only aggregations behind the dashboard cards and charts.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use tillpoint_core::validation::validate_date_range;
use tillpoint_db::repository::dashboard::{
    CategoryTotal, DashboardSummary, DaySummary, NetPurchase,
};
use tillpoint_db::Database;

use crate::error::ApiError;

pub fn routes() -> Router<Database> {
    Router::new()
        .route("/dashboard/summary", get(summary))
        .route("/dashboard/expenses-by-category", get(expenses_by_category))
        .route("/dashboard/period-summary", get(period_summary))
        .route("/dashboard/net-purchase", get(net_purchase))
}

async fn summary(State(db): State<Database>) -> Result<Json<DashboardSummary>, ApiError> {
    Ok(Json(db.dashboard().summary().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeQuery {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

async fn expenses_by_category(
    State(db): State<Database>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<CategoryTotal>>, ApiError> {
    validate_date_range(range.start_date, range.end_date)?;
    Ok(Json(
        db.dashboard()
            .expenses_by_category(range.start_date, range.end_date)
            .await?,
    ))
}

async fn period_summary(
    State(db): State<Database>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<DaySummary>>, ApiError> {
    validate_date_range(range.start_date, range.end_date)?;
    Ok(Json(
        db.dashboard()
            .period_summary(range.start_date, range.end_date)
            .await?,
    ))
}

async fn net_purchase(State(db): State<Database>) -> Result<Json<NetPurchase>, ApiError> {
    Ok(Json(db.dashboard().net_purchase().await?))
}
