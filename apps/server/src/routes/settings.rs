//! # Settings Routes
//!
//! The business profile backing the settings page and the POS receipt
//! header/footer.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use tillpoint_core::validation::{optional_text, require_text, MAX_NAME_LEN, MAX_NOTES_LEN};
use tillpoint_core::BusinessProfile;
use tillpoint_db::repository::settings::BusinessProfileInput;
use tillpoint_db::Database;

use crate::error::ApiError;

pub fn routes() -> Router<Database> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

async fn get_settings(State(db): State<Database>) -> Result<Json<BusinessProfile>, ApiError> {
    Ok(Json(db.settings().get().await?))
}

async fn update_settings(
    State(db): State<Database>,
    Json(mut input): Json<BusinessProfileInput>,
) -> Result<Json<BusinessProfile>, ApiError> {
    input.name = require_text("name", &input.name, MAX_NAME_LEN)?;
    input.receipt_header =
        optional_text("receiptHeader", input.receipt_header.as_deref(), MAX_NOTES_LEN)?;
    input.receipt_footer =
        optional_text("receiptFooter", input.receipt_footer.as_deref(), MAX_NOTES_LEN)?;

    let profile = db.settings().update(input).await?;
    info!(name = %profile.name, "Business profile updated");
    Ok(Json(profile))
}
