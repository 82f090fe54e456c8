//! # API Error Type
//!
//! What the front end sees when anything goes wrong: a JSON body
//! `{ "code": "...", "message": "..." }` whose message is shown to the user
//! verbatim. Mapping layers (core rules, database) are collapsed here into
//! a status code and a stable machine-readable code.
//!
//! ## Status Mapping
//! ```text
//! ValidationError            → 400 validation_failed
//! Business rule violation    → 409 rule_violation
//! NotFound                   → 404 not_found
//! UniqueViolation            → 409 duplicate
//! Everything else            → 500 internal
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use tillpoint_core::CoreError;
use tillpoint_db::DbError;

/// An error ready to be serialized to the client.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    /// A 400 with the `validation_failed` code.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            code: "validation_failed",
            message: message.into(),
        }
    }

    /// A 400 for a malformed request outside field validation.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, message = %self.message, "Request failed");
        }
        let body = Json(json!({
            "code": self.code,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let (status, code) = match &err {
            CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            _ => (StatusCode::CONFLICT, "rule_violation"),
        };
        ApiError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Rule(core) => core.into(),
            DbError::NotFound { .. } => ApiError {
                status: StatusCode::NOT_FOUND,
                code: "not_found",
                message: err.to_string(),
            },
            DbError::UniqueViolation { .. } => ApiError {
                status: StatusCode::CONFLICT,
                code: "duplicate",
                message: err.to_string(),
            },
            _ => ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "internal",
                message: err.to_string(),
            },
        }
    }
}

impl From<tillpoint_core::ValidationError> for ApiError {
    fn from(err: tillpoint_core::ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_violations_map_to_conflict_with_verbatim_message() {
        let err: ApiError = CoreError::InsufficientFunds {
            available: 5_000,
            requested: 8_000,
        }
        .into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "rule_violation");
        assert_eq!(
            err.message,
            "Insufficient cash in drawer: 5000 cents available, 8000 requested"
        );
    }

    #[test]
    fn db_not_found_maps_to_404() {
        let err: ApiError = DbError::not_found("Expense", "abc").into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "not_found");
    }
}
