//! API handlers for zkauth.
//!
//! The auth module holds the protocol service (registration, the SRP
//! challenge/verify exchange, and the session lifecycle); health and root are
//! operational endpoints.

pub mod auth;
pub mod health;
pub mod root;

use auth::error::ErrorBody;
use axum::{Json, http::StatusCode, http::Uri, response::IntoResponse};

/// JSON 404 for unknown routes, so clients never see an HTML error page.
pub(crate) async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            code: "NOT_FOUND",
            message: "endpoint not found".to_string(),
            details: Some(uri.path().to_string()),
        }),
    )
}
