//! Password change for an authenticated session.
//!
//! Re-derives the salt and verifier server-side exactly as registration does;
//! the old verifier is unrecoverable afterwards.

use anyhow::Context;
use axum::{Json, extract::Extension, http::HeaderMap, response::IntoResponse};
use sqlx::PgPool;
use srp_core::RFC5054_2048;
use std::sync::Arc;
use tracing::info;

use super::{
    error::ApiError,
    session::authenticate_bearer,
    state::AuthState,
    storage::{lookup_user_by_username, update_user_credentials},
    types::{ChangePasswordRequest, MessageResponse},
    utils::validate_password,
};

#[utoipa::path(
    put,
    path = "/api/v1/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Validation error", body = super::error::ErrorBody),
        (status = 401, description = "Missing or invalid token", body = super::error::ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn change_password(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = authenticate_bearer(&headers, &auth_state).await?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("missing payload".to_string()));
    };
    validate_password(&request.new_password)?;

    let Some(user) = lookup_user_by_username(&pool, &auth.claims.username).await? else {
        return Err(ApiError::NotFound("user".to_string()));
    };

    let username = user.username.clone();
    let password = request.new_password;
    let (salt, verifier) = tokio::task::spawn_blocking(move || {
        let group = &*RFC5054_2048;
        let salt = group.generate_salt()?;
        let verifier = group.compute_verifier(&username, &password, &salt);
        Ok::<_, srp_core::SrpError>((salt, verifier))
    })
    .await
    .context("verifier derivation task failed")?
    .context("failed to derive verifier")?;

    if !update_user_credentials(&pool, user.id, &salt, &verifier.to_bytes_be()).await? {
        return Err(ApiError::NotFound("user".to_string()));
    }

    info!(username = %user.username, "Password changed");

    Ok(Json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}
