//! User registration.

use anyhow::Context;
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use srp_core::RFC5054_2048;
use std::sync::Arc;
use tracing::info;

use super::{
    error::ApiError,
    rate_limit::RateLimitDecision,
    state::AuthState,
    storage::{InsertUserOutcome, insert_user, username_exists},
    types::{RegisterRequest, RegisterResponse},
    utils::{extract_client_ip, validate_password, validate_username},
};

#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = RegisterResponse),
        (status = 400, description = "Validation error", body = super::error::ErrorBody),
        (status = 409, description = "Username already exists", body = super::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn register(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("missing payload".to_string()));
    };

    let client_ip = extract_client_ip(&headers);
    if auth_state.rate_limiter().check(client_ip.as_deref()) == RateLimitDecision::Limited {
        return Err(ApiError::TooManyRequests);
    }

    validate_username(&request.username)?;
    validate_password(&request.password)?;

    if username_exists(&pool, &request.username).await? {
        return Err(ApiError::Conflict("username already exists".to_string()));
    }

    // The verifier needs a 2048-bit modular exponentiation; keep it off the
    // reactor. The password moves into the closure and is dropped with it.
    let username = request.username.clone();
    let password = request.password;
    let (salt, verifier) = tokio::task::spawn_blocking(move || {
        let group = &*RFC5054_2048;
        let salt = group.generate_salt()?;
        let verifier = group.compute_verifier(&username, &password, &salt);
        Ok::<_, srp_core::SrpError>((salt, verifier))
    })
    .await
    .context("verifier derivation task failed")?
    .context("failed to derive verifier")?;

    // The unique index still guards against races with the exists check above.
    let outcome = insert_user(&pool, &request.username, &salt, &verifier.to_bytes_be()).await?;
    let user_id = match outcome {
        InsertUserOutcome::Created(id) => id,
        InsertUserOutcome::Conflict => {
            return Err(ApiError::Conflict("username already exists".to_string()));
        }
    };

    info!(username = %request.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user_id.to_string(),
            username: request.username,
            message: "User registered successfully".to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::tests::{lazy_pool, test_auth_state};
    use anyhow::Result;

    #[tokio::test]
    async fn register_missing_payload() -> Result<()> {
        let response = register(
            HeaderMap::new(),
            Extension(lazy_pool()?),
            Extension(test_auth_state()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_invalid_username_before_touching_storage() -> Result<()> {
        let request = RegisterRequest {
            username: "a".to_string(),
            password: "longenough".to_string(),
        };
        let response = register(
            HeaderMap::new(),
            Extension(lazy_pool()?),
            Extension(test_auth_state()),
            Some(Json(request)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_short_password() -> Result<()> {
        let request = RegisterRequest {
            username: "alice".to_string(),
            password: "short".to_string(),
        };
        let response = register(
            HeaderMap::new(),
            Extension(lazy_pool()?),
            Extension(test_auth_state()),
            Some(Json(request)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
