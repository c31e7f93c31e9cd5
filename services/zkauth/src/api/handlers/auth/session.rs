//! Bearer-token authentication and the session lifecycle endpoints.

use anyhow::{Context, anyhow};
use axum::{Json, extract::Extension, http::HeaderMap, response::IntoResponse};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use session_token::{SessionTokenClaims, sign_hs256, verify_hs256};

use super::{
    challenge::claims_expiry,
    error::ApiError,
    state::AuthState,
    storage::{
        bind_session_token, delete_session, lookup_session_by_token, lookup_user_by_id,
    },
    types::{MessageResponse, ProfileResponse, RefreshResponse},
    utils::extract_bearer_token,
};

pub(super) struct BearerAuth {
    pub(super) token: String,
    pub(super) claims: SessionTokenClaims,
}

/// Resolve the `Authorization` header into verified claims.
///
/// Signature, expiry, and revocation failures all collapse into the same
/// client-visible error.
pub(super) async fn authenticate_bearer(
    headers: &HeaderMap,
    auth_state: &AuthState,
) -> Result<BearerAuth, ApiError> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(ApiError::Authentication(
            "missing or invalid authorization header".to_string(),
        ));
    };

    let claims = verify_hs256(&token, auth_state.config().jwt_secret(), Utc::now().timestamp())
        .map_err(|err| {
            debug!("Token rejected: {err}");
            ApiError::Authentication("invalid or expired token".to_string())
        })?;

    if auth_state.blacklist().is_revoked(&token).await {
        return Err(ApiError::Authentication(
            "invalid or expired token".to_string(),
        ));
    }

    Ok(BearerAuth { token, claims })
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Session deleted and token revoked", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = super::error::ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = authenticate_bearer(&headers, &auth_state).await?;

    let session_id = Uuid::parse_str(&auth.claims.session_id)
        .map_err(|_| ApiError::Authentication("invalid or expired token".to_string()))?;
    delete_session(&pool, session_id).await?;

    // Revoked until its natural expiry; after that the signature check alone
    // rejects it.
    let expires_at = claims_expiry(auth.claims.exp, Utc::now());
    auth_state.blacklist().revoke(auth.token, expires_at).await;

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    responses(
        (status = 200, description = "Fresh token issued", body = RefreshResponse),
        (status = 401, description = "Missing or invalid token", body = super::error::ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = authenticate_bearer(&headers, &auth_state).await?;

    // The presented token must still back a live session row.
    let Some(session) = lookup_session_by_token(&pool, &auth.token).await? else {
        return Err(ApiError::Authentication(
            "invalid or expired session".to_string(),
        ));
    };
    debug!(
        session_id = %session.id,
        user_id = %session.user_id,
        previous_expiry = %session.expires_at,
        "Refreshing session"
    );

    let now = Utc::now();
    let expires_at = now + chrono::Duration::seconds(auth_state.config().jwt_expiry_seconds());
    let claims = SessionTokenClaims {
        session_id: session.id.to_string(),
        username: auth.claims.username.clone(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };
    let token = sign_hs256(auth_state.config().jwt_secret(), &claims)
        .context("failed to sign session token")?;

    if !bind_session_token(&pool, session.id, &token, expires_at).await? {
        return Err(ApiError::Internal(anyhow!(
            "session row vanished during refresh"
        )));
    }

    // The superseded token stays revoked until its own expiry.
    let old_expiry = claims_expiry(auth.claims.exp, now);
    auth_state.blacklist().revoke(auth.token, old_expiry).await;

    Ok(Json(RefreshResponse { token, expires_at }))
}

#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Profile of the authenticated user", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token", body = super::error::ErrorBody),
        (status = 404, description = "User no longer exists", body = super::error::ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn profile(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = authenticate_bearer(&headers, &auth_state).await?;

    // The token must still back a live session; deleted sessions (logout on
    // another device, expiry cleanup) lose profile access immediately.
    let Some(session) = lookup_session_by_token(&pool, &auth.token).await? else {
        return Err(ApiError::Authentication(
            "invalid or expired session".to_string(),
        ));
    };

    let Some(user) = lookup_user_by_id(&pool, session.user_id).await? else {
        return Err(ApiError::NotFound("user".to_string()));
    };

    Ok(Json(ProfileResponse {
        user_id: user.id.to_string(),
        username: user.username,
        created_at: user.created_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::tests::{issue_test_token, lazy_pool, test_auth_state};
    use anyhow::Result;
    use axum::http::{HeaderValue, StatusCode, header::AUTHORIZATION};

    #[tokio::test]
    async fn logout_without_token_is_unauthorized() -> Result<()> {
        let response = logout(
            HeaderMap::new(),
            Extension(lazy_pool()?),
            Extension(test_auth_state()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_with_garbage_token_is_unauthorized() -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer junk"));
        let response = refresh(
            headers,
            Extension(lazy_pool()?),
            Extension(test_auth_state()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_bearer_accepts_a_fresh_token() -> Result<()> {
        let auth_state = test_auth_state();
        let (token, claims) = issue_test_token(&auth_state, "alice")?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );

        let auth = authenticate_bearer(&headers, &auth_state)
            .await
            .map_err(|err| anyhow!("expected success, got {err}"))?;
        assert_eq!(auth.claims, claims);
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_bearer_rejects_revoked_token() -> Result<()> {
        let auth_state = test_auth_state();
        let (token, claims) = issue_test_token(&auth_state, "alice")?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );

        assert!(authenticate_bearer(&headers, &auth_state).await.is_ok());

        // Revocation flips the same token to rejected even before its expiry.
        auth_state
            .blacklist()
            .revoke(token, claims_expiry(claims.exp, Utc::now()))
            .await;
        assert!(authenticate_bearer(&headers, &auth_state).await.is_err());
        Ok(())
    }
}
