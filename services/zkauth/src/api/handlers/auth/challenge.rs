//! The two-phase SRP exchange: challenge, then verify.

use anyhow::{Context, anyhow};
use axum::{Json, extract::Extension, http::HeaderMap, response::IntoResponse};
use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use num_traits::Zero;
use sqlx::PgPool;
use srp_core::{RFC5054_2048, SrpError};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use session_token::{SessionTokenClaims, sign_hs256};

use super::{
    error::ApiError,
    rate_limit::RateLimitDecision,
    registry::PendingChallenge,
    state::AuthState,
    storage::{
        bind_session_token, insert_challenge_session, lookup_session_by_id,
        lookup_user_by_username,
    },
    types::{ChallengeRequest, ChallengeResponse, VerifyRequest, VerifyResponse},
    utils::{decode_hex_field, extract_client_ip},
};

#[utoipa::path(
    post,
    path = "/api/v1/auth/challenge",
    request_body = ChallengeRequest,
    responses(
        (status = 200, description = "Challenge started", body = ChallengeResponse),
        (status = 400, description = "Malformed client value", body = super::error::ErrorBody),
        (status = 401, description = "Invalid credentials", body = super::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn challenge(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ChallengeRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("missing payload".to_string()));
    };

    let client_ip = extract_client_ip(&headers);
    if auth_state.rate_limiter().check(client_ip.as_deref()) == RateLimitDecision::Limited {
        return Err(ApiError::TooManyRequests);
    }

    let a_bytes = decode_hex_field(&request.client_a, "client_a")?;
    let client_a = BigUint::from_bytes_be(&a_bytes);

    // A = 0 mod N would pin the shared secret to zero; RFC 5054 requires
    // rejecting it here. A = 1 is deliberately allowed, matching the RFC.
    if (&client_a % RFC5054_2048.modulus()).is_zero() {
        return Err(ApiError::BadRequest("invalid client_a value".to_string()));
    }

    // Unknown users must be indistinguishable from wrong passwords.
    let Some(user) = lookup_user_by_username(&pool, &request.username).await? else {
        return Err(ApiError::Authentication("invalid credentials".to_string()));
    };

    let verifier = BigUint::from_bytes_be(&user.verifier);
    let keys_verifier = verifier.clone();
    let (server_secret, server_b) =
        tokio::task::spawn_blocking(move || RFC5054_2048.generate_server_keys(&keys_verifier))
            .await
            .context("server key task failed")?
            .context("failed to generate server keys")?;

    let ttl_seconds = i64::try_from(auth_state.registry().ttl().as_secs()).unwrap_or(300);
    let session_id = insert_challenge_session(
        &pool,
        user.id,
        &client_a.to_bytes_be(),
        &server_secret.to_bytes_be(),
        ttl_seconds,
    )
    .await?;

    auth_state
        .registry()
        .insert(PendingChallenge {
            session_id,
            username: user.username,
            client_a,
            server_secret,
            server_b: server_b.clone(),
            salt: user.salt.clone(),
            verifier,
            created_at: Instant::now(),
        })
        .await?;

    Ok(Json(ChallengeResponse {
        session_id: session_id.to_string(),
        salt: hex::encode(&user.salt),
        server_b: hex::encode(server_b.to_bytes_be()),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Proof accepted, token issued", body = VerifyResponse),
        (status = 400, description = "Malformed proof", body = super::error::ErrorBody),
        (status = 401, description = "Invalid credentials or expired session", body = super::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn verify(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("missing payload".to_string()));
    };

    let session_id = Uuid::parse_str(request.session_id.trim())
        .map_err(|_| ApiError::BadRequest("invalid session_id format".to_string()))?;

    // The challenge is consumed before any verification: one attempt per
    // challenge, no matter how the attempt ends.
    let Some(challenge) = auth_state.registry().take(session_id).await else {
        return Err(ApiError::Authentication(
            "invalid or expired session".to_string(),
        ));
    };

    if challenge.is_expired(auth_state.registry().ttl()) {
        return Err(ApiError::SessionExpired);
    }

    let client_proof = decode_hex_field(&request.client_proof, "client_proof")?;

    let proof_input = client_proof.clone();
    let (proof_ok, server_proof, challenge) = tokio::task::spawn_blocking(move || {
        let group = &*RFC5054_2048;
        let u = group.compute_u(&challenge.client_a, &challenge.server_b)?;
        let key = group.compute_server_session_key(
            &challenge.client_a,
            &challenge.server_secret,
            &challenge.verifier,
            &u,
        )?;
        let proof_ok = group.verify_client_proof(
            &challenge.username,
            &challenge.salt,
            &challenge.client_a,
            &challenge.server_b,
            &key,
            &proof_input,
        );
        let server_proof = group.compute_server_proof(&challenge.client_a, &proof_input, &key);
        Ok::<_, SrpError>((proof_ok, server_proof, challenge))
    })
    .await
    .context("session key task failed")?
    .map_err(|err| match err {
        SrpError::InvalidPublicValue | SrpError::ZeroScramble => {
            ApiError::BadRequest("protocol invariant violated".to_string())
        }
        other => ApiError::Internal(anyhow!(other)),
    })?;

    if !proof_ok {
        return Err(ApiError::Authentication("invalid credentials".to_string()));
    }

    let now = Utc::now();
    let expires_at = now + chrono::Duration::seconds(auth_state.config().jwt_expiry_seconds());
    let claims = SessionTokenClaims {
        session_id: challenge.session_id.to_string(),
        username: challenge.username.clone(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };
    let token = sign_hs256(auth_state.config().jwt_secret(), &claims)
        .context("failed to sign session token")?;

    let Some(session) = lookup_session_by_id(&pool, challenge.session_id).await? else {
        return Err(ApiError::Internal(anyhow!(
            "session row missing for verified challenge"
        )));
    };
    if !bind_session_token(&pool, session.id, &token, expires_at).await? {
        return Err(ApiError::Internal(anyhow!(
            "session row vanished while binding token"
        )));
    }

    info!(username = %challenge.username, "Authentication succeeded");

    Ok(Json(VerifyResponse {
        token,
        server_proof: hex::encode(server_proof),
        expires_at,
    }))
}

/// Parse a claims `exp` into a timestamp for the blacklist, saturating to now.
pub(super) fn claims_expiry(exp: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(exp, 0).unwrap_or(now)
}
