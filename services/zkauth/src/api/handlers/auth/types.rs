//! Request/response types for auth endpoints.
//!
//! Binary protocol values (`client_a`, `salt`, `server_b`, proofs) travel as
//! lowercase hex strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub user_id: String,
    pub username: String,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChallengeRequest {
    pub username: String,
    pub client_a: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChallengeResponse {
    pub session_id: String,
    pub salt: String,
    pub server_b: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyRequest {
    pub session_id: String,
    pub client_proof: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyResponse {
    pub token: String,
    pub server_proof: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ProfileResponse {
    pub user_id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};
    use chrono::TimeZone;

    #[test]
    fn challenge_request_round_trips() -> Result<()> {
        let request = ChallengeRequest {
            username: "alice".to_string(),
            client_a: "00ff".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let client_a = value
            .get("client_a")
            .and_then(serde_json::Value::as_str)
            .context("missing client_a")?;
        assert_eq!(client_a, "00ff");
        let decoded: ChallengeRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.username, "alice");
        Ok(())
    }

    #[test]
    fn verify_response_expires_at_is_rfc3339() -> Result<()> {
        let expires_at = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 30, 0)
            .single()
            .context("valid timestamp")?;
        let response = VerifyResponse {
            token: "token".to_string(),
            server_proof: "beef".to_string(),
            expires_at,
        };
        let value = serde_json::to_value(&response)?;
        let rendered = value
            .get("expires_at")
            .and_then(serde_json::Value::as_str)
            .context("missing expires_at")?;
        assert!(rendered.starts_with("2024-05-01T12:30:00"));
        Ok(())
    }
}
