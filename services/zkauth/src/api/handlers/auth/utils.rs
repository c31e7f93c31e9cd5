//! Small helpers for validation, wire decoding, and header extraction.

use axum::http::{HeaderMap, header::AUTHORIZATION};

use super::error::ApiError;

/// Username rule: 3 to 50 characters from `[A-Za-z0-9_]`.
pub(super) fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.len() < 3 || username.len() > 50 {
        return Err(ApiError::Validation(
            "username must be between 3 and 50 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ApiError::Validation(
            "username can only contain letters, numbers, and underscores".to_string(),
        ));
    }
    Ok(())
}

pub(super) fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

/// Decode a lowercase-hex protocol field, naming the field in the error.
pub(super) fn decode_hex_field(value: &str, field: &str) -> Result<Vec<u8>, ApiError> {
    hex::decode(value.trim())
        .map_err(|_| ApiError::BadRequest(format!("invalid {field} format")))
}

pub(super) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Extract a client IP for rate limiting from common proxy headers.
pub(super) fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn validate_username_accepts_valid_names() {
        for name in ["bob", "alice_01", "A_b_C", &"x".repeat(50)] {
            assert!(validate_username(name).is_ok(), "name {name:?}");
        }
    }

    #[test]
    fn validate_username_rejects_bad_lengths() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"x".repeat(51)).is_err());
    }

    #[test]
    fn validate_username_rejects_bad_characters() {
        for name in ["has space", "dash-ed", "ünïcode", "semi;colon"] {
            assert!(validate_username(name).is_err(), "name {name:?}");
        }
    }

    #[test]
    fn validate_password_enforces_minimum_length() {
        assert!(validate_password("short7!").is_err());
        assert!(validate_password("longenough").is_ok());
    }

    #[test]
    fn decode_hex_field_round_trips() -> Result<(), ApiError> {
        assert_eq!(decode_hex_field("00ff10", "client_a")?, vec![0x00, 0xFF, 0x10]);
        Ok(())
    }

    #[test]
    fn decode_hex_field_names_the_field() {
        let err = decode_hex_field("zz", "client_proof");
        match err {
            Err(ApiError::BadRequest(message)) => {
                assert_eq!(message, "invalid client_proof format");
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn extract_bearer_token_parses_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(
            extract_bearer_token(&headers),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn extract_bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn extract_client_ip_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("9.9.9.9".to_string()));
    }

    #[test]
    fn extract_client_ip_none_when_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers), None);
    }
}
