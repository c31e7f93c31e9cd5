//! The error taxonomy every handler maps into.
//!
//! Adapter and crypto failures bubble up as `anyhow` errors and surface as
//! `INTERNAL_ERROR` without leaking their cause; everything the client can
//! act on gets a stable `code` and an HTTP status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authentication(String),
    #[error("Session has expired")]
    SessionExpired,
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Too many requests, please try again later")]
    TooManyRequests,
    #[error("An internal error occurred")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl ApiError {
    pub(crate) const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Authentication(_) => "AUTHENTICATION_ERROR",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub(crate) const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) | Self::SessionExpired => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire shape of every error response.
#[derive(Serialize, ToSchema, Debug)]
pub(crate) struct ErrorBody {
    pub(crate) code: &'static str,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // The cause of an internal error is for the logs, never the client.
        if let Self::Internal(ref err) = self {
            error!("Internal error: {err:#}");
        }

        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
            details: None,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn codes_and_statuses_match_taxonomy() {
        let cases = [
            (
                ApiError::BadRequest("bad hex".to_string()),
                "BAD_REQUEST",
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Validation("short password".to_string()),
                "VALIDATION_ERROR",
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Authentication("invalid credentials".to_string()),
                "AUTHENTICATION_ERROR",
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::SessionExpired,
                "SESSION_EXPIRED",
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::NotFound("user".to_string()),
                "NOT_FOUND",
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Conflict("username already exists".to_string()),
                "CONFLICT",
                StatusCode::CONFLICT,
            ),
            (
                ApiError::TooManyRequests,
                "TOO_MANY_REQUESTS",
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                ApiError::Internal(anyhow!("boom")),
                "INTERNAL_ERROR",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, code, status) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn internal_error_hides_its_cause() {
        let err = ApiError::Internal(anyhow!("connection refused at 10.0.0.3"));
        assert_eq!(err.to_string(), "An internal error occurred");
    }

    #[tokio::test]
    async fn response_carries_the_code() {
        let response = ApiError::Conflict("username already exists".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or_default();
        assert_eq!(body["code"], "CONFLICT");
        assert_eq!(body["message"], "username already exists");
        assert!(body.get("details").is_none());
    }
}
