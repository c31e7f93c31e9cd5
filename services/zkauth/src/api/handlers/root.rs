use axum::response::Json;
use serde_json::{Value, json};

// axum handler for the API info page
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "register": "POST /api/v1/register",
            "challenge": "POST /api/v1/auth/challenge",
            "verify": "POST /api/v1/auth/verify",
            "logout": "POST /api/v1/auth/logout",
            "refresh": "POST /api/v1/auth/refresh",
            "password": "PUT /api/v1/auth/password",
            "profile": "GET /api/v1/profile",
            "health": "GET /health",
        },
    }))
}
