use anyhow::{Context, Result};
use axum::{
    Extension,
    body::Body,
    extract::MatchedPath,
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::watch};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span, warn};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;

pub(crate) mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

use handlers::{
    auth::{AuthConfig, AuthState, Environment, RateLimiter, janitor},
    root,
};

/// Server-side timeouts from configuration.
#[derive(Debug, Clone, Copy)]
pub struct HttpTimeouts {
    pub read: Duration,
    pub write: Duration,
    pub idle: Duration,
}

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    auth_config: AuthConfig,
    timeouts: HttpTimeouts,
    rate_limiter: Arc<dyn RateLimiter>,
) -> Result<()> {
    let environment = auth_config.environment();

    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(timeouts.idle)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    // Migration failure is fatal in production; development keeps running so a
    // schema fix can land without bouncing the process.
    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(()) => info!("Database migrations applied"),
        Err(err) if environment == Environment::Development => {
            warn!("Continuing with failed migrations: {err}");
        }
        Err(err) => return Err(err).context("Failed to run database migrations"),
    }

    let auth_state = Arc::new(AuthState::new(auth_config, rate_limiter));

    // Janitors expire pending challenges, blacklisted tokens, and stale
    // session rows; they drain on the shutdown signal below.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    janitor::spawn(auth_state.clone(), pool.clone(), shutdown_rx);

    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_origin(Any)
        .max_age(Duration::from_secs(3600));

    // One deadline covers reading the request and writing the response.
    let request_deadline = timeouts.read + timeouts.write;

    // Build the router from OpenAPI-wired routes, then extend it with non-doc
    // routes like `/` and the JSON 404 fallback.
    let (router, _openapi) = router().split_for_parts();
    let app = router
        .route("/", get(root::root))
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(TimeoutLayer::new(request_deadline))
                .layer(Extension(auth_state.clone()))
                .layer(Extension(pool.clone())),
        );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Gracefully shutdown");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {err}");
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
