use crate::api::{
    self, HttpTimeouts,
    handlers::auth::{AuthConfig, Environment, SlidingWindowRateLimiter},
};
use anyhow::Result;
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};

pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub environment: String,
    pub jwt_secret: SecretString,
    pub jwt_expiry_seconds: i64,
    pub read_timeout_seconds: u64,
    pub write_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub rate_limit_requests: u32,
    pub rate_limit_window_seconds: u64,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("dsn", &self.dsn)
            .field("environment", &self.environment)
            .field("jwt_secret", &"***")
            .field("jwt_expiry_seconds", &self.jwt_expiry_seconds)
            .field("read_timeout_seconds", &self.read_timeout_seconds)
            .field("write_timeout_seconds", &self.write_timeout_seconds)
            .field("idle_timeout_seconds", &self.idle_timeout_seconds)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_window_seconds", &self.rate_limit_window_seconds)
            .finish()
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let environment = Environment::parse(&args.environment)?;

    let auth_config = AuthConfig::new(args.jwt_secret, environment)
        .with_jwt_expiry_seconds(args.jwt_expiry_seconds);

    let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(
        args.rate_limit_requests,
        Duration::from_secs(args.rate_limit_window_seconds),
    ));

    let timeouts = HttpTimeouts {
        read: Duration::from_secs(args.read_timeout_seconds),
        write: Duration::from_secs(args.write_timeout_seconds),
        idle: Duration::from_secs(args.idle_timeout_seconds),
    };

    api::new(args.port, args.dsn, auth_config, timeouts, rate_limiter).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_debug_masks_secret() {
        let args = Args {
            port: 8080,
            dsn: "postgres://localhost:5432/zkauth".to_string(),
            environment: "development".to_string(),
            jwt_secret: SecretString::from("hunter2".to_string()),
            jwt_expiry_seconds: 86_400,
            read_timeout_seconds: 15,
            write_timeout_seconds: 15,
            idle_timeout_seconds: 60,
            rate_limit_requests: 100,
            rate_limit_window_seconds: 60,
        };
        let rendered = format!("{args:?}");
        assert!(rendered.contains("***"));
        assert!(!rendered.contains("hunter2"));
    }
}
