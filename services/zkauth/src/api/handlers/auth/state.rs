//! Auth state and configuration.

use anyhow::{Result, bail};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;

use super::blacklist::TokenBlacklist;
use super::rate_limit::RateLimiter;
use super::registry::ChallengeRegistry;

const DEFAULT_JWT_EXPIRY_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_CHALLENGE_TTL_SECONDS: u64 = 5 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// # Errors
    /// Returns an error for anything but `development` or `production`.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => bail!("Unknown environment: {other}"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    jwt_secret: SecretString,
    jwt_expiry_seconds: i64,
    challenge_ttl_seconds: u64,
    environment: Environment,
}

impl AuthConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString, environment: Environment) -> Self {
        Self {
            jwt_secret,
            jwt_expiry_seconds: DEFAULT_JWT_EXPIRY_SECONDS,
            challenge_ttl_seconds: DEFAULT_CHALLENGE_TTL_SECONDS,
            environment,
        }
    }

    #[must_use]
    pub fn with_jwt_expiry_seconds(mut self, seconds: i64) -> Self {
        self.jwt_expiry_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_challenge_ttl_seconds(mut self, seconds: u64) -> Self {
        self.challenge_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub(super) fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }

    pub(super) fn jwt_expiry_seconds(&self) -> i64 {
        self.jwt_expiry_seconds
    }

    pub(super) fn challenge_ttl(&self) -> Duration {
        Duration::from_secs(self.challenge_ttl_seconds)
    }
}

pub struct AuthState {
    config: AuthConfig,
    registry: ChallengeRegistry,
    blacklist: TokenBlacklist,
    rate_limiter: Arc<dyn RateLimiter>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        let registry = ChallengeRegistry::new(config.challenge_ttl());
        Self {
            config,
            registry,
            blacklist: TokenBlacklist::new(),
            rate_limiter,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(super) fn registry(&self) -> &ChallengeRegistry {
        &self.registry
    }

    pub(super) fn blacklist(&self) -> &TokenBlacklist {
        &self.blacklist
    }

    pub(super) fn rate_limiter(&self) -> &dyn RateLimiter {
        self.rate_limiter.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::super::rate_limit::NoopRateLimiter;
    use super::*;

    #[test]
    fn environment_parses_known_values() -> Result<()> {
        assert_eq!(Environment::parse("development")?, Environment::Development);
        assert_eq!(Environment::parse("production")?, Environment::Production);
        assert!(Environment::parse("staging").is_err());
        Ok(())
    }

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new(
            SecretString::from("secret".to_string()),
            Environment::Development,
        );
        assert_eq!(config.jwt_expiry_seconds(), DEFAULT_JWT_EXPIRY_SECONDS);
        assert_eq!(
            config.challenge_ttl(),
            Duration::from_secs(DEFAULT_CHALLENGE_TTL_SECONDS)
        );

        let config = config
            .with_jwt_expiry_seconds(120)
            .with_challenge_ttl_seconds(30);
        assert_eq!(config.jwt_expiry_seconds(), 120);
        assert_eq!(config.challenge_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn auth_state_exposes_secret_only_as_bytes() {
        let config = AuthConfig::new(
            SecretString::from("hunter2".to_string()),
            Environment::Development,
        );
        let state = AuthState::new(config, Arc::new(NoopRateLimiter));
        assert_eq!(state.config().jwt_secret(), b"hunter2");
        assert!(!format!("{:?}", state.config()).contains("hunter2"));
    }
}
