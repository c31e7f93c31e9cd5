use crate::cli::{
    actions::{Action, server::Args},
    commands,
};
use anyhow::{Context, Result};
use secrecy::SecretString;

struct RateLimitArgs {
    requests: u32,
    window_seconds: u64,
}

fn parse_rate_limit_args(matches: &clap::ArgMatches) -> RateLimitArgs {
    RateLimitArgs {
        requests: matches
            .get_one::<u32>(commands::ARG_RATE_LIMIT_REQUESTS)
            .copied()
            .unwrap_or(100),
        window_seconds: matches
            .get_one::<u64>(commands::ARG_RATE_LIMIT_WINDOW)
            .copied()
            .unwrap_or(60),
    }
}

struct TimeoutArgs {
    read_seconds: u64,
    write_seconds: u64,
    idle_seconds: u64,
}

fn parse_timeout_args(matches: &clap::ArgMatches) -> TimeoutArgs {
    TimeoutArgs {
        read_seconds: matches
            .get_one::<u64>(commands::ARG_READ_TIMEOUT)
            .copied()
            .unwrap_or(15),
        write_seconds: matches
            .get_one::<u64>(commands::ARG_WRITE_TIMEOUT)
            .copied()
            .unwrap_or(15),
        idle_seconds: matches
            .get_one::<u64>(commands::ARG_IDLE_TIMEOUT)
            .copied()
            .unwrap_or(60),
    }
}

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(commands::ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;

    let jwt_secret = matches
        .get_one::<String>(commands::ARG_JWT_SECRET)
        .cloned()
        .context("missing required argument: --jwt-secret")?;
    if jwt_secret.trim().is_empty() {
        anyhow::bail!("JWT_SECRET must not be empty");
    }

    let jwt_expiry_seconds = matches
        .get_one::<i64>(commands::ARG_JWT_EXPIRY)
        .copied()
        .unwrap_or(86_400);
    if jwt_expiry_seconds <= 0 {
        anyhow::bail!("JWT_EXPIRY must be positive");
    }

    let environment = matches
        .get_one::<String>(commands::ARG_ENVIRONMENT)
        .cloned()
        .unwrap_or_else(|| "development".to_string());

    let rate_limit = parse_rate_limit_args(matches);
    let timeouts = parse_timeout_args(matches);

    Ok(Action::Server(Args {
        port,
        dsn,
        environment,
        jwt_secret: SecretString::from(jwt_secret),
        jwt_expiry_seconds,
        read_timeout_seconds: timeouts.read_seconds,
        write_timeout_seconds: timeouts.write_seconds,
        idle_timeout_seconds: timeouts.idle_seconds,
        rate_limit_requests: rate_limit.requests,
        rate_limit_window_seconds: rate_limit.window_seconds,
    }))
}
