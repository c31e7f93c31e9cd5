pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_PORT: &str = "port";
pub const ARG_DSN: &str = "dsn";
pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_JWT_EXPIRY: &str = "jwt-expiry";
pub const ARG_READ_TIMEOUT: &str = "read-timeout";
pub const ARG_WRITE_TIMEOUT: &str = "write-timeout";
pub const ARG_IDLE_TIMEOUT: &str = "idle-timeout";
pub const ARG_RATE_LIMIT_REQUESTS: &str = "rate-limit-requests";
pub const ARG_RATE_LIMIT_WINDOW: &str = "rate-limit-window";
pub const ARG_SRP_KEY_LENGTH: &str = "srp-key-length";
pub const ARG_SRP_HASH_ALGORITHM: &str = "srp-hash-algorithm";

/// Check that the informational SRP knobs match the only group this server
/// speaks; anything else would silently authenticate nobody.
///
/// # Errors
/// Returns an error string if an unsupported group size or hash is requested.
pub fn validate(matches: &clap::ArgMatches) -> Result<(), String> {
    if let Some(bits) = matches.get_one::<u32>(ARG_SRP_KEY_LENGTH)
        && *bits != 2048
    {
        return Err(format!(
            "Unsupported SRP key length {bits}: only the RFC 5054 2048-bit group is available"
        ));
    }

    if let Some(hash) = matches.get_one::<String>(ARG_SRP_HASH_ALGORITHM)
        && !hash.eq_ignore_ascii_case("SHA256")
    {
        return Err(format!(
            "Unsupported SRP hash algorithm {hash}: only SHA256 is available"
        ));
    }

    Ok(())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("zkauth")
        .about("Zero-knowledge authentication server (SRP-6a)")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("SERVER_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("DATABASE_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .long("environment")
                .help("Deployment environment; production refuses to start on migration failure")
                .default_value("development")
                .env("ENVIRONMENT")
                .value_parser(["development", "production"]),
        )
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long("jwt-secret")
                .help("HMAC key for signing bearer tokens")
                .env("JWT_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_JWT_EXPIRY)
                .long("jwt-expiry")
                .help("Bearer token lifetime in seconds")
                .default_value("86400")
                .env("JWT_EXPIRY")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_READ_TIMEOUT)
                .long("read-timeout")
                .help("Server read timeout in seconds")
                .default_value("15")
                .env("SERVER_READ_TIMEOUT")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_WRITE_TIMEOUT)
                .long("write-timeout")
                .help("Server write timeout in seconds")
                .default_value("15")
                .env("SERVER_WRITE_TIMEOUT")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_IDLE_TIMEOUT)
                .long("idle-timeout")
                .help("Idle connection timeout in seconds")
                .default_value("60")
                .env("SERVER_IDLE_TIMEOUT")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_RATE_LIMIT_REQUESTS)
                .long("rate-limit-requests")
                .help("Requests allowed per client IP within the rate-limit window")
                .default_value("100")
                .env("RATE_LIMIT_REQUESTS")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_RATE_LIMIT_WINDOW)
                .long("rate-limit-window")
                .help("Rate-limit window in seconds")
                .default_value("60")
                .env("RATE_LIMIT_WINDOW")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_SRP_KEY_LENGTH)
                .long("srp-key-length")
                .help("SRP group size in bits (informational; only 2048 is supported)")
                .default_value("2048")
                .env("SRP_KEY_LENGTH")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_SRP_HASH_ALGORITHM)
                .long("srp-hash-algorithm")
                .help("SRP hash algorithm (informational; only SHA256 is supported)")
                .default_value("SHA256")
                .env("SRP_HASH_ALGORITHM"),
        );

    logging::with_args(command)
}
