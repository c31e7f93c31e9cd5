//! # zkauth (Zero-knowledge authentication server)
//!
//! `zkauth` authenticates users with the SRP-6a password-authenticated key
//! exchange. Passwords are never transmitted after registration and never
//! stored: the database holds a per-user random salt and the verifier
//! `g^x mod N`, and each login proves knowledge of the password through a
//! two-phase challenge/verify exchange.
//!
//! ## Protocol flow
//!
//! - **Register** validates the username and password, derives a fresh
//!   `(salt, verifier)` pair, and persists it. Conflicting usernames are
//!   rejected, racing registrations included.
//! - **Challenge** accepts the client ephemeral `A`, answers with the salt and
//!   the server ephemeral `B`, and parks the exchange in an in-memory
//!   registry keyed by session id. Unknown users are indistinguishable from
//!   wrong passwords.
//! - **Verify** consumes the pending challenge *before* checking the client
//!   proof, so every challenge admits exactly one verification attempt.
//!   Success binds an HS256 bearer token to the session.
//! - **Logout** deletes the session and revokes the token in an in-process
//!   blacklist until its natural expiry.
//!
//! Background janitors expire pending challenges (5 minute TTL), drop expired
//! session rows, and prune the blacklist.

pub mod api;
pub mod cli;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
