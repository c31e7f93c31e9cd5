//! Signed bearer tokens for authenticated sessions.
//!
//! Tokens are compact three-segment JWTs
//! (`base64url(header).base64url(claims).base64url(signature)`) authenticated
//! with HMAC-SHA-256 under a server-held secret. Verification pins the
//! algorithm to `HS256` before touching the signature, so a token that claims
//! any other algorithm is rejected outright.

mod error;
mod jwt;

pub use error::Error;
pub use jwt::{SessionTokenClaims, SessionTokenHeader, sign_hs256, verify_hs256};
