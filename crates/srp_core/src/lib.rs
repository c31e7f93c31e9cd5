//! Server-side SRP-6a (RFC 5054) over the 2048-bit safe-prime group.
//!
//! The server never sees a password: registration stores a random salt and the
//! verifier `v = g^x mod N`, and every login proves knowledge of the password
//! through the mutual proofs `M1`/`M2` derived from the shared session key.
//!
//! Everything in this crate is pure computation over `(N, g, k)`; state
//! (pending challenges, sessions, tokens) lives in the service that calls it.

mod error;
mod group;
mod primitives;
mod server;

pub use error::SrpError;
pub use group::{N_LENGTH, RFC5054_2048, SALT_LENGTH, SrpGroup};
pub use primitives::{HASH_LENGTH, constant_time_eq, hash, pad_to, random_biguint, random_bytes};
