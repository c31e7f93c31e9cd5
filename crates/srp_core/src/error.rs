use thiserror::Error;

#[derive(Debug, Error)]
pub enum SrpError {
    /// A public ephemeral value reduced to zero mod N. RFC 5054 requires
    /// aborting the exchange in that case.
    #[error("public ephemeral value is divisible by the group modulus")]
    InvalidPublicValue,
    /// The scrambling parameter `u = H(A | B)` hashed to zero.
    #[error("scrambling parameter is zero")]
    ZeroScramble,
    #[error("value does not fit into {0} bytes")]
    PadOverflow(usize),
    #[error("system random source failed")]
    Rng(#[source] rand::Error),
}
