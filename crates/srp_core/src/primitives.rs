//! Byte-level building blocks shared by the SRP engine.

use num_bigint::BigUint;
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::SrpError;

/// SHA-256 digest size in bytes.
pub const HASH_LENGTH: usize = 32;

/// SHA-256 over the concatenation of `parts`, in order.
///
/// There are no separators between parts; callers that concatenate two
/// variable-length integers must [`pad_to`] a fixed width first, otherwise
/// distinct splits of the same byte stream collide.
#[must_use]
pub fn hash(parts: &[&[u8]]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Left-pad `bytes` with zeros to exactly `len` bytes.
///
/// # Errors
/// Returns [`SrpError::PadOverflow`] if the input is already longer than `len`.
pub fn pad_to(bytes: &[u8], len: usize) -> Result<Vec<u8>, SrpError> {
    if bytes.len() > len {
        return Err(SrpError::PadOverflow(len));
    }
    let mut padded = vec![0u8; len];
    padded[len - bytes.len()..].copy_from_slice(bytes);
    Ok(padded)
}

/// `n` bytes from the operating system CSPRNG.
///
/// # Errors
/// Returns [`SrpError::Rng`] if the random source fails.
pub fn random_bytes(n: usize) -> Result<Vec<u8>, SrpError> {
    let mut bytes = vec![0u8; n];
    OsRng.try_fill_bytes(&mut bytes).map_err(SrpError::Rng)?;
    Ok(bytes)
}

/// A uniformly random non-negative integer of `bits` width.
///
/// Whole bytes are drawn from the CSPRNG, so the result is uniform over
/// `[0, 2^bits)` with no rejection or modular bias. `bits` must be a multiple
/// of 8, which holds for every caller in this crate.
///
/// # Errors
/// Returns [`SrpError::Rng`] if the random source fails.
pub fn random_biguint(bits: usize) -> Result<BigUint, SrpError> {
    let bytes = random_bytes(bits / 8)?;
    Ok(BigUint::from_bytes_be(&bytes))
}

/// Length-safe constant-time equality for digests, proofs, and verifiers.
///
/// Length is not secret: a mismatch returns false immediately. Equal-length
/// inputs are compared in time independent of where they differ.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_order_sensitive() {
        let ab = hash(&[b"alpha", b"beta"]);
        let ba = hash(&[b"beta", b"alpha"]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn hash_matches_single_buffer() {
        let split = hash(&[b"user", b":", b"password"]);
        let joined = hash(&[b"user:password"]);
        assert_eq!(split, joined);
    }

    #[test]
    fn pad_to_left_pads_with_zeros() -> Result<(), SrpError> {
        let padded = pad_to(&[0xAB, 0xCD], 4)?;
        assert_eq!(padded, vec![0x00, 0x00, 0xAB, 0xCD]);
        Ok(())
    }

    #[test]
    fn pad_to_keeps_exact_width_input() -> Result<(), SrpError> {
        let padded = pad_to(&[1, 2, 3], 3)?;
        assert_eq!(padded, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn pad_to_rejects_oversized_input() {
        let result = pad_to(&[1, 2, 3, 4], 3);
        assert!(matches!(result, Err(SrpError::PadOverflow(3))));
    }

    #[test]
    fn random_bytes_has_requested_length() -> Result<(), SrpError> {
        assert_eq!(random_bytes(32)?.len(), 32);
        assert_eq!(random_bytes(0)?.len(), 0);
        Ok(())
    }

    #[test]
    fn random_biguint_stays_within_width() -> Result<(), SrpError> {
        for _ in 0..16 {
            let value = random_biguint(256)?;
            assert!(value.bits() <= 256);
        }
        Ok(())
    }

    #[test]
    fn constant_time_eq_rejects_length_mismatch() {
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn constant_time_eq_compares_contents() {
        assert!(constant_time_eq(b"proof", b"proof"));
        assert!(!constant_time_eq(b"proof", b"proog"));
    }
}
