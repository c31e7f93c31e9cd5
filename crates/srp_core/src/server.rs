//! The server side of the SRP-6a exchange.
//!
//! All operations are pure functions over the group; callers own the mapping
//! from wire encodings (hex) to `BigUint` and back.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::SrpError;
use crate::group::{N_LENGTH, SALT_LENGTH, SrpGroup};
use crate::primitives::{HASH_LENGTH, constant_time_eq, hash, pad_to, random_biguint, random_bytes};

/// Bit width of the server ephemeral secret `b`.
const EPHEMERAL_BITS: usize = 256;

impl SrpGroup {
    /// A fresh random salt for registration.
    ///
    /// # Errors
    /// Returns an error if the system random source fails.
    pub fn generate_salt(&self) -> Result<Vec<u8>, SrpError> {
        random_bytes(SALT_LENGTH)
    }

    /// The password verifier `v = g^x mod N` with
    /// `x = H(salt | H(username | ":" | password))`.
    #[must_use]
    pub fn compute_verifier(&self, username: &str, password: &str, salt: &[u8]) -> BigUint {
        let x = self.compute_x(username, password, salt);
        self.g.modpow(&x, &self.n)
    }

    /// Server ephemeral keys `(b, B)` with `B = (k*v + g^b) mod N`.
    ///
    /// Resamples `b` until `B != 0 mod N`, so the returned `B` is always safe
    /// to hand to a client.
    ///
    /// # Errors
    /// Returns an error if the system random source fails.
    pub fn generate_server_keys(&self, verifier: &BigUint) -> Result<(BigUint, BigUint), SrpError> {
        loop {
            let b = random_biguint(EPHEMERAL_BITS)?;
            let g_b = self.g.modpow(&b, &self.n);
            let b_pub = (&self.k * verifier + g_b) % &self.n;
            if !b_pub.is_zero() {
                return Ok((b, b_pub));
            }
        }
    }

    /// The scrambling parameter `u = H(PAD(A, |N|) | PAD(B, |N|))`.
    ///
    /// # Errors
    /// Returns [`SrpError::ZeroScramble`] if the hash is zero (`u = 0` would
    /// cancel the verifier out of the session key) and
    /// [`SrpError::PadOverflow`] if either value exceeds the modulus width.
    pub fn compute_u(&self, a_pub: &BigUint, b_pub: &BigUint) -> Result<BigUint, SrpError> {
        let a_padded = pad_to(&a_pub.to_bytes_be(), N_LENGTH)?;
        let b_padded = pad_to(&b_pub.to_bytes_be(), N_LENGTH)?;
        let u = BigUint::from_bytes_be(&hash(&[&a_padded, &b_padded]));
        if u.is_zero() {
            return Err(SrpError::ZeroScramble);
        }
        Ok(u)
    }

    /// The server session key `K = H(S)` with `S = (A * v^u)^b mod N`.
    ///
    /// # Errors
    /// Returns [`SrpError::InvalidPublicValue`] when `A = 0 mod N`; a client
    /// sending such a value would force `S = 0` regardless of the password.
    pub fn compute_server_session_key(
        &self,
        a_pub: &BigUint,
        b: &BigUint,
        verifier: &BigUint,
        u: &BigUint,
    ) -> Result<[u8; HASH_LENGTH], SrpError> {
        if (a_pub % &self.n).is_zero() {
            return Err(SrpError::InvalidPublicValue);
        }
        let v_u = verifier.modpow(u, &self.n);
        let base = (a_pub * v_u) % &self.n;
        let secret = base.modpow(b, &self.n);
        Ok(hash(&[&secret.to_bytes_be()]))
    }

    /// The client proof `M1 = H(H(N) XOR H(g) | H(username) | salt | A | B | K)`.
    #[must_use]
    pub fn compute_client_proof(
        &self,
        username: &str,
        salt: &[u8],
        a_pub: &BigUint,
        b_pub: &BigUint,
        key: &[u8],
    ) -> [u8; HASH_LENGTH] {
        let h_n = hash(&[&self.n.to_bytes_be()]);
        let h_g = hash(&[&self.g.to_bytes_be()]);
        let mut h_ng = [0u8; HASH_LENGTH];
        for (out, (n_byte, g_byte)) in h_ng.iter_mut().zip(h_n.iter().zip(h_g.iter())) {
            *out = n_byte ^ g_byte;
        }
        let h_user = hash(&[username.as_bytes()]);
        hash(&[
            &h_ng,
            &h_user,
            salt,
            &a_pub.to_bytes_be(),
            &b_pub.to_bytes_be(),
            key,
        ])
    }

    /// Recompute `M1` and compare it with the client's proof in constant time.
    #[must_use]
    pub fn verify_client_proof(
        &self,
        username: &str,
        salt: &[u8],
        a_pub: &BigUint,
        b_pub: &BigUint,
        key: &[u8],
        client_proof: &[u8],
    ) -> bool {
        let expected = self.compute_client_proof(username, salt, a_pub, b_pub, key);
        constant_time_eq(&expected, client_proof)
    }

    /// The server proof `M2 = H(A | M1 | K)`, returned to the client so it can
    /// authenticate the server in turn.
    #[must_use]
    pub fn compute_server_proof(
        &self,
        a_pub: &BigUint,
        client_proof: &[u8],
        key: &[u8],
    ) -> [u8; HASH_LENGTH] {
        hash(&[&a_pub.to_bytes_be(), client_proof, key])
    }

    fn compute_x(&self, username: &str, password: &str, salt: &[u8]) -> BigUint {
        let credentials = hash(&[username.as_bytes(), b":", password.as_bytes()]);
        BigUint::from_bytes_be(&hash(&[salt, &credentials]))
    }
}
