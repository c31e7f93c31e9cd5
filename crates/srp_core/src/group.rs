//! The SRP group parameters shared by every exchange.

use num_bigint::BigUint;
use once_cell::sync::Lazy;

use crate::primitives::{hash, pad_to};

/// Width of the modulus in bytes; fixed-width encodings pad to this length.
pub const N_LENGTH: usize = 256;

/// Salt length in bytes for newly registered users.
pub const SALT_LENGTH: usize = 32;

// 2048-bit safe prime from RFC 5054 Appendix A, generator 2.
const N_2048_HEX: &str = "\
AC6BDB41324A9A9BF166DE5E1389582FAF72B6651987EE07FC3192943DB56050\
A37329CBB4A099ED8193E0757767A13DD52312AB4B03310DCD7F48A9DA04FD50\
E8083969EDB767B0CF6095179A163AB3661A05FBD5FAAAE82918A9962F0B93B8\
55F97993EC975EEAA80D740ADBF4FF747359D041D5C33EA71D281E446B14773B\
CA97B43A23FB801676BD207A436C6481F1D2B9078717461A5B9D32E688F87748\
544523B524B0D57D5EA77A2775D2ECFA032CFBDBF52FB3786160279004E57AE6\
AF874E7303CE53299CCC041C7BC308D82A5698F3A8D0C38271AE35F8E9DBFBB6\
94B5C803D89F7AE435DE236D525F54759B65E372FCD68EF20FA7111F9E4AFF73";

/// The process-wide group; `k` is derived once and cached here.
pub static RFC5054_2048: Lazy<SrpGroup> = Lazy::new(SrpGroup::rfc5054_2048);

/// An SRP-6a group `(N, g)` with its precomputed multiplier `k`.
pub struct SrpGroup {
    pub(crate) n: BigUint,
    pub(crate) g: BigUint,
    pub(crate) k: BigUint,
}

impl SrpGroup {
    /// The 2048-bit group from RFC 5054 Appendix A with `g = 2`.
    #[must_use]
    pub fn rfc5054_2048() -> Self {
        let n = BigUint::parse_bytes(N_2048_HEX.as_bytes(), 16)
            .expect("RFC 5054 modulus constant is valid hex");
        let g = BigUint::from(2u32);
        let k = compute_k(&n, &g);
        Self { n, g, k }
    }

    #[must_use]
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    #[must_use]
    pub fn generator(&self) -> &BigUint {
        &self.g
    }

    /// The multiplier `k = H(N | PAD(g, |N|))`.
    #[must_use]
    pub fn multiplier(&self) -> &BigUint {
        &self.k
    }
}

fn compute_k(n: &BigUint, g: &BigUint) -> BigUint {
    let g_padded = pad_to(&g.to_bytes_be(), N_LENGTH)
        .expect("generator is smaller than the modulus width");
    BigUint::from_bytes_be(&hash(&[&n.to_bytes_be(), &g_padded]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    #[test]
    fn modulus_is_2048_bits() {
        assert_eq!(RFC5054_2048.modulus().bits(), 2048);
        assert_eq!(RFC5054_2048.modulus().to_bytes_be().len(), N_LENGTH);
    }

    #[test]
    fn generator_is_two() {
        assert_eq!(*RFC5054_2048.generator(), BigUint::from(2u32));
    }

    // k = H(N | PAD(g, 256)) for this group, computed independently.
    #[test]
    fn multiplier_matches_known_value() {
        let expected = "05b9e8ef059c6b32ea59fc1d322d37f04aa30bae5aa9003b8321e21ddb04e300";
        assert_eq!(hex::encode(RFC5054_2048.multiplier().to_bytes_be()), expected);
    }

    // N is a safe prime, so 2 generates the full group: 2^((N-1)/2) = N - 1.
    #[test]
    fn generator_has_full_order() {
        let group = &*RFC5054_2048;
        let q = (group.modulus() - BigUint::one()) >> 1;
        let result = group.generator().modpow(&q, group.modulus());
        assert_eq!(result, group.modulus() - BigUint::one());
    }
}
