// ============================================
// File: crates/lightwire-core/src/crypto/kdf.rs
// ============================================
//! # Key Derivation Functions
//!
//! ## Creation Reason
//! Hashing and HKDF helpers for the handshake ratchet and the transport
//! key rotation.
//!
//! ## Main Functionality
//! - `sha256`: Digest over a list of byte slices
//! - `hkdf_expand2`: `HKDF(salt = ck, ikm)` split into two 32-byte outputs
//! - `hkdf_expand3`: Same with three outputs
//!
//! ## ⚠️ Important Note for Next Developer
//! - The info parameter is always empty
//! - Outputs are `Zeroizing`; move them into key types, don't copy them around
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::SHA256_SIZE;
use crate::error::{CoreError, Result};

/// A 32-byte derived secret that is wiped on drop.
pub type DerivedKey = Zeroizing<[u8; 32]>;

/// SHA-256 over the concatenation of `parts`.
#[must_use]
pub fn sha256(parts: &[&[u8]]) -> [u8; SHA256_SIZE] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

fn hkdf_expand<const N: usize>(salt: &[u8], ikm: &[u8]) -> Result<Zeroizing<[u8; N]>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = Zeroizing::new([0u8; N]);
    hk.expand(&[], &mut okm[..])
        .map_err(|_| CoreError::KeyDerivation {
            reason: format!("HKDF expansion failed for {N} bytes"),
        })?;
    Ok(okm)
}

fn take32(okm: &[u8], index: usize) -> DerivedKey {
    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(&okm[index * 32..(index + 1) * 32]);
    out
}

/// Two-output HKDF keyed by the chaining key.
///
/// # Errors
/// `KeyDerivation` if HKDF rejects the output length (cannot happen for 64 bytes).
pub fn hkdf_expand2(salt: &[u8], ikm: &[u8]) -> Result<(DerivedKey, DerivedKey)> {
    let okm = hkdf_expand::<64>(salt, ikm)?;
    Ok((take32(&*okm, 0), take32(&*okm, 1)))
}

/// Three-output HKDF keyed by the chaining key.
///
/// # Errors
/// `KeyDerivation` if HKDF rejects the output length.
pub fn hkdf_expand3(salt: &[u8], ikm: &[u8]) -> Result<(DerivedKey, DerivedKey, DerivedKey)> {
    let okm = hkdf_expand::<96>(salt, ikm)?;
    Ok((take32(&*okm, 0), take32(&*okm, 1), take32(&*okm, 2)))
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_protocol_name() {
        // h = SHA256("Noise_XK_secp256k1_ChaChaPoly_SHA256")
        assert_eq!(
            hex::encode(sha256(&[b"Noise_XK_secp256k1_ChaChaPoly_SHA256"])),
            "2640f52eebcd9e882958951c794250eedb28002c05d7dc2ea0f195406042caf1"
        );
    }

    #[test]
    fn test_sha256_concatenates_parts() {
        assert_eq!(sha256(&[b"ab", b"cd"]), sha256(&[b"abcd"]));
    }

    #[test]
    fn test_hkdf_expand2_matches_handshake_vector() {
        // BOLT8 act one MixKey(es)
        let ck = hex::decode("2640f52eebcd9e882958951c794250eedb28002c05d7dc2ea0f195406042caf1")
            .unwrap();
        let es = hex::decode("1e2fb3c8fe8fb9f262f649f64d26ecf0f2c0a805a767cf02dc2d77a6ef1fdcc3")
            .unwrap();
        let (ck2, temp_k1) = hkdf_expand2(&ck, &es).unwrap();
        assert_eq!(
            hex::encode(*ck2),
            "b61ec1191326fa240decc9564369dbb3ae2b34341d1e11ad64ed89f89180582f"
        );
        assert_eq!(
            hex::encode(*temp_k1),
            "e68f69b7f096d7917245f5e5cf8ae1595febe4d4644333c99f9c4a1282031c9f"
        );
    }

    #[test]
    fn test_hkdf_expand3_prefix_matches_expand2() {
        let (a2, b2) = hkdf_expand2(&[7u8; 32], b"ikm").unwrap();
        let (a3, b3, c3) = hkdf_expand3(&[7u8; 32], b"ikm").unwrap();
        assert_eq!(*a2, *a3);
        assert_eq!(*b2, *b3);
        assert_ne!(*c3, *b3);
    }
}
