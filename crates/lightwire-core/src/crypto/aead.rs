// ============================================
// File: crates/lightwire-core/src/crypto/aead.rs
// ============================================
//! # ChaCha20-Poly1305 AEAD
//!
//! ## Creation Reason
//! Single place where the Noise nonce layout is built, shared by the
//! handshake ratchet and the transport cipher states.
//!
//! ## Nonce Format
//! ```text
//! nonce (12 bytes) = 0x00000000 (4 bytes) ‖ counter (8 bytes LE)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never reuse a (key, nonce) pair; counters are owned by the callers
//! - Decryption errors carry no detail beyond what was being decrypted
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

use super::keys::CipherKey;
use super::{CHACHA20_NONCE_SIZE, POLY1305_TAG_SIZE};
use crate::error::{CoreError, Result};

/// Builds the 96-bit nonce for `counter`.
fn make_nonce(counter: u64) -> Nonce {
    let mut nonce = [0u8; CHACHA20_NONCE_SIZE];
    nonce[4..].copy_from_slice(&counter.to_le_bytes());
    Nonce::from(nonce)
}

/// Encrypts `plaintext`, returning ciphertext followed by the 16-byte tag.
///
/// # Errors
/// `Encryption` if the cipher rejects the input (oversized plaintext).
pub fn encrypt_with_ad(
    key: &CipherKey,
    counter: u64,
    associated_data: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .encrypt(
            &make_nonce(counter),
            Payload {
                msg: plaintext,
                aad: associated_data,
            },
        )
        .map_err(|_| CoreError::Encryption {
            context: "ChaCha20-Poly1305 encryption failed".into(),
        })
}

/// Decrypts `ciphertext ‖ tag`.
///
/// # Errors
/// `Decryption` if the input is shorter than a tag or authentication fails.
pub fn decrypt_with_ad(
    key: &CipherKey,
    counter: u64,
    associated_data: &[u8],
    ciphertext: &[u8],
    context: &str,
) -> Result<Vec<u8>> {
    if ciphertext.len() < POLY1305_TAG_SIZE {
        return Err(CoreError::decryption(context));
    }
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(
            &make_nonce(counter),
            Payload {
                msg: ciphertext,
                aad: associated_data,
            },
        )
        .map_err(|_| CoreError::decryption(context))
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> CipherKey {
        CipherKey::from_bytes([0x42; 32])
    }

    #[test]
    fn test_nonce_layout() {
        let nonce = make_nonce(1);
        let mut expected = [0u8; 12];
        expected[4] = 1;
        assert_eq!(nonce.as_slice(), &expected);

        let nonce = make_nonce(0x0102_0304_0506_0708);
        assert_eq!(&nonce[..4], &[0, 0, 0, 0]);
        assert_eq!(&nonce[4..], &[8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = test_key();
        let ciphertext = encrypt_with_ad(&key, 7, b"ad", b"payload").unwrap();
        assert_eq!(ciphertext.len(), 7 + POLY1305_TAG_SIZE);

        let plaintext = decrypt_with_ad(&key, 7, b"ad", &ciphertext, "test").unwrap();
        assert_eq!(plaintext, b"payload");
    }

    #[test]
    fn test_empty_plaintext_is_tag_only() {
        let ciphertext = encrypt_with_ad(&test_key(), 0, &[], &[]).unwrap();
        assert_eq!(ciphertext.len(), POLY1305_TAG_SIZE);
    }

    #[test]
    fn test_mismatched_inputs_fail() {
        let key = test_key();
        let ciphertext = encrypt_with_ad(&key, 3, b"ad", b"payload").unwrap();

        assert!(decrypt_with_ad(&key, 4, b"ad", &ciphertext, "test").is_err());
        assert!(decrypt_with_ad(&key, 3, b"other", &ciphertext, "test").is_err());
        let other = CipherKey::from_bytes([0x43; 32]);
        assert!(decrypt_with_ad(&other, 3, b"ad", &ciphertext, "test").is_err());
    }

    #[test]
    fn test_any_flipped_byte_fails() {
        let key = test_key();
        let ciphertext = encrypt_with_ad(&key, 0, &[], b"abc").unwrap();
        for i in 0..ciphertext.len() {
            let mut tampered = ciphertext.clone();
            tampered[i] ^= 0x01;
            let err = decrypt_with_ad(&key, 0, &[], &tampered, "test").unwrap_err();
            assert!(matches!(err, CoreError::Decryption { .. }));
        }
    }

    #[test]
    fn test_short_input_rejected() {
        assert!(decrypt_with_ad(&test_key(), 0, &[], &[0u8; 15], "test").is_err());
    }
}
