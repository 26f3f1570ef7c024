// ============================================
// File: crates/lightwire-core/src/noise/symmetric.rs
// ============================================
//! # Symmetric State
//!
//! ## Creation Reason
//! The running transcript of the handshake: handshake hash `h`, chaining
//! key `ck`, the current temporary key and its nonce.
//!
//! ## Main Logical Flow
//! 1. `initialize(rs)`: h = SHA256(name); ck = h; MixHash(prologue); MixHash(rs)
//! 2. Per act: MixHash(e), MixKey(dh), Encrypt/DecryptAndHash
//! 3. `split()`: HKDF(ck, ∅) → (k1, k2), consuming the state
//!
//! ## ⚠️ Important Note for Next Developer
//! - MixKey resets the nonce; each Encrypt/DecryptAndHash bumps it
//! - Act three uses nonce 1 under temp_k2 only because act two used 0
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use secp256k1::PublicKey;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{PROLOGUE, PROTOCOL_NAME};
use crate::crypto::aead::{decrypt_with_ad, encrypt_with_ad};
use crate::crypto::kdf::{hkdf_expand2, sha256};
use crate::crypto::keys::{ChainingKey, CipherKey};
use crate::crypto::SHA256_SIZE;
use crate::error::Result;

/// Handshake hash, chaining key and temporary key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricState {
    h: [u8; SHA256_SIZE],
    ck: [u8; SHA256_SIZE],
    k: Option<[u8; 32]>,
    n: u64,
}

/// Output of [`SymmetricState::split`].
pub struct SplitKeys {
    /// First HKDF output: initiator → responder.
    pub initiator_to_responder: CipherKey,
    /// Second HKDF output: responder → initiator.
    pub responder_to_initiator: CipherKey,
    /// Final chaining key, seed for transport key rotation.
    pub chaining_key: ChainingKey,
}

impl SymmetricState {
    /// Starts a transcript bound to the responder's static key.
    #[must_use]
    pub fn initialize(responder_static: &PublicKey) -> Self {
        let h = sha256(&[PROTOCOL_NAME]);
        let mut state = Self {
            h,
            ck: h,
            k: None,
            n: 0,
        };
        state.mix_hash(PROLOGUE);
        state.mix_hash(&responder_static.serialize());
        state
    }

    /// `h = SHA256(h ‖ data)`.
    pub fn mix_hash(&mut self, data: &[u8]) {
        self.h = sha256(&[&self.h, data]);
    }

    /// `(ck, k) = HKDF(ck, ikm)`; resets the nonce.
    ///
    /// # Errors
    /// Propagates HKDF failure.
    pub fn mix_key(&mut self, input_key_material: &[u8]) -> Result<()> {
        let (ck, k) = hkdf_expand2(&self.ck, input_key_material)?;
        self.ck = *ck;
        self.k = Some(*k);
        self.n = 0;
        Ok(())
    }

    /// Encrypts under the temporary key (pass-through before the first
    /// MixKey) and mixes the ciphertext into `h`.
    ///
    /// # Errors
    /// Propagates AEAD failure.
    pub fn encrypt_and_hash(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let ciphertext = match self.k {
            Some(k) => {
                let out = encrypt_with_ad(&CipherKey::from_bytes(k), self.n, &self.h, plaintext)?;
                self.n += 1;
                out
            }
            None => plaintext.to_vec(),
        };
        self.mix_hash(&ciphertext);
        Ok(ciphertext)
    }

    /// Inverse of [`encrypt_and_hash`](Self::encrypt_and_hash).
    ///
    /// # Errors
    /// `Decryption` on tag mismatch; `h` is left unchanged in that case.
    pub fn decrypt_and_hash(&mut self, ciphertext: &[u8], context: &str) -> Result<Vec<u8>> {
        let plaintext = match self.k {
            Some(k) => {
                let out = decrypt_with_ad(
                    &CipherKey::from_bytes(k),
                    self.n,
                    &self.h,
                    ciphertext,
                    context,
                )?;
                self.n += 1;
                out
            }
            None => ciphertext.to_vec(),
        };
        self.mix_hash(ciphertext);
        Ok(plaintext)
    }

    /// Current handshake hash.
    #[must_use]
    pub const fn handshake_hash(&self) -> &[u8; SHA256_SIZE] {
        &self.h
    }

    /// Derives the two transport keys and hands over the chaining key.
    ///
    /// # Errors
    /// Propagates HKDF failure.
    pub fn split(self) -> Result<SplitKeys> {
        let (k1, k2) = hkdf_expand2(&self.ck, &[])?;
        Ok(SplitKeys {
            initiator_to_responder: CipherKey::from_bytes(*k1),
            responder_to_initiator: CipherKey::from_bytes(*k2),
            chaining_key: ChainingKey::from_bytes(self.ck),
        })
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ecdh::parse_public_key;

    fn responder_static() -> PublicKey {
        let bytes =
            hex::decode("028d7500dd4c12685d1f568b4c2b5048e8534b873319f3a8daa612b469132ec7f7")
                .unwrap();
        parse_public_key(&bytes, "rs").unwrap()
    }

    #[test]
    fn test_initialize_matches_vector() {
        let state = SymmetricState::initialize(&responder_static());
        assert_eq!(
            hex::encode(state.handshake_hash()),
            "8401b3fdcaaa710b5405400536a3d5fd7792fe8e7fe29cd8b687216fe323ecbd"
        );
    }

    #[test]
    fn test_pass_through_before_mix_key() {
        let mut state = SymmetricState::initialize(&responder_static());
        let before = *state.handshake_hash();
        let out = state.encrypt_and_hash(b"plain").unwrap();
        assert_eq!(out, b"plain");
        assert_ne!(*state.handshake_hash(), before);
    }

    #[test]
    fn test_encrypt_decrypt_transcripts_agree() {
        let mut a = SymmetricState::initialize(&responder_static());
        let mut b = SymmetricState::initialize(&responder_static());
        a.mix_key(b"shared").unwrap();
        b.mix_key(b"shared").unwrap();

        let c1 = a.encrypt_and_hash(b"").unwrap();
        let c2 = a.encrypt_and_hash(b"second").unwrap();
        assert_eq!(b.decrypt_and_hash(&c1, "one").unwrap(), b"");
        assert_eq!(b.decrypt_and_hash(&c2, "two").unwrap(), b"second");
        assert_eq!(a.handshake_hash(), b.handshake_hash());
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let mut a = SymmetricState::initialize(&responder_static());
        let mut b = SymmetricState::initialize(&responder_static());
        a.mix_key(b"one").unwrap();
        b.mix_key(b"two").unwrap();

        let c = a.encrypt_and_hash(b"").unwrap();
        assert!(b.decrypt_and_hash(&c, "tag").is_err());
    }
}
