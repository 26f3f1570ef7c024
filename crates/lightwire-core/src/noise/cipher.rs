// ============================================
// File: crates/lightwire-core/src/noise/cipher.rs
// ============================================
//! # Transport Cipher State
//!
//! ## Creation Reason
//! One `CipherState` per direction holds the transport key, its nonce and
//! the chaining key used to rotate the key every 1000 nonces.
//!
//! ## Main Functionality
//! - `encrypt` / `decrypt`: AEAD at the current nonce, then advance
//! - Key rotation: at nonce 1000, `(ck, k) = HKDF(ck, k)` and nonce = 0
//! - Exhaustion guard: `u64::MAX` is never used as a nonce
//!
//! ## ⚠️ Important Note for Next Developer
//! - The nonce only advances after a successful operation
//! - With rotation on, the guard can only trip if the nonce was forced
//!   (`force_nonce`, test builds only)
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::fmt;

use tracing::trace;

use super::KEY_ROTATION_INTERVAL;
use crate::crypto::aead::{decrypt_with_ad, encrypt_with_ad};
use crate::crypto::kdf::hkdf_expand2;
use crate::crypto::keys::{ChainingKey, CipherKey};
use crate::error::{CoreError, Result};

// ============================================
// Direction / KeyRotation
// ============================================

/// Which way a cipher state's traffic flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Encrypts outgoing frames.
    Send,
    /// Decrypts incoming frames.
    Receive,
}

/// Transport key rotation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyRotation {
    /// Rotate every 1000 nonces, as BOLT8 peers expect.
    #[default]
    Bolt8,
    /// Keep one key for the whole connection.
    Disabled,
}

impl KeyRotation {
    /// Maps a config flag to a policy.
    #[must_use]
    pub const fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Bolt8
        } else {
            Self::Disabled
        }
    }
}

// ============================================
// CipherState
// ============================================

/// Key, nonce and chaining key for one direction of a connection.
///
/// Keys are wiped when the state is dropped.
pub struct CipherState {
    key: CipherKey,
    chaining_key: ChainingKey,
    nonce: u64,
    direction: Direction,
    rotation: KeyRotation,
}

impl CipherState {
    /// Creates a cipher state at nonce 0.
    #[must_use]
    pub fn new(
        key: CipherKey,
        chaining_key: ChainingKey,
        direction: Direction,
        rotation: KeyRotation,
    ) -> Self {
        Self {
            key,
            chaining_key,
            nonce: 0,
            direction,
            rotation,
        }
    }

    /// Nonce the next operation will use.
    #[must_use]
    pub const fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Direction of this state.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Nonces still usable under the current key.
    #[must_use]
    pub const fn remaining_nonces(&self) -> u64 {
        u64::MAX - self.nonce
    }

    /// Fails with `KeyExhausted` unless `needed` nonces are available.
    ///
    /// # Errors
    /// `KeyExhausted` when fewer than `needed` nonces remain.
    pub fn ensure_available(&self, needed: u64) -> Result<()> {
        if self.remaining_nonces() < needed {
            return Err(CoreError::KeyExhausted {
                nonce: self.nonce,
                needed,
            });
        }
        Ok(())
    }

    /// Encrypts with empty associated data at the current nonce.
    ///
    /// # Errors
    /// `KeyExhausted` or AEAD failure; the nonce is unchanged on error.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.ensure_available(1)?;
        let ciphertext = encrypt_with_ad(&self.key, self.nonce, &[], plaintext)?;
        self.advance()?;
        Ok(ciphertext)
    }

    /// Decrypts with empty associated data at the current nonce.
    ///
    /// # Errors
    /// `KeyExhausted` or `Decryption`; the nonce is unchanged on error.
    pub fn decrypt(&mut self, ciphertext: &[u8], context: &str) -> Result<Vec<u8>> {
        self.ensure_available(1)?;
        let plaintext = decrypt_with_ad(&self.key, self.nonce, &[], ciphertext, context)?;
        self.advance()?;
        Ok(plaintext)
    }

    fn advance(&mut self) -> Result<()> {
        self.nonce += 1;
        if self.rotation == KeyRotation::Bolt8 && self.nonce == KEY_ROTATION_INTERVAL {
            self.rotate()?;
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        let (ck, k) = hkdf_expand2(self.chaining_key.as_bytes(), self.key.as_bytes())?;
        self.chaining_key = ChainingKey::from_bytes(*ck);
        self.key = CipherKey::from_bytes(*k);
        self.nonce = 0;
        trace!(direction = ?self.direction, "Transport key rotated");
        Ok(())
    }

    /// Moves the nonce, for exercising the exhaustion boundary.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn force_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }
}

impl fmt::Debug for CipherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherState")
            .field("direction", &self.direction)
            .field("nonce", &self.nonce)
            .field("rotation", &self.rotation)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(rotation: KeyRotation) -> (CipherState, CipherState) {
        let send = CipherState::new(
            CipherKey::from_bytes([1; 32]),
            ChainingKey::from_bytes([2; 32]),
            Direction::Send,
            rotation,
        );
        let recv = CipherState::new(
            CipherKey::from_bytes([1; 32]),
            ChainingKey::from_bytes([2; 32]),
            Direction::Receive,
            rotation,
        );
        (send, recv)
    }

    #[test]
    fn test_nonce_increments_once_per_operation() {
        let (mut send, mut recv) = pair(KeyRotation::Disabled);
        let c = send.encrypt(b"x").unwrap();
        assert_eq!(send.nonce(), 1);
        recv.decrypt(&c, "test").unwrap();
        assert_eq!(recv.nonce(), 1);
    }

    #[test]
    fn test_failed_decrypt_keeps_nonce() {
        let (mut send, mut recv) = pair(KeyRotation::Disabled);
        let mut c = send.encrypt(b"x").unwrap();
        c[0] ^= 0xff;
        assert!(recv.decrypt(&c, "test").is_err());
        assert_eq!(recv.nonce(), 0);
    }

    #[test]
    fn test_rotation_keeps_sides_in_sync() {
        let (mut send, mut recv) = pair(KeyRotation::Bolt8);
        for i in 0..2500u32 {
            let c = send.encrypt(&i.to_be_bytes()).unwrap();
            assert_eq!(recv.decrypt(&c, "test").unwrap(), i.to_be_bytes());
        }
        assert_eq!(send.nonce(), 500);
        assert_eq!(recv.nonce(), 500);
    }

    #[test]
    fn test_without_rotation_nonce_keeps_growing() {
        let (mut send, _) = pair(KeyRotation::Disabled);
        for _ in 0..1200 {
            send.encrypt(b"").unwrap();
        }
        assert_eq!(send.nonce(), 1200);
    }

    #[test]
    fn test_exhaustion_guard() {
        let (mut send, _) = pair(KeyRotation::Disabled);
        send.force_nonce(u64::MAX - 1);
        assert!(send.encrypt(b"last").is_ok());
        assert_eq!(send.nonce(), u64::MAX);

        let err = send.encrypt(b"one too many").unwrap_err();
        assert!(matches!(err, CoreError::KeyExhausted { .. }));
        assert_eq!(send.nonce(), u64::MAX);
    }

    #[test]
    fn test_ensure_available() {
        let (mut send, _) = pair(KeyRotation::Bolt8);
        send.force_nonce(u64::MAX - 1);
        assert!(send.ensure_available(1).is_ok());
        assert!(send.ensure_available(2).is_err());
    }
}
