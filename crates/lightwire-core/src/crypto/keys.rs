// ============================================
// File: crates/lightwire-core/src/crypto/keys.rs
// ============================================
//! # Cryptographic Key Types
//!
//! ## Creation Reason
//! Wraps secp256k1 keys and the 32-byte symmetric secrets of the handshake
//! so that every secret is wiped when its owner goes away, on success and
//! error paths alike.
//!
//! ## Main Functionality
//! - `StaticKeyPair`: Long-term node identity (shared read-only via `Arc`)
//! - `EphemeralKeyPair`: One per handshake, wiped when the handshake ends
//! - `CipherKey` / `ChainingKey`: 32-byte secrets, `ZeroizeOnDrop`
//!
//! ## Key Lifecycle
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  StaticKeyPair (Long-term)                                 │
//! │  ├─ Loaded from the key file at startup                    │
//! │  └─ Used for `es` (responder) and `se` (initiator)         │
//! │                                                            │
//! │  EphemeralKeyPair (Per-handshake)                          │
//! │  ├─ Generated when the handshake state is created          │
//! │  └─ Dropped with the handshake state                       │
//! │                                                            │
//! │  CipherKey / ChainingKey                                   │
//! │  ├─ Produced by HKDF inside the ratchet                    │
//! │  └─ Live in the cipher states until disconnect             │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `secp256k1::SecretKey` is `Copy`; avoid copying it out of the pair
//! - Private keys must never reach `Debug`, logs or error messages
//!
//! ## Last Modified
//! v0.1.0 - Initial key type definitions

use std::fmt;

use secp256k1::{PublicKey, SecretKey};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use lightwire_common::NodeId;

use super::ecdh::secp;
use super::{CHACHA20_KEY_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE};
use crate::error::{CoreError, Result};

// ============================================
// KeyMaterial
// ============================================

/// Secret scalar plus its public point; erases the scalar on drop.
struct KeyMaterial {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyMaterial {
    fn generate() -> Self {
        let (secret, public) = secp().generate_keypair(&mut rand::thread_rng());
        Self { secret, public }
    }

    fn from_secret_bytes(bytes: &[u8], context: &str) -> Result<Self> {
        if bytes.len() != SECRET_KEY_SIZE {
            return Err(CoreError::InvalidSecretKey {
                context: format!(
                    "{context}: expected {SECRET_KEY_SIZE} bytes, got {}",
                    bytes.len()
                ),
            });
        }
        let secret = SecretKey::from_slice(bytes).map_err(|_| CoreError::InvalidSecretKey {
            context: format!("{context}: scalar out of range"),
        })?;
        let public = PublicKey::from_secret_key(secp(), &secret);
        Ok(Self { secret, public })
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}

// ============================================
// StaticKeyPair
// ============================================

/// Long-term secp256k1 identity of this node.
///
/// # Example
/// ```
/// use lightwire_core::crypto::StaticKeyPair;
///
/// let identity = StaticKeyPair::generate();
/// let restored = StaticKeyPair::from_secret_bytes(&*identity.secret_bytes()).unwrap();
/// assert_eq!(identity.node_id(), restored.node_id());
/// ```
pub struct StaticKeyPair(KeyMaterial);

impl StaticKeyPair {
    /// Generates a new random identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(KeyMaterial::generate())
    }

    /// Creates an identity from a 32-byte secret scalar.
    ///
    /// # Errors
    /// `InvalidSecretKey` on wrong length or a scalar outside the curve order.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        KeyMaterial::from_secret_bytes(bytes, "static key").map(Self)
    }

    /// Public key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        self.0.public
    }

    /// Compressed public key bytes.
    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.public.serialize()
    }

    /// Node identity derived from the public key.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        NodeId::from_array(self.public_key_bytes())
    }

    /// Exports the secret scalar for the key file.
    #[must_use]
    pub fn secret_bytes(&self) -> Zeroizing<[u8; SECRET_KEY_SIZE]> {
        Zeroizing::new(self.0.secret.secret_bytes())
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.0.secret
    }
}

impl fmt::Debug for StaticKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticKeyPair")
            .field("node_id", &self.node_id())
            .finish_non_exhaustive()
    }
}

// ============================================
// EphemeralKeyPair
// ============================================

/// Per-handshake secp256k1 key pair.
pub struct EphemeralKeyPair(KeyMaterial);

impl EphemeralKeyPair {
    /// Generates a fresh ephemeral key.
    #[must_use]
    pub fn generate() -> Self {
        Self(KeyMaterial::generate())
    }

    /// Builds an ephemeral key from fixed bytes. Used to replay published
    /// handshake transcripts.
    ///
    /// # Errors
    /// `InvalidSecretKey` on wrong length or out-of-range scalar.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        KeyMaterial::from_secret_bytes(bytes, "ephemeral key").map(Self)
    }

    /// Compressed public key bytes.
    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.public.serialize()
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.0.secret
    }
}

impl fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.public_key_bytes();
        f.debug_struct("EphemeralKeyPair")
            .field("public", &hex::encode(&bytes[..4]))
            .finish_non_exhaustive()
    }
}

// ============================================
// CipherKey / ChainingKey
// ============================================

/// Symmetric ChaCha20-Poly1305 key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey([u8; CHACHA20_KEY_SIZE]);

impl CipherKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; CHACHA20_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes. Never log these.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CHACHA20_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey([REDACTED])")
    }
}

impl PartialEq for CipherKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for CipherKey {}

/// Running Noise chaining key (`ck`).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ChainingKey([u8; 32]);

impl ChainingKey {
    /// Wraps raw chaining key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ChainingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChainingKey([REDACTED])")
    }
}

impl PartialEq for ChainingKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for ChainingKey {}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_keypair_generation() {
        let kp1 = StaticKeyPair::generate();
        let kp2 = StaticKeyPair::generate();
        assert_ne!(kp1.public_key_bytes(), kp2.public_key_bytes());
    }

    #[test]
    fn test_static_keypair_known_vector() {
        // BOLT8 initiator static key
        let kp = StaticKeyPair::from_secret_bytes(&[0x11; 32]).unwrap();
        assert_eq!(
            kp.node_id().to_string(),
            "034f355bdcb7cc0af728ef3cceb9615d90684bb5b2ca5f859ab0f0b704075871aa"
        );
    }

    #[test]
    fn test_static_keypair_rejects_bad_secret() {
        assert!(StaticKeyPair::from_secret_bytes(&[0x11; 31]).is_err());
        assert!(StaticKeyPair::from_secret_bytes(&[0x00; 32]).is_err());
        assert!(StaticKeyPair::from_secret_bytes(&[0xff; 32]).is_err());
    }

    #[test]
    fn test_keypair_debug_redacts_secret() {
        let kp = StaticKeyPair::from_secret_bytes(&[0x11; 32]).unwrap();
        let debug = format!("{kp:?}");
        assert!(!debug.contains(&hex::encode([0x11u8; 32])));

        let key = CipherKey::from_bytes([0x42; 32]);
        assert_eq!(format!("{key:?}"), "CipherKey([REDACTED])");
    }

    #[test]
    fn test_cipher_key_equality() {
        let a = CipherKey::from_bytes([1; 32]);
        let b = CipherKey::from_bytes([1; 32]);
        let c = CipherKey::from_bytes([2; 32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
