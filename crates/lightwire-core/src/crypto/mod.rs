// ============================================
// File: crates/lightwire-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! The primitive operations the Noise_XK handshake and transport cipher
//! are built from, each as a small free function over fixed-size buffers.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`keys`]: secp256k1 key pairs and zeroizing 32-byte secrets
//! - [`ecdh`]: `ECDH(sk, pk) = SHA256(compressed(sk·pk))` and key parsing
//! - [`kdf`]: SHA-256 and the two/three-output HKDF used by the ratchet
//! - [`aead`]: ChaCha20-Poly1305 with the 4-zero-byte ‖ LE64 nonce
//!
//! ## Primitive Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Handshake step             Primitive                       │
//! │  ─────────────────────────  ──────────────────────────────  │
//! │  MixHash(data)              sha256(h ‖ data)                │
//! │  MixKey(dh)                 hkdf_expand2(ck, dh)            │
//! │  EncryptAndHash(p)          aead::encrypt(k, n, h, p)       │
//! │  es / ee / se               ecdh(sk, pk)                    │
//! │  Split()                    hkdf_expand2(ck, ∅)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALL implementations use libsecp256k1 / RustCrypto
//! - ALL secret buffers are `Zeroize`/`ZeroizeOnDrop` or `Zeroizing`
//! - Test vectors live next to the code that must match them
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod aead;
pub mod ecdh;
pub mod kdf;
pub mod keys;

// Re-export primary types at module level
pub use keys::{ChainingKey, CipherKey, EphemeralKeyPair, StaticKeyPair};

// ============================================
// Constants
// ============================================

/// Size of a compressed secp256k1 public key.
pub const PUBLIC_KEY_SIZE: usize = 33;

/// Size of a secp256k1 secret key.
pub const SECRET_KEY_SIZE: usize = 32;

/// Size of ChaCha20-Poly1305 key in bytes.
pub const CHACHA20_KEY_SIZE: usize = 32;

/// Size of ChaCha20-Poly1305 nonce in bytes.
pub const CHACHA20_NONCE_SIZE: usize = 12;

/// Size of Poly1305 authentication tag in bytes.
pub const POLY1305_TAG_SIZE: usize = 16;

/// Size of a SHA-256 digest.
pub const SHA256_SIZE: usize = 32;
