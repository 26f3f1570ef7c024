// ============================================
// File: crates/lightwire-core/src/crypto/ecdh.rs
// ============================================
//! # secp256k1 ECDH
//!
//! ## Creation Reason
//! The three Diffie-Hellman steps of the handshake (`es`, `ee`, `se`) and
//! the parsing of every public key that arrives off the wire.
//!
//! ## Main Functionality
//! - `secp`: Process-wide signing/verification context
//! - `ecdh`: SHA-256 of the compressed shared point
//! - `parse_public_key`: Validating parse of a 33-byte compressed key
//!
//! ## ⚠️ Important Note for Next Developer
//! - Remote keys MUST go through `parse_public_key`; an invalid point is a
//!   handshake failure, never a panic
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::sync::OnceLock;

use secp256k1::ecdh::SharedSecret;
use secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use zeroize::Zeroizing;

use super::{PUBLIC_KEY_SIZE, SHA256_SIZE};
use crate::error::{CoreError, Result};

/// Shared secp256k1 context, created on first use.
pub fn secp() -> &'static Secp256k1<All> {
    static CONTEXT: OnceLock<Secp256k1<All>> = OnceLock::new();
    CONTEXT.get_or_init(Secp256k1::new)
}

/// `SHA256(compressed(local · remote))`, as BOLT8 defines ECDH.
#[must_use]
pub fn ecdh(local: &SecretKey, remote: &PublicKey) -> Zeroizing<[u8; SHA256_SIZE]> {
    let shared = SharedSecret::new(remote, local);
    Zeroizing::new(shared.secret_bytes())
}

/// Parses a compressed public key received from a peer.
///
/// # Errors
/// `InvalidPublicKey` if the length is wrong, the prefix is not 0x02/0x03
/// or the x coordinate is not on the curve.
pub fn parse_public_key(bytes: &[u8], context: &str) -> Result<PublicKey> {
    if bytes.len() != PUBLIC_KEY_SIZE {
        return Err(CoreError::invalid_public_key(format!(
            "{context}: expected {PUBLIC_KEY_SIZE} bytes, got {}",
            bytes.len()
        )));
    }
    PublicKey::from_slice(bytes).map_err(|_| CoreError::invalid_public_key(context))
}

// ============================================
// Tests
// ============================================
