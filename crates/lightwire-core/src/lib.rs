// ============================================
// File: crates/lightwire-core/src/lib.rs
// ============================================
//! # Lightwire Core - BOLT8 Handshake & Transport Cipher
//!
//! ## Creation Reason
//! Sans-IO implementation of the Lightning peer transport: the Noise_XK
//! handshake over secp256k1 and the length-prefixed ChaCha20-Poly1305
//! frames that follow it. No sockets, no tasks; the node crate drives it.
//!
//! ## Main Functionality
//!
//! ### Crypto Module ([`crypto`])
//! - Key types (`StaticKeyPair`, `EphemeralKeyPair`, `CipherKey`)
//! - ECDH, SHA-256, HKDF, ChaCha20-Poly1305
//!
//! ### Noise Module ([`noise`])
//! - `SymmetricState`, `NoiseHandshake`, `CipherState`
//! - `FrameEncoder` / `FrameDecoder` / `NoiseTransport`
//!
//! ### Protocol Module ([`protocol`])
//! - Handshake act codec and version byte
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               lightwire-node                        │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │   lightwire-core  ◄──   lightwire-transport         │
//! │   You are here                │                     │
//! │         │                     │                     │
//! │         └──────────┬──────────┘                     │
//! │                    ▼                                │
//! │            lightwire-common                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Guarantees
//! - **Authentication**: Responder proven by act one/two, initiator by act three
//! - **Forward Secrecy**: Fresh ephemeral keys per handshake
//! - **Confidentiality / Integrity**: ChaCha20-Poly1305 on every frame
//! - **Nonce Safety**: Counters never repeat; exhaustion is an error
//!
//! ## ⚠️ Important Note for Next Developer
//! - Test vectors come from BOLT8 Appendix A; do not "fix" them
//! - ALL secrets are wiped on drop; keep it that way for new types
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod noise;
pub mod protocol;

// Re-export commonly used items
pub use crypto::{CipherKey, EphemeralKeyPair, StaticKeyPair};
pub use error::{CoreError, ErrorKind, Result};
pub use noise::{
    FrameDecoder, FrameEncoder, HandshakeRole, HandshakeStep, KeyRotation, NoiseHandshake,
    NoiseTransport, LENGTH_HEADER_SIZE, MAX_MESSAGE_SIZE,
};
