// ============================================
// File: crates/lightwire-core/src/noise/mod.rs
// ============================================
//! # Noise_XK (BOLT8) Protocol Module
//!
//! ## Creation Reason
//! Implements the Lightning transport handshake and the post-handshake
//! cipher without touching any socket. Callers feed acts and frames in and
//! take bytes out; the node crate owns all I/O.
//!
//! ## Main Functionality
//! - [`symmetric`]: `SymmetricState` (h, ck, k, n) and MixHash/MixKey
//! - [`handshake`]: Three-act state machine (`NoiseHandshake`)
//! - [`cipher`]: Directional `CipherState` with key rotation
//! - [`framing`]: Length-prefixed encrypted frames (`FrameEncoder`/`FrameDecoder`)
//!
//! ## Handshake Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Initiator (knows rs)                         Responder     │
//! │    │                                              │         │
//! │    │  Act One  (50B): v ‖ e.pub ‖ tag   ───────►  │ es      │
//! │    │                                              │         │
//! │    │ ◄───────  Act Two (50B): v ‖ e.pub ‖ tag     │ ee      │
//! │    │                                              │         │
//! │    │  Act Three (66B): v ‖ enc(s.pub) ‖ tag ───►  │ se      │
//! │    │                                              │         │
//! │    │         Split() → (sk, rk) per side          │         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every byte here is checked against the BOLT8 Appendix A vectors
//! - Any error leaves the handshake in `Failed`; there is no retry
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

pub mod cipher;
pub mod framing;
pub mod handshake;
pub mod symmetric;

#[cfg(test)]
pub(crate) mod test_vectors;

pub use cipher::{CipherState, Direction, KeyRotation};
pub use framing::{FrameDecoder, FrameEncoder, NoiseTransport};
pub use handshake::{HandshakeRole, HandshakeStep, NoiseHandshake};
pub use symmetric::SymmetricState;

// ============================================
// Constants
// ============================================

/// Noise protocol name hashed into the initial handshake hash.
pub const PROTOCOL_NAME: &[u8] = b"Noise_XK_secp256k1_ChaChaPoly_SHA256";

/// Prologue mixed in before the first act.
pub const PROLOGUE: &[u8] = b"lightning";

/// Size of act one on the wire.
pub const ACT_ONE_SIZE: usize = 50;

/// Size of act two on the wire.
pub const ACT_TWO_SIZE: usize = 50;

/// Size of act three on the wire.
pub const ACT_THREE_SIZE: usize = 66;

/// Encrypted length prefix of a transport frame (2 bytes + tag).
pub const LENGTH_HEADER_SIZE: usize = 18;

/// Largest plaintext body a frame can carry.
pub const MAX_MESSAGE_SIZE: usize = 65_535;

/// Nonces after which a transport key is rotated.
pub const KEY_ROTATION_INTERVAL: u64 = 1000;
