// ============================================
// File: crates/lightwire-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Byte layout of the BOLT8 handshake acts, kept apart from the
//! cryptography that fills them.
//!
//! ### Submodules
//! - [`acts`]: Act one/two/three encode and decode
//! - [`version`]: Handshake version byte
//!
//! ## Wire Format Principles
//! - Acts are fixed-size; no length prefix during the handshake
//! - Transport frame lengths are big-endian (see `noise::framing`)
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod acts;
pub mod version;

// Re-export primary types
pub use acts::{Act, EphemeralAct, StaticAct};
pub use version::{HandshakeVersion, HANDSHAKE_VERSION};
