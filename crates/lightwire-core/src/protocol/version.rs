// ============================================
// File: crates/lightwire-core/src/protocol/version.rs
// ============================================
//! # Handshake Versioning
//!
//! ## Creation Reason
//! Every handshake act starts with a version byte. BOLT8 defines only
//! version 0; anything else aborts the handshake.
//!
//! ## Version History
//! | Version | Description |
//! |---------|-------------|
//! | 0x00    | BOLT8 Noise_XK, secp256k1 / ChaChaPoly / SHA256 |
//!
//! ## Last Modified
//! v0.1.0 - Initial version definitions

use std::fmt;

/// Handshake version this implementation speaks.
pub const HANDSHAKE_VERSION: u8 = 0x00;

/// Version byte carried by a handshake act.
///
/// # Example
/// ```
/// use lightwire_core::protocol::HandshakeVersion;
///
/// assert!(HandshakeVersion::current().is_supported());
/// assert!(!HandshakeVersion::new(1).is_supported());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandshakeVersion(u8);

impl HandshakeVersion {
    /// Wraps a raw version byte.
    #[must_use]
    pub const fn new(version: u8) -> Self {
        Self(version)
    }

    /// The version written into outgoing acts.
    #[must_use]
    pub const fn current() -> Self {
        Self(HANDSHAKE_VERSION)
    }

    /// Raw byte.
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Only an exact match is accepted.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.0 == HANDSHAKE_VERSION
    }
}

impl Default for HandshakeVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for HandshakeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u8> for HandshakeVersion {
    fn from(version: u8) -> Self {
        Self(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_version() {
        let version = HandshakeVersion::current();
        assert_eq!(version.as_u8(), 0);
        assert!(version.is_supported());
        assert_eq!(version.to_string(), "v0");
    }

    #[test]
    fn test_other_versions_unsupported() {
        for raw in 1..=u8::MAX {
            assert!(!HandshakeVersion::from(raw).is_supported());
        }
    }
}
