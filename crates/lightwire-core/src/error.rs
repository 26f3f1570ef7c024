// ============================================
// File: crates/lightwire-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Errors raised by the sans-IO handshake, cipher and framing code, plus a
//! coarse [`ErrorKind`] so the connection layer can decide how to report a
//! failure without matching on every variant.
//!
//! ## Main Functionality
//! - `CoreError`: Primary error enum for core operations
//! - `ErrorKind`: Handshake / authentication / frame-size / exhaustion / crypto
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material in error messages
//! - Every `CoreError` is fatal for the connection it came from; there is
//!   no transient variant here
//! - New variants need an arm in [`CoreError::kind`]
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::fmt;

use thiserror::Error;

use lightwire_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// ErrorKind
// ============================================

/// Failure class of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed act, bad version, invalid curve point or out-of-order step.
    HandshakeFailure,
    /// AEAD tag mismatch on a handshake act or a transport frame.
    AuthenticationFailure,
    /// Declared or requested message length above the allowed maximum.
    FrameTooLarge,
    /// A cipher state ran out of nonces.
    KeyExhausted,
    /// Local cryptographic failure (bad local key, KDF failure).
    Crypto,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HandshakeFailure => "handshake failure",
            Self::AuthenticationFailure => "authentication failure",
            Self::FrameTooLarge => "frame too large",
            Self::KeyExhausted => "key exhausted",
            Self::Crypto => "crypto error",
        };
        f.write_str(name)
    }
}

// ============================================
// CoreError
// ============================================

/// Core error types for the handshake and transport cipher.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Handshake Errors
    // ========================================

    /// Handshake act has the wrong size. Checked before any crypto.
    #[error("Act {act} has invalid length: expected {expected} bytes, got {actual}")]
    InvalidActLength {
        /// Act number (1..=3)
        act: u8,
        /// Required length
        expected: usize,
        /// Length received
        actual: usize,
    },

    /// Handshake version byte is not supported.
    #[error("Act {act} has unsupported handshake version {got} (expected {expected})")]
    UnsupportedVersion {
        /// Act number (1..=3)
        act: u8,
        /// Version received
        got: u8,
        /// Version expected
        expected: u8,
    },

    /// Bytes do not encode a valid secp256k1 point.
    #[error("Invalid public key: {context}")]
    InvalidPublicKey {
        /// Where the key came from
        context: String,
    },

    /// Operation not valid in the current handshake state.
    #[error("Invalid state for operation: {operation} requires {required_state}")]
    InvalidState {
        /// What operation was attempted
        operation: String,
        /// What state was required
        required_state: String,
    },

    // ========================================
    // Cipher Errors
    // ========================================

    /// AEAD authentication failed.
    #[error("Decryption failed: authentication error ({context})")]
    Decryption {
        /// What was being decrypted
        context: String,
    },

    /// AEAD encryption failed.
    #[error("Encryption failed: {context}")]
    Encryption {
        /// What was being encrypted
        context: String,
    },

    /// Message exceeds the maximum frame body size.
    #[error("Frame too large: max {max} bytes, got {actual}")]
    FrameTooLarge {
        /// Maximum allowed size
        max: usize,
        /// Size declared or requested
        actual: usize,
    },

    /// No nonces left under the current key.
    #[error("Cipher key exhausted: nonce {nonce} leaves fewer than {needed} nonces")]
    KeyExhausted {
        /// Current nonce value
        nonce: u64,
        /// Nonces the operation needed
        needed: u64,
    },

    // ========================================
    // Key Errors
    // ========================================

    /// Local secret key is invalid.
    #[error("Invalid secret key: {context}")]
    InvalidSecretKey {
        /// Where the key came from
        context: String,
    },

    /// HKDF expansion failed.
    #[error("Key derivation failed: {reason}")]
    KeyDerivation {
        /// Why derivation failed
        reason: String,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates an `InvalidPublicKey` error.
    pub fn invalid_public_key(context: impl Into<String>) -> Self {
        Self::InvalidPublicKey {
            context: context.into(),
        }
    }

    /// Creates a `Decryption` error.
    pub fn decryption(context: impl Into<String>) -> Self {
        Self::Decryption {
            context: context.into(),
        }
    }

    /// Creates an `InvalidState` error.
    pub fn invalid_state(
        operation: impl Into<String>,
        required_state: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            operation: operation.into(),
            required_state: required_state.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns the failure class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidActLength { .. }
            | Self::UnsupportedVersion { .. }
            | Self::InvalidPublicKey { .. }
            | Self::InvalidState { .. } => ErrorKind::HandshakeFailure,
            Self::Decryption { .. } => ErrorKind::AuthenticationFailure,
            Self::FrameTooLarge { .. } => ErrorKind::FrameTooLarge,
            Self::KeyExhausted { .. } => ErrorKind::KeyExhausted,
            Self::Encryption { .. }
            | Self::InvalidSecretKey { .. }
            | Self::KeyDerivation { .. }
            | Self::Common(_) => ErrorKind::Crypto,
        }
    }

    /// Returns `true` if the remote side sent something invalid.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidActLength { .. }
                | Self::UnsupportedVersion { .. }
                | Self::InvalidPublicKey { .. }
                | Self::FrameTooLarge { .. }
        )
    }

    /// Returns `true` if this error might indicate tampering.
    #[must_use]
    pub const fn is_suspicious(&self) -> bool {
        matches!(self, Self::Decryption { .. } | Self::InvalidPublicKey { .. })
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidActLength {
            act: 1,
            expected: 50,
            actual: 49,
        };
        assert!(err.to_string().contains("50"));
        assert!(err.to_string().contains("49"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            CoreError::decryption("act two").kind(),
            ErrorKind::AuthenticationFailure
        );
        assert_eq!(
            CoreError::invalid_public_key("act one").kind(),
            ErrorKind::HandshakeFailure
        );
        assert_eq!(
            CoreError::KeyExhausted { nonce: u64::MAX - 1, needed: 2 }.kind(),
            ErrorKind::KeyExhausted
        );
        assert_eq!(
            CoreError::FrameTooLarge { max: 65535, actual: 70000 }.kind(),
            ErrorKind::FrameTooLarge
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(CoreError::decryption("frame").is_suspicious());
        assert!(!CoreError::decryption("frame").is_protocol_error());
        assert!(CoreError::UnsupportedVersion { act: 2, got: 1, expected: 0 }.is_protocol_error());
    }

    #[test]
    fn test_common_error_conversion() {
        let common = CommonError::invalid_length(33, 32);
        let core: CoreError = common.into();
        assert!(matches!(core, CoreError::Common(_)));
        assert_eq!(core.kind(), ErrorKind::Crypto);
    }
}
