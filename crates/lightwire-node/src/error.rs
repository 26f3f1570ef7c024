// ============================================
// File: crates/lightwire-node/src/error.rs
// ============================================
//! # Node Error Types
//!
//! ## Main Functionality
//! - `NodeError`: everything a connection or the node runtime can fail with
//! - `FaultKind`: the coarse taxonomy callers branch on
//!
//! ## ⚠️ Important Note for Next Developer
//! - Timeouts are their own kind; never fold them into authentication failures
//! - A clean remote close is `PeerDisconnected`, reported as a disconnect event
//!
//! ## Last Modified
//! v0.1.0 - Initial node error definitions

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use lightwire_common::error::CommonError;
use lightwire_common::NodeId;
use lightwire_core::{CoreError, ErrorKind};
use lightwire_transport::TransportError;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;

// ============================================
// FaultKind
// ============================================

/// Coarse classification of a connection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Malformed act, bad curve point or step-order violation.
    HandshakeFailure,
    /// AEAD tag mismatch on a handshake act or frame.
    AuthenticationFailure,
    /// Declared frame length above the limit.
    FrameTooLarge,
    /// Send or receive nonce space used up.
    KeyExhausted,
    /// Other cryptographic failure.
    Crypto,
    /// Handshake, dial or frame read ran past its deadline.
    ConnectionTimeout,
    /// Remote closed the stream.
    PeerDisconnected,
    /// Cancelled by the owner or node shutdown.
    Cancelled,
    /// Socket error.
    Io,
    /// Caller misuse, configuration or registry error.
    Local,
}

impl From<ErrorKind> for FaultKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::HandshakeFailure => Self::HandshakeFailure,
            ErrorKind::AuthenticationFailure => Self::AuthenticationFailure,
            ErrorKind::FrameTooLarge => Self::FrameTooLarge,
            ErrorKind::KeyExhausted => Self::KeyExhausted,
            ErrorKind::Crypto => Self::Crypto,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HandshakeFailure => "handshake failure",
            Self::AuthenticationFailure => "authentication failure",
            Self::FrameTooLarge => "frame too large",
            Self::KeyExhausted => "key exhausted",
            Self::Crypto => "crypto error",
            Self::ConnectionTimeout => "connection timeout",
            Self::PeerDisconnected => "peer disconnected",
            Self::Cancelled => "cancelled",
            Self::Io => "i/o error",
            Self::Local => "local error",
        };
        f.write_str(name)
    }
}

// ============================================
// NodeError
// ============================================

/// Node error types.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid { field: String, reason: String },

    #[error("Failed to load key file '{path}': {reason}")]
    KeyFile { path: String, reason: String },

    #[error("Handshake did not complete within {timeout:?}")]
    HandshakeTimeout { timeout: Duration },

    #[error("Frame body not received within {timeout:?}")]
    ReadTimeout { timeout: Duration },

    #[error("Peer disconnected during {during}")]
    PeerDisconnected { during: &'static str },

    #[error("Connection cancelled")]
    Cancelled,

    #[error("Connection is not established")]
    NotConnected,

    #[error("Connection was already initialized")]
    AlreadyInitialized,

    #[error("Message of {size} bytes exceeds limit of {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Peer limit reached: max {limit} peers")]
    PeerLimitReached { limit: usize },

    #[error("Already connected to peer {0}")]
    DuplicatePeer(NodeId),

    #[error("Peer not found: {0}")]
    PeerNotFound(NodeId),

    #[error("Node failed to start: {reason}")]
    StartupFailed { reason: String },

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn key_file(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::KeyFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn startup_failed(reason: impl Into<String>) -> Self {
        Self::StartupFailed {
            reason: reason.into(),
        }
    }

    /// Maps a stream read/write error, treating EOF as a disconnect.
    pub(crate) fn from_stream(err: std::io::Error, during: &'static str) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe => Self::PeerDisconnected { during },
            _ => Self::Io(err),
        }
    }

    /// Returns the taxonomy bucket for this error.
    #[must_use]
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            Self::Core(e) => e.kind().into(),
            Self::HandshakeTimeout { .. } | Self::ReadTimeout { .. } => FaultKind::ConnectionTimeout,
            Self::Transport(e) if e.is_timeout() => FaultKind::ConnectionTimeout,
            Self::PeerDisconnected { .. } => FaultKind::PeerDisconnected,
            Self::Cancelled => FaultKind::Cancelled,
            Self::Transport(_) | Self::Io(_) => FaultKind::Io,
            _ => FaultKind::Local,
        }
    }

    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad { .. } | Self::ConfigInvalid { .. } | Self::KeyFile { .. }
        )
    }

    /// Returns `true` if the connection must be torn down.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self.fault_kind(), FaultKind::Local)
    }

    /// Returns `true` if the peer broke the wire protocol.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        match self {
            Self::Core(e) => e.is_protocol_error(),
            _ => false,
        }
    }

    /// Returns `true` for failures that hint at an active attacker.
    #[must_use]
    pub const fn is_suspicious(&self) -> bool {
        match self {
            Self::Core(e) => e.is_suspicious(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            Self::PeerLimitReached { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NodeError::config_load("/etc/lightwire/node.toml", "file not found");
        assert!(err.to_string().contains("/etc/lightwire/node.toml"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_core_kinds_map_through() {
        let err: NodeError = CoreError::decryption("act two").into();
        assert_eq!(err.fault_kind(), FaultKind::AuthenticationFailure);
        assert!(err.is_fatal());
        assert!(err.is_suspicious());

        let err: NodeError = CoreError::KeyExhausted {
            nonce: u64::MAX - 1,
            needed: 2,
        }
        .into();
        assert_eq!(err.fault_kind(), FaultKind::KeyExhausted);

        let err: NodeError = CoreError::FrameTooLarge {
            max: 65535,
            actual: 70000,
        }
        .into();
        assert_eq!(err.fault_kind(), FaultKind::FrameTooLarge);
        assert!(err.is_protocol_error());
        assert!(!err.is_suspicious());
    }

    #[test]
    fn test_timeouts_are_distinct() {
        let err = NodeError::HandshakeTimeout {
            timeout: Duration::from_secs(1),
        };
        assert_eq!(err.fault_kind(), FaultKind::ConnectionTimeout);
        assert_ne!(err.fault_kind(), FaultKind::AuthenticationFailure);

        let err: NodeError = TransportError::ConnectTimeout {
            addr: "127.0.0.1:9735".parse().unwrap(),
            timeout: Duration::from_secs(1),
        }
        .into();
        assert_eq!(err.fault_kind(), FaultKind::ConnectionTimeout);
    }

    #[test]
    fn test_stream_errors() {
        let eof = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
        let err = NodeError::from_stream(eof, "handshake");
        assert_eq!(err.fault_kind(), FaultKind::PeerDisconnected);
        assert!(err.to_string().contains("handshake"));

        let other = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert_eq!(NodeError::from_stream(other, "read").fault_kind(), FaultKind::Io);
    }

    #[test]
    fn test_protocol_errors_come_from_core() {
        let err: NodeError = CoreError::UnsupportedVersion {
            act: 1,
            got: 1,
            expected: 0,
        }
        .into();
        assert!(err.is_protocol_error());
        assert_eq!(err.fault_kind(), FaultKind::HandshakeFailure);

        assert!(!NodeError::from(CoreError::decryption("frame body")).is_protocol_error());
        assert!(!NodeError::HandshakeTimeout {
            timeout: Duration::from_secs(1)
        }
        .is_protocol_error());
    }

    #[test]
    fn test_local_errors_are_not_fatal() {
        assert!(!NodeError::NotConnected.is_fatal());
        assert!(!NodeError::MessageTooLarge { size: 10, max: 5 }.is_fatal());
        assert!(NodeError::PeerLimitReached { limit: 1 }.is_retryable());
    }
}
