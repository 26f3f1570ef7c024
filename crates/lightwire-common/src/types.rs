// ============================================
// File: crates/lightwire-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Peers are addressed by their static secp256k1 public key. Giving that
//! key a dedicated type keeps it from being confused with ephemeral keys
//! or arbitrary byte buffers as it moves between layers.
//!
//! ## Main Functionality
//! - `NodeId`: 33-byte compressed public key identifying a peer
//! - `ConnectionId`: Random per-connection identifier for logs and tables
//!
//! ## ⚠️ Important Note for Next Developer
//! - `NodeId` is public data; it is not zeroized
//! - Display format is lowercase hex (66 chars), which is what the CLI,
//!   config file and logs all use
//!
//! ## Last Modified
//! v0.1.0 - Initial types

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ============================================
// Constants
// ============================================

/// Size of a compressed secp256k1 public key.
pub const NODE_ID_SIZE: usize = 33;

/// Size of a `ConnectionId` in bytes.
pub const CONNECTION_ID_SIZE: usize = 8;

// ============================================
// NodeId
// ============================================

/// Identity of a Lightning node: its compressed static public key.
///
/// Only the encoding shape is validated here (length and 0x02/0x03 prefix).
///
/// # Example
/// ```
/// use lightwire_common::types::NodeId;
///
/// let hex = "028d7500dd4c12685d1f568b4c2b5048e8534b873319f3a8daa612b469132ec7f7";
/// let id: NodeId = hex.parse().unwrap();
/// assert_eq!(id.to_string(), hex);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId([u8; NODE_ID_SIZE]);

impl NodeId {
    /// Creates a `NodeId` from a serialized compressed key.
    ///
    /// # Errors
    /// Wrong length or a prefix byte other than 0x02/0x03.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CommonError> {
        if bytes.len() != NODE_ID_SIZE {
            return Err(CommonError::invalid_length(NODE_ID_SIZE, bytes.len()));
        }
        if bytes[0] != 0x02 && bytes[0] != 0x03 {
            return Err(CommonError::invalid_input(
                "node_id",
                "not a compressed public key",
            ));
        }
        let mut id = [0u8; NODE_ID_SIZE];
        id.copy_from_slice(bytes);
        Ok(Self(id))
    }

    /// Wraps an already serialized key without checking the prefix.
    #[must_use]
    pub const fn from_array(bytes: [u8; NODE_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; NODE_ID_SIZE] {
        &self.0
    }

    /// Short form for log lines: first 4 bytes in hex.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}...)", self.short())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for NodeId {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim())?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for NodeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Self::from_slice(&bytes).map_err(serde::de::Error::custom)
        }
    }
}

impl AsRef<[u8]> for NodeId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ============================================
// ConnectionId
// ============================================

/// Local identifier for one connection attempt.
///
/// Two connections to the same peer (e.g. a redial) get different ids,
/// which keeps log lines and the peer table unambiguous.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId([u8; CONNECTION_ID_SIZE]);

impl ConnectionId {
    /// Generates a new random id.
    #[must_use]
    pub fn generate() -> Self {
        let mut id = [0u8; CONNECTION_ID_SIZE];
        rand::thread_rng().fill_bytes(&mut id);
        Self(id)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CONNECTION_ID_SIZE] {
        &self.0
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", hex::encode(self.0))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

// ============================================
// Tests
// ============================================
