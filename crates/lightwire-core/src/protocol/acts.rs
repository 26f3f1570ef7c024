// ============================================
// File: crates/lightwire-core/src/protocol/acts.rs
// ============================================
//! # Handshake Act Codec
//!
//! ## Creation Reason
//! Splits the fixed-size handshake acts into their fields and builds them
//! back up, keeping byte layout out of the state machine.
//!
//! ## Wire Format
//! ```text
//! Act One / Two (50 bytes)
//! ┌─────────┬────────────────────────────┬──────────────┐
//! │ version │ ephemeral pubkey (33)      │ tag (16)     │
//! └─────────┴────────────────────────────┴──────────────┘
//!
//! Act Three (66 bytes)
//! ┌─────────┬────────────────────────────┬──────────────┐
//! │ version │ enc(static pubkey) (49)    │ tag (16)     │
//! └─────────┴────────────────────────────┴──────────────┘
//! ```
//!
//! ## Parsing Strategy
//! 1. Exact length check (before any cryptography)
//! 2. Version byte check
//! 3. Copy fixed-size fields out
//!
//! ## ⚠️ Important Note for Next Developer
//! - Public key validity is NOT checked here; the state machine parses the
//!   key with `parse_public_key` right before using it
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::version::HandshakeVersion;
use crate::crypto::{POLY1305_TAG_SIZE, PUBLIC_KEY_SIZE};
use crate::error::{CoreError, Result};
use crate::noise::{ACT_ONE_SIZE, ACT_THREE_SIZE, ACT_TWO_SIZE};

/// Size of the encrypted static key in act three.
pub const ENCRYPTED_STATIC_SIZE: usize = PUBLIC_KEY_SIZE + POLY1305_TAG_SIZE;

// ============================================
// Act
// ============================================

/// Which of the three acts a buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Act {
    /// Initiator → responder, ephemeral key.
    One,
    /// Responder → initiator, ephemeral key.
    Two,
    /// Initiator → responder, encrypted static key.
    Three,
}

impl Act {
    /// Act number as used in error messages.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// Exact wire size.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::One => ACT_ONE_SIZE,
            Self::Two => ACT_TWO_SIZE,
            Self::Three => ACT_THREE_SIZE,
        }
    }
}

impl fmt::Display for Act {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "act {}", self.number())
    }
}

/// Checks length then version, returning the bytes after the version.
fn check_header(act: Act, buf: &[u8]) -> Result<&[u8]> {
    if buf.len() != act.size() {
        return Err(CoreError::InvalidActLength {
            act: act.number(),
            expected: act.size(),
            actual: buf.len(),
        });
    }
    let mut cursor = buf;
    let version = HandshakeVersion::new(cursor.get_u8());
    if !version.is_supported() {
        return Err(CoreError::UnsupportedVersion {
            act: act.number(),
            got: version.as_u8(),
            expected: HandshakeVersion::current().as_u8(),
        });
    }
    Ok(cursor)
}

// ============================================
// EphemeralAct (acts one and two)
// ============================================

/// Decoded act one or act two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralAct {
    /// Sender's compressed ephemeral public key (unvalidated).
    pub ephemeral: [u8; PUBLIC_KEY_SIZE],
    /// AEAD tag over the empty payload.
    pub tag: [u8; POLY1305_TAG_SIZE],
}

impl EphemeralAct {
    /// Parses act one or two.
    ///
    /// # Errors
    /// `InvalidActLength` or `UnsupportedVersion`.
    pub fn decode(act: Act, buf: &[u8]) -> Result<Self> {
        let mut body = check_header(act, buf)?;
        let mut ephemeral = [0u8; PUBLIC_KEY_SIZE];
        let mut tag = [0u8; POLY1305_TAG_SIZE];
        body.copy_to_slice(&mut ephemeral);
        body.copy_to_slice(&mut tag);
        Ok(Self { ephemeral, tag })
    }

    /// Serializes with the current version byte.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(ACT_ONE_SIZE);
        buf.put_u8(HandshakeVersion::current().as_u8());
        buf.put_slice(&self.ephemeral);
        buf.put_slice(&self.tag);
        buf.freeze()
    }
}

// ============================================
// StaticAct (act three)
// ============================================

/// Decoded act three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAct {
    /// Initiator's static key, encrypted and tagged.
    pub encrypted_static: [u8; ENCRYPTED_STATIC_SIZE],
    /// AEAD tag over the empty payload.
    pub tag: [u8; POLY1305_TAG_SIZE],
}

impl StaticAct {
    /// Parses act three.
    ///
    /// # Errors
    /// `InvalidActLength` or `UnsupportedVersion`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut body = check_header(Act::Three, buf)?;
        let mut encrypted_static = [0u8; ENCRYPTED_STATIC_SIZE];
        let mut tag = [0u8; POLY1305_TAG_SIZE];
        body.copy_to_slice(&mut encrypted_static);
        body.copy_to_slice(&mut tag);
        Ok(Self {
            encrypted_static,
            tag,
        })
    }

    /// Serializes with the current version byte.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(ACT_THREE_SIZE);
        buf.put_u8(HandshakeVersion::current().as_u8());
        buf.put_slice(&self.encrypted_static);
        buf.put_slice(&self.tag);
        buf.freeze()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::test_vectors::{with_byte, ACT_ONE, ACT_THREE};

    #[test]
    fn test_ephemeral_act_fields() {
        let bytes = hex::decode(ACT_ONE).unwrap();
        let act = EphemeralAct::decode(Act::One, &bytes).unwrap();
        assert_eq!(act.ephemeral[0], 0x03);
        assert_eq!(&act.ephemeral[..], &bytes[1..34]);
        assert_eq!(&act.tag[..], &bytes[34..]);
        assert_eq!(act.encode().as_ref(), &bytes[..]);
    }

    #[test]
    fn test_static_act_fields() {
        let bytes = hex::decode(ACT_THREE).unwrap();
        let act = StaticAct::decode(&bytes).unwrap();
        assert_eq!(&act.encrypted_static[..], &bytes[1..50]);
        assert_eq!(act.encode().as_ref(), &bytes[..]);
    }

    #[test]
    fn test_length_checked_before_version() {
        // Wrong version AND wrong length: length wins
        let mut bytes = with_byte(ACT_ONE, 0, 0x01);
        bytes.pop();
        let err = EphemeralAct::decode(Act::One, &bytes).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidActLength { act: 1, expected: 50, actual: 49 }
        ));

        let mut long = hex::decode(ACT_THREE).unwrap();
        long.push(0);
        assert!(matches!(
            StaticAct::decode(&long),
            Err(CoreError::InvalidActLength { act: 3, .. })
        ));
    }

    #[test]
    fn test_bad_version_rejected() {
        let bytes = with_byte(ACT_ONE, 0, 0x01);
        let err = EphemeralAct::decode(Act::Two, &bytes).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedVersion { act: 2, got: 1, expected: 0 }
        ));
    }

    #[test]
    fn test_act_sizes() {
        assert_eq!(Act::One.size(), 50);
        assert_eq!(Act::Two.size(), 50);
        assert_eq!(Act::Three.size(), 66);
        assert_eq!(Act::Three.to_string(), "act 3");
    }
}
