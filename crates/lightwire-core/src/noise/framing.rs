// ============================================
// File: crates/lightwire-core/src/noise/framing.rs
// ============================================
//! # Transport Framing
//!
//! ## Creation Reason
//! Turns application messages into BOLT8 transport frames and back, using
//! the two cipher states produced by the handshake.
//!
//! ## Wire Format
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────┐
//! │ enc(len: u16 BE) ‖ tag       │ enc(body) ‖ tag                  │
//! │ 18 bytes                     │ len + 16 bytes                   │
//! └──────────────────────────────┴──────────────────────────────────┘
//! ```
//!
//! ## Main Functionality
//! - `FrameEncoder`: send side (one frame = two nonces)
//! - `FrameDecoder`: receive side; header then body, for exact-length reads
//! - `NoiseTransport`: both halves plus the peer identity
//!
//! ## ⚠️ Important Note for Next Developer
//! - Encoding checks size and nonce budget before touching the cipher, so
//!   a rejected message consumes no nonce
//! - A decode error leaves the decoder unusable in practice (nonce
//!   mismatch); close the connection
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use tracing::trace;

use lightwire_common::NodeId;

use super::cipher::CipherState;
use super::{LENGTH_HEADER_SIZE, MAX_MESSAGE_SIZE};
use crate::crypto::POLY1305_TAG_SIZE;
use crate::error::{CoreError, Result};

/// Nonces consumed by one frame.
const NONCES_PER_FRAME: u64 = 2;

// ============================================
// FrameEncoder
// ============================================

/// Send half of a transport.
#[derive(Debug)]
pub struct FrameEncoder {
    cipher: CipherState,
    max_message_size: usize,
}

impl FrameEncoder {
    /// Wraps a send-direction cipher state.
    #[must_use]
    pub fn new(cipher: CipherState) -> Self {
        Self {
            cipher,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }

    /// Lowers the largest message accepted (capped at 65535).
    #[must_use]
    pub fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max.min(MAX_MESSAGE_SIZE);
        self
    }

    /// Encrypts `message` into one frame.
    ///
    /// # Errors
    /// `FrameTooLarge` or `KeyExhausted`, both without consuming a nonce.
    pub fn encode(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        let len = u16::try_from(message.len())
            .ok()
            .filter(|_| message.len() <= self.max_message_size)
            .ok_or(CoreError::FrameTooLarge {
                max: self.max_message_size,
                actual: message.len(),
            })?;
        self.cipher.ensure_available(NONCES_PER_FRAME)?;

        let mut frame = Vec::with_capacity(LENGTH_HEADER_SIZE + message.len() + POLY1305_TAG_SIZE);
        frame.extend_from_slice(&self.cipher.encrypt(&len.to_be_bytes())?);
        frame.extend_from_slice(&self.cipher.encrypt(message)?);
        trace!(len, nonce = self.cipher.nonce(), "Frame encoded");
        Ok(frame)
    }

    /// Nonce the next frame header will use.
    #[must_use]
    pub const fn nonce(&self) -> u64 {
        self.cipher.nonce()
    }

    /// Moves the send nonce, for exercising the exhaustion boundary.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn force_nonce(&mut self, nonce: u64) {
        self.cipher.force_nonce(nonce);
    }
}

// ============================================
// FrameDecoder
// ============================================

/// Receive half of a transport.
#[derive(Debug)]
pub struct FrameDecoder {
    cipher: CipherState,
    max_message_size: usize,
}

impl FrameDecoder {
    /// Wraps a receive-direction cipher state.
    #[must_use]
    pub fn new(cipher: CipherState) -> Self {
        Self {
            cipher,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }

    /// Lowers the largest message accepted (capped at 65535).
    #[must_use]
    pub fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max.min(MAX_MESSAGE_SIZE);
        self
    }

    /// Decrypts an 18-byte header and returns the body length.
    ///
    /// # Errors
    /// `Decryption` on tag mismatch, `FrameTooLarge` above the limit.
    pub fn decrypt_length(&mut self, header: &[u8]) -> Result<usize> {
        let plaintext = self.cipher.decrypt(header, "frame length")?;
        let len = match plaintext.as_slice() {
            [hi, lo] => usize::from(u16::from_be_bytes([*hi, *lo])),
            _ => return Err(CoreError::decryption("frame length")),
        };
        if len > self.max_message_size {
            return Err(CoreError::FrameTooLarge {
                max: self.max_message_size,
                actual: len,
            });
        }
        Ok(len)
    }

    /// Decrypts a `len + 16` byte body.
    ///
    /// # Errors
    /// `Decryption` on tag mismatch.
    pub fn decrypt_body(&mut self, body: &[u8]) -> Result<Vec<u8>> {
        self.cipher.decrypt(body, "frame body")
    }

    /// Bytes to read for a body of `len` bytes.
    #[must_use]
    pub const fn body_size(len: usize) -> usize {
        len + POLY1305_TAG_SIZE
    }

    /// Nonce the next header will be decrypted with.
    #[must_use]
    pub const fn nonce(&self) -> u64 {
        self.cipher.nonce()
    }
}

// ============================================
// NoiseTransport
// ============================================

/// Established transport: both frame halves and the peer's identity.
#[derive(Debug)]
pub struct NoiseTransport {
    encoder: FrameEncoder,
    decoder: FrameDecoder,
    remote_static: NodeId,
}

impl NoiseTransport {
    /// Assembles a transport from the handshake's cipher states.
    #[must_use]
    pub fn new(send: CipherState, recv: CipherState, remote_static: NodeId) -> Self {
        Self {
            encoder: FrameEncoder::new(send),
            decoder: FrameDecoder::new(recv),
            remote_static,
        }
    }

    /// Applies a message size limit to both directions.
    #[must_use]
    pub fn with_max_message_size(self, max: usize) -> Self {
        Self {
            encoder: self.encoder.with_max_message_size(max),
            decoder: self.decoder.with_max_message_size(max),
            remote_static: self.remote_static,
        }
    }

    /// Peer identity.
    #[must_use]
    pub const fn remote_static(&self) -> NodeId {
        self.remote_static
    }

    /// Encrypts one message.
    ///
    /// # Errors
    /// See [`FrameEncoder::encode`].
    pub fn encrypt_message(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        self.encoder.encode(message)
    }

    /// Decrypts exactly one complete frame.
    ///
    /// # Errors
    /// `Decryption` if the frame is truncated, padded or tampered with.
    pub fn decrypt_frame(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        if frame.len() < LENGTH_HEADER_SIZE {
            return Err(CoreError::decryption("truncated frame"));
        }
        let (header, body) = frame.split_at(LENGTH_HEADER_SIZE);
        let len = self.decoder.decrypt_length(header)?;
        if body.len() != FrameDecoder::body_size(len) {
            return Err(CoreError::decryption("frame body length"));
        }
        self.decoder.decrypt_body(body)
    }

    /// Separates the halves so reads and writes can run independently.
    #[must_use]
    pub fn split(self) -> (FrameEncoder, FrameDecoder, NodeId) {
        (self.encoder, self.decoder, self.remote_static)
    }

    /// Send half.
    pub fn encoder_mut(&mut self) -> &mut FrameEncoder {
        &mut self.encoder
    }

    /// Receive half.
    pub fn decoder_mut(&mut self) -> &mut FrameDecoder {
        &mut self.decoder
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::noise::cipher::KeyRotation;
    use crate::noise::test_vectors;

    /// Both sides of the BOLT8 Appendix A handshake.
    fn vector_pair(rotation: KeyRotation) -> (NoiseTransport, NoiseTransport) {
        let mut initiator = test_vectors::initiator();
        let mut responder = test_vectors::responder();
        let act_one = initiator.get_act_one().unwrap();
        let act_two = responder.process_act_one(&act_one).unwrap();
        let act_three = initiator.process_act_two(&act_two).unwrap();
        responder.process_act_three(&act_three).unwrap();
        (
            initiator.into_transport(rotation).unwrap(),
            responder.into_transport(rotation).unwrap(),
        )
    }

    #[test]
    fn test_message_encryption_vectors() {
        let (mut initiator, mut responder) = vector_pair(KeyRotation::Bolt8);
        let expected = [
            (0, "cf2b30ddf0cf3f80e7c35a6e6730b59fe802473180f396d88a8fb0db8cbcf25d2f214cf9ea1d95"),
            (1, "72887022101f0b6753e0c7de21657d35a4cb2a1f5cde2650528bbc8f837d0f0d7ad833b1a256a1"),
            (500, "178cb9d7387190fa34db9c2d50027d21793c9bc2d40b1e14dcf30ebeeeb220f48364f7a4c68bf8"),
            (501, "1b186c57d44eb6de4c057c49940d79bb838a145cb528d6e8fd26dbe50a60ca2c104b56b60e45bd"),
            (1000, "4a2f3cc3b5e78ddb83dcb426d9863d9d9a723b0337c89dd0b005d89f8d3c05c52b76b29b740f09"),
            (1001, "2ecd8c8a5629d0d02ab457a0fdd0f7b90a192cd46be5ecb6ca570bfc5e268338b1a16cf4ef2d36"),
        ];

        let mut next = expected.iter().peekable();
        for i in 0..=1001 {
            let frame = initiator.encrypt_message(b"hello").unwrap();
            if let Some((_, hex_frame)) = next.next_if(|(index, _)| *index == i) {
                assert_eq!(hex::encode(&frame), *hex_frame, "output {i} mismatch");
            }
            assert_eq!(responder.decrypt_frame(&frame).unwrap(), b"hello");
        }
        assert!(next.peek().is_none());
    }

    #[test]
    fn test_both_directions() {
        let (mut initiator, mut responder) = vector_pair(KeyRotation::Bolt8);
        let frame = responder.encrypt_message(b"from responder").unwrap();
        assert_eq!(initiator.decrypt_frame(&frame).unwrap(), b"from responder");
        let frame = initiator.encrypt_message(b"from initiator").unwrap();
        assert_eq!(responder.decrypt_frame(&frame).unwrap(), b"from initiator");
        assert_eq!(
            responder.remote_static().to_string(),
            test_vectors::INITIATOR_STATIC_PUB
        );
    }

    #[test]
    fn test_frame_sizes_and_nonces() {
        let (mut initiator, mut responder) = vector_pair(KeyRotation::Disabled);
        for len in [0usize, 1, 1000, MAX_MESSAGE_SIZE] {
            let message = vec![0xa5; len];
            let before = initiator.encoder_mut().nonce();
            let frame = initiator.encrypt_message(&message).unwrap();
            assert_eq!(frame.len(), LENGTH_HEADER_SIZE + len + POLY1305_TAG_SIZE);
            assert_eq!(initiator.encoder_mut().nonce(), before + 2);
            assert_eq!(responder.decrypt_frame(&frame).unwrap(), message);
        }
    }

    #[test]
    fn test_oversized_message_rejected_without_nonce_use() {
        let (mut initiator, _) = vector_pair(KeyRotation::Bolt8);
        let err = initiator
            .encrypt_message(&vec![0; MAX_MESSAGE_SIZE + 1])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FrameTooLarge);
        assert_eq!(initiator.encoder_mut().nonce(), 0);
    }

    #[test]
    fn test_declared_length_above_limit_rejected() {
        let (initiator, responder) = vector_pair(KeyRotation::Bolt8);
        let mut initiator = initiator;
        let mut responder = responder.with_max_message_size(100);

        let frame = initiator.encrypt_message(&[7u8; 200]).unwrap();
        let err = responder.decrypt_frame(&frame).unwrap_err();
        assert!(matches!(err, CoreError::FrameTooLarge { max: 100, actual: 200 }));
    }

    #[test]
    fn test_tampered_frame_fails() {
        let (mut initiator, _) = vector_pair(KeyRotation::Bolt8);
        let frame = initiator.encrypt_message(b"abc").unwrap();

        for index in [0, 17, 18, frame.len() - 1] {
            let (_, mut responder) = vector_pair(KeyRotation::Bolt8);
            let mut tampered = frame.clone();
            tampered[index] ^= 0x80;
            let err = responder.decrypt_frame(&tampered).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::AuthenticationFailure, "byte {index}");
        }
    }

    #[test]
    fn test_replayed_frame_fails() {
        let (mut initiator, mut responder) = vector_pair(KeyRotation::Bolt8);
        let frame = initiator.encrypt_message(b"once").unwrap();
        assert_eq!(responder.decrypt_frame(&frame).unwrap(), b"once");

        let err = responder.decrypt_frame(&frame).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    }

    #[test]
    fn test_back_to_back_frames() {
        let (mut initiator, mut responder) = vector_pair(KeyRotation::Bolt8);
        let mut wire = Vec::new();
        wire.extend(initiator.encrypt_message(b"first").unwrap());
        wire.extend(initiator.encrypt_message(b"").unwrap());
        wire.extend(initiator.encrypt_message(b"third").unwrap());

        let decoder = responder.decoder_mut();
        let mut rest = wire.as_slice();
        let mut received = Vec::new();
        while !rest.is_empty() {
            let (header, tail) = rest.split_at(LENGTH_HEADER_SIZE);
            let len = decoder.decrypt_length(header).unwrap();
            let (body, tail) = tail.split_at(FrameDecoder::body_size(len));
            received.push(decoder.decrypt_body(body).unwrap());
            rest = tail;
        }
        assert_eq!(received, vec![b"first".to_vec(), Vec::new(), b"third".to_vec()]);
        assert_eq!(decoder.nonce(), 6);
    }

    #[test]
    fn test_key_exhaustion() {
        let (mut initiator, _) = vector_pair(KeyRotation::Bolt8);
        initiator.encoder_mut().force_nonce(u64::MAX - 3);
        assert!(initiator.encrypt_message(b"fits").is_ok());
        assert_eq!(initiator.encoder_mut().nonce(), u64::MAX - 1);

        let err = initiator.encrypt_message(b"does not fit").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyExhausted);
        assert_eq!(initiator.encoder_mut().nonce(), u64::MAX - 1);
    }

    #[test]
    fn test_split_halves_work_independently() {
        let (initiator, responder) = vector_pair(KeyRotation::Bolt8);
        let (mut encoder, _, _) = initiator.split();
        let (_, mut decoder, remote) = responder.split();
        assert_eq!(remote.to_string(), test_vectors::INITIATOR_STATIC_PUB);

        let frame = encoder.encode(b"split").unwrap();
        let len = decoder.decrypt_length(&frame[..LENGTH_HEADER_SIZE]).unwrap();
        assert_eq!(len, 5);
        assert_eq!(decoder.decrypt_body(&frame[LENGTH_HEADER_SIZE..]).unwrap(), b"split");
    }
}
