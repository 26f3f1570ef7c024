// ============================================
// File: crates/lightwire-core/src/noise/handshake.rs
// ============================================
//! # Noise_XK Handshake State Machine
//!
//! ## Creation Reason
//! Drives the three BOLT8 acts for either role. Each state variant owns
//! exactly the secrets valid at that point, so a step called out of order
//! has nothing to work with and fails.
//!
//! ## Main Logical Flow
//! ### Initiator
//! 1. `get_act_one()`: e, es → act one
//! 2. `process_act_two(act)`: re, ee, then s, se → act three; Complete
//!
//! ### Responder
//! 1. `process_act_one(act)`: re, es, then e, ee → act two
//! 2. `process_act_three(act)`: rs, se → Complete, returns initiator id
//!
//! Both: `into_transport(rotation)` → `NoiseTransport`.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Each step takes the state out and leaves `Failed` behind; only a
//!   successful step installs the next state. Secrets of a failed step are
//!   dropped (and wiped) with the moved-out state.
//! - Length and version are checked by the act codec before any ECDH
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::fmt;
use std::mem;
use std::sync::Arc;

use bytes::Bytes;
use secp256k1::PublicKey;
use tracing::debug;

use lightwire_common::NodeId;

use super::cipher::{CipherState, Direction, KeyRotation};
use super::framing::NoiseTransport;
use super::symmetric::{SplitKeys, SymmetricState};
use crate::crypto::ecdh::{ecdh, parse_public_key};
use crate::crypto::keys::{EphemeralKeyPair, StaticKeyPair};
use crate::error::{CoreError, Result};
use crate::protocol::acts::{Act, EphemeralAct, StaticAct};

// ============================================
// Public State Types
// ============================================

/// Side of the handshake; fixed for a connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeRole {
    /// Dials out and already knows the responder's static key.
    Initiator,
    /// Accepts and learns the initiator's static key in act three.
    Responder,
}

impl fmt::Display for HandshakeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiator => f.write_str("initiator"),
            Self::Responder => f.write_str("responder"),
        }
    }
}

/// Observable progress of a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStep {
    /// Act one has not been exchanged yet.
    AwaitingActOne,
    /// Initiator has sent act one.
    AwaitingActTwo,
    /// Responder has sent act two.
    AwaitingActThree,
    /// Transport keys are ready.
    Complete,
    /// A step failed; terminal.
    Failed,
}

// ============================================
// Internal State
// ============================================

enum State {
    InitiatorStart {
        symmetric: SymmetricState,
        ephemeral: EphemeralKeyPair,
    },
    InitiatorAwaitingActTwo {
        symmetric: SymmetricState,
        ephemeral: EphemeralKeyPair,
    },
    ResponderAwaitingActOne {
        symmetric: SymmetricState,
        ephemeral: EphemeralKeyPair,
    },
    ResponderAwaitingActThree {
        symmetric: SymmetricState,
        ephemeral: EphemeralKeyPair,
    },
    Complete(Box<SplitKeys>),
    Failed,
}

// ============================================
// NoiseHandshake
// ============================================

/// One handshake attempt.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use lightwire_core::crypto::StaticKeyPair;
/// use lightwire_core::noise::{KeyRotation, NoiseHandshake};
///
/// let alice = Arc::new(StaticKeyPair::generate());
/// let bob = Arc::new(StaticKeyPair::generate());
///
/// let mut initiator = NoiseHandshake::initiator(alice.clone(), &bob.node_id()).unwrap();
/// let mut responder = NoiseHandshake::responder(bob);
///
/// let act_one = initiator.get_act_one().unwrap();
/// let act_two = responder.process_act_one(&act_one).unwrap();
/// let act_three = initiator.process_act_two(&act_two).unwrap();
/// let remote = responder.process_act_three(&act_three).unwrap();
/// assert_eq!(remote, alice.node_id());
///
/// let mut a = initiator.into_transport(KeyRotation::Bolt8).unwrap();
/// let mut b = responder.into_transport(KeyRotation::Bolt8).unwrap();
/// let frame = a.encrypt_message(b"ping").unwrap();
/// assert_eq!(b.decrypt_frame(&frame).unwrap(), b"ping");
/// ```
pub struct NoiseHandshake {
    role: HandshakeRole,
    local_static: Arc<StaticKeyPair>,
    remote_static: Option<PublicKey>,
    state: State,
}

impl NoiseHandshake {
    /// Starts an outbound handshake towards `remote_static`.
    ///
    /// # Errors
    /// `InvalidPublicKey` if `remote_static` is not a curve point.
    pub fn initiator(local_static: Arc<StaticKeyPair>, remote_static: &NodeId) -> Result<Self> {
        let rs = parse_public_key(remote_static.as_bytes(), "remote static key")?;
        Ok(Self {
            role: HandshakeRole::Initiator,
            local_static,
            remote_static: Some(rs),
            state: State::InitiatorStart {
                symmetric: SymmetricState::initialize(&rs),
                ephemeral: EphemeralKeyPair::generate(),
            },
        })
    }

    /// Starts an inbound handshake.
    #[must_use]
    pub fn responder(local_static: Arc<StaticKeyPair>) -> Self {
        let symmetric = SymmetricState::initialize(&local_static.public_key());
        Self {
            role: HandshakeRole::Responder,
            local_static,
            remote_static: None,
            state: State::ResponderAwaitingActOne {
                symmetric,
                ephemeral: EphemeralKeyPair::generate(),
            },
        }
    }

    /// Replaces the generated ephemeral key. Only effective before the
    /// ephemeral key has been sent.
    #[must_use]
    pub fn with_ephemeral(mut self, ephemeral: EphemeralKeyPair) -> Self {
        match &mut self.state {
            State::InitiatorStart { ephemeral: e, .. }
            | State::ResponderAwaitingActOne { ephemeral: e, .. } => *e = ephemeral,
            _ => {}
        }
        self
    }

    /// Role of this side.
    #[must_use]
    pub const fn role(&self) -> HandshakeRole {
        self.role
    }

    /// Current step.
    #[must_use]
    pub fn state(&self) -> HandshakeStep {
        match self.state {
            State::InitiatorStart { .. } | State::ResponderAwaitingActOne { .. } => {
                HandshakeStep::AwaitingActOne
            }
            State::InitiatorAwaitingActTwo { .. } => HandshakeStep::AwaitingActTwo,
            State::ResponderAwaitingActThree { .. } => HandshakeStep::AwaitingActThree,
            State::Complete(_) => HandshakeStep::Complete,
            State::Failed => HandshakeStep::Failed,
        }
    }

    /// `true` once transport keys are available.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, State::Complete(_))
    }

    /// Remote static key: known up front for the initiator, after act
    /// three for the responder.
    #[must_use]
    pub fn remote_static(&self) -> Option<NodeId> {
        self.remote_static.map(|pk| NodeId::from_array(pk.serialize()))
    }

    fn take_state(&mut self) -> State {
        mem::replace(&mut self.state, State::Failed)
    }

    // ========================================
    // Initiator
    // ========================================

    /// Produces act one.
    ///
    /// # Errors
    /// `InvalidState` unless this is a fresh initiator.
    pub fn get_act_one(&mut self) -> Result<Bytes> {
        let State::InitiatorStart {
            mut symmetric,
            ephemeral,
        } = self.take_state()
        else {
            return Err(CoreError::invalid_state("get_act_one", "fresh initiator"));
        };
        let rs = self
            .remote_static
            .ok_or_else(|| CoreError::invalid_state("get_act_one", "known remote static key"))?;

        let e_pub = ephemeral.public_key_bytes();
        symmetric.mix_hash(&e_pub);
        symmetric.mix_key(&*ecdh(ephemeral.secret_key(), &rs))?;
        let tag = symmetric.encrypt_and_hash(&[])?;

        let act = EphemeralAct {
            ephemeral: e_pub,
            tag: to_tag(&tag)?,
        }
        .encode();

        debug!(role = %self.role, "Act one written");
        self.state = State::InitiatorAwaitingActTwo {
            symmetric,
            ephemeral,
        };
        Ok(act)
    }

    /// Consumes act two and produces act three. The handshake is complete
    /// afterwards on this side.
    ///
    /// # Errors
    /// Length, version, curve point or tag failure; `InvalidState` if act
    /// one was not sent.
    pub fn process_act_two(&mut self, act: &[u8]) -> Result<Bytes> {
        let State::InitiatorAwaitingActTwo {
            mut symmetric,
            ephemeral,
        } = self.take_state()
        else {
            return Err(CoreError::invalid_state(
                "process_act_two",
                "initiator awaiting act two",
            ));
        };

        let parsed = EphemeralAct::decode(Act::Two, act)?;
        let re = parse_public_key(&parsed.ephemeral, "act two ephemeral key")?;
        symmetric.mix_hash(&parsed.ephemeral);
        symmetric.mix_key(&*ecdh(ephemeral.secret_key(), &re))?;
        symmetric.decrypt_and_hash(&parsed.tag, "act two tag")?;

        let encrypted_static = symmetric.encrypt_and_hash(&self.local_static.public_key_bytes())?;
        symmetric.mix_key(&*ecdh(self.local_static.secret_key(), &re))?;
        let tag = symmetric.encrypt_and_hash(&[])?;

        let act_three = StaticAct {
            encrypted_static: encrypted_static.as_slice().try_into().map_err(|_| {
                CoreError::Encryption {
                    context: "act three static key has unexpected length".into(),
                }
            })?,
            tag: to_tag(&tag)?,
        }
        .encode();

        debug!(role = %self.role, "Act two verified, act three written");
        self.state = State::Complete(Box::new(symmetric.split()?));
        Ok(act_three)
    }

    // ========================================
    // Responder
    // ========================================

    /// Consumes act one and produces act two.
    ///
    /// # Errors
    /// Length, version, curve point or tag failure; `InvalidState` if not a
    /// fresh responder.
    pub fn process_act_one(&mut self, act: &[u8]) -> Result<Bytes> {
        let State::ResponderAwaitingActOne {
            mut symmetric,
            ephemeral,
        } = self.take_state()
        else {
            return Err(CoreError::invalid_state("process_act_one", "fresh responder"));
        };

        let parsed = EphemeralAct::decode(Act::One, act)?;
        let re = parse_public_key(&parsed.ephemeral, "act one ephemeral key")?;
        symmetric.mix_hash(&parsed.ephemeral);
        symmetric.mix_key(&*ecdh(self.local_static.secret_key(), &re))?;
        symmetric.decrypt_and_hash(&parsed.tag, "act one tag")?;

        let e_pub = ephemeral.public_key_bytes();
        symmetric.mix_hash(&e_pub);
        symmetric.mix_key(&*ecdh(ephemeral.secret_key(), &re))?;
        let tag = symmetric.encrypt_and_hash(&[])?;

        let act_two = EphemeralAct {
            ephemeral: e_pub,
            tag: to_tag(&tag)?,
        }
        .encode();

        debug!(role = %self.role, "Act one verified, act two written");
        self.state = State::ResponderAwaitingActThree {
            symmetric,
            ephemeral,
        };
        Ok(act_two)
    }

    /// Consumes act three and completes the handshake, returning the
    /// initiator's identity.
    ///
    /// # Errors
    /// Length, version, curve point or tag failure; `InvalidState` if act
    /// two was not sent.
    pub fn process_act_three(&mut self, act: &[u8]) -> Result<NodeId> {
        let State::ResponderAwaitingActThree {
            mut symmetric,
            ephemeral,
        } = self.take_state()
        else {
            return Err(CoreError::invalid_state(
                "process_act_three",
                "responder awaiting act three",
            ));
        };
        let parsed = StaticAct::decode(act)?;
        let rs_bytes = symmetric.decrypt_and_hash(&parsed.encrypted_static, "act three static key")?;
        let rs = parse_public_key(&rs_bytes, "act three static key")?;
        symmetric.mix_key(&*ecdh(ephemeral.secret_key(), &rs))?;
        symmetric.decrypt_and_hash(&parsed.tag, "act three tag")?;

        let remote = NodeId::from_array(rs.serialize());
        debug!(role = %self.role, peer = %remote, "Act three verified");
        self.remote_static = Some(rs);
        self.state = State::Complete(Box::new(symmetric.split()?));
        Ok(remote)
    }

    // ========================================
    // Completion
    // ========================================

    /// Turns the finished handshake into directional cipher states.
    ///
    /// # Errors
    /// `InvalidState` if the handshake is not complete.
    pub fn into_transport(mut self, rotation: KeyRotation) -> Result<NoiseTransport> {
        let State::Complete(keys) = self.take_state() else {
            return Err(CoreError::invalid_state("into_transport", "complete handshake"));
        };
        let remote = self
            .remote_static()
            .ok_or_else(|| CoreError::invalid_state("into_transport", "known remote static key"))?;

        let SplitKeys {
            initiator_to_responder,
            responder_to_initiator,
            chaining_key,
        } = *keys;
        let (send_key, recv_key) = match self.role {
            HandshakeRole::Initiator => (initiator_to_responder, responder_to_initiator),
            HandshakeRole::Responder => (responder_to_initiator, initiator_to_responder),
        };

        let send = CipherState::new(send_key, chaining_key.clone(), Direction::Send, rotation);
        let recv = CipherState::new(recv_key, chaining_key, Direction::Receive, rotation);
        Ok(NoiseTransport::new(send, recv, remote))
    }

    #[cfg(test)]
    fn split_keys(&self) -> Option<&SplitKeys> {
        match &self.state {
            State::Complete(keys) => Some(keys),
            _ => None,
        }
    }
}

impl fmt::Debug for NoiseHandshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoiseHandshake")
            .field("role", &self.role)
            .field("state", &self.state())
            .field("remote_static", &self.remote_static())
            .finish_non_exhaustive()
    }
}

fn to_tag(bytes: &[u8]) -> Result<[u8; 16]> {
    bytes.try_into().map_err(|_| CoreError::Encryption {
        context: "handshake tag has unexpected length".into(),
    })
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::noise::test_vectors::*;

    // ========================================
    // Initiator vectors
    // ========================================

    #[test]
    fn test_initiator_successful_handshake() {
        let mut initiator = initiator();
        assert_eq!(initiator.state(), HandshakeStep::AwaitingActOne);

        let act_one = initiator.get_act_one().unwrap();
        assert_eq!(hex::encode(&act_one), ACT_ONE);
        assert_eq!(initiator.state(), HandshakeStep::AwaitingActTwo);

        let act_three = initiator
            .process_act_two(&hex::decode(ACT_TWO).unwrap())
            .unwrap();
        assert_eq!(hex::encode(&act_three), ACT_THREE);
        assert!(initiator.is_complete());

        let keys = initiator.split_keys().unwrap();
        assert_eq!(hex::encode(keys.initiator_to_responder.as_bytes()), INITIATOR_SEND_KEY);
        assert_eq!(hex::encode(keys.responder_to_initiator.as_bytes()), INITIATOR_RECV_KEY);
        assert_eq!(hex::encode(keys.chaining_key.as_bytes()), FINAL_CHAINING_KEY);
    }

    #[test]
    fn test_initiator_act_two_bad_version() {
        let mut initiator = initiator();
        initiator.get_act_one().unwrap();

        let err = initiator.process_act_two(&with_byte(ACT_TWO, 0, 0x01)).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedVersion { act: 2, got: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::HandshakeFailure);
        assert_eq!(initiator.state(), HandshakeStep::Failed);
    }

    #[test]
    fn test_initiator_act_two_bad_pubkey() {
        let mut initiator = initiator();
        initiator.get_act_one().unwrap();

        let err = initiator.process_act_two(&with_byte(ACT_TWO, 1, 0x04)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPublicKey { .. }));
        assert_eq!(err.kind(), ErrorKind::HandshakeFailure);
    }

    #[test]
    fn test_initiator_act_two_bad_mac() {
        let mut initiator = initiator();
        initiator.get_act_one().unwrap();

        let err = initiator.process_act_two(&with_byte(ACT_TWO, 49, 0xaf)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
        assert_eq!(initiator.state(), HandshakeStep::Failed);
    }

    // ========================================
    // Responder vectors
    // ========================================

    #[test]
    fn test_responder_successful_handshake() {
        let mut responder = responder();

        let act_two = responder
            .process_act_one(&hex::decode(ACT_ONE).unwrap())
            .unwrap();
        assert_eq!(hex::encode(&act_two), ACT_TWO);
        assert_eq!(responder.state(), HandshakeStep::AwaitingActThree);
        assert!(responder.remote_static().is_none());

        let remote = responder
            .process_act_three(&hex::decode(ACT_THREE).unwrap())
            .unwrap();
        assert_eq!(remote.to_string(), INITIATOR_STATIC_PUB);
        assert_eq!(responder.remote_static(), Some(remote));

        let keys = responder.split_keys().unwrap();
        assert_eq!(hex::encode(keys.initiator_to_responder.as_bytes()), INITIATOR_SEND_KEY);
        assert_eq!(hex::encode(keys.responder_to_initiator.as_bytes()), INITIATOR_RECV_KEY);
    }

    #[test]
    fn test_responder_act_one_bad_version() {
        let mut responder = responder();
        let err = responder.process_act_one(&with_byte(ACT_ONE, 0, 0x01)).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedVersion { act: 1, .. }));
    }

    #[test]
    fn test_responder_act_one_bad_pubkey() {
        let mut responder = responder();
        let err = responder.process_act_one(&with_byte(ACT_ONE, 1, 0x04)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPublicKey { .. }));
    }

    #[test]
    fn test_responder_act_one_bad_mac() {
        let mut responder = responder();
        let err = responder.process_act_one(&with_byte(ACT_ONE, 49, 0x6b)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    }

    fn responder_after_act_one() -> NoiseHandshake {
        let mut responder = responder();
        responder
            .process_act_one(&hex::decode(ACT_ONE).unwrap())
            .unwrap();
        responder
    }

    #[test]
    fn test_responder_act_three_bad_version() {
        let mut responder = responder_after_act_one();
        let err = responder.process_act_three(&with_byte(ACT_THREE, 0, 0x01)).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedVersion { act: 3, .. }));
    }

    #[test]
    fn test_responder_act_three_bad_ciphertext() {
        let mut responder = responder_after_act_one();
        let err = responder.process_act_three(&with_byte(ACT_THREE, 1, 0xc9)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    }

    #[test]
    fn test_responder_act_three_bad_pubkey() {
        let mut responder = responder_after_act_one();
        let act = hex::decode(
            "00bfe3a702e93e3a9948c2ed6e5fd7590a6e1c3a0344cfc9d5b57357049aa2235536ad09a8ee351870c2bb7f78b754a26c6cef79a98d25139c856d7efd252c2ae73c",
        )
        .unwrap();
        let err = responder.process_act_three(&act).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPublicKey { .. }));
        assert!(responder.remote_static().is_none());
    }

    #[test]
    fn test_responder_act_three_bad_mac() {
        let mut responder = responder_after_act_one();
        let err = responder.process_act_three(&with_byte(ACT_THREE, 65, 0xbb)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
        assert_eq!(responder.state(), HandshakeStep::Failed);
    }

    // ========================================
    // State machine
    // ========================================

    #[test]
    fn test_truncated_act_rejected() {
        let mut responder = responder();
        let err = responder.process_act_one(&[0u8; 49]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidActLength { act: 1, actual: 49, .. }));

        let mut responder = responder_after_act_one();
        let err = responder.process_act_three(&[0u8; 67]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidActLength { act: 3, actual: 67, .. }));
    }

    #[test]
    fn test_out_of_order_steps_fail() {
        let mut responder = responder();
        assert!(matches!(
            responder.get_act_one(),
            Err(CoreError::InvalidState { .. })
        ));
        assert_eq!(responder.state(), HandshakeStep::Failed);

        let mut initiator = initiator();
        let err = initiator
            .process_act_two(&hex::decode(ACT_TWO).unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HandshakeFailure);
    }

    #[test]
    fn test_failed_state_is_terminal() {
        let mut initiator = initiator();
        initiator.get_act_one().unwrap();
        initiator.process_act_two(&with_byte(ACT_TWO, 49, 0xaf)).unwrap_err();

        assert!(initiator
            .process_act_two(&hex::decode(ACT_TWO).unwrap())
            .is_err());
        assert!(initiator.into_transport(KeyRotation::Bolt8).is_err());
    }

    #[test]
    fn test_into_transport_requires_completion() {
        let initiator = initiator();
        assert!(matches!(
            initiator.into_transport(KeyRotation::Bolt8),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_random_keys_agree_on_transport_keys() {
        let a = Arc::new(StaticKeyPair::generate());
        let b = Arc::new(StaticKeyPair::generate());

        let mut initiator = NoiseHandshake::initiator(a.clone(), &b.node_id()).unwrap();
        let mut responder = NoiseHandshake::responder(b.clone());

        let act_one = initiator.get_act_one().unwrap();
        let act_two = responder.process_act_one(&act_one).unwrap();
        let act_three = initiator.process_act_two(&act_two).unwrap();
        assert_eq!(responder.process_act_three(&act_three).unwrap(), a.node_id());

        let ik = initiator.split_keys().unwrap();
        let rk = responder.split_keys().unwrap();
        assert_eq!(ik.initiator_to_responder, rk.initiator_to_responder);
        assert_eq!(ik.responder_to_initiator, rk.responder_to_initiator);
        assert_ne!(ik.initiator_to_responder, ik.responder_to_initiator);
        assert_eq!(initiator.remote_static(), Some(b.node_id()));
    }

    #[test]
    fn test_wrong_responder_key_fails_act_one() {
        let a = Arc::new(StaticKeyPair::generate());
        let b = Arc::new(StaticKeyPair::generate());
        let impostor = Arc::new(StaticKeyPair::generate());

        let mut initiator = NoiseHandshake::initiator(a, &b.node_id()).unwrap();
        let mut responder = NoiseHandshake::responder(impostor);

        let act_one = initiator.get_act_one().unwrap();
        let err = responder.process_act_one(&act_one).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    }
}
