// ============================================
// File: crates/lightwire-core/src/noise/test_vectors.rs
// ============================================
//! BOLT8 Appendix A transcripts shared by the handshake and framing tests.

use std::sync::Arc;

use lightwire_common::NodeId;

use super::handshake::NoiseHandshake;
use crate::crypto::keys::{EphemeralKeyPair, StaticKeyPair};

pub const RESPONDER_STATIC_PUB: &str =
    "028d7500dd4c12685d1f568b4c2b5048e8534b873319f3a8daa612b469132ec7f7";
pub const INITIATOR_STATIC_PUB: &str =
    "034f355bdcb7cc0af728ef3cceb9615d90684bb5b2ca5f859ab0f0b704075871aa";

pub const ACT_ONE: &str = "00036360e856310ce5d294e8be33fc807077dc56ac80d95d9cd4ddbd21325eff73f70df6086551151f58b8afe6c195782c6a";
pub const ACT_TWO: &str = "0002466d7fcae563e5cb09a0d1870bb580344804617879a14949cf22285f1bae3f276e2470b93aac583c9ef6eafca3f730ae";
pub const ACT_THREE: &str = "00b9e3a702e93e3a9948c2ed6e5fd7590a6e1c3a0344cfc9d5b57357049aa22355361aa02e55a8fc28fef5bd6d71ad0c38228dc68b1c466263b47fdf31e560e139ba";

pub const INITIATOR_SEND_KEY: &str =
    "969ab31b4d288cedf6218839b27a3e2140827047f2c0f01bf5c04435d43511a9";
pub const INITIATOR_RECV_KEY: &str =
    "bb9020b8965f4df047e07f955f3c4b88418984aadc5cdb35096b9ea8fa5c3442";
pub const FINAL_CHAINING_KEY: &str =
    "919219dbb2920afa8db80f9a51787a840bcf111ed8d588caf9ab4be716e42b01";

pub fn initiator_static() -> Arc<StaticKeyPair> {
    Arc::new(StaticKeyPair::from_secret_bytes(&[0x11; 32]).unwrap())
}

pub fn responder_static() -> Arc<StaticKeyPair> {
    Arc::new(StaticKeyPair::from_secret_bytes(&[0x21; 32]).unwrap())
}

pub fn initiator() -> NoiseHandshake {
    let rs: NodeId = RESPONDER_STATIC_PUB.parse().unwrap();
    NoiseHandshake::initiator(initiator_static(), &rs)
        .unwrap()
        .with_ephemeral(EphemeralKeyPair::from_secret_bytes(&[0x12; 32]).unwrap())
}

pub fn responder() -> NoiseHandshake {
    NoiseHandshake::responder(responder_static())
        .with_ephemeral(EphemeralKeyPair::from_secret_bytes(&[0x22; 32]).unwrap())
}

/// `hex` with the byte at `index` replaced.
pub fn with_byte(hex_str: &str, index: usize, value: u8) -> Vec<u8> {
    let mut bytes = hex::decode(hex_str).unwrap();
    bytes[index] = value;
    bytes
}
