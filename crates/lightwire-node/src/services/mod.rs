// ============================================
// File: crates/lightwire-node/src/services/mod.rs
// ============================================
//! # Node Services
//!
//! ## Creation Reason
//! Node-level bookkeeping that sits above individual connections.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`peers`]: registry of live peer connections
//!
//! ## ⚠️ Important Note for Next Developer
//! - Services are shared behind `Arc` and must stay `Send + Sync`
//!
//! ## Last Modified
//! v0.1.0 - Initial services structure

pub mod peers;

// Re-export primary types
pub use peers::{PeerHandle, PeerManager};
