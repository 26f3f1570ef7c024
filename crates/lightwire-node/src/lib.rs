// ============================================
// File: crates/lightwire-node/src/lib.rs
// ============================================
//! # Lightwire Node Library
//!
//! ## Creation Reason
//! Runs encrypted peer connections on top of the Noise handshake and
//! framing from `lightwire-core`, over streams from `lightwire-transport`.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`connection`]: one peer connection (handshake, send, receive, close)
//! - [`node`]: listener, dialer and peer orchestration
//! - [`services`]: peer registry
//! - [`config`]: node configuration
//! - [`identity`]: node key file
//! - [`error`]: node error types and fault taxonomy
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Lightwire Node                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐    │
//! │  │   Config    │────►│    Node     │────►│  PeerManager    │    │
//! │  └─────────────┘     └──────┬──────┘     └─────────────────┘    │
//! │                             ▼                                   │
//! │                   ┌───────────────────┐                         │
//! │                   │  PeerConnection   │ ◄── Noise_XK + framing  │
//! │                   └─────────┬─────────┘                         │
//! ├─────────────────────────────┼───────────────────────────────────┤
//! │                     Transport Layer                             │
//! │              TCP listener / dialer (any byte stream)            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Configuration changes require restart (no hot-reload)
//! - Consume `ConnectionEvent`s until `Disconnected`
//!
//! ## Last Modified
//! v0.1.0 - Initial node library

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod connection;
pub mod error;
pub mod identity;
pub mod node;
pub mod services;

// Re-export primary types
pub use config::NodeConfig;
pub use connection::{
    ConnectionEvent, ConnectionSettings, ConnectionState, ConnectionStats, DisconnectReason,
    PeerConnection,
};
pub use error::{FaultKind, NodeError, Result};
pub use node::{Node, NodeEvent};
