// ============================================
// File: crates/lightwire-transport/src/lib.rs
// ============================================
//! # Lightwire Transport - Byte Stream Layer
//!
//! ## Creation Reason
//! Provides the byte-stream plumbing underneath encrypted peer
//! connections: TCP listeners and dialers for production and in-memory
//! pipes for tests.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`traits`]: `PeerStream`, `Listener` and `Dialer` abstractions
//! - [`tcp`]: TCP implementation
//! - `mock`: in-memory pipes and byte-tampering streams (feature `mock`)
//! - [`error`]: Transport-specific error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              lightwire-node                         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │   lightwire-core       lightwire-transport         │
//! │                        You are here ◄──            │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │             lightwire-common                       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate never sees plaintext or keys
//! - Always use traits for testability
//! - Mock implementations available with `mock` feature
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod tcp;
pub mod traits;

// Re-export primary types
pub use error::{Result, TransportError};
pub use tcp::{TcpDialer, TcpListener};
pub use traits::{Accepted, BoxedStream, Dialer, Listener, PeerStream};
