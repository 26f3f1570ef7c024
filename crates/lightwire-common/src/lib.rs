// ============================================
// File: crates/lightwire-common/src/lib.rs
// ============================================
//! # Lightwire Common - Shared Utilities Library
//!
//! ## Creation Reason
//! Holds the identifiers and helpers that every Lightwire crate needs,
//! so the handshake, transport and node layers agree on one vocabulary.
//!
//! ## Main Functionality
//! - [`types`]: Peer identity (`NodeId`) and connection identifiers
//! - [`time`]: Lock-free timestamps for connection bookkeeping
//! - [`error`]: Common error types and result aliases
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │               lightwire-node                        │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │   lightwire-core       lightwire-transport          │
//! │         │                     │                     │
//! │         └──────────┬──────────┘                     │
//! │                    ▼                                │
//! │            lightwire-common  ◄── You are here       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Leaf crate: no internal dependencies, no curve arithmetic
//! - `NodeId` only checks shape (length and SEC1 prefix); curve
//!   validation lives in `lightwire-core`
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod time;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{CommonError, Result};
pub use types::{ConnectionId, NodeId, NODE_ID_SIZE};
