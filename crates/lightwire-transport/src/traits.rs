// ============================================
// File: crates/lightwire-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! Defines the byte-stream seam between the encrypted connection layer
//! and whatever carries its bytes (TCP in production, in-memory pipes in
//! tests).
//!
//! ## Main Functionality
//! - `PeerStream`: any ordered, bidirectional async byte stream
//! - `Listener`: accepts inbound streams
//! - `Dialer`: opens outbound streams under a timeout
//! - `Accepted`: an inbound stream plus its remote address
//!
//! ## ⚠️ Important Note for Next Developer
//! - Streams must preserve byte order; the Noise framing layer relies on it
//! - Implementations must be Send + Sync for use in async contexts
//! - Nothing here knows about encryption; the node crate layers it on top
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

// ============================================
// PeerStream
// ============================================

/// An ordered, bidirectional async byte stream to one peer.
///
/// Blanket-implemented for every `AsyncRead + AsyncWrite + Unpin + Send`
/// type, so `TcpStream`, `DuplexStream` and wrappers qualify as-is.
pub trait PeerStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> PeerStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Type-erased peer stream handed out by listeners and dialers.
pub type BoxedStream = Box<dyn PeerStream>;

// ============================================
// Accepted
// ============================================

/// An inbound stream returned by [`Listener::accept`].
pub struct Accepted {
    /// The accepted stream.
    pub stream: BoxedStream,
    /// Remote address of the peer.
    pub remote_addr: SocketAddr,
    /// When the stream was accepted.
    pub accepted_at: Instant,
}

impl Accepted {
    /// Wraps a freshly accepted stream.
    #[must_use]
    pub fn new(stream: BoxedStream, remote_addr: SocketAddr) -> Self {
        Self {
            stream,
            remote_addr,
            accepted_at: Instant::now(),
        }
    }

    /// Time since the stream was accepted.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.accepted_at.elapsed()
    }
}

impl fmt::Debug for Accepted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accepted")
            .field("remote_addr", &self.remote_addr)
            .field("accepted_at", &self.accepted_at)
            .finish_non_exhaustive()
    }
}

// ============================================
// Listener Trait
// ============================================

/// Source of inbound peer streams.
///
/// # Example
/// ```ignore
/// async fn accept_loop<L: Listener>(listener: &L) -> Result<()> {
///     loop {
///         let accepted = listener.accept().await?;
///         spawn_responder(accepted.stream, accepted.remote_addr);
///     }
/// }
/// ```
#[async_trait]
pub trait Listener: Send + Sync {
    /// Waits for the next inbound stream.
    ///
    /// # Errors
    /// Returns `ShuttingDown` once the listener is closed, or an
    /// accept error from the underlying socket.
    async fn accept(&self) -> Result<Accepted>;

    /// Returns the local address this listener is bound to.
    ///
    /// # Errors
    /// Returns error if the address cannot be determined.
    fn local_addr(&self) -> Result<SocketAddr>;

    /// Stops accepting new streams.
    fn close(&self);

    /// Returns `true` until [`Listener::close`] is called.
    fn is_active(&self) -> bool;
}

// ============================================
// Dialer Trait
// ============================================

/// Opens outbound peer streams.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Connects to `addr`, giving up after `timeout`.
    ///
    /// # Errors
    /// - `ConnectTimeout` if the connection is not established in time
    /// - `ConnectFailed` if the peer refuses or is unreachable
    async fn dial(&self, addr: SocketAddr, timeout: Duration) -> Result<BoxedStream>;
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_peer_stream<S: PeerStream>() {}

    #[test]
    fn test_common_streams_are_peer_streams() {
        assert_peer_stream::<tokio::net::TcpStream>();
        assert_peer_stream::<tokio::io::DuplexStream>();
        assert_peer_stream::<BoxedStream>();
    }

    #[test]
    fn test_accepted_debug_hides_stream() {
        let (a, _b) = tokio::io::duplex(64);
        let accepted = Accepted::new(Box::new(a), "127.0.0.1:9735".parse().unwrap());
        let debug = format!("{accepted:?}");
        assert!(debug.contains("127.0.0.1:9735"));
        assert!(accepted.age() < Duration::from_secs(5));
    }
}
