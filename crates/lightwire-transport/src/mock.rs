// ============================================
// File: crates/lightwire-transport/src/mock.rs
// ============================================
//! # In-Memory Transport for Tests
//!
//! ## Creation Reason
//! Lets connection and node tests run complete handshakes without
//! sockets, and lets them corrupt bytes in transit on purpose.
//!
//! ## Main Functionality
//! - `memory_pipe`: a connected pair of in-memory streams
//! - `TamperStream`: flips chosen bytes of the inbound byte stream
//! - `memory_network`: a `MockListener` / `MockDialer` pair
//!
//! ## Usage in Tests
//! ```
//! use lightwire_transport::mock::{memory_pipe, TamperStream};
//!
//! let (a, b) = memory_pipe();
//! // Flip the 50th byte b receives (offset 49).
//! let (b, handle) = TamperStream::new(b);
//! handle.corrupt_at(49, 0x01);
//! # drop((a, b));
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This is for testing only - do not use in production
//! - Offsets count bytes read through the wrapper, from zero
//!
//! ## Last Modified
//! v0.1.0 - Initial mock implementation

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use tokio::sync::mpsc;

use crate::error::{Result, TransportError};
use crate::traits::{Accepted, BoxedStream, Dialer, Listener};

// ============================================
// Constants
// ============================================

/// Buffer size of each direction of an in-memory pipe.
pub const PIPE_BUFFER_SIZE: usize = 256 * 1024;

/// Maximum number of dialed streams waiting for `accept()`.
const MAX_PENDING: usize = 64;

// ============================================
// memory_pipe
// ============================================

/// Returns two connected in-memory streams.
#[must_use]
pub fn memory_pipe() -> (DuplexStream, DuplexStream) {
    tokio::io::duplex(PIPE_BUFFER_SIZE)
}

// ============================================
// TamperStream
// ============================================

#[derive(Debug, Default)]
struct TamperPlan {
    /// (stream offset, xor mask) pairs still to apply
    pending: Vec<(u64, u8)>,
    /// Number of bytes already modified
    applied: usize,
}

/// Handle for scheduling corruption on a [`TamperStream`].
#[derive(Debug, Clone, Default)]
pub struct TamperHandle {
    plan: Arc<Mutex<TamperPlan>>,
}

impl TamperHandle {
    /// XORs the byte at `offset` of the inbound stream with `mask`.
    pub fn corrupt_at(&self, offset: u64, mask: u8) {
        self.plan.lock().pending.push((offset, mask));
    }

    /// Number of scheduled corruptions that have been applied.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.plan.lock().applied
    }
}

/// Stream wrapper that corrupts selected inbound bytes.
///
/// Writes pass through untouched.
#[derive(Debug)]
pub struct TamperStream<S> {
    inner: S,
    position: u64,
    plan: Arc<Mutex<TamperPlan>>,
}

impl<S> TamperStream<S> {
    /// Wraps `inner`, returning the stream and its control handle.
    pub fn new(inner: S) -> (Self, TamperHandle) {
        let handle = TamperHandle::default();
        let stream = Self {
            inner,
            position: 0,
            plan: Arc::clone(&handle.plan),
        };
        (stream, handle)
    }

    /// Bytes read through the wrapper so far.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.position
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TamperStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();

        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let fresh = &mut buf.filled_mut()[before..];
                let start = this.position;
                let end = start + fresh.len() as u64;

                let mut plan = this.plan.lock();
                let mut hits = 0;
                plan.pending.retain(|&(offset, mask)| {
                    if (start..end).contains(&offset) {
                        #[allow(clippy::cast_possible_truncation)]
                        let idx = (offset - start) as usize;
                        fresh[idx] ^= mask;
                        hits += 1;
                        false
                    } else {
                        true
                    }
                });
                plan.applied += hits;

                this.position = end;
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TamperStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

// ============================================
// MockListener / MockDialer
// ============================================

/// Listener fed by a paired [`MockDialer`].
pub struct MockListener {
    incoming: tokio::sync::Mutex<mpsc::Receiver<Accepted>>,
    local_addr: SocketAddr,
    shutdown: AtomicBool,
}

/// Dialer that connects to a paired [`MockListener`] over in-memory pipes.
#[derive(Clone)]
pub struct MockDialer {
    outgoing: mpsc::Sender<Accepted>,
    listener_addr: SocketAddr,
    next_port: Arc<AtomicU16>,
}

/// Creates a connected listener/dialer pair.
///
/// Every `dial` produces a fresh pipe whose far end is returned by the
/// listener's next `accept`. The dialed address is ignored beyond being
/// compared against the listener address.
#[must_use]
pub fn memory_network(listener_addr: SocketAddr) -> (MockListener, MockDialer) {
    let (tx, rx) = mpsc::channel(MAX_PENDING);
    let listener = MockListener {
        incoming: tokio::sync::Mutex::new(rx),
        local_addr: listener_addr,
        shutdown: AtomicBool::new(false),
    };
    let dialer = MockDialer {
        outgoing: tx,
        listener_addr,
        next_port: Arc::new(AtomicU16::new(40_000)),
    };
    (listener, dialer)
}

#[async_trait]
impl Listener for MockListener {
    async fn accept(&self) -> Result<Accepted> {
        if !self.is_active() {
            return Err(TransportError::ShuttingDown);
        }
        self.incoming
            .lock()
            .await
            .recv()
            .await
            .ok_or(TransportError::ShuttingDown)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.local_addr)
    }

    fn close(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    fn is_active(&self) -> bool {
        !self.shutdown.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Dialer for MockDialer {
    async fn dial(&self, addr: SocketAddr, timeout: Duration) -> Result<BoxedStream> {
        if addr != self.listener_addr {
            return Err(TransportError::connect_failed(addr, "no mock listener at address"));
        }

        let (local, remote) = memory_pipe();
        let port = self.next_port.fetch_add(1, Ordering::Relaxed);
        let from = SocketAddr::from((Ipv4Addr::LOCALHOST, port));

        tokio::time::timeout(timeout, self.outgoing.send(Accepted::new(Box::new(remote), from)))
            .await
            .map_err(|_| TransportError::ConnectTimeout { addr, timeout })?
            .map_err(|_| TransportError::connect_failed(addr, "mock listener dropped"))?;

        Ok(Box::new(local))
    }
}

// ============================================
// Tests
// ============================================
