// ============================================
// File: crates/lightwire-node/src/connection.rs
// ============================================
//! # Peer Connection
//!
//! ## Creation Reason
//! Owns one peer byte stream: drives the three-act Noise handshake over
//! it, then runs the encrypted framing in both directions and reports
//! what happens to its owner over a channel.
//!
//! ## Main Functionality
//! - `PeerConnection`: handshake, `send_message`, `disconnect`
//! - `ConnectionEvent`: message / exception / disconnect notifications
//! - `ConnectionSettings`: timeouts, rotation, size limit, cancellation
//! - `ConnectionStats`: traffic counters snapshot
//!
//! ## Connection Lifecycle
//! ```text
//!   New ──initialize()──► Handshaking ──acts ok──► Connected
//!    │                        │                        │
//!    └────────────────────────┴──── any failure ───────┴──► Closed
//! ```
//!
//! ## Task Model
//! ```text
//! ┌──────────────┐  send_message()   ┌──────────────────────────┐
//! │  producers   │ ────────────────► │ Mutex<encoder+write half>│ ──► wire
//! └──────────────┘                   └──────────────────────────┘
//!
//! wire ──► read loop task (decoder + read half) ──► mpsc<ConnectionEvent>
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The write lock spans encrypt AND write: nonce order must equal byte order
//! - Handshake failures are returned from `initialize`; only the read loop
//!   raises `ExceptionRaised`, since nobody else is waiting on it
//! - A fatal read error closes the connection and drops the keys before
//!   `ExceptionRaised` is queued; never deliver it from inside the loop
//! - Every exit path goes through `teardown`, which drops the cipher
//!   states (zeroized on drop) and emits exactly one `Disconnected`
//! - The event receiver never yields `None` while a handle is alive; stop
//!   reading at `Disconnected`
//!
//! ## Last Modified
//! v0.1.0 - Initial peer connection implementation

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use lightwire_common::time::AtomicInstant;
use lightwire_common::{ConnectionId, NodeId};
use lightwire_core::noise::{ACT_ONE_SIZE, ACT_THREE_SIZE, ACT_TWO_SIZE};
use lightwire_core::{
    FrameDecoder, FrameEncoder, HandshakeRole, KeyRotation, NoiseHandshake, StaticKeyPair,
    LENGTH_HEADER_SIZE, MAX_MESSAGE_SIZE,
};
use lightwire_transport::BoxedStream;

use crate::config::NodeConfig;
use crate::error::{FaultKind, NodeError, Result};

// ============================================
// Constants
// ============================================

/// Upper bound on flushing and closing the write half during teardown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

// ============================================
// Public Types
// ============================================

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, handshake not started.
    New,
    /// Handshake acts in flight.
    Handshaking,
    /// Transport established.
    Connected,
    /// Torn down; terminal.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "new",
            Self::Handshaking => "handshaking",
            Self::Connected => "connected",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// `disconnect()` was called.
    Local,
    /// The peer closed the stream cleanly.
    Remote,
    /// The cancellation token fired.
    Cancelled,
    /// A fatal error.
    Fault(FaultKind),
}

impl DisconnectReason {
    fn from_error(err: &NodeError) -> Self {
        match err.fault_kind() {
            FaultKind::Cancelled => Self::Cancelled,
            FaultKind::PeerDisconnected => Self::Remote,
            kind => Self::Fault(kind),
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("closed locally"),
            Self::Remote => f.write_str("closed by peer"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Fault(kind) => write!(f, "{kind}"),
        }
    }
}

/// Notification delivered to the connection's owner.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// A decrypted application message.
    MessageReceived(Vec<u8>),
    /// A fatal error on the read path; a `Disconnected` follows.
    ExceptionRaised(NodeError),
    /// The connection is closed. Always the last event.
    Disconnected {
        /// Why it closed.
        reason: DisconnectReason,
    },
}

/// Per-connection knobs.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Deadline for the whole handshake when driven by the node runtime.
    pub handshake_timeout: Duration,
    /// Deadline for a frame body after its header; `None` waits forever.
    pub frame_timeout: Option<Duration>,
    /// Transport key rotation policy.
    pub key_rotation: KeyRotation,
    /// Largest plaintext accepted in either direction.
    pub max_message_size: usize,
    /// Capacity of the event channel.
    pub event_buffer: usize,
    /// Parent cancellation signal.
    pub cancel: CancellationToken,
}

impl ConnectionSettings {
    /// Derives settings from the node configuration.
    #[must_use]
    pub fn from_config(config: &NodeConfig, cancel: CancellationToken) -> Self {
        Self {
            handshake_timeout: config.noise.handshake_timeout(),
            frame_timeout: config.noise.frame_timeout(),
            key_rotation: config.noise.rotation(),
            max_message_size: config.noise.max_message_size,
            event_buffer: config.limits.event_buffer,
            cancel,
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(30),
            frame_timeout: Some(Duration::from_secs(60)),
            key_rotation: KeyRotation::Bolt8,
            max_message_size: MAX_MESSAGE_SIZE,
            event_buffer: 256,
            cancel: CancellationToken::new(),
        }
    }
}

/// Traffic counters at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Ciphertext bytes written.
    pub bytes_sent: u64,
    /// Ciphertext bytes read.
    pub bytes_received: u64,
    /// Frames written.
    pub messages_sent: u64,
    /// Frames read.
    pub messages_received: u64,
    /// Time since the last frame in either direction.
    pub idle: Duration,
}

// ============================================
// Internal State
// ============================================

#[derive(Debug, Default)]
struct Counters {
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    last_activity: AtomicInstant,
}

impl Counters {
    fn record_sent(&self, bytes: usize) {
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.last_activity.touch();
    }

    fn record_received(&self, bytes: usize) {
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.last_activity.touch();
    }
}

struct Writer {
    encoder: FrameEncoder,
    half: WriteHalf<BoxedStream>,
}

struct Shared {
    id: ConnectionId,
    role: HandshakeRole,
    local_static: Arc<StaticKeyPair>,
    /// Known up front for outbound connections only.
    expected_remote: Option<NodeId>,
    settings: ConnectionSettings,
    cancel: CancellationToken,
    state: Mutex<ConnectionState>,
    remote_static: Mutex<Option<NodeId>>,
    /// Present until `initialize` takes it.
    stream: Mutex<Option<BoxedStream>>,
    writer: tokio::sync::Mutex<Option<Writer>>,
    events: mpsc::Sender<ConnectionEvent>,
    counters: Counters,
}

// ============================================
// PeerConnection
// ============================================

/// An encrypted connection to one peer.
///
/// Cheap to clone; clones share the same connection.
///
/// # Example
/// ```ignore
/// let (conn, mut events) = PeerConnection::outbound(stream, identity, peer_id, settings);
/// let remote = conn.initialize(Duration::from_secs(30)).await?;
/// conn.send_message(b"init").await?;
/// while let Some(event) = events.recv().await {
///     if let ConnectionEvent::Disconnected { .. } = event { break; }
/// }
/// ```
#[derive(Clone)]
pub struct PeerConnection {
    shared: Arc<Shared>,
}

impl PeerConnection {
    /// Wraps a dialed stream; the handshake will run as initiator.
    #[must_use]
    pub fn outbound(
        stream: BoxedStream,
        local_static: Arc<StaticKeyPair>,
        remote_static: NodeId,
        settings: ConnectionSettings,
    ) -> (Self, mpsc::Receiver<ConnectionEvent>) {
        Self::new(
            stream,
            HandshakeRole::Initiator,
            local_static,
            Some(remote_static),
            settings,
        )
    }

    /// Wraps an accepted stream; the handshake will run as responder.
    #[must_use]
    pub fn inbound(
        stream: BoxedStream,
        local_static: Arc<StaticKeyPair>,
        settings: ConnectionSettings,
    ) -> (Self, mpsc::Receiver<ConnectionEvent>) {
        Self::new(stream, HandshakeRole::Responder, local_static, None, settings)
    }

    fn new(
        stream: BoxedStream,
        role: HandshakeRole,
        local_static: Arc<StaticKeyPair>,
        expected_remote: Option<NodeId>,
        settings: ConnectionSettings,
    ) -> (Self, mpsc::Receiver<ConnectionEvent>) {
        let (events, rx) = mpsc::channel(settings.event_buffer.max(1));
        let shared = Shared {
            id: ConnectionId::generate(),
            role,
            local_static,
            expected_remote,
            cancel: settings.cancel.child_token(),
            settings,
            state: Mutex::new(ConnectionState::New),
            remote_static: Mutex::new(None),
            stream: Mutex::new(Some(stream)),
            writer: tokio::sync::Mutex::new(None),
            events,
            counters: Counters::default(),
        };
        (
            Self {
                shared: Arc::new(shared),
            },
            rx,
        )
    }

    // ========================================
    // Accessors
    // ========================================

    /// Random identifier used in logs.
    #[must_use]
    pub fn connection_id(&self) -> ConnectionId {
        self.shared.id
    }

    /// Whether this side dialed (initiator) or accepted (responder).
    #[must_use]
    pub fn role(&self) -> HandshakeRole {
        self.shared.role
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }

    /// Returns `true` while the transport is established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// The peer's static key, once the handshake has completed.
    #[must_use]
    pub fn remote_static_public_key(&self) -> Option<NodeId> {
        *self.shared.remote_static.lock()
    }

    /// Snapshot of the traffic counters.
    #[must_use]
    pub fn stats(&self) -> ConnectionStats {
        let c = &self.shared.counters;
        ConnectionStats {
            bytes_sent: c.bytes_sent.load(Ordering::Relaxed),
            bytes_received: c.bytes_received.load(Ordering::Relaxed),
            messages_sent: c.messages_sent.load(Ordering::Relaxed),
            messages_received: c.messages_received.load(Ordering::Relaxed),
            idle: c.last_activity.elapsed(),
        }
    }

    // ========================================
    // Handshake
    // ========================================

    /// Runs the handshake and starts the read loop.
    ///
    /// Returns the peer's static key. On failure the connection is closed
    /// and a `Disconnected` event is emitted.
    ///
    /// # Errors
    /// - `HandshakeTimeout` if the acts do not complete within `timeout`
    /// - `Core` with `HandshakeFailure` / `AuthenticationFailure` kinds
    /// - `PeerDisconnected` if the stream closes mid-handshake
    /// - `Cancelled` if the cancellation token fires
    /// - `AlreadyInitialized` on a second call
    pub async fn initialize(&self, timeout: Duration) -> Result<NodeId> {
        let shared = &self.shared;

        {
            let mut state = shared.state.lock();
            if *state != ConnectionState::New {
                return Err(NodeError::AlreadyInitialized);
            }
            *state = ConnectionState::Handshaking;
        }

        let Some(mut stream) = shared.stream.lock().take() else {
            return Err(NodeError::AlreadyInitialized);
        };

        debug!(
            connection_id = %shared.id,
            role = %shared.role,
            "Starting handshake"
        );

        let outcome = tokio::select! {
            biased;
            () = shared.cancel.cancelled() => Err(NodeError::Cancelled),
            result = tokio::time::timeout(timeout, shared.handshake(&mut stream)) => {
                result.unwrap_or_else(|_| Err(NodeError::HandshakeTimeout { timeout }))
            }
        };

        let (encoder, decoder, remote) = match outcome {
            Ok(parts) => parts,
            Err(err) => {
                if err.is_suspicious() || err.is_protocol_error() {
                    warn!(connection_id = %shared.id, error = %err, "Handshake failed");
                } else {
                    debug!(connection_id = %shared.id, error = %err, "Handshake failed");
                }
                drop(stream);
                shared.teardown(DisconnectReason::from_error(&err)).await;
                return Err(err);
            }
        };

        let (read_half, write_half) = tokio::io::split(stream);
        *shared.writer.lock().await = Some(Writer {
            encoder,
            half: write_half,
        });
        *shared.remote_static.lock() = Some(remote);

        let promoted = {
            let mut state = shared.state.lock();
            if *state == ConnectionState::Handshaking {
                *state = ConnectionState::Connected;
                true
            } else {
                false
            }
        };
        if !promoted {
            // Closed while the last act was in flight.
            shared.writer.lock().await.take();
            return Err(NodeError::Cancelled);
        }

        shared.counters.last_activity.touch();
        info!(
            connection_id = %shared.id,
            peer = %remote,
            role = %shared.role,
            "Peer connected"
        );

        tokio::spawn(read_loop(Arc::clone(shared), read_half, decoder));
        Ok(remote)
    }

    // ========================================
    // Sending
    // ========================================

    /// Encrypts and writes one message.
    ///
    /// Concurrent callers are serialized; each message goes out as one
    /// whole frame.
    ///
    /// # Errors
    /// - `MessageTooLarge` above the configured limit (connection stays up)
    /// - `NotConnected` before the handshake or after close
    /// - `Core` with `KeyExhausted` kind once the send nonces run out
    /// - `PeerDisconnected` / `Io` / `Cancelled` if the write fails
    pub async fn send_message(&self, message: &[u8]) -> Result<()> {
        let shared = &self.shared;
        let max = shared.settings.max_message_size.min(MAX_MESSAGE_SIZE);
        if message.len() > max {
            return Err(NodeError::MessageTooLarge {
                size: message.len(),
                max,
            });
        }

        let result = {
            let mut guard = shared.writer.lock().await;
            let writer = guard.as_mut().ok_or(NodeError::NotConnected)?;
            shared.write_frame(writer, message).await
        };

        if let Err(err) = &result {
            if err.is_fatal() {
                debug!(connection_id = %shared.id, error = %err, "Send failed");
                shared.teardown(DisconnectReason::from_error(err)).await;
            }
        }
        result
    }

    /// Closes the connection and emits `Disconnected { reason: Local }`.
    ///
    /// Idempotent.
    pub async fn disconnect(&self) {
        self.shared.teardown(DisconnectReason::Local).await;
    }

    /// Moves the send nonce, for exercising the exhaustion boundary.
    #[cfg(test)]
    pub(crate) async fn force_send_nonce(&self, nonce: u64) {
        if let Some(writer) = self.shared.writer.lock().await.as_mut() {
            writer.encoder.force_nonce(nonce);
        }
    }
}

impl fmt::Debug for PeerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerConnection")
            .field("id", &self.shared.id)
            .field("role", &self.shared.role)
            .field("state", &self.state())
            .field("remote", &self.remote_static_public_key())
            .finish()
    }
}

// ============================================
// Shared internals
// ============================================

impl Shared {
    async fn handshake(
        &self,
        stream: &mut BoxedStream,
    ) -> Result<(FrameEncoder, FrameDecoder, NodeId)> {
        let mut handshake = match &self.expected_remote {
            Some(remote) => NoiseHandshake::initiator(Arc::clone(&self.local_static), remote)?,
            None => NoiseHandshake::responder(Arc::clone(&self.local_static)),
        };

        match self.role {
            HandshakeRole::Initiator => {
                let act_one = handshake.get_act_one()?;
                write_act(stream, &act_one).await?;
                trace!(connection_id = %self.id, "Sent act one");

                let mut act_two = [0u8; ACT_TWO_SIZE];
                read_act(stream, &mut act_two).await?;
                let act_three = handshake.process_act_two(&act_two)?;
                trace!(connection_id = %self.id, "Processed act two");

                write_act(stream, &act_three).await?;
                trace!(connection_id = %self.id, "Sent act three");
            }
            HandshakeRole::Responder => {
                let mut act_one = [0u8; ACT_ONE_SIZE];
                read_act(stream, &mut act_one).await?;
                let act_two = handshake.process_act_one(&act_one)?;
                trace!(connection_id = %self.id, "Processed act one");

                write_act(stream, &act_two).await?;
                trace!(connection_id = %self.id, "Sent act two");

                let mut act_three = [0u8; ACT_THREE_SIZE];
                read_act(stream, &mut act_three).await?;
                handshake.process_act_three(&act_three)?;
                trace!(connection_id = %self.id, "Processed act three");
            }
        }

        let transport = handshake
            .into_transport(self.settings.key_rotation)?
            .with_max_message_size(self.settings.max_message_size);
        Ok(transport.split())
    }

    async fn write_frame(&self, writer: &mut Writer, message: &[u8]) -> Result<()> {
        let frame = writer.encoder.encode(message)?;

        let write = async {
            writer.half.write_all(&frame).await?;
            writer.half.flush().await
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(NodeError::Cancelled),
            result = write => result.map_err(|e| NodeError::from_stream(e, "write"))?,
        }

        self.counters.record_sent(frame.len());
        trace!(
            connection_id = %self.id,
            len = message.len(),
            nonce = writer.encoder.nonce(),
            "Frame sent"
        );
        Ok(())
    }

    /// Delivers an event unless the connection is being cancelled.
    async fn deliver(&self, event: ConnectionEvent) {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {}
            // A dropped receiver just means nobody is listening.
            _ = self.events.send(event) => {}
        }
    }

    /// Closes everything exactly once.
    async fn teardown(&self, reason: DisconnectReason) {
        self.teardown_with(reason, None).await;
    }

    /// Closes the connection, then reports `exception` (if any) followed
    /// by `Disconnected`.
    ///
    /// State, cancellation and key material are settled before the first
    /// event is queued.
    async fn teardown_with(&self, reason: DisconnectReason, exception: Option<NodeError>) {
        let previous = std::mem::replace(&mut *self.state.lock(), ConnectionState::Closed);
        if previous == ConnectionState::Closed {
            return;
        }

        self.cancel.cancel();
        drop(self.stream.lock().take());

        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            let _ = tokio::time::timeout(SHUTDOWN_GRACE, writer.half.shutdown()).await;
        }

        match reason {
            DisconnectReason::Fault(_) => info!(
                connection_id = %self.id,
                reason = %reason,
                "Connection closed"
            ),
            _ => debug!(
                connection_id = %self.id,
                reason = %reason,
                "Connection closed"
            ),
        }

        let mut events = Vec::with_capacity(2);
        events.extend(exception.map(ConnectionEvent::ExceptionRaised));
        events.push(ConnectionEvent::Disconnected { reason });
        self.emit_final(events);
    }

    /// Queues the closing events in order without blocking.
    ///
    /// Whatever does not fit in the channel is handed, still in order, to
    /// a task that waits for the owner to drain it.
    fn emit_final(&self, events: Vec<ConnectionEvent>) {
        let mut events = events.into_iter();
        while let Some(event) = events.next() {
            match self.events.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Closed(_)) => return,
                Err(TrySendError::Full(event)) => {
                    let sender = self.events.clone();
                    let rest: Vec<ConnectionEvent> =
                        std::iter::once(event).chain(events).collect();
                    tokio::spawn(async move {
                        for event in rest {
                            if sender.send(event).await.is_err() {
                                break;
                            }
                        }
                    });
                    return;
                }
            }
        }
    }
}

// ============================================
// Read Loop
// ============================================

async fn read_loop(
    shared: Arc<Shared>,
    mut reader: ReadHalf<BoxedStream>,
    mut decoder: FrameDecoder,
) {
    let (reason, exception) = loop {
        let next = tokio::select! {
            biased;
            () = shared.cancel.cancelled() => break (DisconnectReason::Cancelled, None),
            next = read_frame(&shared, &mut reader, &mut decoder) => next,
        };

        match next {
            Ok(Some(message)) => {
                trace!(
                    connection_id = %shared.id,
                    len = message.len(),
                    "Frame received"
                );
                shared
                    .deliver(ConnectionEvent::MessageReceived(message))
                    .await;
            }
            Ok(None) => break (DisconnectReason::Remote, None),
            Err(err) => {
                let reason = DisconnectReason::from_error(&err);
                if err.is_suspicious() || err.is_protocol_error() {
                    warn!(connection_id = %shared.id, error = %err, "Read failed");
                } else {
                    debug!(connection_id = %shared.id, error = %err, "Read failed");
                }
                let exception = (reason != DisconnectReason::Remote).then_some(err);
                break (reason, exception);
            }
        }
    };

    drop(decoder);
    drop(reader);
    shared.teardown_with(reason, exception).await;
}

/// Reads one frame; `None` on a clean close between frames.
async fn read_frame<R: AsyncRead + Unpin>(
    shared: &Shared,
    reader: &mut R,
    decoder: &mut FrameDecoder,
) -> Result<Option<Vec<u8>>> {
    let mut header = [0u8; LENGTH_HEADER_SIZE];
    if !read_header(reader, &mut header).await? {
        return Ok(None);
    }

    let len = decoder.decrypt_length(&header)?;
    let mut body = vec![0u8; FrameDecoder::body_size(len)];

    let read_body = reader.read_exact(&mut body);
    let read = match shared.settings.frame_timeout {
        Some(timeout) => tokio::time::timeout(timeout, read_body)
            .await
            .map_err(|_| NodeError::ReadTimeout { timeout })?,
        None => read_body.await,
    };
    read.map_err(|e| NodeError::from_stream(e, "frame body"))?;

    let message = decoder.decrypt_body(&body)?;
    shared.counters.record_received(LENGTH_HEADER_SIZE + body.len());
    Ok(Some(message))
}

/// Fills `header`, or returns `false` if the stream ends before any byte.
async fn read_header<R: AsyncRead + Unpin>(reader: &mut R, header: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < header.len() {
        let n = reader
            .read(&mut header[filled..])
            .await
            .map_err(|e| NodeError::from_stream(e, "frame header"))?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(NodeError::PeerDisconnected {
                during: "frame header",
            });
        }
        filled += n;
    }
    Ok(true)
}

async fn read_act<R: AsyncRead + Unpin>(stream: &mut R, act: &mut [u8]) -> Result<()> {
    stream
        .read_exact(act)
        .await
        .map_err(|e| NodeError::from_stream(e, "handshake"))?;
    Ok(())
}

async fn write_act<W: AsyncWrite + Unpin>(stream: &mut W, act: &[u8]) -> Result<()> {
    stream
        .write_all(act)
        .await
        .map_err(|e| NodeError::from_stream(e, "handshake"))?;
    stream
        .flush()
        .await
        .map_err(|e| NodeError::from_stream(e, "handshake"))
}

// ============================================
// Tests
// ============================================
