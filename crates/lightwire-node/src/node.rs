// ============================================
// File: crates/lightwire-node/src/node.rs
// ============================================
//! # Node Orchestrator
//!
//! ## Creation Reason
//! Ties the pieces together: accepts inbound streams, dials configured
//! peers, runs the handshake on each, registers the resulting
//! connections and republishes their events on one broadcast channel.
//!
//! ## Main Functionality
//! - `Node`: lifecycle (`run`, `run_with`, `shutdown`)
//! - Outbound `connect` and `send_to`
//! - `NodeEvent`: connection events tagged with the peer key
//!
//! ## Node Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Node                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐      ┌──────────────┐                     │
//! │  │ Accept Loop  │      │ Dial Tasks   │  (configured peers)  │
//! │  └──────┬───────┘      └──────┬───────┘                     │
//! │         │ responder           │ initiator                   │
//! │         ▼                     ▼                             │
//! │  ┌─────────────────────────────────────┐                    │
//! │  │   PeerConnection::initialize()      │                    │
//! │  └──────────────────┬──────────────────┘                    │
//! │                     ▼                                       │
//! │  ┌──────────────┐   ┌───────────────────────────────────┐   │
//! │  │ PeerManager  │   │ Event forwarder ─► broadcast      │   │
//! │  └──────────────┘   └───────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every connection's cancel token is a child of the node's shutdown
//!   token; `shutdown()` reaches all of them
//! - A peer is removed from the registry when its `Disconnected` event
//!   is forwarded, never earlier
//! - Handshake failures on inbound streams are logged and dropped
//!
//! ## Last Modified
//! v0.1.0 - Initial node implementation

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use lightwire_common::{ConnectionId, NodeId};
use lightwire_core::StaticKeyPair;
use lightwire_transport::{Accepted, Dialer, Listener, TcpDialer, TcpListener};

use crate::config::NodeConfig;
use crate::connection::{ConnectionEvent, ConnectionSettings, PeerConnection};
use crate::error::{NodeError, Result};
use crate::services::{PeerHandle, PeerManager};

/// Pause after a failed accept before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

// ============================================
// NodeEvent
// ============================================

/// A connection event tagged with the peer it came from.
#[derive(Debug, Clone)]
pub struct NodeEvent {
    pub peer: NodeId,
    pub event: Arc<ConnectionEvent>,
}

// ============================================
// Node
// ============================================

struct NodeInner {
    config: NodeConfig,
    identity: Arc<StaticKeyPair>,
    peers: PeerManager,
    dialer: Arc<dyn Dialer>,
    events: broadcast::Sender<NodeEvent>,
    shutdown: CancellationToken,
}

/// A Lightning-style node speaking the encrypted transport.
///
/// # Lifecycle
/// 1. Create with `Node::new(config, identity)`
/// 2. Start with `node.run().await`
/// 3. Stop via `node.shutdown()` or Ctrl+C
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl Node {
    /// Creates a node that dials over TCP.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` if the configuration fails validation.
    pub fn new(config: NodeConfig, identity: StaticKeyPair) -> Result<Self> {
        Self::with_dialer(config, identity, Arc::new(TcpDialer::new()))
    }

    /// Creates a node with a custom dialer.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` if the configuration fails validation.
    pub fn with_dialer(
        config: NodeConfig,
        identity: StaticKeyPair,
        dialer: Arc<dyn Dialer>,
    ) -> Result<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.limits.event_buffer);
        let peers = PeerManager::new(config.limits.max_peers);
        Ok(Self {
            inner: Arc::new(NodeInner {
                config,
                identity: Arc::new(identity),
                peers,
                dialer,
                events,
                shutdown: CancellationToken::new(),
            }),
        })
    }

    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.inner.identity.node_id()
    }

    #[must_use]
    pub fn config(&self) -> &NodeConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn peers(&self) -> &PeerManager {
        &self.inner.peers
    }

    /// Subscribes to events from all peers.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.inner.events.subscribe()
    }

    /// Stops the accept loop and closes every connection.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    // ========================================
    // Lifecycle
    // ========================================

    /// Binds the configured TCP address and runs until shutdown or Ctrl+C.
    ///
    /// # Errors
    /// Returns `StartupFailed` if the listener cannot be bound.
    pub async fn run(&self) -> Result<()> {
        info!("Starting lightwire node v{}", env!("CARGO_PKG_VERSION"));

        let listen_addr = self.inner.config.network.listen_addr;
        let listener = TcpListener::bind_addr(listen_addr)
            .await
            .map_err(|e| NodeError::startup_failed(format!("TCP bind failed: {e}")))?;

        let shutdown = self.inner.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = shutdown.cancelled() => {}
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => info!("Received shutdown signal"),
                        Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
                    }
                    shutdown.cancel();
                }
            }
        });

        self.run_with(Arc::new(listener)).await
    }

    /// Runs the node on an existing listener until shutdown.
    ///
    /// # Errors
    /// Currently always returns `Ok(())` once shut down.
    pub async fn run_with(&self, listener: Arc<dyn Listener>) -> Result<()> {
        info!(
            node_id = %self.node_id(),
            listen = ?listener.local_addr().ok(),
            peers = self.inner.config.peers.len(),
            "Node started"
        );

        for peer in &self.inner.config.peers {
            let node = self.clone();
            let (remote, addr) = (peer.node_id, peer.addr);
            tokio::spawn(async move {
                if let Err(e) = node.connect(remote, addr).await {
                    warn!(peer = %remote.short(), addr = %addr, error = %e, "Dial failed");
                }
            });
        }

        loop {
            tokio::select! {
                biased;
                () = self.inner.shutdown.cancelled() => {
                    debug!("Accept loop received shutdown signal");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => {
                        let node = self.clone();
                        tokio::spawn(async move { node.handle_inbound(accepted).await });
                    }
                    Err(_) if !listener.is_active() => break,
                    Err(e) => {
                        warn!("Accept failed: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }

        info!("Shutting down node...");
        self.inner.shutdown.cancel();
        listener.close();
        self.inner.peers.disconnect_all().await;
        info!("Node shutdown complete");
        Ok(())
    }

    // ========================================
    // Connections
    // ========================================

    /// Dials `addr`, authenticates it as `remote` and registers it.
    ///
    /// # Errors
    /// Dial, handshake or registry errors; the connection is closed on any
    /// of them.
    pub async fn connect(&self, remote: NodeId, addr: SocketAddr) -> Result<PeerConnection> {
        if self.inner.shutdown.is_cancelled() {
            return Err(NodeError::Cancelled);
        }

        let config = &self.inner.config;
        debug!(peer = %remote.short(), addr = %addr, "Dialing peer");
        let stream = self
            .inner
            .dialer
            .dial(addr, config.network.connect_timeout())
            .await?;

        let (connection, events) = PeerConnection::outbound(
            stream,
            Arc::clone(&self.inner.identity),
            remote,
            self.settings(),
        );
        connection
            .initialize(config.noise.handshake_timeout())
            .await?;

        self.attach(remote, addr, connection.clone(), events).await?;
        Ok(connection)
    }

    /// Sends one message to a connected peer.
    ///
    /// # Errors
    /// `PeerNotFound` or any send error.
    pub async fn send_to(&self, peer: &NodeId, message: &[u8]) -> Result<()> {
        self.inner.peers.send_to(peer, message).await
    }

    /// Closes the connection to one peer.
    ///
    /// # Errors
    /// `PeerNotFound` if the peer is not registered.
    pub async fn disconnect(&self, peer: &NodeId) -> Result<()> {
        let handle = self
            .inner
            .peers
            .get(peer)
            .ok_or(NodeError::PeerNotFound(*peer))?;
        handle.connection.disconnect().await;
        Ok(())
    }

    async fn handle_inbound(&self, accepted: Accepted) {
        let addr = accepted.remote_addr;
        debug!(addr = %addr, "Inbound connection");

        let (connection, events) = PeerConnection::inbound(
            accepted.stream,
            Arc::clone(&self.inner.identity),
            self.settings(),
        );

        let remote = match connection
            .initialize(self.inner.config.noise.handshake_timeout())
            .await
        {
            Ok(remote) => remote,
            Err(e) if e.is_suspicious() || e.is_protocol_error() => {
                warn!(addr = %addr, error = %e, "Inbound handshake rejected");
                return;
            }
            Err(e) => {
                debug!(addr = %addr, error = %e, "Inbound handshake failed");
                return;
            }
        };

        if let Err(e) = self.attach(remote, addr, connection, events).await {
            debug!(peer = %remote.short(), error = %e, "Inbound peer not registered");
        }
    }

    /// Registers a connected peer and starts forwarding its events.
    async fn attach(
        &self,
        remote: NodeId,
        addr: SocketAddr,
        connection: PeerConnection,
        events: mpsc::Receiver<ConnectionEvent>,
    ) -> Result<()> {
        let id = connection.connection_id();
        if let Err(e) = self
            .inner
            .peers
            .register(remote, PeerHandle::new(connection.clone(), addr))
        {
            connection.disconnect().await;
            return Err(e);
        }

        tokio::spawn(forward_events(Arc::clone(&self.inner), remote, id, events));
        Ok(())
    }

    fn settings(&self) -> ConnectionSettings {
        ConnectionSettings::from_config(&self.inner.config, self.inner.shutdown.clone())
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("node_id", &self.node_id())
            .field("listen_addr", &self.inner.config.network.listen_addr)
            .field("peers", &self.inner.peers.len())
            .finish()
    }
}

/// Republishes one connection's events until it disconnects.
async fn forward_events(
    inner: Arc<NodeInner>,
    peer: NodeId,
    connection_id: ConnectionId,
    mut events: mpsc::Receiver<ConnectionEvent>,
) {
    while let Some(event) = events.recv().await {
        let disconnected = matches!(event, ConnectionEvent::Disconnected { .. });
        if disconnected {
            inner.peers.remove_if(&peer, connection_id);
        }

        // No subscribers is not an error.
        let _ = inner.events.send(NodeEvent {
            peer,
            event: Arc::new(event),
        });

        if disconnected {
            break;
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PeerConfig;
    use crate::connection::DisconnectReason;
    use lightwire_transport::mock::{memory_network, MockDialer, MockListener};

    fn listen_addr() -> SocketAddr {
        "10.0.0.1:9735".parse().unwrap()
    }

    fn node(secret: u8, dialer: MockDialer, peers: Vec<PeerConfig>) -> Node {
        let identity = StaticKeyPair::from_secret_bytes(&[secret; 32]).unwrap();
        let mut config = NodeConfig::default();
        config.peers = peers;
        Node::with_dialer(config, identity, Arc::new(dialer)).unwrap()
    }

    async fn next_event(rx: &mut broadcast::Receiver<NodeEvent>) -> NodeEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event within 5s")
            .expect("broadcast open")
    }

    async fn wait_for_peer(node: &Node, peer: &NodeId) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !node.peers().contains(peer) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("peer registered within 5s");
    }

    fn spawn_run(node: &Node, listener: MockListener) -> tokio::task::JoinHandle<Result<()>> {
        let node = node.clone();
        tokio::spawn(async move { node.run_with(Arc::new(listener)).await })
    }

    #[tokio::test]
    async fn test_connect_and_exchange() {
        let (listener, dialer) = memory_network(listen_addr());
        let responder = node(0x21, dialer.clone(), Vec::new());
        let initiator = node(0x11, dialer, Vec::new());
        let mut responder_events = responder.subscribe();
        let run = spawn_run(&responder, listener);

        let conn = initiator
            .connect(responder.node_id(), listen_addr())
            .await
            .unwrap();
        assert_eq!(conn.remote_static_public_key(), Some(responder.node_id()));
        wait_for_peer(&responder, &initiator.node_id()).await;

        initiator
            .send_to(&responder.node_id(), b"hello")
            .await
            .unwrap();

        let event = next_event(&mut responder_events).await;
        assert_eq!(event.peer, initiator.node_id());
        match event.event.as_ref() {
            ConnectionEvent::MessageReceived(msg) => assert_eq!(msg, b"hello"),
            other => panic!("unexpected event: {other:?}"),
        }

        initiator.disconnect(&responder.node_id()).await.unwrap();
        let event = next_event(&mut responder_events).await;
        assert!(matches!(
            event.event.as_ref(),
            ConnectionEvent::Disconnected {
                reason: DisconnectReason::Remote
            }
        ));

        responder.shutdown();
        run.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_dials_configured_peers() {
        let (listener, dialer) = memory_network(listen_addr());
        let responder = node(0x21, dialer.clone(), Vec::new());
        let run_responder = spawn_run(&responder, listener);

        let peers = vec![PeerConfig {
            node_id: responder.node_id(),
            addr: listen_addr(),
        }];
        let initiator = node(0x11, dialer, peers);
        let (unused_listener, _) = memory_network("10.0.0.2:9735".parse().unwrap());
        let run_initiator = spawn_run(&initiator, unused_listener);

        wait_for_peer(&initiator, &responder.node_id()).await;
        wait_for_peer(&responder, &initiator.node_id()).await;

        let mut initiator_events = initiator.subscribe();
        responder.shutdown();
        run_responder.await.unwrap().unwrap();

        let event = next_event(&mut initiator_events).await;
        assert_eq!(event.peer, responder.node_id());
        assert!(matches!(
            event.event.as_ref(),
            ConnectionEvent::Disconnected { .. }
        ));

        initiator.shutdown();
        run_initiator.await.unwrap().unwrap();
        assert!(initiator.peers().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_key_not_registered() {
        let (listener, dialer) = memory_network(listen_addr());
        let responder = node(0x21, dialer.clone(), Vec::new());
        let initiator = node(0x11, dialer, Vec::new());
        let run = spawn_run(&responder, listener);

        let stranger = StaticKeyPair::generate().node_id();
        assert!(initiator.connect(stranger, listen_addr()).await.is_err());
        assert!(initiator.peers().is_empty());
        assert!(responder.peers().is_empty());

        responder.shutdown();
        run.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_connect_after_shutdown() {
        let (_listener, dialer) = memory_network(listen_addr());
        let initiator = node(0x11, dialer, Vec::new());
        initiator.shutdown();

        let remote = StaticKeyPair::generate().node_id();
        assert!(matches!(
            initiator.connect(remote, listen_addr()).await,
            Err(NodeError::Cancelled)
        ));
    }
}
