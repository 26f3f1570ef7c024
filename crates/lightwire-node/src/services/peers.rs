// ============================================
// File: crates/lightwire-node/src/services/peers.rs
// ============================================
//! # Peer Registry
//!
//! ## Creation Reason
//! The node needs one place to look up live connections by the peer's
//! static key, enforce the peer limit and tear everything down on
//! shutdown.
//!
//! ## Main Functionality
//! - `PeerHandle`: a registered connection plus where it came from
//! - `PeerManager`: concurrent registry keyed by `NodeId`
//!
//! ## ⚠️ Important Note for Next Developer
//! - Entries are stored in a DashMap; never hold a map guard across an
//!   `.await` (clone the connection out first)
//! - `remove_if` matches on connection id so a stale disconnect cannot
//!   evict a newer connection to the same peer
//! - Registrations are serialized by `admission`; the limit check and the
//!   insert must stay under that one lock
//!
//! ## Last Modified
//! v0.1.0 - Initial peer registry

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use lightwire_common::{ConnectionId, NodeId};
use lightwire_core::HandshakeRole;

use crate::connection::PeerConnection;
use crate::error::{NodeError, Result};

// ============================================
// PeerHandle
// ============================================

/// A registered peer connection.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    pub connection: PeerConnection,
    pub addr: SocketAddr,
    pub role: HandshakeRole,
    pub connected_at: Instant,
}

impl PeerHandle {
    #[must_use]
    pub fn new(connection: PeerConnection, addr: SocketAddr) -> Self {
        let role = connection.role();
        Self {
            connection,
            addr,
            role,
            connected_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

// ============================================
// PeerManager
// ============================================

/// Live connections keyed by remote static key.
pub struct PeerManager {
    peers: DashMap<NodeId, PeerHandle>,
    max_peers: usize,
    admission: Mutex<()>,
}

impl PeerManager {
    #[must_use]
    pub fn new(max_peers: usize) -> Self {
        Self {
            peers: DashMap::new(),
            max_peers,
            admission: Mutex::new(()),
        }
    }

    /// Registers a connected peer.
    ///
    /// A closed entry for the same key is replaced.
    ///
    /// # Errors
    /// - `PeerLimitReached` when the registry is full
    /// - `DuplicatePeer` if a live connection to `node` already exists
    pub fn register(&self, node: NodeId, handle: PeerHandle) -> Result<()> {
        let _admission = self.admission.lock();

        if self.peers.len() >= self.max_peers && !self.peers.contains_key(&node) {
            return Err(NodeError::PeerLimitReached {
                limit: self.max_peers,
            });
        }

        match self.peers.entry(node) {
            Entry::Occupied(mut entry) => {
                if entry.get().connection.is_connected() {
                    return Err(NodeError::DuplicatePeer(node));
                }
                debug!(peer = %node.short(), "Replacing closed peer entry");
                entry.insert(handle);
            }
            Entry::Vacant(entry) => {
                info!(
                    peer = %node.short(),
                    addr = %handle.addr,
                    role = %handle.role,
                    "Peer registered"
                );
                entry.insert(handle);
            }
        }
        Ok(())
    }

    pub fn remove(&self, node: &NodeId) -> Option<PeerHandle> {
        let removed = self.peers.remove(node).map(|(_, h)| h);
        if let Some(handle) = &removed {
            log_removed(node, handle);
        }
        removed
    }

    /// Removes `node` only if it still maps to `connection_id`.
    pub fn remove_if(&self, node: &NodeId, connection_id: ConnectionId) -> Option<PeerHandle> {
        let removed = self
            .peers
            .remove_if(node, |_, h| h.connection.connection_id() == connection_id)
            .map(|(_, h)| h);
        if let Some(handle) = &removed {
            log_removed(node, handle);
        }
        removed
    }

    #[must_use]
    pub fn get(&self, node: &NodeId) -> Option<PeerHandle> {
        self.peers.get(node).map(|r| r.value().clone())
    }

    #[must_use]
    pub fn contains(&self, node: &NodeId) -> bool {
        self.peers.contains_key(node)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Keys of all registered peers.
    #[must_use]
    pub fn peers(&self) -> Vec<NodeId> {
        self.peers.iter().map(|r| *r.key()).collect()
    }

    /// Sends one message to a registered peer.
    ///
    /// # Errors
    /// `PeerNotFound` if the peer is not registered; otherwise whatever
    /// `PeerConnection::send_message` returns.
    pub async fn send_to(&self, node: &NodeId, message: &[u8]) -> Result<()> {
        let connection = self
            .peers
            .get(node)
            .map(|r| r.connection.clone())
            .ok_or(NodeError::PeerNotFound(*node))?;
        connection.send_message(message).await
    }

    /// Disconnects and removes every peer.
    pub async fn disconnect_all(&self) {
        let handles: Vec<PeerHandle> = self.peers.iter().map(|r| r.value().clone()).collect();
        for handle in &handles {
            handle.connection.disconnect().await;
        }
        self.peers.clear();
        if !handles.is_empty() {
            info!("Disconnected {} peers", handles.len());
        }
    }
}

fn log_removed(node: &NodeId, handle: &PeerHandle) {
    let stats = handle.connection.stats();
    info!(
        peer = %node.short(),
        uptime_secs = handle.uptime().as_secs(),
        messages_sent = stats.messages_sent,
        messages_received = stats.messages_received,
        "Peer removed"
    );
}

impl std::fmt::Debug for PeerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerManager")
            .field("peers", &self.len())
            .field("max_peers", &self.max_peers)
            .finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::connection::{ConnectionEvent, ConnectionSettings};
    use lightwire_core::StaticKeyPair;
    use lightwire_transport::mock::memory_pipe;

    fn addr() -> SocketAddr {
        "127.0.0.1:9735".parse().unwrap()
    }

    async fn connected() -> (PeerConnection, PeerConnection, tokio::sync::mpsc::Receiver<ConnectionEvent>) {
        let (a, b) = memory_pipe();
        let init_key = Arc::new(StaticKeyPair::generate());
        let resp_key = Arc::new(StaticKeyPair::generate());
        let resp_id = resp_key.node_id();

        let (initiator, _) =
            PeerConnection::outbound(Box::new(a), init_key, resp_id, ConnectionSettings::default());
        let (responder, rx) =
            PeerConnection::inbound(Box::new(b), resp_key, ConnectionSettings::default());

        let timeout = Duration::from_secs(5);
        let (i, r) = tokio::join!(initiator.initialize(timeout), responder.initialize(timeout));
        i.unwrap();
        r.unwrap();
        (initiator, responder, rx)
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let manager = PeerManager::new(4);
        let (initiator, _responder, _rx) = connected().await;
        let remote = initiator.remote_static_public_key().unwrap();

        manager
            .register(remote, PeerHandle::new(initiator.clone(), addr()))
            .unwrap();

        assert_eq!(manager.len(), 1);
        assert!(manager.contains(&remote));
        assert_eq!(manager.peers(), vec![remote]);
        assert_eq!(manager.get(&remote).unwrap().role, HandshakeRole::Initiator);
    }

    #[tokio::test]
    async fn test_duplicate_live_peer_rejected() {
        let manager = PeerManager::new(4);
        let (initiator, _responder, _rx) = connected().await;
        let remote = initiator.remote_static_public_key().unwrap();

        manager
            .register(remote, PeerHandle::new(initiator.clone(), addr()))
            .unwrap();
        let err = manager
            .register(remote, PeerHandle::new(initiator.clone(), addr()))
            .unwrap_err();
        assert!(matches!(err, NodeError::DuplicatePeer(id) if id == remote));

        // A closed entry can be replaced.
        initiator.disconnect().await;
        manager
            .register(remote, PeerHandle::new(initiator, addr()))
            .unwrap();
    }

    #[tokio::test]
    async fn test_peer_limit() {
        let manager = PeerManager::new(1);
        let (first, _r1, _rx1) = connected().await;
        let (second, _r2, _rx2) = connected().await;

        manager
            .register(
                first.remote_static_public_key().unwrap(),
                PeerHandle::new(first, addr()),
            )
            .unwrap();
        let err = manager
            .register(
                second.remote_static_public_key().unwrap(),
                PeerHandle::new(second, addr()),
            )
            .unwrap_err();
        assert!(matches!(err, NodeError::PeerLimitReached { limit: 1 }));
    }

    #[test]
    fn test_peer_limit_under_concurrent_registration() {
        const LIMIT: usize = 2;
        let manager = PeerManager::new(LIMIT);
        let identity = Arc::new(StaticKeyPair::generate());

        let handles: Vec<(NodeId, PeerHandle)> = (0..16)
            .map(|_| {
                let (stream, _peer) = memory_pipe();
                let remote = StaticKeyPair::generate().node_id();
                let (connection, _) = PeerConnection::outbound(
                    Box::new(stream),
                    Arc::clone(&identity),
                    remote,
                    ConnectionSettings::default(),
                );
                (remote, PeerHandle::new(connection, addr()))
            })
            .collect();

        let accepted = std::thread::scope(|scope| {
            let workers: Vec<_> = handles
                .into_iter()
                .map(|(remote, handle)| {
                    let manager = &manager;
                    scope.spawn(move || manager.register(remote, handle).is_ok())
                })
                .collect();
            workers
                .into_iter()
                .map(|w| w.join())
                .filter(|r| matches!(r, Ok(true)))
                .count()
        });

        assert_eq!(accepted, LIMIT);
        assert_eq!(manager.len(), LIMIT);
    }

    #[tokio::test]
    async fn test_send_to_and_remove_if() {
        let manager = PeerManager::new(4);
        let (initiator, _responder, mut rx) = connected().await;
        let remote = initiator.remote_static_public_key().unwrap();
        let id = initiator.connection_id();

        manager
            .register(remote, PeerHandle::new(initiator, addr()))
            .unwrap();
        manager.send_to(&remote, b"hello").await.unwrap();

        match rx.recv().await.unwrap() {
            ConnectionEvent::MessageReceived(msg) => assert_eq!(msg, b"hello"),
            other => panic!("unexpected event: {other:?}"),
        }

        assert!(manager.remove_if(&remote, ConnectionId::generate()).is_none());
        assert!(manager.remove_if(&remote, id).is_some());
        assert!(matches!(
            manager.send_to(&remote, b"gone").await,
            Err(NodeError::PeerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_disconnect_all() {
        let manager = PeerManager::new(4);
        let (initiator, _responder, _rx) = connected().await;
        let remote = initiator.remote_static_public_key().unwrap();

        manager
            .register(remote, PeerHandle::new(initiator.clone(), addr()))
            .unwrap();
        manager.disconnect_all().await;

        assert!(manager.is_empty());
        assert!(!initiator.is_connected());
    }
}
