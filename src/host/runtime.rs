//! Runtime handle and execution contexts
//!
//! The runtime owns the channel-pair namespace and the set of connected
//! peers. Execution-context rules are enforced by type: a server registry
//! can only be built from a [`ServerContext`], a client registry only
//! from a [`ClientContext`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::pair::Namespace;

/// Identity of one connected client peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub(crate) u64);

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Handle to the host runtime
///
/// Owns the process-wide namespace of channel-pairs and tracks connected
/// peers. Shared via `Arc` between both sides in-process.
pub struct NetRuntime {
    namespace: Namespace,
    peers: Mutex<Vec<PeerId>>,
    next_peer_id: AtomicU64,
}

impl NetRuntime {
    /// Create a new runtime
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            namespace: Namespace::new(),
            peers: Mutex::new(Vec::new()),
            next_peer_id: AtomicU64::new(1),
        })
    }

    /// Get a server execution context
    pub fn server(self: &Arc<Self>) -> ServerContext {
        ServerContext {
            runtime: Arc::clone(self),
        }
    }

    /// Connect a new client peer, allocating its identity
    pub fn connect(self: &Arc<Self>) -> ClientContext {
        let peer = PeerId(self.next_peer_id.fetch_add(1, Ordering::Relaxed));
        self.peers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(peer);

        tracing::debug!(peer = %peer, "Peer connected");

        ClientContext {
            runtime: Some(Arc::clone(self)),
            peer,
        }
    }

    /// Remove a peer from the connected set
    pub fn disconnect(&self, peer: PeerId) {
        let mut peers = self.peers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pos) = peers.iter().position(|p| *p == peer) {
            peers.remove(pos);
            tracing::debug!(peer = %peer, "Peer disconnected");
        }
    }

    /// Get the currently connected peers
    pub fn connected_peers(&self) -> Vec<PeerId> {
        self.peers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Get the channel-pair namespace
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

/// Server execution context
///
/// Only obtainable from [`NetRuntime::server`], so server-side registries
/// cannot be constructed anywhere else.
#[derive(Clone)]
pub struct ServerContext {
    runtime: Arc<NetRuntime>,
}

impl ServerContext {
    /// Get the runtime this context belongs to
    pub fn runtime(&self) -> &Arc<NetRuntime> {
        &self.runtime
    }

    pub(crate) fn namespace(&self) -> &Namespace {
        self.runtime.namespace()
    }
}

/// Client execution context
///
/// Obtained from [`NetRuntime::connect`], or [`ClientContext::offline`]
/// for the detached simulation mode where all network operations are
/// no-ops.
#[derive(Clone)]
pub struct ClientContext {
    runtime: Option<Arc<NetRuntime>>,
    peer: PeerId,
}

impl ClientContext {
    /// Create a detached context with no runtime attached
    ///
    /// Registries built from it skip channel-pair lookup entirely and
    /// perform `fire`/`fetch` as silent no-ops.
    pub fn offline() -> Self {
        Self {
            runtime: None,
            peer: PeerId(0),
        }
    }

    /// Get this context's peer identity
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Check whether a live runtime is attached
    pub fn is_attached(&self) -> bool {
        self.runtime.is_some()
    }

    pub(crate) fn namespace(&self) -> Option<&Namespace> {
        self.runtime.as_deref().map(NetRuntime::namespace)
    }
}
