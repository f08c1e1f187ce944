//! Recipient list
//!
//! Optional restriction set for the `fire_recipients`/`set_recipients`
//! push operations. Unset by default; lazily created on first add; never
//! deduplicated.

use crate::host::PeerId;

/// Optional ordered list of broadcast recipients
///
/// "Unset" and "empty" are distinct states: an unset list means no
/// restriction has been configured at all, and recipient-targeted fires
/// are skipped with a warning.
#[derive(Debug, Default)]
pub struct RecipientSet {
    peers: Option<Vec<PeerId>>,
}

impl RecipientSet {
    /// Create an unset recipient list
    pub fn new() -> Self {
        Self { peers: None }
    }

    /// Append a peer, creating the list if unset
    pub fn add(&mut self, peer: PeerId) {
        self.peers.get_or_insert_with(Vec::new).push(peer);
    }

    /// Remove the first occurrence of a peer
    ///
    /// A no-op when the peer is absent or the list is unset.
    pub fn remove(&mut self, peer: PeerId) {
        if let Some(peers) = self.peers.as_mut() {
            if let Some(pos) = peers.iter().position(|p| *p == peer) {
                peers.remove(pos);
            }
        }
    }

    /// Reset the list to unset
    pub fn clear(&mut self) {
        self.peers = None;
    }

    /// Check whether a list has been configured
    pub fn is_set(&self) -> bool {
        self.peers.is_some()
    }

    /// Get the configured peers, if set
    pub fn peers(&self) -> Option<&[PeerId]> {
        self.peers.as_deref()
    }

    /// Clone the configured peers, if set
    pub fn snapshot(&self) -> Option<Vec<PeerId>> {
        self.peers.clone()
    }
}
