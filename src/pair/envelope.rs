//! Envelope types carried over a channel-pair
//!
//! Server-to-client envelopes travel on a single multicast channel; each
//! carries a delivery filter the receiving peer applies locally. The
//! client-to-server paths are point-to-point and carry the caller's
//! identity.

use tokio::sync::oneshot;

use crate::host::PeerId;
use crate::value::Value;

/// Delivery filter on a server-to-client envelope
///
/// The multicast channel reaches every subscribed peer; the filter
/// decides which of them act on the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Every connected peer
    All,
    /// Only the listed peers
    Only(Vec<PeerId>),
    /// Every connected peer except the listed ones
    Except(Vec<PeerId>),
}

impl Delivery {
    /// Check whether the filter includes the given peer
    pub fn includes(&self, peer: PeerId) -> bool {
        match self {
            Delivery::All => true,
            Delivery::Only(peers) => peers.contains(&peer),
            Delivery::Except(peers) => !peers.contains(&peer),
        }
    }
}

/// Server-to-client event
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    /// Which peers should act on this envelope
    pub delivery: Delivery,
    /// Method name (or the reserved set method)
    pub method: String,
    /// Method arguments
    pub args: Vec<Value>,
}

impl EventEnvelope {
    /// Create a new envelope
    pub fn new(delivery: Delivery, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            delivery,
            method: method.into(),
            args,
        }
    }
}

/// Client-to-server fire-and-forget event
#[derive(Debug, Clone)]
pub struct ClientEvent {
    /// Identity of the sending peer
    pub caller: PeerId,
    /// Method name
    pub method: String,
    /// Method arguments
    pub args: Vec<Value>,
}

/// Client-to-server blocking call
///
/// The reply slot yields `None` when the method is unknown to the server
/// registry; dropping it without replying surfaces on the caller as a
/// closed-channel fault.
#[derive(Debug)]
pub struct CallRequest {
    /// Identity of the calling peer
    pub caller: PeerId,
    /// Method name
    pub method: String,
    /// Method arguments
    pub args: Vec<Value>,
    /// Reply slot
    pub reply: oneshot::Sender<Option<Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(n: u64) -> PeerId {
        PeerId(n)
    }

    #[test]
    fn test_delivery_all() {
        assert!(Delivery::All.includes(peer(1)));
        assert!(Delivery::All.includes(peer(7)));
    }

    #[test]
    fn test_delivery_only() {
        let delivery = Delivery::Only(vec![peer(1), peer(2)]);
        assert!(delivery.includes(peer(1)));
        assert!(delivery.includes(peer(2)));
        assert!(!delivery.includes(peer(3)));
    }

    #[test]
    fn test_delivery_except() {
        let delivery = Delivery::Except(vec![peer(2)]);
        assert!(delivery.includes(peer(1)));
        assert!(!delivery.includes(peer(2)));
    }
}
