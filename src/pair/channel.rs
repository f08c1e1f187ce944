//! Channel-pair implementation
//!
//! One multicast event channel plus one blocking call channel, created
//! together and owned by exactly one server registry. Clients hold the
//! pair behind an `Arc` and only ever observe it.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::constants::{
    CALL_CHANNEL_CAPACITY, EVENT_CHANNEL_CAPACITY, UPSTREAM_CHANNEL_CAPACITY,
};
use crate::error::{Error, Result};
use crate::host::PeerId;
use crate::value::Value;

use super::envelope::{CallRequest, ClientEvent, EventEnvelope};

/// One addressable event + call channel pair
pub struct ChannelPair {
    tag: String,

    /// Server-to-client multicast fan-out
    event_tx: broadcast::Sender<EventEnvelope>,

    /// Client-to-server fire-and-forget path
    upstream_tx: mpsc::Sender<ClientEvent>,

    /// Client-to-server blocking call path
    call_tx: mpsc::Sender<CallRequest>,

    /// Set once when the owning registry tears the pair down
    closed: watch::Sender<bool>,
}

/// Receiving half held by the owning server registry
pub struct ServerEnd {
    pub(crate) upstream_rx: mpsc::Receiver<ClientEvent>,
    pub(crate) call_rx: mpsc::Receiver<CallRequest>,
}

impl ChannelPair {
    /// Create a pair and its server end
    pub(crate) fn new(tag: impl Into<String>) -> (Arc<Self>, ServerEnd) {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (upstream_tx, upstream_rx) = mpsc::channel(UPSTREAM_CHANNEL_CAPACITY);
        let (call_tx, call_rx) = mpsc::channel(CALL_CHANNEL_CAPACITY);
        let (closed, _) = watch::channel(false);

        let pair = Arc::new(Self {
            tag: tag.into(),
            event_tx,
            upstream_tx,
            call_tx,
            closed,
        });

        (pair, ServerEnd { upstream_rx, call_rx })
    }

    /// Get the pair's tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Subscribe to the multicast event channel
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.event_tx.subscribe()
    }

    /// Fan an envelope out to all subscribed peers
    ///
    /// Returns the number of receivers reached; zero when nobody is
    /// subscribed yet, which is not an error.
    pub(crate) fn send_event(&self, envelope: EventEnvelope) -> usize {
        self.event_tx.send(envelope).unwrap_or(0)
    }

    /// Send a fire-and-forget event to the server
    pub(crate) async fn fire(
        &self,
        caller: PeerId,
        method: String,
        args: Vec<Value>,
    ) -> Result<()> {
        self.upstream_tx
            .send(ClientEvent {
                caller,
                method,
                args,
            })
            .await
            .map_err(|_| Error::ChannelClosed)
    }

    /// Issue a blocking call to the server and wait for its reply
    ///
    /// Suspends the calling task until the server replies. A dropped
    /// reply slot (server destroyed mid-call) surfaces as
    /// [`Error::ChannelClosed`].
    pub(crate) async fn call(
        &self,
        caller: PeerId,
        method: String,
        args: Vec<Value>,
    ) -> Result<Option<Value>> {
        let (reply, reply_rx) = oneshot::channel();

        self.call_tx
            .send(CallRequest {
                caller,
                method,
                args,
                reply,
            })
            .await
            .map_err(|_| Error::ChannelClosed)?;

        reply_rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Mark the pair as closed, waking client teardown hooks
    pub(crate) fn close(&self) {
        self.closed.send_replace(true);
    }

    /// Check whether the pair has been closed
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Get a watch receiver on the closed flag
    pub(crate) fn closed_watch(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }
}

impl std::fmt::Debug for ChannelPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelPair")
            .field("tag", &self.tag)
            .field("closed", &self.is_closed())
            .finish()
    }
}
