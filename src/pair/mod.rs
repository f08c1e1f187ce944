//! Channel-pair provider
//!
//! A channel-pair is the sole wire-level contact point between the two
//! registries: one multicast event channel (server to clients,
//! fire-and-forget) and one blocking call channel (client to server,
//! request carries a reply slot). Pairs live in a process-wide
//! [`Namespace`] keyed by tag, created by the server side and discovered
//! by name from the client side.
//!
//! # Architecture
//!
//! ```text
//!                          Namespace
//!                 ┌──────────────────────────┐
//!                 │ pairs: HashMap<Tag,      │
//!                 │   Arc<ChannelPair> {     │
//!                 │     event_tx: broadcast, │
//!                 │     upstream_tx: mpsc,   │
//!                 │     call_tx: mpsc,       │
//!                 │   }                      │
//!                 │ >                        │
//!                 └────────────┬─────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  [ServerRegistry]      [ClientRegistry]      [ClientRegistry]
//!  drains ServerEnd      event_rx.recv()       event_rx.recv()
//! ```
//!
//! Envelopes are cheap to clone: payloads are [`Value`]s whose binary
//! variant is reference-counted.
//!
//! [`Value`]: crate::value::Value

pub mod channel;
pub mod envelope;
pub mod namespace;

pub use channel::{ChannelPair, ServerEnd};
pub use envelope::{CallRequest, ClientEvent, Delivery, EventEnvelope};
pub use namespace::Namespace;
