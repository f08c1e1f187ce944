//! Client/server remote method dispatch and state replication
//!
//! A thin facade over a pair of host channels: one multicast
//! fire-and-forget event channel and one blocking call channel, created
//! together per feature and addressable by tag in a process-wide
//! namespace. The server side registers named method handlers and pushes
//! events or replicated values; the client side dispatches into a local
//! module and exposes per-key change signals.
//!
//! # Architecture
//!
//! ```text
//!   [ServerRegistry]                           [ClientRegistry]
//!   access table ──┐                         ┌── ClientModule
//!   recipients     │                         │   change signals
//!   fire*/set*     │                         │   fire / fetch
//!                  ▼                         ▼
//!             ChannelPair ◄── Namespace ──► ChannelPair (same Arc)
//!             event: broadcast  (by tag)    event_rx.recv()
//!             call:  mpsc+oneshot           call with reply slot
//! ```
//!
//! Delivery, ordering, and fan-out are delegated to the channel
//! primitives. This layer is glue: tag bookkeeping, method lookup, and
//! value mirroring.
//!
//! # Example
//!
//! ```no_run
//! use remotes_rs::{NetRuntime, ServerRegistry, Value};
//!
//! struct Scoreboard {
//!     leader: String,
//! }
//!
//! # fn example() -> remotes_rs::Result<()> {
//! let runtime = NetRuntime::new();
//! let registry = ServerRegistry::new(
//!     &runtime.server(),
//!     "scoreboard",
//!     Scoreboard { leader: String::new() },
//! )?;
//!
//! registry.set_all("leader", Value::from("ayla"))?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod constants;
pub mod error;
pub mod host;
pub mod pair;
pub mod server;
pub mod value;

pub use client::{ChangeSignals, ClientModule, ClientRegistry};
pub use error::{Error, Result};
pub use host::{ClientContext, HostObject, NetRuntime, PeerId, ServerContext, TagSource};
pub use pair::{ChannelPair, Delivery, Namespace};
pub use server::{AccessTable, RecipientSet, ServerRegistry, Target};
pub use value::Value;
