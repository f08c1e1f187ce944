//! Server-side registry
//!
//! The server registry owns a channel-pair, dispatches named methods from
//! peers to registered handlers, and provides the push primitives used
//! for events and server-authoritative value replication.

pub mod access;
pub mod recipients;
pub mod registry;

pub use access::AccessTable;
pub use recipients::RecipientSet;
pub use registry::{ServerRegistry, Target};
