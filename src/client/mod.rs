//! Client-side registry
//!
//! The client registry locates a server-created channel-pair by tag,
//! dispatches server-sent methods into a local module, applies
//! server-authoritative value replication, and exposes per-key change
//! signals.

pub mod registry;
pub mod signal;

pub use registry::{ClientModule, ClientRegistry};
pub use signal::ChangeSignals;
