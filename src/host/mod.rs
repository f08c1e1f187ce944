//! Host runtime model
//!
//! A thin stand-in for the host engine this facade glues onto: execution
//! contexts (server, client, offline), peer identities, and owning objects
//! whose lifetime a registry can be bound to.

pub mod object;
pub mod runtime;

pub use object::{HostObject, TagSource};
pub use runtime::{ClientContext, NetRuntime, PeerId, ServerContext};
