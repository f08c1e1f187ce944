//! Shared constants
//!
//! Reserved names and channel sizing shared by the server and client
//! registries.

/// Reserved method name carrying `(key, value)` replication instructions.
///
/// User methods must not register under this name; `AccessTable::register`
/// rejects it.
pub const SET_METHOD: &str = "__set";

/// Attribute key under which a generated tag is attached to an owning
/// host object, so clients can discover it asynchronously.
pub const TAG_ATTRIBUTE: &str = "__networkTag";

/// Length of a generated tag token.
pub const GENERATED_TAG_LEN: usize = 13;

/// Capacity of the multicast event channel (server to clients).
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the client-to-server fire channel.
pub const UPSTREAM_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the blocking call channel.
pub const CALL_CHANNEL_CAPACITY: usize = 64;

/// Capacity of each per-key change signal stream.
pub const SIGNAL_CHANNEL_CAPACITY: usize = 64;
