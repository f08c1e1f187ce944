//! Error types
//!
//! One crate-level error enum covering configuration errors (fatal at the
//! call site) and channel faults surfaced from the underlying primitives.

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for registry and channel-pair operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A channel-pair with this tag already exists in the namespace
    TagTaken(String),
    /// The owning object already carries a network tag
    AlreadyTagged(String),
    /// A handler is already registered under this method name
    DuplicateMethod(String),
    /// The method name is reserved for value replication
    ReservedMethod(String),
    /// The method is not known to the receiving module
    UnknownMethod(String),
    /// The registry has been destroyed
    Destroyed,
    /// The other side of the channel-pair went away
    ChannelClosed,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::TagTaken(tag) => write!(f, "Tag already in use: {}", tag),
            Error::AlreadyTagged(tag) => {
                write!(f, "Object already carries a network tag: {}", tag)
            }
            Error::DuplicateMethod(name) => {
                write!(f, "Method already registered: {}", name)
            }
            Error::ReservedMethod(name) => {
                write!(f, "Method name is reserved: {}", name)
            }
            Error::UnknownMethod(name) => write!(f, "Unknown method: {}", name),
            Error::Destroyed => write!(f, "Registry has been destroyed"),
            Error::ChannelClosed => write!(f, "Channel-pair is closed"),
        }
    }
}

impl std::error::Error for Error {}
