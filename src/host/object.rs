//! Owning host objects
//!
//! A registry's lifetime can be bound to an external entity. The object
//! carries discoverable string attributes (how a generated tag is
//! published to clients) and a destruction notification the server
//! registry hooks for automatic teardown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

/// External entity a registry's lifetime can be bound to
///
/// Attributes are plain string metadata. Waiters observe attribute
/// changes through a watch channel rather than polling.
pub struct HostObject {
    name: String,
    attributes: Mutex<HashMap<String, String>>,
    changed: watch::Sender<u64>,
    destroyed: watch::Sender<bool>,
}

impl HostObject {
    /// Create a new host object with the given name
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let (changed, _) = watch::channel(0);
        let (destroyed, _) = watch::channel(false);

        Arc::new(Self {
            name: name.into(),
            attributes: Mutex::new(HashMap::new()),
            changed,
            destroyed,
        })
    }

    /// Get the object's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get an attribute value, if present
    pub fn attribute(&self, key: &str) -> Option<String> {
        self.attributes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Set an attribute and wake any waiters
    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), value.into());
        self.changed.send_modify(|v| *v += 1);
    }

    /// Remove an attribute and wake any waiters
    pub fn remove_attribute(&self, key: &str) {
        self.attributes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        self.changed.send_modify(|v| *v += 1);
    }

    /// Wait until an attribute exists, returning its value
    ///
    /// Suspends the calling task, not the runtime. The subscription is
    /// taken before the first check so a concurrent `set_attribute`
    /// cannot be missed.
    pub async fn wait_for_attribute(&self, key: &str) -> String {
        let mut rx = self.changed.subscribe();
        loop {
            if let Some(value) = self.attribute(key) {
                return value;
            }
            // The sender is owned by `self`, so this cannot fail while
            // we hold the borrow.
            let _ = rx.changed().await;
        }
    }

    /// Mark the object as destroyed, waking teardown hooks
    ///
    /// Idempotent; later calls have no further effect.
    pub fn destroy(&self) {
        self.destroyed.send_replace(true);
    }

    /// Check whether the object has been destroyed
    pub fn is_destroyed(&self) -> bool {
        *self.destroyed.borrow()
    }

    /// Wait until the object is destroyed
    pub async fn destroyed(&self) {
        let mut rx = self.destroyed.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Where a registry's tag comes from
///
/// Either an explicit name, or an owning object the registry derives a
/// generated tag from (server side) or discovers the tag through (client
/// side).
#[derive(Debug, Clone)]
pub enum TagSource {
    /// Use this exact name
    Name(String),
    /// Derive from, and bind the registry's lifetime to, this object
    Object(Arc<HostObject>),
}

impl From<&str> for TagSource {
    fn from(name: &str) -> Self {
        TagSource::Name(name.to_string())
    }
}

impl From<String> for TagSource {
    fn from(name: String) -> Self {
        TagSource::Name(name)
    }
}

impl From<Arc<HostObject>> for TagSource {
    fn from(object: Arc<HostObject>) -> Self {
        TagSource::Object(object)
    }
}

impl From<&Arc<HostObject>> for TagSource {
    fn from(object: &Arc<HostObject>) -> Self {
        TagSource::Object(Arc::clone(object))
    }
}

impl std::fmt::Debug for HostObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostObject")
            .field("name", &self.name)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
