//! Channel-pair namespace
//!
//! Process-wide directory of named channel-pairs. The server side creates
//! entries; the client side looks them up by tag, suspending until the
//! entry exists. One live pair per tag at a time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::error::{Error, Result};

use super::channel::{ChannelPair, ServerEnd};

/// Directory of named channel-pairs
///
/// Read-mostly after setup; a plain mutex over the map is enough for the
/// single-runtime access pattern this layer sees.
pub struct Namespace {
    pairs: Mutex<HashMap<String, Arc<ChannelPair>>>,
    created: Notify,
}

impl Namespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self {
            pairs: Mutex::new(HashMap::new()),
            created: Notify::new(),
        }
    }

    /// Create a channel-pair under the given tag
    ///
    /// Fails with [`Error::TagTaken`] if a live pair already holds the
    /// name. Wakes any client waiting on the tag.
    pub(crate) fn create(&self, tag: &str) -> Result<(Arc<ChannelPair>, ServerEnd)> {
        let mut pairs = self.pairs.lock().unwrap_or_else(|e| e.into_inner());

        if pairs.contains_key(tag) {
            return Err(Error::TagTaken(tag.to_string()));
        }

        let (pair, end) = ChannelPair::new(tag);
        pairs.insert(tag.to_string(), Arc::clone(&pair));
        drop(pairs);

        tracing::debug!(tag = %tag, "Channel-pair registered");
        self.created.notify_waiters();

        Ok((pair, end))
    }

    /// Remove a channel-pair, freeing the tag for reuse
    pub(crate) fn remove(&self, tag: &str) {
        let removed = self
            .pairs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(tag);

        if removed.is_some() {
            tracing::debug!(tag = %tag, "Channel-pair removed");
        }
    }

    /// Look up a channel-pair by tag
    pub fn get(&self, tag: &str) -> Option<Arc<ChannelPair>> {
        self.pairs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(tag)
            .cloned()
    }

    /// Check whether a tag is currently in use
    pub fn contains(&self, tag: &str) -> bool {
        self.pairs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(tag)
    }

    /// Get the number of live channel-pairs
    pub fn len(&self) -> usize {
        self.pairs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Check whether the namespace is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until a channel-pair exists under the given tag
    ///
    /// Suspends the calling task. The notified future is created before
    /// the lookup so a concurrent `create` cannot slip between check and
    /// wait.
    pub async fn wait_for(&self, tag: &str) -> Arc<ChannelPair> {
        loop {
            let notified = self.created.notified();
            if let Some(pair) = self.get(tag) {
                return pair;
            }
            notified.await;
        }
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}
