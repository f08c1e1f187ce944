//! Per-key change signals
//!
//! Each replicated value name gets its own broadcast stream, lazily
//! created on first subscription and fired whenever the server issues a
//! set instruction for that key.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::constants::SIGNAL_CHANNEL_CAPACITY;
use crate::value::Value;

/// Map of value name to notification stream
#[derive(Default)]
pub struct ChangeSignals {
    signals: Mutex<HashMap<String, broadcast::Sender<Value>>>,
}

impl ChangeSignals {
    /// Create an empty signal map
    pub fn new() -> Self {
        Self {
            signals: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to a key's stream, creating it if absent
    pub fn subscribe(&self, key: &str) -> broadcast::Receiver<Value> {
        let mut signals = self.signals.lock().unwrap_or_else(|e| e.into_inner());
        signals
            .entry(key.to_string())
            .or_insert_with(|| broadcast::channel(SIGNAL_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Fire a key's stream with a new value
    ///
    /// Keys nobody ever subscribed to have no stream and fire nothing.
    /// Returns the number of observers reached.
    pub(crate) fn fire(&self, key: &str, value: Value) -> usize {
        let signals = self.signals.lock().unwrap_or_else(|e| e.into_inner());
        match signals.get(key) {
            Some(tx) => tx.send(value).unwrap_or(0),
            None => 0,
        }
    }

    /// Drop all streams
    pub(crate) fn clear(&self) {
        self.signals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lazy_creation_and_fire() {
        let signals = ChangeSignals::new();

        // Firing with no subscribers reaches nobody
        assert_eq!(signals.fire("score", Value::from(1)), 0);

        let mut rx = signals.subscribe("score");
        assert_eq!(signals.fire("score", Value::from(2)), 1);
        assert_eq!(rx.recv().await.unwrap(), Value::Number(2.0));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let signals = ChangeSignals::new();

        let mut score = signals.subscribe("score");
        let _lives = signals.subscribe("lives");

        signals.fire("lives", Value::from(3));
        signals.fire("score", Value::from(10));

        // Only the score update lands on the score stream
        assert_eq!(score.recv().await.unwrap(), Value::Number(10.0));
    }

    #[tokio::test]
    async fn test_clear_closes_streams() {
        let signals = ChangeSignals::new();
        let mut rx = signals.subscribe("score");

        signals.clear();
        assert!(rx.recv().await.is_err());
    }
}
