//! Client registry
//!
//! Locates a channel-pair by tag (suspending until the server publishes
//! it), listens on the multicast channel, and routes envelopes either
//! into value replication or into the local module's method dispatch.

use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::constants::{SET_METHOD, TAG_ATTRIBUTE};
use crate::error::{Error, Result};
use crate::host::{ClientContext, PeerId, TagSource};
use crate::pair::{ChannelPair, EventEnvelope};
use crate::value::Value;

use super::signal::ChangeSignals;

/// Registry lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active,
    Destroyed,
}

/// Module a client registry dispatches into
///
/// `set_value` applies server-authoritative replication; `dispatch`
/// handles every other server-sent method and must return
/// [`Error::UnknownMethod`] for names it does not recognize. The
/// listener treats that as fatal for the dispatch and logs it at error
/// level.
pub trait ClientModule: Send + 'static {
    /// Apply a replicated value
    fn set_value(&mut self, key: &str, value: Value);

    /// Invoke a server-sent method
    fn dispatch(&mut self, method: &str, args: &[Value]) -> Result<()>;
}

/// Client-side registry for one channel-pair
///
/// # Example
/// ```no_run
/// use remotes_rs::{ClientModule, ClientRegistry, Error, NetRuntime, Result, Value};
///
/// #[derive(Default)]
/// struct Hud {
///     score: f64,
/// }
///
/// impl ClientModule for Hud {
///     fn set_value(&mut self, key: &str, value: Value) {
///         if key == "score" {
///             self.score = value.as_number().unwrap_or(0.0);
///         }
///     }
///
///     fn dispatch(&mut self, method: &str, _args: &[Value]) -> Result<()> {
///         Err(Error::UnknownMethod(method.to_string()))
///     }
/// }
///
/// # async fn example() -> Result<()> {
/// let runtime = NetRuntime::new();
/// let ctx = runtime.connect();
/// let registry = ClientRegistry::new(&ctx, "arena", Hud::default()).await?;
///
/// let mut score = registry.server_changed_signal("score")?;
/// registry.fire("ready", vec![]).await?;
/// let latest = score.recv().await;
/// # let _ = latest;
/// # Ok(())
/// # }
/// ```
pub struct ClientRegistry<M: ClientModule> {
    inner: Arc<Inner<M>>,
}

struct Inner<M: ClientModule> {
    tag: Option<String>,
    peer: PeerId,
    pair: Mutex<Option<Arc<ChannelPair>>>,
    module: Arc<AsyncMutex<M>>,
    signals: ChangeSignals,
    phase: Mutex<Phase>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<M: ClientModule> ClientRegistry<M> {
    /// Create a registry attached to the channel-pair named by `tag`
    ///
    /// Suspends until the pair exists; with an owning object as the tag
    /// source, first suspends until the object's discoverable tag
    /// attribute appears. A detached context yields a registry whose
    /// network operations are silent no-ops.
    pub async fn new(ctx: &ClientContext, tag: impl Into<TagSource>, module: M) -> Result<Self> {
        let module = Arc::new(AsyncMutex::new(module));

        let Some(namespace) = ctx.namespace() else {
            tracing::debug!("No runtime attached; client registry is detached");
            return Ok(Self {
                inner: Arc::new(Inner {
                    tag: None,
                    peer: ctx.peer(),
                    pair: Mutex::new(None),
                    module,
                    signals: ChangeSignals::new(),
                    phase: Mutex::new(Phase::Active),
                    listener: Mutex::new(None),
                }),
            });
        };

        let tag = match tag.into() {
            TagSource::Name(name) => name,
            TagSource::Object(object) => object.wait_for_attribute(TAG_ATTRIBUTE).await,
        };

        let pair = namespace.wait_for(&tag).await;
        let event_rx = pair.subscribe();
        let closed = pair.closed_watch();

        let inner = Arc::new(Inner {
            tag: Some(tag.clone()),
            peer: ctx.peer(),
            pair: Mutex::new(Some(pair)),
            module,
            signals: ChangeSignals::new(),
            phase: Mutex::new(Phase::Active),
            listener: Mutex::new(None),
        });

        let handle = {
            let inner = Arc::clone(&inner);
            tokio::spawn(listen_loop(inner, event_rx, closed))
        };
        *lock(&inner.listener) = Some(handle);

        tracing::debug!(tag = %tag, peer = %ctx.peer(), "Client registry attached");
        Ok(Self { inner })
    }

    /// Get the resolved tag, if attached
    pub fn tag(&self) -> Option<&str> {
        self.inner.tag.as_deref()
    }

    /// Get this registry's peer identity
    pub fn peer(&self) -> PeerId {
        self.inner.peer
    }

    /// Check whether a live channel-pair is attached
    pub fn is_attached(&self) -> bool {
        lock(&self.inner.pair).is_some()
    }

    /// Get the module state shared with the listener task
    pub fn module(&self) -> Arc<AsyncMutex<M>> {
        Arc::clone(&self.inner.module)
    }

    /// Subscribe to a replicated value's change signal
    ///
    /// The per-key stream is created on first subscription and fires
    /// exactly when a set instruction for that key arrives.
    pub fn server_changed_signal(&self, key: &str) -> Result<broadcast::Receiver<Value>> {
        self.inner.check_active()?;
        Ok(self.inner.signals.subscribe(key))
    }

    /// Send a fire-and-forget method call to the server
    ///
    /// A silent no-op on a detached registry.
    pub async fn fire(&self, method: impl Into<String>, args: Vec<Value>) -> Result<()> {
        self.inner.check_active()?;

        let Some(pair) = lock(&self.inner.pair).clone() else {
            return Ok(());
        };
        pair.fire(self.inner.peer, method.into(), args).await
    }

    /// Issue a blocking method call and wait for the server's result
    ///
    /// Suspends the calling task until the server replies; an unknown
    /// method yields `Ok(None)`. On a detached registry this returns
    /// `Ok(None)` immediately.
    pub async fn fetch(&self, method: impl Into<String>, args: Vec<Value>) -> Result<Option<Value>> {
        self.inner.check_active()?;

        let Some(pair) = lock(&self.inner.pair).clone() else {
            return Ok(None);
        };
        pair.call(self.inner.peer, method.into(), args).await
    }

    /// Release the registry's subscriptions and signals
    ///
    /// The shared channel-pair itself is left in the namespace; the
    /// client only observes it. Fails with [`Error::Destroyed`] if
    /// already destroyed.
    pub fn destroy(&self) -> Result<()> {
        if !self.inner.teardown() {
            return Err(Error::Destroyed);
        }
        if let Some(handle) = lock(&self.inner.listener).take() {
            handle.abort();
        }
        Ok(())
    }
}

impl<M: ClientModule> Clone for ClientRegistry<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: ClientModule> Inner<M> {
    fn check_active(&self) -> Result<()> {
        match *lock(&self.phase) {
            Phase::Active => Ok(()),
            Phase::Destroyed => Err(Error::Destroyed),
        }
    }

    /// Move to Destroyed; returns false if already there
    fn teardown(&self) -> bool {
        {
            let mut phase = lock(&self.phase);
            if *phase == Phase::Destroyed {
                return false;
            }
            *phase = Phase::Destroyed;
        }

        lock(&self.pair).take();
        self.signals.clear();

        if let Some(tag) = self.tag.as_deref() {
            tracing::debug!(tag = %tag, peer = %self.peer, "Client registry destroyed");
        }
        true
    }

    async fn handle_envelope(&self, envelope: EventEnvelope) {
        if envelope.method == SET_METHOD {
            let mut args = envelope.args.into_iter();
            let key = match args.next() {
                Some(Value::String(key)) => key,
                other => {
                    tracing::warn!(
                        peer = %self.peer,
                        key = ?other,
                        "Malformed set instruction; key is not a string"
                    );
                    return;
                }
            };
            let value = args.next().unwrap_or(Value::Nil);

            self.module.lock().await.set_value(&key, value.clone());
            self.signals.fire(&key, value);
        } else {
            let mut module = self.module.lock().await;
            if let Err(e) = module.dispatch(&envelope.method, &envelope.args) {
                tracing::error!(
                    peer = %self.peer,
                    method = %envelope.method,
                    error = %e,
                    "Client dispatch failed"
                );
            }
        }
    }
}

async fn listen_loop<M: ClientModule>(
    inner: Arc<Inner<M>>,
    mut event_rx: broadcast::Receiver<EventEnvelope>,
    mut closed: watch::Receiver<bool>,
) {
    // Subscribing marks the current value as seen, so a pair that closed
    // between lookup and subscription must be caught here; `changed()`
    // alone would wait forever.
    if *closed.borrow_and_update() {
        inner.teardown();
        return;
    }

    loop {
        tokio::select! {
            result = event_rx.recv() => match result {
                Ok(envelope) => {
                    if !envelope.delivery.includes(inner.peer) {
                        continue;
                    }
                    inner.handle_envelope(envelope).await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        peer = %inner.peer,
                        skipped = skipped,
                        "Event channel lagged; envelopes dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            changed = closed.changed() => {
                if changed.is_err() || *closed.borrow() {
                    break;
                }
            }
        }
    }

    // Pair went away: the registry tears itself down
    inner.teardown();
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
