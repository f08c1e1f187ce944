//! Server registry
//!
//! Owns one channel-pair, demultiplexes incoming method calls to the
//! access table, and exposes the push primitives: targeted and broadcast
//! fires, recipient-list fires, and the `set` family that carries
//! server-authoritative value replication.

use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::constants::{GENERATED_TAG_LEN, SET_METHOD, TAG_ATTRIBUTE};
use crate::error::{Error, Result};
use crate::host::{HostObject, NetRuntime, PeerId, ServerContext, TagSource};
use crate::pair::{ChannelPair, Delivery, EventEnvelope, ServerEnd};
use crate::value::Value;

use super::access::AccessTable;
use super::recipients::RecipientSet;

/// Registry lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active,
    Destroyed,
}

/// Target of a peer-addressed push operation
#[derive(Debug, Clone)]
pub enum Target {
    /// A single peer
    One(PeerId),
    /// A list of peers
    Many(Vec<PeerId>),
}

impl Target {
    fn into_peers(self) -> Vec<PeerId> {
        match self {
            Target::One(peer) => vec![peer],
            Target::Many(peers) => peers,
        }
    }
}

impl From<PeerId> for Target {
    fn from(peer: PeerId) -> Self {
        Target::One(peer)
    }
}

impl From<Vec<PeerId>> for Target {
    fn from(peers: Vec<PeerId>) -> Self {
        Target::Many(peers)
    }
}

impl From<&[PeerId]> for Target {
    fn from(peers: &[PeerId]) -> Self {
        Target::Many(peers.to_vec())
    }
}

/// Server-side registry for one channel-pair
///
/// Construction spawns the dispatch task and so must happen inside a
/// Tokio runtime.
///
/// # Example
/// ```no_run
/// use remotes_rs::{AccessTable, NetRuntime, ServerRegistry, Value};
///
/// struct Arena {
///     round: f64,
/// }
///
/// # fn example() -> remotes_rs::Result<()> {
/// let runtime = NetRuntime::new();
/// let access = AccessTable::new()
///     .with("round", |arena: &mut Arena, _caller, _args| {
///         Some(Value::from(arena.round))
///     })?;
///
/// let registry =
///     ServerRegistry::with_access(&runtime.server(), "arena", Arena { round: 1.0 }, access)?;
/// registry.set_all("round", Value::from(1.0))?;
/// # Ok(())
/// # }
/// ```
pub struct ServerRegistry<M: Send + 'static> {
    inner: Arc<Inner<M>>,
}

struct Inner<M: Send + 'static> {
    tag: String,
    runtime: Arc<NetRuntime>,
    pair: Arc<ChannelPair>,
    module: Arc<AsyncMutex<M>>,
    access: Arc<RwLock<AccessTable<M>>>,
    recipients: Mutex<RecipientSet>,
    phase: Mutex<Phase>,
    object: Mutex<Option<Arc<HostObject>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<M: Send + 'static> ServerRegistry<M> {
    /// Create a registry with an empty access table
    pub fn new(ctx: &ServerContext, tag: impl Into<TagSource>, module: M) -> Result<Self> {
        Self::with_access(ctx, tag, module, AccessTable::new())
    }

    /// Create a registry and register its access methods immediately
    ///
    /// An explicit tag is claimed verbatim in the namespace and fails
    /// with [`Error::TagTaken`] if a live pair already holds it. An
    /// owning object gets a fresh generated tag attached as its
    /// discoverable attribute, and the registry tears itself down when
    /// the object is destroyed.
    pub fn with_access(
        ctx: &ServerContext,
        tag: impl Into<TagSource>,
        module: M,
        access: AccessTable<M>,
    ) -> Result<Self> {
        let namespace = ctx.namespace();

        let (tag, object, pair, end) = match tag.into() {
            TagSource::Name(name) => {
                let (pair, end) = namespace.create(&name)?;
                (name, None, pair, end)
            }
            TagSource::Object(object) => {
                if let Some(existing) = object.attribute(TAG_ATTRIBUTE) {
                    return Err(Error::AlreadyTagged(existing));
                }
                let (name, pair, end) = claim_generated_tag(ctx)?;
                object.set_attribute(TAG_ATTRIBUTE, name.as_str());
                (name, Some(object), pair, end)
            }
        };

        let module = Arc::new(AsyncMutex::new(module));
        let access = Arc::new(RwLock::new(access));

        let inner = Arc::new(Inner {
            tag: tag.clone(),
            runtime: Arc::clone(ctx.runtime()),
            pair,
            module: Arc::clone(&module),
            access: Arc::clone(&access),
            recipients: Mutex::new(RecipientSet::new()),
            phase: Mutex::new(Phase::Active),
            object: Mutex::new(object.clone()),
            tasks: Mutex::new(Vec::new()),
        });

        let dispatch = tokio::spawn(dispatch_loop(end, module, access, tag.clone()));
        lock(&inner.tasks).push(dispatch);

        if let Some(object) = object {
            let watcher = {
                let inner = Arc::clone(&inner);
                tokio::spawn(async move {
                    object.destroyed().await;
                    // Tears down at most once; a racing explicit destroy
                    // already moved the registry out of Active.
                    let _ = inner.destroy();
                })
            };
            lock(&inner.tasks).push(watcher);
        }

        tracing::info!(tag = %tag, "Server registry created");
        Ok(Self { inner })
    }

    /// Get the registry's tag
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    /// Get the module state shared with the dispatch task
    pub fn module(&self) -> Arc<AsyncMutex<M>> {
        Arc::clone(&self.inner.module)
    }

    /// Register additional access methods
    ///
    /// Fails with [`Error::DuplicateMethod`] if any incoming name is
    /// already registered; nothing is registered in that case.
    pub fn add_client_access(&self, methods: AccessTable<M>) -> Result<()> {
        self.inner.check_active()?;
        write(&self.inner.access).merge(methods)
    }

    /// Register one access method
    pub fn register_method<F>(&self, name: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(&mut M, PeerId, &[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        self.inner.check_active()?;
        write(&self.inner.access).register(name, handler)
    }

    /// Append a peer to the recipient list
    pub fn add_recipient(&self, peer: PeerId) -> Result<()> {
        self.inner.check_active()?;
        lock(&self.inner.recipients).add(peer);
        Ok(())
    }

    /// Remove a peer from the recipient list
    pub fn remove_recipient(&self, peer: PeerId) -> Result<()> {
        self.inner.check_active()?;
        lock(&self.inner.recipients).remove(peer);
        Ok(())
    }

    /// Reset the recipient list to unset
    pub fn clear_recipients(&self) -> Result<()> {
        self.inner.check_active()?;
        lock(&self.inner.recipients).clear();
        Ok(())
    }

    /// Get a snapshot of the recipient list, if configured
    pub fn recipients(&self) -> Option<Vec<PeerId>> {
        lock(&self.inner.recipients).snapshot()
    }

    /// Fire a method at one peer or a list of peers
    pub fn fire(
        &self,
        target: impl Into<Target>,
        method: impl Into<String>,
        args: Vec<Value>,
    ) -> Result<()> {
        self.inner
            .push(Delivery::Only(target.into().into_peers()), method, args)
    }

    /// Fire a method at every connected peer
    pub fn fire_all(&self, method: impl Into<String>, args: Vec<Value>) -> Result<()> {
        self.inner.push(Delivery::All, method, args)
    }

    /// Fire a method at every connected peer except the given ones
    pub fn fire_all_except(
        &self,
        target: impl Into<Target>,
        method: impl Into<String>,
        args: Vec<Value>,
    ) -> Result<()> {
        self.inner
            .push(Delivery::Except(target.into().into_peers()), method, args)
    }

    /// Fire a method at the configured recipient list
    ///
    /// Logs a warning and does nothing when no recipient list has been
    /// configured.
    pub fn fire_recipients(&self, method: impl Into<String>, args: Vec<Value>) -> Result<()> {
        self.inner.check_active()?;

        let Some(peers) = lock(&self.inner.recipients).snapshot() else {
            tracing::warn!(tag = %self.inner.tag, "No recipients configured; fire skipped");
            return Ok(());
        };

        self.inner.push(Delivery::Only(peers), method, args)
    }

    /// Replicate a value to one peer or a list of peers
    ///
    /// The client assigns `module[key] = value` and fires the key's
    /// change signal. Last write wins in channel delivery order.
    pub fn set(&self, target: impl Into<Target>, key: impl Into<String>, value: Value) -> Result<()> {
        self.fire(target, SET_METHOD, set_args(key, value))
    }

    /// Replicate a value to every connected peer
    pub fn set_all(&self, key: impl Into<String>, value: Value) -> Result<()> {
        self.fire_all(SET_METHOD, set_args(key, value))
    }

    /// Replicate a value to every connected peer except the given ones
    pub fn set_all_except(
        &self,
        target: impl Into<Target>,
        key: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        self.fire_all_except(target, SET_METHOD, set_args(key, value))
    }

    /// Replicate a value to the configured recipient list
    pub fn set_recipients(&self, key: impl Into<String>, value: Value) -> Result<()> {
        self.fire_recipients(SET_METHOD, set_args(key, value))
    }

    /// Tear the registry down
    ///
    /// Closes the channel-pair, frees the tag in the namespace, clears
    /// recipients, stops the dispatch and watcher tasks, and removes the
    /// owning object's tag attribute. Fails with [`Error::Destroyed`] if
    /// already destroyed.
    pub fn destroy(&self) -> Result<()> {
        self.inner.destroy()
    }
}

impl<M: Send + 'static> Clone for ServerRegistry<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Send + 'static> Inner<M> {
    fn check_active(&self) -> Result<()> {
        match *lock(&self.phase) {
            Phase::Active => Ok(()),
            Phase::Destroyed => Err(Error::Destroyed),
        }
    }

    fn push(&self, delivery: Delivery, method: impl Into<String>, args: Vec<Value>) -> Result<()> {
        self.check_active()?;
        let reached = self
            .pair
            .send_event(EventEnvelope::new(delivery, method, args));
        tracing::trace!(tag = %self.tag, reached = reached, "Envelope pushed");
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        {
            let mut phase = lock(&self.phase);
            if *phase == Phase::Destroyed {
                return Err(Error::Destroyed);
            }
            *phase = Phase::Destroyed;
        }

        self.pair.close();
        self.runtime.namespace().remove(&self.tag);
        lock(&self.recipients).clear();

        if let Some(object) = lock(&self.object).take() {
            object.remove_attribute(TAG_ATTRIBUTE);
        }

        for task in lock(&self.tasks).drain(..) {
            task.abort();
        }

        tracing::info!(tag = %self.tag, "Server registry destroyed");
        Ok(())
    }
}

/// Generate tags until one is accepted by the namespace
fn claim_generated_tag(ctx: &ServerContext) -> Result<(String, Arc<ChannelPair>, ServerEnd)> {
    loop {
        let candidate = generate_tag();
        match ctx.namespace().create(&candidate) {
            Ok((pair, end)) => return Ok((candidate, pair, end)),
            Err(Error::TagTaken(_)) => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Short random token derived from a 128-bit identifier
fn generate_tag() -> String {
    let guid = format!("{:032x}", rand::random::<u128>());
    guid[..GENERATED_TAG_LEN].to_string()
}

fn set_args(key: impl Into<String>, value: Value) -> Vec<Value> {
    vec![Value::String(key.into()), value]
}

async fn dispatch_loop<M: Send + 'static>(
    mut end: ServerEnd,
    module: Arc<AsyncMutex<M>>,
    access: Arc<RwLock<AccessTable<M>>>,
    tag: String,
) {
    loop {
        tokio::select! {
            event = end.upstream_rx.recv() => match event {
                Some(event) => {
                    // Event path: a missing handler is logged and ignored
                    let _ = dispatch(&module, &access, &tag, event.caller, &event.method, &event.args)
                        .await;
                }
                None => break,
            },
            request = end.call_rx.recv() => match request {
                Some(request) => {
                    let result = dispatch(
                        &module,
                        &access,
                        &tag,
                        request.caller,
                        &request.method,
                        &request.args,
                    )
                    .await;
                    // Caller may have stopped waiting
                    let _ = request.reply.send(result);
                }
                None => break,
            },
        }
    }
}

async fn dispatch<M: Send + 'static>(
    module: &Arc<AsyncMutex<M>>,
    access: &Arc<RwLock<AccessTable<M>>>,
    tag: &str,
    caller: PeerId,
    method: &str,
    args: &[Value],
) -> Option<Value> {
    let mut module = module.lock().await;
    let access = read(access);

    match access.get(method) {
        Some(handler) => handler(&mut module, caller, args),
        None => {
            tracing::warn!(
                tag = %tag,
                caller = %caller,
                method = %method,
                "Unknown method requested"
            );
            None
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn read<T>(rwlock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    rwlock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(rwlock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    rwlock.write().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[derive(Default)]
    struct Arena {
        jumps: u32,
    }

    fn arena_access() -> AccessTable<Arena> {
        AccessTable::new()
            .with("jump", |arena: &mut Arena, _caller, _args| {
                arena.jumps += 1;
                None
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_explicit_tag_collision_fails_on_second() {
        let runtime = NetRuntime::new();
        let ctx = runtime.server();

        let _first = ServerRegistry::new(&ctx, "arena", Arena::default()).unwrap();
        let second = ServerRegistry::new(&ctx, "arena", Arena::default());

        assert!(matches!(second, Err(Error::TagTaken(tag)) if tag == "arena"));
    }

    #[tokio::test]
    async fn test_distinct_tags_never_collide() {
        let runtime = NetRuntime::new();
        let ctx = runtime.server();

        let a = ServerRegistry::new(&ctx, "arena", Arena::default()).unwrap();
        let b = ServerRegistry::new(&ctx, "lobby", Arena::default()).unwrap();

        assert_ne!(a.tag(), b.tag());
        assert_eq!(runtime.namespace().len(), 2);
    }

    #[tokio::test]
    async fn test_generated_tag_attached_to_object() {
        let runtime = NetRuntime::new();
        let ctx = runtime.server();
        let object = HostObject::new("boss");

        let registry =
            ServerRegistry::new(&ctx, Arc::clone(&object), Arena::default()).unwrap();

        assert_eq!(registry.tag().len(), GENERATED_TAG_LEN);
        assert_eq!(
            object.attribute(TAG_ATTRIBUTE).as_deref(),
            Some(registry.tag())
        );
        assert!(runtime.namespace().contains(registry.tag()));
    }

    #[tokio::test]
    async fn test_already_tagged_object_rejected() {
        let runtime = NetRuntime::new();
        let ctx = runtime.server();
        let object = HostObject::new("boss");

        let _first = ServerRegistry::new(&ctx, Arc::clone(&object), Arena::default()).unwrap();
        let second = ServerRegistry::new(&ctx, Arc::clone(&object), Arena::default());

        assert!(matches!(second, Err(Error::AlreadyTagged(_))));
    }

    #[tokio::test]
    async fn test_destroy_frees_tag_and_detaches_object() {
        let runtime = NetRuntime::new();
        let ctx = runtime.server();
        let object = HostObject::new("boss");

        let registry =
            ServerRegistry::new(&ctx, Arc::clone(&object), Arena::default()).unwrap();
        let tag = registry.tag().to_string();

        registry.destroy().unwrap();

        assert_eq!(object.attribute(TAG_ATTRIBUTE), None);
        assert!(!runtime.namespace().contains(&tag));

        // Second destroy fails cleanly, as do operations afterwards
        assert_eq!(registry.destroy(), Err(Error::Destroyed));
        assert_eq!(registry.fire_all("ping", vec![]), Err(Error::Destroyed));
        assert_eq!(registry.add_recipient(PeerId(1)), Err(Error::Destroyed));
    }

    #[tokio::test]
    async fn test_object_destruction_tears_registry_down() {
        let runtime = NetRuntime::new();
        let ctx = runtime.server();
        let object = HostObject::new("boss");

        let registry =
            ServerRegistry::new(&ctx, Arc::clone(&object), Arena::default()).unwrap();
        let tag = registry.tag().to_string();

        object.destroy();

        // The watcher task runs asynchronously
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        while runtime.namespace().contains(&tag) {
            assert!(
                tokio::time::Instant::now() < deadline,
                "registry was not torn down"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(registry.destroy(), Err(Error::Destroyed));
    }

    #[tokio::test]
    async fn test_duplicate_method_rejected_through_registry() {
        let runtime = NetRuntime::new();
        let ctx = runtime.server();

        let registry =
            ServerRegistry::with_access(&ctx, "arena", Arena::default(), arena_access()).unwrap();

        let result = registry.register_method("jump", |_m: &mut Arena, _c, _a| None);
        assert_eq!(result, Err(Error::DuplicateMethod("jump".to_string())));
    }

    #[tokio::test]
    async fn test_fire_recipients_unset_is_skipped() {
        let runtime = NetRuntime::new();
        let ctx = runtime.server();
        let registry = ServerRegistry::new(&ctx, "arena", Arena::default()).unwrap();

        // No recipients configured: skipped, not an error
        assert_eq!(registry.fire_recipients("ping", vec![]), Ok(()));

        registry.add_recipient(PeerId(1)).unwrap();
        registry.add_recipient(PeerId(2)).unwrap();
        registry.remove_recipient(PeerId(2)).unwrap();
        assert_eq!(registry.recipients(), Some(vec![PeerId(1)]));

        registry.clear_recipients().unwrap();
        assert_eq!(registry.recipients(), None);
    }

    #[tokio::test]
    async fn test_generated_tags_are_unique() {
        let runtime = NetRuntime::new();
        let ctx = runtime.server();

        let a = ServerRegistry::new(&ctx, HostObject::new("a"), Arena::default()).unwrap();
        let b = ServerRegistry::new(&ctx, HostObject::new("b"), Arena::default()).unwrap();

        assert_ne!(a.tag(), b.tag());
    }
}
