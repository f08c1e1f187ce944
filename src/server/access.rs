//! Method access table
//!
//! Explicit registration table mapping method names to handler closures.
//! Handlers receive the registry's module state, the calling peer, and
//! the method arguments; returning a value only matters on the blocking
//! call path.

use std::collections::HashMap;

use crate::constants::SET_METHOD;
use crate::error::{Error, Result};
use crate::host::PeerId;
use crate::value::Value;

/// Handler invoked for one registered method
pub type Method<M> = Box<dyn Fn(&mut M, PeerId, &[Value]) -> Option<Value> + Send + Sync>;

/// Name-to-handler table for one server registry
///
/// Names are unique; registering a name twice is a configuration error,
/// as is registering the reserved replication method.
pub struct AccessTable<M> {
    methods: HashMap<String, Method<M>>,
}

impl<M> AccessTable<M> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Register a handler under a method name
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> Result<()>
    where
        F: Fn(&mut M, PeerId, &[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        let name = name.into();

        if name == SET_METHOD {
            return Err(Error::ReservedMethod(name));
        }
        if self.methods.contains_key(&name) {
            return Err(Error::DuplicateMethod(name));
        }

        self.methods.insert(name, Box::new(handler));
        Ok(())
    }

    /// Register a handler, consuming and returning the table for chaining
    pub fn with<F>(mut self, name: impl Into<String>, handler: F) -> Result<Self>
    where
        F: Fn(&mut M, PeerId, &[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        self.register(name, handler)?;
        Ok(self)
    }

    /// Merge another table into this one
    ///
    /// Fails without modifying either table if any incoming name is
    /// already registered.
    pub fn merge(&mut self, other: AccessTable<M>) -> Result<()> {
        for name in other.methods.keys() {
            if self.methods.contains_key(name) {
                return Err(Error::DuplicateMethod(name.clone()));
            }
        }
        self.methods.extend(other.methods);
        Ok(())
    }

    /// Look up a handler by name
    pub(crate) fn get(&self, name: &str) -> Option<&Method<M>> {
        self.methods.get(name)
    }

    /// Check whether a method name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Get the number of registered methods
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Check whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl<M> Default for AccessTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        calls: u32,
    }

    #[test]
    fn test_register_and_lookup() {
        let mut table: AccessTable<Counter> = AccessTable::new();
        table
            .register("bump", |m: &mut Counter, _caller, _args| {
                m.calls += 1;
                Some(Value::from(m.calls as f64))
            })
            .unwrap();

        assert!(table.contains("bump"));
        assert_eq!(table.len(), 1);

        let mut module = Counter { calls: 0 };
        let handler = table.get("bump").unwrap();
        let result = handler(&mut module, PeerId(1), &[]);
        assert_eq!(result, Some(Value::Number(1.0)));
        assert_eq!(module.calls, 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut table: AccessTable<Counter> = AccessTable::new();
        table.register("bump", |_m, _c, _a| None).unwrap();

        let result = table.register("bump", |_m, _c, _a| None);
        assert_eq!(result, Err(Error::DuplicateMethod("bump".to_string())));
    }

    #[test]
    fn test_reserved_name_rejected() {
        let mut table: AccessTable<Counter> = AccessTable::new();
        let result = table.register(SET_METHOD, |_m, _c, _a| None);
        assert_eq!(result, Err(Error::ReservedMethod(SET_METHOD.to_string())));
    }

    #[test]
    fn test_merge_duplicate_leaves_tables_untouched() {
        let mut base: AccessTable<Counter> = AccessTable::new();
        base.register("bump", |_m, _c, _a| None).unwrap();

        let incoming = AccessTable::new()
            .with("reset", |_m: &mut Counter, _c, _a| None)
            .unwrap()
            .with("bump", |_m, _c, _a| None)
            .unwrap();

        let result = base.merge(incoming);
        assert_eq!(result, Err(Error::DuplicateMethod("bump".to_string())));

        // Nothing from the failed merge landed
        assert_eq!(base.len(), 1);
        assert!(!base.contains("reset"));
    }

    #[test]
    fn test_merge() {
        let mut base: AccessTable<Counter> = AccessTable::new();
        base.register("bump", |_m, _c, _a| None).unwrap();

        let incoming = AccessTable::new()
            .with("reset", |_m: &mut Counter, _c, _a| None)
            .unwrap();

        base.merge(incoming).unwrap();
        assert!(base.contains("bump"));
        assert!(base.contains("reset"));
    }
}
