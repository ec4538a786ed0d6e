//! Test scopes.
//!
//! A test-class execution gets its own [`TestScopes`]: one lazy singleton
//! scope and one eager singleton scope. Within the execution a scoped binding
//! yields the same object every time; a new execution starts from an empty
//! cache.

use parking_lot::Mutex;
use rigging_core::{ContainerBuilder, Instance, Key, Result, Scope, ScopeTag};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

/// Singleton cache living for one test-class execution
pub struct TestScope {
    tag: ScopeTag,
    eager: bool,
    cache: Mutex<HashMap<Key, Instance>>,
    executions: AtomicUsize,
}

impl TestScope {
    /// One instance per execution, created on first use
    pub const SINGLETON: ScopeTag = ScopeTag::new("TestSingleton");

    /// One instance per execution, created when the container is built
    pub const EAGER_SINGLETON: ScopeTag = ScopeTag::new("TestEagerSingleton");

    pub fn singleton() -> Self {
        Self::new(Self::SINGLETON, false)
    }

    pub fn eager_singleton() -> Self {
        Self::new(Self::EAGER_SINGLETON, true)
    }

    fn new(tag: ScopeTag, eager: bool) -> Self {
        Self {
            tag,
            eager,
            cache: Mutex::new(HashMap::new()),
            executions: AtomicUsize::new(0),
        }
    }

    /// The tag bindings use to select this scope
    pub fn tag(&self) -> ScopeTag {
        self.tag
    }

    /// Check if an instance is cached for `key`
    pub fn is_cached(&self, key: &Key) -> bool {
        self.cache.lock().contains_key(key)
    }

    /// Number of cached instances
    pub fn cached_count(&self) -> usize {
        self.cache.lock().len()
    }

    /// Number of executions started with this scope
    pub fn execution_count(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

impl Scope for TestScope {
    fn name(&self) -> &str {
        self.tag.name()
    }

    fn resolve(&self, key: &Key, factory: &dyn Fn() -> Result<Instance>) -> Result<Instance> {
        if let Some(instance) = self.cache.lock().get(key) {
            trace!(key = %key, scope = self.tag.name(), "Scoped instance served from cache");
            return Ok(instance.clone());
        }

        // The factory may resolve other keys in this scope, so no lock is held.
        let instance = factory()?;
        let mut cache = self.cache.lock();
        let instance = cache.entry(key.clone()).or_insert(instance).clone();
        trace!(key = %key, scope = self.tag.name(), "Scoped instance cached");
        Ok(instance)
    }

    fn enter(&self) {
        let execution = self.executions.fetch_add(1, Ordering::SeqCst) + 1;
        self.cache.lock().clear();
        debug!(scope = self.tag.name(), execution, "Test scope entered");
    }

    fn exit(&self) {
        let discarded = std::mem::take(&mut *self.cache.lock());
        debug!(
            scope = self.tag.name(),
            discarded = discarded.len(),
            "Test scope exited"
        );
        drop(discarded);
    }

    fn is_eager(&self) -> bool {
        self.eager
    }
}

impl std::fmt::Debug for TestScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestScope")
            .field("tag", &self.tag)
            .field("eager", &self.eager)
            .field("cached", &self.cached_count())
            .finish()
    }
}

/// The pair of scopes owned by one test-class execution
#[derive(Debug, Clone)]
pub struct TestScopes {
    pub singleton: Arc<TestScope>,
    pub eager_singleton: Arc<TestScope>,
}

impl TestScopes {
    pub fn new() -> Self {
        Self {
            singleton: Arc::new(TestScope::singleton()),
            eager_singleton: Arc::new(TestScope::eager_singleton()),
        }
    }

    /// Register both scopes with `builder`
    pub fn bind(&self, builder: &mut ContainerBuilder) {
        builder.bind_scope(TestScope::SINGLETON, self.singleton.clone());
        builder.bind_scope(TestScope::EAGER_SINGLETON, self.eager_singleton.clone());
    }
}

impl Default for TestScopes {
    fn default() -> Self {
        Self::new()
    }
}
