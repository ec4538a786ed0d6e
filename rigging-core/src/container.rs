// Realized dependency injection container

use crate::binder::{Binding, BindingSource};
use crate::logging::{debug, trace};
use crate::{Error, Instance, Key, ProviderHandle, Result, Scope, ScopeTag, downcast};
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

/// The dependency injection container
///
/// Built by [`ContainerBuilder`](crate::ContainerBuilder). Cloning is cheap
/// and every clone shares bindings and scope state.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    bindings: HashMap<Key, Binding>,
    groups: HashMap<(TypeId, String), Vec<Key>>,
    scopes: HashMap<ScopeTag, Arc<dyn Scope>>,
}

thread_local! {
    // Keys under construction on this thread, tagged with their container
    static RESOLVING: RefCell<Vec<(usize, Key)>> = const { RefCell::new(Vec::new()) };
}

// Unwinds this thread's resolution stack to where it was entered, even when a
// constructor panics.
struct ResolutionGuard {
    depth: usize,
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        let _ = RESOLVING.try_with(|stack| stack.borrow_mut().truncate(self.depth));
    }
}

impl Container {
    pub(crate) fn from_parts(
        bindings: Vec<Binding>,
        groups: HashMap<(TypeId, String), Vec<Key>>,
        scopes: HashMap<ScopeTag, Arc<dyn Scope>>,
    ) -> Self {
        let bindings = bindings
            .into_iter()
            .map(|binding| (binding.key.clone(), binding))
            .collect();
        Self {
            inner: Arc::new(ContainerInner {
                bindings,
                groups,
                scopes,
            }),
        }
    }

    /// Resolve an unqualified `T`
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.get_key(&Key::of::<T>())
    }

    /// Resolve a `T` qualified by name
    pub fn get_named<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        self.get_key(&Key::named::<T>(name))
    }

    /// Resolve the binding for `key`, which must be a key for `T`
    pub fn get_key<T: ?Sized + Send + Sync + 'static>(&self, key: &Key) -> Result<Arc<T>> {
        if !key.is_for::<T>() {
            return Err(Error::TypeMismatch(key.to_string()));
        }
        let instance = self.resolve_instance(key)?;
        downcast(&instance, key)
    }

    /// Resolve every binding of `T` tagged with `group`
    ///
    /// Returns an empty list when the group has no bindings.
    pub fn get_all<T: ?Sized + Send + Sync + 'static>(&self, group: &str) -> Result<Vec<Arc<T>>> {
        self.keys_in_group::<T>(group)
            .iter()
            .map(|key| self.get_key(key))
            .collect()
    }

    /// Keys bound for `T` under a multi-binding group
    pub fn keys_in_group<T: ?Sized + 'static>(&self, group: &str) -> Vec<Key> {
        self.keys_in_group_of(TypeId::of::<T>(), group)
    }

    /// Keys bound for the type identified by `type_id` under a group
    pub fn keys_in_group_of(&self, type_id: TypeId, group: &str) -> Vec<Key> {
        self.inner
            .groups
            .get(&(type_id, group.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// A handle resolving `key` lazily, on each `get`
    pub fn provider<T: ?Sized + Send + Sync + 'static>(&self, key: Key) -> ProviderHandle<T> {
        ProviderHandle::new(self.clone(), key)
    }

    /// Check if a binding exists for `key`
    pub fn contains(&self, key: &Key) -> bool {
        self.inner.bindings.contains_key(key)
    }

    /// How the binding for `key` produces values
    pub fn binding_source(&self, key: &Key) -> Option<BindingSource> {
        self.inner.bindings.get(key).map(|binding| binding.source)
    }

    /// The scope a binding is placed in, if any
    pub fn binding_scope(&self, key: &Key) -> Option<ScopeTag> {
        self.inner.bindings.get(key).and_then(|binding| binding.scope)
    }

    /// Number of bindings
    pub fn binding_count(&self) -> usize {
        self.inner.bindings.len()
    }

    /// The scope instance registered for `tag`
    pub fn scope(&self, tag: ScopeTag) -> Option<Arc<dyn Scope>> {
        self.inner.scopes.get(&tag).cloned()
    }

    /// Notify every scope that a new execution starts
    pub fn enter_scopes(&self) {
        for (tag, scope) in &self.inner.scopes {
            trace!(scope = tag.name(), "Entering scope");
            scope.enter();
        }
    }

    /// Notify every scope that the execution ended
    pub fn exit_scopes(&self) {
        for (tag, scope) in &self.inner.scopes {
            trace!(scope = tag.name(), "Exiting scope");
            scope.exit();
        }
    }

    /// Resolve `key` to a type-erased instance, applying its scope
    pub fn resolve_instance(&self, key: &Key) -> Result<Instance> {
        trace!(key = %key, "Attempting to resolve binding");

        let Some(binding) = self.inner.bindings.get(key) else {
            debug!(key = %key, "Binding not found in container");
            return Err(Error::BindingNotFound(key.to_string()));
        };

        let _guard = self.enter_resolution(key)?;

        let result = match binding.scope {
            Some(tag) => {
                let scope = self
                    .inner
                    .scopes
                    .get(&tag)
                    .ok_or_else(|| Error::ScopeNotBound {
                        scope: tag.to_string(),
                        key: key.to_string(),
                    })?;
                scope.resolve(key, &|| binding.provider.provide(self))
            }
            None => binding.provider.provide(self),
        };

        match &result {
            Ok(_) => trace!(key = %key, "Binding resolved"),
            Err(error) => debug!(key = %key, error = %error, "Binding resolution failed"),
        }

        result
    }

    fn enter_resolution(&self, key: &Key) -> Result<ResolutionGuard> {
        let id = self.id();
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            let pending: Vec<&Key> = stack
                .iter()
                .filter(|(owner, _)| *owner == id)
                .map(|(_, pending)| pending)
                .collect();
            if pending.contains(&key) {
                let path = pending
                    .into_iter()
                    .chain(std::iter::once(key))
                    .map(Key::to_string)
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(Error::CircularDependency(path));
            }
            let depth = stack.len();
            stack.push((id, key.clone()));
            Ok(ResolutionGuard { depth })
        })
    }

    // Identity shared by every clone of this container
    fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("binding_count", &self.inner.bindings.len())
            .field("scope_count", &self.inner.scopes.len())
            .finish()
    }
}
