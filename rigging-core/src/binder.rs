//! Fluent binding API and container builder.
//!
//! ```
//! use rigging_core::{implements, ContainerBuilder, Container, Injectable, Result};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English;
//!
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         "hello".into()
//!     }
//! }
//!
//! impl Injectable for English {
//!     fn inject(_: &Container) -> Result<Self> {
//!         Ok(English)
//!     }
//! }
//!
//! implements!(dyn Greeter: English);
//!
//! let mut builder = ContainerBuilder::new();
//! builder.bind::<dyn Greeter>().named("english").to::<English>();
//!
//! let container = builder.build().unwrap();
//! let greeter = container.get_named::<dyn Greeter>("english").unwrap();
//! assert_eq!(greeter.greet(), "hello");
//! ```

use crate::container::Container;
use crate::logging::{debug, trace, warn};
use crate::{
    Error, Injectable, Instance, Key, Provider, Qualifier, Result, Scope, ScopeTag, Upcast, erase,
};
use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// How a binding produces its values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSource {
    /// Constructed through an injection constructor or factory function
    Constructor,
    /// Produced by a [`Provider`]
    Provider,
    /// A fixed instance
    Instance,
}

pub(crate) trait ErasedProvider: Send + Sync {
    fn provide(&self, container: &Container) -> Result<Instance>;
}

struct Typed<T: ?Sized, P> {
    provider: P,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T, P> ErasedProvider for Typed<T, P>
where
    T: ?Sized + Send + Sync + 'static,
    P: Provider<T>,
{
    fn provide(&self, container: &Container) -> Result<Instance> {
        self.provider.get(container).map(erase)
    }
}

struct InstanceProvider<T: ?Sized> {
    instance: Arc<T>,
}

impl<T: ?Sized + Send + Sync + 'static> Provider<T> for InstanceProvider<T> {
    fn get(&self, _: &Container) -> Result<Arc<T>> {
        Ok(self.instance.clone())
    }
}

struct ConstructorProvider<T: ?Sized, I> {
    _marker: PhantomData<fn() -> (Arc<T>, I)>,
}

impl<T, I> Provider<T> for ConstructorProvider<T, I>
where
    T: ?Sized + Send + Sync + 'static,
    I: Injectable + Upcast<T>,
{
    fn get(&self, container: &Container) -> Result<Arc<T>> {
        I::inject(container).map(|value| <I as Upcast<T>>::upcast(Arc::new(value)))
    }

    fn dependencies(&self) -> Vec<Key> {
        I::dependencies()
    }
}

struct FnProvider<F> {
    constructor: F,
}

impl<T, F> Provider<T> for FnProvider<F>
where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&Container) -> Result<Arc<T>> + Send + Sync + 'static,
{
    fn get(&self, container: &Container) -> Result<Arc<T>> {
        (self.constructor)(container)
    }
}

// The provider itself is injected on each provision, like any unscoped type.
struct InjectedProvider<T: ?Sized, P> {
    _marker: PhantomData<fn() -> (Arc<T>, P)>,
}

impl<T, P> Provider<T> for InjectedProvider<T, P>
where
    T: ?Sized + Send + Sync + 'static,
    P: Provider<T> + Injectable,
{
    fn get(&self, container: &Container) -> Result<Arc<T>> {
        <P as Injectable>::inject(container)?.get(container)
    }

    fn dependencies(&self) -> Vec<Key> {
        <P as Injectable>::dependencies()
    }
}

pub(crate) struct Binding {
    pub(crate) key: Key,
    pub(crate) provider: Arc<dyn ErasedProvider>,
    pub(crate) scope: Option<ScopeTag>,
    pub(crate) dependencies: Vec<Key>,
    pub(crate) source: BindingSource,
}

/// Collects bindings and scopes, then realizes them into a [`Container`]
pub struct ContainerBuilder {
    bindings: Vec<Binding>,
    index: HashMap<Key, usize>,
    groups: HashMap<(TypeId, String), Vec<Key>>,
    scopes: HashMap<ScopeTag, Arc<dyn Scope>>,
    errors: Vec<Error>,
    validate_dependencies: bool,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        debug!("Creating new container builder");
        Self {
            bindings: Vec::new(),
            index: HashMap::new(),
            groups: HashMap::new(),
            scopes: HashMap::new(),
            errors: Vec::new(),
            validate_dependencies: true,
        }
    }

    /// Enable or disable the check that every dependency key is bound
    pub fn validate_dependencies(&mut self, enable: bool) -> &mut Self {
        self.validate_dependencies = enable;
        self
    }

    /// Register the scope instance behind a tag
    pub fn bind_scope(&mut self, tag: ScopeTag, scope: Arc<dyn Scope>) -> &mut Self {
        debug!(scope = tag.name(), "Scope bound");
        self.scopes.insert(tag, scope);
        self
    }

    /// Check if a scope is registered for `tag`
    pub fn has_scope(&self, tag: ScopeTag) -> bool {
        self.scopes.contains_key(&tag)
    }

    /// Start a binding for type `T`
    pub fn bind<T: ?Sized + Send + Sync + 'static>(&mut self) -> LinkedBindingBuilder<'_, T> {
        LinkedBindingBuilder {
            builder: self,
            key: Key::of::<T>(),
            _marker: PhantomData,
        }
    }

    /// Start a binding for an explicit key
    ///
    /// The key must be for type `T`; a key for another type is recorded as a
    /// configuration error when a target is chosen.
    pub fn bind_key<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        key: Key,
    ) -> LinkedBindingBuilder<'_, T> {
        LinkedBindingBuilder {
            builder: self,
            key,
            _marker: PhantomData,
        }
    }

    /// Check if a binding exists for `key`
    pub fn contains(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    /// Keys bound for `T` under a multi-binding group
    pub fn keys_in_group<T: ?Sized + 'static>(&self, group: &str) -> Vec<Key> {
        self.groups
            .get(&(TypeId::of::<T>(), group.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of bindings declared so far
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Record a configuration error, reported by [`build`](Self::build)
    pub fn add_error(&mut self, error: Error) {
        warn!(error = %error, "Configuration error recorded");
        self.errors.push(error);
    }

    fn add_binding(
        &mut self,
        key: Key,
        provider: Arc<dyn ErasedProvider>,
        dependencies: Vec<Key>,
        source: BindingSource,
    ) -> Option<usize> {
        if self.index.contains_key(&key) {
            self.add_error(Error::DuplicateBinding(key.to_string()));
            return None;
        }

        if let Some(group) = key.qualifier().and_then(Qualifier::group) {
            self.groups
                .entry((key.type_id(), group.to_string()))
                .or_default()
                .push(key.clone());
        }

        trace!(key = %key, source = ?source, "Binding registered");

        let position = self.bindings.len();
        self.index.insert(key.clone(), position);
        self.bindings.push(Binding {
            key,
            provider,
            scope: None,
            dependencies,
            source,
        });
        Some(position)
    }

    fn set_scope(&mut self, position: usize, tag: ScopeTag) {
        if !self.scopes.contains_key(&tag) {
            let key = self.bindings[position].key.to_string();
            self.add_error(Error::ScopeNotBound {
                scope: tag.to_string(),
                key,
            });
            return;
        }
        let binding = &mut self.bindings[position];
        trace!(key = %binding.key, scope = tag.name(), "Binding scoped");
        binding.scope = Some(tag);
    }

    /// Validate the bindings and realize the container
    ///
    /// Fails with the first configuration error recorded while binding, or a
    /// missing dependency. On success every scope has been entered and every
    /// binding in an eager scope has been constructed, in declaration order.
    /// Errors raised by eager construction are returned unchanged.
    pub fn build(mut self) -> Result<Container> {
        if !self.errors.is_empty() {
            debug!(
                error_count = self.errors.len(),
                "Container build failed with configuration errors"
            );
            return Err(self.errors.remove(0));
        }

        if self.validate_dependencies {
            for binding in &self.bindings {
                if let Some(missing) = binding
                    .dependencies
                    .iter()
                    .find(|dependency| !self.index.contains_key(dependency))
                {
                    return Err(Error::MissingDependency {
                        dependent: binding.key.to_string(),
                        dependency: missing.to_string(),
                    });
                }
            }
        }

        let eager: Vec<Key> = self
            .bindings
            .iter()
            .filter(|binding| {
                binding
                    .scope
                    .and_then(|tag| self.scopes.get(&tag))
                    .is_some_and(|scope| scope.is_eager())
            })
            .map(|binding| binding.key.clone())
            .collect();

        let binding_count = self.bindings.len();
        let container = Container::from_parts(self.bindings, self.groups, self.scopes);
        container.enter_scopes();

        for key in &eager {
            debug!(key = %key, "Realizing eager binding");
            if let Err(error) = container.resolve_instance(key) {
                warn!(key = %key, error = %error, "Eager realization failed");
                container.exit_scopes();
                return Err(error);
            }
        }

        debug!(
            binding_count,
            eager_count = eager.len(),
            "Container built"
        );
        Ok(container)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Binding in progress: choose a qualifier, then a target
#[must_use = "a binding needs a target such as `to`, `to_provider` or `to_instance`"]
pub struct LinkedBindingBuilder<'a, T: ?Sized> {
    builder: &'a mut ContainerBuilder,
    key: Key,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<'a, T: ?Sized + Send + Sync + 'static> LinkedBindingBuilder<'a, T> {
    /// Qualify the binding with a name
    pub fn named(self, name: impl Into<String>) -> Self {
        self.annotated_with(Qualifier::named(name))
    }

    /// Qualify the binding with an arbitrary qualifier
    pub fn annotated_with(mut self, qualifier: Qualifier) -> Self {
        self.key = self.key.with_qualifier(qualifier);
        self
    }

    /// The key this binding will register
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Bind to an implementation constructed through its injection constructor
    pub fn to<I>(self) -> ScopedBindingBuilder<'a>
    where
        I: Injectable + Upcast<T>,
    {
        let provider: ConstructorProvider<T, I> = ConstructorProvider {
            _marker: PhantomData,
        };
        let dependencies = I::dependencies();
        self.finish(provider, dependencies, BindingSource::Constructor)
    }

    /// Bind to an explicit factory function
    pub fn to_constructor<F>(self, constructor: F) -> ScopedBindingBuilder<'a>
    where
        F: Fn(&Container) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        self.finish(
            FnProvider { constructor },
            Vec::new(),
            BindingSource::Constructor,
        )
    }

    /// Bind to a provider instance
    pub fn to_provider<P>(self, provider: P) -> ScopedBindingBuilder<'a>
    where
        P: Provider<T>,
    {
        let dependencies = provider.dependencies();
        self.finish(provider, dependencies, BindingSource::Provider)
    }

    /// Bind to a provider type, itself constructed through injection
    pub fn to_provider_type<P>(self) -> ScopedBindingBuilder<'a>
    where
        P: Provider<T> + Injectable,
    {
        let provider: InjectedProvider<T, P> = InjectedProvider {
            _marker: PhantomData,
        };
        let dependencies = <P as Injectable>::dependencies();
        self.finish(provider, dependencies, BindingSource::Provider)
    }

    /// Bind to a fixed instance; instance bindings are never scoped
    pub fn to_instance(self, instance: Arc<T>) {
        let _ = self.finish(
            InstanceProvider { instance },
            Vec::new(),
            BindingSource::Instance,
        );
    }

    fn finish<P>(
        self,
        provider: P,
        dependencies: Vec<Key>,
        source: BindingSource,
    ) -> ScopedBindingBuilder<'a>
    where
        P: Provider<T>,
    {
        let builder = self.builder;
        if !self.key.is_for::<T>() {
            builder.add_error(Error::KeyTypeMismatch(self.key.to_string()));
            return ScopedBindingBuilder {
                builder,
                position: None,
            };
        }

        let typed: Typed<T, P> = Typed {
            provider,
            _marker: PhantomData,
        };
        let position = builder.add_binding(self.key, Arc::new(typed), dependencies, source);
        ScopedBindingBuilder { builder, position }
    }
}

/// Registered binding whose scope can still be chosen
pub struct ScopedBindingBuilder<'a> {
    builder: &'a mut ContainerBuilder,
    position: Option<usize>,
}

impl ScopedBindingBuilder<'_> {
    /// Place the binding in a scope; the scope must already be bound
    pub fn in_scope(self, tag: ScopeTag) {
        if let Some(position) = self.position {
            self.builder.set_scope(position, tag);
        }
    }
}
