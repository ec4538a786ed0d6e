//! Test modules and the test binding DSL.
//!
//! A [`TestModule`] declares the bindings a test class needs. On top of the
//! ordinary binder entry points, [`TestBinder`] can bind mocks, spies and
//! multi-bindings that are later resolved together by group.
//!
//! ```
//! use rigging_core::ContainerBuilder;
//! use rigging_testing::{configure, Mockable, RunnerConfig, TestBinder, TestModule, TestScope, TestScopes};
//! use std::sync::Arc;
//!
//! trait Mailer: Send + Sync {
//!     fn send(&self, to: &str) -> bool;
//! }
//!
//! struct NoopMailer;
//!
//! impl Mailer for NoopMailer {
//!     fn send(&self, _: &str) -> bool {
//!         true
//!     }
//! }
//!
//! impl Mockable for dyn Mailer {
//!     fn mock() -> Arc<Self> {
//!         Arc::new(NoopMailer)
//!     }
//! }
//!
//! struct SignupModule;
//!
//! impl TestModule for SignupModule {
//!     fn configure_test(&self, binder: &mut TestBinder<'_>) {
//!         binder.bind_mock::<dyn Mailer>().in_scope(TestScope::SINGLETON);
//!     }
//! }
//!
//! let scopes = TestScopes::new();
//! let mut builder = ContainerBuilder::new();
//! configure(&SignupModule, &mut builder, &scopes, "SignupTest", &RunnerConfig::default());
//!
//! let container = builder.build().unwrap();
//! let mailer = container.get::<dyn Mailer>().unwrap();
//! assert!(mailer.send("someone@example.com"));
//! assert!(Arc::ptr_eq(&mailer, &container.get::<dyn Mailer>().unwrap()));
//! ```

use crate::config::RunnerConfig;
use crate::mock::{Mockable, Spyable};
use crate::providers::{MockProvider, SpyImmutableInstanceProvider, SpyProvider};
use crate::qualifier::{DEFAULT_GROUP, UniqueQualifiers};
use crate::test_scope::{TestScope, TestScopes};
use rigging_core::{
    Container, ContainerBuilder, Error, Injectable, Key, LinkedBindingBuilder, Result,
    ScopedBindingBuilder, Upcast,
};
use std::any::TypeId;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Binding declarations for a test class
pub trait TestModule: Send + Sync {
    /// Declare the bindings through `binder`
    fn configure_test(&self, binder: &mut TestBinder<'_>);
}

/// Register the test scopes with `builder`, then let `module` declare its
/// bindings
///
/// Scopes come first so that every scoped binding the module declares can
/// refer to them.
pub fn configure(
    module: &dyn TestModule,
    builder: &mut ContainerBuilder,
    scopes: &TestScopes,
    test_class: &str,
    config: &RunnerConfig,
) {
    scopes.bind(builder);

    let mut binder = TestBinder::new(builder, test_class).strict_groups(config.strict_groups);
    module.configure_test(&mut binder);

    debug!(
        test_class,
        binding_count = binder.builder.binding_count(),
        "Test module configured"
    );
}

/// Binder handed to [`TestModule::configure_test`]
pub struct TestBinder<'a> {
    builder: &'a mut ContainerBuilder,
    qualifiers: UniqueQualifiers,
    test_class: String,
    strict_groups: bool,
    claimed_groups: HashSet<(TypeId, String)>,
}

impl<'a> TestBinder<'a> {
    pub fn new(builder: &'a mut ContainerBuilder, test_class: impl Into<String>) -> Self {
        Self {
            builder,
            qualifiers: UniqueQualifiers::new(),
            test_class: test_class.into(),
            strict_groups: false,
            claimed_groups: HashSet::new(),
        }
    }

    /// Reject multi-bindings that would merge into a group they did not create
    pub fn strict_groups(mut self, enable: bool) -> Self {
        self.strict_groups = enable;
        self
    }

    /// Name of the test class the module is attached to
    pub fn test_class(&self) -> &str {
        &self.test_class
    }

    /// The underlying container builder
    pub fn builder(&mut self) -> &mut ContainerBuilder {
        &mut *self.builder
    }

    /// Start an ordinary binding for `T`
    pub fn bind<T: ?Sized + Send + Sync + 'static>(&mut self) -> LinkedBindingBuilder<'_, T> {
        self.builder.bind::<T>()
    }

    /// Start an ordinary binding for `T` qualified by name
    pub fn bind_named<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        name: impl Into<String>,
    ) -> LinkedBindingBuilder<'_, T> {
        self.builder.bind::<T>().named(name)
    }

    /// Bind `T` to a new mock on every provision
    pub fn bind_mock<T: ?Sized + Mockable>(&mut self) -> ScopedBindingBuilder<'_> {
        self.bind_mock_key::<T>(Key::of::<T>())
    }

    /// Bind a named `T` to a new mock on every provision
    pub fn bind_named_mock<T: ?Sized + Mockable>(
        &mut self,
        name: impl Into<String>,
    ) -> ScopedBindingBuilder<'_> {
        self.bind_mock_key::<T>(Key::named::<T>(name))
    }

    fn bind_mock_key<T: ?Sized + Mockable>(&mut self, key: Key) -> ScopedBindingBuilder<'_> {
        debug!(key = %key, test_class = %self.test_class, "Binding mock");
        self.builder
            .bind_key::<T>(key)
            .to_provider(MockProvider::<T>::new())
    }

    /// Bind `T` to a spy around a real `T` built by its injection constructor
    pub fn bind_spy<T: Spyable + Injectable>(&mut self) -> ScopedBindingBuilder<'_> {
        self.bind_spy_as::<T, T>()
    }

    /// Named form of [`bind_spy`](Self::bind_spy)
    pub fn bind_named_spy<T: Spyable + Injectable>(
        &mut self,
        name: impl Into<String>,
    ) -> ScopedBindingBuilder<'_> {
        self.bind_named_spy_as::<T, T>(name)
    }

    /// Bind interface `T` to a spy around the real implementation `I`
    pub fn bind_spy_as<T, I>(&mut self) -> ScopedBindingBuilder<'_>
    where
        T: ?Sized + Spyable,
        I: Injectable + Upcast<T>,
    {
        let key = Key::of::<T>();
        self.builder.bind_key::<T>(key.relay()).to::<I>();
        self.bind_spy_key::<T>(key)
    }

    /// Named form of [`bind_spy_as`](Self::bind_spy_as)
    pub fn bind_named_spy_as<T, I>(&mut self, name: impl Into<String>) -> ScopedBindingBuilder<'_>
    where
        T: ?Sized + Spyable,
        I: Injectable + Upcast<T>,
    {
        let key = Key::named::<T>(name);
        self.builder.bind_key::<T>(key.relay()).to::<I>();
        self.bind_spy_key::<T>(key)
    }

    /// Bind `T` to a spy around a real instance made by `constructor`
    pub fn bind_spy_with<T, F>(&mut self, constructor: F) -> ScopedBindingBuilder<'_>
    where
        T: ?Sized + Spyable,
        F: Fn(&Container) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        let key = Key::of::<T>();
        self.builder
            .bind_key::<T>(key.relay())
            .to_constructor(constructor);
        self.bind_spy_key::<T>(key)
    }

    /// Named form of [`bind_spy_with`](Self::bind_spy_with)
    pub fn bind_named_spy_with<T, F>(
        &mut self,
        name: impl Into<String>,
        constructor: F,
    ) -> ScopedBindingBuilder<'_>
    where
        T: ?Sized + Spyable,
        F: Fn(&Container) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        let key = Key::named::<T>(name);
        self.builder
            .bind_key::<T>(key.relay())
            .to_constructor(constructor);
        self.bind_spy_key::<T>(key)
    }

    // The relay stays unscoped: every spy provision constructs a new real
    // instance unless the spy binding itself is scoped.
    fn bind_spy_key<T: ?Sized + Spyable>(&mut self, key: Key) -> ScopedBindingBuilder<'_> {
        debug!(key = %key, test_class = %self.test_class, "Binding spy");
        let relay = key.relay();
        self.builder
            .bind_key::<T>(key)
            .to_provider(SpyProvider::<T>::new(relay))
    }

    /// Bind `T` to spies that all delegate to `instance`
    pub fn bind_spy_instance<T: ?Sized + Spyable>(
        &mut self,
        instance: Arc<T>,
    ) -> ScopedBindingBuilder<'_> {
        self.bind_spy_instance_key(Key::of::<T>(), instance)
    }

    /// Named form of [`bind_spy_instance`](Self::bind_spy_instance)
    pub fn bind_named_spy_instance<T: ?Sized + Spyable>(
        &mut self,
        instance: Arc<T>,
        name: impl Into<String>,
    ) -> ScopedBindingBuilder<'_> {
        self.bind_spy_instance_key(Key::named::<T>(name), instance)
    }

    fn bind_spy_instance_key<T: ?Sized + Spyable>(
        &mut self,
        key: Key,
        instance: Arc<T>,
    ) -> ScopedBindingBuilder<'_> {
        debug!(key = %key, test_class = %self.test_class, "Binding spy instance");
        self.builder
            .bind_key::<T>(key)
            .to_provider(SpyImmutableInstanceProvider::new(instance))
    }

    /// Bind every instance into the default group of `T`
    ///
    /// The instances are shared by every test of the class, so they should
    /// be stateless.
    pub fn bind_many_instances<T, I>(&mut self, instances: I)
    where
        T: ?Sized + Send + Sync + 'static,
        I: IntoIterator<Item = Arc<T>>,
    {
        self.bind_many_instances_in::<T, I>(DEFAULT_GROUP, false, instances);
    }

    /// Bind every instance into the group `name` of `T`
    pub fn bind_many_named_instances<T, I>(&mut self, name: &str, instances: I)
    where
        T: ?Sized + Send + Sync + 'static,
        I: IntoIterator<Item = Arc<T>>,
    {
        self.bind_many_instances_in::<T, I>(name, true, instances);
    }

    fn bind_many_instances_in<T, I>(&mut self, group: &str, explicit: bool, instances: I)
    where
        T: ?Sized + Send + Sync + 'static,
        I: IntoIterator<Item = Arc<T>>,
    {
        self.claim_group::<T>(group, explicit);
        for instance in instances {
            let qualifier = self.qualifiers.create(group);
            self.builder
                .bind::<T>()
                .annotated_with(qualifier)
                .to_instance(instance);
        }
    }

    /// Bind implementations of `T` into its default group, one singleton each
    ///
    /// ```ignore
    /// binder.bind_many::<dyn Parent>().to::<ChildA>().to::<ChildB>();
    /// ```
    pub fn bind_many<T: ?Sized + Send + Sync + 'static>(&mut self) -> ManyBindingBuilder<'_, 'a, T> {
        self.claim_group::<T>(DEFAULT_GROUP, false);
        ManyBindingBuilder::new(self, DEFAULT_GROUP)
    }

    /// Bind implementations of `T` into the group `name`, one singleton each
    pub fn bind_many_named<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        name: &str,
    ) -> ManyBindingBuilder<'_, 'a, T> {
        self.claim_group::<T>(name, true);
        ManyBindingBuilder::new(self, name)
    }

    fn claim_group<T: ?Sized + 'static>(&mut self, group: &str, explicit: bool) {
        let type_name = std::any::type_name::<T>();
        let newly_claimed = self
            .claimed_groups
            .insert((TypeId::of::<T>(), group.to_string()));
        let names_default = explicit && group == DEFAULT_GROUP;

        if self.strict_groups && (names_default || !newly_claimed) {
            self.builder.add_error(Error::GroupCollision {
                group: group.to_string(),
                type_name: type_name.to_string(),
            });
        } else if names_default {
            warn!(
                type_name,
                test_class = %self.test_class,
                "Named multi-binding uses the default group and merges with unnamed bindings"
            );
        }
    }
}

/// Adds implementations to one multi-binding group
pub struct ManyBindingBuilder<'b, 'a, T: ?Sized> {
    binder: &'b mut TestBinder<'a>,
    group: String,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<'b, 'a, T: ?Sized + Send + Sync + 'static> ManyBindingBuilder<'b, 'a, T> {
    fn new(binder: &'b mut TestBinder<'a>, group: &str) -> Self {
        Self {
            binder,
            group: group.to_string(),
            _marker: PhantomData,
        }
    }

    /// Add implementation `I`, singleton scoped under a fresh qualifier
    pub fn to<I: Injectable + Upcast<T>>(self) -> Self {
        let qualifier = self.binder.qualifiers.create(&self.group);
        self.binder
            .builder
            .bind::<T>()
            .annotated_with(qualifier)
            .to::<I>()
            .in_scope(TestScope::SINGLETON);
        self
    }

    /// The group the implementations are added to
    pub fn group(&self) -> &str {
        &self.group
    }
}
