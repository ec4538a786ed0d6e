// Providers behind mock and spy bindings

use crate::mock::{Mockable, Spyable};
use rigging_core::{Container, Key, Provider, Result};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

/// Creates a new mock on every call
///
/// Caching is left to the scope of the binding.
pub struct MockProvider<T: ?Sized> {
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> MockProvider<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Default for MockProvider<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + Mockable> Provider<T> for MockProvider<T> {
    fn get(&self, _: &Container) -> Result<Arc<T>> {
        trace!(type_name = std::any::type_name::<T>(), "Creating mock");
        Ok(T::mock())
    }
}

/// Wraps a freshly constructed real instance in a spy
///
/// The real instance comes from the relay key, which is bound to the real
/// constructor so its dependencies are injected as usual.
pub struct SpyProvider<T: ?Sized> {
    relay: Key,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> SpyProvider<T> {
    pub fn new(relay: Key) -> Self {
        Self {
            relay,
            _marker: PhantomData,
        }
    }

    /// The key resolving the real instance
    pub fn relay(&self) -> &Key {
        &self.relay
    }
}

impl<T: ?Sized + Spyable> Provider<T> for SpyProvider<T> {
    fn get(&self, container: &Container) -> Result<Arc<T>> {
        let instance = container.get_key::<T>(&self.relay)?;
        trace!(relay = %self.relay, "Wrapping real instance in spy");
        Ok(T::spy(instance))
    }

    fn dependencies(&self) -> Vec<Key> {
        vec![self.relay.clone()]
    }
}

/// Wraps the same fixed instance in a new spy on every call
pub struct SpyImmutableInstanceProvider<T: ?Sized> {
    instance: Arc<T>,
}

impl<T: ?Sized> SpyImmutableInstanceProvider<T> {
    pub fn new(instance: Arc<T>) -> Self {
        Self { instance }
    }

    /// The instance every spy delegates to
    pub fn instance(&self) -> &Arc<T> {
        &self.instance
    }
}

impl<T: ?Sized + Spyable> Provider<T> for SpyImmutableInstanceProvider<T> {
    fn get(&self, _: &Container) -> Result<Arc<T>> {
        Ok(T::spy(self.instance.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CallLog;
    use rigging_core::{ContainerBuilder, Error};
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Counter: Send + Sync {
        fn increment(&self);
        fn value(&self) -> usize;
    }

    struct RealCounter(AtomicUsize);

    impl Counter for RealCounter {
        fn increment(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn value(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct NullCounter;

    impl Counter for NullCounter {
        fn increment(&self) {}

        fn value(&self) -> usize {
            0
        }
    }

    struct SpyCounter {
        inner: Arc<dyn Counter>,
        log: CallLog,
    }

    impl Counter for SpyCounter {
        fn increment(&self) {
            self.log.record("increment");
            self.inner.increment();
        }

        fn value(&self) -> usize {
            self.log.record("value");
            self.inner.value()
        }
    }

    impl Mockable for dyn Counter {
        fn mock() -> Arc<Self> {
            Arc::new(NullCounter)
        }
    }

    impl Spyable for dyn Counter {
        fn spy(instance: Arc<Self>) -> Arc<Self> {
            Arc::new(SpyCounter {
                inner: instance,
                log: CallLog::new(),
            })
        }
    }

    fn real() -> Arc<dyn Counter> {
        Arc::new(RealCounter(AtomicUsize::new(0)))
    }

    #[test]
    fn test_mock_provider_creates_new_mocks() {
        let container = ContainerBuilder::new().build().unwrap();
        let provider = MockProvider::<dyn Counter>::new();
        let first = provider.get(&container).unwrap();
        let second = provider.get(&container).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.value(), 0);
    }

    #[test]
    fn test_spy_provider_resolves_relay() {
        let relay = Key::of::<dyn Counter>().relay();
        let mut builder = ContainerBuilder::new();
        builder
            .bind_key::<dyn Counter>(relay.clone())
            .to_constructor(|_| Ok(real()));
        let container = builder.build().unwrap();

        let provider = SpyProvider::<dyn Counter>::new(relay.clone());
        assert_eq!(provider.dependencies(), vec![relay]);

        let spy = provider.get(&container).unwrap();
        spy.increment();
        assert_eq!(spy.value(), 1);
    }

    #[test]
    fn test_spy_provider_without_relay_fails() {
        let container = ContainerBuilder::new().build().unwrap();
        let provider = SpyProvider::<dyn Counter>::new(Key::of::<dyn Counter>().relay());
        assert!(matches!(
            provider.get(&container),
            Err(Error::BindingNotFound(_))
        ));
    }

    #[test]
    fn test_spy_instance_provider_shares_instance() {
        let container = ContainerBuilder::new().build().unwrap();
        let instance = real();
        let provider = SpyImmutableInstanceProvider::new(instance.clone());

        let first = provider.get(&container).unwrap();
        let second = provider.get(&container).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        first.increment();
        second.increment();
        assert_eq!(instance.value(), 2);
        assert!(Arc::ptr_eq(provider.instance(), &instance));
    }
}
