// Provider traits and type-erased instances

use crate::{Container, Error, Key, Result};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// A resolved value with its type erased
///
/// The payload is always an `Arc<T>` for the type `T` of the key it was
/// resolved for, which allows unsized types such as `dyn Trait`.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Erase a typed value into an [`Instance`]
pub fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Instance {
    Arc::new(value)
}

/// Recover the typed value stored in an [`Instance`]
pub fn downcast<T: ?Sized + Send + Sync + 'static>(instance: &Instance, key: &Key) -> Result<Arc<T>> {
    let any: &(dyn Any + Send + Sync) = &**instance;
    any.downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(|| Error::TypeMismatch(key.to_string()))
}

/// Produces values of `T` on demand
///
/// How often `get` actually runs is decided by the scope the binding is
/// registered in, never by the provider itself.
pub trait Provider<T: ?Sized>: Send + Sync + 'static {
    /// Produce a value, resolving collaborators through `container`
    fn get(&self, container: &Container) -> Result<Arc<T>>;

    /// Keys this provider resolves, checked when the container is built
    fn dependencies(&self) -> Vec<Key> {
        Vec::new()
    }
}

/// Converts an implementation into the interface type it is bound to
///
/// Every sized type converts into itself. Implementations of trait objects
/// are declared with [`implements!`](crate::implements).
pub trait Upcast<T: ?Sized> {
    fn upcast(self: Arc<Self>) -> Arc<T>;
}

impl<T: Send + Sync + 'static> Upcast<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Declare that implementation types can be bound to a trait object
///
/// ```
/// use rigging_core::{implements, Upcast};
/// use std::sync::Arc;
///
/// trait Parent: Send + Sync {
///     fn value(&self) -> &'static str;
/// }
///
/// struct ChildA;
///
/// impl Parent for ChildA {
///     fn value(&self) -> &'static str {
///         "childA"
///     }
/// }
///
/// implements!(dyn Parent: ChildA);
///
/// let parent = Upcast::<dyn Parent>::upcast(Arc::new(ChildA));
/// assert_eq!(parent.value(), "childA");
/// ```
#[macro_export]
macro_rules! implements {
    ($interface:ty: $($implementation:ty),+ $(,)?) => {
        $(
            impl $crate::Upcast<$interface> for $implementation {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$interface> {
                    self
                }
            }
        )+
    };
}

/// Injectable handle that resolves its key on every `get`
///
/// This is what a constructor or a test method asks for when it needs more
/// than one value, or needs to defer resolution.
pub struct ProviderHandle<T: ?Sized> {
    container: Container,
    key: Key,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> ProviderHandle<T> {
    pub(crate) fn new(container: Container, key: Key) -> Self {
        Self {
            container,
            key,
            _marker: PhantomData,
        }
    }

    /// Resolve the key through the container
    pub fn get(&self) -> Result<Arc<T>> {
        self.container.get_key(&self.key)
    }

    /// The key this handle resolves
    pub fn key(&self) -> &Key {
        &self.key
    }
}

impl<T: ?Sized> Clone for ProviderHandle<T> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for ProviderHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("key", &self.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Shape: Send + Sync {
        fn sides(&self) -> u32;
    }

    struct Square;

    impl Shape for Square {
        fn sides(&self) -> u32 {
            4
        }
    }

    crate::implements!(dyn Shape: Square);

    #[test]
    fn test_erase_and_downcast_trait_object() {
        let shape = Upcast::<dyn Shape>::upcast(Arc::new(Square));
        let instance = erase(shape.clone());
        let restored = downcast::<dyn Shape>(&instance, &Key::of::<dyn Shape>()).unwrap();
        assert!(Arc::ptr_eq(&shape, &restored));
        assert_eq!(restored.sides(), 4);
    }

    #[test]
    fn test_downcast_wrong_type() {
        let instance = erase(Arc::new(5u32));
        let result = downcast::<String>(&instance, &Key::of::<String>());
        assert!(matches!(result, Err(Error::TypeMismatch(_))));
    }

    #[test]
    fn test_sized_upcast_is_identity() {
        let value = Arc::new(String::from("same"));
        let upcast: Arc<String> = value.clone().upcast();
        assert!(Arc::ptr_eq(&value, &upcast));
    }
}
