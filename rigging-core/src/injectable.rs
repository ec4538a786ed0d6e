// Constructor injection

use crate::{Container, Key, Result};

/// A type the container can construct by resolving its constructor parameters
///
/// This is the designated injection constructor of a type: `dependencies`
/// lists the parameter keys in order and `inject` performs the construction.
///
/// ```
/// use rigging_core::{Container, ContainerBuilder, Injectable, Key, Result};
/// use std::sync::Arc;
///
/// struct Config {
///     retries: u32,
/// }
///
/// struct Client {
///     config: Arc<Config>,
/// }
///
/// impl Injectable for Client {
///     fn dependencies() -> Vec<Key> {
///         vec![Key::of::<Config>()]
///     }
///
///     fn inject(container: &Container) -> Result<Self> {
///         Ok(Client {
///             config: container.get::<Config>()?,
///         })
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.bind::<Config>().to_instance(Arc::new(Config { retries: 3 }));
/// builder.bind::<Client>().to::<Client>();
///
/// let container = builder.build().unwrap();
/// assert_eq!(container.get::<Client>().unwrap().config.retries, 3);
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Keys of the constructor parameters, in order
    fn dependencies() -> Vec<Key> {
        Vec::new()
    }

    /// Construct a new instance, resolving parameters through `container`
    fn inject(container: &Container) -> Result<Self>;
}
