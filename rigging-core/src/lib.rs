// Core library for Rigging
// Binding keys, the binding DSL, scopes, providers and the realized container

pub mod binder;
pub mod container;
pub mod error;
pub mod injectable;
pub mod key;
pub mod logging;
pub mod provider;
pub mod scope;

// Re-export commonly used types
pub use binder::*;
pub use container::*;
pub use error::*;
pub use injectable::*;
pub use key::*;
pub use provider::*;
pub use scope::*;
