//! Scopes control how often a binding's provider actually runs.
//!
//! A binding without a scope calls its provider on every resolution. A scoped
//! binding hands its provider to the [`Scope`] as a factory, and the scope
//! decides whether to call it or serve a cached value.
//!
//! Bindings refer to scopes through a [`ScopeTag`]; the scope instance behind
//! a tag is registered with
//! [`ContainerBuilder::bind_scope`](crate::ContainerBuilder::bind_scope), so
//! every container gets its own scope state.

use crate::{Instance, Key, Result};
use std::fmt;

/// Marker naming a scope, attached to bindings with `in_scope`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeTag(&'static str);

impl ScopeTag {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ScopeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Lifetime policy for scoped bindings
pub trait Scope: Send + Sync {
    /// Human-readable scope name
    fn name(&self) -> &str;

    /// Return the instance for `key`, calling `factory` when none is cached
    ///
    /// Implementations must not hold internal locks while `factory` runs,
    /// since it may resolve other keys in the same scope.
    fn resolve(&self, key: &Key, factory: &dyn Fn() -> Result<Instance>) -> Result<Instance>;

    /// Called when a new execution starts using this scope
    fn enter(&self) {}

    /// Called when the execution ends; cached instances are dropped
    fn exit(&self) {}

    /// Whether bindings in this scope are realized when the container is built
    fn is_eager(&self) -> bool {
        false
    }
}
