//! Binding keys and qualifiers.
//!
//! A [`Key`] identifies a binding by the type it provides plus an optional
//! [`Qualifier`]. Two bindings of the same type can coexist as long as their
//! qualifiers differ.
//!
//! ```
//! use rigging_core::{Key, Qualifier};
//!
//! let plain = Key::of::<String>();
//! let named = Key::named::<String>("greeting");
//!
//! assert_ne!(plain, named);
//! assert_eq!(named.qualifier(), Some(&Qualifier::Named("greeting".into())));
//! ```

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Extra identity attached to a key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// A user supplied name
    Named(String),
    /// A synthesized token for multi-bindings; `sequence` makes it unique,
    /// `group` tags it for "all of these" lookups
    Unique { group: String, sequence: u64 },
    /// Relay qualifier reaching the real constructor behind a spy binding;
    /// carries the qualifier of the spied key
    Internal(Option<Box<Qualifier>>),
}

impl Qualifier {
    /// Create a named qualifier
    pub fn named(name: impl Into<String>) -> Self {
        Qualifier::Named(name.into())
    }

    /// The multi-binding group this qualifier belongs to, if any
    pub fn group(&self) -> Option<&str> {
        match self {
            Qualifier::Unique { group, .. } => Some(group),
            _ => None,
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Named(name) => write!(f, "@Named(\"{}\")", name),
            Qualifier::Unique { group, sequence } => {
                write!(f, "@Unique(group=\"{}\", id={})", group, sequence)
            }
            Qualifier::Internal(None) => write!(f, "@Internal"),
            Qualifier::Internal(Some(qualifier)) => write!(f, "@Internal({})", qualifier),
        }
    }
}

/// Identifies a binding: the provided type plus an optional qualifier
#[derive(Clone)]
pub struct Key {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Option<Qualifier>,
}

impl Key {
    /// Key for an unqualified type
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            qualifier: None,
        }
    }

    /// Key for a type qualified by name
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::of::<T>().with_qualifier(Qualifier::named(name))
    }

    /// Key for a type with an arbitrary qualifier
    pub fn qualified<T: ?Sized + 'static>(qualifier: Qualifier) -> Self {
        Self::of::<T>().with_qualifier(qualifier)
    }

    /// Replace the qualifier of this key
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    /// The internal relay key for this key, distinct for every qualifier
    pub fn relay(&self) -> Key {
        let qualifier = Qualifier::Internal(self.qualifier.clone().map(Box::new));
        self.clone().with_qualifier(qualifier)
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }

    /// Check whether this key provides values of type `T`
    pub fn is_for<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

// The type name is informational only; identity is the TypeId plus qualifier.
impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("type_name", &self.type_name)
            .field("qualifier", &self.qualifier)
            .finish()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "Key[{} {}]", qualifier, self.type_name),
            None => write!(f, "Key[{}]", self.type_name),
        }
    }
}
