// Error types for the Rigging container

use thiserror::Error;

/// Boxed error raised by user code (constructors, providers, setup logic)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout Rigging
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No binding registered for {0}")]
    BindingNotFound(String),

    #[error("A binding is already configured for {0}")]
    DuplicateBinding(String),

    #[error("Scope {scope} is not bound (used by {key}); bind scopes before scoped bindings")]
    ScopeNotBound { scope: String, key: String },

    #[error("{dependent} depends on {dependency}, which has no binding")]
    MissingDependency { dependent: String, dependency: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Type mismatch: binding for {0} produced a value of another type")]
    TypeMismatch(String),

    #[error("Key {0} does not name the type it is bound as")]
    KeyTypeMismatch(String),

    #[error("Group '{group}' of {type_name} is already used by another multi-binding")]
    GroupCollision { group: String, type_name: String },

    #[error("Dependency injection error: {0}")]
    DependencyInjection(String),

    /// Error raised by user code, reported unchanged
    #[error(transparent)]
    User(BoxError),
}

impl Error {
    /// Wrap an error raised by a constructor or provider
    pub fn user<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::User(error.into())
    }

    /// Check if this error invalidates the whole configuration
    ///
    /// Classification is by variant. Configuration variants are recorded while
    /// bindings are declared or validated. A resolution or user error raised
    /// while eager bindings are realized keeps its own variant, even though it
    /// still aborts the build that triggered it.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::DuplicateBinding(_)
                | Error::ScopeNotBound { .. }
                | Error::MissingDependency { .. }
                | Error::GroupCollision { .. }
                | Error::KeyTypeMismatch(_)
        )
    }

    /// Check if this error was raised by user code
    pub fn is_user(&self) -> bool {
        matches!(self, Error::User(_))
    }
}
