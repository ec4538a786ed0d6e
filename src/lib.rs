// Rigging - typed dependency injection for Rust tests
//
// This library provides a binding container with keys, qualifiers and scopes,
// plus per-test-class containers with mocks, spies and multi-bindings.

// Re-export core functionality
pub use rigging_core::*;

// Re-export optional crates
#[cfg(feature = "testing")]
pub use rigging_testing;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Container,
        ContainerBuilder,
        Error,
        Injectable,
        Key,
        Provider,
        ProviderHandle,
        Qualifier,
        Result,
        Scope,
        ScopeTag,
        Upcast,
        implements,
    };

    #[cfg(feature = "testing")]
    pub use rigging_testing::{
        Arguments,
        CallLog,
        MethodSignature,
        Mockable,
        Parameter,
        RunnerConfig,
        Spyable,
        TestBinder,
        TestClassRun,
        TestMethod,
        TestModule,
        TestScope,
        attach,
        build_container,
    };
}
