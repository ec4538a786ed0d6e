//! Test support for Rigging containers.
//!
//! This crate turns a Rigging container into a per-test-class fixture.
//!
//! ## Features
//!
//! - **TestModule** - Binding declarations attached to a test class
//! - **TestScope** - Singletons that live for one test-class execution
//! - **Mocks and spies** - `bind_mock`, `bind_spy` and `bind_spy_instance`
//! - **Multi-bindings** - `bind_many` with "all of these" resolution
//! - **Runner** - Build a container, resolve method parameters, report outcomes
//!
//! ## Quick Start
//!
//! ```
//! use rigging_core::{Container, Injectable, Result};
//! use rigging_testing::*;
//! use std::sync::Arc;
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! struct FixedClock;
//!
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 {
//!         42
//!     }
//! }
//!
//! impl Mockable for dyn Clock {
//!     fn mock() -> Arc<Self> {
//!         Arc::new(FixedClock)
//!     }
//! }
//!
//! struct Billing {
//!     clock: Arc<dyn Clock>,
//! }
//!
//! impl Injectable for Billing {
//!     fn inject(container: &Container) -> Result<Self> {
//!         Ok(Billing {
//!             clock: container.get::<dyn Clock>()?,
//!         })
//!     }
//! }
//!
//! struct BillingModule;
//!
//! impl TestModule for BillingModule {
//!     fn configure_test(&self, binder: &mut TestBinder<'_>) {
//!         binder.bind_mock::<dyn Clock>().in_scope(TestScope::SINGLETON);
//!         binder.bind::<Billing>().to::<Billing>();
//!     }
//! }
//!
//! let attached = attach(BillingModule, "BillingTest");
//! let container = build_container(&attached, &RunnerConfig::default()).unwrap();
//!
//! let arguments = container
//!     .resolve_parameters(&MethodSignature::new("charges").param(Parameter::of::<Billing>()))
//!     .unwrap();
//! assert_eq!(arguments.get::<Billing>(0).unwrap().clock.now(), 42);
//!
//! container.finish();
//! ```

mod config;
mod mock;
mod parameters;
mod providers;
mod qualifier;
mod runner;
mod test_container;
mod test_module;
mod test_scope;

pub use config::RunnerConfig;
pub use mock::{Call, CallLog, Mockable, Spyable};
pub use parameters::{Arguments, MethodSignature, Parameter};
pub use providers::{MockProvider, SpyImmutableInstanceProvider, SpyProvider};
pub use qualifier::{DEFAULT_GROUP, UniqueQualifiers};
pub use runner::{
    AttachedModule, MethodReport, TestClassReport, TestClassRun, TestMethod, TestOutcome, attach,
    build_container,
};
pub use test_container::TestContainer;
pub use test_module::{ManyBindingBuilder, TestBinder, TestModule, configure};
pub use test_scope::{TestScope, TestScopes};
