//! Test runner integration.
//!
//! A runner attaches a [`TestModule`] to a test class, builds one
//! [`TestContainer`] per test-class execution and resolves the parameters of
//! every test method against it. [`TestClassRun`] does all of this for a list
//! of [`TestMethod`]s and reports the outcome of each.
//!
//! ```
//! use rigging_testing::{Parameter, TestBinder, TestClassRun, TestMethod, TestModule};
//! use std::sync::Arc;
//!
//! struct GreetingModule;
//!
//! impl TestModule for GreetingModule {
//!     fn configure_test(&self, binder: &mut TestBinder<'_>) {
//!         binder.bind::<String>().to_instance(Arc::new("hello".to_string()));
//!     }
//! }
//!
//! let report = TestClassRun::new(GreetingModule, "GreetingTest")
//!     .method(
//!         TestMethod::new("greets", |args| {
//!             assert_eq!(args.get::<String>(0)?.as_str(), "hello");
//!             Ok(())
//!         })
//!         .param(Parameter::of::<String>()),
//!     )
//!     .run()
//!     .unwrap();
//!
//! assert!(report.is_success());
//! ```

use crate::config::RunnerConfig;
use crate::parameters::{Arguments, MethodSignature, Parameter};
use crate::test_container::TestContainer;
use crate::test_module::{TestModule, configure};
use crate::test_scope::TestScopes;
use rigging_core::{BoxError, ContainerBuilder, Error, Result};
use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, debug_span, info, warn};

/// A test module bound to the test class it configures
#[derive(Clone)]
pub struct AttachedModule {
    module: Arc<dyn TestModule>,
    test_class: String,
}

impl AttachedModule {
    pub fn module(&self) -> &dyn TestModule {
        self.module.as_ref()
    }

    pub fn test_class(&self) -> &str {
        &self.test_class
    }
}

impl fmt::Debug for AttachedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachedModule")
            .field("test_class", &self.test_class)
            .finish()
    }
}

/// Attach `module` to the test class named `test_class`
pub fn attach<M: TestModule + 'static>(module: M, test_class: impl Into<String>) -> AttachedModule {
    AttachedModule {
        module: Arc::new(module),
        test_class: test_class.into(),
    }
}

/// Build the container for one execution of the attached test class
///
/// Every call starts from fresh scopes. Configuration errors, and any error
/// raised while realizing eager singletons, are returned here and abort the
/// execution before a test method runs.
pub fn build_container(attached: &AttachedModule, config: &RunnerConfig) -> Result<TestContainer> {
    if let Some(logging) = &config.logging {
        logging.clone().try_init();
    }

    let span = debug_span!("test_class", test_class = %attached.test_class);
    let _enter = span.enter();

    let scopes = TestScopes::new();
    let mut builder = ContainerBuilder::new();
    builder.validate_dependencies(config.validate_dependencies);
    configure(
        attached.module(),
        &mut builder,
        &scopes,
        &attached.test_class,
        config,
    );

    match builder.build() {
        Ok(container) => {
            debug!(
                binding_count = container.binding_count(),
                "Test container built"
            );
            Ok(TestContainer::new(
                container,
                scopes,
                attached.test_class.clone(),
            ))
        }
        Err(error) => {
            warn!(error = %error, "Test container build failed");
            Err(error)
        }
    }
}

type TestBody = Box<dyn Fn(&Arguments) -> std::result::Result<(), BoxError>>;

/// A test method: its signature plus the body invoked with resolved arguments
pub struct TestMethod {
    signature: MethodSignature,
    body: TestBody,
}

impl TestMethod {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Arguments) -> std::result::Result<(), BoxError> + 'static,
    {
        Self {
            signature: MethodSignature::new(name),
            body: Box::new(body),
        }
    }

    /// Append a parameter to the signature
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.signature = self.signature.param(parameter);
        self
    }

    pub fn name(&self) -> &str {
        self.signature.name()
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }
}

impl fmt::Debug for TestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestMethod")
            .field("signature", &self.signature)
            .finish()
    }
}

/// Result of a single test method invocation
#[derive(Debug)]
pub enum TestOutcome {
    Passed,
    /// The parameters could not be resolved
    ResolutionFailed(Error),
    /// The body returned an error
    Failed(BoxError),
    /// The body panicked
    Panicked(String),
}

impl TestOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "passed"),
            TestOutcome::ResolutionFailed(error) => write!(f, "unresolved parameters: {}", error),
            TestOutcome::Failed(error) => write!(f, "failed: {}", error),
            TestOutcome::Panicked(message) => write!(f, "panicked: {}", message),
        }
    }
}

/// Outcome of one method, by name
#[derive(Debug)]
pub struct MethodReport {
    pub name: String,
    pub outcome: TestOutcome,
}

/// Outcomes of every method of a test-class execution, in run order
#[derive(Debug)]
pub struct TestClassReport {
    pub test_class: String,
    pub methods: Vec<MethodReport>,
}

impl TestClassReport {
    pub fn passed(&self) -> usize {
        self.methods
            .iter()
            .filter(|method| method.outcome.is_passed())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.methods.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// The outcome of the method called `name`
    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.methods
            .iter()
            .find(|method| method.name == name)
            .map(|method| &method.outcome)
    }
}

/// Runs the methods of one test class against a single container
pub struct TestClassRun {
    attached: AttachedModule,
    config: RunnerConfig,
    methods: Vec<TestMethod>,
}

impl TestClassRun {
    pub fn new<M: TestModule + 'static>(module: M, test_class: impl Into<String>) -> Self {
        Self::attached(attach(module, test_class))
    }

    pub fn attached(attached: AttachedModule) -> Self {
        Self {
            attached,
            config: RunnerConfig::default(),
            methods: Vec::new(),
        }
    }

    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a method; methods run in the order they are added
    pub fn method(mut self, method: TestMethod) -> Self {
        self.methods.push(method);
        self
    }

    /// Build the container and run every method
    ///
    /// A failing or panicking method is recorded and the run continues with
    /// the next one. A container build failure is returned before any method
    /// runs.
    pub fn run(self) -> Result<TestClassReport> {
        let container = build_container(&self.attached, &self.config)?;

        let methods = self
            .methods
            .iter()
            .map(|method| MethodReport {
                name: method.name().to_string(),
                outcome: run_method(&container, method),
            })
            .collect::<Vec<_>>();

        container.finish();

        let report = TestClassReport {
            test_class: self.attached.test_class,
            methods,
        };
        info!(
            test_class = %report.test_class,
            passed = report.passed(),
            failed = report.failed(),
            "Test class finished"
        );
        Ok(report)
    }
}

fn run_method(container: &TestContainer, method: &TestMethod) -> TestOutcome {
    let arguments = match container.resolve_parameters(method.signature()) {
        Ok(arguments) => arguments,
        Err(error) => return TestOutcome::ResolutionFailed(error),
    };

    let outcome = match catch_unwind(AssertUnwindSafe(|| (method.body)(&arguments))) {
        Ok(Ok(())) => TestOutcome::Passed,
        Ok(Err(error)) => TestOutcome::Failed(error),
        Err(payload) => TestOutcome::Panicked(panic_message(payload.as_ref())),
    };

    debug!(method = method.name(), outcome = %outcome, "Test method finished");
    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestBinder;
    use crate::TestScope;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static BUILT: AtomicUsize = AtomicUsize::new(0);

    struct Session {
        id: usize,
    }

    struct SessionModule;

    impl TestModule for SessionModule {
        fn configure_test(&self, binder: &mut TestBinder<'_>) {
            binder
                .bind::<Session>()
                .to_constructor(|_| {
                    Ok(Arc::new(Session {
                        id: BUILT.fetch_add(1, Ordering::SeqCst),
                    }))
                })
                .in_scope(TestScope::SINGLETON);
        }
    }

    fn session_method(name: &str) -> TestMethod {
        TestMethod::new(name, |args| {
            args.get::<Session>(0)?;
            Ok(())
        })
        .param(Parameter::of::<Session>())
    }

    #[test]
    fn test_failures_are_isolated_per_method() {
        let report = TestClassRun::new(SessionModule, "SessionTest")
            .method(session_method("first"))
            .method(TestMethod::new("returns_error", |_| Err("no luck".into())))
            .method(TestMethod::new("panics", |_| panic!("kaboom")))
            .method(
                TestMethod::new("unresolved", |_| Ok(()))
                    .param(Parameter::named::<Session>("missing")),
            )
            .method(session_method("last"))
            .run()
            .unwrap();

        assert_eq!(report.test_class, "SessionTest");
        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 3);
        assert!(!report.is_success());
        assert!(matches!(
            report.outcome("returns_error"),
            Some(TestOutcome::Failed(error)) if error.to_string() == "no luck"
        ));
        assert!(matches!(
            report.outcome("panics"),
            Some(TestOutcome::Panicked(message)) if message == "kaboom"
        ));
        assert!(matches!(
            report.outcome("unresolved"),
            Some(TestOutcome::ResolutionFailed(Error::BindingNotFound(_)))
        ));
        assert!(report.outcome("last").is_some_and(TestOutcome::is_passed));
    }

    #[test]
    fn test_singleton_shared_across_methods_of_one_execution() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let record = |name: &str, seen: Arc<parking_lot::Mutex<Vec<usize>>>| {
            TestMethod::new(name, move |args| {
                seen.lock().push(args.get::<Session>(0)?.id);
                Ok(())
            })
            .param(Parameter::of::<Session>())
        };

        let run = || {
            TestClassRun::new(SessionModule, "SessionTest")
                .method(record("a", seen.clone()))
                .method(record("b", seen.clone()))
                .run()
                .unwrap()
        };
        assert!(run().is_success());
        assert!(run().is_success());

        let ids = seen.lock().clone();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[2], ids[3]);
        assert_ne!(ids[1], ids[2]);
    }

    #[test]
    fn test_build_failure_runs_no_methods() {
        struct DuplicateModule;

        impl TestModule for DuplicateModule {
            fn configure_test(&self, binder: &mut TestBinder<'_>) {
                binder.bind::<u8>().to_instance(Arc::new(1));
                binder.bind::<u8>().to_instance(Arc::new(2));
            }
        }

        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        let error = TestClassRun::new(DuplicateModule, "DuplicateTest")
            .method(TestMethod::new("never", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .run()
            .err()
            .unwrap();

        assert!(error.is_configuration());
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_attach_keeps_test_class() {
        let attached = attach(SessionModule, "SessionTest");
        assert_eq!(attached.test_class(), "SessionTest");

        let container = build_container(&attached, &RunnerConfig::default()).unwrap();
        assert_eq!(container.test_class(), "SessionTest");
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "non-string panic payload");
    }
}
