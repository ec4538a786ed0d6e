//! Integration tests for eager singletons and configuration failures.

use parking_lot::Mutex;
use rigging::prelude::*;
use std::sync::Arc;

#[derive(Default)]
struct Events(Mutex<Vec<String>>);

impl Events {
    fn push(&self, event: &str) {
        self.0.lock().push(event.to_string());
    }

    fn snapshot(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

struct Warmup;

impl Injectable for Warmup {
    fn dependencies() -> Vec<Key> {
        vec![Key::of::<Events>(), Key::of::<Settings>()]
    }

    fn inject(container: &Container) -> Result<Self> {
        let settings = container.get::<Settings>()?;
        container
            .get::<Events>()?
            .push(&format!("warmup with {}", settings.0));
        Ok(Warmup)
    }
}

struct Cache;

impl Injectable for Cache {
    fn dependencies() -> Vec<Key> {
        vec![Key::of::<Events>()]
    }

    fn inject(container: &Container) -> Result<Self> {
        container.get::<Events>()?.push("cache");
        Ok(Cache)
    }
}

struct Settings(&'static str);

impl Injectable for Settings {
    fn inject(_: &Container) -> Result<Self> {
        Ok(Settings("defaults"))
    }
}

struct EagerModule {
    events: Arc<Events>,
}

impl TestModule for EagerModule {
    fn configure_test(&self, binder: &mut TestBinder<'_>) {
        binder.bind::<Events>().to_instance(self.events.clone());
        binder
            .bind::<Warmup>()
            .to::<Warmup>()
            .in_scope(TestScope::EAGER_SINGLETON);
        binder
            .bind::<Settings>()
            .to::<Settings>()
            .in_scope(TestScope::SINGLETON);
        binder
            .bind::<Cache>()
            .to::<Cache>()
            .in_scope(TestScope::EAGER_SINGLETON);
    }
}

fn recording_method(name: &'static str, events: Arc<Events>) -> TestMethod {
    TestMethod::new(name, move |args| {
        args.get::<Warmup>(0)?;
        events.push(name);
        Ok(())
    })
    .param(Parameter::of::<Warmup>())
}

#[test]
fn test_eager_singletons_built_before_first_method() {
    let events = Arc::new(Events::default());
    let module = EagerModule {
        events: events.clone(),
    };

    let report = TestClassRun::new(module, "EagerTest")
        .method(recording_method("first", events.clone()))
        .method(recording_method("second", events.clone()))
        .run()
        .unwrap();

    assert!(report.is_success());
    assert_eq!(
        events.snapshot(),
        vec!["warmup with defaults", "cache", "first", "second"]
    );
}

#[test]
fn test_eager_singletons_rebuilt_per_execution() {
    let events = Arc::new(Events::default());
    let attached = attach(
        EagerModule {
            events: events.clone(),
        },
        "EagerTest",
    );

    build_container(&attached, &RunnerConfig::default())
        .unwrap()
        .finish();
    assert_eq!(events.snapshot().len(), 2);

    let container = build_container(&attached, &RunnerConfig::default()).unwrap();
    assert_eq!(events.snapshot().len(), 4);

    // Already realized, so resolving does not construct again
    container.inner().get::<Cache>().unwrap();
    assert_eq!(events.snapshot().len(), 4);
    assert_eq!(container.scopes().eager_singleton.cached_count(), 2);
}

#[derive(Debug)]
struct WarmupFailed;

impl std::fmt::Display for WarmupFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "warmup failed")
    }
}

impl std::error::Error for WarmupFailed {}

struct FailingEagerModule;

impl TestModule for FailingEagerModule {
    fn configure_test(&self, binder: &mut TestBinder<'_>) {
        binder
            .bind::<Warmup>()
            .to_constructor(|_| Err(Error::user(WarmupFailed)))
            .in_scope(TestScope::EAGER_SINGLETON);
    }
}

#[test]
fn test_eager_failure_aborts_execution() {
    let events = Arc::new(Events::default());
    let error = TestClassRun::new(FailingEagerModule, "FailingTest")
        .method(recording_method("never", events.clone()))
        .run()
        .err()
        .unwrap();

    assert!(error.is_user());
    assert_eq!(error.to_string(), "warmup failed");
    assert!(events.snapshot().is_empty());
}

struct UnknownScopeModule;

impl TestModule for UnknownScopeModule {
    fn configure_test(&self, binder: &mut TestBinder<'_>) {
        binder
            .bind::<Settings>()
            .to::<Settings>()
            .in_scope(ScopeTag::new("RequestScoped"));
    }
}

struct MissingDependencyModule;

impl TestModule for MissingDependencyModule {
    fn configure_test(&self, binder: &mut TestBinder<'_>) {
        binder.bind::<Cache>().to::<Cache>();
    }
}

#[test]
fn test_configuration_errors_fail_the_build() {
    let error = build_container(
        &attach(UnknownScopeModule, "ScopeTest"),
        &RunnerConfig::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(error, Error::ScopeNotBound { .. }));
    assert!(error.is_configuration());

    let error = build_container(
        &attach(MissingDependencyModule, "DependencyTest"),
        &RunnerConfig::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(error, Error::MissingDependency { .. }));
}

#[test]
fn test_resolution_errors_fail_only_their_method() {
    let config = RunnerConfig::default().validate_dependencies(false);
    let report = TestClassRun::new(MissingDependencyModule, "DependencyTest")
        .config(config)
        .method(
            TestMethod::new("needs_cache", |args| {
                args.get::<Cache>(0)?;
                Ok(())
            })
            .param(Parameter::of::<Cache>()),
        )
        .method(TestMethod::new("needs_nothing", |_| Ok(())))
        .run()
        .unwrap();

    assert!(matches!(
        report.outcome("needs_cache"),
        Some(rigging::rigging_testing::TestOutcome::ResolutionFailed(
            Error::BindingNotFound(_)
        ))
    ));
    assert!(
        report
            .outcome("needs_nothing")
            .is_some_and(|outcome| outcome.is_passed())
    );
}
