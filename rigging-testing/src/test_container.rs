// Container for one test-class execution

use crate::parameters::{Argument, Arguments, MethodSignature, Parameter};
use crate::test_scope::TestScopes;
use rigging_core::{Container, Error, Result};
use tracing::{debug, trace};

/// The realized container of one test-class execution
///
/// Dropping it, or calling [`finish`](Self::finish), exits the test scopes so
/// singletons cached for this execution are released.
pub struct TestContainer {
    container: Container,
    scopes: TestScopes,
    test_class: String,
    finished: bool,
}

impl TestContainer {
    pub(crate) fn new(container: Container, scopes: TestScopes, test_class: String) -> Self {
        Self {
            container,
            scopes,
            test_class,
            finished: false,
        }
    }

    /// Get the underlying container
    pub fn inner(&self) -> &Container {
        &self.container
    }

    pub fn scopes(&self) -> &TestScopes {
        &self.scopes
    }

    pub fn test_class(&self) -> &str {
        &self.test_class
    }

    /// Resolve every parameter of `signature`, in order
    ///
    /// Any parameter that cannot be resolved fails this invocation only; the
    /// container and its cached singletons are unaffected.
    pub fn resolve_parameters(&self, signature: &MethodSignature) -> Result<Arguments> {
        trace!(
            test_class = %self.test_class,
            method = signature.name(),
            "Resolving test method parameters"
        );

        let values = signature
            .parameters()
            .iter()
            .map(|parameter| self.resolve_parameter(parameter))
            .collect::<Result<Vec<_>>>()
            .inspect_err(|error| {
                debug!(
                    test_class = %self.test_class,
                    method = signature.name(),
                    error = %error,
                    "Parameter resolution failed"
                );
            })?;

        Ok(Arguments::new(self.container.clone(), values))
    }

    fn resolve_parameter(&self, parameter: &Parameter) -> Result<Argument> {
        match parameter {
            Parameter::Single(key) => {
                let instance = self.container.resolve_instance(key)?;
                Ok(Argument::Single(key.clone(), instance))
            }
            Parameter::All { type_id, group, .. } => self
                .container
                .keys_in_group_of(*type_id, group)
                .into_iter()
                .map(|key| {
                    let instance = self.container.resolve_instance(&key)?;
                    Ok((key, instance))
                })
                .collect::<Result<Vec<_>>>()
                .map(Argument::All),
            Parameter::Provider(key) => {
                if !self.container.contains(key) {
                    return Err(Error::BindingNotFound(key.to_string()));
                }
                Ok(Argument::Provider(key.clone()))
            }
        }
    }

    /// End the execution, discarding every cached singleton
    pub fn finish(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.container.exit_scopes();
        debug!(test_class = %self.test_class, "Test container finished");
    }
}

impl Drop for TestContainer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for TestContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContainer")
            .field("test_class", &self.test_class)
            .field("container", &self.container)
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_GROUP, TestScope, UniqueQualifiers};
    use rigging_core::{ContainerBuilder, Key};
    use std::sync::Arc;

    fn test_container() -> TestContainer {
        let scopes = TestScopes::new();
        let mut builder = ContainerBuilder::new();
        scopes.bind(&mut builder);

        let qualifiers = UniqueQualifiers::new();
        builder
            .bind::<String>()
            .to_constructor(|_| Ok(Arc::new("configured".to_string())))
            .in_scope(TestScope::SINGLETON);
        for value in [1u32, 2, 3] {
            builder
                .bind::<u32>()
                .annotated_with(qualifiers.create(DEFAULT_GROUP))
                .to_instance(Arc::new(value));
        }

        let container = builder.build().unwrap();
        TestContainer::new(container, scopes, "ContainerTest".to_string())
    }

    #[test]
    fn test_resolve_each_parameter_kind() {
        let container = test_container();
        let signature = MethodSignature::new("uses_everything")
            .param(Parameter::of::<String>())
            .param(Parameter::all::<u32>())
            .param(Parameter::provider::<String>());

        let arguments = container.resolve_parameters(&signature).unwrap();
        assert_eq!(arguments.len(), 3);
        assert_eq!(arguments.get::<String>(0).unwrap().as_str(), "configured");

        let mut numbers: Vec<u32> = arguments.all::<u32>(1).unwrap().iter().map(|n| **n).collect();
        numbers.sort();
        assert_eq!(numbers, vec![1, 2, 3]);

        let provider = arguments.provider::<String>(2).unwrap();
        assert!(Arc::ptr_eq(
            &provider.get().unwrap(),
            &arguments.get::<String>(0).unwrap()
        ));
    }

    #[test]
    fn test_unresolvable_parameter_fails_invocation_only() {
        let container = test_container();
        let broken = MethodSignature::new("broken").param(Parameter::named::<String>("missing"));
        let error = container.resolve_parameters(&broken).err().unwrap();
        assert!(matches!(error, Error::BindingNotFound(_)));

        let working = MethodSignature::new("working").param(Parameter::of::<String>());
        assert!(container.resolve_parameters(&working).is_ok());
    }

    #[test]
    fn test_provider_parameter_requires_binding() {
        let container = test_container();
        let signature = MethodSignature::new("lazy").param(Parameter::provider::<u64>());
        assert!(matches!(
            container.resolve_parameters(&signature),
            Err(Error::BindingNotFound(_))
        ));
    }

    #[test]
    fn test_wrong_accessor_reports_parameter() {
        let container = test_container();
        let signature = MethodSignature::new("single").param(Parameter::of::<String>());
        let arguments = container.resolve_parameters(&signature).unwrap();

        assert!(matches!(
            arguments.all::<String>(0),
            Err(Error::DependencyInjection(_))
        ));
        assert!(matches!(
            arguments.get::<String>(4),
            Err(Error::DependencyInjection(_))
        ));
        assert!(matches!(
            arguments.get::<u32>(0),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_finish_discards_singletons() {
        let container = test_container();
        let scopes = container.scopes().clone();
        container.inner().get::<String>().unwrap();
        assert!(scopes.singleton.is_cached(&Key::of::<String>()));

        container.finish();
        assert_eq!(scopes.singleton.cached_count(), 0);
    }
}
