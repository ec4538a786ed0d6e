// Test method parameters and their resolved arguments

use crate::qualifier::DEFAULT_GROUP;
use rigging_core::{Container, Error, Instance, Key, ProviderHandle, Result, downcast};
use std::any::TypeId;
use std::sync::Arc;

/// A parameter a test method asks the container for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    /// The value bound to a key
    Single(Key),
    /// Every value of a type bound into a multi-binding group
    All {
        type_id: TypeId,
        type_name: &'static str,
        group: String,
    },
    /// A handle that resolves the key on demand
    Provider(Key),
}

impl Parameter {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Parameter::Single(Key::of::<T>())
    }

    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Parameter::Single(Key::named::<T>(name))
    }

    /// All values of `T` bound without a group name
    pub fn all<T: ?Sized + 'static>() -> Self {
        Self::all_in::<T>(DEFAULT_GROUP)
    }

    /// All values of `T` bound into `group`
    pub fn all_in<T: ?Sized + 'static>(group: impl Into<String>) -> Self {
        Parameter::All {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            group: group.into(),
        }
    }

    pub fn provider<T: ?Sized + 'static>() -> Self {
        Parameter::Provider(Key::of::<T>())
    }

    pub fn named_provider<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Parameter::Provider(Key::named::<T>(name))
    }
}

/// Name and parameter list of a test method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    name: String,
    parameters: Vec<Parameter>,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

pub(crate) enum Argument {
    Single(Key, Instance),
    All(Vec<(Key, Instance)>),
    Provider(Key),
}

/// Values resolved for one invocation of a test method
pub struct Arguments {
    container: Container,
    values: Vec<Argument>,
}

impl Arguments {
    pub(crate) fn new(container: Container, values: Vec<Argument>) -> Self {
        Self { container, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value resolved for the single-key parameter at `index`
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>> {
        match self.values.get(index) {
            Some(Argument::Single(key, instance)) => downcast(instance, key),
            _ => Err(self.wrong_kind(index, "a single value")),
        }
    }

    /// The values resolved for the group parameter at `index`
    pub fn all<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Vec<Arc<T>>> {
        match self.values.get(index) {
            Some(Argument::All(instances)) => instances
                .iter()
                .map(|(key, instance)| downcast(instance, key))
                .collect(),
            _ => Err(self.wrong_kind(index, "a group")),
        }
    }

    /// The provider handle for the parameter at `index`
    pub fn provider<T: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> Result<ProviderHandle<T>> {
        match self.values.get(index) {
            Some(Argument::Provider(key)) if key.is_for::<T>() => {
                Ok(self.container.provider(key.clone()))
            }
            Some(Argument::Provider(key)) => Err(Error::TypeMismatch(key.to_string())),
            _ => Err(self.wrong_kind(index, "a provider")),
        }
    }

    fn wrong_kind(&self, index: usize, expected: &str) -> Error {
        Error::DependencyInjection(format!(
            "parameter {index} of {} is not {expected}",
            self.values.len()
        ))
    }
}

impl std::fmt::Debug for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arguments")
            .field("len", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_keeps_parameter_order() {
        let signature = MethodSignature::new("checkout")
            .param(Parameter::of::<String>())
            .param(Parameter::named::<u32>("port"))
            .param(Parameter::all::<str>())
            .param(Parameter::provider::<String>());

        assert_eq!(signature.name(), "checkout");
        assert_eq!(signature.parameters().len(), 4);
        assert_eq!(
            signature.parameters()[1],
            Parameter::Single(Key::named::<u32>("port"))
        );
        match &signature.parameters()[2] {
            Parameter::All { group, type_id, .. } => {
                assert_eq!(group, DEFAULT_GROUP);
                assert_eq!(*type_id, TypeId::of::<str>());
            }
            other => panic!("unexpected parameter: {other:?}"),
        }
    }
}
