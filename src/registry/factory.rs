//! Instance factory used to create destination objects
//!
//! Destinations are built through the type's parameterless constructor
//! (`Shape::constructor`). A factory override installed on the registry builder
//! takes over either for every type or only for types without such a constructor.

use std::any::Any;
use std::sync::Arc;

use crate::error::{MapError, Result};
use crate::shape::{Shape, TypeInfo};

/// User supplied instance factory
pub type FactoryOverride =
    Arc<dyn Fn(&TypeInfo) -> anyhow::Result<Box<dyn Any + Send>> + Send + Sync>;

/// Creates new instances for the registry
#[derive(Clone, Default)]
pub struct InstanceFactory {
    override_fn: Option<FactoryOverride>,
    always: bool,
}

impl InstanceFactory {
    /// Factory that only uses parameterless constructors
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an override
    ///
    /// With `always` set the override is consulted for every type, otherwise only
    /// for types lacking a parameterless constructor.
    pub fn install<F>(&mut self, factory: F, always: bool)
    where
        F: Fn(&TypeInfo) -> anyhow::Result<Box<dyn Any + Send>> + Send + Sync + 'static,
    {
        self.override_fn = Some(Arc::new(factory));
        self.always = always;
    }

    /// Whether an override is installed
    #[must_use]
    pub fn has_override(&self) -> bool {
        self.override_fn.is_some()
    }

    /// Create a new `T`
    pub fn create<T: Shape>(&self) -> Result<T> {
        let constructor = T::constructor();

        if let Some(factory) = &self.override_fn {
            if self.always || constructor.is_none() {
                let info = TypeInfo::of::<T>();
                let instance = factory(&info)?;
                return instance
                    .downcast::<T>()
                    .map(|boxed| *boxed)
                    .map_err(|_| MapError::FactoryTypeMismatch {
                        expected: info.path(),
                    });
            }
        }

        constructor
            .map(|construct| construct())
            .ok_or(MapError::NoParameterlessConstructor {
                type_name: std::any::type_name::<T>(),
            })
    }
}

impl std::fmt::Debug for InstanceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceFactory")
            .field("override", &self.override_fn.is_some())
            .field("always", &self.always)
            .finish()
    }
}
