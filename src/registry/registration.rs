//! Typed registrations and their type-erased storage.

use std::any::Any;
use std::sync::Arc;

use super::MapRegistry;
use super::classify::{Classified, MethodShape};
use super::method::{MethodInfo, PassMode};
use crate::error::{MapError, Result};
use crate::query::Projection;
use crate::shape::{Shape, TypeInfo};

/// In-place mapper as stored in the registry
pub type InPlaceFn<S, T> = Arc<dyn Fn(&MapRegistry, &S, &mut T) + Send + Sync>;

/// Factory mapper as stored in the registry
pub type FactoryFn<S, T> = Arc<dyn Fn(&MapRegistry, &S) -> T + Send + Sync>;

/// Type-erased callable; holds an `InPlaceFn`, a `FactoryFn` or a `Projection`
pub(crate) type ErasedFn = Arc<dyn Any + Send + Sync>;

/// Identifies one registration slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingKey {
    /// Source type
    pub from: TypeInfo,
    /// Destination type
    pub to: TypeInfo,
}

impl MappingKey {
    /// Key for the pair `S -> T`
    #[must_use]
    pub fn of<S: Shape, T: Shape>() -> Self {
        Self {
            from: TypeInfo::of::<S>(),
            to: TypeInfo::of::<T>(),
        }
    }
}

/// A registration that is known to carry a callable
#[derive(Debug)]
pub(crate) struct Callable {
    pub(crate) key: MappingKey,
    pub(crate) shape: MethodShape,
    pub(crate) method: MethodInfo,
    pub(crate) func: ErasedFn,
}

impl Callable {
    pub(crate) fn simple_map<S, T>(method: MethodInfo, f: impl Fn(&S, &mut T) + Send + Sync + 'static) -> Self
    where
        S: Shape,
        T: Shape,
    {
        let func: InPlaceFn<S, T> = Arc::new(move |_: &MapRegistry, from: &S, to: &mut T| f(from, to));
        Self::typed::<S, T>(MethodShape::SimpleMap, method, Arc::new(func))
    }

    pub(crate) fn map<S, T>(method: MethodInfo, f: impl Fn(&MapRegistry, &S, &mut T) + Send + Sync + 'static) -> Self
    where
        S: Shape,
        T: Shape,
    {
        let func: InPlaceFn<S, T> = Arc::new(f);
        Self::typed::<S, T>(MethodShape::Map, method, Arc::new(func))
    }

    pub(crate) fn simple_factory<S, T>(method: MethodInfo, f: impl Fn(&S) -> T + Send + Sync + 'static) -> Self
    where
        S: Shape,
        T: Shape,
    {
        let func: FactoryFn<S, T> = Arc::new(move |_: &MapRegistry, from: &S| f(from));
        Self::typed::<S, T>(MethodShape::SimpleFactory, method, Arc::new(func))
    }

    pub(crate) fn factory<S, T>(method: MethodInfo, f: impl Fn(&MapRegistry, &S) -> T + Send + Sync + 'static) -> Self
    where
        S: Shape,
        T: Shape,
    {
        let func: FactoryFn<S, T> = Arc::new(f);
        Self::typed::<S, T>(MethodShape::Factory, method, Arc::new(func))
    }

    pub(crate) fn projection<S, T>(method: MethodInfo, projection: Projection<S, T>) -> Self
    where
        S: Shape,
        T: Shape,
    {
        Self::typed::<S, T>(MethodShape::Projection, method, Arc::new(projection))
    }

    fn typed<S: Shape, T: Shape>(shape: MethodShape, mut method: MethodInfo, func: ErasedFn) -> Self {
        if method.params.is_empty() && method.body.is_none() {
            method = describe_opaque::<S, T>(shape, method);
        }
        Self {
            key: MappingKey::of::<S, T>(),
            shape,
            method,
            func,
        }
    }
}

/// A function ready to be registered, together with its metadata
pub struct Registration {
    pub(crate) key: MappingKey,
    pub(crate) shape: MethodShape,
    pub(crate) method: MethodInfo,
    pub(crate) func: Option<ErasedFn>,
}

impl From<Callable> for Registration {
    fn from(callable: Callable) -> Self {
        Self {
            key: callable.key,
            shape: callable.shape,
            method: callable.method,
            func: Some(callable.func),
        }
    }
}

impl Registration {
    /// `fn(&S, &mut T)`
    pub fn simple_map<S, T>(method: MethodInfo, f: impl Fn(&S, &mut T) + Send + Sync + 'static) -> Self
    where
        S: Shape,
        T: Shape,
    {
        Callable::simple_map(method, f).into()
    }

    /// `fn(&MapRegistry, &S, &mut T)`
    pub fn map<S, T>(
        method: MethodInfo,
        f: impl Fn(&MapRegistry, &S, &mut T) + Send + Sync + 'static,
    ) -> Self
    where
        S: Shape,
        T: Shape,
    {
        Callable::map(method, f).into()
    }

    /// `fn(&S) -> T`
    pub fn simple_factory<S, T>(method: MethodInfo, f: impl Fn(&S) -> T + Send + Sync + 'static) -> Self
    where
        S: Shape,
        T: Shape,
    {
        Callable::simple_factory(method, f).into()
    }

    /// `fn(&MapRegistry, &S) -> T`
    pub fn factory<S, T>(method: MethodInfo, f: impl Fn(&MapRegistry, &S) -> T + Send + Sync + 'static) -> Self
    where
        S: Shape,
        T: Shape,
    {
        Callable::factory(method, f).into()
    }

    /// A projection expression
    pub fn projection<S, T>(method: MethodInfo, projection: Projection<S, T>) -> Self
    where
        S: Shape,
        T: Shape,
    {
        Callable::projection(method, projection).into()
    }

    /// A mapper-shaped method known by signature only
    ///
    /// Declarations are recorded in the method catalog so the validator can follow
    /// calls into them; registering one fails with `NullFunction`.
    #[must_use]
    pub fn declare(method: MethodInfo) -> Option<Self> {
        let Classified { shape, from, to } = MethodShape::classify(&method)?;
        Some(Self {
            key: MappingKey { from, to },
            shape,
            method,
            func: None,
        })
    }

    /// Add field names to the ignore set
    #[must_use]
    pub fn ignore<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.method = self.method.ignore(names);
        self
    }

    /// Validate that the source is fully read instead of the destination fully written
    #[must_use]
    pub fn validate_source(mut self) -> Self {
        self.method = self.method.validate_source();
        self
    }

    /// Exclude the function from validation
    #[must_use]
    pub fn ignore_method(mut self) -> Self {
        self.method = self.method.ignore_method();
        self
    }

    /// The registration slot key
    #[must_use]
    pub fn key(&self) -> MappingKey {
        self.key
    }

    /// The signature shape
    #[must_use]
    pub fn shape(&self) -> MethodShape {
        self.shape
    }

    /// Function metadata
    #[must_use]
    pub fn method(&self) -> &MethodInfo {
        &self.method
    }

    pub(crate) fn into_callable(self) -> Result<Callable> {
        let Self { key, shape, method, func } = self;
        let func = func.ok_or(MapError::NullFunction {
            from: key.from.path(),
            to: key.to.path(),
        })?;
        Ok(Callable { key, shape, method, func })
    }
}

/// Fill in the signature of a closure registered without `mapper!`
fn describe_opaque<S: Shape, T: Shape>(shape: MethodShape, method: MethodInfo) -> MethodInfo {
    match shape {
        MethodShape::SimpleMap => method
            .with_param::<S>("from", PassMode::Ref)
            .with_param::<T>("to", PassMode::RefMut),
        MethodShape::Map => method
            .with_param::<MapRegistry>("map", PassMode::Ref)
            .with_param::<S>("from", PassMode::Ref)
            .with_param::<T>("to", PassMode::RefMut),
        MethodShape::SimpleFactory => method.with_param::<S>("from", PassMode::Ref).with_return::<T>(),
        MethodShape::Factory => method
            .with_param::<MapRegistry>("map", PassMode::Ref)
            .with_param::<S>("from", PassMode::Ref)
            .with_return::<T>(),
        MethodShape::Projection => method.with_projection::<S, T>(),
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("shape", &self.shape)
            .field("method", &self.method.qualified_name())
            .field("callable", &self.func.is_some())
            .finish()
    }
}
