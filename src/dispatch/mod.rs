//! Fluent dispatch front end
//!
//! `registry.from(&source).to::<T>()` looks up the mapper registered for the
//! runtime pair `(S, T)` and applies it. Variants exist for optional sources,
//! iterators, async streams and lazy queries. Resolving the mapper happens when
//! the mapped sequence is constructed, so a missing registration is reported
//! before the first element is pulled.

pub mod query;
pub mod stream;

use log::trace;

use crate::error::{MapError, Result};
use crate::registry::{FactoryFn, InPlaceFn, MapRegistry};
use crate::shape::Shape;

pub use query::QueryMapFrom;
pub use stream::{NullableStreamMapFrom, StreamMapFrom};

/// Mapper chosen for a type pair
pub(crate) enum Resolved<'r, S, T> {
    Factory(&'r FactoryFn<S, T>),
    InPlace(&'r InPlaceFn<S, T>),
}

impl<S, T> Clone for Resolved<'_, S, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, T> Copy for Resolved<'_, S, T> {}

impl<S: Shape, T: Shape> Resolved<'_, S, T> {
    pub(crate) fn apply(self, registry: &MapRegistry, source: &S) -> Result<T> {
        match self {
            Self::Factory(factory) => Ok(factory(registry, source)),
            Self::InPlace(map) => {
                let mut target = registry.create::<T>()?;
                map(registry, source, &mut target);
                Ok(target)
            }
        }
    }
}

impl MapRegistry {
    /// Find the mapper producing a new `T` from `S`
    ///
    /// A factory mapper wins over create-then-map-in-place.
    pub(crate) fn resolve<S: Shape, T: Shape>(&self) -> Result<Resolved<'_, S, T>> {
        if self.config().log_dispatch {
            trace!("Dispatch {} -> {}", S::NAME, T::NAME);
        }
        if let Some(factory) = self.factory_fn::<S, T>() {
            return Ok(Resolved::Factory(factory));
        }
        self.in_place::<S, T>()
            .map(Resolved::InPlace)
            .ok_or_else(MapError::not_found::<S, T>)
    }

    fn resolve_in_place<S: Shape, T: Shape>(&self) -> Result<&InPlaceFn<S, T>> {
        if self.config().log_dispatch {
            trace!("Dispatch {} -> existing {}", S::NAME, T::NAME);
        }
        self.in_place::<S, T>().ok_or_else(MapError::not_found::<S, T>)
    }

    /// Map a single value
    pub fn from<'s, S: Shape>(&self, source: &'s S) -> MapFrom<'_, 's, S> {
        MapFrom {
            registry: self,
            source,
        }
    }

    /// Map a value that may be absent
    pub fn from_nullable<'s, S: Shape>(&self, source: Option<&'s S>) -> NullableMapFrom<'_, 's, S> {
        NullableMapFrom {
            registry: self,
            source,
        }
    }

    /// Map every element of an iterator
    pub fn from_iter<'s, S, I>(&self, items: I) -> IterMapFrom<'_, I::IntoIter>
    where
        S: Shape,
        I: IntoIterator<Item = &'s S>,
    {
        IterMapFrom {
            registry: self,
            items: items.into_iter(),
        }
    }

    /// Map an iterator whose elements may be absent
    pub fn from_nullable_iter<'s, S, I>(&self, items: I) -> NullableIterMapFrom<'_, I::IntoIter>
    where
        S: Shape,
        I: IntoIterator<Item = Option<&'s S>>,
    {
        NullableIterMapFrom {
            registry: self,
            items: items.into_iter(),
        }
    }

    /// The in-place mapper for `S -> T` as a callable
    pub fn get_method<S: Shape, T: Shape>(&self) -> Result<impl Fn(&S, &mut T) + '_> {
        let map = self.resolve_in_place::<S, T>()?;
        Ok(move |source: &S, target: &mut T| map(self, source, target))
    }

    /// A callable producing a new `T` from `S`
    ///
    /// Without a registered factory mapper the callable creates the destination
    /// through the instance factory and applies the in-place mapper.
    pub fn get_factory_method<S: Shape, T: Shape>(&self) -> Result<impl Fn(&S) -> Result<T> + '_> {
        let mapper = self.resolve::<S, T>()?;
        Ok(move |source: &S| mapper.apply(self, source))
    }
}

/// Mapping of one source value
pub struct MapFrom<'r, 's, S> {
    registry: &'r MapRegistry,
    source: &'s S,
}

impl<S: Shape> MapFrom<'_, '_, S> {
    /// Produce a new `T`
    pub fn to<T: Shape>(&self) -> Result<T> {
        self.registry.resolve::<S, T>()?.apply(self.registry, self.source)
    }

    /// Map into an existing `T`, returning the same reference
    pub fn to_existing<'t, T: Shape>(&self, target: &'t mut T) -> Result<&'t mut T> {
        let map = self.registry.resolve_in_place::<S, T>()?;
        map(self.registry, self.source, target);
        Ok(target)
    }

    /// Map into a destination that may be absent
    pub fn to_nullable<'t, T: Shape>(&self, target: Option<&'t mut T>) -> Result<Option<&'t mut T>> {
        target.map(|target| self.to_existing(target)).transpose()
    }
}

/// Mapping of a source value that may be absent
pub struct NullableMapFrom<'r, 's, S> {
    registry: &'r MapRegistry,
    source: Option<&'s S>,
}

impl<S: Shape> NullableMapFrom<'_, '_, S> {
    /// Produce a new `T`, `None` when the source is absent
    pub fn to<T: Shape>(&self) -> Result<Option<T>> {
        match self.source {
            Some(source) => self.registry.from(source).to::<T>().map(Some),
            None => Ok(None),
        }
    }

    /// Map into an existing `T`; the target is left untouched when the source is absent
    pub fn to_existing<'t, T: Shape>(&self, target: &'t mut T) -> Result<&'t mut T> {
        match self.source {
            Some(source) => self.registry.from(source).to_existing(target),
            None => Ok(target),
        }
    }
}

/// Mapping of an iterator of source values
pub struct IterMapFrom<'r, I> {
    registry: &'r MapRegistry,
    items: I,
}

impl<'r, 's, S, I> IterMapFrom<'r, I>
where
    S: Shape,
    I: Iterator<Item = &'s S>,
{
    /// Lazily map every element
    pub fn to<T: Shape>(self) -> Result<impl Iterator<Item = Result<T>>> {
        let mapper = self.registry.resolve::<S, T>()?;
        let registry = self.registry;
        Ok(self.items.map(move |item| mapper.apply(registry, item)))
    }

    /// Map every element into a list
    pub fn to_list<T: Shape>(self) -> Result<Vec<T>> {
        self.to::<T>()?.collect()
    }

    /// Map every element into a fixed-size array
    pub fn to_array<T: Shape>(self) -> Result<Box<[T]>> {
        self.to::<T>()?.collect()
    }

    /// Map into an existing list, reusing its elements
    ///
    /// The list is truncated to the source length, new elements are created for
    /// missing positions and every position is then mapped in place.
    pub fn to_list_into<'t, T: Shape>(self, target: &'t mut Vec<T>) -> Result<&'t mut Vec<T>>
    where
        I: ExactSizeIterator,
    {
        let map = self.registry.resolve_in_place::<S, T>()?;
        let len = self.items.len();

        target.truncate(len);
        target.reserve(len - target.len());
        while target.len() < len {
            target.push(self.registry.create::<T>()?);
        }
        for (item, slot) in self.items.zip(target.iter_mut()) {
            map(self.registry, item, slot);
        }
        Ok(target)
    }
}

/// Mapping of an iterator whose elements may be absent
pub struct NullableIterMapFrom<'r, I> {
    registry: &'r MapRegistry,
    items: I,
}

impl<'r, 's, S, I> NullableIterMapFrom<'r, I>
where
    S: Shape,
    I: Iterator<Item = Option<&'s S>>,
{
    /// Lazily map every element, passing absent elements through
    pub fn to<T: Shape>(self) -> Result<impl Iterator<Item = Result<Option<T>>>> {
        let mapper = self.registry.resolve::<S, T>()?;
        let registry = self.registry;
        Ok(self
            .items
            .map(move |item| item.map(|source| mapper.apply(registry, source)).transpose()))
    }

    /// Map every element into a list
    pub fn to_list<T: Shape>(self) -> Result<Vec<Option<T>>> {
        self.to::<T>()?.collect()
    }

    /// Map every element into a fixed-size array
    pub fn to_array<T: Shape>(self) -> Result<Box<[Option<T>]>> {
        self.to::<T>()?.collect()
    }
}
