//! Async stream dispatch
//!
//! Elements are mapped one at a time as the stream yields them; the mapped stream
//! preserves the source order and never maps concurrently.

use futures::{Stream, StreamExt, TryStreamExt};

use crate::error::Result;
use crate::registry::MapRegistry;
use crate::shape::Shape;

impl MapRegistry {
    /// Map every element of an async stream
    pub fn from_stream<S, St>(&self, stream: St) -> StreamMapFrom<'_, St>
    where
        S: Shape,
        St: Stream<Item = S>,
    {
        StreamMapFrom { registry: self, stream }
    }

    /// Map an async stream whose elements may be absent
    pub fn from_nullable_stream<S, St>(&self, stream: St) -> NullableStreamMapFrom<'_, St>
    where
        S: Shape,
        St: Stream<Item = Option<S>>,
    {
        NullableStreamMapFrom { registry: self, stream }
    }
}

/// Mapping of an async stream
pub struct StreamMapFrom<'r, St> {
    registry: &'r MapRegistry,
    stream: St,
}

impl<S, St> StreamMapFrom<'_, St>
where
    S: Shape,
    St: Stream<Item = S>,
{
    /// Lazily map every element
    pub fn to<T: Shape>(self) -> Result<impl Stream<Item = Result<T>>> {
        let mapper = self.registry.resolve::<S, T>()?;
        let registry = self.registry;
        Ok(self.stream.map(move |item| mapper.apply(registry, &item)))
    }

    /// Map every element and collect the results
    pub async fn to_list<T: Shape>(self) -> Result<Vec<T>> {
        self.to::<T>()?.try_collect().await
    }

    /// Map every element into a fixed-size array
    pub async fn to_array<T: Shape>(self) -> Result<Box<[T]>> {
        let list: Vec<T> = self.to::<T>()?.try_collect().await?;
        Ok(list.into_boxed_slice())
    }
}

/// Mapping of an async stream whose elements may be absent
pub struct NullableStreamMapFrom<'r, St> {
    registry: &'r MapRegistry,
    stream: St,
}

impl<S, St> NullableStreamMapFrom<'_, St>
where
    S: Shape,
    St: Stream<Item = Option<S>>,
{
    /// Lazily map every element, passing absent elements through
    pub fn to<T: Shape>(self) -> Result<impl Stream<Item = Result<Option<T>>>> {
        let mapper = self.registry.resolve::<S, T>()?;
        let registry = self.registry;
        Ok(self
            .stream
            .map(move |item| item.map(|source| mapper.apply(registry, &source)).transpose()))
    }

    /// Map every element and collect the results
    pub async fn to_list<T: Shape>(self) -> Result<Vec<Option<T>>> {
        self.to::<T>()?.try_collect().await
    }
}
