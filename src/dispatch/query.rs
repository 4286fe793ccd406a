//! Query dispatch through registered projections.

use crate::error::{MapError, Result};
use crate::query::Query;
use crate::registry::MapRegistry;
use crate::shape::Shape;

impl MapRegistry {
    /// Map a lazy query through the projection registered for its element type
    pub fn from_query<'a, S: Shape>(&self, query: Query<'a, S>) -> QueryMapFrom<'_, 'a, S> {
        QueryMapFrom {
            registry: self,
            query,
        }
    }
}

/// Mapping of a lazy query
///
/// Only projection expressions are used; in-place and factory mappers are never
/// consulted for queries.
pub struct QueryMapFrom<'r, 'a, S> {
    registry: &'r MapRegistry,
    query: Query<'a, S>,
}

impl<'a, S: Shape> QueryMapFrom<'_, 'a, S> {
    /// Compose the projection into the query without executing it
    pub fn to<T: Shape>(self) -> Result<Query<'a, T>> {
        let projection = self
            .registry
            .projection::<S, T>()
            .ok_or_else(MapError::not_found::<S, T>)?;
        Ok(self.query.select(projection))
    }

    /// Execute the projected query and collect the results
    pub fn to_list<T: Shape>(self) -> Result<Vec<T>> {
        Ok(self.to::<T>()?.to_list())
    }

    /// Execute the projected query into a fixed-size array
    pub fn to_array<T: Shape>(self) -> Result<Box<[T]>> {
        Ok(self.to::<T>()?.execute().collect())
    }
}
