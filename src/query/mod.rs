//! Composable projections and lazy queries
//!
//! A [`Projection`] is a named selector from `S` to `T` that can be registered on
//! the registry and composed with other projections. A [`Query`] is a deferred
//! sequence: filters and projections are appended to its plan and nothing runs
//! until the query is executed.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Named, composable selector from `S` to `T`
pub struct Projection<S, T> {
    name: Cow<'static, str>,
    select: Arc<dyn Fn(&S) -> T + Send + Sync>,
}

impl<S: 'static, T: 'static> Projection<S, T> {
    /// Create a projection
    pub fn new(name: impl Into<Cow<'static, str>>, select: impl Fn(&S) -> T + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            select: Arc::new(select),
        }
    }

    /// Projection name, shown in query plans
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the projection for one value
    pub fn apply(&self, value: &S) -> T {
        (self.select)(value)
    }

    /// Compose with a projection applied to the output of this one
    #[must_use]
    pub fn then<U: 'static>(&self, next: &Projection<T, U>) -> Projection<S, U> {
        let first = Arc::clone(&self.select);
        let second = Arc::clone(&next.select);
        Projection {
            name: Cow::Owned(format!("{} |> {}", self.name, next.name)),
            select: Arc::new(move |value: &S| second(&first(value))),
        }
    }
}

impl<S, T> Clone for Projection<S, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            select: Arc::clone(&self.select),
        }
    }
}

impl<S, T> fmt::Debug for Projection<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection").field("name", &self.name).finish()
    }
}

type Source<'a, T> = Box<dyn FnOnce() -> Box<dyn Iterator<Item = T> + 'a> + 'a>;

/// Lazy query over a deferred sequence
pub struct Query<'a, T> {
    plan: Vec<String>,
    source: Source<'a, T>,
}

impl<'a, T: 'a> Query<'a, T> {
    /// Query over an in-memory collection
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T> + 'a,
    {
        Self::deferred("items", move || items)
    }

    /// Query whose items are produced only when the query executes
    pub fn deferred<F, I>(name: impl Into<String>, produce: F) -> Self
    where
        F: FnOnce() -> I + 'a,
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a,
    {
        Self {
            plan: vec![format!("source({})", name.into())],
            source: Box::new(move || Box::new(produce().into_iter())),
        }
    }

    /// Keep only the items matching a predicate
    #[must_use]
    pub fn filter<P>(self, name: impl Into<String>, mut predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + 'a,
    {
        let Self { mut plan, source } = self;
        plan.push(format!("filter({})", name.into()));
        Self {
            plan,
            source: Box::new(move || Box::new(source().filter(move |item| predicate(item)))),
        }
    }

    /// Append a projection to the plan without running it
    #[must_use]
    pub fn select<U: 'a>(self, projection: &Projection<T, U>) -> Query<'a, U>
    where
        T: 'static,
        U: 'static,
    {
        let Self { mut plan, source } = self;
        plan.push(format!("select({})", projection.name()));
        let projection = projection.clone();
        Query {
            plan,
            source: Box::new(move || Box::new(source().map(move |item| projection.apply(&item)))),
        }
    }

    /// Operations composed so far, in order
    #[must_use]
    pub fn plan(&self) -> &[String] {
        &self.plan
    }

    /// Run the query
    pub fn execute(self) -> impl Iterator<Item = T> + 'a {
        (self.source)()
    }

    /// Run the query and collect the results
    pub fn to_list(self) -> Vec<T> {
        self.execute().collect()
    }
}

impl<T> fmt::Debug for Query<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").field("plan", &self.plan).finish()
    }
}
