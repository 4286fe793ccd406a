//! Mapping registry
//!
//! Mapping functions are registered on a [`MapRegistryBuilder`] during
//! configuration. [`MapRegistryBuilder::build`] freezes the tables into a
//! [`MapRegistry`], which serves dispatch and validation and can be shared
//! between threads.

pub mod auto;
pub mod classify;
pub mod factory;
pub mod method;
pub mod registration;

use std::any::{Any, TypeId};
use std::sync::Arc;

use log::debug;
use rustc_hash::FxHashMap;

use crate::config::MapConfig;
use crate::error::Result;
use crate::query::Projection;
use crate::shape::{FieldInfo, Shape, TypeInfo};

pub use auto::MappingSet;
pub use classify::{Classified, MethodShape, SlotKind};
pub use factory::{FactoryOverride, InstanceFactory};
pub use method::{MethodAttrs, MethodBody, MethodInfo, ParamInfo, PassMode, Returns};
pub use registration::{FactoryFn, InPlaceFn, MappingKey, Registration};

use registration::{Callable, ErasedFn};

/// Index of a method in the registry catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(usize);

/// A mapper-shaped method known to the registry
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Method metadata
    pub method: MethodInfo,
    /// Shape and type pair, computed once when the method was recorded
    pub classified: Classified,
}

#[derive(Clone)]
pub(crate) struct Slot {
    method: MethodId,
    func: ErasedFn,
}

/// Registered functions for one `(source, destination)` pair
#[derive(Clone, Default)]
pub struct RegistrationEntry {
    in_place: Option<Slot>,
    factory: Option<Slot>,
    projection: Option<Slot>,
}

impl RegistrationEntry {
    /// Whether an in-place mapper is registered
    #[must_use]
    pub fn has_in_place(&self) -> bool {
        self.in_place.is_some()
    }

    /// Whether a factory mapper is registered
    #[must_use]
    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// Whether a projection expression is registered
    #[must_use]
    pub fn has_projection(&self) -> bool {
        self.projection.is_some()
    }

    /// Catalog id of the function in the given slot
    #[must_use]
    pub fn method(&self, slot: SlotKind) -> Option<MethodId> {
        let slot = match slot {
            SlotKind::InPlace => &self.in_place,
            SlotKind::Factory => &self.factory,
            SlotKind::Projection => &self.projection,
        };
        slot.as_ref().map(|s| s.method)
    }

    fn typed<F: Any>(slot: &Option<Slot>) -> Option<&F> {
        slot.as_ref().and_then(|s| s.func.downcast_ref::<F>())
    }
}

impl std::fmt::Debug for RegistrationEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationEntry")
            .field("in_place", &self.method(SlotKind::InPlace))
            .field("factory", &self.method(SlotKind::Factory))
            .field("projection", &self.method(SlotKind::Projection))
            .finish()
    }
}

type Tables = FxHashMap<TypeId, FxHashMap<TypeId, RegistrationEntry>>;

/// Configuration phase of a registry
#[derive(Default)]
pub struct MapRegistryBuilder {
    config: MapConfig,
    entries: Tables,
    catalog: Vec<CatalogEntry>,
    log: Vec<MethodId>,
    factory: InstanceFactory,
}

impl MapRegistryBuilder {
    /// Builder with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with a custom configuration
    #[must_use]
    pub fn with_config(config: MapConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Register a function
    ///
    /// Overwrites any function registered earlier in the same slot for the same
    /// type pair. Fails with `NullFunction` when the registration has no callable.
    pub fn register(&mut self, registration: Registration) -> Result<&mut Self> {
        let callable = registration.into_callable()?;
        self.insert(callable);
        Ok(self)
    }

    /// Register `fn(&S, &mut T)`
    pub fn register_simple_map<S, T>(&mut self, f: impl Fn(&S, &mut T) + Send + Sync + 'static) -> &mut Self
    where
        S: Shape,
        T: Shape,
    {
        self.insert_typed(Callable::simple_map(MethodInfo::opaque(), f))
    }

    /// Register `fn(&MapRegistry, &S, &mut T)`
    pub fn register_map<S, T>(
        &mut self,
        f: impl Fn(&MapRegistry, &S, &mut T) + Send + Sync + 'static,
    ) -> &mut Self
    where
        S: Shape,
        T: Shape,
    {
        self.insert_typed(Callable::map(MethodInfo::opaque(), f))
    }

    /// Register `fn(&S) -> T`
    pub fn register_simple_factory<S, T>(&mut self, f: impl Fn(&S) -> T + Send + Sync + 'static) -> &mut Self
    where
        S: Shape,
        T: Shape,
    {
        self.insert_typed(Callable::simple_factory(MethodInfo::opaque(), f))
    }

    /// Register `fn(&MapRegistry, &S) -> T`
    pub fn register_factory<S, T>(
        &mut self,
        f: impl Fn(&MapRegistry, &S) -> T + Send + Sync + 'static,
    ) -> &mut Self
    where
        S: Shape,
        T: Shape,
    {
        self.insert_typed(Callable::factory(MethodInfo::opaque(), f))
    }

    /// Register a projection expression for query sources
    pub fn register_projection<S, T>(&mut self, projection: Projection<S, T>) -> &mut Self
    where
        S: Shape,
        T: Shape,
    {
        self.insert_typed(Callable::projection(MethodInfo::opaque(), projection))
    }

    /// Install an instance factory override
    ///
    /// With `always` set the override creates every instance, otherwise only
    /// instances of types without a parameterless constructor.
    pub fn install_factory<F>(&mut self, factory: F, always: bool) -> &mut Self
    where
        F: Fn(&TypeInfo) -> anyhow::Result<Box<dyn Any + Send>> + Send + Sync + 'static,
    {
        self.factory.install(factory, always);
        self
    }

    /// Create an instance through the configured factory
    pub fn create<T: Shape>(&self) -> Result<T> {
        self.factory.create::<T>()
    }

    /// Freeze the configuration
    #[must_use]
    pub fn build(self) -> MapRegistry {
        let index = self
            .catalog
            .iter()
            .enumerate()
            .map(|(id, entry)| ((entry.method.owner, entry.method.name), MethodId(id)))
            .collect();

        debug!(
            "Built map registry with {} functions ({} validated)",
            self.catalog.len(),
            self.log.len()
        );

        MapRegistry {
            config: self.config,
            entries: self.entries,
            catalog: self.catalog,
            log: self.log,
            index,
            factory: self.factory,
        }
    }

    fn insert_typed(&mut self, callable: Callable) -> &mut Self {
        self.insert(callable);
        self
    }

    fn insert(&mut self, callable: Callable) -> MethodId {
        let Callable { key, shape, method, func } = callable;
        debug!(
            "Registered {shape:?} {} -> {} ({})",
            key.from.name(),
            key.to.name(),
            method.qualified_name()
        );

        let id = self.record(
            method,
            Classified {
                shape,
                from: key.from,
                to: key.to,
            },
        );
        let entry = self
            .entries
            .entry(key.from.id())
            .or_default()
            .entry(key.to.id())
            .or_default();
        let slot = Some(Slot { method: id, func });

        match shape.slot() {
            SlotKind::InPlace => entry.in_place = slot,
            SlotKind::Factory => entry.factory = slot,
            SlotKind::Projection => entry.projection = slot,
        }
        if shape.slot() != SlotKind::Projection {
            self.log.push(id);
        }
        id
    }

    fn record(&mut self, method: MethodInfo, classified: Classified) -> MethodId {
        self.catalog.push(CatalogEntry { method, classified });
        MethodId(self.catalog.len() - 1)
    }
}

/// Frozen mapping registry
///
/// Immutable after [`MapRegistryBuilder::build`]; dispatch and validation take
/// `&self` and are safe to call from any number of threads.
pub struct MapRegistry {
    config: MapConfig,
    entries: Tables,
    catalog: Vec<CatalogEntry>,
    log: Vec<MethodId>,
    index: FxHashMap<(&'static str, &'static str), MethodId>,
    factory: InstanceFactory,
}

impl MapRegistry {
    /// Start configuring a registry
    #[must_use]
    pub fn builder() -> MapRegistryBuilder {
        MapRegistryBuilder::new()
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Registered functions for a type pair
    #[must_use]
    pub fn lookup(&self, from: TypeId, to: TypeId) -> Option<&RegistrationEntry> {
        self.entries.get(&from)?.get(&to)
    }

    /// Registered functions for `S -> T`
    #[must_use]
    pub fn lookup_of<S: 'static, T: 'static>(&self) -> Option<&RegistrationEntry> {
        self.lookup(TypeId::of::<S>(), TypeId::of::<T>())
    }

    /// Create an instance through the configured factory
    pub fn create<T: Shape>(&self) -> Result<T> {
        self.factory.create::<T>()
    }

    /// Every registered in-place and factory function, in registration order
    pub fn registered_methods(&self) -> impl Iterator<Item = &MethodInfo> {
        self.log.iter().map(|id| &self.catalog[id.0].method)
    }

    /// A catalog entry
    #[must_use]
    pub fn method(&self, id: MethodId) -> Option<&CatalogEntry> {
        self.catalog.get(id.0)
    }

    pub(crate) fn validation_log(&self) -> &[MethodId] {
        &self.log
    }

    pub(crate) fn find_method(&self, owner: &'static str, name: &'static str) -> Option<MethodId> {
        self.index.get(&(owner, name)).copied()
    }

    pub(crate) fn in_place<S: 'static, T: 'static>(&self) -> Option<&InPlaceFn<S, T>> {
        RegistrationEntry::typed(&self.lookup_of::<S, T>()?.in_place)
    }

    pub(crate) fn factory_fn<S: 'static, T: 'static>(&self) -> Option<&FactoryFn<S, T>> {
        RegistrationEntry::typed(&self.lookup_of::<S, T>()?.factory)
    }

    pub(crate) fn projection<S: 'static, T: 'static>(&self) -> Option<&Projection<S, T>> {
        RegistrationEntry::typed(&self.lookup_of::<S, T>()?.projection)
    }
}

impl Shape for MapRegistry {
    const NAME: &'static str = "MapRegistry";
    const FIELDS: &'static [FieldInfo] = &[];

    fn constructor() -> Option<fn() -> Self> {
        None
    }
}

impl std::fmt::Debug for MapRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapRegistry")
            .field("config", &self.config)
            .field("functions", &self.catalog.len())
            .field("factory", &self.factory)
            .finish()
    }
}

/// Shared handle to a frozen registry
pub type SharedRegistry = Arc<MapRegistry>;
