//! Auto-registration of mapping sets
//!
//! A mapping set is a type whose `impl` block carries `#[mappings]`. The macro
//! implements [`MappingSet`], listing every mapper-shaped method in declaration
//! order. Public methods are registered; non-public ones only enter the method
//! catalog so the validator can follow calls into them.

use std::any::TypeId;
use std::sync::Arc;

use log::{debug, trace};
use rustc_hash::FxHashMap;

use super::classify::{Classified, MethodShape, SlotKind};
use super::method::MethodInfo;
use super::registration::{Callable, Registration};
use super::MapRegistryBuilder;
use crate::error::{MapError, Result};
use crate::shape::Shape;

/// A type whose methods can be registered automatically
pub trait MappingSet: Send + Sync + 'static {
    /// Registrations for the methods of `instance`, in declaration order
    fn registrations(instance: &Arc<Self>) -> Vec<Registration>
    where
        Self: Sized;
}

impl MapRegistryBuilder {
    /// Create `M` through the instance factory and register its methods
    pub fn register_set<M: MappingSet + Shape>(&mut self) -> Result<&mut Self> {
        let instance = self.create::<M>()?;
        self.register_instance(Arc::new(instance))
    }

    /// Register the methods of an existing mapping set instance
    ///
    /// Methods are classified by signature; anything that does not match one of
    /// the accepted shapes is skipped. Later methods overwrite earlier ones for
    /// the same slot unless shape collisions are rejected by the configuration.
    pub fn register_instance<M: MappingSet>(&mut self, instance: Arc<M>) -> Result<&mut Self> {
        let mut claimed: FxHashMap<(TypeId, TypeId, SlotKind), &'static str> = FxHashMap::default();
        let mut pending = Vec::new();

        for registration in M::registrations(&instance) {
            let Some(classified) = MethodShape::classify(&registration.method) else {
                trace!(
                    "Skipping {}: not a mapping signature",
                    registration.method.qualified_name()
                );
                continue;
            };

            if !registration.method.public {
                pending.push(Pending::Helper(registration.method, classified));
                continue;
            }

            if self.config().reject_shape_collisions {
                let slot = (classified.from.id(), classified.to.id(), classified.shape.slot());
                if let Some(first) = claimed.insert(slot, registration.method.name) {
                    return Err(MapError::ShapeCollision {
                        owner: registration.method.owner,
                        first,
                        second: registration.method.name,
                        from: classified.from.path(),
                        to: classified.to.path(),
                    });
                }
            }

            pending.push(Pending::Mapper(registration.into_callable()?));
        }

        // the builder is only touched once the whole set has been accepted
        for entry in pending {
            match entry {
                Pending::Helper(method, classified) => {
                    trace!("Cataloguing helper {}", method.qualified_name());
                    self.record(method, classified);
                }
                Pending::Mapper(callable) => {
                    self.insert(callable);
                }
            }
        }

        debug!("Registered mapping set {}", std::any::type_name::<M>());
        Ok(self)
    }
}

/// A method of a set that passed every check
enum Pending {
    Helper(MethodInfo, Classified),
    Mapper(Callable),
}
