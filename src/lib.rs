//! Type-directed object mapping with static completeness checks.
//!
//! Mapping functions are registered per `(source, destination)` type pair on a
//! [`MapRegistryBuilder`], either one by one or by auto-discovery over a type
//! whose `impl` block carries `#[mappings]`. The frozen [`MapRegistry`] then
//! dispatches `registry.from(&value).to::<T>()` calls and can validate, without
//! running anything, that each mapper covers every field of its destination.
//!
//! ```ignore
//! use fieldmap::{MapRegistry, Shape, mappings};
//!
//! #[derive(Default, Shape)]
//! pub struct User { pub name: String }
//!
//! #[derive(Default, Shape)]
//! pub struct UserModel { pub name: String }
//!
//! #[derive(Default, Shape)]
//! pub struct UserMaps;
//!
//! #[mappings]
//! impl UserMaps {
//!     pub fn map(&self, from: &User, to: &mut UserModel) {
//!         to.name = from.name.clone();
//!     }
//! }
//!
//! let mut builder = MapRegistry::builder();
//! builder.register_set::<UserMaps>()?;
//! let registry = builder.build();
//! registry.validate()?;
//! let model: UserModel = registry.from(&user).to()?;
//! ```

extern crate self as fieldmap;

pub mod config;
pub mod dispatch;
pub mod error;
pub mod query;
pub mod registry;
pub mod shape;
pub mod validate;

// Core types
pub use config::MapConfig;
pub use error::{MapError, Result};
pub use registry::{
    MapRegistry, MapRegistryBuilder, MappingKey, MappingSet, MethodInfo, MethodShape, Registration,
    RegistrationEntry,
};
pub use shape::{FieldInfo, Shape, TypeInfo};

// Dispatch and queries
pub use dispatch::{IterMapFrom, MapFrom, NullableIterMapFrom, NullableMapFrom};
pub use query::{Projection, Query};

// Validation
pub use validate::{DiagnosticBlock, DiagnosticReport, ValidationMode};

// Macros
pub use fieldmap_macros::{Shape, mapper, mappings};

