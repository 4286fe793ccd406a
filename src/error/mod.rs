//! Error handling for the mapping registry.

use crate::validate::DiagnosticReport;

/// Errors raised by registration, dispatch and validation
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// A registration was submitted without a callable function
    #[error("Mapping function from {from} to {to} is missing")]
    NullFunction {
        /// Source type name
        from: &'static str,
        /// Destination type name
        to: &'static str,
    },

    /// No parameterless constructor is available and no factory override applies
    #[error("Type {type_name} has no parameterless constructor")]
    NoParameterlessConstructor {
        /// Full type name
        type_name: &'static str,
    },

    /// Nothing is registered for the requested type pair
    #[error("Map from {from} to {to} is not registered.")]
    MappingNotFound {
        /// Source type name
        from: &'static str,
        /// Destination type name
        to: &'static str,
    },

    /// The validator found fields no registered function covers
    #[error("{0}")]
    IncompleteMapping(DiagnosticReport),

    /// The factory override produced an instance of the wrong type
    #[error("Factory override returned a value that is not a {expected}")]
    FactoryTypeMismatch {
        /// Full name of the requested type
        expected: &'static str,
    },

    /// Two methods of one mapping set claim the same registration slot
    #[error("{owner}: methods {first} and {second} both map {from} to {to}")]
    ShapeCollision {
        /// Mapping set type name
        owner: &'static str,
        /// Method registered first
        first: &'static str,
        /// Method registered second
        second: &'static str,
        /// Source type name
        from: &'static str,
        /// Destination type name
        to: &'static str,
    },

    /// A compiled method body could not be disassembled
    #[error("Invalid body for method {method}: {reason}")]
    InvalidMethodBody {
        /// Method display name
        method: String,
        /// What went wrong while decoding
        reason: String,
    },

    /// Error raised by a user supplied factory override, passed through as-is
    #[error(transparent)]
    Factory(#[from] anyhow::Error),
}

impl MapError {
    /// Create a `MappingNotFound` error for a type pair
    #[must_use]
    pub fn not_found<S: ?Sized, T: ?Sized>() -> Self {
        Self::MappingNotFound {
            from: std::any::type_name::<S>(),
            to: std::any::type_name::<T>(),
        }
    }

    /// The diagnostic report carried by `IncompleteMapping`
    #[must_use]
    pub fn report(&self) -> Option<&DiagnosticReport> {
        match self {
            Self::IncompleteMapping(report) => Some(report),
            _ => None,
        }
    }
}

/// Result type for mapping operations
pub type Result<T> = std::result::Result<T, MapError>;
