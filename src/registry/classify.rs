//! Classification of mapping functions by signature shape.

use std::any::TypeId;

use super::MapRegistry;
use super::method::{MethodInfo, PassMode, Returns};
use crate::shape::TypeInfo;

/// The closed set of accepted mapping function shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodShape {
    /// `fn(&S, &mut T)`
    SimpleMap,
    /// `fn(&MapRegistry, &S, &mut T)`
    Map,
    /// `fn(&S) -> T`
    SimpleFactory,
    /// `fn(&MapRegistry, &S) -> T`
    Factory,
    /// `fn() -> Projection<S, T>`
    Projection,
}

/// Which registration slot a shape fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Mutates an existing destination
    InPlace,
    /// Produces a new destination
    Factory,
    /// Composable projection expression
    Projection,
}

/// Result of classifying a method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    /// Signature shape
    pub shape: MethodShape,
    /// Source type
    pub from: TypeInfo,
    /// Destination type
    pub to: TypeInfo,
}

impl MethodShape {
    /// Classify a method by its parameters and return kind
    ///
    /// Returns `None` when the signature matches none of the accepted shapes.
    #[must_use]
    pub fn classify(method: &MethodInfo) -> Option<Classified> {
        let registry = TypeId::of::<MapRegistry>();
        let is_registry = |ty: &TypeInfo| ty.id() == registry;
        let params = method.params.as_slice();

        let (shape, from, to) = match (method.returns, params) {
            (Returns::Unit, [from, to])
                if from.mode == PassMode::Ref
                    && to.mode == PassMode::RefMut
                    && !is_registry(&from.ty) =>
            {
                (Self::SimpleMap, from.ty, to.ty)
            }
            (Returns::Unit, [map, from, to])
                if map.mode == PassMode::Ref
                    && is_registry(&map.ty)
                    && from.mode == PassMode::Ref
                    && to.mode == PassMode::RefMut =>
            {
                (Self::Map, from.ty, to.ty)
            }
            (Returns::Value(to), [from]) if from.mode == PassMode::Ref && !is_registry(&from.ty) => {
                (Self::SimpleFactory, from.ty, to)
            }
            (Returns::Value(to), [map, from])
                if map.mode == PassMode::Ref
                    && is_registry(&map.ty)
                    && from.mode == PassMode::Ref =>
            {
                (Self::Factory, from.ty, to)
            }
            (Returns::Projection { from, to }, []) => (Self::Projection, from, to),
            _ => return None,
        };

        Some(Classified { shape, from, to })
    }

    /// The registration slot this shape fills
    #[must_use]
    pub fn slot(self) -> SlotKind {
        match self {
            Self::SimpleMap | Self::Map => SlotKind::InPlace,
            Self::SimpleFactory | Self::Factory => SlotKind::Factory,
            Self::Projection => SlotKind::Projection,
        }
    }

    /// Index of the parameter holding the destination, `None` for factories
    #[must_use]
    pub fn destination_param(self) -> Option<usize> {
        match self {
            Self::SimpleMap => Some(1),
            Self::Map => Some(2),
            _ => None,
        }
    }

    /// Index of the parameter holding the source
    #[must_use]
    pub fn source_param(self) -> Option<usize> {
        match self {
            Self::SimpleMap | Self::SimpleFactory => Some(0),
            Self::Map | Self::Factory => Some(1),
            Self::Projection => None,
        }
    }
}
