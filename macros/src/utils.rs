//! Utility functions for procedural macros
//!
//! Type inspection helpers shared by `#[mappings]`, `mapper!` and the body
//! compiler.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Expr, GenericArgument, Pat, PathArguments, Type};

/// How a parameter is passed, mirrors `fieldmap::registry::PassMode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    Ref,
    RefMut,
    Value,
}

impl PassMode {
    pub fn tokens(self) -> TokenStream {
        match self {
            Self::Ref => quote! { ::fieldmap::registry::PassMode::Ref },
            Self::RefMut => quote! { ::fieldmap::registry::PassMode::RefMut },
            Self::Value => quote! { ::fieldmap::registry::PassMode::Value },
        }
    }
}

/// A parameter of a mapping function
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub mode: PassMode,
}

impl Param {
    /// Build from a typed pattern such as `from: &User`
    pub fn from_typed(pat: &Pat, ty: &Type) -> Self {
        let (ty, mode) = strip_reference(ty);
        Self {
            name: pattern_name(pat),
            ty: ty.clone(),
            mode,
        }
    }

    /// Whether this parameter is `&MapRegistry`
    pub fn is_registry(&self) -> bool {
        self.mode == PassMode::Ref && last_segment(&self.ty).is_some_and(|name| name == "MapRegistry")
    }
}

/// Remove one level of reference from a type
pub fn strip_reference(ty: &Type) -> (&Type, PassMode) {
    match ty {
        Type::Reference(reference) if reference.mutability.is_some() => {
            (reference.elem.as_ref(), PassMode::RefMut)
        }
        Type::Reference(reference) => (reference.elem.as_ref(), PassMode::Ref),
        Type::Paren(paren) => strip_reference(&paren.elem),
        Type::Group(group) => strip_reference(&group.elem),
        _ => (ty, PassMode::Value),
    }
}

/// Name bound by a parameter pattern, `_` when it binds no single identifier
pub fn pattern_name(pat: &Pat) -> String {
    match pat {
        Pat::Ident(ident) => ident.ident.to_string(),
        Pat::Type(typed) => pattern_name(&typed.pat),
        _ => "_".to_string(),
    }
}

/// Last path segment of a type, references stripped
pub fn last_segment(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        Type::Reference(reference) => last_segment(&reference.elem),
        Type::Paren(paren) => last_segment(&paren.elem),
        Type::Group(group) => last_segment(&group.elem),
        _ => None,
    }
}

/// `(S, T)` when the type is `Projection<S, T>`
pub fn projection_types(ty: &Type) -> Option<(Type, Type)> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Projection" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty.clone()),
        _ => None,
    });
    Some((types.next()?, types.next()?))
}

/// First generic type argument of the last segment of a turbofish
pub fn turbofish_type(turbofish: Option<&syn::AngleBracketedGenericArguments>) -> Option<String> {
    turbofish?.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => last_segment(ty),
        _ => None,
    })
}

/// Strip parentheses, references, dereferences and invisible groups
pub fn peel(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(inner) => peel(&inner.expr),
        Expr::Group(inner) => peel(&inner.expr),
        Expr::Reference(inner) => peel(&inner.expr),
        Expr::Unary(unary) if matches!(unary.op, syn::UnOp::Deref(_)) => peel(&unary.expr),
        _ => expr,
    }
}

/// The single identifier of a path expression
pub fn single_ident(expr: &Expr) -> Option<String> {
    match peel(expr) {
        Expr::Path(path) if path.qself.is_none() => path.path.get_ident().map(ToString::to_string),
        _ => None,
    }
}

/// Whether a path segment names a type by convention
pub fn is_type_name(segment: &str) -> bool {
    segment.chars().next().is_some_and(char::is_uppercase)
}
