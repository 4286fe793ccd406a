//! `mapper!` implementation
//!
//! Wraps a closure into a `fieldmap::Registration` whose metadata carries the
//! compiled closure body, so closures registered this way can be validated.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, Attribute, ExprClosure, Pat};

use crate::body::BodyCompiler;
use crate::signature::{Kind, Markers, Signature};
use crate::utils::Param;

pub(crate) struct MapperInput {
    attrs: Vec<Attribute>,
    closure: ExprClosure,
}

impl Parse for MapperInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut attrs = input.call(Attribute::parse_outer)?;
        let mut closure: ExprClosure = input.parse()?;
        attrs.append(&mut closure.attrs);
        Ok(Self { attrs, closure })
    }
}

/// Process the mapper macro
pub fn process_mapper(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as MapperInput);
    match expand(input) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

pub(crate) fn expand(mut input: MapperInput) -> syn::Result<TokenStream2> {
    let markers = Markers::take(&mut input.attrs)?;
    if let Some(attr) = input.attrs.first() {
        return Err(syn::Error::new_spanned(attr, "unsupported attribute on mapper"));
    }

    let closure = &input.closure;
    let params = closure
        .inputs
        .iter()
        .map(|pat| match pat {
            Pat::Type(typed) => Ok(Param::from_typed(&typed.pat, &typed.ty)),
            other => Err(syn::Error::new_spanned(
                other,
                "mapper parameters need explicit types",
            )),
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let signature = Signature::classify(params, &closure.output).ok_or_else(|| {
        syn::Error::new_spanned(
            closure,
            "expected |&S, &mut T|, |&MapRegistry, &S, &mut T|, |&S| -> T or |&MapRegistry, &S| -> T",
        )
    })?;
    if signature.kind == Kind::Projection {
        return Err(syn::Error::new_spanned(
            closure,
            "register projections with Registration::projection",
        ));
    }

    let body = BodyCompiler::new(signature.param_names()).compile_expr(&closure.body);
    let owner = quote! { ::core::module_path!() };
    let info = signature.method_info(&owner, "{closure}", true, &body, &markers);
    let constructor = signature.constructor();

    Ok(quote! {
        ::fieldmap::Registration::#constructor(#info, #closure)
    })
}
