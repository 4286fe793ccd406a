//! `#[mappings]` attribute implementation
//!
//! Implements `fieldmap::MappingSet` for the annotated `impl` block. Every
//! mapper-shaped method gets a registration whose metadata carries the compiled
//! body; the declarative markers on the methods are consumed here.

use darling::ast::NestedMeta;
use darling::FromMeta;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, FnArg, GenericParam, ImplItem, ImplItemFn, ItemImpl, Visibility};

use crate::body::BodyCompiler;
use crate::signature::{Kind, Markers, Signature};
use crate::utils::{last_segment, Param};

/// Arguments of `#[mappings(..)]`
#[derive(Debug, Default, FromMeta)]
pub(crate) struct MappingsArgs {
    /// Validate every method of the set in source mode
    #[darling(default)]
    validate_source: bool,
}

/// Process the mappings attribute
pub fn process_mappings(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(args) => args,
        Err(err) => return darling::Error::from(err).write_errors().into(),
    };
    let args = match MappingsArgs::from_list(&args) {
        Ok(args) => args,
        Err(err) => return err.write_errors().into(),
    };
    let mut item_impl = parse_macro_input!(item as ItemImpl);

    match expand(&args, &mut item_impl) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

pub(crate) fn expand(args: &MappingsArgs, item_impl: &mut ItemImpl) -> syn::Result<TokenStream2> {
    if item_impl.trait_.is_some() {
        return Err(syn::Error::new_spanned(
            &item_impl.self_ty,
            "#[mappings] goes on an inherent impl block",
        ));
    }

    let owner = last_segment(&item_impl.self_ty).unwrap_or_else(|| "<unnamed>".to_string());
    let owner = quote! { #owner };
    let mut registrations = Vec::new();

    for item in &mut item_impl.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let mut markers = Markers::take(&mut method.attrs)?;
        markers.validate_source |= args.validate_source;

        if let Some(registration) = registration(&owner, method, &markers) {
            registrations.push(registration);
        }
    }

    let self_ty = &item_impl.self_ty;
    let (impl_generics, _, where_clause) = item_impl.generics.split_for_impl();

    Ok(quote! {
        #item_impl

        impl #impl_generics ::fieldmap::MappingSet for #self_ty #where_clause {
            fn registrations(
                instance: &::std::sync::Arc<Self>,
            ) -> ::std::vec::Vec<::fieldmap::Registration> {
                let _ = instance;
                let mut registrations = ::std::vec::Vec::new();
                #(#registrations)*
                registrations
            }
        }
    })
}

/// Registration statement for one method, `None` when it is not a mapper
fn registration(owner: &TokenStream2, method: &ImplItemFn, markers: &Markers) -> Option<TokenStream2> {
    let sig = &method.sig;
    let generic = sig
        .generics
        .params
        .iter()
        .any(|param| !matches!(param, GenericParam::Lifetime(_)));
    if generic {
        return None;
    }

    let has_self = match sig.receiver() {
        None => false,
        Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() => true,
        Some(_) => return None,
    };

    let params = sig
        .inputs
        .iter()
        .filter_map(|input| match input {
            FnArg::Typed(typed) => Some(Param::from_typed(&typed.pat, &typed.ty)),
            FnArg::Receiver(_) => None,
        })
        .collect();
    let signature = Signature::classify(params, &sig.output)?;

    let name = sig.ident.to_string();
    let ident = &sig.ident;
    let public = matches!(method.vis, Visibility::Public(_));
    let body = BodyCompiler::new(signature.param_names()).compile_block(&method.block);
    let info = signature.method_info(owner, &name, public, &body, markers);

    if !public {
        return Some(quote! {
            registrations.extend(::fieldmap::Registration::declare(#info));
        });
    }

    let constructor = signature.constructor();
    let callable = if signature.kind == Kind::Projection {
        if has_self {
            quote! { instance.#ident() }
        } else {
            quote! { Self::#ident() }
        }
    } else {
        let (params, args) = signature.closure_params();
        if has_self {
            quote! {{
                let this = ::std::sync::Arc::clone(instance);
                move |#(#params),*| this.#ident(#(#args),*)
            }}
        } else {
            quote! { |#(#params),*| Self::#ident(#(#args),*) }
        }
    };

    Some(quote! {
        registrations.push(::fieldmap::Registration::#constructor(#info, #callable));
    })
}
