//! Shape derive macro implementation
//!
//! Lists the public fields of a struct for the validator and exposes its
//! parameterless constructor to the instance factory.

use darling::{ast, FromDeriveInput, FromField};
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Visibility};

/// Receiver for the struct that derives Shape
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(shape), supports(struct_named, struct_unit))]
pub struct ShapeReceiver {
    /// The struct identifier
    ident: syn::Ident,
    /// Generics, passed through to the impl
    generics: syn::Generics,
    /// The struct data with parsed fields
    data: ast::Data<(), ShapeFieldReceiver>,
    /// Display name, defaults to the identifier
    #[darling(default)]
    name: Option<String>,
    /// The type has no `Default` impl to construct it with
    #[darling(default)]
    no_default: bool,
}

/// Receiver for the fields in the struct
#[derive(Debug, FromField)]
#[darling(attributes(shape))]
pub struct ShapeFieldReceiver {
    /// The field identifier
    ident: Option<syn::Ident>,
    /// Field visibility; only public fields take part in mapping
    vis: Visibility,
    /// Readable but never expected to be assigned
    #[darling(default)]
    readonly: bool,
    /// Excluded from the shape entirely
    #[darling(default)]
    skip: bool,
}

/// Process the Shape derive macro
pub fn process_derive_shape(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let receiver = match ShapeReceiver::from_derive_input(&input) {
        Ok(receiver) => receiver,
        Err(err) => return err.write_errors().into(),
    };

    TokenStream::from(generate_shape_impl(&receiver))
}

fn generate_shape_impl(receiver: &ShapeReceiver) -> proc_macro2::TokenStream {
    let ident = &receiver.ident;
    let (impl_generics, ty_generics, where_clause) = receiver.generics.split_for_impl();
    let ident_name = ident.to_string();
    let name = receiver.name.clone().unwrap_or_else(|| ident_name.clone());

    let fields = match &receiver.data {
        ast::Data::Struct(fields) => fields
            .iter()
            .filter(|field| !field.skip && !matches!(field.vis, Visibility::Inherited))
            .filter_map(|field| {
                let field_name = field.ident.as_ref()?.to_string();
                Some(if field.readonly {
                    quote! { ::fieldmap::FieldInfo::read_only(#field_name) }
                } else {
                    quote! { ::fieldmap::FieldInfo::new(#field_name) }
                })
            })
            .collect::<Vec<_>>(),
        ast::Data::Enum(_) => Vec::new(),
    };
    let is_unit = matches!(&receiver.data, ast::Data::Struct(fields) if fields.style == ast::Style::Unit);

    let constructor = if receiver.no_default {
        quote! { ::core::option::Option::None }
    } else if is_unit {
        quote! { ::core::option::Option::Some(|| Self) }
    } else {
        quote! { ::core::option::Option::Some(<Self as ::core::default::Default>::default) }
    };

    quote! {
        impl #impl_generics ::fieldmap::Shape for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
            const IDENT: &'static str = #ident_name;
            const FIELDS: &'static [::fieldmap::FieldInfo] = &[#(#fields),*];

            fn constructor() -> ::core::option::Option<fn() -> Self> {
                #constructor
            }
        }
    }
}
