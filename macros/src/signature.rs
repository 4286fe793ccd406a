//! Mapper signatures and declarative markers shared by `#[mappings]` and `mapper!`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::parse::ParseStream;
use syn::{Attribute, Ident, LitStr, ReturnType, Type};

use crate::body::CompiledBody;
use crate::utils::{projection_types, Param, PassMode};

/// Accepted mapper shapes, mirrors `fieldmap::MethodShape`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    SimpleMap,
    Map,
    SimpleFactory,
    Factory,
    Projection,
}

#[derive(Debug, Clone)]
pub enum Returns {
    Unit,
    Value(Type),
    Projection(Type, Type),
}

/// Signature of a mapper-shaped function
#[derive(Debug, Clone)]
pub struct Signature {
    pub kind: Kind,
    pub params: Vec<Param>,
    pub returns: Returns,
}

impl Signature {
    /// Classify a parameter list and return type, `None` when it is not mapper-shaped
    pub fn classify(params: Vec<Param>, output: &ReturnType) -> Option<Self> {
        let returns = match output {
            ReturnType::Default => Returns::Unit,
            ReturnType::Type(_, ty) => match projection_types(ty) {
                Some((from, to)) => Returns::Projection(from, to),
                None => Returns::Value(ty.as_ref().clone()),
            },
        };

        let is_ref = |p: &Param| p.mode == PassMode::Ref && !p.is_registry();
        let kind = match (&returns, params.as_slice()) {
            (Returns::Unit, [from, to]) if is_ref(from) && to.mode == PassMode::RefMut => Kind::SimpleMap,
            (Returns::Unit, [map, from, to])
                if map.is_registry() && is_ref(from) && to.mode == PassMode::RefMut =>
            {
                Kind::Map
            }
            (Returns::Value(_), [from]) if is_ref(from) => Kind::SimpleFactory,
            (Returns::Value(_), [map, from]) if map.is_registry() && is_ref(from) => Kind::Factory,
            (Returns::Projection(..), []) => Kind::Projection,
            _ => return None,
        };

        Some(Self {
            kind,
            params,
            returns,
        })
    }

    /// Name of the `Registration` constructor for this shape
    pub fn constructor(&self) -> Ident {
        format_ident!(
            "{}",
            match self.kind {
                Kind::SimpleMap => "simple_map",
                Kind::Map => "map",
                Kind::SimpleFactory => "simple_factory",
                Kind::Factory => "factory",
                Kind::Projection => "projection",
            }
        )
    }

    /// Parameter names, used by the body compiler
    pub fn param_names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }

    /// `map: &::fieldmap::MapRegistry, from: &S, to: &mut T` for a forwarding closure
    pub fn closure_params(&self) -> (Vec<TokenStream>, Vec<Ident>) {
        self.params
            .iter()
            .enumerate()
            .map(|(index, param)| {
                let name = format_ident!("__arg{}", index);
                let ty = &param.ty;
                let tokens = match param.mode {
                    PassMode::Ref => quote! { #name: &#ty },
                    PassMode::RefMut => quote! { #name: &mut #ty },
                    PassMode::Value => quote! { #name: #ty },
                };
                (tokens, name)
            })
            .unzip()
    }

    /// `::fieldmap::MethodInfo` builder expression
    pub fn method_info(
        &self,
        owner: &TokenStream,
        name: &str,
        public: bool,
        body: &CompiledBody,
        markers: &Markers,
    ) -> TokenStream {
        let params = self.params.iter().map(|param| {
            let ty = &param.ty;
            let param_name = &param.name;
            let mode = param.mode.tokens();
            quote! { .with_param::<#ty>(#param_name, #mode) }
        });
        let returns = match &self.returns {
            Returns::Unit => quote! {},
            Returns::Value(ty) => quote! { .with_return::<#ty>() },
            Returns::Projection(from, to) => quote! { .with_projection::<#from, #to>() },
        };
        let body = body.to_tokens();
        let ignored = &markers.ignored;
        let ignore = (!ignored.is_empty()).then(|| quote! { .ignore([#(#ignored),*]) });
        let validate_source = markers.validate_source.then(|| quote! { .validate_source() });
        let ignore_method = markers.ignore_method.then(|| quote! { .ignore_method() });

        quote! {
            ::fieldmap::MethodInfo::new(#owner, #name)
                .with_public(#public)
                #(#params)*
                #returns
                .with_body(#body)
                #ignore
                #validate_source
                #ignore_method
        }
    }
}

/// Declarative markers on a mapper
#[derive(Debug, Clone, Default)]
pub struct Markers {
    pub ignored: Vec<String>,
    pub validate_source: bool,
    pub ignore_method: bool,
}

impl Markers {
    /// Collect and remove `#[map_ignore]`, `#[map_validate_source]` and
    /// `#[map_ignore_method]` from an attribute list
    pub fn take(attrs: &mut Vec<Attribute>) -> syn::Result<Self> {
        let mut markers = Self::default();
        let mut kept = Vec::with_capacity(attrs.len());

        for attr in attrs.drain(..) {
            let path = attr.path();
            if path.is_ident("map_ignore") {
                markers.ignored.extend(attr.parse_args_with(parse_field_names)?);
            } else if path.is_ident("map_validate_source") {
                attr.meta.require_path_only()?;
                markers.validate_source = true;
            } else if path.is_ident("map_ignore_method") {
                attr.meta.require_path_only()?;
                markers.ignore_method = true;
            } else {
                kept.push(attr);
            }
        }

        *attrs = kept;
        Ok(markers)
    }
}

/// `name, "other", ...`
fn parse_field_names(input: ParseStream) -> syn::Result<Vec<String>> {
    let mut names = Vec::new();
    while !input.is_empty() {
        if input.peek(LitStr) {
            names.push(input.parse::<LitStr>()?.value());
        } else {
            let ident = Ident::parse_any(input)?.to_string();
            names.push(ident.trim_start_matches("r#").to_string());
        }
        if input.is_empty() {
            break;
        }
        input.parse::<syn::Token![,]>()?;
    }
    Ok(names)
}
