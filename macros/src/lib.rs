//! Procedural macros for the fieldmap crate
//!
//! `#[derive(Shape)]` describes the fields of a mapping participant,
//! `#[mappings]` turns an `impl` block into an auto-registrable mapping set and
//! `mapper!` wraps a single closure. The last two compile each mapper body into
//! the bytecode the completeness validator reads.

use proc_macro::TokenStream;

mod body;
mod mapper;
mod mappings;
mod shape_derive;
mod signature;
mod utils;

#[cfg(test)]
mod tests;

/// Derive macro for `fieldmap::Shape`
///
/// Public fields are listed in declaration order. The parameterless constructor
/// is `Default::default` unless `#[shape(no_default)]` is given; unit structs
/// construct themselves.
///
/// # Example
///
/// ```ignore
/// #[derive(Default, Shape)]
/// pub struct UserModel {
///     pub name: String,
///
///     #[shape(readonly)]
///     pub id: u64,
///
///     #[shape(skip)]
///     pub cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Shape, attributes(shape))]
pub fn derive_shape(input: TokenStream) -> TokenStream {
    shape_derive::process_derive_shape(input)
}

/// Mark an `impl` block as a mapping set
///
/// Methods shaped like `(&S, &mut T)`, `(&MapRegistry, &S, &mut T)`,
/// `(&S) -> T`, `(&MapRegistry, &S) -> T` or `() -> Projection<S, T>` are
/// collected in declaration order. Methods may carry `#[map_ignore(field, ..)]`,
/// `#[map_validate_source]` and `#[map_ignore_method]`.
///
/// # Example
///
/// ```ignore
/// #[mappings]
/// impl UserMaps {
///     #[map_ignore(created)]
///     pub fn map(&self, from: &User, to: &mut UserModel) {
///         to.name = from.name.clone();
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn mappings(attr: TokenStream, item: TokenStream) -> TokenStream {
    mappings::process_mappings(attr, item)
}

/// Build a `fieldmap::Registration` from a closure with an inspectable body
///
/// # Example
///
/// ```ignore
/// builder.register(mapper!(#[map_ignore(id)] |from: &User, to: &mut UserModel| {
///     to.name = from.name.clone();
/// }))?;
/// ```
#[proc_macro]
pub fn mapper(input: TokenStream) -> TokenStream {
    mapper::process_mapper(input)
}
