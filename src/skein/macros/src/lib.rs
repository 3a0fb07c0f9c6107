//! Derive macros for use with [`skein`].
//!
//! There is no need to directly add this crate to application
//! dependencies as these macros are already re-exported by
//! [`skein`].
//!
//! [`skein`]: ../skein/

#[macro_use]
extern crate quote;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod composite;
mod utils;

/// Derives `CompositeSerializable` for a struct with named fields.
///
/// Every field is written and read under its own name, in
/// declaration order. The following attributes are understood:
///
/// - `#[skein_crate(path)]` on the struct overrides the path to
///   the `skein` crate in generated code.
///
/// - `#[object(name = "...")]` overrides the type name written as
///   the `$type` tag of polymorphic values.
///
/// - `#[object(subtype_of(dyn Base, ...))]` declares the struct as
///   a subtype of the given polymorphic bases.
///
/// - `#[field(name = "...")]` overrides the name of a field.
///
/// - `#[field(skip)]` leaves a field out of the document; it keeps
///   the value of the placeholder on reading.
///
/// - `#[field(default)]` makes an absent field keep the value of
///   the placeholder instead of failing.
///
/// - `#[field(polymorphic(A, B, ...))]` writes the objects in a
///   field with their `$type` tag and reads them back as one of
///   the listed candidates.
#[proc_macro_derive(Composite, attributes(skein_crate, object, field))]
pub fn derive_composite(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    composite::derive_composite(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `SerializableEnum` for a fieldless enum.
///
/// Variants are represented by their identifiers unless renamed
/// with `#[variant(name = "...")]`.
#[proc_macro_derive(SerializableEnum, attributes(skein_crate, variant))]
pub fn derive_serializable_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    composite::derive_enum(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
