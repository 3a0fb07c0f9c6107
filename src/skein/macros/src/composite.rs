use proc_macro2::TokenStream;
use syn::{spanned::Spanned, Data, Path, Result, Visibility};

use crate::utils::default_crate_path;

mod ast;
use self::ast::{Enum, Struct};

mod attrs;
use self::attrs::Attrs;

pub fn derive_composite(node: syn::DeriveInput) -> Result<TokenStream> {
    let input = Struct::from_syn(&node)?;
    input.validate()?;

    let path = crate_path(&input.attrs);
    derive_struct(input, &path)
}

pub fn derive_enum(node: syn::DeriveInput) -> Result<TokenStream> {
    let input = Enum::from_syn(&node)?;
    input.validate()?;

    let path = crate_path(&input.attrs);
    expand_enum(input, &path)
}

macro_rules! spanned_trait {
    ($trait:path, $input:expr, $path:ident) => {{
        let vis_span = match &$input.vis {
            Visibility::Public(vis) => Some(vis.pub_token.span()),
            Visibility::Crate(vis) => Some(vis.crate_token.span()),
            Visibility::Restricted(vis) => Some(vis.pub_token.span()),
            Visibility::Inherited => None,
        };
        let data_span = match &$input.data {
            Data::Struct(data) => data.struct_token.span(),
            Data::Enum(data) => data.enum_token.span(),
            Data::Union(data) => data.union_token.span(),
        };
        let first_span = vis_span.unwrap_or(data_span);
        let last_span = $input.ident.span();

        let path = quote_spanned!(first_span => #$path::);
        let ty = quote_spanned!(last_span => $trait);

        quote!(#path #ty)
    }};
}

fn derive_struct(input: Struct<'_>, path: &Path) -> Result<TokenStream> {
    let ty = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let name = input.name();
    let fields: Vec<_> = input.fields.iter().filter(|f| !f.is_skipped()).collect();

    let writes = fields.iter().map(|f| {
        let ident = &f.ident;
        let name = f.name();
        if f.candidates().is_some() {
            quote!(ctx.write_polymorphic_field(#name, &self.#ident)?;)
        } else {
            quote!(ctx.write_field(#name, &self.#ident)?;)
        }
    });

    let reads = fields.iter().map(|f| {
        let ident = &f.ident;
        let name = f.name();
        let read = match f.candidates() {
            Some(candidates) => quote! {
                ctx.read_polymorphic_field(#name, &#path::candidates![#(#candidates),*])?
            },
            None => quote!(ctx.read_field(#name)?),
        };

        // Absent defaulted fields keep what the placeholder holds.
        if f.is_defaulted() {
            quote! {
                if ctx.contains(#name) {
                    self.#ident = #read;
                }
            }
        } else {
            quote!(self.#ident = #read;)
        }
    });

    let subtypes = input.bases().iter().map(|base| {
        quote! {
            impl #impl_generics #path::Subtype<#base> for #ty #ty_generics #where_clause {
                #[inline]
                fn upcast(this: #path::Shared<Self>) -> #path::Shared<#base> {
                    this
                }
            }
        }
    });

    let composite = spanned_trait!(CompositeSerializable, input.original, path);

    Ok(quote! {
        impl #impl_generics #composite for #ty #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn serialize(
                &self,
                ctx: &mut #path::CompositeSerializationContext<'_, '_>,
            ) -> #path::Result<()> {
                #(#writes)*
                ::std::result::Result::Ok(())
            }

            #[allow(unused_variables)]
            fn deserialize(
                &mut self,
                ctx: &mut #path::CompositeDeserializationContext<'_, '_>,
            ) -> #path::Result<()> {
                #(#reads)*
                ::std::result::Result::Ok(())
            }

            #[inline]
            fn type_name(&self) -> &'static ::std::primitive::str {
                #name
            }
        }

        #(#subtypes)*
    })
}

fn expand_enum(input: Enum<'_>, path: &Path) -> Result<TokenStream> {
    let ty = &input.ident;

    let idents: Vec<_> = input.variants.iter().map(|v| &v.ident).collect();
    let names: Vec<_> = input.variants.iter().map(|v| v.name()).collect();

    let enum_trait = spanned_trait!(SerializableEnum, input.original, path);

    Ok(quote! {
        impl #enum_trait for #ty {
            fn name(&self) -> &'static ::std::primitive::str {
                match self {
                    #(#ty::#idents => #names,)*
                }
            }

            fn from_name(name: &::std::primitive::str) -> ::std::option::Option<Self> {
                match name {
                    #(#names => ::std::option::Option::Some(#ty::#idents),)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        #path::impl_enum_value!(#ty);
    })
}

fn crate_path(attrs: &Attrs<'_>) -> Path {
    attrs
        .skein_crate
        .as_ref()
        .map(|attr| attr.krate.clone())
        .unwrap_or_else(default_crate_path)
}
