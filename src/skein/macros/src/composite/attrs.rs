use syn::{
    parenthesized,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    token, Attribute, Error, LitStr, Result, Token, Type,
};

mod kw {
    syn::custom_keyword!(name);
    syn::custom_keyword!(subtype_of);
    syn::custom_keyword!(skip);
    syn::custom_keyword!(default);
    syn::custom_keyword!(polymorphic);
}

pub struct Attrs<'a> {
    pub skein_crate: Option<CrateAttr<'a>>,
    pub object: Option<ObjectAttr<'a>>,
    pub field: Option<FieldAttr<'a>>,
    pub variant: Option<VariantAttr<'a>>,
}

pub fn get(input: &[Attribute]) -> Result<Attrs<'_>> {
    let mut attrs = Attrs {
        skein_crate: None,
        object: None,
        field: None,
        variant: None,
    };

    for attr in input {
        if attr.path.is_ident("skein_crate") {
            parse_crate_attr(&mut attrs, attr)?;
        } else if attr.path.is_ident("object") {
            parse_object_attr(&mut attrs, attr)?;
        } else if attr.path.is_ident("field") {
            parse_field_attr(&mut attrs, attr)?;
        } else if attr.path.is_ident("variant") {
            parse_variant_attr(&mut attrs, attr)?;
        }
    }

    Ok(attrs)
}

/// #[skein_crate(...)]
///
/// Only on structs and enums.
pub struct CrateAttr<'a> {
    pub original: &'a Attribute,
    pub krate: syn::Path,
}

fn parse_crate_attr<'a>(attrs: &mut Attrs<'a>, attr: &'a Attribute) -> Result<()> {
    if attrs.skein_crate.is_some() {
        return Err(Error::new_spanned(
            attr,
            "duplicate #[skein_crate] attribute found",
        ));
    }

    attrs.skein_crate = Some(CrateAttr {
        original: attr,
        krate: parse_crate_path(attr)?,
    });
    Ok(())
}

/// #[object(..)]
///
/// Only on structs.
pub struct ObjectAttr<'a> {
    pub original: &'a Attribute,
    name: Option<LitStr>,
    pub subtype_of: Vec<Type>,
}

impl<'a> ObjectAttr<'a> {
    pub fn name(&self) -> Option<String> {
        self.name.as_ref().map(|name| name.value())
    }
}

fn parse_object_attr<'a>(attrs: &mut Attrs<'a>, attr: &'a Attribute) -> Result<()> {
    let object = attrs.object.get_or_insert_with(|| ObjectAttr {
        original: attr,
        name: None,
        subtype_of: Vec::new(),
    });

    attr.parse_args_with(|input: ParseStream<'_>| {
        let mut first = true;
        while !input.is_empty() {
            if !first {
                input.parse::<Token![,]>()?;
            }

            let look = input.lookahead1();
            if look.peek(kw::name) {
                if object.name.is_some() {
                    return Err(Error::new_spanned(
                        attr,
                        "duplicate #[object(name)] attribute found",
                    ));
                }

                let AttrWrapper::<kw::name, LitStr> { value: name, .. } = input.parse()?;
                object.name = Some(name);
            } else if look.peek(kw::subtype_of) {
                input.parse::<kw::subtype_of>()?;
                object.subtype_of.extend(parse_type_list(input)?);
            } else {
                return Err(look.error());
            }

            first = false;
        }

        Ok(())
    })
}

/// #[field(..)]
///
/// Only on struct fields.
pub struct FieldAttr<'a> {
    pub original: &'a Attribute,
    name: Option<LitStr>,
    pub skip: bool,
    pub default: bool,
    pub polymorphic: Option<Vec<Type>>,
}

impl<'a> FieldAttr<'a> {
    pub fn name(&self) -> Option<String> {
        self.name.as_ref().map(|name| name.value())
    }
}

fn parse_field_attr<'a>(attrs: &mut Attrs<'a>, attr: &'a Attribute) -> Result<()> {
    let field = attrs.field.get_or_insert_with(|| FieldAttr {
        original: attr,
        name: None,
        skip: false,
        default: false,
        polymorphic: None,
    });

    // Allow the `#[field]` notation to be accepted.
    if attr.tokens.is_empty() {
        return Ok(());
    }

    attr.parse_args_with(|input: ParseStream<'_>| {
        let mut first = true;
        while !input.is_empty() {
            if !first {
                input.parse::<Token![,]>()?;
            }

            let look = input.lookahead1();
            if look.peek(kw::skip) {
                if field.skip {
                    return Err(Error::new_spanned(
                        attr,
                        "duplicate #[field(skip)] attribute found",
                    ));
                }

                input.parse::<kw::skip>()?;
                field.skip = true;
            } else if look.peek(kw::default) {
                if field.default {
                    return Err(Error::new_spanned(
                        attr,
                        "duplicate #[field(default)] attribute found",
                    ));
                }

                input.parse::<kw::default>()?;
                field.default = true;
            } else if look.peek(kw::name) {
                if field.name.is_some() {
                    return Err(Error::new_spanned(
                        attr,
                        "duplicate #[field(name)] attribute found",
                    ));
                }

                let AttrWrapper::<kw::name, LitStr> { value: name, .. } = input.parse()?;
                field.name = Some(name);
            } else if look.peek(kw::polymorphic) {
                if field.polymorphic.is_some() {
                    return Err(Error::new_spanned(
                        attr,
                        "duplicate #[field(polymorphic)] attribute found",
                    ));
                }

                input.parse::<kw::polymorphic>()?;
                let candidates = parse_type_list(input)?;
                if candidates.is_empty() {
                    return Err(Error::new_spanned(
                        attr,
                        "#[field(polymorphic)] needs at least one candidate type",
                    ));
                }
                field.polymorphic = Some(candidates);
            } else {
                return Err(look.error());
            }

            first = false;
        }
        Ok(())
    })
}

/// #[variant(..)]
///
/// Only on enum variants.
pub struct VariantAttr<'a> {
    pub original: &'a Attribute,
    name: Option<LitStr>,
}

impl<'a> VariantAttr<'a> {
    pub fn name(&self) -> Option<String> {
        self.name.as_ref().map(|name| name.value())
    }
}

fn parse_variant_attr<'a>(attrs: &mut Attrs<'a>, attr: &'a Attribute) -> Result<()> {
    let variant = attrs.variant.get_or_insert_with(|| VariantAttr {
        original: attr,
        name: None,
    });

    attr.parse_args_with(|input: ParseStream<'_>| {
        let look = input.lookahead1();
        if look.peek(kw::name) {
            if variant.name.is_some() {
                return Err(Error::new_spanned(
                    attr,
                    "duplicate #[variant(name)] attribute found",
                ));
            }

            let AttrWrapper::<kw::name, LitStr> { value: name, .. } = input.parse()?;
            variant.name = Some(name);

            Ok(())
        } else {
            Err(look.error())
        }
    })
}

struct AttrWrapper<K, V> {
    #[allow(unused)] // Usually we don't care about the ident.
    pub ident: K,
    pub value: V,
}

impl<K: Parse, V: Parse> Parse for AttrWrapper<K, V> {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let ident = input.parse()?;
        let value = if input.peek(token::Paren) {
            // #[ident(value)]
            let value;
            parenthesized!(value in input);
            value.parse()?
        } else {
            // #[ident = value]
            input.parse::<Token![=]>()?;
            input.parse()?
        };

        Ok(Self { ident, value })
    }
}

// (A, dyn B, ...)
fn parse_type_list(input: ParseStream<'_>) -> Result<Vec<Type>> {
    let content;
    parenthesized!(content in input);

    let types: Punctuated<Type, Token![,]> = content.parse_terminated(Type::parse)?;
    Ok(types.into_iter().collect())
}

fn parse_crate_path(attr: &Attribute) -> Result<syn::Path> {
    if attr.tokens.is_empty() {
        return Err(Error::new_spanned(attr, "expected a path to the skein crate"));
    }

    attr.parse_args_with(|input: ParseStream<'_>| input.call(syn::Path::parse_mod_style))
        .or_else(|_| {
            // #[skein_crate = path]
            let parser = |input: ParseStream<'_>| {
                input.parse::<Token![=]>()?;
                input.call(syn::Path::parse_mod_style)
            };
            syn::parse::Parser::parse2(parser, attr.tokens.clone())
        })
}
