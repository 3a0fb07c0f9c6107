use syn::{Data, DeriveInput, Error, Fields, Generics, Ident, Result, Type};

use super::attrs::{self, Attrs};

pub struct Struct<'a> {
    pub original: &'a DeriveInput,
    pub attrs: Attrs<'a>,
    pub ident: Ident,
    pub generics: &'a Generics,
    pub fields: Vec<Field<'a>>,
}

pub struct Field<'a> {
    pub attrs: Attrs<'a>,
    pub ident: Ident,
}

pub struct Enum<'a> {
    pub original: &'a DeriveInput,
    pub attrs: Attrs<'a>,
    pub ident: Ident,
    pub variants: Vec<Variant<'a>>,
}

pub struct Variant<'a> {
    pub attrs: Attrs<'a>,
    pub ident: Ident,
}

impl<'a> Struct<'a> {
    pub fn from_syn(node: &'a DeriveInput) -> Result<Self> {
        let data = match &node.data {
            Data::Struct(data) => data,
            _ => {
                return Err(Error::new_spanned(
                    node,
                    "Composite can only be derived for structs, use SerializableEnum for enums",
                ))
            }
        };

        let fields = match &data.fields {
            Fields::Named(fields) => fields.named.iter().map(Field::from_syn).collect::<Result<_>>()?,
            Fields::Unit => Vec::new(),
            Fields::Unnamed(fields) => {
                return Err(Error::new_spanned(
                    fields,
                    "tuple struct fields have no names to serialize them under",
                ))
            }
        };

        Ok(Self {
            original: node,
            attrs: attrs::get(&node.attrs)?,
            ident: node.ident.clone(),
            generics: &node.generics,
            fields,
        })
    }

    pub fn validate(&self) -> Result<()> {
        require_no_field(&self.attrs)?;
        require_no_variant(&self.attrs)?;

        for field in &self.fields {
            field.validate()?;
        }

        Ok(())
    }

    pub fn name(&self) -> String {
        self.attrs
            .object
            .as_ref()
            .and_then(|o| o.name())
            .unwrap_or_else(|| self.ident.to_string())
    }

    pub fn bases(&self) -> &[Type] {
        self.attrs
            .object
            .as_ref()
            .map(|o| o.subtype_of.as_slice())
            .unwrap_or_default()
    }
}

impl<'a> Field<'a> {
    fn from_syn(node: &'a syn::Field) -> Result<Self> {
        let ident = node.ident.clone().ok_or_else(|| {
            Error::new_spanned(node, "tuple struct fields have no names to serialize them under")
        })?;

        Ok(Self {
            attrs: attrs::get(&node.attrs)?,
            ident,
        })
    }

    fn validate(&self) -> Result<()> {
        require_no_crate(&self.attrs)?;
        require_no_object(&self.attrs)?;
        require_no_variant(&self.attrs)?;

        if let Some(field) = &self.attrs.field {
            if field.skip && (field.default || field.polymorphic.is_some() || field.name().is_some()) {
                return Err(Error::new_spanned(
                    field.original,
                    "#[field(skip)] cannot be combined with other options",
                ));
            }
        }

        Ok(())
    }

    pub fn name(&self) -> String {
        self.attrs
            .field
            .as_ref()
            .and_then(|f| f.name())
            .unwrap_or_else(|| self.ident.to_string())
    }

    pub fn is_skipped(&self) -> bool {
        self.attrs.field.as_ref().map(|f| f.skip).unwrap_or(false)
    }

    pub fn is_defaulted(&self) -> bool {
        self.attrs.field.as_ref().map(|f| f.default).unwrap_or(false)
    }

    pub fn candidates(&self) -> Option<&[Type]> {
        self.attrs
            .field
            .as_ref()
            .and_then(|f| f.polymorphic.as_deref())
    }
}

impl<'a> Enum<'a> {
    pub fn from_syn(node: &'a DeriveInput) -> Result<Self> {
        let data = match &node.data {
            Data::Enum(data) => data,
            _ => {
                return Err(Error::new_spanned(
                    node,
                    "SerializableEnum can only be derived for enums",
                ))
            }
        };

        Ok(Self {
            original: node,
            attrs: attrs::get(&node.attrs)?,
            ident: node.ident.clone(),
            variants: data
                .variants
                .iter()
                .map(Variant::from_syn)
                .collect::<Result<_>>()?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        require_no_object(&self.attrs)?;
        require_no_field(&self.attrs)?;
        require_no_variant(&self.attrs)?;

        if !self.original.generics.params.is_empty() {
            return Err(Error::new_spanned(
                &self.original.generics,
                "serializable enums cannot be generic",
            ));
        }

        if self.variants.is_empty() {
            return Err(Error::new_spanned(
                self.original,
                "serializable enums need at least one variant",
            ));
        }

        for variant in &self.variants {
            variant.validate()?;
        }

        Ok(())
    }
}

impl<'a> Variant<'a> {
    fn from_syn(node: &'a syn::Variant) -> Result<Self> {
        if !node.fields.is_empty() {
            return Err(Error::new_spanned(
                node,
                "serializable enum variants cannot carry fields",
            ));
        }

        Ok(Self {
            attrs: attrs::get(&node.attrs)?,
            ident: node.ident.clone(),
        })
    }

    fn validate(&self) -> Result<()> {
        require_no_crate(&self.attrs)?;
        require_no_object(&self.attrs)?;
        require_no_field(&self.attrs)
    }

    pub fn name(&self) -> String {
        self.attrs
            .variant
            .as_ref()
            .and_then(|v| v.name())
            .unwrap_or_else(|| self.ident.to_string())
    }
}

fn require_no_crate(attrs: &Attrs<'_>) -> Result<()> {
    if let Some(krate) = &attrs.skein_crate {
        return Err(Error::new_spanned(
            krate.original,
            "unexpected #[skein_crate] attribute only allowed on structs and enums",
        ));
    }
    Ok(())
}

fn require_no_object(attrs: &Attrs<'_>) -> Result<()> {
    if let Some(object) = &attrs.object {
        return Err(Error::new_spanned(
            object.original,
            "unexpected #[object] attribute only allowed on structs",
        ));
    }
    Ok(())
}

fn require_no_field(attrs: &Attrs<'_>) -> Result<()> {
    if let Some(field) = &attrs.field {
        return Err(Error::new_spanned(
            field.original,
            "unexpected #[field] attribute only allowed on struct fields",
        ));
    }
    Ok(())
}

fn require_no_variant(attrs: &Attrs<'_>) -> Result<()> {
    if let Some(variant) = &attrs.variant {
        return Err(Error::new_spanned(
            variant.original,
            "unexpected #[variant] attribute only allowed on enum variants",
        ));
    }
    Ok(())
}
