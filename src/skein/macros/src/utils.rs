use syn::{parse_quote, Path};

pub fn default_crate_path() -> Path {
    parse_quote!(::skein)
}
