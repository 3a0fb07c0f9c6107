use std::io::{self, Write};

use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};

macro_rules! impl_dispatch {
    ($($fn:ident($($arg:ident: $ty:ty),*)),* $(,)?) => {
        $(
            #[inline]
            pub fn $fn<W: ?Sized + Write>(&mut self, w: &mut W $(, $arg: $ty)*) -> io::Result<()> {
                match self {
                    Self::Compact(f) => f.$fn(w $(, $arg)*),
                    Self::Pretty(f) => f.$fn(w $(, $arg)*),
                }
            }
        )*
    };
}

/// Whitespace style of the emitted document.
///
/// Both variants produce semantically identical output.
pub enum Style {
    Compact(CompactFormatter),
    Pretty(PrettyFormatter<'static>),
}

impl Style {
    pub fn new(pretty: bool) -> Self {
        if pretty {
            Self::Pretty(PrettyFormatter::with_indent(b"    "))
        } else {
            Self::Compact(CompactFormatter)
        }
    }

    impl_dispatch! {
        write_null(),
        write_bool(v: bool),
        write_i64(v: i64),
        write_u64(v: u64),
        write_f32(v: f32),
        write_f64(v: f64),

        begin_array(),
        end_array(),
        begin_array_value(first: bool),
        end_array_value(),

        begin_object(),
        end_object(),
        begin_object_key(first: bool),
        end_object_key(),
        begin_object_value(),
        end_object_value(),
    }
}
