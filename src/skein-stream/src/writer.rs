use std::io::{self, Write};

use crate::util::Style;

#[cold]
#[inline(never)]
fn misplaced(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("misplaced {what} in JSON token stream"),
    )
}

macro_rules! impl_write_literal {
    ($($(#[$doc:meta])* $fn:ident($ty:ty) => $write_fn:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $fn(&mut self, v: $ty) -> io::Result<()> {
                self.before_value()?;
                self.style.$write_fn(&mut self.out, v)?;
                self.after_value()
            }
        )*
    };
}

enum Frame {
    Object { first: bool, named: bool },
    Array { first: bool },
}

/// A streaming writer of JSON tokens.
///
/// Tokens are passed to the underlying [`Write`] implementation as soon
/// as they are issued; the writer only tracks enough nesting state to
/// place separators and to reject structurally invalid token sequences.
pub struct JsonWriter<W> {
    out: W,
    style: Style,
    stack: Vec<Frame>,
}

impl<W: Write> JsonWriter<W> {
    /// Creates a new writer producing compact output.
    pub fn new(out: W) -> Self {
        Self::with_pretty(out, false)
    }

    /// Creates a new writer that indents its output with four
    /// spaces per nesting level when `pretty` is set.
    pub fn with_pretty(out: W, pretty: bool) -> Self {
        Self {
            out,
            style: Style::new(pretty),
            stack: Vec::with_capacity(8),
        }
    }

    /// Returns the current nesting depth of the writer.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Begins a new JSON object.
    pub fn begin_object(&mut self) -> io::Result<()> {
        self.before_value()?;
        self.style.begin_object(&mut self.out)?;
        self.stack.push(Frame::Object {
            first: true,
            named: false,
        });

        Ok(())
    }

    /// Ends the innermost JSON object.
    pub fn end_object(&mut self) -> io::Result<()> {
        match self.stack.pop() {
            Some(Frame::Object { named: false, .. }) => {}
            _ => return Err(misplaced("object end")),
        }

        self.style.end_object(&mut self.out)?;
        self.after_value()
    }

    /// Begins a new JSON array.
    pub fn begin_array(&mut self) -> io::Result<()> {
        self.before_value()?;
        self.style.begin_array(&mut self.out)?;
        self.stack.push(Frame::Array { first: true });

        Ok(())
    }

    /// Ends the innermost JSON array.
    pub fn end_array(&mut self) -> io::Result<()> {
        match self.stack.pop() {
            Some(Frame::Array { .. }) => {}
            _ => return Err(misplaced("array end")),
        }

        self.style.end_array(&mut self.out)?;
        self.after_value()
    }

    /// Writes the name of the next object member.
    ///
    /// Exactly one value must follow before the next name or the end
    /// of the object.
    pub fn name(&mut self, name: &str) -> io::Result<()> {
        let Self { out, style, stack } = self;
        match stack.last_mut() {
            Some(Frame::Object { first, named }) if !*named => {
                style.begin_object_key(out, *first)?;
                *first = false;
                *named = true;
            }
            _ => return Err(misplaced("member name")),
        }

        write_escaped(out, name)?;
        style.end_object_key(out)?;
        style.begin_object_value(out)
    }

    /// Writes a `null` literal.
    pub fn null(&mut self) -> io::Result<()> {
        self.before_value()?;
        self.style.write_null(&mut self.out)?;
        self.after_value()
    }

    /// Writes a string literal, escaping it as necessary.
    pub fn string(&mut self, v: &str) -> io::Result<()> {
        self.before_value()?;
        write_escaped(&mut self.out, v)?;
        self.after_value()
    }

    impl_write_literal! {
        /// Writes a boolean literal.
        bool(bool) => write_bool,

        /// Writes a signed integer.
        i64(i64) => write_i64,

        /// Writes an unsigned integer.
        u64(u64) => write_u64,
    }

    /// Writes a single precision float.
    ///
    /// JSON has no representation for NaN or infinities, so these
    /// values are rejected.
    pub fn f32(&mut self, v: f32) -> io::Result<()> {
        if !v.is_finite() {
            return Err(non_finite(v));
        }

        self.before_value()?;
        self.style.write_f32(&mut self.out, v)?;
        self.after_value()
    }

    /// Writes a double precision float.
    ///
    /// JSON has no representation for NaN or infinities, so these
    /// values are rejected.
    pub fn f64(&mut self, v: f64) -> io::Result<()> {
        if !v.is_finite() {
            return Err(non_finite(v));
        }

        self.before_value()?;
        self.style.write_f64(&mut self.out, v)?;
        self.after_value()
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Validates that all opened objects and arrays were closed,
    /// flushes and returns the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        if !self.stack.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "unterminated object or array in JSON token stream",
            ));
        }

        self.out.flush()?;
        Ok(self.out)
    }

    fn before_value(&mut self) -> io::Result<()> {
        let Self { out, style, stack } = self;
        match stack.last_mut() {
            Some(Frame::Array { first }) => {
                style.begin_array_value(out, *first)?;
                *first = false;
                Ok(())
            }
            Some(Frame::Object { named: true, .. }) | None => Ok(()),
            Some(Frame::Object { named: false, .. }) => Err(misplaced("unnamed member value")),
        }
    }

    fn after_value(&mut self) -> io::Result<()> {
        let Self { out, style, stack } = self;
        match stack.last_mut() {
            Some(Frame::Array { .. }) => style.end_array_value(out),
            Some(Frame::Object { named, .. }) => {
                *named = false;
                style.end_object_value(out)
            }
            None => Ok(()),
        }
    }
}

fn write_escaped<W: Write>(out: &mut W, v: &str) -> io::Result<()> {
    serde_json::to_writer(out, v).map_err(io::Error::from)
}

fn non_finite<T: std::fmt::Display>(v: T) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("non-finite number {v} cannot be represented in JSON"),
    )
}
