//! Compile-time dispatch of field values to the engine.
//!
//! Every kind of value a field can hold implements [`WriteValue`]
//! and [`ReadValue`]. Composite types are covered by blanket
//! implementations, while types implementing
//! [`PrimitiveSerializable`][crate::PrimitiveSerializable] or
//! [`SerializableEnum`][trait@crate::SerializableEnum] opt in
//! through [`impl_primitive_value!`] and [`impl_enum_value!`].

use std::hash::{BuildHasher, Hash};

use chrono::{DateTime, FixedOffset};
use indexmap::IndexSet;
use skein_stream::{Node, Object};

use crate::{
    codec, registry::Candidate, CompositeDeserializationContext, CompositeSerializable,
    CompositeSerializationContext, Error, Handle, Result, Shared,
};

/// A value that can be written as the value of a named field.
pub trait WriteValue {
    /// Writes exactly one JSON value to `ctx`.
    ///
    /// When `tagged` is set, composite values are written with
    /// their `$type`. `field` names the field for error reports.
    fn write_value(
        &self,
        ctx: &mut CompositeSerializationContext<'_, '_>,
        field: &str,
        tagged: bool,
    ) -> Result<()>;
}

/// A value that can be reconstructed from the value of a named
/// field.
pub trait ReadValue: Sized {
    /// Reconstructs a value from `node`, which belongs to the object
    /// currently populated through `ctx`.
    fn read_value(node: &Node, ctx: &mut CompositeDeserializationContext<'_, '_>, field: &str) -> Result<Self>;
}

/// A value holding polymorphic objects with base `B`.
pub trait ReadPolymorphic<B: ?Sized>: Sized {
    /// Reconstructs a value from `node`, building every object in it
    /// as the candidate named by its `$type`.
    fn read_polymorphic(
        node: &Node,
        ctx: &mut CompositeDeserializationContext<'_, '_>,
        field: &str,
        candidates: &[Candidate<B>],
    ) -> Result<Self>;
}

/// Marks values that are written as JSON objects.
pub trait ObjectValue: WriteValue {}

impl<T: CompositeSerializable> ObjectValue for T {}
impl<B: ?Sized + CompositeSerializable> ObjectValue for Shared<B> {}
impl<B: ?Sized + CompositeSerializable> ObjectValue for Handle<B> {}
impl<T: ObjectValue> ObjectValue for Option<T> {}

/// Builds the error for a node of an unexpected kind.
///
/// Objects and arrays on either side make for a structural
/// mismatch, scalars of the wrong kind for a field type mismatch.
#[cold]
pub(crate) fn mismatch(field: &str, expected: &'static str, node: &Node) -> Error {
    let actual = node.kind();
    let structural = matches!(expected, "object" | "array")
        || matches!(node, Node::Object(_) | Node::Array(_));

    if structural {
        Error::StructuralMismatch {
            field: field.to_owned(),
            expected,
            actual,
        }
    } else {
        Error::FieldTypeMismatch {
            field: field.to_owned(),
            expected,
            actual,
        }
    }
}

pub(crate) fn expect_object<'n>(node: &'n Node, field: &str) -> Result<&'n Object> {
    match node {
        Node::Object(object) => Ok(object),
        other => Err(mismatch(field, "object", other)),
    }
}

pub(crate) fn expect_string<'n>(node: &'n Node, field: &str) -> Result<&'n str> {
    match node {
        Node::String(text) => Ok(text),
        other => Err(mismatch(field, "string", other)),
    }
}

fn expect_number<'n>(node: &'n Node, field: &str) -> Result<&'n str> {
    match node {
        Node::Number(text) => Ok(text),
        other => Err(mismatch(field, "number", other)),
    }
}

fn expect_array<'n>(node: &'n Node, field: &str) -> Result<&'n [Node]> {
    match node {
        Node::Array(items) => Ok(items),
        other => Err(mismatch(field, "array", other)),
    }
}

#[inline]
fn element_name(field: &str, index: usize) -> String {
    format!("{field}[{index}]")
}

impl WriteValue for bool {
    fn write_value(&self, ctx: &mut CompositeSerializationContext<'_, '_>, field: &str, _: bool) -> Result<()> {
        ctx.engine.token(field, |w| w.bool(*self))
    }
}

impl ReadValue for bool {
    fn read_value(node: &Node, _: &mut CompositeDeserializationContext<'_, '_>, field: &str) -> Result<Self> {
        match node {
            Node::Bool(v) => Ok(*v),
            other => Err(mismatch(field, "boolean", other)),
        }
    }
}

macro_rules! impl_number {
    ($($ty:ty => $write_fn:ident as $wide:ty),* $(,)?) => {
        $(
            impl WriteValue for $ty {
                fn write_value(
                    &self,
                    ctx: &mut CompositeSerializationContext<'_, '_>,
                    field: &str,
                    _: bool,
                ) -> Result<()> {
                    ctx.engine.token(field, |w| w.$write_fn(*self as $wide))
                }
            }

            impl ReadValue for $ty {
                fn read_value(
                    node: &Node,
                    _: &mut CompositeDeserializationContext<'_, '_>,
                    field: &str,
                ) -> Result<Self> {
                    codec::parse_number(field, expect_number(node, field)?)
                }
            }
        )*
    };
}

impl_number! {
    i8 => i64 as i64,
    i16 => i64 as i64,
    i32 => i64 as i64,
    i64 => i64 as i64,
    u8 => u64 as u64,
    u16 => u64 as u64,
    u32 => u64 as u64,
    u64 => u64 as u64,
    f32 => f32 as f32,
    f64 => f64 as f64,
}

impl WriteValue for str {
    fn write_value(&self, ctx: &mut CompositeSerializationContext<'_, '_>, field: &str, _: bool) -> Result<()> {
        ctx.engine.token(field, |w| w.string(self))
    }
}

impl WriteValue for String {
    #[inline]
    fn write_value(&self, ctx: &mut CompositeSerializationContext<'_, '_>, field: &str, tagged: bool) -> Result<()> {
        self.as_str().write_value(ctx, field, tagged)
    }
}

impl ReadValue for String {
    fn read_value(node: &Node, _: &mut CompositeDeserializationContext<'_, '_>, field: &str) -> Result<Self> {
        expect_string(node, field).map(str::to_owned)
    }
}

impl WriteValue for DateTime<FixedOffset> {
    fn write_value(&self, ctx: &mut CompositeSerializationContext<'_, '_>, field: &str, _: bool) -> Result<()> {
        let text = codec::format_timestamp(self);
        ctx.engine.token(field, |w| w.string(&text))
    }
}

impl ReadValue for DateTime<FixedOffset> {
    fn read_value(node: &Node, _: &mut CompositeDeserializationContext<'_, '_>, field: &str) -> Result<Self> {
        codec::timestamp_field(field, expect_string(node, field)?)
    }
}

impl<T: WriteValue> WriteValue for Option<T> {
    fn write_value(&self, ctx: &mut CompositeSerializationContext<'_, '_>, field: &str, tagged: bool) -> Result<()> {
        match self {
            Some(v) => v.write_value(ctx, field, tagged),
            None => ctx.engine.token(field, |w| w.null()),
        }
    }
}

impl<T: ReadValue> ReadValue for Option<T> {
    fn read_value(node: &Node, ctx: &mut CompositeDeserializationContext<'_, '_>, field: &str) -> Result<Self> {
        match node {
            Node::Null => Ok(None),
            node => T::read_value(node, ctx, field).map(Some),
        }
    }
}

impl<B: ?Sized, T: ReadPolymorphic<B>> ReadPolymorphic<B> for Option<T> {
    fn read_polymorphic(
        node: &Node,
        ctx: &mut CompositeDeserializationContext<'_, '_>,
        field: &str,
        candidates: &[Candidate<B>],
    ) -> Result<Self> {
        match node {
            Node::Null => Ok(None),
            node => T::read_polymorphic(node, ctx, field, candidates).map(Some),
        }
    }
}

fn write_elements<'v, T, I>(
    ctx: &mut CompositeSerializationContext<'_, '_>,
    field: &str,
    tagged: bool,
    elements: I,
) -> Result<()>
where
    T: WriteValue + 'v,
    I: IntoIterator<Item = &'v T>,
{
    ctx.engine.token(field, |w| w.begin_array())?;
    for element in elements {
        element.write_value(ctx, field, tagged)?;
    }
    ctx.engine.token(field, |w| w.end_array())
}

impl<T: WriteValue> WriteValue for [T] {
    #[inline]
    fn write_value(&self, ctx: &mut CompositeSerializationContext<'_, '_>, field: &str, tagged: bool) -> Result<()> {
        write_elements(ctx, field, tagged, self)
    }
}

impl<T: WriteValue> WriteValue for Vec<T> {
    #[inline]
    fn write_value(&self, ctx: &mut CompositeSerializationContext<'_, '_>, field: &str, tagged: bool) -> Result<()> {
        self.as_slice().write_value(ctx, field, tagged)
    }
}

impl<T: ReadValue> ReadValue for Vec<T> {
    fn read_value(node: &Node, ctx: &mut CompositeDeserializationContext<'_, '_>, field: &str) -> Result<Self> {
        expect_array(node, field)?
            .iter()
            .enumerate()
            .map(|(i, element)| T::read_value(element, ctx, &element_name(field, i)))
            .collect()
    }
}

impl<B: ?Sized, T: ReadPolymorphic<B>> ReadPolymorphic<B> for Vec<T> {
    fn read_polymorphic(
        node: &Node,
        ctx: &mut CompositeDeserializationContext<'_, '_>,
        field: &str,
        candidates: &[Candidate<B>],
    ) -> Result<Self> {
        expect_array(node, field)?
            .iter()
            .enumerate()
            .map(|(i, element)| T::read_polymorphic(element, ctx, &element_name(field, i), candidates))
            .collect()
    }
}

// Sets are arrays in iteration order. Reading keeps the first of
// equal elements at its position.
impl<T: WriteValue, S> WriteValue for IndexSet<T, S> {
    #[inline]
    fn write_value(&self, ctx: &mut CompositeSerializationContext<'_, '_>, field: &str, tagged: bool) -> Result<()> {
        write_elements(ctx, field, tagged, self)
    }
}

impl<T, S> ReadValue for IndexSet<T, S>
where
    T: ReadValue + Hash + Eq,
    S: BuildHasher + Default,
{
    fn read_value(node: &Node, ctx: &mut CompositeDeserializationContext<'_, '_>, field: &str) -> Result<Self> {
        expect_array(node, field)?
            .iter()
            .enumerate()
            .map(|(i, element)| T::read_value(element, ctx, &element_name(field, i)))
            .collect()
    }
}

impl<B, T, S> ReadPolymorphic<B> for IndexSet<T, S>
where
    B: ?Sized,
    T: ReadPolymorphic<B> + Hash + Eq,
    S: BuildHasher + Default,
{
    fn read_polymorphic(
        node: &Node,
        ctx: &mut CompositeDeserializationContext<'_, '_>,
        field: &str,
        candidates: &[Candidate<B>],
    ) -> Result<Self> {
        expect_array(node, field)?
            .iter()
            .enumerate()
            .map(|(i, element)| T::read_polymorphic(element, ctx, &element_name(field, i), candidates))
            .collect()
    }
}

impl<T: CompositeSerializable> WriteValue for T {
    fn write_value(&self, ctx: &mut CompositeSerializationContext<'_, '_>, field: &str, tagged: bool) -> Result<()> {
        ctx.engine.composite(field, self, None, tagged)
    }
}

impl<T: CompositeSerializable> ReadValue for T {
    fn read_value(node: &Node, ctx: &mut CompositeDeserializationContext<'_, '_>, field: &str) -> Result<Self> {
        ctx.engine.owned(node, field)
    }
}

impl<B: ?Sized + CompositeSerializable> WriteValue for Shared<B> {
    fn write_value(&self, ctx: &mut CompositeSerializationContext<'_, '_>, field: &str, tagged: bool) -> Result<()> {
        ctx.engine.shared(field, self, tagged)
    }
}

impl<T: CompositeSerializable> ReadValue for Shared<T> {
    fn read_value(node: &Node, ctx: &mut CompositeDeserializationContext<'_, '_>, field: &str) -> Result<Self> {
        ctx.engine.shared(node, field)
    }
}

impl<B: ?Sized + CompositeSerializable> ReadPolymorphic<B> for Shared<B> {
    fn read_polymorphic(
        node: &Node,
        ctx: &mut CompositeDeserializationContext<'_, '_>,
        field: &str,
        candidates: &[Candidate<B>],
    ) -> Result<Self> {
        ctx.engine.polymorphic(node, field, candidates)
    }
}

impl<B: ?Sized + CompositeSerializable> WriteValue for Handle<B> {
    #[inline]
    fn write_value(&self, ctx: &mut CompositeSerializationContext<'_, '_>, field: &str, tagged: bool) -> Result<()> {
        ctx.engine.shared(field, &self.0, tagged)
    }
}

impl<T: CompositeSerializable> ReadValue for Handle<T> {
    #[inline]
    fn read_value(node: &Node, ctx: &mut CompositeDeserializationContext<'_, '_>, field: &str) -> Result<Self> {
        ctx.engine.shared(node, field).map(Handle)
    }
}

impl<B: ?Sized + CompositeSerializable> ReadPolymorphic<B> for Handle<B> {
    #[inline]
    fn read_polymorphic(
        node: &Node,
        ctx: &mut CompositeDeserializationContext<'_, '_>,
        field: &str,
        candidates: &[Candidate<B>],
    ) -> Result<Self> {
        ctx.engine.polymorphic(node, field, candidates).map(Handle)
    }
}

/// Implements [`WriteValue`] and [`ReadValue`] for a type that
/// implements [`PrimitiveSerializable`][crate::PrimitiveSerializable].
///
/// # Example
///
/// ```
/// # use skein::{impl_primitive_value, PrimitiveSerializable, PrimitiveSerializationContext, PrimitiveDeserializationContext, Result};
/// struct Code(String);
///
/// impl PrimitiveSerializable for Code {
///     fn serialize(&self, ctx: &mut PrimitiveSerializationContext<'_>) -> Result<()> {
///         ctx.write(Some(&self.0));
///         Ok(())
///     }
///
///     fn deserialize(ctx: &mut PrimitiveDeserializationContext<'_>) -> Result<Self> {
///         Ok(Code(ctx.read().to_owned()))
///     }
/// }
/// impl_primitive_value!(Code);
/// ```
#[macro_export]
macro_rules! impl_primitive_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::WriteValue for $ty {
                fn write_value(
                    &self,
                    ctx: &mut $crate::CompositeSerializationContext<'_, '_>,
                    field: &::std::primitive::str,
                    _: ::std::primitive::bool,
                ) -> $crate::Result<()> {
                    $crate::__private::write_primitive(ctx, field, self)
                }
            }

            impl $crate::ReadValue for $ty {
                fn read_value(
                    node: &$crate::__private::Node,
                    ctx: &mut $crate::CompositeDeserializationContext<'_, '_>,
                    field: &::std::primitive::str,
                ) -> $crate::Result<Self> {
                    $crate::__private::read_primitive(node, ctx, field)
                }
            }
        )+
    };
}

/// Implements [`WriteValue`] and [`ReadValue`] for a type that
/// implements [`SerializableEnum`][trait@crate::SerializableEnum].
///
/// This is already done by the
/// [`SerializableEnum`][macro@crate::SerializableEnum] derive.
#[macro_export]
macro_rules! impl_enum_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::WriteValue for $ty {
                fn write_value(
                    &self,
                    ctx: &mut $crate::CompositeSerializationContext<'_, '_>,
                    field: &::std::primitive::str,
                    _: ::std::primitive::bool,
                ) -> $crate::Result<()> {
                    $crate::__private::write_enum(ctx, field, self)
                }
            }

            impl $crate::ReadValue for $ty {
                fn read_value(
                    node: &$crate::__private::Node,
                    _: &mut $crate::CompositeDeserializationContext<'_, '_>,
                    field: &::std::primitive::str,
                ) -> $crate::Result<Self> {
                    $crate::__private::read_enum(node, field)
                }
            }
        )+
    };
}
