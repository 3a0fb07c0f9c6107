//! A reference-preserving, polymorphism-aware serializer for
//! object graphs, using JSON as its document format.
//!
//! Types describe their own shape by implementing
//! [`CompositeSerializable`] (usually derived with [`Composite`])
//! and issuing named field reads and writes through the
//! serialization contexts. The [`JsonSerializer`] drives the
//! process for a whole graph:
//!
//! - objects held in [`Shared`] handles keep their identity, so
//!   shared and cyclic structures survive a round trip when
//!   [`SerializerFlags::PRESERVE_REFERENCES`] is set;
//!
//! - fields holding `Shared<dyn Base>` are written with a `$type`
//!   tag and rebuilt as the matching type from a list of
//!   [`candidates!`];
//!
//! - scalars, strings, byte arrays, timestamps, enums and nested
//!   collections are encoded as JSON primitives and arrays.

#![deny(
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    unsafe_op_in_unsafe_fn
)]

#[doc(hidden)]
pub mod __private {
    pub use skein_stream::Node;

    use crate::{
        de::decode_enum, registry::simple_type_name, value::expect_string,
        CompositeDeserializationContext, CompositeSerializationContext, PrimitiveSerializable,
        Result, SerializableEnum,
    };

    pub fn write_primitive<T: PrimitiveSerializable>(
        ctx: &mut CompositeSerializationContext<'_, '_>,
        field: &str,
        value: &T,
    ) -> Result<()> {
        ctx.engine.primitive(field, value)
    }

    pub fn read_primitive<T: PrimitiveSerializable>(
        node: &Node,
        ctx: &mut CompositeDeserializationContext<'_, '_>,
        field: &str,
    ) -> Result<T> {
        let text = expect_string(node, field)?;
        T::deserialize(&mut ctx.primitive(text))
            .map_err(|e| e.in_construction_of(simple_type_name::<T>()))
    }

    pub fn write_enum<E: SerializableEnum>(
        ctx: &mut CompositeSerializationContext<'_, '_>,
        field: &str,
        value: &E,
    ) -> Result<()> {
        let name = value.name();
        ctx.engine.token(field, |w| w.string(name))
    }

    pub fn read_enum<E: SerializableEnum>(node: &Node, field: &str) -> Result<E> {
        decode_enum(node, field)
    }
}

pub mod codec;

mod config;
pub use self::config::*;

mod de;
pub use self::de::{CompositeDeserializationContext, PrimitiveDeserializationContext};

mod error;
pub use self::error::*;

mod json;
pub use self::json::JsonSerializer;

mod registry;
pub use self::registry::{simple_type_name, Candidate, Constructor, Registry};

mod ser;
pub use self::ser::{CompositeSerializationContext, PrimitiveSerializationContext};

mod serializable;
pub use self::serializable::*;

mod value;
pub use self::value::{ObjectValue, ReadPolymorphic, ReadValue, WriteValue};

pub use indexmap::IndexSet;
pub use skein_stream::Node;

pub use skein_macros::{Composite, SerializableEnum};
